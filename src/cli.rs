use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::pipeline::CleanConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean tabular datasets for visualization front ends", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean a CSV file and emit the cleaned data plus attribute metadata
    Clean(CleanArgs),
    /// Classify a CSV file's attributes and print a summary table
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input CSV file to clean ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Destination for the attribute profile JSON
    #[arg(short = 'p', long = "profile")]
    pub profile: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV file to classify ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    #[command(flatten)]
    pub thresholds: ThresholdArgs,
}

/// Pipeline thresholds, shared by every subcommand. Defaults mirror
/// [`CleanConfig::default`].
#[derive(Debug, Args)]
pub struct ThresholdArgs {
    /// Per-attribute sample size as a fraction of the dataset length
    #[arg(long = "sample-fraction", default_value_t = 0.4)]
    pub sample_fraction: f64,
    /// Sample size the number-like majority test is measured against
    #[arg(long = "number-threshold", default_value_t = 10)]
    pub number_id_threshold: usize,
    /// Sampled values inspected when splitting numerical from category-coded
    #[arg(long = "numerical-threshold", default_value_t = 28)]
    pub numerical_id_threshold: usize,
    /// Minimum non-null sampled values an attribute needs to survive
    #[arg(long = "min-entries", default_value_t = 2)]
    pub min_amount_entries: usize,
    /// Null numerical entries whose |z-score| exceeds this
    #[arg(long = "zscore-threshold", default_value_t = 3.0)]
    pub zscore_threshold: f64,
    /// Lower bound of the category-code integer range
    #[arg(long = "categorical-min", default_value_t = 0)]
    pub categorical_min: i64,
    /// Upper bound of the category-code integer range
    #[arg(long = "categorical-max", default_value_t = 50)]
    pub categorical_max: i64,
}

impl ThresholdArgs {
    pub fn to_config(&self) -> Result<CleanConfig> {
        let config = CleanConfig {
            sample_fraction: self.sample_fraction,
            number_id_threshold: self.number_id_threshold,
            numerical_id_threshold: self.numerical_id_threshold,
            min_amount_entries: self.min_amount_entries,
            zscore_threshold: self.zscore_threshold,
            categorical_range: self.categorical_min..=self.categorical_max,
        };
        config.validate()?;
        Ok(config)
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
