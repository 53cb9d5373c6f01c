pub mod cli;
pub mod data;
pub mod ingest;
pub mod metadata;
pub mod pipeline;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    metadata::DatasetProfile,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("vizprep", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => handle_clean(&args),
        Commands::Probe(args) => handle_probe(&args),
    }
}

fn handle_clean(args: &cli::CleanArgs) -> Result<()> {
    let config = args.thresholds.to_config()?;
    let delimiter = ingest::resolve_delimiter(&args.input, args.delimiter);
    let dataset = ingest::read_dataset(&args.input, delimiter)
        .with_context(|| format!("Reading dataset from {:?}", args.input))?;
    let row_count = dataset.row_count();

    let outcome = pipeline::clean(dataset, &config);
    info!(
        "Cleaned {} row(s): {} numerical, {} categorical, {} dropped attribute(s)",
        row_count,
        outcome.profile.numerical_attributes.len(),
        outcome.profile.categorical_attributes.len(),
        outcome.profile.dropped_attributes.len()
    );

    if let Some(path) = &args.profile {
        outcome
            .profile
            .save(path)
            .with_context(|| format!("Writing profile to {path:?}"))?;
        info!("Attribute profile written to {path:?}");
    }
    ingest::write_dataset(args.output.as_deref(), delimiter, &outcome.data)
        .with_context(|| format!("Writing cleaned dataset for {:?}", args.input))?;
    Ok(())
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let config = args.thresholds.to_config()?;
    let delimiter = ingest::resolve_delimiter(&args.input, args.delimiter);
    let dataset = ingest::read_dataset(&args.input, delimiter)
        .with_context(|| format!("Reading dataset from {:?}", args.input))?;
    let input_headers: Vec<String> = dataset.headers().to_vec();

    let outcome = pipeline::clean(dataset, &config);
    let headers = vec![
        "attribute".to_string(),
        "class".to_string(),
        "summary".to_string(),
    ];
    let rows: Vec<Vec<String>> = input_headers
        .iter()
        .map(|attr| classification_row(attr, &outcome.profile))
        .collect();
    table::print_table(&headers, &rows);
    info!("Classified {} attribute(s)", input_headers.len());
    Ok(())
}

fn classification_row(attr: &str, profile: &DatasetProfile) -> Vec<String> {
    const SUMMARY_VALUE_LIMIT: usize = 8;
    if profile.key_attribute.as_deref() == Some(attr) {
        return row(attr, "key", "record key, passed through".to_string());
    }
    if let Some(numerical) = profile.numerical(attr) {
        let summary = format!("min {}, max {}", numerical.min, numerical.max);
        return row(attr, "numerical", summary);
    }
    if let Some(categorical) = profile.categorical(attr) {
        let preview = categorical
            .values
            .iter()
            .take(SUMMARY_VALUE_LIMIT)
            .map(|v| v.as_display())
            .join(", ");
        let summary = format!("{} distinct: {}", categorical.values.len(), preview);
        return row(attr, "categorical", summary);
    }
    row(attr, "dropped", "insufficient entries".to_string())
}

fn row(attr: &str, class: &str, summary: String) -> Vec<String> {
    vec![attr.to_string(), class.to_string(), summary]
}
