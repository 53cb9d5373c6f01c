//! The cleaning and classification pipeline.
//!
//! One call to [`clean`] turns a freshly tokenized [`Dataset`] into a cleaned
//! dataset plus a [`DatasetProfile`], with no schema supplied by the caller.
//! The stages run strictly in order, because each reads the previous stage's
//! output; notably, the numerical/categorical split is decided on a
//! re-sample of the *coerced* data, not the raw input:
//!
//! 1. sample a bounded prefix of each attribute's non-null values
//! 2. mark under-populated attributes for deletion
//! 3. detect number-like attributes from the samples
//! 4. coerce number-like columns (non-numeric entries become null)
//! 5. re-sample, then split number-like attributes into numerical vs.
//!    category-coded
//! 6. collect everything else as categorical
//! 7. null z-score outliers in numerical columns
//! 8. build slider bounds and distinct-value sets
//!
//! The first header attribute is the record key; it is never sampled,
//! classified, coerced, filtered, or deleted.

use std::ops::RangeInclusive;

use anyhow::{Result, ensure};
use log::debug;

use crate::{
    data::{Dataset, Value},
    metadata::{CategoricalAttribute, CleanOutcome, DatasetProfile, NumericalAttribute},
};

/// Sampled numeric values below this count never qualify an attribute as
/// number-like, regardless of the majority test.
const SPARSE_NUMERIC_FLOOR: usize = 2;

/// Tunable thresholds for one pipeline run. Defaults match the values the
/// heuristics were calibrated with; callers with unusual datasets are
/// expected to override per run rather than patch constants.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Sample size per attribute, as a fraction of the dataset length.
    pub sample_fraction: f64,
    /// Sampled numeric values needed (strictly more than half this) to call
    /// an attribute number-like on the majority branch.
    pub number_id_threshold: usize,
    /// Sampled values inspected when splitting numerical from
    /// category-coded; shorter samples are accepted as numerical outright.
    pub numerical_id_threshold: usize,
    /// Minimum non-null sampled values an attribute needs to survive at all.
    pub min_amount_entries: usize,
    /// Entries whose |z| exceeds this are nulled in numerical columns.
    pub zscore_threshold: f64,
    /// Integer values in this range are treated as likely category codes.
    pub categorical_range: RangeInclusive<i64>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            sample_fraction: 0.4,
            number_id_threshold: 10,
            numerical_id_threshold: 28,
            min_amount_entries: 2,
            zscore_threshold: 3.0,
            categorical_range: 0..=50,
        }
    }
}

impl CleanConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.sample_fraction > 0.0,
            "Sample fraction must be positive, got {}",
            self.sample_fraction
        );
        ensure!(
            self.zscore_threshold > 0.0,
            "Z-score threshold must be positive, got {}",
            self.zscore_threshold
        );
        ensure!(
            self.categorical_range.start() <= self.categorical_range.end(),
            "Categorical range start {} exceeds end {}",
            self.categorical_range.start(),
            self.categorical_range.end()
        );
        Ok(())
    }
}

/// Runs the full pipeline over one dataset. Infallible: degenerate input
/// (no columns, no rows, all-null columns) produces a structurally valid,
/// possibly empty outcome rather than an error.
pub fn clean(mut data: Dataset, config: &CleanConfig) -> CleanOutcome {
    if data.column_count() == 0 {
        return CleanOutcome::empty();
    }

    let samples = collect_samples(&data, config.sample_fraction);
    let to_delete = insufficient_columns(&samples, config);
    let number_like = number_columns(&samples, &to_delete, config);
    debug!(
        "Classifying {} column(s): {} under-populated, {} number-like",
        data.column_count(),
        to_delete.len(),
        number_like.len()
    );

    coerce_number_columns(&mut data, &number_like);

    // The split below must see the coerced data: coercion changes which
    // values are legitimately numeric, so the raw samples are stale here.
    let resampled = collect_samples(&data, config.sample_fraction);
    let mut numerical = numerical_columns(&resampled, &number_like, &to_delete, config);
    // The sparse-numeric branch can admit an attribute that is also marked
    // for deletion; the deletion verdict wins in the output.
    numerical.retain(|column| !to_delete.contains(column));
    let categorical = categorical_columns(data.column_count(), &numerical, &to_delete);
    debug!(
        "Split number-like columns: {} numerical, {} categorical",
        numerical.len(),
        categorical.len()
    );

    suppress_outliers(&mut data, &numerical, config.zscore_threshold);

    let profile = DatasetProfile {
        key_attribute: data.headers().first().cloned(),
        numerical_attributes: numerical_metadata(&data, &numerical),
        categorical_attributes: categorical_metadata(&data, &categorical),
        dropped_attributes: to_delete
            .iter()
            .map(|&column| data.headers()[column].clone())
            .collect(),
    };
    let data = data.without_columns(&to_delete);
    CleanOutcome { profile, data }
}

/// Collects, per column, an order-preserving prefix of non-null values.
/// Each column stops accepting values once its sample length passes
/// `fraction * row_count`; other columns keep sampling independently.
fn collect_samples(data: &Dataset, fraction: f64) -> Vec<Vec<Value>> {
    let cap = fraction * data.row_count() as f64;
    let mut samples: Vec<Vec<Value>> = vec![Vec::new(); data.column_count()];
    for row in data.rows() {
        for (column, cell) in row.iter().enumerate() {
            let Some(value) = cell else { continue };
            if samples[column].len() as f64 > cap {
                continue;
            }
            samples[column].push(value.clone());
        }
    }
    samples
}

/// Columns whose sample is too small to classify reliably. The key column
/// is exempt.
fn insufficient_columns(samples: &[Vec<Value>], config: &CleanConfig) -> Vec<usize> {
    samples
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, sample)| sample.len() < config.min_amount_entries)
        .map(|(column, _)| column)
        .collect()
}

/// Columns whose sampled values are predominantly numeric. Two independent
/// acceptance branches, kept deliberately: the majority test respects the
/// deletion mark, while the sparse floor rescues columns with very few but
/// genuinely numeric values.
fn number_columns(samples: &[Vec<Value>], to_delete: &[usize], config: &CleanConfig) -> Vec<usize> {
    let mut columns = Vec::new();
    for (column, sample) in samples.iter().enumerate().skip(1) {
        let numeric = sample.iter().filter(|value| value.is_number()).count();
        let majority = numeric as f64 > config.number_id_threshold as f64 / 2.0;
        if (majority && !to_delete.contains(&column)) || numeric >= SPARSE_NUMERIC_FLOOR {
            columns.push(column);
        }
    }
    columns
}

/// Nulls every non-numeric entry of the number-like columns, across the full
/// dataset. Later stages assume these columns hold only numbers or null.
fn coerce_number_columns(data: &mut Dataset, number_like: &[usize]) {
    for row in 0..data.row_count() {
        for &column in number_like {
            if data.cell(row, column).is_some_and(|value| !value.is_number()) {
                data.clear_cell(row, column);
            }
        }
    }
}

/// Splits number-like columns into numerical (continuous measurements) and
/// category-coded. Small integers in `categorical_range` vote for a code
/// attribute; any fractional value, or a sample too short to judge, settles
/// the column as numerical.
fn numerical_columns(
    samples: &[Vec<Value>],
    number_like: &[usize],
    to_delete: &[usize],
    config: &CleanConfig,
) -> Vec<usize> {
    let mut numericals = Vec::new();
    for &column in number_like {
        let sample = &samples[column];
        let mut sure_numerical = sample.len() < config.numerical_id_threshold;
        let mut categorical_hits = 0usize;
        for value in sample.iter().take(config.numerical_id_threshold) {
            if sure_numerical {
                break;
            }
            let Some(n) = value.as_number() else { break };
            if n.fract() != 0.0 {
                sure_numerical = true;
            }
            if is_categorical_code(n, &config.categorical_range) {
                categorical_hits += 1;
            }
        }
        let below_half =
            (categorical_hits as f64) < config.numerical_id_threshold as f64 / 2.0;
        if (below_half && !to_delete.contains(&column)) || sure_numerical {
            numericals.push(column);
        }
    }
    numericals
}

fn is_categorical_code(n: f64, range: &RangeInclusive<i64>) -> bool {
    n.fract() == 0.0 && n >= *range.start() as f64 && n <= *range.end() as f64
}

/// Everything past the key column that is neither numerical nor deleted.
fn categorical_columns(column_count: usize, numerical: &[usize], to_delete: &[usize]) -> Vec<usize> {
    (1..column_count)
        .filter(|column| !numerical.contains(column) && !to_delete.contains(column))
        .collect()
}

/// Nulls entries whose standardized deviation from the column mean exceeds
/// the threshold. Mean and standard deviation are the population statistics
/// over the column's non-null values. A zero standard deviation means a
/// constant column: nothing there can be an outlier, so the column is
/// skipped rather than divided by zero.
fn suppress_outliers(data: &mut Dataset, numerical: &[usize], threshold: f64) {
    for &column in numerical {
        let values: Vec<f64> = data
            .column_values(column)
            .filter_map(Value::as_number)
            .collect();
        if values.is_empty() {
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let stddev = variance.sqrt();
        if stddev == 0.0 {
            continue;
        }
        for row in 0..data.row_count() {
            if let Some(n) = data.cell(row, column).and_then(Value::as_number) {
                let z = (n - mean) / stddev;
                if z.abs() > threshold {
                    data.clear_cell(row, column);
                }
            }
        }
    }
}

/// Floor/ceil extrema of each numerical column's surviving values. A column
/// left with no values at all (every entry nulled upstream) emits no entry.
fn numerical_metadata(data: &Dataset, numerical: &[usize]) -> Vec<NumericalAttribute> {
    let mut out = Vec::new();
    for &column in numerical {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in data.column_values(column) {
            if let Some(n) = value.as_number() {
                min = min.min(n);
                max = max.max(n);
            }
        }
        if min > max {
            continue;
        }
        out.push(NumericalAttribute::new(
            data.headers()[column].clone(),
            min.floor() as i64,
            max.ceil() as i64,
        ));
    }
    out
}

/// Distinct non-null values per categorical column, first-seen order.
fn categorical_metadata(data: &Dataset, categorical: &[usize]) -> Vec<CategoricalAttribute> {
    categorical
        .iter()
        .map(|&column| {
            let mut values: Vec<Value> = Vec::new();
            for value in data.column_values(column) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
            CategoricalAttribute {
                attr: data.headers()[column].clone(),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn number_rows(values: &[f64]) -> Vec<Vec<Option<Value>>> {
        values
            .iter()
            .enumerate()
            .map(|(idx, v)| {
                vec![
                    Some(Value::Text(format!("row-{idx}"))),
                    Some(Value::Number(*v)),
                ]
            })
            .collect()
    }

    #[test]
    fn samples_stop_past_the_fraction_cap() {
        let data = Dataset::new(
            headers(&["id", "x"]),
            number_rows(&[1.0, 2.0, 3.0, 4.0, 5.0]),
        )
        .unwrap();
        let samples = collect_samples(&data, 0.4);
        // cap is 2.0; a sample of length 2 still accepts one more value
        assert_eq!(samples[1].len(), 3);
    }

    #[test]
    fn sampling_skips_nulls_per_column() {
        let mut rows = number_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        rows[0][1] = None;
        rows[1][1] = None;
        let data = Dataset::new(headers(&["id", "x"]), rows).unwrap();
        let samples = collect_samples(&data, 0.4);
        assert_eq!(
            samples[1][0],
            Value::Number(3.0),
            "nulls must not occupy sample slots"
        );
    }

    #[test]
    fn key_column_is_never_marked_insufficient() {
        let data = Dataset::new(headers(&["id", "x"]), number_rows(&[1.0])).unwrap();
        let samples = collect_samples(&data, 0.4);
        let dropped = insufficient_columns(&samples, &CleanConfig::default());
        assert_eq!(dropped, vec![1]);
    }

    #[test]
    fn sparse_numeric_branch_ignores_deletion_mark() {
        let config = CleanConfig::default();
        // two numeric values: below the majority bar, at the sparse floor
        let samples = vec![
            vec![],
            vec![Value::Number(1.0), Value::Number(2.0)],
        ];
        assert_eq!(number_columns(&samples, &[1], &config), vec![1]);
    }

    #[test]
    fn majority_branch_respects_deletion_mark() {
        // lone numeric value: passes the majority bar at threshold 1 but
        // stays below the sparse floor, so the deletion mark decides
        let config = CleanConfig {
            number_id_threshold: 1,
            ..CleanConfig::default()
        };
        let samples = vec![vec![], vec![Value::Number(4.0)], vec![Value::Number(4.0)]];
        assert_eq!(number_columns(&samples, &[1], &config), vec![2]);
    }

    #[test]
    fn short_sample_is_accepted_as_numerical() {
        let config = CleanConfig::default();
        let samples = vec![vec![], vec![Value::Number(1.0); 5]];
        assert_eq!(numerical_columns(&samples, &[1], &[], &config), vec![1]);
    }

    #[test]
    fn in_range_integers_are_rejected_as_category_codes() {
        let config = CleanConfig::default();
        let sample: Vec<Value> = (0..30).map(|i| Value::Number((i % 5) as f64)).collect();
        let samples = vec![vec![], sample];
        assert!(numerical_columns(&samples, &[1], &[], &config).is_empty());
    }

    #[test]
    fn fractional_value_overrides_the_code_heuristic() {
        let config = CleanConfig::default();
        let mut sample: Vec<Value> = (0..30).map(|i| Value::Number((i % 5) as f64)).collect();
        sample[0] = Value::Number(2.5);
        let samples = vec![vec![], sample];
        assert_eq!(numerical_columns(&samples, &[1], &[], &config), vec![1]);
    }

    #[test]
    fn out_of_range_integers_stay_numerical() {
        let config = CleanConfig::default();
        let sample: Vec<Value> = (0..30).map(|i| Value::Number(1000.0 + i as f64)).collect();
        let samples = vec![vec![], sample];
        assert_eq!(numerical_columns(&samples, &[1], &[], &config), vec![1]);
    }

    #[test]
    fn constant_column_is_left_untouched_by_outlier_filter() {
        let mut data =
            Dataset::new(headers(&["id", "x"]), number_rows(&[7.0; 50])).unwrap();
        suppress_outliers(&mut data, &[1], 3.0);
        assert_eq!(data.column_values(1).count(), 50);
    }

    #[test]
    fn extreme_value_is_nulled_by_outlier_filter() {
        let mut values = vec![10.0; 40];
        values.push(10_000.0);
        let mut data = Dataset::new(headers(&["id", "x"]), number_rows(&values)).unwrap();
        suppress_outliers(&mut data, &[1], 3.0);
        assert_eq!(data.column_values(1).count(), 40);
        assert!(data.cell(40, 1).is_none());
    }

    #[test]
    fn metadata_bounds_are_floored_and_ceiled() {
        let data = Dataset::new(
            headers(&["id", "x"]),
            number_rows(&[1.2, 5.7, 3.3]),
        )
        .unwrap();
        let meta = numerical_metadata(&data, &[1]);
        assert_eq!(meta[0].min, 1);
        assert_eq!(meta[0].max, 6);
        assert_eq!(meta[0].slider.min, 1);
        assert_eq!(meta[0].slider.max, 6);
    }

    #[test]
    fn config_validation_rejects_reversed_range() {
        let config = CleanConfig {
            categorical_range: 50..=0,
            ..CleanConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
