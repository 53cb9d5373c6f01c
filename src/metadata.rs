//! Output metadata for cleaned datasets and its JSON persistence.
//!
//! A [`DatasetProfile`] is what visualization front ends consume to populate
//! axis selectors, sliders, and legends: slider bounds for every numerical
//! attribute and the ordered distinct value set for every categorical one.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SliderBounds {
    pub min: i64,
    pub max: i64,
}

/// Observed extrema of a numerical attribute after cleaning. `min` is the
/// floor and `max` the ceiling of the surviving values; the slider bounds
/// start out identical and are the client's to adjust.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumericalAttribute {
    pub attr: String,
    pub min: i64,
    pub max: i64,
    pub slider: SliderBounds,
}

impl NumericalAttribute {
    pub fn new(attr: String, min: i64, max: i64) -> Self {
        Self {
            attr,
            min,
            max,
            slider: SliderBounds { min, max },
        }
    }
}

/// Distinct non-null values of a categorical attribute, in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoricalAttribute {
    pub attr: String,
    pub values: Vec<Value>,
}

/// Per-attribute metadata emitted alongside the cleaned dataset. Attribute
/// order follows the input header order in every collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProfile {
    /// The first header attribute, treated as the unique record key and
    /// excluded from classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_attribute: Option<String>,
    pub numerical_attributes: Vec<NumericalAttribute>,
    pub categorical_attributes: Vec<CategoricalAttribute>,
    /// Attributes removed for carrying too little information.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_attributes: Vec<String>,
}

impl DatasetProfile {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating profile file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing profile JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Parsing profile JSON")
    }

    pub fn numerical(&self, attr: &str) -> Option<&NumericalAttribute> {
        self.numerical_attributes.iter().find(|n| n.attr == attr)
    }

    pub fn categorical(&self, attr: &str) -> Option<&CategoricalAttribute> {
        self.categorical_attributes.iter().find(|c| c.attr == attr)
    }
}

/// The complete result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    pub profile: DatasetProfile,
    pub data: Dataset,
}

impl CleanOutcome {
    pub fn empty() -> Self {
        Self {
            profile: DatasetProfile::default(),
            data: Dataset::empty(),
        }
    }
}
