//! Defines the per-sample abundance table shared by the ortholog and
//! reaction matrices.
//!
//! Columns are samples, keyed in order of first appearance; within each
//! sample, features (orthologs or reactions) are keyed in insertion order.
//! Tables are built once and are read-only afterwards.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Abundances of one sample, keyed by feature identifier.
pub type FeatureAbundances = IndexMap<String, f64>;

/// Represents a sample-major abundance table.
///
/// Serializes as a nested object, `{"sample": {"feature": value}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleTable {
    columns: IndexMap<String, FeatureAbundances>,
}

/// Sample → OrthologID → abundance, as parsed from the input matrix.
pub type AbundanceMatrix = SampleTable;

/// Sample → ReactionID → abundance, derived through the reference mapping.
pub type ReactionMatrix = SampleTable;

impl SampleTable {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        SampleTable {
            columns: IndexMap::new(),
        }
    }

    /// Builds a table from already-assembled sample columns.
    pub fn from_columns(columns: IndexMap<String, FeatureAbundances>) -> Self {
        SampleTable { columns }
    }

    /// Returns the abundances for a specific sample.
    pub fn sample(&self, sample_name: &str) -> Option<&FeatureAbundances> {
        self.columns.get(sample_name)
    }

    /// Returns a single value, if both the sample and the feature exist.
    pub fn get(&self, sample_name: &str, feature: &str) -> Option<f64> {
        self.columns
            .get(sample_name)
            .and_then(|features| features.get(feature))
            .copied()
    }

    pub fn contains_sample(&self, sample_name: &str) -> bool {
        self.columns.contains_key(sample_name)
    }

    /// Returns the sample names in column order.
    pub fn sample_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Iterates over `(sample, abundances)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureAbundances)> {
        self.columns
            .iter()
            .map(|(name, features)| (name.as_str(), features))
    }

    /// Returns every feature seen in any sample, in order of first appearance.
    pub fn feature_names(&self) -> IndexSet<&str> {
        self.columns
            .values()
            .flat_map(|features| features.keys().map(String::as_str))
            .collect()
    }

    pub fn n_samples(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the dimensions of the table (features, samples).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.feature_names().len(), self.n_samples())
    }
}
