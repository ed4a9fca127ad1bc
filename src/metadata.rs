//! Sample grouping description.
//!
//! A delimited file assigning each sample of the input matrix to a group.
//! Group averages are then computed per group.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::warn;
use std::path::Path;

/// Sample → group assignment, with groups kept in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Maps sample IDs to their group
    pub condition_map: IndexMap<String, String>,
}

impl Metadata {
    /// Creates a new, empty Metadata structure
    pub fn new() -> Self {
        Metadata {
            condition_map: IndexMap::new(),
        }
    }

    /// Adds a sample with its group. A repeated sample is reassigned.
    pub fn add_sample(&mut self, sample_id: &str, group: &str) {
        if let Some(previous) = self
            .condition_map
            .insert(sample_id.to_string(), group.to_string())
        {
            warn!(
                "Sample '{}' listed twice in metadata; moving it from '{}' to '{}'",
                sample_id, previous, group
            );
        }
    }

    /// Returns the groups, each with its samples in file order.
    pub fn groups(&self) -> IndexMap<String, Vec<String>> {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for (sample, group) in &self.condition_map {
            groups.entry(group.clone()).or_default().push(sample.clone());
        }
        groups
    }

    /// Returns the number of samples in the metadata
    pub fn sample_count(&self) -> usize {
        self.condition_map.len()
    }
}

/// Loads a grouping description.
///
/// The file needs a sample column (`SampleID` or `Sample`) and a group column
/// (`Group` or `Condition`), matched case-insensitively. `.csv` files are
/// comma-separated, anything else is read as tab-separated.
///
/// # Arguments
///
/// * `path` - Path to the metadata file
///
/// # Returns
///
/// * `Result<Metadata>` - Metadata structure or error
pub fn load_metadata(path: &Path) -> Result<Metadata> {
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut metadata = Metadata::new();

    // Find column indices for required fields
    let headers = rdr.headers()?.clone();
    let sample_col = headers.iter().position(|h| {
        h.eq_ignore_ascii_case("sampleid") || h.eq_ignore_ascii_case("sample")
    });
    let group_col = headers.iter().position(|h| {
        h.eq_ignore_ascii_case("group") || h.eq_ignore_ascii_case("condition")
    });

    let sample_col = sample_col
        .ok_or_else(|| Error::Metadata("missing 'SampleID'/'Sample' column".to_string()))?;
    let group_col = group_col
        .ok_or_else(|| Error::Metadata("missing 'Group'/'Condition' column".to_string()))?;

    for result in rdr.records() {
        let record = result?;
        let sample_id = record.get(sample_col).unwrap_or_default();
        let group = record.get(group_col).unwrap_or_default();

        if sample_id.is_empty() {
            warn!("Skipping metadata row with empty sample ID.");
            continue;
        }
        if group.is_empty() {
            warn!("Skipping sample '{}' with an empty group.", sample_id);
            continue;
        }

        metadata.add_sample(sample_id, group);
    }

    if metadata.sample_count() == 0 {
        return Err(Error::Metadata(format!(
            "no valid sample entries found in '{}'",
            path.display()
        )));
    }

    Ok(metadata)
}
