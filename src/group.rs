//! Cross-sample group averages over a reaction matrix.
//!
//! Every selected sample must be present in the matrix and expose the
//! reactions being averaged. All checks run before any value is averaged, and
//! a failed query returns a single [`ConsistencyError`] without touching the
//! matrix.

use crate::count_table::{FeatureAbundances, ReactionMatrix};
use crate::error::ConsistencyError;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

/// Mean abundance per reaction over one sample selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage {
    samples: Vec<String>,
    values: IndexMap<String, f64>,
}

impl GroupAverage {
    pub fn get(&self, reaction: &str) -> Option<f64> {
        self.values.get(reaction).copied()
    }

    /// Samples the average was taken over, as selected.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .map(|(reaction, value)| (reaction.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> IndexMap<String, f64> {
        self.values
    }
}

/// Reactions exposed by the first sample of the selection (not of the
/// matrix), in that sample's insertion order.
pub fn reference_vocabulary<S: AsRef<str>>(
    matrix: &ReactionMatrix,
    samples: &[S],
) -> Result<Vec<String>, ConsistencyError> {
    let first: &str = samples
        .first()
        .ok_or(ConsistencyError::EmptySelection)?
        .as_ref();
    matrix
        .sample(first)
        .map(|reactions| reactions.keys().cloned().collect())
        .ok_or_else(|| ConsistencyError::UnknownSamples(unknown_samples(matrix, samples)))
}

/// Averages each reaction over `samples`, using the first sample's reactions
/// as the vocabulary.
///
/// Every other selected sample must expose exactly the same reactions.
///
/// # Arguments
///
/// * `matrix` - Reaction matrix built from the input.
/// * `samples` - Non-empty selection; repeated samples count once per occurrence.
///
/// # Returns
///
/// * `Result<GroupAverage, ConsistencyError>` - Per-reaction means, or why the
///   selection does not fit the matrix.
pub fn group_average<S: AsRef<str>>(
    matrix: &ReactionMatrix,
    samples: &[S],
) -> Result<GroupAverage, ConsistencyError> {
    let vocabulary = reference_vocabulary(matrix, samples)?;
    let columns = check_selection(matrix, samples, &vocabulary, true)?;
    Ok(average_columns(samples, &vocabulary, &columns))
}

/// Averages the given reactions over `samples`.
///
/// Samples may expose reactions outside `vocabulary`; those are ignored.
pub fn group_average_with_vocabulary<S: AsRef<str>>(
    matrix: &ReactionMatrix,
    samples: &[S],
    vocabulary: &[String],
) -> Result<GroupAverage, ConsistencyError> {
    let columns = check_selection(matrix, samples, vocabulary, false)?;
    Ok(average_columns(samples, vocabulary, &columns))
}

/// Group averages for every named group of a sample grouping.
pub fn group_averages(
    matrix: &ReactionMatrix,
    groups: &IndexMap<String, Vec<String>>,
) -> Result<IndexMap<String, GroupAverage>, ConsistencyError> {
    groups
        .iter()
        .map(|(group, samples)| {
            debug!("Averaging group {} over {} samples", group, samples.len());
            group_average(matrix, samples).map(|average| (group.clone(), average))
        })
        .collect()
}

fn unknown_samples<S: AsRef<str>>(matrix: &ReactionMatrix, samples: &[S]) -> Vec<String> {
    samples
        .iter()
        .map(|sample| sample.as_ref())
        .filter(|sample: &&str| !matrix.contains_sample(sample))
        .unique()
        .map(str::to_string)
        .collect()
}

// Returns one column per selected sample, in selection order.
fn check_selection<'m, S: AsRef<str>>(
    matrix: &'m ReactionMatrix,
    samples: &[S],
    vocabulary: &[String],
    exact: bool,
) -> Result<Vec<&'m FeatureAbundances>, ConsistencyError> {
    if samples.is_empty() {
        return Err(ConsistencyError::EmptySelection);
    }

    let unknown = unknown_samples(matrix, samples);
    if !unknown.is_empty() {
        return Err(ConsistencyError::UnknownSamples(unknown));
    }

    let expected: IndexSet<&str> = vocabulary.iter().map(String::as_str).collect();
    let mut columns = Vec::with_capacity(samples.len());

    for sample in samples {
        let sample: &str = sample.as_ref();
        let Some(reactions) = matrix.sample(sample) else {
            return Err(ConsistencyError::UnknownSamples(vec![sample.to_string()]));
        };

        let missing: Vec<String> = expected
            .iter()
            .filter(|reaction| !reactions.contains_key(**reaction))
            .map(|reaction| reaction.to_string())
            .collect();
        let unexpected: Vec<String> = if exact {
            reactions
                .keys()
                .filter(|reaction| !expected.contains(reaction.as_str()))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ConsistencyError::VocabularyMismatch {
                sample: sample.to_string(),
                missing,
                unexpected,
            });
        }
        columns.push(reactions);
    }

    Ok(columns)
}

fn average_columns<S: AsRef<str>>(
    samples: &[S],
    vocabulary: &[String],
    columns: &[&FeatureAbundances],
) -> GroupAverage {
    // reactions x samples; every cell was checked to exist.
    let table = Array2::from_shape_fn((vocabulary.len(), columns.len()), |(r, s)| {
        columns[s][vocabulary[r].as_str()]
    });
    let means = table
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(vocabulary.len()));

    GroupAverage {
        samples: samples
            .iter()
            .map(|sample| {
                let sample: &str = sample.as_ref();
                sample.to_string()
            })
            .collect(),
        values: vocabulary.iter().cloned().zip(means).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reaction_matrix(columns: &[(&str, &[(&str, f64)])]) -> ReactionMatrix {
        ReactionMatrix::from_columns(
            columns
                .iter()
                .map(|(sample, values)| {
                    (
                        sample.to_string(),
                        values
                            .iter()
                            .map(|(reaction, value)| (reaction.to_string(), *value))
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_group_average_simple() {
        let matrix = reaction_matrix(&[("S1", &[("R1", 2.0)]), ("S2", &[("R1", 6.0)])]);

        let average = group_average(&matrix, &["S1", "S2"]).unwrap();
        assert_eq!(average.get("R1"), Some(4.0));
        assert_eq!(average.len(), 1);
        assert_eq!(average.samples(), &["S1".to_string(), "S2".to_string()]);
    }

    #[test]
    fn test_unknown_sample_fails_and_matrix_stays_usable() {
        let matrix = reaction_matrix(&[("S1", &[("R1", 2.0)]), ("S2", &[("R1", 6.0)])]);
        let before = matrix.clone();

        let err = group_average(&matrix, &["S1", "S3"]).unwrap_err();
        assert_eq!(err, ConsistencyError::UnknownSamples(vec!["S3".to_string()]));
        assert_eq!(matrix, before);

        let average = group_average(&matrix, &["S2"]).unwrap();
        assert_eq!(average.get("R1"), Some(6.0));
    }

    #[test]
    fn test_unknown_first_sample() {
        let matrix = reaction_matrix(&[("S1", &[("R1", 2.0)])]);
        let err = group_average(&matrix, &["S9", "S1", "S9"]).unwrap_err();
        assert_eq!(err, ConsistencyError::UnknownSamples(vec!["S9".to_string()]));
    }

    #[test]
    fn test_empty_selection() {
        let matrix = reaction_matrix(&[("S1", &[("R1", 2.0)])]);
        let samples: [&str; 0] = [];
        assert_eq!(
            group_average(&matrix, &samples).unwrap_err(),
            ConsistencyError::EmptySelection
        );
    }

    #[test]
    fn test_inconsistent_vocabularies_fail() {
        let matrix = reaction_matrix(&[
            ("S1", &[("R1", 2.0), ("R2", 1.0)]),
            ("S2", &[("R1", 6.0)]),
            ("S3", &[("R1", 6.0), ("R2", 1.0), ("R3", 0.0)]),
        ]);

        let err = group_average(&matrix, &["S1", "S2"]).unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::VocabularyMismatch {
                sample: "S2".to_string(),
                missing: vec!["R2".to_string()],
                unexpected: vec![],
            }
        );

        let err = group_average(&matrix, &["S1", "S3"]).unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::VocabularyMismatch { ref unexpected, .. } if unexpected == &vec!["R3".to_string()]
        ));
    }

    #[test]
    fn test_explicit_vocabulary_allows_subset() {
        let matrix = reaction_matrix(&[
            ("S1", &[("R1", 2.0), ("R2", 1.0)]),
            ("S2", &[("R1", 6.0)]),
        ]);
        let vocabulary = vec!["R1".to_string()];

        let average = group_average_with_vocabulary(&matrix, &["S1", "S2"], &vocabulary).unwrap();
        assert_eq!(average.get("R1"), Some(4.0));
        assert_eq!(average.get("R2"), None);

        let vocabulary = vec!["R2".to_string()];
        assert!(group_average_with_vocabulary(&matrix, &["S1", "S2"], &vocabulary).is_err());
    }

    #[test]
    fn test_denominator_is_selection_length() {
        let matrix = reaction_matrix(&[
            ("S1", &[("R1", 1.0), ("R2", 0.0)]),
            ("S2", &[("R1", 2.0), ("R2", 0.0)]),
            ("S3", &[("R1", 6.0), ("R2", 3.0)]),
        ]);

        let average = group_average(&matrix, &["S1", "S2", "S3"]).unwrap();
        assert_relative_eq!(average.get("R1").unwrap(), 3.0);
        assert_relative_eq!(average.get("R2").unwrap(), 1.0);

        // A repeated sample is weighted once per occurrence.
        let average = group_average(&matrix, &["S3", "S3", "S1"]).unwrap();
        assert_relative_eq!(average.get("R1").unwrap(), 13.0 / 3.0);
        let order: Vec<&str> = average.iter().map(|(reaction, _)| reaction).collect();
        assert_eq!(order, vec!["R1", "R2"]);
    }

    #[test]
    fn test_vocabulary_follows_selection_order() {
        let matrix = reaction_matrix(&[
            ("S1", &[("R1", 1.0), ("R2", 2.0)]),
            ("S2", &[("R2", 4.0), ("R1", 3.0)]),
        ]);

        let vocabulary = reference_vocabulary(&matrix, &["S2", "S1"]).unwrap();
        assert_eq!(vocabulary, vec!["R2".to_string(), "R1".to_string()]);

        let average = group_average(&matrix, &["S2", "S1"]).unwrap();
        let order: Vec<&str> = average.iter().map(|(reaction, _)| reaction).collect();
        assert_eq!(order, vec!["R2", "R1"]);
        assert_relative_eq!(average.get("R1").unwrap(), 2.0);
    }

    #[test]
    fn test_non_finite_values_propagate() {
        let matrix = reaction_matrix(&[
            ("S1", &[("R1", f64::NAN), ("R2", 1.0)]),
            ("S2", &[("R1", f64::INFINITY), ("R2", f64::INFINITY)]),
        ]);

        let average = group_average(&matrix, &["S2", "S1"]).unwrap();
        assert!(average.get("R1").unwrap().is_nan());
        assert_eq!(average.get("R2"), Some(f64::INFINITY));
    }

    #[test]
    fn test_group_averages_by_name() {
        let matrix = reaction_matrix(&[
            ("a1", &[("R1", 1.0)]),
            ("a2", &[("R1", 3.0)]),
            ("b1", &[("R1", 10.0)]),
        ]);
        let mut groups = IndexMap::new();
        groups.insert("A".to_string(), vec!["a1".to_string(), "a2".to_string()]);
        groups.insert("B".to_string(), vec!["b1".to_string()]);

        let averages = group_averages(&matrix, &groups).unwrap();
        assert_eq!(averages["A"].get("R1"), Some(2.0));
        assert_eq!(averages["B"].get("R1"), Some(10.0));

        groups.insert("C".to_string(), vec!["c1".to_string()]);
        assert!(group_averages(&matrix, &groups).is_err());
    }
}
