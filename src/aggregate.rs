//! Derives per-sample reaction abundances from ortholog abundances.
//!
//! A reaction's abundance in a sample is the arithmetic mean of the readings
//! of those of its orthologs that the sample actually has. Orthologs without
//! a reading are skipped and do not count toward the denominator. When none
//! of a reaction's orthologs has a reading (or the reaction lists none), its
//! abundance is exactly 0. Non-finite readings are kept and propagate through
//! the mean.

use crate::count_table::{AbundanceMatrix, FeatureAbundances, ReactionMatrix};
use crate::reference::{OrthologSet, ReferenceMapping};
use indexmap::IndexMap;
use log::debug;

/// Computes the reaction matrix for every sample in `matrix`.
///
/// Samples keep the matrix's column order and reactions keep the reference's
/// order. The result depends only on the two inputs.
///
/// # Arguments
///
/// * `reference` - Reaction → ortholog mapping.
/// * `matrix` - Parsed ortholog abundances.
///
/// # Returns
///
/// * `ReactionMatrix` - One value per (sample, reaction); never missing.
pub fn aggregate(reference: &ReferenceMapping, matrix: &AbundanceMatrix) -> ReactionMatrix {
    let mut columns = IndexMap::with_capacity(matrix.n_samples());

    for (sample, readings) in matrix.iter() {
        let mut reactions = FeatureAbundances::with_capacity(reference.len());
        let mut zero_filled = 0usize;

        for (reaction, orthologs) in reference.iter() {
            let abundance = reaction_abundance(orthologs, readings).unwrap_or_else(|| {
                zero_filled += 1;
                0.0
            });
            reactions.insert(reaction.to_string(), abundance);
        }

        debug!(
            "Sample {}: {} of {} reactions had no ortholog readings and were set to 0",
            sample,
            zero_filled,
            reference.len()
        );
        columns.insert(sample.to_string(), reactions);
    }

    ReactionMatrix::from_columns(columns)
}

/// Mean of the readings for the orthologs present in `readings`.
///
/// Returns `None` when no ortholog of the set has a reading.
pub fn reaction_abundance(orthologs: &OrthologSet, readings: &FeatureAbundances) -> Option<f64> {
    let mut sum = 0.0;
    let mut present = 0usize;

    for ortholog in orthologs {
        match readings.get(ortholog) {
            Some(value) => {
                sum += value;
                present += 1;
            }
            None => debug!("ID not found in input matrix: {}", ortholog),
        }
    }

    (present > 0).then(|| sum / present as f64)
}

/// Fraction of the reference's distinct orthologs that have a reading, per sample.
pub fn coverage(reference: &ReferenceMapping, matrix: &AbundanceMatrix) -> IndexMap<String, f64> {
    let universe = reference.ortholog_universe();

    matrix
        .iter()
        .map(|(sample, readings)| {
            let fraction = if universe.is_empty() {
                0.0
            } else {
                let found = universe
                    .iter()
                    .filter(|ortholog| readings.contains_key(**ortholog))
                    .count();
                found as f64 / universe.len() as f64
            };
            (sample.to_string(), fraction)
        })
        .collect()
}
