//! Construction-time pipeline: parse the ortholog matrix, then derive the
//! reaction matrix through an already-loaded reference mapping.
//!
//! Both matrices are built once in [`KeggMatrix::new`] and are read-only
//! afterwards; group queries borrow them.

use crate::aggregate::{aggregate, coverage};
use crate::count_table::{AbundanceMatrix, ReactionMatrix};
use crate::error::Result;
use crate::group::{group_average, group_averages, GroupAverage};
use crate::parser::{MatrixParser, ParsedMatrix};
use crate::reference::ReferenceMapping;
use indexmap::IndexMap;
use log::info;
use std::io::Read;

/// Ortholog and reaction abundance matrices for one input.
#[derive(Debug, Clone)]
pub struct KeggMatrix {
    reference_version: String,
    sample_names: Vec<String>,
    orthology_matrix: AbundanceMatrix,
    reaction_matrix: ReactionMatrix,
    coverage: IndexMap<String, f64>,
}

impl KeggMatrix {
    /// Builds both matrices from matrix text lines.
    ///
    /// # Arguments
    ///
    /// * `reference` - Loaded reaction → ortholog mapping.
    /// * `parser` - Parser configured with the matrix delimiter.
    /// * `lines` - The abundance matrix, header first.
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The engine, or the first format error in the matrix.
    pub fn new<I, S>(reference: &ReferenceMapping, parser: MatrixParser, lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        info!("Parsing input matrix");
        let parsed = parser.parse_lines(lines)?;
        Ok(Self::from_parsed(reference, parsed))
    }

    /// Builds both matrices from a reader over the matrix text.
    pub fn from_reader<R: Read>(
        reference: &ReferenceMapping,
        parser: MatrixParser,
        reader: R,
    ) -> Result<Self> {
        info!("Parsing input matrix");
        let parsed = parser.parse_reader(reader)?;
        Ok(Self::from_parsed(reference, parsed))
    }

    fn from_parsed(reference: &ReferenceMapping, parsed: ParsedMatrix) -> Self {
        let ParsedMatrix {
            sample_names,
            matrix,
        } = parsed;
        info!(
            "Parsed {} orthologs across {} samples",
            matrix.feature_names().len(),
            sample_names.len()
        );

        info!(
            "Calculating reaction abundances with reference version {}",
            reference.version()
        );
        let reaction_matrix = aggregate(reference, &matrix);
        let coverage = coverage(reference, &matrix);
        info!("Done");

        KeggMatrix {
            reference_version: reference.version().to_string(),
            sample_names,
            orthology_matrix: matrix,
            reaction_matrix,
            coverage,
        }
    }

    pub fn reference_version(&self) -> &str {
        &self.reference_version
    }

    /// Samples in input header order.
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn orthology_matrix(&self) -> &AbundanceMatrix {
        &self.orthology_matrix
    }

    pub fn reaction_matrix(&self) -> &ReactionMatrix {
        &self.reaction_matrix
    }

    /// Per-sample fraction of the reference's orthologs found in the input.
    pub fn coverage(&self) -> &IndexMap<String, f64> {
        &self.coverage
    }

    /// Mean reaction abundances over `samples`.
    ///
    /// A failed query leaves the engine usable for other selections.
    pub fn group_abundances<S: AsRef<str>>(&self, samples: &[S]) -> Result<GroupAverage> {
        Ok(group_average(&self.reaction_matrix, samples)?)
    }

    /// Mean reaction abundances for every named group.
    pub fn grouped_abundances(
        &self,
        groups: &IndexMap<String, Vec<String>>,
    ) -> Result<IndexMap<String, GroupAverage>> {
        Ok(group_averages(&self.reaction_matrix, groups)?)
    }
}
