//! Reaction abundances from ortholog abundance matrices.
//!
//! Converts a per-sample table of ortholog (KO) abundances into a per-sample
//! table of reaction abundances through a versioned reaction → ortholog
//! reference mapping, and averages reaction abundances over sample groups.
//!
//! ```no_run
//! use kegg_matrix::{load_reference, KeggMatrix, MatrixParser};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let reference = load_reference(Path::new("data"), None)?;
//! let text = std::fs::read_to_string("ko_abundances.tsv")?;
//! let engine = KeggMatrix::new(&reference, MatrixParser::default(), text.lines())?;
//! let average = engine.group_abundances(&["gut_a", "gut_b"])?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod count_table;
pub mod engine;
pub mod error;
pub mod group;
pub mod io;
pub mod metadata;
pub mod parser;
pub mod reference;

pub use aggregate::aggregate;
pub use count_table::{AbundanceMatrix, ReactionMatrix, SampleTable};
pub use engine::KeggMatrix;
pub use error::{ConsistencyError, Error, FormatError, ReferenceLoadError, Result};
pub use group::{group_average, group_average_with_vocabulary, GroupAverage};
pub use parser::{MatrixParser, ParsedMatrix};
pub use reference::{load_reference, ReferenceMapping};
