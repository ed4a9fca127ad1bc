//! Input/Output operations module.
//!
//! Handles opening abundance matrices (plain or gzip-compressed) and writing
//! reaction matrices and group averages as delimited tables or JSON.

use crate::count_table::ReactionMatrix;
use crate::error::Result;
use crate::group::GroupAverage;
use flate2::read::MultiGzDecoder;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Placeholder written for a value that is absent from a table.
pub const MISSING_VALUE: &str = "NA";

/// Opens a matrix file, decompressing it when the name ends in `.gz`.
pub fn open_matrix(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let gzipped = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if gzipped {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Opens `path` for writing, or stdout when no path is given.
pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(std::io::stdout().lock()))),
    }
}

/// Writes a reaction matrix as a delimited table.
///
/// # Arguments
///
/// * `matrix` - The reaction matrix to write.
/// * `writer` - Destination.
/// * `delimiter` - Field separator.
///
/// # Returns
///
/// * `Result<()>` - Ok(()) if writing was successful, or an error.
pub fn write_reaction_matrix<W: Write>(
    matrix: &ReactionMatrix,
    writer: W,
    delimiter: u8,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    // Header: "reaction" followed by sample names
    let samples = matrix.sample_names();
    let mut header = vec!["reaction"];
    header.extend(samples.iter().copied());
    writer.write_record(&header)?;

    for reaction in matrix.feature_names() {
        let mut record = Vec::with_capacity(samples.len() + 1);
        record.push(reaction.to_string());
        for sample in &samples {
            record.push(format_value(matrix.get(sample, reaction)));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes one column of averages per group.
pub fn write_group_averages<W: Write>(
    averages: &IndexMap<String, GroupAverage>,
    writer: W,
    delimiter: u8,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    let mut header = vec!["reaction"];
    header.extend(averages.keys().map(String::as_str));
    writer.write_record(&header)?;

    let reactions: IndexSet<&str> = averages
        .values()
        .flat_map(|average| average.iter().map(|(reaction, _)| reaction))
        .collect();
    for reaction in reactions {
        let mut record = Vec::with_capacity(averages.len() + 1);
        record.push(reaction.to_string());
        for average in averages.values() {
            record.push(format_value(average.get(reaction)));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes any serializable result (a [`ReactionMatrix`], or group averages
/// keyed by group) as pretty-printed JSON.
///
/// JSON has no non-finite numbers; `NaN` and infinities are written as `null`.
pub fn write_json<T, W>(value: &T, mut writer: W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads a reaction matrix previously written by [`write_json`].
pub fn read_reaction_matrix_json<R: Read>(reader: R) -> Result<ReactionMatrix> {
    Ok(serde_json::from_reader(reader)?)
}

fn format_value(value: Option<f64>) -> String {
    value.map_or(MISSING_VALUE.to_string(), |v| v.to_string())
}
