//! Parsing of delimited ortholog abundance matrices.
//!
//! Expected format:
//! - First row: header; column 0 is ignored, columns 1..N are sample names
//! - Subsequent rows: ortholog ID followed by one abundance per sample
//!
//! Row and column indices reported in errors are 0-based, with the header
//! as row 0 and the ortholog ID as column 0.

use crate::count_table::{AbundanceMatrix, FeatureAbundances};
use crate::error::FormatError;
use csv::{ReaderBuilder, StringRecord, Trim};
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Read;

/// Tab, as written by the usual ortholog profiling tools.
pub const DEFAULT_DELIMITER: u8 = b'\t';

/// Output of [`MatrixParser`]: the header's sample order and the parsed matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMatrix {
    pub sample_names: Vec<String>,
    pub matrix: AbundanceMatrix,
}

/// Turns delimited text into an [`AbundanceMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixParser {
    delimiter: u8,
}

impl Default for MatrixParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl MatrixParser {
    pub fn new(delimiter: u8) -> Self {
        MatrixParser { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Parses a sequence of text lines (without trailing newlines).
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<ParsedMatrix, FormatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        self.parse_reader(text.as_bytes())
    }

    /// Parses a complete matrix held in memory.
    pub fn parse_str(&self, text: &str) -> Result<ParsedMatrix, FormatError> {
        self.parse_reader(text.as_bytes())
    }

    /// Parses a matrix from any reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - Source of the delimited text, header first.
    ///
    /// # Returns
    ///
    /// * `Result<ParsedMatrix, FormatError>` - Sample order and matrix, or the first
    ///   malformed header, row or cell encountered.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParsedMatrix, FormatError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let mut records = rdr
            .records()
            .enumerate()
            .filter(|(_, record)| !matches!(record, Ok(r) if is_blank(r)));

        let (_, header) = records.next().ok_or(FormatError::MissingHeader)?;
        let header = header?;
        let sample_names = parse_header(&header)?;
        let expected = sample_names.len() + 1;

        let mut columns: IndexMap<String, FeatureAbundances> = sample_names
            .iter()
            .map(|name| (name.clone(), FeatureAbundances::new()))
            .collect();
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for (idx, record) in records {
            let record = record?;
            let row = row_index(&record, idx);

            if record.len() != expected {
                return Err(FormatError::ColumnCount {
                    row,
                    expected,
                    actual: record.len(),
                });
            }

            let ortholog = &record[0];
            if ortholog.is_empty() {
                return Err(FormatError::EmptyOrtholog { row });
            }
            if let Some(previous) = first_seen.insert(ortholog.to_string(), row) {
                warn!(
                    "Ortholog '{}' appears at rows {} and {}; keeping the last occurrence",
                    ortholog, previous, row
                );
            }

            for (offset, sample) in sample_names.iter().enumerate() {
                let column = offset + 1;
                let raw = &record[column];
                let abundance: f64 = raw.parse().map_err(|_| FormatError::InvalidValue {
                    value: raw.to_string(),
                    row,
                    column,
                })?;
                if let Some(features) = columns.get_mut(sample) {
                    features.insert(ortholog.to_string(), abundance);
                }
            }
        }

        debug!(
            "Parsed {} orthologs across {} samples",
            first_seen.len(),
            sample_names.len()
        );

        Ok(ParsedMatrix {
            sample_names,
            matrix: AbundanceMatrix::from_columns(columns),
        })
    }
}

fn parse_header(header: &StringRecord) -> Result<Vec<String>, FormatError> {
    if header.len() < 2 {
        return Err(FormatError::NoSamples);
    }
    let mut seen = IndexSet::new();
    for (column, sample) in header.iter().enumerate().skip(1) {
        if sample.is_empty() {
            return Err(FormatError::EmptySample { column });
        }
        if !seen.insert(sample.to_string()) {
            return Err(FormatError::DuplicateSample {
                sample: sample.to_string(),
                column,
            });
        }
    }
    Ok(seen.into_iter().collect())
}

// A whitespace-only line trims down to a single empty field.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record[0].is_empty()
}

// Line numbers from csv are 1-based and count skipped blank lines.
fn row_index(record: &StringRecord, fallback: usize) -> usize {
    record
        .position()
        .map(|pos| pos.line().saturating_sub(1) as usize)
        .unwrap_or(fallback)
}
