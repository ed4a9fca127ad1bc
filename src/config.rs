//! Run configuration resolved from command-line arguments.
//!
//! This is the only place that knows where the reference data lives; the
//! core types receive an already-loaded [`ReferenceMapping`] and matrix text.

use crate::cli::Cli;
use crate::error::ReferenceLoadError;
use crate::parser::MatrixParser;
use crate::reference::{load_reference, ReferenceMapping};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DATA_DIR_ENV: &str = "KEGG_MATRIX_DATA";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub matrix: PathBuf,
    pub data_dir: PathBuf,
    /// Overrides the version read from the data directory.
    pub reference_version: Option<String>,
    pub delimiter: u8,
    pub metadata: Option<PathBuf>,
    /// Reaction matrix destination; stdout when `None`.
    pub output: Option<PathBuf>,
    /// Group averages destination; stdout when `None`.
    pub group_output: Option<PathBuf>,
    /// Write both outputs as JSON instead of delimited tables.
    pub json: bool,
    pub summary: bool,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.metadata.is_some() && cli.output.is_none() && cli.group_output.is_none() {
            bail!("--metadata needs --output or --group-output so both tables do not share stdout");
        }
        if cli.metadata.is_none() && cli.group_output.is_some() {
            bail!("--group-output requires --metadata");
        }

        Ok(Settings {
            matrix: cli.matrix.clone(),
            data_dir: cli.data_dir.clone(),
            reference_version: cli.reference_version.clone(),
            delimiter: cli.delimiter,
            metadata: cli.metadata.clone(),
            output: cli.output.clone(),
            group_output: cli.group_output.clone(),
            json: cli.json,
            summary: cli.summary,
        })
    }

    pub fn parser(&self) -> MatrixParser {
        MatrixParser::new(self.delimiter)
    }

    pub fn load_reference(&self) -> std::result::Result<ReferenceMapping, ReferenceLoadError> {
        load_reference(&self.data_dir, self.reference_version.as_deref())
    }
}

/// Parses a delimiter argument: a single ASCII character, or `tab` / `\t`.
pub fn parse_delimiter(raw: &str) -> std::result::Result<u8, String> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        _ if raw.len() == 1 && raw.is_ascii() => Ok(raw.as_bytes()[0]),
        _ => Err(format!(
            "delimiter must be a single ASCII character or 'tab', got '{raw}'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("::").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_settings_from_cli() {
        let cli = Cli::try_parse_from([
            "kegg_matrix",
            "--matrix",
            "ko.tsv",
            "--data-dir",
            "/opt/kegg",
            "--reference-version",
            "2024.1",
            "--delimiter",
            ",",
            "--output",
            "reactions.tsv",
        ])
        .unwrap();
        let settings = Settings::from_cli(&cli).unwrap();

        assert_eq!(settings.matrix, PathBuf::from("ko.tsv"));
        assert_eq!(settings.data_dir, PathBuf::from("/opt/kegg"));
        assert_eq!(settings.reference_version.as_deref(), Some("2024.1"));
        assert_eq!(settings.parser().delimiter(), b',');
        assert_eq!(settings.output, Some(PathBuf::from("reactions.tsv")));
        assert!(!settings.json);
        assert!(!settings.summary);
    }

    #[test]
    fn test_metadata_requires_a_file_output() {
        let cli = Cli::try_parse_from(["kegg_matrix", "-m", "ko.tsv", "-g", "groups.tsv"]).unwrap();
        assert!(Settings::from_cli(&cli).is_err());

        let cli = Cli::try_parse_from([
            "kegg_matrix",
            "-m",
            "ko.tsv",
            "-g",
            "groups.tsv",
            "--group-output",
            "averages.tsv",
        ])
        .unwrap();
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.group_output, Some(PathBuf::from("averages.tsv")));
        assert_eq!(settings.parser().delimiter(), b'\t');
    }

    #[test]
    fn test_json_flag() {
        let cli = Cli::try_parse_from(["kegg_matrix", "-m", "ko.tsv", "--json"]).unwrap();
        assert!(Settings::from_cli(&cli).unwrap().json);
    }
}
