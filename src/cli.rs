use crate::config::{parse_delimiter, Settings, DATA_DIR_ENV, DEFAULT_DATA_DIR};
use crate::engine::KeggMatrix;
use crate::io::{
    create_output, open_matrix, write_group_averages, write_json, write_reaction_matrix,
};
use crate::metadata::load_metadata;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn};
use std::path::PathBuf;

/// Convert an ortholog (KO) abundance matrix into reaction abundances.
#[derive(Parser, Debug)]
#[command(name = "kegg_matrix", author, version, about, long_about = None)]
pub struct Cli {
    /// Ortholog abundance matrix; gzip-compressed when ending in .gz
    #[arg(short, long)]
    pub matrix: PathBuf,

    /// Directory holding VERSION and reaction_to_orthology.<VERSION>.json
    #[arg(short, long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Reference version to load instead of the one in VERSION
    #[arg(long)]
    pub reference_version: Option<String>,

    /// Field separator of the matrix and of the written tables
    #[arg(long, default_value = "tab", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Sample grouping file with Sample and Group columns
    #[arg(short = 'g', long)]
    pub metadata: Option<PathBuf>,

    /// Output path for the reaction matrix (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output path for the group averages (stdout if omitted)
    #[arg(long)]
    pub group_output: Option<PathBuf>,

    /// Write the reaction matrix and group averages as JSON
    #[arg(long)]
    pub json: bool,

    /// Log how much of the reference each sample covers
    #[arg(long)]
    pub summary: bool,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(&cli)?;
    info!("Starting with settings: {:?}", settings);

    let reference = settings
        .load_reference()
        .context("Failed to load the reaction to orthology reference")?;

    let reader = open_matrix(&settings.matrix)
        .with_context(|| format!("Failed to open matrix {}", settings.matrix.display()))?;
    let engine = KeggMatrix::from_reader(&reference, settings.parser(), reader)
        .with_context(|| format!("Failed to read matrix {}", settings.matrix.display()))?;

    if settings.summary {
        for (sample, fraction) in engine.coverage() {
            info!(
                "Sample {}: {:.1}% of reference orthologs present",
                sample,
                fraction * 100.0
            );
        }
    }

    // Resolve every group before any output file is created.
    let averages = match &settings.metadata {
        Some(metadata_path) => {
            let metadata = load_metadata(metadata_path)
                .with_context(|| format!("Failed to load metadata {}", metadata_path.display()))?;
            for sample in engine.sample_names() {
                if !metadata.condition_map.contains_key(sample) {
                    warn!("Sample '{}' has no group in the metadata", sample);
                }
            }

            info!("Averaging {} groups", metadata.groups().len());
            let averages = engine
                .grouped_abundances(&metadata.groups())
                .context("Metadata description does not match the input matrix")?;
            Some(averages)
        }
        None => None,
    };

    info!("Writing reaction matrix");
    let output = create_output(settings.output.as_deref())?;
    let written = if settings.json {
        write_json(engine.reaction_matrix(), output)
    } else {
        write_reaction_matrix(engine.reaction_matrix(), output, settings.delimiter)
    };
    written.context("Failed to write reaction matrix")?;

    if let Some(averages) = averages {
        let output = create_output(settings.group_output.as_deref())?;
        let written = if settings.json {
            write_json(&averages, output)
        } else {
            write_group_averages(&averages, output, settings.delimiter)
        };
        written.context("Failed to write group averages")?;
    }

    info!("Done");
    Ok(())
}
