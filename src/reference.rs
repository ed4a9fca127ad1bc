//! Versioned reaction → ortholog reference mapping.
//!
//! The mapping is consumed, not computed: it is loaded once from a data
//! directory holding a `VERSION` file and one serialized artifact per
//! version, `reaction_to_orthology.<VERSION>.json`, whose content is a JSON
//! object of reaction IDs to arrays of ortholog IDs.

use crate::error::ReferenceLoadError;
use indexmap::{IndexMap, IndexSet};
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

pub const VERSION_FILE: &str = "VERSION";
pub const ARTIFACT_STEM: &str = "reaction_to_orthology";
pub const ARTIFACT_EXTENSION: &str = "json";

/// Orthologs realizing one reaction, in artifact order.
pub type OrthologSet = IndexSet<String>;

/// Mapping from reaction ID to the set of ortholog IDs that catalyze it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMapping {
    version: String,
    reactions: IndexMap<String, OrthologSet>,
}

impl ReferenceMapping {
    pub fn new(version: impl Into<String>, reactions: IndexMap<String, OrthologSet>) -> Self {
        ReferenceMapping {
            version: version.into(),
            reactions,
        }
    }

    /// Builds a mapping from `(reaction, orthologs)` pairs.
    ///
    /// A reaction listed twice keeps the union of its orthologs.
    pub fn from_pairs<I, O, R, K>(version: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, O)>,
        O: IntoIterator<Item = K>,
        R: Into<String>,
        K: Into<String>,
    {
        let mut reactions: IndexMap<String, OrthologSet> = IndexMap::new();
        for (reaction, orthologs) in pairs {
            reactions
                .entry(reaction.into())
                .or_default()
                .extend(orthologs.into_iter().map(Into::into));
        }
        Self::new(version, reactions)
    }

    /// Deserializes the JSON artifact for a given version.
    ///
    /// # Arguments
    ///
    /// * `version` - Version the artifact belongs to.
    /// * `reader` - JSON object of reaction IDs to ortholog ID arrays.
    /// * `source` - Path reported in errors.
    pub fn from_json_reader<R: Read>(
        version: impl Into<String>,
        reader: R,
        source: &Path,
    ) -> Result<Self, ReferenceLoadError> {
        let version = version.into();
        let raw: IndexMap<String, Vec<String>> =
            serde_json::from_reader(reader).map_err(|e| ReferenceLoadError::Deserialize {
                path: source.to_path_buf(),
                source: e,
            })?;
        if raw.is_empty() {
            return Err(ReferenceLoadError::NoReactions(version));
        }

        let empty = raw.values().filter(|orthologs| orthologs.is_empty()).count();
        if empty > 0 {
            warn!(
                "{} reactions in reference version {} list no orthologs; they will aggregate to 0",
                empty, version
            );
        }

        Ok(Self::from_pairs(version, raw))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of reactions.
    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    pub fn orthologs(&self, reaction: &str) -> Option<&OrthologSet> {
        self.reactions.get(reaction)
    }

    /// Iterates over `(reaction, orthologs)` in artifact order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OrthologSet)> {
        self.reactions
            .iter()
            .map(|(reaction, orthologs)| (reaction.as_str(), orthologs))
    }

    pub fn reactions(&self) -> impl Iterator<Item = &str> {
        self.reactions.keys().map(String::as_str)
    }

    /// Distinct orthologs referenced by any reaction.
    pub fn ortholog_universe(&self) -> IndexSet<&str> {
        self.reactions
            .values()
            .flat_map(|orthologs| orthologs.iter().map(String::as_str))
            .collect()
    }
}

/// Path of the serialized mapping for `version` inside `data_dir`.
pub fn artifact_path(data_dir: &Path, version: &str) -> PathBuf {
    data_dir.join(format!("{ARTIFACT_STEM}.{version}.{ARTIFACT_EXTENSION}"))
}

/// Reads the reference version from the first line of `data_dir/VERSION`.
pub fn read_version(data_dir: &Path) -> Result<String, ReferenceLoadError> {
    let path = data_dir.join(VERSION_FILE);
    let content = fs::read_to_string(&path).map_err(|e| ReferenceLoadError::Io {
        path: path.clone(),
        source: e,
    })?;
    let version = content.lines().next().unwrap_or_default().trim();
    if version.is_empty() {
        return Err(ReferenceLoadError::EmptyVersion { path });
    }
    Ok(version.to_string())
}

/// Loads a mapping artifact from an explicit path.
pub fn load_reference_file(
    path: &Path,
    version: &str,
) -> Result<ReferenceMapping, ReferenceLoadError> {
    let file = File::open(path).map_err(|e| ReferenceLoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    ReferenceMapping::from_json_reader(version, BufReader::new(file), path)
}

/// Resolves the version (explicit or from `VERSION`) and loads the matching artifact.
///
/// # Arguments
///
/// * `data_dir` - Directory holding `VERSION` and the versioned artifacts.
/// * `version` - Explicit version; when `None` it is read from `VERSION`.
///
/// # Returns
///
/// * `Result<ReferenceMapping, ReferenceLoadError>` - The mapping, or why it could not be resolved.
pub fn load_reference(
    data_dir: &Path,
    version: Option<&str>,
) -> Result<ReferenceMapping, ReferenceLoadError> {
    let version = match version {
        Some(v) => v.trim().to_string(),
        None => read_version(data_dir)?,
    };
    let path = artifact_path(data_dir, &version);
    info!(
        "Loading reaction to orthology mapping version {} from {}",
        version,
        path.display()
    );
    let reference = load_reference_file(&path, &version)?;
    info!("Loaded {} reactions", reference.len());
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        write!(file, "{}", content).unwrap();
    }

    #[test]
    fn test_from_pairs_merges_repeated_reactions() {
        let reference = ReferenceMapping::from_pairs(
            "test",
            [("R1", vec!["K1", "K2"]), ("R2", vec!["K3"]), ("R1", vec!["K2", "K4"])],
        );
        assert_eq!(reference.len(), 2);
        let r1: Vec<&str> = reference
            .orthologs("R1")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(r1, vec!["K1", "K2", "K4"]);
        let universe: Vec<&str> = reference.ortholog_universe().into_iter().collect();
        assert_eq!(universe, vec!["K1", "K2", "K4", "K3"]);
    }

    #[test]
    fn test_load_reference_uses_version_file() {
        let dir = tempdir().unwrap();
        write_file(&dir.path().join(VERSION_FILE), "2024.1\nignored\n");
        write_file(
            &artifact_path(dir.path(), "2024.1"),
            r#"{"R00001": ["K00001", "K00002"], "R00002": []}"#,
        );

        let reference = load_reference(dir.path(), None).unwrap();
        assert_eq!(reference.version(), "2024.1");
        assert_eq!(reference.len(), 2);
        assert_eq!(reference.reactions().collect::<Vec<_>>(), vec!["R00001", "R00002"]);
        assert!(reference.orthologs("R00002").unwrap().is_empty());
    }

    #[test]
    fn test_explicit_version_overrides_file() {
        let dir = tempdir().unwrap();
        write_file(&artifact_path(dir.path(), "v2"), r#"{"R1": ["K1"]}"#);

        let reference = load_reference(dir.path(), Some("v2")).unwrap();
        assert_eq!(reference.version(), "v2");
    }

    #[test]
    fn test_load_failures() {
        let dir = tempdir().unwrap();

        let err = load_reference(dir.path(), None).unwrap_err();
        assert!(matches!(err, ReferenceLoadError::Io { .. }));

        write_file(&dir.path().join(VERSION_FILE), "  \n");
        let err = load_reference(dir.path(), None).unwrap_err();
        assert!(matches!(err, ReferenceLoadError::EmptyVersion { .. }));

        write_file(&dir.path().join(VERSION_FILE), "v1\n");
        let err = load_reference(dir.path(), None).unwrap_err();
        assert!(matches!(err, ReferenceLoadError::Io { .. }));

        write_file(&artifact_path(dir.path(), "v1"), "{not json");
        let err = load_reference(dir.path(), None).unwrap_err();
        assert!(matches!(err, ReferenceLoadError::Deserialize { .. }));

        write_file(&artifact_path(dir.path(), "v1"), "{}");
        let err = load_reference(dir.path(), None).unwrap_err();
        assert!(matches!(err, ReferenceLoadError::NoReactions(v) if v == "v1"));
    }
}
