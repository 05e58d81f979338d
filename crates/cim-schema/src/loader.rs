//! Profile document loader
//!
//! Discovers documents by glob pattern, decodes them one at a time and folds
//! them into a single resolved [`Specification`]. Documents are always merged
//! in sorted path order so the same inputs give the same output.

use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::config::ResolveConfig;
use crate::fragment::DocumentDraft;
use crate::specification::Specification;
use crate::{Error, Result};

/// Loads, merges and resolves a set of profile documents
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    config: ResolveConfig,
}

impl SchemaLoader {
    /// Create a loader with the given resolution settings
    pub fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Expand a glob pattern into a sorted list of document paths
    pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
        let entries = glob::glob(pattern).map_err(|e| Error::pattern(pattern, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path =
                entry.map_err(|e| Error::io(e.path().display().to_string(), e.error()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(Error::NoDocuments(pattern.to_string()));
        }
        debug!(pattern, documents = paths.len(), "discovered profile documents");
        Ok(paths)
    }

    /// Load every document matching `pattern`
    pub fn load_pattern(&self, pattern: &str) -> Result<Specification> {
        let paths = Self::discover(pattern)?;
        self.load_files(&paths)
    }

    /// Load the given documents in sorted path order and resolve the result
    pub fn load_files(&self, paths: &[PathBuf]) -> Result<Specification> {
        let mut paths = paths.to_vec();
        paths.sort();

        let mut spec = Specification::new();
        for path in &paths {
            let draft = Self::read_document(path)?;
            spec.merge_document(draft);
        }

        spec.resolve(&self.config);
        Ok(spec)
    }

    /// Load in-memory documents given as `(name, content)` pairs.
    ///
    /// Names play the role of paths: they order the merge and label errors.
    pub fn load_from_strs(&self, documents: &[(&str, &str)]) -> Result<Specification> {
        let mut documents = documents.to_vec();
        documents.sort_by(|a, b| a.0.cmp(b.0));

        let mut spec = Specification::new();
        for (name, content) in documents {
            let document =
                cim_ir::decode_str(content).map_err(|e| Error::structural(name, e))?;
            let keyword = fallback_keyword(Path::new(name));
            spec.merge_document(DocumentDraft::from_document(&document, &keyword));
        }

        spec.resolve(&self.config);
        Ok(spec)
    }

    fn read_document(path: &Path) -> Result<DocumentDraft> {
        let shown = path.display().to_string();
        trace!(path = %shown, "reading profile document");

        let bytes = std::fs::read(path).map_err(|e| Error::io(shown.clone(), e))?;
        let document =
            cim_ir::decode(&bytes).map_err(|e| Error::structural(shown.clone(), e))?;
        let draft = DocumentDraft::from_document(&document, &fallback_keyword(path));

        info!(path = %shown, profile = %draft.keyword, "loaded profile document");
        Ok(draft)
    }
}

/// Profile keyword used when a document carries no ontology header
fn fallback_keyword(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
