//! The specification aggregate handed to emitters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ResolveConfig;
use crate::model::{CimDatatype, CimEnum, CimOntology, CimPrimitive, CimType};
use crate::{Error, Result};

/// Merged and resolved schema of a set of profile documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub types: BTreeMap<String, CimType>,
    pub enums: BTreeMap<String, CimEnum>,
    pub datatypes: BTreeMap<String, CimDatatype>,
    pub primitives: BTreeMap<String, CimPrimitive>,
    /// Profile headers keyed by keyword
    pub ontologies: BTreeMap<String, CimOntology>,
    /// Declared prefix → namespace URI, plus `base`
    pub namespaces: BTreeMap<String, String>,
    /// Prefixes actually referenced by declarations
    pub used_namespaces: BTreeMap<String, String>,
    /// Profile keywords in priority order
    pub profile_order: Vec<String>,
}

/// Entity counts of a specification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationStats {
    pub types: usize,
    pub enums: usize,
    pub datatypes: usize,
    pub primitives: usize,
    pub ontologies: usize,
    pub attributes: usize,
    pub enum_values: usize,
}

impl Specification {
    /// Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the resolution pipeline over the merged content
    pub fn resolve(&mut self, config: &ResolveConfig) {
        crate::resolve::run(self, config);
    }

    /// Ontologies in priority order
    pub fn ontologies_by_priority(&self) -> Vec<&CimOntology> {
        let mut ontologies: Vec<&CimOntology> = self.ontologies.values().collect();
        ontologies.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        ontologies
    }

    /// Count the entities held by the specification
    pub fn stats(&self) -> SpecificationStats {
        SpecificationStats {
            types: self.types.len(),
            enums: self.enums.len(),
            datatypes: self.datatypes.len(),
            primitives: self.primitives.len(),
            ontologies: self.ontologies.len(),
            attributes: self.types.values().map(|t| t.attributes.len()).sum(),
            enum_values: self.enums.values().map(|e| e.values.len()).sum(),
        }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Dump(format!("JSON: {e}")))
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Dump(format!("YAML: {e}")))
    }

    /// Write a structured dump, YAML for `.yaml`/`.yml` and JSON otherwise
    pub fn write_dump(&self, path: &Path) -> Result<()> {
        let content = if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.to_yaml()?
        } else {
            self.to_json_pretty()?
        };

        std::fs::write(path, content).map_err(|e| Error::io(path.display().to_string(), e))
    }
}
