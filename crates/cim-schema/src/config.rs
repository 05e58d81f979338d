//! Resolution configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

const MRID_COMMENT: &str = "Master resource identifier issued by a model authority. The mRID is unique within an exchange context. Global uniqueness is easily achieved by using a UUID, as specified in RFC 4122, for the mRID. The use of UUID is strongly recommended. For CIMXML data files in RDF syntax conforming to IEC 61970-552, the mRID is mapped to rdf:ID or rdf:about attributes that identify CIM object elements.";

/// Template of the identity attribute synthesized for top-level concrete classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityAttribute {
    pub id: String,
    pub label: String,
    pub comment: String,
}

impl Default for IdentityAttribute {
    fn default() -> Self {
        Self {
            id: "MRID".to_string(),
            label: "mRID".to_string(),
            comment: MRID_COMMENT.to_string(),
        }
    }
}

/// Configuration for the resolution pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Profile ranked first and preferred on canonical-origin ties
    pub base_profile: String,
    /// Class that already owns the identity attribute
    pub identity_root: String,
    /// Fallback namespace for declarations without one
    pub base_namespace: String,
    /// Ignore a `cim` prefix declared by the documents
    pub force_base_namespace: bool,
    pub identity_attribute: IdentityAttribute,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            base_profile: "EQ".to_string(),
            identity_root: "IdentifiedObject".to_string(),
            base_namespace: "http://iec.ch/TC57/CIM100#".to_string(),
            force_base_namespace: false,
            identity_attribute: IdentityAttribute::default(),
        }
    }
}

impl ResolveConfig {
    /// Set the base profile keyword
    #[must_use]
    pub fn with_base_profile(mut self, keyword: impl Into<String>) -> Self {
        self.base_profile = keyword.into();
        self
    }

    /// Set the identity root class
    #[must_use]
    pub fn with_identity_root(mut self, id: impl Into<String>) -> Self {
        self.identity_root = id.into();
        self
    }

    /// Set the fallback namespace
    #[must_use]
    pub fn with_base_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.base_namespace = namespace.into();
        self
    }

    /// Always use the configured namespace, even if documents declare `cim`
    #[must_use]
    pub fn with_forced_base_namespace(mut self, force: bool) -> Self {
        self.force_base_namespace = force;
        self
    }

    /// Replace the identity attribute template
    #[must_use]
    pub fn with_identity_attribute(mut self, identity: IdentityAttribute) -> Self {
        self.identity_attribute = identity;
        self
    }

    /// Load from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parse from a JSON string; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("JSON parse error: {e}")))
    }

    /// Parse from a YAML string; missing fields keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("YAML parse error: {e}")))
    }
}
