#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # cim-schema
//!
//! Schema model, fragment classification, cross-document merge and the
//! resolution pipeline for CIM RDFS profile documents.
//!
//! Documents are decoded one at a time by `cim-ir`, classified into draft
//! records, merged into a [`Specification`] in a fixed path order and then
//! resolved by an ordered sequence of passes:
//! profile documents → drafts → merged specification → resolved specification

pub mod config;
pub mod fragment;
pub mod inheritance;
pub mod loader;
pub mod merge;
pub mod model;
pub mod resolve;
pub mod specification;
pub mod vocabulary;

pub use config::{IdentityAttribute, ResolveConfig};
pub use fragment::{DocumentDraft, FragmentKind};
pub use loader::SchemaLoader;
pub use model::{
    CimAttribute, CimDatatype, CimEnum, CimEnumValue, CimOntology, CimPrimitive, CimType,
    InverseLink, Multiplicity, ScalarKind, ValueKind,
};
pub use resolve::Pass;
pub use specification::{Specification, SpecificationStats};

use thiserror::Error;

/// Errors that can occur while loading, resolving or dumping a schema
#[derive(Error, Debug)]
pub enum Error {
    #[error("Structural error in {path}: {source}")]
    Structural {
        path: String,
        #[source]
        source: cim_ir::Error,
    },

    #[error("IO error for {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid file pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("No schema documents match pattern '{0}'")]
    NoDocuments(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Dump error: {0}")]
    Dump(String),
}

impl Error {
    /// Build a structural error carrying the offending document path.
    pub fn structural(path: impl Into<String>, source: cim_ir::Error) -> Self {
        Self::Structural {
            path: path.into(),
            source,
        }
    }

    /// Build an IO error with path context.
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Build an invalid-pattern error.
    pub fn pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
