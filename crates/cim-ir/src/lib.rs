#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cim-ir
//!
//! Dynamic value tree and markup decoder for CIM RDFS schema documents.
//!
//! The decoder does not know the grammar of the document it reads. It infers
//! from repetition alone whether a child element is a scalar, a single
//! structured record, or a homogeneous list, and strips the `Base.Derived`
//! inheritance prefix the CIM schema puts on re-declared element names.

/// Stack-based decoder turning one document into a value tree.
pub mod decoder;
/// Source positions attached to decode errors.
pub mod metadata;
/// Path navigation over decoded value trees.
pub mod traversal;
/// The dynamic value tree and its sibling promotion rules.
pub mod value;

/// Decode entry points.
pub use decoder::{decode, decode_str};
/// Line/column position inside a source document.
pub use metadata::Position;
/// Cursor for navigating decoded trees by path.
pub use traversal::Cursor;
/// Value tree primitives.
pub use value::{ATTRIBUTE_PREFIX, Item, Map, TEXT_KEY, Value, insert_child};

use thiserror::Error;

/// Errors that can occur while decoding or navigating a value tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Structural error at {position}: {message}")]
    Structural { position: Position, message: String },

    #[error("Mixed content in element '{element}' at {position}: text and child elements cannot be combined")]
    MixedContent { element: String, position: Position },

    #[error("Node not found at path: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl Error {
    /// Build a structural error for a malformed token stream.
    pub fn structural(position: Position, message: impl Into<String>) -> Self {
        Self::Structural {
            position,
            message: message.into(),
        }
    }

    /// Build a mixed-content error for the named element.
    pub fn mixed_content(element: impl Into<String>, position: Position) -> Self {
        Self::MixedContent {
            element: element.into(),
            position,
        }
    }

    /// Build a node-not-found error with path context.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;
