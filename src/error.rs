//! Error handling for the typewalk model and walker
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling. All failures in
//! the crate surface as one `TypewalkError` family; the walker raises at
//! the point of detection and propagates unmodified, so callers catch at
//! the root of a walk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for model construction, resolution and walking
#[derive(Error, Debug)]
pub enum TypewalkError {
    /// A type reference could not be resolved against the registered
    /// namespaces (unknown namespace path, or unknown name).
    #[error("unresolved type reference: {message}")]
    UnresolvedType { message: String },

    /// A runtime value has no corresponding entry in the type model.
    #[error("no model entry for runtime type '{}' at '{}'", .type_name, .path.join("/"))]
    UnknownRuntimeType { type_name: String, path: Vec<String> },

    /// A runtime object's type name matches no registered datatype.
    #[error("no datatype registered for runtime type '{}' at '{}'", .type_name, .path.join("/"))]
    UnknownDatatype { type_name: String, path: Vec<String> },

    /// A collection-shaped value has no collection declaration in the model.
    #[error("no collection type registered for '{}' at '{}'", .type_name, .path.join("/"))]
    UnknownCollectionType { type_name: String, path: Vec<String> },

    /// An introspector get/set/construct operation failed, e.g. an attempted
    /// mutation of an immutable property without a compatible
    /// in-place-clearable collection.
    #[error("property access failed for {datatype}.{property}: {message}")]
    PropertyAccess {
        datatype: String,
        property: String,
        message: String,
    },

    /// The model description text failed to parse; carries the structured
    /// issue list reported by the parser.
    #[error("model description failed to parse: {message}")]
    ConfigParse {
        message: String,
        issues: Vec<ParseIssue>,
    },
}

/// A single structured issue reported while parsing a model description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    pub message: String,
}

impl ParseIssue {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl TypewalkError {
    /// Attach a walk path to an error raised below the walker, e.g. by an
    /// introspector. Errors that already carry a path keep it.
    pub(crate) fn at_path(self, path: &[String]) -> Self {
        match self {
            TypewalkError::PropertyAccess {
                datatype,
                property,
                message,
            } if !path.is_empty() => TypewalkError::PropertyAccess {
                datatype,
                property,
                message: format!("{} (at '{}')", message, path.join("/")),
            },
            other => other,
        }
    }
}
