//! Error types for schema wiring, content validation and migration
//!
//! Three families, matching how callers are expected to react:
//! - `SchemaError`: the registry itself is broken. Always fatal.
//! - `ValidationError`: the content is wrong. Carries every problem found.
//!   `ScriptError` is what whole-document validation returns: one or the other.
//! - `MigrationError`: a migration could not be applied. Always fatal.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A defect in the declarative schema (a programmer error, never content)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid component type \"{0}\".")]
    UnknownComponent(String),

    #[error("Invalid enum spec at \"{0}\": missing options.")]
    EmptyEnum(String),

    #[error("Invalid component \"{kind}\": {reason}")]
    InvalidComponent { kind: String, reason: String },

    #[error("Invalid resource type \"{0}\".")]
    UnknownResource(String),
}

/// One content problem, routed back to the collection that produced it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted/bracketed location, e.g. `pages[name=intro]`
    pub path: String,
    /// Owning collection name (`meta` for the meta block)
    pub collection: String,
    /// Human-readable description
    pub message: String,
}

impl FieldError {
    pub fn new(
        collection: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregate failure returned by whole-document validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Build the aggregate, summarizing the count and affected collections
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        let mut collections: Vec<&str> = Vec::new();
        for error in &errors {
            if !collections.contains(&error.collection.as_str()) {
                collections.push(&error.collection);
            }
        }
        let only_one = errors.len() == 1;
        let message = format!(
            "There {} {} error{} validating the following collections: {}.",
            if only_one { "was" } else { "were" },
            errors.len(),
            if only_one { "" } else { "s" },
            collections.join(", ")
        );
        Self { message, errors }
    }

    /// Affected collection names, in first-seen order
    pub fn collections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !seen.contains(&error.collection.as_str()) {
                seen.push(&error.collection);
            }
        }
        seen
    }
}

/// Outcome of validating a whole document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl ScriptError {
    /// Content errors, if this is a content failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ScriptError::Invalid(err) => &err.errors,
            ScriptError::Schema(_) => &[],
        }
    }
}

/// Errors raised while registering or applying migrations
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Migration {num} ({name}) failed: {source}")]
    Transform {
        num: u64,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Duplicate migration number {0}")]
    DuplicateNumber(u64),

    #[error("Migration {num} ({name}) fixture {index} does not match its expected output")]
    FixtureMismatch { num: u64, name: String, index: usize },

    #[error("Invalid meta block: {0}")]
    InvalidMeta(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
