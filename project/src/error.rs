//! Error types for project operations.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, frontmatter parsing, project layout and dev-server control.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during project operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The project root has no `src/content` directory.
    #[error("no src/content folder found in {}", .0.display())]
    MissingContentDir(PathBuf),

    /// No collection directory with this name exists.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Frontmatter block is present but is not a YAML mapping.
    #[error("invalid frontmatter: {0}")]
    InvalidFrontmatter(String),

    /// A new document's name is empty or contains a path.
    #[error("invalid document file name: {0}")]
    InvalidFileName(String),

    /// Refused to overwrite an existing document.
    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// The project has no `package.json`.
    #[error("no package.json found in {}", .0.display())]
    MissingPackageJson(PathBuf),

    /// The dev server could not be started.
    #[error("dev server error: {0}")]
    DevServer(String),
}

/// Convenience alias for results with [`ProjectError`].
pub type Result<T> = std::result::Result<T, ProjectError>;
