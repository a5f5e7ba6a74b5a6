//! An Astro project on disk: its content directory, collections and
//! documents.

use std::fs;
use std::path::{Path, PathBuf};

use content_schema_core::Schema;
use content_schema_inference::{Inference, infer_schema};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::error::{ProjectError, Result};
use crate::frontmatter::read_document;

/// `src/content` under `root`.
pub(crate) fn content_dir_of(root: &Path) -> PathBuf {
    root.join("src").join("content")
}

/// A subdirectory of the content directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub name: String,
    pub path: PathBuf,
}

/// A document listed in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    /// File name including the extension.
    pub name: String,
    pub path: PathBuf,
    /// Start of the body on one line; empty if the file could not be read.
    pub preview: String,
    pub collection: String,
}

/// An opened project.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    content_dir: PathBuf,
    config: EditorConfig,
}

impl Project {
    /// Opens the project at `root` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`MissingContentDir`](ProjectError::MissingContentDir) if
    /// `root/src/content` is not a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(root, EditorConfig::default())
    }

    /// Opens the project at `root` with `config`.
    pub fn open_with_config(root: impl AsRef<Path>, config: EditorConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let content_dir = content_dir_of(&root);
        if !content_dir.is_dir() {
            return Err(ProjectError::MissingContentDir(root));
        }
        debug!(root = %root.display(), "Opened project");
        Ok(Self {
            root,
            content_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// First configured content config candidate that exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .config_files
            .iter()
            .map(|candidate| self.root.join(candidate))
            .find(|path| path.is_file())
    }

    /// Text of the content config file, `None` when the project has none.
    pub fn config_source(&self) -> Result<Option<String>> {
        match self.config_path() {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }

    /// Infers the schema of `collection`, reporting how it was obtained.
    ///
    /// A config file that exists but cannot be read counts as absent.
    pub fn infer_collection_schema(&self, collection: &str) -> Inference {
        let source = self.config_source().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read content config");
            None
        });
        infer_schema(source.as_deref(), collection)
    }

    /// Schema of `collection`; the default schema when it cannot be inferred.
    pub fn collection_schema(&self, collection: &str) -> Schema {
        self.infer_collection_schema(collection).schema
    }

    /// Collections sorted by name.
    pub fn collections(&self) -> Result<Vec<Collection>> {
        let mut collections = Vec::new();
        for entry in fs::read_dir(&self.content_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            collections.push(Collection {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }
        collections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collections)
    }

    /// Looks up a collection by name.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        let path = self.content_dir.join(name);
        if name.is_empty() || name.contains(['/', '\\']) || !path.is_dir() {
            return Err(ProjectError::CollectionNotFound(name.to_string()));
        }
        Ok(Collection {
            name: name.to_string(),
            path,
        })
    }

    /// Documents of one collection, sorted by file name.
    pub fn documents(&self, collection: &Collection) -> Result<Vec<DocumentEntry>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&collection.path)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && self.config.is_document(&path) {
                files.push(path);
            }
        }
        files.sort();

        let length = self.config.preview_length;
        Ok(files
            .into_par_iter()
            .map(|path| DocumentEntry {
                name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                preview: preview_of(&path, length),
                collection: collection.name.clone(),
                path,
            })
            .collect())
    }

    /// Documents of every collection, grouped by collection name.
    pub fn all_documents(&self) -> Result<Vec<DocumentEntry>> {
        let mut all = Vec::new();
        for collection in self.collections()? {
            all.extend(self.documents(&collection)?);
        }
        Ok(all)
    }
}

fn preview_of(path: &Path, length: usize) -> String {
    match read_document(path) {
        Ok(document) => document.preview(length),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No preview for document");
            String::new()
        }
    }
}
