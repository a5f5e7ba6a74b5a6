//! Recently opened projects, persisted as JSON.
//!
//! ```json
//! { "recentProjects": [ { "path": "/work/blog", "name": "blog", "lastOpened": "2024-05-01T09:30:00.000Z" } ] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::project::content_dir_of;

/// One remembered project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    pub path: PathBuf,
    /// Directory name of `path`.
    pub name: String,
    /// RFC 3339 timestamp of the last open.
    pub last_opened: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    recent_projects: Vec<RecentProject>,
}

/// Most-recent-first list of projects backed by a JSON file.
#[derive(Debug, Clone)]
pub struct RecentProjects {
    store: PathBuf,
    capacity: usize,
}

impl RecentProjects {
    /// Opens the store at `store`, keeping at most `capacity` entries.
    pub fn new(store: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            store: store.into(),
            capacity,
        }
    }

    /// Location of the backing file.
    pub fn store_path(&self) -> &Path {
        &self.store
    }

    /// Entries whose project still has a content directory.
    ///
    /// Stale entries are dropped from the store.
    pub fn list(&self) -> Result<Vec<RecentProject>> {
        let entries = self.read();
        let total = entries.len();
        let valid: Vec<_> = entries
            .into_iter()
            .filter(|entry| content_dir_of(&entry.path).is_dir())
            .collect();

        if valid.len() != total {
            debug!(pruned = total - valid.len(), "Pruning stale recent projects");
            self.write(&valid)?;
        }
        Ok(valid)
    }

    /// Moves `path` to the front of the list, inserting it if needed.
    pub fn add(&self, path: impl AsRef<Path>) -> Result<Vec<RecentProject>> {
        let path = path.as_ref();
        let mut entries: Vec<_> = self
            .read()
            .into_iter()
            .filter(|entry| entry.path != path)
            .collect();

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        entries.insert(
            0,
            RecentProject {
                path: path.to_path_buf(),
                name,
                last_opened: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        );
        entries.truncate(self.capacity);

        self.write(&entries)?;
        Ok(entries)
    }

    /// Forgets `path` and returns the remaining entries.
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<Vec<RecentProject>> {
        let path = path.as_ref();
        let entries: Vec<_> = self
            .read()
            .into_iter()
            .filter(|entry| entry.path != path)
            .collect();
        self.write(&entries)?;
        Ok(entries)
    }

    fn read(&self) -> Vec<RecentProject> {
        let text = match fs::read_to_string(&self.store) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.store.display(), error = %e, "Failed to read recent projects");
                return Vec::new();
            }
        };
        match serde_json::from_str::<StoreFile>(&text) {
            Ok(file) => file.recent_projects,
            Err(e) => {
                warn!(path = %self.store.display(), error = %e, "Ignoring corrupt recent projects store");
                Vec::new()
            }
        }
    }

    fn write(&self, entries: &[RecentProject]) -> Result<()> {
        if let Some(parent) = self.store.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = StoreFile {
            recent_projects: entries.to_vec(),
        };
        fs::write(&self.store, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
