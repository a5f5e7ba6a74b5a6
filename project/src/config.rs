//! Editor configuration.
//!
//! Defines the YAML-serializable settings that control where recent projects
//! are stored, how documents are listed and how the dev server is started.
//! Every key is optional; missing keys take their default.
//!
//! # Example YAML
//!
//! ```yaml
//! recent_projects_path: /home/me/.config/content-schema/recent-projects.json
//! max_recent_projects: 10
//! preview_length: 200
//! document_extensions: [md, mdx]
//! config_files:
//!   - src/content/config.ts
//!   - src/content.config.ts
//! dev_server:
//!   startup_timeout_ms: 30000
//!   default_port: 4321
//!   ready_markers: ["watching for file changes", "Local", "ready"]
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the recent-project store inside the config directory.
pub const RECENT_PROJECTS_FILE: &str = "recent-projects.json";

/// Settings for starting the project's dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// How long to wait for a ready marker before reporting success anyway.
    pub startup_timeout_ms: u64,
    /// Port reported when the server never prints one.
    pub default_port: u16,
    /// Output fragments that mean the server is ready.
    pub ready_markers: Vec<String>,
    /// Command overriding the detected package manager, e.g. `["make", "dev"]`.
    pub command: Option<Vec<String>>,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: 30_000,
            default_port: 4321,
            ready_markers: vec![
                "watching for file changes".to_string(),
                "Local".to_string(),
                "ready".to_string(),
            ],
            command: None,
        }
    }
}

/// Top-level editor configuration.
///
/// # Examples
///
/// ```
/// use content_schema_project::EditorConfig;
///
/// let config: EditorConfig = serde_yaml::from_str("preview_length: 80").unwrap();
/// assert_eq!(config.preview_length, 80);
/// assert_eq!(config.max_recent_projects, 10);
/// assert_eq!(config.dev_server.default_port, 4321);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Recent-project store; `None` uses [`default_config_dir`].
    pub recent_projects_path: Option<PathBuf>,
    /// Maximum number of remembered projects.
    pub max_recent_projects: usize,
    /// Number of body characters kept in document previews.
    pub preview_length: usize,
    /// File extensions listed as documents, without the dot.
    pub document_extensions: Vec<String>,
    /// Content config candidates relative to the project root, in lookup order.
    pub config_files: Vec<PathBuf>,
    /// Dev server settings.
    pub dev_server: DevServerConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            recent_projects_path: None,
            max_recent_projects: 10,
            preview_length: 200,
            document_extensions: vec!["md".to_string(), "mdx".to_string()],
            config_files: [
                "src/content/config.ts",
                "src/content/config.mts",
                "src/content/config.js",
                "src/content.config.ts",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            dev_server: DevServerConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ProjectError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ProjectError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ProjectError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ProjectError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Path of the recent-project store.
    pub fn recent_projects_path(&self) -> PathBuf {
        self.recent_projects_path
            .clone()
            .unwrap_or_else(|| default_config_dir().join(RECENT_PROJECTS_FILE))
    }

    /// Returns `true` if `path` has one of the document extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.document_extensions.iter().any(|known| known == ext))
    }
}

/// Directory holding the editor's own files.
pub fn default_config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("content-schema");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("content-schema");
    }
    std::env::temp_dir().join("content-schema")
}

/// Default location of the editor config file.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yml")
}
