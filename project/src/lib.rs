//! Project plumbing around content schema inference.
//!
//! Everything here is a thin filesystem or process wrapper:
//!
//! - [`Project`]: opens an Astro project, lists collections and documents,
//!   and reads the content config to infer collection schemas.
//! - [`Document`]: splits and renders YAML frontmatter.
//! - [`RecentProjects`]: the most-recently-opened list, persisted as JSON.
//! - [`DevServerManager`]: starts and stops the project's dev server.
//! - [`EditorConfig`]: YAML settings for all of the above.
//!
//! # Example
//!
//! ```no_run
//! use content_schema_project::Project;
//!
//! let project = Project::open("./my-site").unwrap();
//! for collection in project.collections().unwrap() {
//!     let schema = project.collection_schema(&collection.name);
//!     println!("{}: {:?}", collection.name, schema.names());
//! }
//! ```

pub mod config;
pub mod devserver;
pub mod error;
pub mod frontmatter;
pub mod project;
pub mod recent;

pub use config::{DevServerConfig, EditorConfig};
pub use devserver::{
    DevServerManager, PackageManager, ProjectStatus, StartedServer, StopOutcome, check_status,
};
pub use error::{ProjectError, Result};
pub use frontmatter::{Document, create_document, read_document, save_document};
pub use project::{Collection, DocumentEntry, Project};
pub use recent::{RecentProject, RecentProjects};
