//! Core schema types for content collections.
//!
//! This crate defines the data model shared by the inference engine, the
//! project layer and the CLI:
//!
//! - [`FieldType`]: the canonical type of a frontmatter field (string,
//!   number, boolean, date, array, enum).
//! - [`FieldSchema`]: a field's type plus whether it is required.
//! - [`Schema`]: an ordered mapping of field name to [`FieldSchema`].
//!
//! [`Schema::default_schema`] is the fixed fallback used whenever no
//! collection schema can be inferred.
//!
//! # Example
//!
//! ```
//! use content_schema_core::*;
//!
//! let mut schema = Schema::new();
//! schema.insert("title", FieldSchema::required(FieldType::String));
//! schema.insert("draft", FieldSchema::optional(FieldType::Boolean));
//!
//! assert_eq!(schema.len(), 2);
//! assert!(schema.get("title").unwrap().required);
//! assert!(!Schema::default_schema().is_empty());
//! ```

mod schema;
mod types;

pub use schema::Schema;
pub use types::*;
