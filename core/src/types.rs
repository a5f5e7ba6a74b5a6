//! Field type definitions.
//!
//! The types here mirror the frontmatter shapes an editor knows how to
//! render. They serialize with [`serde`] to the same JSON the editor UI
//! consumes: `{"type": "string", "required": true}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical type of a frontmatter field.
///
/// Builder names found in a collection config are normalized through
/// [`FieldType::from_builder`]; anything not in the lookup table becomes
/// [`FieldType::String`].
///
/// # Examples
///
/// ```
/// use content_schema_core::FieldType;
///
/// assert_eq!(FieldType::default(), FieldType::String);
/// assert_eq!(FieldType::from_builder("boolean"), FieldType::Boolean);
/// assert_eq!(FieldType::from_builder("object"), FieldType::String);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text (also the fallback for unknown builders).
    #[default]
    String,
    /// Numeric value.
    Number,
    /// True/false toggle.
    Boolean,
    /// Calendar date.
    Date,
    /// List of values.
    Array,
    /// One of a fixed set of values.
    Enum,
}

/// Builder method name → canonical type.
const BUILDER_TYPES: &[(&str, FieldType)] = &[
    ("string", FieldType::String),
    ("number", FieldType::Number),
    ("boolean", FieldType::Boolean),
    ("date", FieldType::Date),
    ("array", FieldType::Array),
    ("enum", FieldType::Enum),
];

impl FieldType {
    /// Maps a schema-builder method name to its canonical type.
    ///
    /// Matching is exact and case-sensitive. Unknown names fall back to
    /// [`FieldType::String`] instead of failing.
    pub fn from_builder(name: &str) -> Self {
        BUILDER_TYPES
            .iter()
            .find(|(builder, _)| *builder == name)
            .map(|(_, field_type)| *field_type)
            .unwrap_or_default()
    }

    /// Returns `true` if `name` is one of the recognized builder methods.
    pub fn is_known_builder(name: &str) -> bool {
        BUILDER_TYPES.iter().any(|(builder, _)| *builder == name)
    }

    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Array => "array",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for a single frontmatter field.
///
/// A field is required unless its declaration was explicitly marked
/// optional.
///
/// # Examples
///
/// ```
/// use content_schema_core::{FieldSchema, FieldType};
///
/// let title = FieldSchema::required(FieldType::String);
/// assert!(title.required);
///
/// let draft = FieldSchema::optional(FieldType::Boolean);
/// assert!(!draft.required);
/// assert_eq!(draft.field_type, FieldType::Boolean);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Canonical type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Must the field be present in frontmatter?
    pub required: bool,
}

impl FieldSchema {
    /// Creates a required field.
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
        }
    }

    /// Creates an optional field.
    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
        }
    }
}
