//! Ordered field-name → [`FieldSchema`] mapping.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{FieldSchema, FieldType};

/// Schema of a content collection.
///
/// Field names are unique. Iteration follows insertion order, which for an
/// inferred schema is declaration order in the config source. Inserting a
/// name that already exists replaces its value in place, so the later
/// declaration wins without reordering.
///
/// Serializes as a map, e.g. `{"title": {"type": "string", "required": true}}`.
///
/// # Examples
///
/// ```
/// use content_schema_core::{FieldSchema, FieldType, Schema};
///
/// let mut schema = Schema::new();
/// schema.insert("tags", FieldSchema::required(FieldType::String));
/// schema.insert("tags", FieldSchema::optional(FieldType::Array));
///
/// assert_eq!(schema.len(), 1);
/// assert_eq!(schema.get("tags"), Some(&FieldSchema::optional(FieldType::Array)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, FieldSchema)>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fallback schema used when nothing can be inferred.
    ///
    /// | field | type | required |
    /// |---|---|---|
    /// | title | string | yes |
    /// | description | string | no |
    /// | date | date | no |
    /// | draft | boolean | no |
    /// | tags | array | no |
    ///
    /// # Examples
    ///
    /// ```
    /// use content_schema_core::{FieldType, Schema};
    ///
    /// let schema = Schema::default_schema();
    /// assert_eq!(schema.names(), vec!["title", "description", "date", "draft", "tags"]);
    /// assert!(schema.get("title").unwrap().required);
    /// assert_eq!(schema.get("date").unwrap().field_type, FieldType::Date);
    /// ```
    pub fn default_schema() -> Self {
        [
            ("title", FieldSchema::required(FieldType::String)),
            ("description", FieldSchema::optional(FieldType::String)),
            ("date", FieldSchema::optional(FieldType::Date)),
            ("draft", FieldSchema::optional(FieldType::Boolean)),
            ("tags", FieldSchema::optional(FieldType::Array)),
        ]
        .into_iter()
        .collect()
    }

    /// Returns `true` if this schema equals [`Schema::default_schema`].
    pub fn is_default(&self) -> bool {
        *self == Self::default_schema()
    }

    /// Inserts or replaces a field, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, field: FieldSchema) -> Option<FieldSchema> {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, field)),
            None => {
                self.fields.push((name, field));
                None
            }
        }
    }

    /// Looks up a field by exact name.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, field)| field)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Iterates `(name, field)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Names of all required fields.
    pub fn required_fields(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, field)| field.required)
            .map(|(name, _)| name)
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldSchema)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldSchema)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, field) in iter {
            schema.insert(name, field);
        }
        schema
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = Schema;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of field name to field schema")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
        let mut schema = Schema::new();
        while let Some((name, field)) = access.next_entry::<String, FieldSchema>()? {
            schema.insert(name, field);
        }
        Ok(schema)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SchemaVisitor)
    }
}
