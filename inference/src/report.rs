//! Structured outcome of one schema inference.

use std::fmt;

use content_schema_core::Schema;
use serde::{Deserialize, Serialize};

/// How an inference ended.
///
/// Every variant except [`Extracted`](InferenceOutcome::Extracted) means the
/// returned schema is the default one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InferenceOutcome {
    /// Fields were extracted from the collection's block.
    Extracted {
        /// Number of distinct fields.
        fields: usize,
        /// Number of declarations that could not be parsed.
        skipped: usize,
    },
    /// No config source was supplied.
    Absent,
    /// The collection was not found in the config source.
    NoMatch,
    /// The collection was found but no field could be parsed.
    EmptyExtraction {
        /// Number of declarations that could not be parsed.
        skipped: usize,
    },
    /// Matching or extraction failed unexpectedly.
    InternalFault { message: String },
}

impl fmt::Display for InferenceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extracted { fields, skipped } => {
                write!(f, "extracted {fields} field(s), skipped {skipped}")
            }
            Self::Absent => write!(f, "no config source, using default schema"),
            Self::NoMatch => write!(f, "collection not found, using default schema"),
            Self::EmptyExtraction { skipped } => write!(
                f,
                "no parseable fields ({skipped} skipped), using default schema"
            ),
            Self::InternalFault { message } => {
                write!(f, "inference failed ({message}), using default schema")
            }
        }
    }
}

/// Schema plus the outcome that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inference {
    pub collection: String,
    pub schema: Schema,
    #[serde(flatten)]
    pub outcome: InferenceOutcome,
}

impl Inference {
    /// Builds an inference that falls back to the default schema.
    pub(crate) fn fallback(collection: &str, outcome: InferenceOutcome) -> Self {
        Self {
            collection: collection.to_string(),
            schema: Schema::default_schema(),
            outcome,
        }
    }

    /// Returns `true` if the default schema was substituted.
    pub fn is_fallback(&self) -> bool {
        !matches!(self.outcome, InferenceOutcome::Extracted { .. })
    }
}
