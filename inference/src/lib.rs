//! Static schema inference for content collections.
//!
//! This crate derives a field-level [`Schema`] for one collection from the
//! text of a content config file (`src/content/config.ts` and friends)
//! without executing it. The source is only pattern-scanned: comments and
//! in-string delimiters are masked, the collection's `z.object({ ... })`
//! block is captured with depth-aware delimiter matching, and depth-zero
//! field declarations are mapped to `(type, required)` pairs.
//!
//! # Main entry points
//!
//! - [`get_schema`]: total query that always returns a non-empty schema.
//! - [`infer_schema`]: same, with the [`InferenceOutcome`] that explains
//!   whether the default schema was substituted and why.
//! - [`matcher::match_collection`] and [`extractor::extract_fields`]: the
//!   two stages, usable on their own.
//!
//! # Example
//!
//! ```
//! use content_schema_core::{FieldSchema, FieldType};
//! use content_schema_inference::get_schema;
//!
//! let config = "\
//! export const collections = {
//!   blog: defineCollection({
//!     schema: z.object({
//!       title: z.string(),
//!       draft: z.boolean().optional(),
//!       tags: z.array(z.string()),
//!     }),
//!   }),
//! };
//! ";
//!
//! let schema = get_schema(Some(config), "blog");
//! assert_eq!(schema.get("title"), Some(&FieldSchema::required(FieldType::String)));
//! assert_eq!(schema.get("draft"), Some(&FieldSchema::optional(FieldType::Boolean)));
//! assert_eq!(schema.get("tags"), Some(&FieldSchema::required(FieldType::Array)));
//!
//! // Unknown collections and missing configs fall back to the default schema.
//! assert!(get_schema(Some(config), "docs").is_default());
//! assert!(get_schema(None, "blog").is_default());
//! ```
//!
//! The engine is synchronous, pure and holds no shared state, so it can be
//! called from any number of threads at once.

pub mod error;
pub mod extractor;
pub mod matcher;
pub mod output;
pub mod report;
pub mod scan;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub use content_schema_core::Schema;
pub use error::InferenceError;
pub use report::{Inference, InferenceOutcome};
use tracing::{debug, warn};

use extractor::Extraction;

/// Returns the schema of `collection`, or the default schema.
///
/// `source` is the config file text, or `None` when the project has no
/// config file. The result is never empty and this function never panics.
///
/// # Examples
///
/// ```
/// use content_schema_inference::get_schema;
///
/// let schema = get_schema(Some("not a config file {{{"), "posts");
/// assert!(schema.is_default());
/// ```
pub fn get_schema(source: Option<&str>, collection: &str) -> Schema {
    infer_schema(source, collection).schema
}

/// Infers the schema of `collection` and reports how it was obtained.
///
/// # Examples
///
/// ```
/// use content_schema_inference::{infer_schema, InferenceOutcome};
///
/// let config = "docs: defineCollection({ schema: z.object({ order: z.number() }) })";
///
/// let found = infer_schema(Some(config), "docs");
/// assert_eq!(found.outcome, InferenceOutcome::Extracted { fields: 1, skipped: 0 });
///
/// let missing = infer_schema(Some(config), "blog");
/// assert_eq!(missing.outcome, InferenceOutcome::NoMatch);
/// assert!(missing.is_fallback());
/// ```
pub fn infer_schema(source: Option<&str>, collection: &str) -> Inference {
    let Some(source) = source else {
        debug!(collection, "No content config source, using default schema");
        return Inference::fallback(collection, InferenceOutcome::Absent);
    };

    run_guarded(collection, || {
        matcher::match_collection(source, collection).map(|block| extractor::extract_fields(block.text))
    })
}

/// Runs the matching/extraction stages, downgrading every failure to the
/// default schema.
fn run_guarded<F>(collection: &str, stages: F) -> Inference
where
    F: FnOnce() -> Option<Extraction>,
{
    match panic::catch_unwind(AssertUnwindSafe(stages)) {
        Ok(None) => {
            debug!(collection, "Collection not found in content config");
            Inference::fallback(collection, InferenceOutcome::NoMatch)
        }
        Ok(Some(extraction)) if extraction.schema.is_empty() => {
            debug!(
                collection,
                skipped = extraction.skipped.len(),
                "Collection schema has no parseable fields"
            );
            Inference::fallback(
                collection,
                InferenceOutcome::EmptyExtraction {
                    skipped: extraction.skipped.len(),
                },
            )
        }
        Ok(Some(extraction)) => Inference {
            collection: collection.to_string(),
            outcome: InferenceOutcome::Extracted {
                fields: extraction.schema.len(),
                skipped: extraction.skipped.len(),
            },
            schema: extraction.schema,
        },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(collection, error = %message, "Schema inference failed");
            Inference::fallback(collection, InferenceOutcome::InternalFault { message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
