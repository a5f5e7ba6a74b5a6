//! Field extraction from a matched `z.object({ ... })` block.
//!
//! Only declarations at nesting depth zero of the block are fields; anything
//! inside a builder's arguments (nested objects, array element types,
//! refinement callbacks) is part of the enclosing declaration.
//!
//! The block is split at depth-zero commas. Each segment normally holds one
//! declaration, `name: z.builder(...)...`. A declaration's span runs from
//! its head to the next head or the end of its segment, and the optional
//! marker is only looked for inside that span, at its own depth zero.

use std::sync::LazyLock;

use content_schema_core::{FieldSchema, FieldType, Schema};
use regex::{Captures, Regex};
use tracing::debug;

use crate::scan;

static PATTERNS: LazyLock<FieldPatterns> = LazyLock::new(FieldPatterns::new);

struct FieldPatterns {
    // name: [z.][coerce.]builder(
    field_head: Regex,
    // .optional()
    optional_call: Regex,
    // Builder wrapped by z.optional(...)
    inner_builder: Regex,
}

impl FieldPatterns {
    fn new() -> Self {
        // Compile-time constant patterns; a failure is a programmer error.
        Self {
            field_head: Regex::new(
                r#"(?:"([^"\n]+)"|'([^'\n]+)'|([\p{L}\p{Nl}_$][\w$]*))\s*:\s*(?:z\s*\.\s*)?(?:coerce\s*\.\s*)?([\p{L}\p{Nl}_$][\w$]*)\s*\("#,
            )
            .expect("static regex must compile"),
            optional_call: Regex::new(r"\.\s*optional\s*\(\s*\)").expect("static regex must compile"),
            inner_builder: Regex::new(
                r"^\s*(?:z\s*\.\s*)?(?:coerce\s*\.\s*)?([A-Za-z_$][\w$]*)\s*\(",
            )
            .expect("static regex must compile"),
        }
    }
}

/// Result of scanning one field block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Extracted fields; empty when nothing parseable was found.
    pub schema: Schema,
    /// Declarations that could not be parsed, trimmed, with comments and
    /// in-string delimiters blanked.
    pub skipped: Vec<String>,
}

/// A field head found at depth zero of a segment.
struct FieldHead {
    /// Offset of the field name within the segment.
    start: usize,
    /// Offset just past the builder's opening parenthesis.
    args_start: usize,
    name: String,
    builder: String,
}

/// Extracts the fields declared in `block`.
///
/// Never fails: unparseable declarations are skipped and recorded in
/// [`Extraction::skipped`], and a blank block yields an empty schema.
///
/// # Examples
///
/// ```
/// use content_schema_core::{FieldSchema, FieldType};
/// use content_schema_inference::extractor::extract_fields;
///
/// let extraction = extract_fields("title: z.string(), draft: z.boolean().optional(), ...base");
///
/// assert_eq!(extraction.schema.get("title"), Some(&FieldSchema::required(FieldType::String)));
/// assert_eq!(extraction.schema.get("draft"), Some(&FieldSchema::optional(FieldType::Boolean)));
/// assert_eq!(extraction.skipped, vec!["...base".to_string()]);
/// ```
pub fn extract_fields(block: &str) -> Extraction {
    let mut extraction = Extraction::default();

    let masked = match scan::mask(block) {
        Ok(masked) => masked,
        Err(err) => {
            debug!(error = %err, "Failed to mask field block");
            return extraction;
        }
    };
    let depths = scan::depth_map(&masked);

    for segment in scan::split_top_level(&masked, &depths, b',') {
        let text = &masked[segment.clone()];
        if text.trim().is_empty() {
            continue;
        }

        let original = block.get(segment.clone()).unwrap_or(text);
        let heads = find_heads(text, original, &depths[segment.clone()]);
        if heads.is_empty() {
            let declaration = text.trim().to_string();
            debug!(%declaration, "Skipping unrecognized field declaration");
            extraction.skipped.push(declaration);
            continue;
        }

        for (index, head) in heads.iter().enumerate() {
            let end = heads.get(index + 1).map_or(text.len(), |next| next.start);
            let span = head.start..end;
            let declaration = &text[span.clone()];
            let declaration_depths = &depths[segment.start + span.start..segment.start + span.end];

            let (field_type, wrapped) = resolve_type(head, text);
            let optional = wrapped || has_optional_marker(declaration, declaration_depths);
            let field = if optional {
                FieldSchema::optional(field_type)
            } else {
                FieldSchema::required(field_type)
            };

            if extraction.schema.insert(head.name.clone(), field).is_some() {
                debug!(field = %head.name, "Duplicate field declaration, keeping the later one");
            }
        }
    }

    extraction
}

/// Field heads of a masked segment; names are taken from `original`, which
/// has the same byte layout.
fn find_heads(text: &str, original: &str, depths: &[u32]) -> Vec<FieldHead> {
    PATTERNS
        .field_head
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = whole.start();
            if depths.get(start) != Some(&0) {
                return None;
            }
            let continues = text[..start]
                .chars()
                .next_back()
                .is_some_and(|prev| scan::is_ident_char(prev) || prev == '.');
            if continues {
                return None;
            }
            Some(FieldHead {
                start,
                args_start: whole.end(),
                name: field_name(&caps, original)?,
                builder: caps.get(4)?.as_str().to_string(),
            })
        })
        .collect()
}

/// The key as written, quotes removed; quoted keys keep their spaces and
/// delimiters.
fn field_name(caps: &Captures<'_>, original: &str) -> Option<String> {
    let name = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    original.get(name.range()).map(str::to_string)
}

/// Field type of a head, and whether the builder itself was `z.optional(...)`.
fn resolve_type(head: &FieldHead, segment: &str) -> (FieldType, bool) {
    if head.builder != "optional" {
        return (FieldType::from_builder(&head.builder), false);
    }

    let inner = PATTERNS
        .inner_builder
        .captures(&segment[head.args_start..])
        .and_then(|caps| caps.get(1))
        .map_or(FieldType::String, |builder| {
            FieldType::from_builder(builder.as_str())
        });
    (inner, true)
}

/// `true` if `.optional()` is chained on the declaration itself rather than
/// on something nested in its arguments.
fn has_optional_marker(declaration: &str, depths: &[u32]) -> bool {
    PATTERNS
        .optional_call
        .find_iter(declaration)
        .any(|found| depths.get(found.start()) == Some(&0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(extraction: &Extraction, name: &str) -> FieldSchema {
        *extraction
            .schema
            .get(name)
            .unwrap_or_else(|| panic!("missing field {name}"))
    }

    #[test]
    fn test_optional_is_scoped_to_each_field() {
        let extraction = extract_fields("title: z.string(), draft: z.boolean().optional()");

        assert_eq!(field(&extraction, "title"), FieldSchema::required(FieldType::String));
        assert_eq!(field(&extraction, "draft"), FieldSchema::optional(FieldType::Boolean));
    }

    #[test]
    fn test_nested_optional_does_not_leak_to_parent() {
        let extraction = extract_fields(
            "tags: z.array(z.string().optional()), meta: z.object({ note: z.string().optional() })",
        );

        assert_eq!(field(&extraction, "tags"), FieldSchema::required(FieldType::Array));
        assert_eq!(field(&extraction, "meta"), FieldSchema::required(FieldType::String));
        assert!(!extraction.schema.contains("note"));
    }

    #[test]
    fn test_nested_object_keeps_sibling_fields() {
        let extraction = extract_fields(
            "\n  meta: z.object({ nested: z.string() }),\n  title: z.string(),\n",
        );

        assert_eq!(extraction.schema.names(), vec!["meta", "title"]);
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_unknown_builder_fails_open_to_required_string() {
        let extraction = extract_fields("location: z.union([z.string(), z.number()])");
        assert_eq!(field(&extraction, "location"), FieldSchema::required(FieldType::String));
    }

    #[test]
    fn test_duplicate_field_keeps_last_declaration() {
        let extraction = extract_fields("slug: z.string(), order: z.number(), slug: z.number().optional()");

        assert_eq!(extraction.schema.len(), 2);
        assert_eq!(field(&extraction, "slug"), FieldSchema::optional(FieldType::Number));
    }

    #[test]
    fn test_coerce_and_wrapped_optional_builders() {
        let extraction = extract_fields(
            "pubDate: z.coerce.date(), updated: z.optional(z.coerce.date()), rating: z.optional(z.number())",
        );

        assert_eq!(field(&extraction, "pubDate"), FieldSchema::required(FieldType::Date));
        assert_eq!(field(&extraction, "updated"), FieldSchema::optional(FieldType::Date));
        assert_eq!(field(&extraction, "rating"), FieldSchema::optional(FieldType::Number));
    }

    #[test]
    fn test_enum_and_helper_builders() {
        let extraction = extract_fields(
            "status: z.enum(['draft', 'published']), cover: image().optional(), author: reference('authors')",
        );

        assert_eq!(field(&extraction, "status"), FieldSchema::required(FieldType::Enum));
        assert_eq!(field(&extraction, "cover"), FieldSchema::optional(FieldType::String));
        assert_eq!(field(&extraction, "author"), FieldSchema::required(FieldType::String));
    }

    #[test]
    fn test_quoted_keys_and_chained_modifiers() {
        let extraction = extract_fields(
            r#""og:image": z.string().url().optional(), 'sort-order': z.number().int().default(0)"#,
        );

        assert_eq!(field(&extraction, "og:image"), FieldSchema::optional(FieldType::String));
        assert_eq!(field(&extraction, "sort-order"), FieldSchema::required(FieldType::Number));
    }

    #[test]
    fn test_malformed_declarations_are_skipped() {
        let extraction = extract_fields("title: z.string(), ...baseFields, body: , count: z.number()");

        assert_eq!(extraction.schema.names(), vec!["title", "count"]);
        assert_eq!(extraction.skipped, vec!["...baseFields", "body:"]);
    }

    #[test]
    fn test_missing_commas_still_split_declarations() {
        let extraction = extract_fields("title: z.string() draft: z.boolean().optional()");

        assert_eq!(field(&extraction, "title"), FieldSchema::required(FieldType::String));
        assert_eq!(field(&extraction, "draft"), FieldSchema::optional(FieldType::Boolean));
    }

    #[test]
    fn test_commented_fields_and_string_contents_are_ignored() {
        let extraction = extract_fields(
            "title: z.string().describe('use .optional() sparingly'),\n// old: z.date(),\n/* legacy: z.number() */",
        );

        assert_eq!(extraction.schema.names(), vec!["title"]);
        assert_eq!(field(&extraction, "title"), FieldSchema::required(FieldType::String));
    }

    #[test]
    fn test_blank_block_is_empty() {
        assert!(extract_fields("").schema.is_empty());
        assert!(extract_fields("  \n\t ").schema.is_empty());
        assert!(extract_fields("  \n\t ").skipped.is_empty());
    }

    #[test]
    fn test_quoted_keys_keep_their_exact_text() {
        let extraction = extract_fields(r#""og(image)": z.string(), " spaced ": z.number(), 'a[0]': z.date()"#);

        assert_eq!(extraction.schema.names(), vec!["og(image)", " spaced ", "a[0]"]);
        assert_eq!(field(&extraction, " spaced "), FieldSchema::required(FieldType::Number));
    }

    #[test]
    fn test_non_ascii_identifier_keys() {
        let extraction = extract_fields("ñame: z.string(), título: z.number().optional(), Ωmega: z.boolean()");

        assert_eq!(extraction.schema.names(), vec!["ñame", "título", "Ωmega"]);
        assert_eq!(field(&extraction, "título"), FieldSchema::optional(FieldType::Number));
    }

    #[test]
    fn test_regex_literal_does_not_hide_siblings() {
        let extraction = extract_fields(
            "title: z.string(), slug: z.string().regex(/^[a-z']+$/), code: z.string().regex(/[(]/).optional(), draft: z.boolean().optional()",
        );

        assert_eq!(extraction.schema.names(), vec!["title", "slug", "code", "draft"]);
        assert_eq!(field(&extraction, "code"), FieldSchema::optional(FieldType::String));
        assert!(extraction.skipped.is_empty());
    }
}
