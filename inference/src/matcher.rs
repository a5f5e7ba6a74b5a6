//! Locates one collection's `z.object({ ... })` field block.
//!
//! A collection is anchored by its name followed by a `defineCollection(`
//! call, in any of these shapes:
//!
//! ```text
//! blog: defineCollection({ ... })
//! "blog": defineCollection({ ... })
//! const blog = defineCollection({ ... })
//! ```
//!
//! Inside the call's options the `schema:` key is located, then the first
//! `z.object(` after it (which also covers `schema: ({ image }) => z.object(`).
//! The captured block is everything between that object's `{` and its
//! balanced `}`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::InferenceError;
use crate::scan;

static PATTERNS: LazyLock<MatchPatterns> = LazyLock::new(MatchPatterns::new);

struct MatchPatterns {
    schema_key: Regex,
    object_call: Regex,
}

impl MatchPatterns {
    fn new() -> Self {
        // Compile-time constant patterns; a failure is a programmer error.
        Self {
            schema_key: Regex::new(r"(?:^|[^\w$.])schema\s*:").expect("static regex must compile"),
            object_call: Regex::new(r"(?:^|[^\w$.])z\s*\.\s*object\s*\(")
                .expect("static regex must compile"),
        }
    }
}

/// A collection's field-set block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBlock<'a> {
    /// Text between the schema object's braces (may itself be malformed).
    pub text: &'a str,
    /// Byte span of `text` within the full source.
    pub span: Range<usize>,
}

/// Finds the field block of `collection` in `source`.
///
/// Returns `None` for an empty collection name, an unknown collection, a
/// definition without a `z.object({ ... })` schema, or unbalanced
/// delimiters. Never panics on arbitrary input.
///
/// # Examples
///
/// ```
/// use content_schema_inference::matcher::match_collection;
///
/// let source = "blog: defineCollection({ schema: z.object({ meta: z.object({}), title: z.string() }) })";
/// let block = match_collection(source, "blog").unwrap();
/// assert_eq!(block.text.trim(), "meta: z.object({}), title: z.string()");
///
/// assert!(match_collection(source, "Blog").is_none());
/// ```
pub fn match_collection<'a>(source: &'a str, collection: &str) -> Option<FieldBlock<'a>> {
    if collection.is_empty() {
        return None;
    }

    let masked = match scan::mask(source) {
        Ok(masked) => masked,
        Err(err) => {
            debug!(collection, error = %err, "Failed to mask config source");
            return None;
        }
    };

    let span = find_block(&masked, collection)?;
    source.get(span.clone()).map(|text| FieldBlock { text, span })
}

fn find_block(masked: &str, collection: &str) -> Option<Range<usize>> {
    let anchor = anchor_pattern(collection)?;
    let nesting = scan::Nesting::new(masked);

    for found in anchor.find_iter(masked) {
        // The pattern ends on the call's opening parenthesis.
        let call_open = found.end() - 1;
        match block_in_call(masked, &nesting, call_open) {
            Ok(Some(span)) => return Some(span),
            Ok(None) => debug!(
                collection,
                offset = call_open,
                "Collection definition has no z.object schema"
            ),
            Err(err) => debug!(
                collection,
                error = %err,
                "Skipping malformed collection definition"
            ),
        }
    }

    None
}

fn anchor_pattern(collection: &str) -> Option<Regex> {
    let name = regex::escape(collection);
    let pattern = format!(
        r#"(?:^|[^\w$.])(?:(?:"{name}"|'{name}'|{name})\s*:|(?:const|let|var)\s+{name}\s*=)\s*defineCollection\s*\("#
    );
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            debug!(collection, error = %err, "Collection name does not form a valid pattern");
            None
        }
    }
}

/// Span (absolute, in `masked`) of the field block inside the
/// `defineCollection(` call opened at `call_open`.
fn block_in_call(
    masked: &str,
    nesting: &scan::Nesting,
    call_open: usize,
) -> Result<Option<Range<usize>>, InferenceError> {
    let call_close = nesting.close(call_open)?;
    let args_start = call_open + 1;
    let args = &masked[args_start..call_close];
    // Depths relative to the call's arguments.
    let base = nesting.depths()[call_open] + 1;
    let depths: Vec<u32> = nesting.depths()[args_start..call_close]
        .iter()
        .map(|depth| depth.saturating_sub(base))
        .collect();

    // `schema:` must be a key of the options object, i.e. at depth one.
    let Some(key_end) = PATTERNS
        .schema_key
        .find_iter(args)
        .map(|found| found.end())
        .find(|&end| depths.get(end - 1) == Some(&1))
    else {
        return Ok(None);
    };

    let value_end = (key_end..args.len())
        .find(|&offset| {
            let depth = depths[offset];
            depth == 0 || (depth == 1 && args.as_bytes()[offset] == b',')
        })
        .unwrap_or(args.len());

    // Start on the `:` so the pattern's leading boundary can match it.
    let Some(object) = PATTERNS.object_call.find_at(args, key_end - 1) else {
        return Ok(None);
    };
    if object.end() > value_end {
        return Ok(None);
    }

    let after_paren = &args[object.end()..];
    let leading = after_paren.len() - after_paren.trim_start().len();
    let brace = object.end() + leading;
    if args.as_bytes().get(brace) != Some(&b'{') {
        return Ok(None);
    }

    let brace_close = nesting.close(args_start + brace)?;
    Ok(Some(args_start + brace + 1..brace_close))
}
