//! Markdown documents with a leading YAML frontmatter block.
//!
//! ```text
//! ---
//! title: Hello
//! draft: true
//! ---
//! Body text.
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ProjectError, Result};

const DELIMITER: &str = "---";
const BOM: char = '\u{feff}';

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Frontmatter keys in file order; empty when the file has none.
    pub frontmatter: Mapping,
    /// Text after the frontmatter block.
    pub content: String,
    /// The file as read.
    pub raw: String,
}

impl Document {
    /// Splits `raw` into frontmatter and body.
    ///
    /// A file without an opening `---` line, or whose block is never closed,
    /// has no frontmatter and its whole text is the body.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrontmatter`](ProjectError::InvalidFrontmatter) if the
    /// block is not valid YAML or is not a mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use content_schema_project::Document;
    ///
    /// let doc = Document::parse("---\ntitle: Hello\n---\nBody\n").unwrap();
    /// assert_eq!(doc.frontmatter["title"], "Hello");
    /// assert_eq!(doc.content, "Body\n");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((yaml, content)) = split(raw) else {
            return Ok(Self {
                frontmatter: Mapping::new(),
                content: raw.strip_prefix(BOM).unwrap_or(raw).to_string(),
                raw: raw.to_string(),
            });
        };

        if yaml.trim().is_empty() {
            return Ok(Self {
                frontmatter: Mapping::new(),
                content: content.to_string(),
                raw: raw.to_string(),
            });
        }

        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| ProjectError::InvalidFrontmatter(e.to_string()))?;
        let frontmatter = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(ProjectError::InvalidFrontmatter(format!(
                    "expected a mapping, found {}",
                    value_kind(&other)
                )));
            }
        };

        Ok(Self {
            frontmatter,
            content: content.to_string(),
            raw: raw.to_string(),
        })
    }

    /// Renders frontmatter and body back into file text.
    ///
    /// An empty mapping renders the body alone. The body always ends with a
    /// newline.
    ///
    /// # Examples
    ///
    /// ```
    /// use content_schema_project::Document;
    /// use serde_yaml::{Mapping, Value};
    ///
    /// let mut fm = Mapping::new();
    /// fm.insert(Value::from("title"), Value::from("Hello"));
    ///
    /// assert_eq!(Document::render(&fm, "Body").unwrap(), "---\ntitle: Hello\n---\nBody\n");
    /// assert_eq!(Document::render(&Mapping::new(), "Body").unwrap(), "Body\n");
    /// ```
    pub fn render(frontmatter: &Mapping, content: &str) -> Result<String> {
        let mut out = String::new();
        if !frontmatter.is_empty() {
            out.push_str(DELIMITER);
            out.push('\n');
            out.push_str(&serde_yaml::to_string(frontmatter)?);
            out.push_str(DELIMITER);
            out.push('\n');
        }
        out.push_str(content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// First `length` characters of the trimmed body, on one line.
    pub fn preview(&self, length: usize) -> String {
        self.content
            .trim()
            .chars()
            .take(length)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect()
    }
}

/// Returns `(yaml, body)` when `raw` opens with a closed frontmatter block.
fn split(raw: &str) -> Option<(&str, &str)> {
    let text = raw.strip_prefix(BOM).unwrap_or(raw);
    let (first, rest) = text.split_once('\n')?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Reads and parses a document.
pub fn read_document(path: impl AsRef<Path>) -> Result<Document> {
    let raw = fs::read_to_string(path)?;
    Document::parse(&raw)
}

/// Overwrites `path` with the rendered document.
pub fn save_document(path: impl AsRef<Path>, frontmatter: &Mapping, content: &str) -> Result<()> {
    let path = path.as_ref();
    let text = Document::render(frontmatter, content)?;
    fs::write(path, text)?;
    debug!(path = %path.display(), "Saved document");
    Ok(())
}

/// Creates `filename` inside `collection_dir` and returns its path.
///
/// # Errors
///
/// Returns [`InvalidFileName`](ProjectError::InvalidFileName) if `filename`
/// is empty or is not a bare file name, and
/// [`AlreadyExists`](ProjectError::AlreadyExists) if the file is present.
pub fn create_document(
    collection_dir: impl AsRef<Path>,
    filename: &str,
    frontmatter: &Mapping,
    content: &str,
) -> Result<PathBuf> {
    let name = filename.trim();
    let is_bare = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if name.is_empty() || !is_bare || name == "." || name == ".." {
        return Err(ProjectError::InvalidFileName(filename.to_string()));
    }

    let path = collection_dir.as_ref().join(name);
    let text = Document::render(frontmatter, content)?;

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(ProjectError::AlreadyExists(path));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(text.as_bytes())?;

    debug!(path = %path.display(), "Created document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_key_order() {
        let doc = Document::parse("---\ntitle: A\ndate: 2024-01-01\ntags: [a, b]\n---\n\nHello\n").unwrap();

        let keys: Vec<_> = doc
            .frontmatter
            .keys()
            .filter_map(|key| key.as_str())
            .collect();
        assert_eq!(keys, vec!["title", "date", "tags"]);
        assert_eq!(doc.content, "\nHello\n");
    }

    #[test]
    fn test_parse_without_frontmatter() {
        let doc = Document::parse("# Heading\n\ntext").unwrap();
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.content, "# Heading\n\ntext");
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let raw = "---\ntitle: A\nno closing line";
        let doc = Document::parse(raw).unwrap();
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.content, raw);
    }

    #[test]
    fn test_empty_block_and_bom() {
        let doc = Document::parse("\u{feff}---\n---\nBody").unwrap();
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.content, "Body");
    }

    #[test]
    fn test_crlf_delimiters() {
        let doc = Document::parse("---\r\ntitle: A\r\n---\r\nBody").unwrap();
        assert_eq!(doc.frontmatter["title"], "A");
        assert_eq!(doc.content, "Body");
    }

    #[test]
    fn test_non_mapping_frontmatter_is_rejected() {
        let err = Document::parse("---\n- a\n- b\n---\nBody").unwrap_err();
        assert!(matches!(err, ProjectError::InvalidFrontmatter(_)));
        assert!(err.to_string().contains("sequence"));

        let err = Document::parse("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, ProjectError::InvalidFrontmatter(_)));
    }

    #[test]
    fn test_render_then_parse() {
        let mut fm = Mapping::new();
        fm.insert(Value::from("title"), Value::from("Post"));
        fm.insert(Value::from("draft"), Value::from(true));

        let text = Document::render(&fm, "Body").unwrap();
        let doc = Document::parse(&text).unwrap();

        assert_eq!(doc.frontmatter, fm);
        assert_eq!(doc.content, "Body\n");
    }

    #[test]
    fn test_render_empty_body_still_ends_with_newline() {
        let mut fm = Mapping::new();
        fm.insert(Value::from("title"), Value::from("New"));

        assert_eq!(Document::render(&fm, "").unwrap(), "---\ntitle: New\n---\n\n");
        assert_eq!(Document::render(&fm, "Body\n").unwrap(), "---\ntitle: New\n---\nBody\n");
        assert_eq!(Document::render(&Mapping::new(), "").unwrap(), "\n");
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        let doc = Document::parse("---\ntitle: A\n---\n\n  first line\nsecond ✓ line  \n").unwrap();
        assert_eq!(doc.preview(200), "first line second ✓ line");
        assert_eq!(doc.preview(12), "first line s");
        assert_eq!(doc.preview(0), "");
    }

    #[test]
    fn test_create_refuses_existing_and_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let fm = Mapping::new();

        let path = create_document(dir.path(), "post.md", &fm, "Hi").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Hi\n");

        let err = create_document(dir.path(), "post.md", &fm, "Again").unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Hi\n");

        for bad in ["", "  ", "../escape.md", "nested/post.md", ".."] {
            let err = create_document(dir.path(), bad, &fm, "x").unwrap_err();
            assert!(matches!(err, ProjectError::InvalidFileName(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_save_and_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        let mut fm = Mapping::new();
        fm.insert(Value::from("title"), Value::from("Saved"));

        save_document(&path, &fm, "Body text").unwrap();
        let doc = read_document(&path).unwrap();

        assert_eq!(doc.frontmatter["title"], "Saved");
        assert_eq!(doc.content, "Body text\n");
        assert_eq!(doc.raw, "---\ntitle: Saved\n---\nBody text\n");
    }
}
