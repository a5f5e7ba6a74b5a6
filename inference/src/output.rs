//! Output formatting for inferred schemas.

use content_schema_core::Schema;

use crate::report::Inference;

/// Supported output formats.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Formats a collection's schema in the requested output format.
pub fn format_schema(
    collection: &str,
    schema: &Schema,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(schema)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(schema).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(schema_to_markdown(collection, schema)),
        OutputFormat::Table => Ok(schema_to_table(collection, schema)),
    }
}

/// Formats an inference (schema plus outcome) in the requested output format.
pub fn format_inference(inference: &Inference, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(inference)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(inference).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => {
            let mut out = schema_to_markdown(&inference.collection, &inference.schema);
            out.push_str(&format!("**Outcome:** {}\n", inference.outcome));
            Ok(out)
        }
        OutputFormat::Table => {
            let mut out = schema_to_table(&inference.collection, &inference.schema);
            out.push_str(&format!("  ({})\n", inference.outcome));
            Ok(out)
        }
    }
}

fn schema_to_markdown(collection: &str, schema: &Schema) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {collection}\n\n"));
    out.push_str("| Field | Type | Required |\n");
    out.push_str("|-------|------|----------|\n");
    for (name, field) in schema.iter() {
        let required = if field.required { "yes" } else { "no" };
        out.push_str(&format!(
            "| `{name}` | {} | {required} |\n",
            field.field_type
        ));
    }
    out.push('\n');

    out
}

fn schema_to_table(collection: &str, schema: &Schema) -> String {
    let mut out = String::new();

    out.push_str(&format!("Collection: {collection}  Fields: {}\n", schema.len()));

    let width = schema
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, field) in schema.iter() {
        let marker = if field.required { "" } else { "?" };
        out.push_str(&format!(
            "  {name:<width$}  {}{marker}\n",
            field.field_type
        ));
    }

    out
}
