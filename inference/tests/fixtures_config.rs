use std::fs;
use std::path::PathBuf;

use content_schema_core::{FieldSchema, FieldType, Schema};
use content_schema_inference::{InferenceOutcome, get_schema, infer_schema};

#[test]
fn test_end_to_end_blog_example() {
    let source = "blog: defineCollection({ schema: z.object({ title: z.string(), draft: z.boolean().optional(), tags: z.array(z.string()) }) })";

    let schema = get_schema(Some(source), "blog");

    let expected: Schema = [
        ("title", FieldSchema::required(FieldType::String)),
        ("draft", FieldSchema::optional(FieldType::Boolean)),
        ("tags", FieldSchema::required(FieldType::Array)),
    ]
    .into_iter()
    .collect();
    assert_eq!(schema, expected);
}

#[test]
fn test_absent_source_yields_default_schema() {
    assert_eq!(get_schema(None, "posts"), Schema::default_schema());
}

#[test]
fn test_nested_object_does_not_truncate_block() {
    let source = r#"
export const collections = {
  blog: defineCollection({
    schema: z.object({
      meta: z.object({ nested: z.string() }),
      title: z.string(),
    }),
  }),
};
"#;
    let schema = get_schema(Some(source), "blog");

    assert!(schema.contains("meta"));
    assert_eq!(
        schema.get("title"),
        Some(&FieldSchema::required(FieldType::String))
    );
    assert!(!schema.contains("nested"));
}

#[test]
fn test_optional_marker_applies_to_its_own_field_only() {
    let source = "blog: defineCollection({ schema: z.object({ title: z.string(), subtitle: z.string().optional() }) })";
    let schema = get_schema(Some(source), "blog");

    assert!(schema.get("title").unwrap().required);
    assert!(!schema.get("subtitle").unwrap().required);
}

#[test]
fn test_unknown_builder_normalizes_to_required_string() {
    let source = "blog: defineCollection({ schema: z.object({ price: z.bigint() }) })";
    let schema = get_schema(Some(source), "blog");

    assert_eq!(
        schema.get("price"),
        Some(&FieldSchema::required(FieldType::String))
    );
}

#[test]
fn test_duplicate_field_reflects_later_declaration() {
    let source = "blog: defineCollection({ schema: z.object({ title: z.string(), title: z.number().optional() }) })";
    let schema = get_schema(Some(source), "blog");

    assert_eq!(schema.len(), 1);
    assert_eq!(
        schema.get("title"),
        Some(&FieldSchema::optional(FieldType::Number))
    );
}

#[test]
fn test_block_without_parseable_fields_yields_default_schema() {
    let source = "blog: defineCollection({ schema: z.object({ ...base, extra }) })";
    let inference = infer_schema(Some(source), "blog");

    assert_eq!(inference.schema, Schema::default_schema());
    assert_eq!(
        inference.outcome,
        InferenceOutcome::EmptyExtraction { skipped: 2 }
    );

    let empty = infer_schema(Some("blog: defineCollection({ schema: z.object({}) })"), "blog");
    assert_eq!(empty.schema, Schema::default_schema());
    assert_eq!(
        empty.outcome,
        InferenceOutcome::EmptyExtraction { skipped: 0 }
    );
}

#[test]
fn test_regex_refinements_keep_the_collection() {
    for pattern in [r"/^[a-z']+$/", "/[(]/", r#"/"\/[}]/i"#] {
        let source = format!(
            "blog: defineCollection({{ schema: z.object({{ title: z.string(), slug: z.string().regex({pattern}), draft: z.boolean().optional() }}) }})"
        );
        let inference = infer_schema(Some(&source), "blog");

        assert_eq!(
            inference.outcome,
            InferenceOutcome::Extracted {
                fields: 3,
                skipped: 0
            },
            "{pattern}"
        );
        assert_eq!(inference.schema.names(), vec!["title", "slug", "draft"]);
    }
}

#[test]
fn test_keys_are_reported_as_written() {
    let source = r#"blog: defineCollection({ schema: z.object({ "og(image)": z.string(), " spaced ": z.number(), ñame: z.string(), título: z.date().optional() }) })"#;
    let schema = get_schema(Some(source), "blog");

    assert_eq!(schema.names(), vec!["og(image)", " spaced ", "ñame", "título"]);
    assert_eq!(
        schema.get("título"),
        Some(&FieldSchema::optional(FieldType::Date))
    );
}

#[test]
fn test_blog_fixture_collections() {
    let source = fixture("blog-config.ts");

    let blog = infer_schema(Some(&source), "blog");
    assert_eq!(
        blog.outcome,
        InferenceOutcome::Extracted {
            fields: 8,
            skipped: 1
        }
    );
    let schema = &blog.schema;
    assert_eq!(
        schema.names(),
        vec![
            "title",
            "description",
            "pubDate",
            "updatedDate",
            "heroImage",
            "tags",
            "draft",
            "author"
        ]
    );
    assert_eq!(schema.required_fields(), vec!["title", "pubDate", "tags", "author"]);
    assert_eq!(schema.get("pubDate").unwrap().field_type, FieldType::Date);
    assert_eq!(schema.get("tags").unwrap().field_type, FieldType::Array);
    assert!(!schema.contains("series"));
    assert!(!schema.contains("metaTitle"));

    let authors = get_schema(Some(&source), "authors");
    assert_eq!(authors.names(), vec!["name", "avatar", "links", "role"]);
    assert_eq!(
        authors.get("avatar"),
        Some(&FieldSchema::optional(FieldType::String))
    );
    assert_eq!(
        authors.get("links"),
        Some(&FieldSchema::required(FieldType::String))
    );
    assert_eq!(
        authors.get("role"),
        Some(&FieldSchema::required(FieldType::Enum))
    );

    let notes = get_schema(Some(&source), "release-notes");
    assert_eq!(
        notes.get("breaking"),
        Some(&FieldSchema::required(FieldType::Boolean))
    );
    assert_eq!(
        notes.get("order"),
        Some(&FieldSchema::required(FieldType::Number))
    );

    let changelog = infer_schema(Some(&source), "changelog");
    assert_eq!(changelog.outcome, InferenceOutcome::NoMatch);
    assert!(changelog.schema.is_default());
}

#[test]
fn test_loader_style_fixture_collections() {
    let source = fixture("content.config.ts");

    let docs = get_schema(Some(&source), "docs");
    assert_eq!(
        docs.names(),
        vec!["title", "sidebar", "lastUpdated", "category"]
    );
    assert_eq!(
        docs.get("sidebar"),
        Some(&FieldSchema::optional(FieldType::String))
    );
    assert_eq!(
        docs.get("lastUpdated"),
        Some(&FieldSchema::optional(FieldType::Date))
    );
    assert_eq!(
        docs.get("category"),
        Some(&FieldSchema::required(FieldType::Enum))
    );

    let team = get_schema(Some(&source), "team");
    assert_eq!(team.names(), vec!["id", "name", "active"]);
    assert_eq!(team.required_fields().len(), 3);
}

#[test]
fn test_every_prefix_of_fixture_yields_a_schema() {
    for name in ["blog-config.ts", "content.config.ts"] {
        let source = fixture(name);
        let cut_points = (0..=source.len()).filter(|&index| source.is_char_boundary(index));
        for cut in cut_points {
            let prefix = &source[..cut];
            for collection in ["blog", "docs", "authors"] {
                let inference = infer_schema(Some(prefix), collection);
                assert!(!inference.schema.is_empty());
                assert!(
                    !matches!(inference.outcome, InferenceOutcome::InternalFault { .. }),
                    "fault for {name}[..{cut}] / {collection}"
                );
            }
        }
    }
}

#[test]
fn test_arbitrary_text_yields_a_schema() {
    const ALPHABET: &[&str] = &[
        "{", "}", "(", ")", "[", "]", "\"", "'", "`", "/", "*", "\\", ",", ":", ".", "\n", " ",
        "z", "blog", "schema", "defineCollection", "object", "optional", "é", "$", "=",
    ];

    let mut state: u64 = 0x5eed_1234_abcd_0001;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    for _ in 0..2000 {
        let len = next() % 64;
        let source: String = (0..len).map(|_| ALPHABET[next() % ALPHABET.len()]).collect();
        for collection in ["blog", "", "b{", "schema"] {
            let inference = infer_schema(Some(&source), collection);
            assert!(!inference.schema.is_empty());
            assert!(
                !matches!(inference.outcome, InferenceOutcome::InternalFault { .. }),
                "fault for {source:?} / {collection:?}"
            );
        }
    }
}

#[test]
fn test_concurrent_queries_agree() {
    let source = fixture("blog-config.ts");
    let expected = get_schema(Some(&source), "blog");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| get_schema(Some(&source), "blog")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(path).expect("fixture file must be readable")
}
