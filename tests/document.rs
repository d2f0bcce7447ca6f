use std::io::Write;
use std::sync::Arc;

use docstore_mcp::{
    BlockType, ContentHasher, DocumentInfo, DocumentSource, DocumentStore, Indexer, McpError,
    StoreError, Violation,
};

fn terms_store() -> DocumentStore {
    let mut store = DocumentStore::new(DocumentInfo::titled("Terms"));
    store
        .add_block(BlockType::Heading, "Terms and Conditions", Some(1))
        .unwrap();
    store
        .add_block(
            BlockType::Paragraph,
            "These terms are legally binding on you...",
            None,
        )
        .unwrap();
    store
}

#[test]
fn test_build_terms_document_and_outline() {
    let document = terms_store().build().unwrap();
    assert_eq!(document.content_hash().len(), 64);
    assert!(document
        .content_hash()
        .chars()
        .all(|c| c.is_ascii_hexdigit()));

    let index = Indexer::new(Arc::new(document));
    let outline = index.outline(1);
    assert_eq!(outline.len(), 1);
    assert_eq!(outline[0].title, "Terms and Conditions");
    assert_eq!(outline[0].level, 1);
    assert!(outline[0].children.is_empty());
}

#[test]
fn test_hash_is_deterministic_across_builds() {
    let a = terms_store().build().unwrap();
    let b = terms_store().build().unwrap();

    // Fresh ids each time, same content
    assert_ne!(a.blocks()[0].id, b.blocks()[0].id);
    assert_eq!(a.content_hash(), b.content_hash());
    assert_eq!(ContentHasher::hash(&a), a.content_hash());
}

#[test]
fn test_different_content_changes_hash() {
    let a = terms_store().build().unwrap();
    let mut store = terms_store();
    store
        .add_block(BlockType::Figure, "Figure 1: fee schedule", None)
        .unwrap();
    let b = store.build().unwrap();
    assert_ne!(a.content_hash(), b.content_hash());
}

#[test]
fn test_level_jump_is_document_invalid() {
    let mut store = DocumentStore::new(DocumentInfo::titled("Bad"));
    store.add_block(BlockType::Heading, "Top", Some(1)).unwrap();
    let deep = store.add_block(BlockType::Heading, "Deep", Some(3)).unwrap();

    let err = store.build().unwrap_err();
    let StoreError::Invalid(violations) = err else {
        panic!("expected an invalid document");
    };
    assert_eq!(
        violations,
        vec![Violation::HeadingLevelJump {
            id: deep,
            max_seen: 1,
            level: 3
        }]
    );
    assert!(violations[0].to_string().contains("level 1 to level 3"));
}

#[test]
fn test_lookup_returns_exact_block() {
    let mut store = DocumentStore::new(DocumentInfo::titled("Lookup"));
    let id = store
        .add_block(BlockType::Table, "Fee | Amount", None)
        .unwrap();
    let added = store.get(&id).unwrap().clone();
    let document = store.build().unwrap();

    let index = Indexer::new(Arc::new(document));
    assert_eq!(index.get_section(&id), Some(&added));
    assert!(index.get_section("blk-unknown").is_none());
    assert!(index.get_section("").is_none());
}

#[test]
fn test_search_results_sorted_and_bounded() {
    let mut store = DocumentStore::new(DocumentInfo::titled("Search"));
    for content in [
        "card fees",
        "card card card",
        "unrelated",
        "card",
        "fees card fees",
    ] {
        store.add_block(BlockType::Paragraph, content, None).unwrap();
    }
    let index = Indexer::new(Arc::new(store.build().unwrap()));

    for limit in 0..6 {
        let hits = index.search("card fees", limit, None);
        assert!(hits.len() <= limit);
        for pair in hits.windows(2) {
            assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].order < pair[1].order)
            );
        }
    }
    assert!(index.search("mortgage", 10, None).is_empty());
}

#[test]
fn test_source_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "title": "Deposit accounts",
            "effectiveDate": "22 April 2025",
            "source": "westpac.pdf",
            "blocks": [
                {{"type": "heading", "level": 1, "content": "Terms and Conditions", "id": "terms"}},
                {{"type": "heading", "level": 2, "content": "Important Changes"}},
                {{"type": "paragraph", "content": "Daily limits apply.",
                  "metadata": {{"purpose": "notice"}}}}
            ]
        }}"#
    )
    .unwrap();

    let document = DocumentSource::from_path(file.path())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(document.info().source.as_deref(), Some("westpac.pdf"));
    assert_eq!(document.get("terms").unwrap().level, Some(1));
    assert_eq!(document.blocks()[2].metadata["purpose"], "notice");
    assert!(document.verify());
}

#[test]
fn test_missing_source_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DocumentSource::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, McpError::Io(_)));
}
