//! Addressable document resources.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::block::BlockType;
use crate::error::{McpError, Result};
use crate::index::{DEFAULT_CONCEPT_LIMIT, DEFAULT_OUTLINE_LEVEL};
use crate::session::DocumentSession;

/// URI of the document metadata resource.
pub const METADATA_URI: &str = "doc://document/metadata";
/// URI of the document outline resource.
pub const OUTLINE_URI: &str = "doc://document/outline";
/// URI of the keyword frequency resource.
pub const CONCEPTS_URI: &str = "doc://document/concepts";
/// Prefix of the per-type section listings; followed by a block type or `all`.
pub const SECTIONS_URI_PREFIX: &str = "doc://document/sections/";

const ALL_SECTIONS: &str = "all";

/// A resource definition for the MCP resources/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Resource URI
    pub uri: String,
    /// Display name
    pub name: String,
    /// What the resource contains
    pub description: String,
    /// Content type of `resources/read` text
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl ResourceDef {
    fn new(uri: &str, name: &str, description: &str, mime_type: &str) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: mime_type.to_string(),
        }
    }
}

/// The static resource catalog.
pub fn resources() -> Vec<ResourceDef> {
    let mut defs = vec![
        ResourceDef::new(
            METADATA_URI,
            "Document Metadata",
            "Title, effective date, source, content hash and block statistics",
            "application/json",
        ),
        ResourceDef::new(
            OUTLINE_URI,
            "Document Outline",
            "Hierarchical heading structure of the document",
            "application/json",
        ),
        ResourceDef::new(
            CONCEPTS_URI,
            "Document Concepts",
            "Keywords tagged on blocks, most frequent first",
            "application/json",
        ),
    ];

    let kinds = std::iter::once(ALL_SECTIONS).chain(BlockType::ALL.iter().map(|t| t.as_str()));
    for kind in kinds {
        defs.push(ResourceDef::new(
            &format!("{SECTIONS_URI_PREFIX}{kind}"),
            &format!("Sections: {kind}"),
            &format!("Blocks of type '{kind}' with content previews"),
            "application/json",
        ));
    }
    defs
}

/// Render a resource as a `resources/read` result.
pub fn read(session: &DocumentSession, uri: &str) -> Result<JsonValue> {
    let def = resources()
        .into_iter()
        .find(|r| r.uri == uri)
        .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;

    let body = match uri {
        METADATA_URI => {
            let document = session.document();
            serde_json::json!({
                "info": document.info(),
                "contentHash": document.content_hash(),
                "immutable": true,
                "statistics": session.stats(),
            })
        }
        OUTLINE_URI => serde_json::json!({
            "title": session.document().info().title,
            "outline": session.outline(DEFAULT_OUTLINE_LEVEL),
        }),
        CONCEPTS_URI => {
            let concepts = session.index().concepts(None, DEFAULT_CONCEPT_LIMIT);
            serde_json::json!({
                "count": concepts.len(),
                "concepts": concepts,
            })
        }
        _ => {
            let kind = uri
                .strip_prefix(SECTIONS_URI_PREFIX)
                .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;
            let filter = match kind {
                ALL_SECTIONS => None,
                _ => Some(
                    kind.parse::<BlockType>()
                        .map_err(|_| McpError::ResourceNotFound(uri.to_string()))?,
                ),
            };
            let sections = session.index().sections(filter);
            serde_json::json!({
                "sectionType": kind,
                "count": sections.len(),
                "sections": sections,
            })
        }
    };

    Ok(serde_json::json!({
        "contents": [{
            "uri": def.uri,
            "mimeType": def.mime_type,
            "text": serde_json::to_string_pretty(&body)?,
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockMetadata, DocumentInfo};
    use crate::store::DocumentStore;
    use serde_json::json;

    fn session() -> DocumentSession {
        let mut store = DocumentStore::new(DocumentInfo {
            title: "Deposit Accounts".into(),
            effective_date: Some("22 April 2025".into()),
            source: None,
        });
        store.add_block(BlockType::Heading, "Terms", Some(1)).unwrap();
        store
            .add_block_with(
                BlockType::Paragraph,
                "Binding terms.",
                None,
                BlockMetadata::from([("keywords".to_string(), json!(["binding"]))]),
            )
            .unwrap();
        DocumentSession::new(store.build().unwrap())
    }

    fn text(result: &JsonValue) -> JsonValue {
        serde_json::from_str(result["contents"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn catalog_lists_fixed_and_section_resources() {
        let uris: Vec<String> = resources().into_iter().map(|r| r.uri).collect();
        assert_eq!(
            uris,
            vec![
                METADATA_URI,
                OUTLINE_URI,
                CONCEPTS_URI,
                "doc://document/sections/all",
                "doc://document/sections/heading",
                "doc://document/sections/paragraph",
                "doc://document/sections/table",
                "doc://document/sections/figure",
            ]
        );
        assert!(resources().iter().all(|r| r.mime_type == "application/json"));
    }

    #[test]
    fn sections_resource_filters_by_type() {
        let session = session();
        let all = text(&read(&session, "doc://document/sections/all").unwrap());
        assert_eq!(all["sectionType"], "all");
        assert_eq!(all["count"], 2);
        assert_eq!(all["sections"][1]["preview"], "Binding terms.");

        let headings = text(&read(&session, "doc://document/sections/heading").unwrap());
        assert_eq!(headings["count"], 1);
        assert_eq!(headings["sections"][0]["type"], "heading");
        assert_eq!(headings["sections"][0]["level"], 1);

        assert!(matches!(
            read(&session, "doc://document/sections/footnote"),
            Err(McpError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn concepts_resource_counts_keywords() {
        let session = session();
        let body = text(&read(&session, CONCEPTS_URI).unwrap());
        assert_eq!(body["count"], 1);
        assert_eq!(body["concepts"][0], json!({"concept": "binding", "frequency": 1}));
    }

    #[test]
    fn metadata_carries_hash_and_stats() {
        let session = session();
        let result = read(&session, METADATA_URI).unwrap();
        assert_eq!(result["contents"][0]["mimeType"], "application/json");
        let body = text(&result);
        assert_eq!(body["info"]["title"], "Deposit Accounts");
        assert_eq!(body["info"]["effectiveDate"], "22 April 2025");
        assert_eq!(body["contentHash"], session.document().content_hash());
        assert_eq!(body["statistics"]["totalBlocks"], 2);
        assert_eq!(body["immutable"], true);
    }

    #[test]
    fn outline_resource_lists_headings() {
        let body = text(&read(&session(), OUTLINE_URI).unwrap());
        assert_eq!(body["outline"][0]["title"], "Terms");
    }

    #[test]
    fn unknown_uri_is_resource_not_found() {
        assert!(matches!(
            read(&session(), "doc://document/nope"),
            Err(McpError::ResourceNotFound(_))
        ));
    }
}
