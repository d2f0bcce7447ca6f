//! Document query tools.
//!
//! Tools: search_content, get_section, list_headings

use serde_json::{Map, Value as JsonValue};

use crate::convert::{get_optional_block_type, get_optional_u64, get_string_arg, text_result};
use crate::error::{McpError, Result};
use crate::index::{DEFAULT_OUTLINE_LEVEL, DEFAULT_SEARCH_LIMIT};
use crate::schema;
use crate::session::DocumentSession;
use crate::tools::ToolDef;

/// Get all document tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "search_content",
            "Search document blocks by content. Query and block text are split into \
             lowercase words; blocks are ranked by how many times query words occur, \
             ties broken by reading order. Returns blockId, type and a snippet per hit.",
            schema!(object {
                required: { "query": string "Search query text" },
                optional: {
                    "limit": number "Maximum results to return" = DEFAULT_SEARCH_LIMIT,
                    "type": block_type "Only return blocks of this type"
                }
            }),
        ),
        ToolDef::new(
            "get_section",
            "Retrieve a single block by id with its full content and metadata.",
            schema!(object {
                required: { "sectionId": string "Block id to retrieve" }
            }),
        ),
        ToolDef::new(
            "list_headings",
            "List document headings as a nested outline. Each node has id, title, \
             level and children; only headings at or above maxLevel are included.",
            schema!(object {
                optional: { "maxLevel": number "Deepest heading level to include" = DEFAULT_OUTLINE_LEVEL }
            }),
        ),
    ]
}

/// Dispatch a document tool call.
pub fn dispatch(
    session: &DocumentSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "search_content" => dispatch_search(session, args),
        "get_section" => dispatch_get_section(session, args),
        "list_headings" => dispatch_list_headings(session, args),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

// ── Search ───────────────────────────────────────────────────────────────

fn dispatch_search(session: &DocumentSession, args: Map<String, JsonValue>) -> Result<JsonValue> {
    let query = get_string_arg(&args, "query")?;
    let limit = get_optional_u64(&args, "limit")?
        .map_or(DEFAULT_SEARCH_LIMIT, |n| usize::try_from(n).unwrap_or(usize::MAX));
    let filter = get_optional_block_type(&args, "type")?;

    let hits = session.search(&query, limit, filter);
    tracing::debug!(query = %query, hits = hits.len(), "search_content");

    text_result(&serde_json::json!({
        "query": query,
        "totalResults": hits.len(),
        "results": hits,
    }))
}

// ── Section ──────────────────────────────────────────────────────────────

fn dispatch_get_section(
    session: &DocumentSession,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let section_id = get_string_arg(&args, "sectionId")?;
    let block = session.section(&section_id)?;
    text_result(block)
}

// ── Headings ─────────────────────────────────────────────────────────────

fn dispatch_list_headings(
    session: &DocumentSession,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let max_level = get_optional_u64(&args, "maxLevel")?
        .map_or(DEFAULT_OUTLINE_LEVEL, |n| u32::try_from(n).unwrap_or(u32::MAX));

    text_result(&serde_json::json!({
        "maxLevel": max_level,
        "headings": session.outline(max_level),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockType, DocumentInfo};
    use crate::store::DocumentStore;
    use serde_json::json;

    fn session() -> (DocumentSession, Vec<String>) {
        let mut store = DocumentStore::new(DocumentInfo::titled("Terms"));
        let ids = vec![
            store
                .add_block(BlockType::Heading, "Terms and Conditions", Some(1))
                .unwrap(),
            store
                .add_block(BlockType::Paragraph, "These terms are legally binding on you.", None)
                .unwrap(),
            store.add_block(BlockType::Heading, "Fees", Some(2)).unwrap(),
        ];
        (DocumentSession::new(store.build().unwrap()), ids)
    }

    fn payload(result: JsonValue) -> JsonValue {
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn search_returns_hits_with_block_ids() {
        let (session, ids) = session();
        let out = payload(
            dispatch(&session, "search_content", args(json!({"query": "terms"}))).unwrap(),
        );
        assert_eq!(out["totalResults"], 2);
        assert_eq!(out["results"][0]["blockId"], ids[0].as_str());
        assert_eq!(out["results"][0]["type"], "heading");
        assert!(out["results"][0]["snippet"].is_string());
    }

    #[test]
    fn search_type_filter() {
        let (session, ids) = session();
        let out = payload(
            dispatch(
                &session,
                "search_content",
                args(json!({"query": "terms", "type": "paragraph", "limit": 5})),
            )
            .unwrap(),
        );
        assert_eq!(out["totalResults"], 1);
        assert_eq!(out["results"][0]["blockId"], ids[1].as_str());
    }

    #[test]
    fn get_section_miss_is_section_not_found() {
        let (session, _) = session();
        let err = dispatch(&session, "get_section", args(json!({"sectionId": "zzz"}))).unwrap_err();
        assert!(matches!(err, McpError::SectionNotFound(_)));
    }

    #[test]
    fn list_headings_defaults_to_level_three() {
        let (session, ids) = session();
        let out = payload(dispatch(&session, "list_headings", Map::new()).unwrap());
        assert_eq!(out["maxLevel"], 3);
        assert_eq!(out["headings"][0]["id"], ids[0].as_str());
        assert_eq!(out["headings"][0]["children"][0]["title"], "Fees");

        let out = payload(dispatch(&session, "list_headings", args(json!({"maxLevel": 1}))).unwrap());
        assert_eq!(
            out["headings"],
            json!([{"id": ids[0], "title": "Terms and Conditions", "level": 1, "children": []}])
        );
    }
}
