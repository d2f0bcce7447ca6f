//! MCP session state.
//!
//! Holds the built document and its index for the lifetime of the server.

use std::sync::Arc;

use crate::block::{Block, BlockType, Document};
use crate::error::{McpError, Result};
use crate::index::{DocumentStats, Indexer, OutlineNode, SearchHit};

/// Read-only query surface over one document.
///
/// Both fields are derived once from a successful build and never change,
/// so every query takes `&self`.
pub struct DocumentSession {
    /// The built document
    document: Arc<Document>,
    /// Search index and outline source
    index: Indexer,
}

impl DocumentSession {
    /// Create a session over a built document.
    pub fn new(document: Document) -> Self {
        let document = Arc::new(document);
        let index = Indexer::new(Arc::clone(&document));
        Self { document, index }
    }

    /// The served document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The document's index.
    pub fn index(&self) -> &Indexer {
        &self.index
    }

    /// Full-text search.
    pub fn search(&self, query: &str, limit: usize, filter: Option<BlockType>) -> Vec<SearchHit> {
        self.index.search(query, limit, filter)
    }

    /// Exact block lookup.
    pub fn section(&self, block_id: &str) -> Result<&Block> {
        self.index
            .get_section(block_id)
            .ok_or_else(|| McpError::SectionNotFound(block_id.to_string()))
    }

    /// Heading tree up to `max_level`.
    pub fn outline(&self, max_level: u32) -> Vec<OutlineNode> {
        self.index.outline(max_level)
    }

    /// Block counts and word totals.
    pub fn stats(&self) -> DocumentStats {
        self.index.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::DocumentInfo;
    use crate::store::DocumentStore;

    #[test]
    fn section_miss_is_section_not_found() {
        let mut store = DocumentStore::new(DocumentInfo::titled("Doc"));
        let id = store.add_block(BlockType::Paragraph, "text", None).unwrap();
        let session = DocumentSession::new(store.build().unwrap());

        assert_eq!(session.section(&id).unwrap().content, "text");
        assert!(matches!(
            session.section("nope"),
            Err(McpError::SectionNotFound(id)) if id == "nope"
        ));
    }
}
