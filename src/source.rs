//! Document sources.
//!
//! A source is the JSON block sequence emitted by an upstream converter. It is
//! replayed into a [`DocumentStore`] in file order and built from there, so the
//! same rules apply whether blocks arrive through the API or from disk.

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::block::{BlockMetadata, BlockType, Document, DocumentInfo};
use crate::error::Result;
use crate::store::{BlockSpec, DocumentStore};

/// One block as written by a producer.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceBlock {
    /// Explicit id
    #[serde(default)]
    pub id: Option<String>,
    /// Content kind
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Heading level
    #[serde(default)]
    pub level: Option<u32>,
    /// Payload
    pub content: String,
    /// Explicit reading-order position
    #[serde(default)]
    pub order: Option<u64>,
    /// Producer metadata
    #[serde(default)]
    pub metadata: BlockMetadata,
}

/// A whole document as written by a producer.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSource {
    /// Descriptive metadata
    #[serde(flatten)]
    pub info: DocumentInfo,
    /// Blocks in reading order
    #[serde(default)]
    pub blocks: Vec<SourceBlock>,
}

impl DocumentSource {
    /// Parse a source from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a source file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let source = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            blocks = source.blocks.len(),
            "Loaded document source"
        );
        Ok(source)
    }

    /// Replay the blocks into a fresh store.
    pub fn into_store(self) -> Result<DocumentStore> {
        let mut store = DocumentStore::new(self.info);
        for block in self.blocks {
            store.import_block(BlockSpec {
                id: block.id,
                block_type: block.block_type,
                level: block.level,
                content: block.content,
                order: block.order,
                metadata: block.metadata,
            })?;
        }
        Ok(store)
    }

    /// Replay and build.
    pub fn build(self) -> Result<Document> {
        Ok(self.into_store()?.build()?)
    }
}
