//! Block and document data model.
//!
//! A [`Document`] is only ever produced by [`DocumentStore::build`]; it exposes
//! no mutating API, so everything derived from it is read-only.
//!
//! [`DocumentStore::build`]: crate::store::DocumentStore::build

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::hash::ContentHasher;

/// Producer-supplied block metadata (keywords, importance, purpose, ...).
///
/// Kept sorted so serialized output is stable.
pub type BlockMetadata = BTreeMap<String, JsonValue>;

/// The kind of content a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Section heading; the only type that carries a level
    Heading,
    /// Running text
    Paragraph,
    /// Tabular content
    Table,
    /// Figure or image caption
    Figure,
}

impl BlockType {
    /// Every block type, in declaration order.
    pub const ALL: [BlockType; 4] = [
        BlockType::Heading,
        BlockType::Paragraph,
        BlockType::Table,
        BlockType::Figure,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Heading => "heading",
            BlockType::Paragraph => "paragraph",
            BlockType::Table => "table",
            BlockType::Figure => "figure",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown block type '{}'. Use: heading, paragraph, table, or figure.",
                    s
                )
            })
    }
}

/// An atomic content unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique within the owning document
    pub id: String,
    /// Content kind
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Heading level (headings only, >= 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Raw text/markup payload
    pub content: String,
    /// Reading-order position
    pub order: u64,
    /// Producer-supplied metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BlockMetadata,
}

impl Block {
    /// Whether this block is a heading.
    pub fn is_heading(&self) -> bool {
        self.block_type == BlockType::Heading
    }
}

/// Free-form descriptive metadata attached to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document title
    pub title: String,
    /// Date the document takes effect, as written by the producer
    #[serde(
        rename = "effectiveDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_date: Option<String>,
    /// Where the document came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DocumentInfo {
    /// Document info with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// An immutable, validated, content-hashed sequence of blocks.
#[derive(Debug, Clone)]
pub struct Document {
    info: DocumentInfo,
    blocks: Vec<Block>,
    content_hash: String,
    positions: HashMap<String, usize>,
}

impl Document {
    /// Finalize an already-validated block sequence.
    pub(crate) fn finalize(info: DocumentInfo, blocks: Vec<Block>) -> Self {
        let content_hash = ContentHasher::hash_blocks(&blocks);
        let positions = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
        Self {
            info,
            blocks,
            content_hash,
            positions,
        }
    }

    /// Descriptive metadata.
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// Blocks in reading order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Digest computed when the document was built.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Look up a block by id.
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.positions.get(id).map(|&i| &self.blocks[i])
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Recompute the content hash and compare it to the stored one.
    pub fn verify(&self) -> bool {
        ContentHasher::hash(self) == self.content_hash
    }
}
