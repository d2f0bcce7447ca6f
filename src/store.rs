//! Append-only document store.
//!
//! Blocks are accumulated during the build phase and finalized exactly once by
//! [`DocumentStore::build`], which validates the whole sequence and reports
//! every violated rule at once.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::block::{Block, BlockMetadata, BlockType, Document, DocumentInfo};

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has been built and accepts no further changes.
    #[error("store is frozen: the document has already been built")]
    Frozen,

    /// No block with this id exists.
    #[error("block not found: {0}")]
    NotFound(String),

    /// The block sequence violates one or more document rules.
    #[error("document invalid: {}", summarize(.0))]
    Invalid(Vec<Violation>),
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single broken document rule found by [`DocumentStore::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// Two blocks share an id.
    #[error("duplicate block id '{id}'")]
    DuplicateId {
        /// The repeated id
        id: String,
    },

    /// A block's order is not greater than its predecessor's.
    #[error("block '{id}' has order {order}, not greater than previous order {previous}")]
    OrderNotIncreasing {
        /// Offending block
        id: String,
        /// Predecessor's order
        previous: u64,
        /// This block's order
        order: u64,
    },

    /// A heading has no level, or level 0.
    #[error("heading '{id}' has no level (levels start at 1)")]
    MissingHeadingLevel {
        /// Offending block
        id: String,
    },

    /// A non-heading block carries a level.
    #[error("{block_type} block '{id}' carries a level; only headings have levels")]
    UnexpectedLevel {
        /// Offending block
        id: String,
        /// Its type
        block_type: BlockType,
    },

    /// The first heading is not level 1.
    #[error("first heading '{id}' is level {level}; the first heading must be level 1")]
    FirstHeadingNotLevelOne {
        /// Offending block
        id: String,
        /// Its level
        level: u32,
    },

    /// A heading skips levels relative to the deepest level seen so far.
    #[error("heading '{id}' jumps from level {max_seen} to level {level}; levels may only deepen by 1")]
    HeadingLevelJump {
        /// Offending block
        id: String,
        /// Deepest level seen before it
        max_seen: u32,
        /// Its level
        level: u32,
    },
}

/// A block as supplied by a producer that may carry its own id and order.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    /// Explicit id; generated when absent
    pub id: Option<String>,
    /// Content kind
    pub block_type: BlockType,
    /// Heading level
    pub level: Option<u32>,
    /// Payload
    pub content: String,
    /// Explicit order; next sequential value when absent
    pub order: Option<u64>,
    /// Producer metadata
    pub metadata: BlockMetadata,
}

/// Mutable block accumulator that finalizes into a [`Document`].
#[derive(Debug)]
pub struct DocumentStore {
    info: DocumentInfo,
    blocks: Vec<Block>,
    ids: HashSet<String>,
    next_order: u64,
    frozen: bool,
}

impl DocumentStore {
    /// Create an empty store for a document with the given metadata.
    pub fn new(info: DocumentInfo) -> Self {
        Self {
            info,
            blocks: Vec::new(),
            ids: HashSet::new(),
            next_order: 0,
            frozen: false,
        }
    }

    /// Append a block and return its freshly generated id.
    pub fn add_block(
        &mut self,
        block_type: BlockType,
        content: impl Into<String>,
        level: Option<u32>,
    ) -> Result<String, StoreError> {
        self.add_block_with(block_type, content, level, BlockMetadata::new())
    }

    /// Append a block carrying producer metadata.
    pub fn add_block_with(
        &mut self,
        block_type: BlockType,
        content: impl Into<String>,
        level: Option<u32>,
        metadata: BlockMetadata,
    ) -> Result<String, StoreError> {
        self.import_block(BlockSpec {
            id: None,
            block_type,
            level,
            content: content.into(),
            order: None,
            metadata,
        })
    }

    /// Append a producer-described block.
    ///
    /// Explicit ids and orders are accepted as-is and checked by `build()`.
    pub fn import_block(&mut self, spec: BlockSpec) -> Result<String, StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen);
        }

        let id = match spec.id {
            Some(id) => id,
            None => self.fresh_id(),
        };
        let order = spec.order.unwrap_or(self.next_order);
        self.next_order = self.next_order.max(order.saturating_add(1));

        debug!(id = %id, block_type = %spec.block_type, order, "Adding block");
        self.ids.insert(id.clone());
        self.blocks.push(Block {
            id: id.clone(),
            block_type: spec.block_type,
            level: spec.level,
            content: spec.content,
            order,
            metadata: spec.metadata,
        });
        Ok(id)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = format!("blk-{}", Uuid::new_v4().simple());
            if !self.ids.contains(&id) {
                return id;
            }
        }
    }

    /// Look up a block by id.
    pub fn get(&self, id: &str) -> Result<&Block, StoreError> {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Number of blocks added so far.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no blocks have been added.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether `build()` has succeeded.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Validate, freeze and hash the accumulated blocks.
    ///
    /// On failure the store stays open and the error lists every violation.
    pub fn build(&mut self) -> Result<Document, StoreError> {
        if self.frozen {
            return Err(StoreError::Frozen);
        }

        let violations = validate(&self.blocks);
        if !violations.is_empty() {
            info!(count = violations.len(), "Document build rejected");
            return Err(StoreError::Invalid(violations));
        }

        self.frozen = true;
        let document = Document::finalize(self.info.clone(), self.blocks.clone());
        info!(
            blocks = document.len(),
            hash = %document.content_hash(),
            "Document built"
        );
        Ok(document)
    }
}

/// Check a block sequence against every document rule.
pub fn validate(blocks: &[Block]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut previous_order: Option<u64> = None;
    let mut max_level: Option<u32> = None;

    for block in blocks {
        let count = seen.entry(block.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            violations.push(Violation::DuplicateId {
                id: block.id.clone(),
            });
        }

        if let Some(previous) = previous_order {
            if block.order <= previous {
                violations.push(Violation::OrderNotIncreasing {
                    id: block.id.clone(),
                    previous,
                    order: block.order,
                });
            }
        }
        previous_order = Some(block.order);

        match (block.block_type, block.level) {
            (BlockType::Heading, None | Some(0)) => {
                violations.push(Violation::MissingHeadingLevel {
                    id: block.id.clone(),
                });
            }
            (BlockType::Heading, Some(level)) => {
                match max_level {
                    None if level != 1 => violations.push(Violation::FirstHeadingNotLevelOne {
                        id: block.id.clone(),
                        level,
                    }),
                    Some(max_seen) if level > max_seen.saturating_add(1) => {
                        violations.push(Violation::HeadingLevelJump {
                            id: block.id.clone(),
                            max_seen,
                            level,
                        })
                    }
                    _ => {}
                }
                max_level = Some(max_level.map_or(level, |m| m.max(level)));
            }
            (block_type, Some(_)) => {
                violations.push(Violation::UnexpectedLevel {
                    id: block.id.clone(),
                    block_type,
                });
            }
            (_, None) => {}
        }
    }

    violations
}
