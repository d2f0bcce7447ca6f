//! Query structures derived from a built document.
//!
//! The [`Indexer`] is built once and never changes: an inverted term index for
//! search plus the heading list used for outlines.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::block::{Block, BlockType, Document};
use crate::hash::normalize_whitespace;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Default outline depth.
pub const DEFAULT_OUTLINE_LEVEL: u32 = 3;
/// Default number of concepts returned.
pub const DEFAULT_CONCEPT_LIMIT: usize = 20;

/// Characters of content kept in a section preview.
const PREVIEW_CHARS: usize = 100;

/// Words of context kept on each side of the first match in a snippet.
const SNIPPET_LEAD_WORDS: usize = 8;
/// Maximum words in a snippet.
const SNIPPET_WORDS: usize = 30;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Matching block
    pub block_id: String,
    /// Its type
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Excerpt around the first match
    pub snippet: String,
    /// Number of query-term occurrences in the block
    pub score: usize,
    /// Reading-order position of the block
    pub order: u64,
}

/// A heading in the outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    /// Heading block id
    pub id: String,
    /// Normalized heading text
    pub title: String,
    /// Heading level
    pub level: u32,
    /// Nested headings
    pub children: Vec<OutlineNode>,
}

/// A block listed by type, with a short content preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    /// Block id
    pub id: String,
    /// Its type
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Heading level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Leading content, whitespace-normalized
    pub preview: String,
}

/// A producer keyword and how many blocks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Concept {
    /// Keyword text
    pub concept: String,
    /// Number of blocks tagged with it
    pub frequency: usize,
}

/// Summary counts over a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    /// Number of blocks
    pub total_blocks: usize,
    /// Blocks per type
    pub by_type: BTreeMap<BlockType, usize>,
    /// Heading count
    pub headings: usize,
    /// Whitespace-separated words across all content
    pub word_count: usize,
}

/// Split text into lowercase alphanumeric terms.
///
/// Queries and block content go through the same rule.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Read-only search index and outline source over a document.
#[derive(Debug)]
pub struct Indexer {
    document: Arc<Document>,
    /// term -> (block position, occurrences), positions ascending
    postings: HashMap<String, Vec<(usize, usize)>>,
}

impl Indexer {
    /// Index a built document.
    pub fn new(document: Arc<Document>) -> Self {
        let mut postings: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
        for (pos, block) in document.blocks().iter().enumerate() {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for term in tokenize(&block.content) {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, count) in counts {
                postings.entry(term).or_default().push((pos, count));
            }
        }
        tracing::debug!(terms = postings.len(), "Built search index");
        Self { document, postings }
    }

    /// The indexed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Look up a block by id.
    pub fn get_section(&self, block_id: &str) -> Option<&Block> {
        self.document.get(block_id)
    }

    /// Rank blocks by query-term occurrences, ties by ascending order.
    ///
    /// Returns at most `limit` hits; a query matching nothing yields none.
    pub fn search(&self, query: &str, limit: usize, filter: Option<BlockType>) -> Vec<SearchHit> {
        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();
        let blocks = self.document.blocks();

        let mut scores: HashMap<usize, usize> = HashMap::new();
        for term in &terms {
            if let Some(postings) = self.postings.get(term) {
                for &(pos, count) in postings {
                    *scores.entry(pos).or_insert(0) += count;
                }
            }
        }

        let mut ranked: Vec<(usize, usize)> = scores
            .into_iter()
            .filter(|&(pos, _)| filter.map_or(true, |t| blocks[pos].block_type == t))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| blocks[a.0].order.cmp(&blocks[b.0].order))
        });

        ranked
            .into_iter()
            .take(limit)
            .map(|(pos, score)| {
                let block = &blocks[pos];
                SearchHit {
                    block_id: block.id.clone(),
                    block_type: block.block_type,
                    snippet: snippet(&block.content, &terms),
                    score,
                    order: block.order,
                }
            })
            .collect()
    }

    /// Heading tree restricted to `level <= max_level`.
    ///
    /// Each heading nests under the nearest preceding included heading of a
    /// lower level; reading order is preserved.
    pub fn outline(&self, max_level: u32) -> Vec<OutlineNode> {
        let mut roots: Vec<OutlineNode> = Vec::new();
        // Open ancestors, shallowest first
        let mut stack: Vec<OutlineNode> = Vec::new();

        for block in self.document.blocks() {
            let level = match (block.is_heading(), block.level) {
                (true, Some(level)) if level <= max_level => level,
                _ => continue,
            };
            while stack.last().is_some_and(|top| top.level >= level) {
                close_top(&mut stack, &mut roots);
            }
            stack.push(OutlineNode {
                id: block.id.clone(),
                title: normalize_whitespace(&block.content),
                level,
                children: Vec::new(),
            });
        }
        while !stack.is_empty() {
            close_top(&mut stack, &mut roots);
        }
        roots
    }

    /// Blocks in reading order, optionally restricted to one type.
    pub fn sections(&self, filter: Option<BlockType>) -> Vec<SectionSummary> {
        self.document
            .blocks()
            .iter()
            .filter(|b| filter.map_or(true, |t| b.block_type == t))
            .map(|b| SectionSummary {
                id: b.id.clone(),
                block_type: b.block_type,
                level: b.level,
                preview: preview(&b.content),
            })
            .collect()
    }

    /// Keywords from block `metadata.keywords`, most frequent first.
    ///
    /// A keyword counts once per block. Ties are broken alphabetically.
    /// Non-string keyword entries are ignored.
    pub fn concepts(&self, filter: Option<BlockType>, limit: usize) -> Vec<Concept> {
        let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for block in self.document.blocks() {
            if filter.is_some_and(|t| block.block_type != t) {
                continue;
            }
            let Some(keywords) = block.metadata.get("keywords").and_then(|k| k.as_array())
            else {
                continue;
            };
            let distinct: BTreeSet<&str> = keywords.iter().filter_map(|k| k.as_str()).collect();
            for keyword in distinct {
                *frequency.entry(keyword).or_insert(0) += 1;
            }
        }

        let mut concepts: Vec<Concept> = frequency
            .into_iter()
            .map(|(concept, frequency)| Concept {
                concept: concept.to_string(),
                frequency,
            })
            .collect();
        // Stable sort keeps the alphabetical order within equal frequencies
        concepts.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        concepts.truncate(limit);
        concepts
    }

    /// Summary counts for the metadata resource.
    pub fn stats(&self) -> DocumentStats {
        let blocks = self.document.blocks();
        let mut by_type = BTreeMap::new();
        for block in blocks {
            *by_type.entry(block.block_type).or_insert(0) += 1;
        }
        DocumentStats {
            total_blocks: blocks.len(),
            headings: by_type.get(&BlockType::Heading).copied().unwrap_or(0),
            by_type,
            word_count: blocks
                .iter()
                .map(|b| b.content.split_whitespace().count())
                .sum(),
        }
    }
}

fn close_top(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

fn preview(content: &str) -> String {
    let normalized = normalize_whitespace(content);
    match normalized.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &normalized[..cut]),
        None => normalized,
    }
}

/// Excerpt of `content` starting shortly before the first word containing a
/// query term.
fn snippet(content: &str, terms: &BTreeSet<String>) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let first_match = words
        .iter()
        .position(|w| tokenize(w).iter().any(|t| terms.contains(t)))
        .unwrap_or(0);

    let start = first_match.saturating_sub(SNIPPET_LEAD_WORDS);
    let end = (start + SNIPPET_WORDS).min(words.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.push_str(&words[start..end].join(" "));
    if end < words.len() {
        out.push_str("...");
    }
    out
}
