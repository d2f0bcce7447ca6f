//! Content hashing.
//!
//! The canonical form is a sequence of length-prefixed fields per block, in
//! ascending `order`: type, level (`-` when absent), whitespace-normalized
//! content. Length prefixes keep field boundaries unambiguous, so two distinct
//! block sequences never share a canonical string. Ids and metadata are not
//! part of the canonical form.

use sha2::{Digest, Sha256};

use crate::block::{Block, Document};

/// Computes the identity digest of a document's block sequence.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash a built document's blocks.
    pub fn hash(document: &Document) -> String {
        Self::hash_blocks(document.blocks())
    }

    /// Hash a block sequence. Total over any input.
    pub fn hash_blocks(blocks: &[Block]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(Self::canonicalize(blocks).as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Canonical serialization of a block sequence.
    pub fn canonicalize(blocks: &[Block]) -> String {
        let mut sorted: Vec<&Block> = blocks.iter().collect();
        sorted.sort_by_key(|b| b.order);

        let mut out = String::new();
        for block in sorted {
            let level = block
                .level
                .map_or_else(|| "-".to_string(), |l| l.to_string());
            push_field(&mut out, block.block_type.as_str());
            push_field(&mut out, &level);
            push_field(&mut out, &normalize_whitespace(&block.content));
            out.push('\n');
        }
        out
    }
}

fn push_field(out: &mut String, field: &str) {
    out.push_str(&field.len().to_string());
    out.push(':');
    out.push_str(field);
    out.push(';');
}

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockMetadata, BlockType};

    fn block(id: &str, block_type: BlockType, level: Option<u32>, content: &str, order: u64) -> Block {
        Block {
            id: id.to_string(),
            block_type,
            level,
            content: content.to_string(),
            order,
            metadata: BlockMetadata::new(),
        }
    }

    #[test]
    fn same_blocks_hash_the_same() {
        let a = vec![
            block("x", BlockType::Heading, Some(1), "Terms", 0),
            block("y", BlockType::Paragraph, None, "Binding.", 1),
        ];
        let b = a.clone();
        assert_eq!(ContentHasher::hash_blocks(&a), ContentHasher::hash_blocks(&b));
        assert_eq!(ContentHasher::hash_blocks(&a).len(), 64);
    }

    #[test]
    fn ids_and_whitespace_do_not_affect_hash() {
        let a = vec![block("x", BlockType::Paragraph, None, "two  words\n", 0)];
        let b = vec![block("other", BlockType::Paragraph, None, " two words", 0)];
        assert_eq!(ContentHasher::hash_blocks(&a), ContentHasher::hash_blocks(&b));
    }

    #[test]
    fn hash_follows_order_not_slice_position() {
        let first = block("x", BlockType::Paragraph, None, "first", 0);
        let second = block("y", BlockType::Paragraph, None, "second", 1);
        assert_eq!(
            ContentHasher::hash_blocks(&[first.clone(), second.clone()]),
            ContentHasher::hash_blocks(&[second, first])
        );
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        // "a;" + "b" vs "a" + ";b" would collide under naive joining
        let a = vec![
            block("1", BlockType::Paragraph, None, "a;", 0),
            block("2", BlockType::Paragraph, None, "b", 1),
        ];
        let b = vec![
            block("1", BlockType::Paragraph, None, "a", 0),
            block("2", BlockType::Paragraph, None, ";b", 1),
        ];
        assert_ne!(ContentHasher::canonicalize(&a), ContentHasher::canonicalize(&b));
        assert_ne!(ContentHasher::hash_blocks(&a), ContentHasher::hash_blocks(&b));
    }

    #[test]
    fn level_and_type_change_the_hash() {
        let h1 = vec![block("x", BlockType::Heading, Some(1), "Title", 0)];
        let h2 = vec![block("x", BlockType::Heading, Some(2), "Title", 0)];
        let p = vec![block("x", BlockType::Paragraph, None, "Title", 0)];
        assert_ne!(ContentHasher::hash_blocks(&h1), ContentHasher::hash_blocks(&h2));
        assert_ne!(ContentHasher::hash_blocks(&h1), ContentHasher::hash_blocks(&p));
    }

    #[test]
    fn empty_sequence_hashes() {
        assert_eq!(ContentHasher::hash_blocks(&[]).len(), 64);
    }
}
