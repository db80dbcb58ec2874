//! Lazy word wrapping.
//!
//! Turns the text runs of a block into individually addressable word units
//! once the block nears the viewport. The transformation is a one-shot,
//! guarded by the node's `wrapped` flag: running it twice would split words
//! that are already split. Whitespace runs are preserved as separate text
//! fragments, so the rewrite is byte-for-byte lossless.

use crate::markup::{MarkupTree, NodeId, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// One piece of a split text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSegment<'a> {
    Word(&'a str),
    Whitespace(&'a str),
}

/// Split `text` into word and whitespace segments whose concatenation
/// reproduces the input exactly.
pub fn split_text(text: &str) -> Vec<TextSegment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for gap in WHITESPACE.find_iter(text) {
        if gap.start() > last {
            segments.push(TextSegment::Word(&text[last..gap.start()]));
        }
        segments.push(TextSegment::Whitespace(gap.as_str()));
        last = gap.end();
    }
    if last < text.len() {
        segments.push(TextSegment::Word(&text[last..]));
    }
    segments
}

/// Wrap every text run under `block` into word units, once.
///
/// Whitespace-only runs are left untouched. Returns `false` when the block
/// was already wrapped (the second invocation is a no-op).
pub fn wrap_words(tree: &mut MarkupTree, block: NodeId) -> bool {
    if tree.get(block).wrapped {
        return false;
    }
    tree.get_mut(block).wrapped = true;

    let mut pending = vec![block];
    while let Some(node) = pending.pop() {
        let child_ids = tree.children(node).to_vec();
        let mut rebuilt = Vec::with_capacity(child_ids.len());
        for child in child_ids {
            match &tree.get(child).kind {
                NodeKind::Text(text) if !text.trim().is_empty() => {
                    let text = text.clone();
                    for segment in split_text(&text) {
                        let id = match segment {
                            TextSegment::Word(word) => tree.new_word(word),
                            TextSegment::Whitespace(ws) => tree.new_text(ws),
                        };
                        rebuilt.push(id);
                    }
                }
                NodeKind::Element { .. } => {
                    rebuilt.push(child);
                    pending.push(child);
                }
                _ => rebuilt.push(child),
            }
        }
        tree.get_mut(node).children = rebuilt;
    }
    true
}
