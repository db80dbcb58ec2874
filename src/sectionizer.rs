//! Section segmentation.
//!
//! Walks a parsed markup tree and re-emits it with trigger markers inserted
//! wherever the accumulated visible-word count crosses [`WORD_THRESHOLD`].
//! Each marker carries the full text of the section it closes, which later
//! feeds the summary prompt. The traversal uses an explicit work stack, so
//! books with pathologically deep nesting segment without touching the call
//! stack.

use crate::markup::{MarkupTree, NodeId, NodeKind};
use tracing::debug;

/// Accumulated words that close a section.
pub const WORD_THRESHOLD: usize = 1000;

/// A closed reading section. Immutable after construction apart from
/// `consumed`, which flips once the reader asks for its summary.
#[derive(Debug, Clone)]
pub struct Section {
    pub index: usize,
    pub text: String,
    pub word_count: usize,
    pub consumed: bool,
}

/// The annotated output of [`segment`]: a rebuilt tree plus the sections its
/// trigger nodes point at.
#[derive(Debug, Clone)]
pub struct SectionedBook {
    pub tree: MarkupTree,
    pub root: NodeId,
    pub sections: Vec<Section>,
}

struct Frame {
    src: NodeId,
    dest_parent: NodeId,
    /// Where a trigger goes if a text node under `dest_parent` crosses the
    /// threshold: the parent of the containing clone, never the clone itself.
    trigger_target: NodeId,
}

/// Rebuild `source` with section-break markers.
///
/// Elements are shallow-cloned before their children are processed, so
/// markers land between structural siblings. Text runs are copied verbatim;
/// the running section buffer is the exact concatenation of every text node
/// seen since the previous marker. The trailing partial section (fewer than
/// [`WORD_THRESHOLD`] words) gets no marker.
pub fn segment(source: &MarkupTree, source_root: NodeId) -> SectionedBook {
    let mut tree = MarkupTree::new();
    let root = tree.new_element("body", Vec::new());
    let mut sections: Vec<Section> = Vec::new();

    let mut word_count = 0usize;
    let mut section_text = String::new();

    let mut stack: Vec<Frame> = source
        .children(source_root)
        .iter()
        .rev()
        .map(|&src| Frame {
            src,
            dest_parent: root,
            trigger_target: root,
        })
        .collect();

    while let Some(frame) = stack.pop() {
        match &source.get(frame.src).kind {
            NodeKind::Text(text) => {
                word_count += text.split_whitespace().count();
                section_text.push_str(text);
                let copy = tree.new_text(text.clone());
                tree.push_child(frame.dest_parent, copy);

                if word_count >= WORD_THRESHOLD {
                    let index = sections.len();
                    sections.push(Section {
                        index,
                        text: std::mem::take(&mut section_text),
                        word_count,
                        consumed: false,
                    });
                    let trigger = tree.new_trigger(index);
                    tree.push_child(frame.trigger_target, trigger);
                    word_count = 0;
                }
            }
            NodeKind::Element { tag, attrs } => {
                let clone = tree.new_element(tag.clone(), attrs.clone());
                tree.push_child(frame.dest_parent, clone);
                for &child in source.children(frame.src).iter().rev() {
                    stack.push(Frame {
                        src: child,
                        dest_parent: clone,
                        trigger_target: frame.dest_parent,
                    });
                }
            }
            // Segmentation runs on freshly parsed trees; word and trigger
            // nodes only exist downstream of it.
            NodeKind::Word(_) | NodeKind::Trigger { .. } => {}
        }
    }

    debug!(
        sections = sections.len(),
        trailing_words = word_count,
        "Segmented book content"
    );

    SectionedBook {
        tree,
        root,
        sections,
    }
}
