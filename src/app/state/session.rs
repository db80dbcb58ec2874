use crate::markup::{MarkupTree, NodeId, NodeKind, is_block_tag};
use crate::sectionizer::SectionedBook;

/// One entry in the flattened render order: either a block of prose or a
/// section-break marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderItem {
    Block(NodeId),
    Trigger(usize),
}

/// Estimated pixel geometry for a render item, parallel to
/// [`ReadingSession::items`]. Rebuilt on load and on viewport changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemGeometry {
    pub(in crate::app) est_top: f32,
    pub(in crate::app) est_height: f32,
}

/// Scroll tracking for the open book, in pixels of the real scrollable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollState {
    pub(in crate::app) last_offset_px: f32,
    pub(in crate::app) viewport_width: f32,
    pub(in crate::app) viewport_height: f32,
    pub(in crate::app) content_height: f32,
    pub(in crate::app) est_content_height: f32,
}

/// Everything owned by one successfully loaded book. Constructed on load,
/// replaced wholesale by the next load.
pub struct ReadingSession {
    pub(in crate::app) book_name: String,
    pub(in crate::app) book: SectionedBook,
    pub(in crate::app) items: Vec<RenderItem>,
    pub(in crate::app) geometry: Vec<ItemGeometry>,
    pub(in crate::app) scroll: ScrollState,
    /// Saved offset awaiting a one-time correction once the scrollable
    /// reports its real content height.
    pub(in crate::app) pending_restore_px: Option<f32>,
}

impl ReadingSession {
    pub(in crate::app) fn new(book_name: String, book: SectionedBook) -> Self {
        let items = collect_render_items(&book.tree, book.root);
        let geometry = vec![ItemGeometry::default(); items.len()];
        Self {
            book_name,
            book,
            items,
            geometry,
            scroll: ScrollState::default(),
            pending_restore_px: None,
        }
    }
}

/// Flatten the annotated tree into renderable blocks and triggers.
///
/// Structural containers (elements that hold further block-level children or
/// a trigger) are descended into; everything else becomes one block. The
/// block nodes double as the observation registry for lazy word wrapping.
fn collect_render_items(tree: &MarkupTree, root: NodeId) -> Vec<RenderItem> {
    let mut items = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(root).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        match &tree.get(id).kind {
            NodeKind::Trigger { section } => items.push(RenderItem::Trigger(*section)),
            NodeKind::Element { .. } => {
                if contains_block_child(tree, id) {
                    for &child in tree.children(id).iter().rev() {
                        stack.push(child);
                    }
                } else {
                    items.push(RenderItem::Block(id));
                }
            }
            NodeKind::Text(text) => {
                if !text.trim().is_empty() {
                    items.push(RenderItem::Block(id));
                }
            }
            NodeKind::Word(_) => {}
        }
    }
    items
}

fn contains_block_child(tree: &MarkupTree, id: NodeId) -> bool {
    tree.children(id).iter().any(|&child| match &tree.get(child).kind {
        NodeKind::Trigger { .. } => true,
        NodeKind::Element { tag, .. } => is_block_tag(tag),
        _ => false,
    })
}
