//! Markup tree and a lenient XHTML reader.
//!
//! EPUB chapters are concatenated into one blob before parsing, so the reader
//! has to tolerate repeated `<?xml?>` declarations, doctypes, and the odd
//! unmatched end tag. Parsed content lands in an arena (`MarkupTree`) so the
//! rest of the pipeline can traverse and rewrite nodes without recursion.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;

/// Handle into a [`MarkupTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    /// A run of character data, whitespace included.
    Text(String),
    /// One non-whitespace token produced by word wrapping; clickable.
    Word(String),
    /// Synthetic section-break marker pointing at a closed section.
    Trigger { section: usize },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    /// One-shot marker set once a node's text has been word-wrapped.
    pub wrapped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MarkupTree {
    nodes: Vec<Node>,
}

impl MarkupTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn new_element(&mut self, tag: impl Into<String>, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.into(),
            attrs,
        })
    }

    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn new_word(&mut self, word: impl Into<String>) -> NodeId {
        self.push(NodeKind::Word(word.into()))
    }

    pub fn new_trigger(&mut self, section: usize) -> NodeId {
        self.push(NodeKind::Trigger { section })
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
            wrapped: false,
        });
        id
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Exact concatenation of all text and word runs under `id`, in document
    /// order. Iterative so deeply nested markup cannot blow the stack.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match &self.get(current).kind {
                NodeKind::Text(text) | NodeKind::Word(text) => out.push_str(text),
                NodeKind::Element { .. } => {
                    for &child in self.children(current).iter().rev() {
                        stack.push(child);
                    }
                }
                NodeKind::Trigger { .. } => {}
            }
        }
        out
    }
}

/// Block-level tags eligible for independent rendering and lazy wrapping.
pub fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "aside"
            | "figure"
            | "figcaption"
            | "table"
            | "header"
            | "footer"
            | "nav"
    )
}

/// Tags whose element scope is dropped but whose children stay in place. The
/// concatenated blob carries one `<html><body>` pair per chapter; flattening
/// them merges every chapter under a single root.
fn is_transparent_tag(tag: &str) -> bool {
    matches!(tag, "html" | "body")
}

/// Tags whose entire subtree is dropped from the rendered document.
fn is_skipped_tag(tag: &str) -> bool {
    matches!(tag, "head" | "script" | "style" | "template")
}

/// Void elements never open a scope even when serialized as `<br>`.
fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Parse a raw markup blob into a tree rooted at a synthetic `body` element.
///
/// The reader is deliberately forgiving: end-tag name checking is off,
/// unmatched end tags are dropped, and anything the reader chokes on past the
/// last good event is abandoned with a warning rather than an error. Malformed
/// books still render whatever could be read.
pub fn parse_markup(raw: &str) -> (MarkupTree, NodeId) {
    let mut tree = MarkupTree::new();
    let root = tree.new_element("body", Vec::new());

    let mut reader = Reader::from_str(raw);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    // Open element scopes, innermost last. `root` is the implicit bottom.
    let mut open: Vec<(String, NodeId)> = Vec::new();
    let mut skip_depth = 0usize;
    let mut text_buf = String::new();

    macro_rules! flush_text {
        () => {
            if !text_buf.is_empty() {
                let parent = open.last().map(|(_, id)| *id).unwrap_or(root);
                let text = tree.new_text(std::mem::take(&mut text_buf));
                tree.push_child(parent, text);
            }
        };
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = tag_name(e.name().as_ref());
                if skip_depth > 0 {
                    if !is_void_tag(&tag) {
                        skip_depth += 1;
                    }
                    continue;
                }
                if is_skipped_tag(&tag) {
                    flush_text!();
                    skip_depth = 1;
                    continue;
                }
                if is_transparent_tag(&tag) || is_void_tag(&tag) {
                    flush_text!();
                    if is_void_tag(&tag) {
                        let parent = open.last().map(|(_, id)| *id).unwrap_or(root);
                        let node = tree.new_element(tag, read_attrs(&e));
                        tree.push_child(parent, node);
                    }
                    continue;
                }
                flush_text!();
                let parent = open.last().map(|(_, id)| *id).unwrap_or(root);
                let node = tree.new_element(tag.clone(), read_attrs(&e));
                tree.push_child(parent, node);
                open.push((tag, node));
            }
            Ok(Event::Empty(e)) => {
                if skip_depth > 0 {
                    continue;
                }
                let tag = tag_name(e.name().as_ref());
                if is_skipped_tag(&tag) || is_transparent_tag(&tag) {
                    continue;
                }
                flush_text!();
                let parent = open.last().map(|(_, id)| *id).unwrap_or(root);
                let node = tree.new_element(tag, read_attrs(&e));
                tree.push_child(parent, node);
            }
            Ok(Event::End(e)) => {
                let tag = tag_name(e.name().as_ref());
                if skip_depth > 0 {
                    if !is_void_tag(&tag) {
                        skip_depth -= 1;
                    }
                    continue;
                }
                if is_transparent_tag(&tag) || is_void_tag(&tag) {
                    continue;
                }
                flush_text!();
                // Close the nearest matching open scope; ignore strays.
                if let Some(pos) = open.iter().rposition(|(name, _)| *name == tag) {
                    open.truncate(pos);
                }
            }
            Ok(Event::Text(e)) => {
                if skip_depth == 0 {
                    text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if skip_depth == 0 {
                    text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if skip_depth == 0 {
                    let entity = String::from_utf8_lossy(e.as_ref()).into_owned();
                    match resolve_entity(&entity) {
                        Some(resolved) => text_buf.push(resolved),
                        // Unknown reference: keep it readable rather than drop it.
                        None => {
                            text_buf.push('&');
                            text_buf.push_str(&entity);
                            text_buf.push(';');
                        }
                    }
                }
            }
            Ok(Event::Decl(_) | Event::DocType(_) | Event::PI(_) | Event::Comment(_)) => {}
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!(%err, "Abandoning markup parse after reader error");
                break;
            }
        }
    }
    flush_text!();

    (tree, root)
}

fn tag_name(raw: &[u8]) -> String {
    // Strip any namespace prefix and normalize case ("DIV" and "xhtml:div"
    // both become "div").
    let local = raw
        .iter()
        .rposition(|&b| b == b':')
        .map(|i| &raw[i + 1..])
        .unwrap_or(raw);
    String::from_utf8_lossy(local).to_ascii_lowercase()
}

fn read_attrs(e: &quick_xml::events::BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect()
}

/// Resolve character/entity references: the XML five, a small table of HTML
/// names common in EPUB prose, and numeric references.
fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => return Some('&'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "quot" => return Some('"'),
        "apos" => return Some('\''),
        "nbsp" => return Some('\u{a0}'),
        "shy" => return Some('\u{ad}'),
        "lsquo" => return Some('\u{2018}'),
        "rsquo" => return Some('\u{2019}'),
        "ldquo" => return Some('\u{201c}'),
        "rdquo" => return Some('\u{201d}'),
        "ndash" => return Some('\u{2013}'),
        "mdash" => return Some('\u{2014}'),
        "hellip" => return Some('\u{2026}'),
        _ => {}
    }

    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix(['x', 'X']) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_child_tag(tree: &MarkupTree, id: NodeId) -> Option<&str> {
        tree.children(id).first().and_then(|&c| tree.tag(c))
    }

    #[test]
    fn parses_nested_elements_and_text() {
        let (tree, root) = parse_markup("<div><p>Hello <em>world</em></p></div>");

        let div = tree.children(root)[0];
        assert_eq!(tree.tag(div), Some("div"));
        let p = tree.children(div)[0];
        assert_eq!(tree.tag(p), Some("p"));
        assert_eq!(tree.text_content(p), "Hello world");
    }

    #[test]
    fn preserves_attributes() {
        let (tree, root) = parse_markup(r#"<p id="intro" class="lead">x</p>"#);

        let p = tree.children(root)[0];
        match &tree.get(p).kind {
            NodeKind::Element { attrs, .. } => {
                assert_eq!(
                    attrs,
                    &vec![
                        ("id".to_string(), "intro".to_string()),
                        ("class".to_string(), "lead".to_string()),
                    ]
                );
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn flattens_html_and_body_and_drops_head() {
        let raw = "<html><head><title>skip</title><style>p{}</style></head>\
                   <body><p>kept</p></body></html>";
        let (tree, root) = parse_markup(raw);

        assert_eq!(first_child_tag(&tree, root), Some("p"));
        assert_eq!(tree.text_content(root), "kept");
    }

    #[test]
    fn merges_concatenated_chapters_under_one_root() {
        let raw = "<?xml version=\"1.0\"?><html><body><p>one</p></body></html>\
                   <?xml version=\"1.0\"?><html><body><p>two</p></body></html>";
        let (tree, root) = parse_markup(raw);

        let tags: Vec<_> = tree
            .children(root)
            .iter()
            .filter_map(|&c| tree.tag(c))
            .collect();
        assert_eq!(tags, vec!["p", "p"]);
        assert_eq!(tree.text_content(root), "onetwo");
    }

    #[test]
    fn decodes_entities_into_a_single_text_run() {
        let (tree, root) = parse_markup("<p>Tom &amp; Jerry&#8217;s &nbsp;day</p>");

        let p = tree.children(root)[0];
        // One merged text node, not three fragments around the references.
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.text_content(p), "Tom & Jerry\u{2019}s \u{a0}day");
    }

    #[test]
    fn keeps_unknown_references_verbatim() {
        let (tree, root) = parse_markup("<p>a &unknownref; b</p>");
        assert_eq!(tree.text_content(root), "a &unknownref; b");
    }

    #[test]
    fn tolerates_unmatched_end_tags() {
        let (tree, root) = parse_markup("<p>one</span></p><p>two</p>");
        assert_eq!(tree.text_content(root), "onetwo");
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let (tree, root) = parse_markup("<p>before<br>after</p>");
        let p = tree.children(root)[0];
        assert_eq!(tree.text_content(p), "beforeafter");
        // text, br, text
        assert_eq!(tree.children(p).len(), 3);
    }

    #[test]
    fn closed_void_tags_inside_head_do_not_end_the_skip_early() {
        let raw = "<head><meta charset=\"utf-8\"></meta><title>skip</title></head><p>kept</p>";
        let (tree, root) = parse_markup(raw);
        assert_eq!(tree.text_content(root), "kept");
    }

    #[test]
    fn empty_input_yields_bare_root() {
        let (tree, root) = parse_markup("");
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn namespaced_and_uppercase_tags_normalize() {
        let (tree, root) = parse_markup("<DIV><xhtml:p>x</xhtml:p></DIV>");
        let div = tree.children(root)[0];
        assert_eq!(tree.tag(div), Some("div"));
        assert_eq!(first_child_tag(&tree, div), Some("p"));
    }
}
