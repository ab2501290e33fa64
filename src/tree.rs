//! Inline node tree stored in an index-addressed arena.
//!
//! Bracket resolution restructures the tree aggressively (replace a
//! placeholder with a link, reparent everything up to the `]`), so nodes
//! are addressed by stable arena indices and relinking is O(1) pointer
//! surgery on parent/child/sibling index fields. Detaching a node severs
//! both directions of the parent/child link in one step.

use std::fmt;

/// Stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Extension-defined inline node.
///
/// Built-in kinds are a closed set; extensions that need a node the core
/// does not know about implement the capabilities they have instead of
/// inheriting from a base node type.
pub trait CustomInline: fmt::Debug {
    /// Stable kind name for renderers to dispatch on.
    fn name(&self) -> &str;

    /// Literal text content, if this node carries any.
    fn literal(&self) -> Option<&str> {
        None
    }
}

/// Destination and title of a link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkData {
    pub url: String,
    /// Empty when the link carries no title.
    pub title: String,
}

/// Destination, title, and flattened label text of an image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageData {
    pub url: String,
    pub title: String,
    /// Literal text of the image label, markers dropped. An image node
    /// has no children once bracket resolution completes.
    pub alt: String,
}

/// A recognized mention (`@handle` and friends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionData {
    pub prefix: String,
    pub identifier: String,
    /// Filled in by the configured generator; `None` means the generator
    /// declined and the mention stays plain text.
    pub url: Option<String>,
}

impl MentionData {
    /// The literal source text of the mention.
    pub fn literal(&self) -> String {
        format!("{}{}", self.prefix, self.identifier)
    }
}

/// What a node is.
#[derive(Debug)]
pub enum NodeKind {
    /// Top of one parsed span.
    Root,
    Text(String),
    /// Code span content (backticks stripped, newlines normalized).
    Code(String),
    SoftBreak,
    HardBreak,
    Emph,
    Strong,
    Strikethrough,
    Link(LinkData),
    Image(ImageData),
    Mention(MentionData),
    Custom(Box<dyn CustomInline>),
}

impl NodeKind {
    /// Borrow the text content of a `Text` node.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// Arena-backed inline node tree for one parsed span.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree containing only a root node.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(16),
        };
        tree.alloc(NodeKind::Root);
        tree
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        });
        id
    }

    /// Create a detached node.
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind)
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].last_child
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].prev_sibling
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].next_sibling
    }

    /// Borrow the text of a `Text` node.
    #[inline]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.kind(id).text()
    }

    /// Mutably borrow the text of a `Text` node.
    #[inline]
    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.kind_mut(id) {
            NodeKind::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.index()].parent.is_none());
        let prev = self.nodes[parent.index()].last_child;
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[child.index()].prev_sibling = prev;
        self.nodes[child.index()].next_sibling = None;
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }

    /// Insert a detached node immediately after `node`.
    pub fn insert_after(&mut self, node: NodeId, new: NodeId) {
        debug_assert!(self.nodes[new.index()].parent.is_none());
        let parent = self.nodes[node.index()].parent;
        let next = self.nodes[node.index()].next_sibling;
        self.nodes[new.index()].parent = parent;
        self.nodes[new.index()].prev_sibling = Some(node);
        self.nodes[new.index()].next_sibling = next;
        self.nodes[node.index()].next_sibling = Some(new);
        match next {
            Some(n) => self.nodes[n.index()].prev_sibling = Some(new),
            None => {
                if let Some(p) = parent {
                    self.nodes[p.index()].last_child = Some(new);
                }
            }
        }
    }

    /// Insert a detached node immediately before `node`.
    pub fn insert_before(&mut self, node: NodeId, new: NodeId) {
        debug_assert!(self.nodes[new.index()].parent.is_none());
        let parent = self.nodes[node.index()].parent;
        let prev = self.nodes[node.index()].prev_sibling;
        self.nodes[new.index()].parent = parent;
        self.nodes[new.index()].next_sibling = Some(node);
        self.nodes[new.index()].prev_sibling = prev;
        self.nodes[node.index()].prev_sibling = Some(new);
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = Some(new),
            None => {
                if let Some(p) = parent {
                    self.nodes[p.index()].first_child = Some(new);
                }
            }
        }
    }

    /// Unlink a node from its parent and siblings. The node keeps its
    /// own children and can be re-inserted elsewhere.
    pub fn detach(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = next,
            None => {
                if let Some(p) = parent {
                    self.nodes[p.index()].first_child = next;
                }
            }
        }
        match next {
            Some(n) => self.nodes[n.index()].prev_sibling = prev,
            None => {
                if let Some(p) = parent {
                    self.nodes[p.index()].last_child = prev;
                }
            }
        }
        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Iterate the children of a node, front to back.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.first_child(id);
        std::iter::from_fn(move || {
            let id = cur?;
            cur = self.next_sibling(id);
            Some(id)
        })
    }

    /// Merge runs of adjacent `Text` children of `parent` into single nodes.
    pub fn merge_text_children(&mut self, parent: NodeId) {
        let mut cur = self.first_child(parent);
        while let Some(id) = cur {
            let next = self.next_sibling(id);
            match (next, self.text(id).is_some()) {
                (Some(n), true) if self.text(n).is_some() => {
                    let taken = match self.kind_mut(n) {
                        NodeKind::Text(s) => std::mem::take(s),
                        _ => unreachable!(),
                    };
                    self.detach(n);
                    if let Some(s) = self.text_mut(id) {
                        s.push_str(&taken);
                    }
                    // Stay on `id`; there may be another text node after.
                }
                _ => cur = next,
            }
        }
    }

    /// Merge adjacent `Text` nodes throughout a subtree.
    pub fn merge_text_recursive(&mut self, id: NodeId) {
        self.merge_text_children(id);
        let mut child = self.first_child(id);
        while let Some(c) = child {
            self.merge_text_recursive(c);
            child = self.next_sibling(c);
        }
    }

    /// Flatten a subtree into its literal text content: text and code
    /// verbatim, breaks as spaces, mentions as their source text, images
    /// as their alt text, wrapper markers dropped.
    pub fn literal_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_literal(id, &mut out);
        out
    }

    fn collect_literal(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(s) | NodeKind::Code(s) => out.push_str(s),
            NodeKind::SoftBreak | NodeKind::HardBreak => out.push(' '),
            // Mentions carry their source text as a child; images carry
            // their label in `alt`. Neither recurses.
            NodeKind::Mention(m) => {
                out.push_str(&m.prefix);
                out.push_str(&m.identifier);
                return;
            }
            NodeKind::Image(img) => {
                out.push_str(&img.alt);
                return;
            }
            NodeKind::Custom(c) => {
                if let Some(s) = c.literal() {
                    out.push_str(s);
                }
            }
            NodeKind::Root
            | NodeKind::Emph
            | NodeKind::Strong
            | NodeKind::Strikethrough
            | NodeKind::Link(_) => {}
        }
        let mut child = self.first_child(id);
        while let Some(c) = child {
            self.collect_literal(c, out);
            child = self.next_sibling(c);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(tree: &mut Tree, s: &str) -> NodeId {
        tree.new_node(NodeKind::Text(s.to_string()))
    }

    #[test]
    fn test_append_and_children() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        tree.append(root, a);
        tree.append(root, b);

        let kids: Vec<_> = tree.children(root).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.prev_sibling(b), Some(a));
    }

    #[test]
    fn test_detach_middle() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = text(&mut tree, "a");
        let b = text(&mut tree, "b");
        let c = text(&mut tree, "c");
        tree.append(root, a);
        tree.append(root, b);
        tree.append(root, c);

        tree.detach(b);
        let kids: Vec<_> = tree.children(root).collect();
        assert_eq!(kids, vec![a, c]);
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.prev_sibling(c), Some(a));
    }

    #[test]
    fn test_detach_keeps_subtree() {
        let mut tree = Tree::new();
        let root = tree.root();
        let wrap = tree.new_node(NodeKind::Emph);
        let inner = text(&mut tree, "x");
        tree.append(root, wrap);
        tree.append(wrap, inner);

        tree.detach(wrap);
        assert_eq!(tree.first_child(wrap), Some(inner));
        assert_eq!(tree.parent(inner), Some(wrap));
    }

    #[test]
    fn test_insert_after_and_before() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = text(&mut tree, "a");
        tree.append(root, a);
        let b = text(&mut tree, "b");
        tree.insert_after(a, b);
        let z = text(&mut tree, "z");
        tree.insert_before(a, z);

        let kids: Vec<_> = tree.children(root).collect();
        assert_eq!(kids, vec![z, a, b]);
        assert_eq!(tree.last_child(root), Some(b));
        assert_eq!(tree.first_child(root), Some(z));
    }

    #[test]
    fn test_merge_text_children() {
        let mut tree = Tree::new();
        let root = tree.root();
        for s in ["foo", "bar", "baz"] {
            let n = text(&mut tree, s);
            tree.append(root, n);
        }
        let em = tree.new_node(NodeKind::Emph);
        tree.append(root, em);
        let tail = text(&mut tree, "!");
        tree.append(root, tail);

        tree.merge_text_children(root);
        let kids: Vec<_> = tree.children(root).collect();
        assert_eq!(kids.len(), 3);
        assert_eq!(tree.text(kids[0]), Some("foobarbaz"));
        assert_eq!(tree.text(kids[2]), Some("!"));
    }

    #[test]
    fn test_literal_text_flattens_markup() {
        let mut tree = Tree::new();
        let root = tree.root();
        let t = text(&mut tree, "foo ");
        tree.append(root, t);
        let em = tree.new_node(NodeKind::Emph);
        tree.append(root, em);
        let inner = text(&mut tree, "bar");
        tree.append(em, inner);

        assert_eq!(tree.literal_text(root), "foo bar");
    }

    #[test]
    fn test_custom_node_capabilities() {
        #[derive(Debug)]
        struct Marker;
        impl CustomInline for Marker {
            fn name(&self) -> &str {
                "marker"
            }
            fn literal(&self) -> Option<&str> {
                Some("\u{2020}")
            }
        }

        let mut tree = Tree::new();
        let root = tree.root();
        let node = tree.new_node(NodeKind::Custom(Box::new(Marker)));
        tree.append(root, node);

        match tree.kind(node) {
            NodeKind::Custom(c) => assert_eq!(c.name(), "marker"),
            other => panic!("expected custom node, got {other:?}"),
        }
        assert_eq!(tree.literal_text(root), "\u{2020}");
    }

    #[test]
    fn test_literal_text_mention() {
        let mut tree = Tree::new();
        let root = tree.root();
        let m = tree.new_node(NodeKind::Mention(MentionData {
            prefix: "@".to_string(),
            identifier: "alice".to_string(),
            url: None,
        }));
        tree.append(root, m);
        assert_eq!(tree.literal_text(root), "@alice");
    }
}
