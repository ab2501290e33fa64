//! intramark: CommonMark inline delimiter engine.
//!
//! Parses one block-level text span at a time into an inline node tree:
//! emphasis, links, images, code spans, autolinks, plus extension-defined
//! constructs (strikethrough, smart punctuation, mentions). Block
//! container parsing and HTML rendering are the host's business; this
//! crate owns the part in between — the delimiter stack, the
//! bracket-resolution state machine, and the emphasis pairing rules.
//!
//! # Design Principles
//! - Malformed markup never fails: anything unresolved degrades to
//!   literal text.
//! - Malformed *configuration* fails before the first parse.
//! - The node tree is an index-addressed arena; restructuring during
//!   bracket resolution is O(1) relinking.
//! - Backtracking is explicit: cursor snapshots, saved and restored.
//!
//! # Example
//! ```
//! use intramark::{Environment, NodeKind, ReferenceMap};
//!
//! let env = Environment::commonmark();
//! let mut refs = ReferenceMap::new();
//! refs.add("spec", "https://spec.commonmark.org", "");
//!
//! let tree = env.parse("see the *[spec]*", &refs);
//! assert_eq!(tree.literal_text(tree.root()), "see the spec");
//! ```

pub mod config;
pub mod cursor;
pub mod inline;
pub mod limits;
pub mod reference;
pub mod tree;

// Re-export primary types
pub use config::{ConfigError, GeneratorSpec, MentionConfig, MentionGenerator};
pub use cursor::{Cursor, CursorState};
pub use inline::delimiter::{DelimId, Delimiter, DelimiterStack};
pub use inline::emphasis::DelimiterRule;
pub use inline::extension::{Environment, Extension, InlineHandler};
pub use inline::mention::{Mentions, MentionsBuilder};
pub use inline::smart::SmartPunctuation;
pub use inline::strikethrough::Strikethrough;
pub use inline::{parse_inline, InlineParser};
pub use reference::{normalize_label, Reference, ReferenceMap};
pub use tree::{CustomInline, ImageData, LinkData, MentionData, NodeId, NodeKind, Tree};

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Tree {
        Environment::commonmark().parse(text, &ReferenceMap::new())
    }

    #[test]
    fn test_plain_span() {
        let tree = parse("just words");
        assert_eq!(tree.literal_text(tree.root()), "just words");
    }

    #[test]
    fn test_emphasis_nests() {
        let tree = parse("*outer **inner** outer*");
        let em = tree.first_child(tree.root()).unwrap();
        assert!(matches!(tree.kind(em), NodeKind::Emph));
        let strong = tree
            .children(em)
            .find(|&id| matches!(tree.kind(id), NodeKind::Strong));
        assert!(strong.is_some());
    }

    #[test]
    fn test_inline_link() {
        let tree = parse("[text](https://example.com \"title\")");
        let link = tree.first_child(tree.root()).unwrap();
        match tree.kind(link) {
            NodeKind::Link(l) => {
                assert_eq!(l.url, "https://example.com");
                assert_eq!(l.title, "title");
            }
            other => panic!("expected link, got {other:?}"),
        }
        assert_eq!(tree.literal_text(link), "text");
    }

    #[test]
    fn test_image_alt_is_flat() {
        let tree = parse("![foo *bar*](/img.png)");
        let img = tree.first_child(tree.root()).unwrap();
        match tree.kind(img) {
            NodeKind::Image(i) => assert_eq!(i.alt, "foo bar"),
            other => panic!("expected image, got {other:?}"),
        }
        assert_eq!(tree.first_child(img), None);
    }

    #[test]
    fn test_reference_link() {
        let mut refs = ReferenceMap::new();
        refs.add("foo", "/url", "a title");
        let tree = Environment::commonmark().parse("[foo]", &refs);
        let link = tree.first_child(tree.root()).unwrap();
        match tree.kind(link) {
            NodeKind::Link(l) => {
                assert_eq!(l.url, "/url");
                assert_eq!(l.title, "a title");
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn test_strikethrough_extension() {
        let mut env = Environment::commonmark();
        env.register(&Strikethrough);
        let tree = env.parse("a ~~gone~~ b", &ReferenceMap::new());
        let del = tree
            .children(tree.root())
            .find(|&id| matches!(tree.kind(id), NodeKind::Strikethrough));
        assert!(del.is_some());
    }

    #[test]
    fn test_smart_punctuation_extension() {
        let mut env = Environment::commonmark();
        env.register(&SmartPunctuation);
        let tree = env.parse("\"quoted\" -- and...", &ReferenceMap::new());
        let text = tree.literal_text(tree.root());
        assert_eq!(text, "\u{201C}quoted\u{201D} \u{2013} and\u{2026}");
    }
}
