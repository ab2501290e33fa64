//! Inline parsing engine.
//!
//! One [`InlineParser`] per block text span. Registered character
//! handlers consume input left to right, appending nodes under the span's
//! root and pushing potential delimiters onto the stack; after the scan a
//! final delimiter sweep pairs whatever is still open and everything
//! unconsumed degrades to literal text. Malformed markup never fails the
//! parse.

pub mod autolink;
pub mod brackets;
pub mod code_span;
pub mod delimiter;
pub mod emphasis;
pub mod extension;
pub mod mention;
pub mod smart;
pub mod strikethrough;

use crate::cursor::Cursor;
use crate::limits;
use crate::reference::ReferenceMap;
use crate::tree::{NodeId, NodeKind, Tree};
use delimiter::{scan_delims, DelimiterStack};
use emphasis::process_delimiters;
use extension::Environment;

/// Parse one block's text span into an inline node tree.
pub fn parse_inline(env: &Environment, text: &str, refs: &ReferenceMap) -> Tree {
    let mut parser = InlineParser::new(text, refs);
    while !parser.cursor.is_eof() {
        parser.step(env);
    }
    process_delimiters(&mut parser.tree, &mut parser.stack, env.rules(), 0);
    let root = parser.root;
    parser.tree.merge_text_recursive(root);
    parser.tree
}

/// Parser state for a single span: cursor, evolving tree, delimiter
/// stack, and the read-only reference map.
pub struct InlineParser<'a> {
    input: &'a str,
    pub(crate) cursor: Cursor<'a>,
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    pub(crate) stack: DelimiterStack,
    refs: &'a ReferenceMap,
}

impl<'a> InlineParser<'a> {
    fn new(input: &'a str, refs: &'a ReferenceMap) -> Self {
        let tree = Tree::new();
        let root = tree.root();
        Self {
            input,
            cursor: Cursor::new(input.as_bytes()),
            tree,
            root,
            stack: DelimiterStack::new(),
            refs,
        }
    }

    /// The full source span.
    #[inline]
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// The cursor, for handlers that scan ahead.
    #[inline]
    pub fn cursor(&self) -> &Cursor<'a> {
        &self.cursor
    }

    #[inline]
    pub fn cursor_mut(&mut self) -> &mut Cursor<'a> {
        &mut self.cursor
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The references collected by the host's block scan.
    #[inline]
    pub fn references(&self) -> &ReferenceMap {
        self.refs
    }

    /// Source text between two absolute offsets.
    #[inline]
    pub fn source(&self, start: usize, end: usize) -> &'a str {
        std::str::from_utf8(self.cursor.slice(start, end)).unwrap_or("")
    }

    /// Append a node at the current position (as the last child of the
    /// span root).
    pub fn append(&mut self, kind: NodeKind) -> NodeId {
        let id = self.tree.new_node(kind);
        self.tree.append(self.root, id);
        id
    }

    /// Append a plain text node.
    pub fn append_text(&mut self, text: impl Into<String>) -> NodeId {
        self.append(NodeKind::Text(text.into()))
    }

    /// Scan a delimiter run at the cursor, emit its placeholder text
    /// node, and push it onto the stack if it can open or close.
    ///
    /// This is the whole job of a handler for a rule-registered
    /// delimiter character.
    pub fn scan_delimiter_run(&mut self, ch: u8) {
        let start = self.cursor.offset();
        let (count, can_open, can_close) = scan_delims(&mut self.cursor, ch);
        let literal = self.source(start, self.cursor.offset()).to_string();
        let node = self.append_text(literal);
        if (can_open || can_close) && self.stack.len() < limits::MAX_DELIMITERS {
            let position = self.cursor.offset();
            self.stack.push(node, ch, count, position, can_open, can_close);
        }
    }

    /// Dispatch one character.
    fn step(&mut self, env: &Environment) {
        let Some(b) = self.cursor.peek() else {
            return;
        };
        if !env.is_trigger(b) {
            self.handle_text_run(env);
            return;
        }

        // Extensions get first right-of-refusal on their triggers.
        let before = self.cursor.offset();
        for handler in env.handlers_for(b) {
            if handler.parse(self) {
                debug_assert!(
                    self.cursor.offset() > before,
                    "handler claimed a match without consuming input"
                );
                return;
            }
            debug_assert_eq!(
                self.cursor.offset(),
                before,
                "handler declined but moved the cursor"
            );
        }

        match b {
            b'\n' => self.handle_newline(),
            b'\\' => self.handle_backslash(),
            b'`' => self.handle_backticks(),
            b'&' => self.handle_entity(),
            b'<' => self.handle_angle(),
            b'*' | b'_' => self.scan_delimiter_run(b),
            b'[' => self.handle_open_bracket(),
            b'!' => self.handle_bang(),
            b']' => self.handle_close_bracket(env),
            _ => {
                // An extension trigger whose handlers all declined.
                self.cursor.bump();
                self.append_text((b as char).to_string());
            }
        }
    }

    /// Plain text up to the next trigger character.
    fn handle_text_run(&mut self, env: &Environment) {
        let start = self.cursor.offset();
        while let Some(b) = self.cursor.peek() {
            if env.is_trigger(b) {
                break;
            }
            self.cursor.bump();
        }
        let text = self.source(start, self.cursor.offset()).to_string();
        self.append_text(text);
    }

    /// Soft break, or hard break after two trailing spaces.
    fn handle_newline(&mut self) {
        self.cursor.bump();

        let mut hard = false;
        if let Some(last) = self.tree.last_child(self.root) {
            if let Some(s) = self.tree.text_mut(last) {
                let trimmed = s.trim_end_matches(' ');
                hard = s.len() - trimmed.len() >= 2;
                let new_len = trimmed.len();
                s.truncate(new_len);
                if new_len == 0 {
                    self.tree.detach(last);
                }
            }
        }

        self.append(if hard { NodeKind::HardBreak } else { NodeKind::SoftBreak });
        // Leading whitespace of the next line is not content.
        self.cursor.skip_spaces();
    }

    /// Backslash escape: the escaped character becomes text that can
    /// never act as a delimiter; backslash-newline is a hard break.
    fn handle_backslash(&mut self) {
        self.cursor.bump();
        match self.cursor.peek() {
            Some(c) if c.is_ascii_punctuation() => {
                self.cursor.bump();
                self.append_text((c as char).to_string());
            }
            Some(b'\n') => {
                self.cursor.bump();
                self.append(NodeKind::HardBreak);
                self.cursor.skip_spaces();
            }
            _ => {
                self.append_text("\\");
            }
        }
    }

    /// Entity reference: `&name;`, `&#n;`, `&#xh;`. Unknown entities stay
    /// literal.
    fn handle_entity(&mut self) {
        const MAX_ENTITY_LENGTH: usize = 48;

        let start = self.cursor.offset();
        let looks_like_entity = (|| {
            let mut i = 1;
            let mut seen = 0usize;
            while let Some(b) = self.cursor.peek_ahead(i) {
                match b {
                    b';' if seen > 0 => return Some(i + 1),
                    b';' => return None,
                    b'#' if i == 1 => {}
                    b if b.is_ascii_alphanumeric() => seen += 1,
                    _ => return None,
                }
                i += 1;
                if i > MAX_ENTITY_LENGTH {
                    return None;
                }
            }
            None
        })();

        let Some(len) = looks_like_entity else {
            self.cursor.bump();
            self.append_text("&");
            return;
        };

        let raw = self.source(start, start + len);
        let decoded = html_escape::decode_html_entities(raw);
        if decoded == raw {
            self.cursor.bump();
            self.append_text("&");
            return;
        }
        let decoded = decoded.into_owned();
        self.cursor.advance(len);
        self.append_text(decoded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Tree {
        let env = Environment::commonmark();
        parse_inline(&env, text, &ReferenceMap::new())
    }

    fn root_kinds(tree: &Tree) -> Vec<String> {
        tree.children(tree.root())
            .map(|id| format!("{:?}", tree.kind(id)))
            .collect()
    }

    #[test]
    fn test_plain_text() {
        let tree = parse("hello world");
        let kids: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(kids.len(), 1);
        assert_eq!(tree.text(kids[0]), Some("hello world"));
    }

    #[test]
    fn test_simple_emphasis() {
        let tree = parse("*hi*");
        let kids: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(kids.len(), 1);
        assert!(matches!(tree.kind(kids[0]), NodeKind::Emph));
        assert_eq!(tree.literal_text(tree.root()), "hi");
    }

    #[test]
    fn test_strong_emphasis() {
        let tree = parse("**hi**");
        let kids: Vec<_> = tree.children(tree.root()).collect();
        assert!(matches!(tree.kind(kids[0]), NodeKind::Strong), "{:?}", root_kinds(&tree));
    }

    #[test]
    fn test_unmatched_star_is_literal() {
        let tree = parse("a * b");
        assert_eq!(tree.literal_text(tree.root()), "a * b");
        assert!(tree
            .children(tree.root())
            .all(|id| matches!(tree.kind(id), NodeKind::Text(_))));
    }

    #[test]
    fn test_soft_break() {
        let tree = parse("foo\nbar");
        let kinds: Vec<_> = tree
            .children(tree.root())
            .map(|id| std::mem::discriminant(tree.kind(id)))
            .collect();
        assert_eq!(kinds.len(), 3);
        let mid = tree.children(tree.root()).nth(1).unwrap();
        assert!(matches!(tree.kind(mid), NodeKind::SoftBreak));
    }

    #[test]
    fn test_hard_break_two_spaces() {
        let tree = parse("foo  \nbar");
        let mid = tree.children(tree.root()).nth(1).unwrap();
        assert!(matches!(tree.kind(mid), NodeKind::HardBreak));
        let first = tree.first_child(tree.root()).unwrap();
        assert_eq!(tree.text(first), Some("foo"));
    }

    #[test]
    fn test_hard_break_backslash() {
        let tree = parse("foo\\\nbar");
        let mid = tree.children(tree.root()).nth(1).unwrap();
        assert!(matches!(tree.kind(mid), NodeKind::HardBreak));
    }

    #[test]
    fn test_backslash_escape_star() {
        let tree = parse("\\*not emphasis\\*");
        assert_eq!(tree.literal_text(tree.root()), "*not emphasis*");
        assert!(tree
            .children(tree.root())
            .all(|id| matches!(tree.kind(id), NodeKind::Text(_))));
    }

    #[test]
    fn test_entity_named() {
        let tree = parse("a&amp;b");
        assert_eq!(tree.literal_text(tree.root()), "a&b");
    }

    #[test]
    fn test_entity_numeric() {
        let tree = parse("&#35;");
        assert_eq!(tree.literal_text(tree.root()), "#");
    }

    #[test]
    fn test_entity_unknown_stays_literal() {
        let tree = parse("&zzzznotanentity;");
        assert_eq!(tree.literal_text(tree.root()), "&zzzznotanentity;");
    }

    #[test]
    fn test_bare_ampersand() {
        let tree = parse("fish & chips");
        assert_eq!(tree.literal_text(tree.root()), "fish & chips");
    }
}
