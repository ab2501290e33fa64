//! Bracket tracking and link/image resolution.
//!
//! `[` and `![` drop a placeholder text node and a bracket delimiter onto
//! the stack. Every `]` runs the resolution state machine: find the
//! nearest active opener, try the inline form, fall back to the reference
//! forms, and either restructure the tree into a Link/Image or emit a
//! literal `]`. All speculative scanning backtracks through cursor
//! snapshots; a failed attempt leaves the cursor exactly where it began.

use super::delimiter::DelimId;
use super::emphasis::process_delimiters;
use super::extension::Environment;
use super::InlineParser;
use crate::limits;
use crate::tree::{ImageData, LinkData, NodeKind};

impl<'a> InlineParser<'a> {
    /// `[` — potential link opener.
    pub(crate) fn handle_open_bracket(&mut self) {
        self.cursor.bump();
        let node = self.append_text("[");
        self.push_bracket(b'[', node);
    }

    /// `!` — image opener when followed by `[`, literal otherwise.
    pub(crate) fn handle_bang(&mut self) {
        self.cursor.bump();
        if self.cursor.eat(b'[') {
            let node = self.append_text("![");
            self.push_bracket(b'!', node);
        } else {
            self.append_text("!");
        }
    }

    fn push_bracket(&mut self, ch: u8, node: crate::tree::NodeId) {
        // The enclosing bracket (if any) now contains a bracket, which
        // disqualifies it from shortcut-reference fallback.
        if let Some(enclosing) = self.stack.search_by_character(&[b'[', b'!']) {
            self.stack.get_mut(enclosing).bracket_after = true;
        }
        if self.stack.len() < limits::MAX_DELIMITERS {
            let position = self.cursor.offset();
            self.stack.push(node, ch, 1, position, true, false);
        }
    }

    /// `]` — run the resolution state machine.
    pub(crate) fn handle_close_bracket(&mut self, env: &Environment) {
        self.cursor.bump();
        let after_bracket = self.cursor.save();
        let label_end = self.cursor.offset() - 1;

        // 1. No opener: literal `]`.
        let Some(opener) = self.stack.search_by_character(&[b'[', b'!']) else {
            self.append_text("]");
            return;
        };

        // 2. Opener already consumed or invalidated: drop it, literal `]`.
        if !self.stack.get(opener).active {
            self.stack.remove(opener);
            self.append_text("]");
            return;
        }

        let is_image = self.stack.get(opener).ch == b'!';
        let opener_position = self.stack.get(opener).position;

        // 3a. Inline form: `(` spnl destination [ws title] spnl `)`.
        if let Some((url, title)) = self.try_inline_link() {
            self.finish_bracket(env, opener, is_image, url, title);
            return;
        }

        // 3b. Reference form: explicit label, then shortcut fallback on
        // the text between the opener and `]`.
        let mut label = self.scan_link_label();
        if label.is_none() {
            self.cursor.restore(after_bracket);
        }
        if label.as_deref().is_none_or(str::is_empty)
            && !self.stack.get(opener).bracket_after
        {
            label = Some(self.source(opener_position, label_end).to_string());
        }

        if let Some(reference) = label.and_then(|l| self.references().lookup(&l)) {
            let (url, title) = (reference.destination.clone(), reference.title.clone());
            self.finish_bracket(env, opener, is_image, url, title);
            return;
        }

        // 4. Total resolution failure: literal `]`, cursor as if nothing
        // past it was ever examined.
        self.stack.remove(opener);
        self.cursor.restore(after_bracket);
        self.append_text("]");
    }

    /// Build the Link/Image node, restructure the tree, and clean up the
    /// stack.
    fn finish_bracket(
        &mut self,
        env: &Environment,
        opener: DelimId,
        is_image: bool,
        url: String,
        title: String,
    ) {
        let opener_node = self.stack.get(opener).node;
        let opener_position = self.stack.get(opener).position;

        let kind = if is_image {
            NodeKind::Image(ImageData {
                url,
                title,
                alt: String::new(),
            })
        } else {
            NodeKind::Link(LinkData { url, title })
        };
        let new_node = self.tree.new_node(kind);
        self.tree.insert_before(opener_node, new_node);

        // Reparent everything between the opener placeholder and the `]`
        // (i.e. every following sibling) into the new node.
        let mut child = self.tree.next_sibling(opener_node);
        while let Some(n) = child {
            let next = self.tree.next_sibling(n);
            self.tree.detach(n);
            if !is_image {
                self.unwind_mention(n);
            }
            self.tree.append(new_node, n);
            child = next;
        }
        self.tree.detach(opener_node);
        self.stack.remove(opener);

        // Pair any emphasis inside the label, then discard the
        // delimiters above the opener: consumed or dead either way.
        process_delimiters(&mut self.tree, &mut self.stack, env.rules(), opener_position);

        if is_image {
            // No inline structure nests into alt: flatten the
            // emphasis-processed label into a single accumulator and drop
            // the children.
            let alt = self.tree.literal_text(new_node);
            while let Some(c) = self.tree.first_child(new_node) {
                self.tree.detach(c);
            }
            if let NodeKind::Image(data) = self.tree.kind_mut(new_node) {
                data.alt = alt;
            }
        } else {
            self.tree.merge_text_children(new_node);
        }
        let root = self.root;
        self.tree.merge_text_children(root);

        // No links within links: every surviving earlier `[` opener is
        // dead from here on.
        if !is_image {
            self.stack.deactivate_earlier(b'[');
        }
    }

    /// A mention autolinked inside a link label would nest a link in a
    /// link; unwind it back to its source text.
    fn unwind_mention(&mut self, node: crate::tree::NodeId) {
        if let NodeKind::Mention(m) = self.tree.kind(node) {
            let literal = m.literal();
            while let Some(c) = self.tree.first_child(node) {
                self.tree.detach(c);
            }
            *self.tree.kind_mut(node) = NodeKind::Text(literal);
        }
    }

    /// Inline form after `]`: `(` spnl destination [whitespace title]
    /// spnl `)`. Restores the cursor and returns `None` on any failure.
    fn try_inline_link(&mut self) -> Option<(String, String)> {
        let start = self.cursor.save();
        if !self.cursor.eat(b'(') {
            return None;
        }
        self.cursor.skip_space_or_newline();

        let Some(url) = self.scan_link_destination() else {
            self.cursor.restore(start);
            return None;
        };

        // A title must be separated from the destination by whitespace.
        let before_ws = self.cursor.offset();
        self.cursor.skip_space_or_newline();
        let had_whitespace = self.cursor.offset() > before_ws;

        let mut title = String::new();
        if had_whitespace && matches!(self.cursor.peek(), Some(b'"' | b'\'' | b'(')) {
            let Some(t) = self.scan_link_title() else {
                self.cursor.restore(start);
                return None;
            };
            title = t;
            self.cursor.skip_space_or_newline();
        }

        if !self.cursor.eat(b')') {
            self.cursor.restore(start);
            return None;
        }
        Some((url, title))
    }

    /// Link destination: `<...>` or a bare run with balanced parentheses.
    fn scan_link_destination(&mut self) -> Option<String> {
        let saved = self.cursor.save();
        let start = self.cursor.offset();
        if self.cursor.eat(b'<') {
            let content_start = self.cursor.offset();
            loop {
                match self.cursor.peek() {
                    Some(b'>') => {
                        let raw = self.source(content_start, self.cursor.offset());
                        let url = clean_escapes_and_entities(raw);
                        self.cursor.bump();
                        return Some(url);
                    }
                    Some(b'\\') if self.cursor.remaining() >= 2 => self.cursor.advance(2),
                    Some(b'\n') | Some(b'<') | None => {
                        self.cursor.restore(saved);
                        return None;
                    }
                    Some(_) => self.cursor.bump(),
                }
            }
        }

        let mut depth = 0usize;
        loop {
            match self.cursor.peek() {
                Some(b'\\')
                    if self
                        .cursor
                        .peek_ahead(1)
                        .is_some_and(|b| b.is_ascii_punctuation()) =>
                {
                    self.cursor.advance(2);
                }
                Some(b'(') => {
                    depth += 1;
                    if depth > limits::MAX_LINK_PAREN_DEPTH {
                        self.cursor.restore(saved);
                        return None;
                    }
                    self.cursor.bump();
                }
                Some(b')') => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.cursor.bump();
                }
                Some(b) if b.is_ascii_whitespace() || b.is_ascii_control() => {
                    if self.cursor.offset() == start {
                        return None;
                    }
                    break;
                }
                Some(_) => self.cursor.bump(),
                None => break,
            }
        }
        if depth != 0 {
            self.cursor.restore(saved);
            return None;
        }
        let raw = self.source(start, self.cursor.offset());
        Some(clean_escapes_and_entities(raw))
    }

    /// Link title delimited by `"`, `'`, or parentheses.
    fn scan_link_title(&mut self) -> Option<String> {
        let start = self.cursor.save();
        let open = self.cursor.next()?;
        let close = match open {
            b'"' | b'\'' => open,
            b'(' => b')',
            _ => {
                self.cursor.restore(start);
                return None;
            }
        };
        let content_start = self.cursor.offset();
        loop {
            match self.cursor.peek() {
                Some(b) if b == close => {
                    let raw = self.source(content_start, self.cursor.offset());
                    let title = clean_escapes_and_entities(raw);
                    self.cursor.bump();
                    return Some(title);
                }
                Some(b'(') if close == b')' => {
                    // Unescaped nested parens end a paren-delimited title.
                    self.cursor.restore(start);
                    return None;
                }
                Some(b'\\') if self.cursor.remaining() >= 2 => self.cursor.advance(2),
                Some(_) => self.cursor.bump(),
                None => {
                    self.cursor.restore(start);
                    return None;
                }
            }
        }
    }

    /// A bracketed reference label: `[` up to 999 characters, no nested
    /// `[`, `]` terminated. Cursor moves past the closing `]` on success
    /// and is restored on failure.
    fn scan_link_label(&mut self) -> Option<String> {
        let start = self.cursor.save();
        if !self.cursor.eat(b'[') {
            return None;
        }
        let content_start = self.cursor.offset();
        let mut length = 0usize;
        loop {
            match self.cursor.peek() {
                Some(b'[') | None => {
                    self.cursor.restore(start);
                    return None;
                }
                Some(b']') => break,
                Some(b'\\') => {
                    self.cursor.bump();
                    length += 1;
                    if self.cursor.peek().is_some_and(|b| b.is_ascii_punctuation()) {
                        self.cursor.bump();
                        length += 1;
                    }
                }
                Some(_) => {
                    self.cursor.bump();
                    length += 1;
                }
            }
            if length > limits::MAX_LINK_LABEL_LENGTH {
                self.cursor.restore(start);
                return None;
            }
        }
        let label = self.source(content_start, self.cursor.offset()).trim().to_string();
        self.cursor.bump();
        Some(label)
    }
}


/// Backslash-unescape ASCII punctuation, then decode entity references.
fn clean_escapes_and_entities(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut unescaped = String::with_capacity(raw.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_punctuation() {
            unescaped.push(bytes[i + 1] as char);
            i += 2;
        } else {
            let ch_len = utf8_len(bytes[i]);
            unescaped.push_str(std::str::from_utf8(&bytes[i..i + ch_len]).unwrap_or("\u{FFFD}"));
            i += ch_len;
        }
    }
    html_escape::decode_html_entities(&unescaped).into_owned()
}

#[inline]
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}
