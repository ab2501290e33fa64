//! Autolinks: `<https://example.com>` and `<user@example.com>`.
//!
//! Raw HTML is out of scope here, so an angle bracket that opens neither
//! autolink form is literal text.

use super::InlineParser;
use crate::tree::{LinkData, NodeKind};

impl<'a> InlineParser<'a> {
    pub(crate) fn handle_angle(&mut self) {
        let start = self.cursor.offset();

        let mut end = start + 1;
        loop {
            match self.cursor.peek_ahead(end - start) {
                Some(b'>') => break,
                Some(b' ') | Some(b'\n') | Some(b'<') | None => {
                    self.cursor.bump();
                    self.append_text("<");
                    return;
                }
                Some(_) => end += 1,
            }
        }

        let content = self.source(start + 1, end).to_string();
        let url = if is_uri_autolink(content.as_bytes()) {
            content.clone()
        } else if is_email_autolink(content.as_bytes()) {
            format!("mailto:{content}")
        } else {
            self.cursor.bump();
            self.append_text("<");
            return;
        };

        self.cursor.advance(end + 1 - start);
        let link = self.append(NodeKind::Link(LinkData {
            url,
            title: String::new(),
        }));
        let text = self.tree.new_node(NodeKind::Text(content));
        self.tree.append(link, text);
    }
}

/// Per CommonMark: a scheme of 2-32 characters starting with a letter,
/// a colon, and a non-empty remainder.
fn is_uri_autolink(content: &[u8]) -> bool {
    if content.len() < 4 {
        return false;
    }

    if !content[0].is_ascii_alphabetic() {
        return false;
    }
    let mut pos = 1;
    while pos < content.len() && pos < 32 {
        let b = content[pos];
        if b == b':' {
            break;
        }
        if !b.is_ascii_alphanumeric() && b != b'+' && b != b'-' && b != b'.' {
            return false;
        }
        pos += 1;
    }

    if pos < 2 || pos >= content.len() || content[pos] != b':' {
        return false;
    }

    pos + 1 < content.len()
}

/// Loose email shape: local part, `@`, dotted domain.
fn is_email_autolink(content: &[u8]) -> bool {
    let Some(at_pos) = content.iter().position(|&b| b == b'@') else {
        return false;
    };
    if at_pos == 0 || at_pos == content.len() - 1 {
        return false;
    }
    let local = &content[..at_pos];
    let domain = &content[at_pos + 1..];

    let local_valid = local.iter().all(|&b| {
        b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b'+')
    });
    let domain_valid = domain
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
        && domain.contains(&b'.');

    local_valid && domain_valid
}
