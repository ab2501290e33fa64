//! Code spans.
//!
//! Highest-precedence inline construct: a backtick run opens a span only
//! if a run of exactly the same length follows, and everything between is
//! shielded from every other handler. Unmatched runs are literal text.

use super::InlineParser;
use crate::limits;
use crate::tree::NodeKind;

impl<'a> InlineParser<'a> {
    pub(crate) fn handle_backticks(&mut self) {
        let start = self.cursor.offset();
        let open_len = self.cursor.take_while(b'`');
        let content_start = self.cursor.offset();
        let after_open = self.cursor.save();

        if open_len <= limits::MAX_CODE_SPAN_BACKTICKS {
            loop {
                let Some(pos) = self.cursor.find(b'`') else {
                    break;
                };
                self.cursor.advance(pos - self.cursor.offset());
                let run = self.cursor.take_while(b'`');
                if run == open_len {
                    let content = self.source(content_start, pos).to_string();
                    self.append(NodeKind::Code(normalize_code(&content)));
                    return;
                }
            }
        }

        // No closer: the opening run is literal text.
        self.cursor.restore(after_open);
        let literal = self.source(start, content_start).to_string();
        self.append_text(literal);
    }
}

/// Line endings become spaces; if the result starts and ends with a space
/// and is not all spaces, one space is stripped from each end.
fn normalize_code(content: &str) -> String {
    let spaced: String = content
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let bytes = spaced.as_bytes();
    if bytes.len() > 1
        && bytes[0] == b' '
        && bytes[bytes.len() - 1] == b' '
        && bytes.iter().any(|&b| b != b' ')
    {
        spaced[1..spaced.len() - 1].to_string()
    } else {
        spaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::extension::Environment;
    use crate::inline::parse_inline;
    use crate::reference::ReferenceMap;
    use crate::tree::Tree;

    fn parse(text: &str) -> Tree {
        parse_inline(&Environment::commonmark(), text, &ReferenceMap::new())
    }

    fn first_code(tree: &Tree) -> Option<String> {
        tree.children(tree.root()).find_map(|id| match tree.kind(id) {
            NodeKind::Code(s) => Some(s.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_simple_code_span() {
        let tree = parse("hello `code` world");
        assert_eq!(first_code(&tree).as_deref(), Some("code"));
    }

    #[test]
    fn test_double_backtick_shields_single() {
        let tree = parse("``code with ` backtick``");
        assert_eq!(first_code(&tree).as_deref(), Some("code with ` backtick"));
    }

    #[test]
    fn test_unmatched_backticks_stay_literal() {
        let tree = parse("hello `code`` world");
        assert_eq!(first_code(&tree), None);
        assert_eq!(tree.literal_text(tree.root()), "hello `code`` world");
    }

    #[test]
    fn test_emphasis_inside_code_is_shielded() {
        let tree = parse("`*not emphasis*`");
        assert_eq!(first_code(&tree).as_deref(), Some("*not emphasis*"));
        assert!(!tree
            .children(tree.root())
            .any(|id| matches!(tree.kind(id), NodeKind::Emph)));
    }

    #[test]
    fn test_stripping_one_space() {
        let tree = parse("` `` `");
        assert_eq!(first_code(&tree).as_deref(), Some("``"));
    }

    #[test]
    fn test_all_spaces_not_stripped() {
        let tree = parse("`  `");
        assert_eq!(first_code(&tree).as_deref(), Some("  "));
    }

    #[test]
    fn test_newline_becomes_space() {
        let tree = parse("`foo\nbar`");
        assert_eq!(first_code(&tree).as_deref(), Some("foo bar"));
    }
}
