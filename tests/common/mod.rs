//! Shared test support: a minimal HTML-ish rendering of the inline tree
//! so tests can assert on compact strings. The crate itself ships no
//! renderer; this stays test-side on purpose.

use intramark::{NodeId, NodeKind, Tree};

pub fn render(tree: &Tree) -> String {
    let mut out = String::new();
    for child in tree.children(tree.root()) {
        render_node(tree, child, &mut out);
    }
    out
}

fn render_node(tree: &Tree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Root => render_children(tree, id, out),
        NodeKind::Text(s) => out.push_str(&escape(s)),
        NodeKind::Code(s) => {
            out.push_str("<code>");
            out.push_str(&escape(s));
            out.push_str("</code>");
        }
        NodeKind::SoftBreak => out.push('\n'),
        NodeKind::HardBreak => out.push_str("<br />\n"),
        NodeKind::Emph => wrap(tree, id, "em", out),
        NodeKind::Strong => wrap(tree, id, "strong", out),
        NodeKind::Strikethrough => wrap(tree, id, "del", out),
        NodeKind::Link(l) => {
            out.push_str("<a href=\"");
            out.push_str(&escape(&l.url));
            out.push('"');
            if !l.title.is_empty() {
                out.push_str(" title=\"");
                out.push_str(&escape(&l.title));
                out.push('"');
            }
            out.push('>');
            render_children(tree, id, out);
            out.push_str("</a>");
        }
        NodeKind::Image(i) => {
            out.push_str("<img src=\"");
            out.push_str(&escape(&i.url));
            out.push_str("\" alt=\"");
            out.push_str(&escape(&i.alt));
            out.push('"');
            if !i.title.is_empty() {
                out.push_str(" title=\"");
                out.push_str(&escape(&i.title));
                out.push('"');
            }
            out.push_str(" />");
        }
        NodeKind::Mention(m) => match &m.url {
            Some(url) => {
                out.push_str("<a href=\"");
                out.push_str(&escape(url));
                out.push_str("\">");
                render_children(tree, id, out);
                out.push_str("</a>");
            }
            None => render_children(tree, id, out),
        },
        NodeKind::Custom(c) => {
            if let Some(s) = c.literal() {
                out.push_str(&escape(s));
            }
        }
    }
}

fn wrap(tree: &Tree, id: NodeId, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_children(tree, id, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_children(tree: &Tree, id: NodeId, out: &mut String) {
    for child in tree.children(id) {
        render_node(tree, child, out);
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
