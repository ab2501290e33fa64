//! Delimiter pairing: emphasis, strong, and extension-registered runs.
//!
//! The sweep walks the stack bottom-up looking for closers, and for each
//! closer walks back down looking for the nearest compatible opener. A
//! matched pair consumes characters from both runs and wraps the nodes
//! between them; a closer that finds no opener is either kept (it may yet
//! open something) or dropped as plain text. The stack above `stack_bottom`
//! shrinks monotonically, which is what guarantees termination.

use rustc_hash::FxHashMap;

use super::delimiter::{DelimId, DelimiterStack};
use crate::tree::{NodeKind, Tree};

/// Pairing behavior for one delimiter character.
///
/// Extensions register one of these to plug a new run-delimited construct
/// into the same sweep that handles `*` and `_`.
#[derive(Clone, Copy)]
pub struct DelimiterRule {
    /// The delimiter character.
    pub ch: u8,
    /// Shortest run that may participate in a pairing.
    pub min_run: usize,
    /// Longest run that may participate in a pairing.
    pub max_run: usize,
    /// Opener and closer runs must have equal length and are consumed
    /// whole (GFM strikethrough).
    pub match_equal_runs: bool,
    /// Subject to CommonMark's multiple-of-three restriction (emphasis).
    pub mod_three: bool,
    /// Wrapper node for a pairing that consumed `n` characters.
    pub build: fn(n: usize) -> NodeKind,
}

impl std::fmt::Debug for DelimiterRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimiterRule")
            .field("ch", &(self.ch as char))
            .field("min_run", &self.min_run)
            .field("max_run", &self.max_run)
            .field("match_equal_runs", &self.match_equal_runs)
            .field("mod_three", &self.mod_three)
            .finish()
    }
}

/// The built-in emphasis rules for `*` and `_`.
pub(crate) fn emphasis_rule(ch: u8) -> DelimiterRule {
    DelimiterRule {
        ch,
        min_run: 1,
        max_run: usize::MAX,
        match_equal_runs: false,
        mod_three: true,
        build: |n| if n == 2 { NodeKind::Strong } else { NodeKind::Emph },
    }
}

/// Run the pairing sweep over all delimiters at or above `stack_bottom`,
/// then drop them from the stack: whatever did not pair is plain text.
pub(crate) fn process_delimiters(
    tree: &mut Tree,
    stack: &mut DelimiterStack,
    rules: &FxHashMap<u8, DelimiterRule>,
    stack_bottom: usize,
) {
    // Memo of positions below which no opener exists for a given
    // (char, closer-class) pair; prevents quadratic rescans of the
    // bottom of the stack on pathological inputs.
    let mut openers_bottom: FxHashMap<(u8, u8), usize> = FxHashMap::default();

    let mut closer = stack.first_above(stack_bottom);

    while let Some(c) = closer {
        let cd = stack.get(c);
        let ch = cd.ch;
        if !cd.can_close {
            closer = stack.next(c);
            continue;
        }

        let smart_quote = ch == b'\'' || ch == b'"';
        let rule = rules.get(&ch).copied();
        if rule.is_none() && !smart_quote {
            closer = stack.next(c);
            continue;
        }

        let bucket = match rule {
            Some(r) if r.mod_three => 1 + 3 * (cd.can_open as u8) + (cd.run_length % 3) as u8,
            _ => 0,
        };
        let bottom = *openers_bottom.get(&(ch, bucket)).unwrap_or(&stack_bottom);

        // Walk down the stack for the nearest compatible opener.
        let mut opener = stack.prev(c);
        let mut opener_found = None;
        let mut mod_three_rule_invoked = false;
        while let Some(o) = opener {
            if stack.get(o).position < bottom {
                break;
            }
            if stack.get(o).can_open && stack.get(o).ch == ch {
                match check_pairing(rule.as_ref(), stack, o, c) {
                    Pairing::Legal => {
                        opener_found = Some(o);
                        break;
                    }
                    Pairing::OddMatch => mod_three_rule_invoked = true,
                    Pairing::Incompatible => {}
                }
            }
            opener = stack.prev(o);
        }

        let old_closer = c;
        let closer_can_open = stack.get(c).can_open;

        if smart_quote {
            // Quotes never wrap; pairing rewrites the placeholder text
            // nodes to curly quotes in place.
            let (open_q, close_q) = if ch == b'\'' { ("\u{2018}", "\u{2019}") } else { ("\u{201C}", "\u{201D}") };
            let closer_node = stack.get(c).node;
            if let Some(s) = tree.text_mut(closer_node) {
                *s = close_q.to_string();
            }
            closer = stack.next(c);
            if let Some(o) = opener_found {
                let opener_node = stack.get(o).node;
                if let Some(s) = tree.text_mut(opener_node) {
                    *s = open_q.to_string();
                }
                stack.remove(o);
                stack.remove(old_closer);
            }
        } else if let (Some(o), Some(r)) = (opener_found, rule.as_ref()) {
            // The happy path: wrap, truncate the runs in place, and keep
            // matching the same closer while it has characters left.
            closer = insert_wrapper(tree, stack, r, o, c);
        } else {
            closer = stack.next(c);
        }

        if opener_found.is_none() {
            // Future searches for this closer class can stop here.
            if !mod_three_rule_invoked {
                openers_bottom.insert((ch, bucket), stack.get(old_closer).position);
            }
            // A closer that can't open either is just text; drop it.
            if !closer_can_open {
                stack.remove(old_closer);
            }
        }
    }

    // Everything left above the bottom is unpaired text.
    stack.remove_all_above(stack_bottom);
}

enum Pairing {
    Legal,
    /// Rejected specifically by the multiple-of-three rule. These
    /// rejections must not poison the `openers_bottom` memo: a different
    /// closer of the same class may still pair with this opener.
    OddMatch,
    Incompatible,
}

/// Can `opener` legally pair with `closer` under `rule`?
fn check_pairing(
    rule: Option<&DelimiterRule>,
    stack: &DelimiterStack,
    opener: DelimId,
    closer: DelimId,
) -> Pairing {
    let Some(rule) = rule else {
        // Smart quotes: any opener of the same character.
        return Pairing::Legal;
    };
    let o = stack.get(opener);
    let c = stack.get(closer);
    if o.length < rule.min_run || c.length < rule.min_run {
        return Pairing::Incompatible;
    }
    if rule.match_equal_runs && (o.length != c.length || o.length > rule.max_run) {
        return Pairing::Incompatible;
    }
    if rule.mod_three {
        // Rule of three, on *original* run lengths: when the closer could
        // also open (or the opener also close), a pairing whose combined
        // run length is a multiple of three is forbidden unless both runs
        // are themselves multiples of three. Getting this wrong silently
        // changes how `**foo*bar**baz*` nests.
        let odd_match = (c.can_open || o.can_close)
            && (o.run_length + c.run_length) % 3 == 0
            && !(o.run_length % 3 == 0 && c.run_length % 3 == 0);
        if odd_match {
            return Pairing::OddMatch;
        }
    }
    Pairing::Legal
}

/// Create the wrapper node for a matched pair, move the nodes between the
/// two placeholders into it, and shrink or remove the matched runs.
///
/// Returns the closer to continue the sweep from: the same closer when it
/// still has characters left (a `***` run pairs twice), otherwise the next
/// delimiter up the stack.
fn insert_wrapper(
    tree: &mut Tree,
    stack: &mut DelimiterStack,
    rule: &DelimiterRule,
    opener: DelimId,
    closer: DelimId,
) -> Option<DelimId> {
    let opener_node = stack.get(opener).node;
    let closer_node = stack.get(closer).node;
    let opener_length = stack.get(opener).length;
    let closer_length = stack.get(closer).length;

    let use_delims = if rule.match_equal_runs {
        opener_length
    } else if opener_length >= 2 && closer_length >= 2 {
        2
    } else {
        1
    };

    let opener_left = opener_length - use_delims;
    let closer_left = closer_length - use_delims;
    stack.get_mut(opener).length = opener_left;
    stack.get_mut(closer).length = closer_left;

    if let Some(s) = tree.text_mut(opener_node) {
        s.truncate(opener_left);
    }
    if let Some(s) = tree.text_mut(closer_node) {
        s.truncate(closer_left);
    }

    // Delimiters between the pair were already scanned without matching;
    // they are dead.
    let mut between = stack.prev(closer);
    while let Some(d) = between {
        if d == opener {
            break;
        }
        let prev = stack.prev(d);
        stack.remove(d);
        between = prev;
    }

    let wrapper = tree.new_node((rule.build)(use_delims));

    let mut child = tree.next_sibling(opener_node);
    while let Some(n) = child {
        if n == closer_node {
            break;
        }
        let next = tree.next_sibling(n);
        tree.detach(n);
        tree.append(wrapper, n);
        child = next;
    }
    tree.insert_after(opener_node, wrapper);

    if opener_left == 0 {
        tree.detach(opener_node);
        stack.remove(opener);
    }

    if closer_left == 0 {
        let next = stack.next(closer);
        tree.detach(closer_node);
        stack.remove(closer);
        next
    } else {
        Some(closer)
    }
}
