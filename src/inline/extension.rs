//! Extension registration.
//!
//! An [`Environment`] is built once per document (or per application) and
//! is immutable during parsing: trigger characters map to handlers that
//! get first right-of-refusal before the built-in constructs, and
//! delimiter characters map to pairing rules consulted by the emphasis
//! sweep. Extensions that register a [`DelimiterRule`] must also register
//! a handler for the same character (typically one that just calls
//! [`InlineParser::scan_delimiter_run`]) so the runs reach the stack.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::emphasis::{emphasis_rule, DelimiterRule};
use super::InlineParser;
use crate::reference::ReferenceMap;
use crate::tree::Tree;

/// A character handler invoked when its trigger is at the cursor.
///
/// `parse` returns `true` when it consumed input; returning `false`
/// declines the character and MUST leave the cursor untouched — the next
/// handler (or the built-in handling) takes over.
pub trait InlineHandler: Send + Sync {
    fn parse(&self, parser: &mut InlineParser<'_>) -> bool;
}

/// Something that plugs handlers and delimiter rules into an
/// [`Environment`].
pub trait Extension {
    fn extend(&self, env: &mut Environment);
}

type HandlerList = SmallVec<[Box<dyn InlineHandler>; 1]>;

/// Immutable registry of inline constructs.
pub struct Environment {
    triggers: [bool; 256],
    handlers: FxHashMap<u8, HandlerList>,
    rules: FxHashMap<u8, DelimiterRule>,
}

impl Environment {
    /// An environment with only the CommonMark core registered.
    pub fn commonmark() -> Self {
        let mut triggers = [false; 256];
        for b in [b'\n', b'\\', b'`', b'&', b'<', b'*', b'_', b'[', b']', b'!'] {
            triggers[b as usize] = true;
        }
        let mut rules = FxHashMap::default();
        rules.insert(b'*', emphasis_rule(b'*'));
        rules.insert(b'_', emphasis_rule(b'_'));
        Self {
            triggers,
            handlers: FxHashMap::default(),
            rules,
        }
    }

    /// Register an extension.
    pub fn register(&mut self, extension: &dyn Extension) {
        extension.extend(self);
    }

    /// Register a handler with first right-of-refusal on `trigger`.
    /// Handlers for the same trigger run in registration order.
    pub fn add_handler(&mut self, trigger: u8, handler: Box<dyn InlineHandler>) {
        self.triggers[trigger as usize] = true;
        self.handlers.entry(trigger).or_default().push(handler);
    }

    /// Register a pairing rule for the emphasis sweep.
    pub fn add_rule(&mut self, rule: DelimiterRule) {
        self.triggers[rule.ch as usize] = true;
        self.rules.insert(rule.ch, rule);
    }

    #[inline]
    pub(crate) fn is_trigger(&self, b: u8) -> bool {
        self.triggers[b as usize]
    }

    #[inline]
    pub(crate) fn handlers_for(&self, b: u8) -> &[Box<dyn InlineHandler>] {
        self.handlers.get(&b).map_or(&[], |h| h.as_slice())
    }

    #[inline]
    pub(crate) fn rules(&self) -> &FxHashMap<u8, DelimiterRule> {
        &self.rules
    }

    /// Parse one block's text span into an inline node tree.
    pub fn parse(&self, text: &str, refs: &ReferenceMap) -> Tree {
        super::parse_inline(self, text, refs)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let triggers: String = (0u8..=255)
            .filter(|&b| self.triggers[b as usize])
            .map(|b| b as char)
            .collect();
        f.debug_struct("Environment")
            .field("triggers", &triggers)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::commonmark()
    }
}
