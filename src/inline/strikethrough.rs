//! Strikethrough (`~~text~~`), per the GFM extension.
//!
//! Tilde runs of length 1 or 2 pair when opener and closer runs have the
//! same length; longer runs never match and stay literal.

use super::emphasis::DelimiterRule;
use super::extension::{Environment, Extension, InlineHandler};
use super::InlineParser;
use crate::tree::NodeKind;

/// The strikethrough extension.
#[derive(Debug, Default)]
pub struct Strikethrough;

impl Extension for Strikethrough {
    fn extend(&self, env: &mut Environment) {
        env.add_rule(DelimiterRule {
            ch: b'~',
            min_run: 1,
            max_run: 2,
            match_equal_runs: true,
            mod_three: false,
            build: |_| NodeKind::Strikethrough,
        });
        env.add_handler(b'~', Box::new(TildeHandler));
    }
}

struct TildeHandler;

impl InlineHandler for TildeHandler {
    fn parse(&self, parser: &mut InlineParser<'_>) -> bool {
        parser.scan_delimiter_run(b'~');
        true
    }
}
