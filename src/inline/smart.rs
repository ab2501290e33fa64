//! Smart punctuation: curly quotes, en/em dashes, ellipses.
//!
//! Quotes go through the delimiter stack (pairing rewrites the
//! placeholder text in place); dashes and ellipses are straight text
//! replacements at scan time.

use super::extension::{Environment, Extension, InlineHandler};
use super::InlineParser;

/// The smart punctuation extension.
#[derive(Debug, Default)]
pub struct SmartPunctuation;

impl Extension for SmartPunctuation {
    fn extend(&self, env: &mut Environment) {
        env.add_handler(b'\'', Box::new(QuoteHandler(b'\'')));
        env.add_handler(b'"', Box::new(QuoteHandler(b'"')));
        env.add_handler(b'-', Box::new(DashHandler));
        env.add_handler(b'.', Box::new(EllipsisHandler));
    }
}

struct QuoteHandler(u8);

impl InlineHandler for QuoteHandler {
    fn parse(&self, parser: &mut InlineParser<'_>) -> bool {
        parser.scan_delimiter_run(self.0);
        true
    }
}

struct DashHandler;

impl InlineHandler for DashHandler {
    fn parse(&self, parser: &mut InlineParser<'_>) -> bool {
        let run = parser.cursor_mut().take_while(b'-');
        if run == 1 {
            parser.append_text("-");
            return true;
        }

        // Runs of hyphens become em and en dashes: multiples of three are
        // all em, multiples of two all en, and mixed runs favor em dashes
        // with one or two en dashes at the end.
        let (ens, ems) = if run % 3 == 0 {
            (0, run / 3)
        } else if run % 2 == 0 {
            (run / 2, 0)
        } else if run % 3 == 2 {
            (1, (run - 2) / 3)
        } else {
            (2, (run - 4) / 3)
        };
        let mut text = String::with_capacity(3 * (ems + ens));
        for _ in 0..ems {
            text.push('\u{2014}');
        }
        for _ in 0..ens {
            text.push('\u{2013}');
        }
        parser.append_text(text);
        true
    }
}

struct EllipsisHandler;

impl InlineHandler for EllipsisHandler {
    fn parse(&self, parser: &mut InlineParser<'_>) -> bool {
        // At most three periods per replacement; a fourth starts over.
        let mut run = 0;
        while run < 3 && parser.cursor().peek_ahead(run) == Some(b'.') {
            run += 1;
        }
        parser.cursor_mut().advance(run);
        let text = match run {
            3 => "\u{2026}",
            2 => "..",
            _ => ".",
        };
        parser.append_text(text);
        true
    }
}
