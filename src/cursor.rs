//! Byte cursor over one block's text span.
//!
//! Speculative constructs (inline links, titles, labels) are parsed by
//! saving a snapshot, scanning ahead, and restoring on failure.
//! Restoring a snapshot is equivalent to never having advanced past it.

/// A saved cursor position.
///
/// Copyable so attempts can be abandoned deep inside nested helpers
/// without unwinding through return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pos: usize,
}

/// A cursor for byte-by-byte scanning of a single inline span.
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor over a text span.
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// The underlying span.
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Current offset from the start of the span.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Number of bytes remaining.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Check if cursor is at end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek the current byte without advancing.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte n positions ahead.
    #[inline]
    pub fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.input.get(self.pos + n).copied()
    }

    /// Advance by n bytes.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.pos += n;
    }

    /// Advance by 1 byte.
    #[inline]
    pub fn bump(&mut self) {
        debug_assert!(!self.is_eof());
        self.pos += 1;
    }

    /// Consume and return current byte.
    #[inline]
    pub fn next(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Check if current position matches a byte.
    #[inline]
    pub fn at(&self, b: u8) -> bool {
        self.peek() == Some(b)
    }

    /// Consume a specific byte if present.
    #[inline]
    pub fn eat(&mut self, b: u8) -> bool {
        if self.at(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip while predicate is true, returning the number skipped.
    #[inline]
    pub fn skip_while<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(u8) -> bool,
    {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !predicate(b) {
                break;
            }
            self.pos += 1;
        }
        self.pos - start
    }

    /// Skip spaces and tabs.
    #[inline]
    pub fn skip_spaces(&mut self) -> usize {
        self.skip_while(|b| b == b' ' || b == b'\t')
    }

    /// Skip spaces and tabs plus at most one newline.
    pub fn skip_space_or_newline(&mut self) {
        self.skip_spaces();
        if self.eat(b'\n') {
            self.skip_spaces();
        }
    }

    /// Count the run of `b` starting at the cursor and advance past it.
    #[inline]
    pub fn take_while(&mut self, b: u8) -> usize {
        self.skip_while(|c| c == b)
    }

    /// Get a sub-slice of the span by absolute offsets.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    /// Save the current position for later rollback.
    #[inline]
    pub fn save(&self) -> CursorState {
        CursorState { pos: self.pos }
    }

    /// Restore a previously saved position.
    #[inline]
    pub fn restore(&mut self, state: CursorState) {
        debug_assert!(state.pos <= self.input.len());
        self.pos = state.pos;
    }

    /// Find the next occurrence of a byte at or after the cursor,
    /// returning its absolute offset.
    #[inline]
    pub fn find(&self, needle: u8) -> Option<usize> {
        memchr::memchr(needle, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Decode the character ending at `pos`, for flanking checks.
    /// Returns `'\n'` at the start of the span.
    pub fn char_before(&self, pos: usize) -> char {
        if pos == 0 {
            return '\n';
        }
        let mut start = pos - 1;
        while start > 0 && self.input[start] >> 6 == 0b10 {
            start -= 1;
        }
        match std::str::from_utf8(&self.input[start..pos]) {
            Ok(s) => s.chars().next().unwrap_or('\n'),
            Err(_) => '\u{FFFD}',
        }
    }

    /// Decode the character starting at `pos`, for flanking checks.
    /// Returns `'\n'` at the end of the span.
    pub fn char_at(&self, pos: usize) -> char {
        if pos >= self.input.len() {
            return '\n';
        }
        let end = (pos + 4).min(self.input.len());
        let tail = &self.input[pos..end];
        match std::str::from_utf8(tail) {
            Ok(s) => s.chars().next().unwrap_or('\n'),
            Err(e) if e.valid_up_to() > 0 => std::str::from_utf8(&tail[..e.valid_up_to()])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or('\u{FFFD}'),
            Err(_) => '\u{FFFD}',
        }
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.pos)
            .field("remaining", &self.remaining())
            .finish()
    }
}
