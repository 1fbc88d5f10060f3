//! # Parser - From Tokens to a Syntax Tree
//!
//! The parser walks the token stream with a cursor and resolves paired
//! constructs (style spans, links, lists, quotes) by scanning *forward over
//! tokens* for a terminator, never over the raw text.
//!
//! ## Scanning for terminators
//!
//! Every paired construct goes through one helper, [`scan`]: starting at an
//! index it feeds tokens to a closure that answers [`Scan::Found`],
//! [`Scan::Continue`] or [`Scan::Abort`]. The caller decides what a miss
//! means:
//!
//! - style spans and links fall back to literal text equal to the opener,
//! - lists, quotes and headings consume to end of input.
//!
//! When a terminator is found, the enclosed tokens are handed to a nested
//! [`Parser`] in inline mode, one level deeper.
//!
//! A failed scan is remembered per opener spelling: no later opener with the
//! same text can close before the point where that scan stopped, so those
//! openers are emitted as text without scanning again. This keeps a
//! paragraph full of unclosed `[` or `*` linear.
//!
//! ## Nesting limit
//!
//! Each nested parser increments the depth. Past `max_depth` parsing fails
//! with [`ParseError::NestingTooDeep`] instead of growing the call stack
//! without bound.
//!
//! ## Module Structure
//!
//! - [`grammar`] - block and inline rules

mod grammar;

use std::collections::HashMap;

use crate::error::ParseError;
use crate::lexer::Token;
use crate::node::Node;

/// Default limit on nested constructs (style spans inside links inside list
/// items, and so on).
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Answer from a [`scan`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// This token is the terminator.
    Found,
    /// Keep looking.
    Continue,
    /// Stop: the construct cannot be closed from here.
    Abort,
}

/// Find the first token at or after `from` that `step` accepts.
///
/// Returns `None` when `step` aborts or the tokens run out.
pub fn scan<'i>(
    tokens: &[Token<'i>],
    from: usize,
    step: impl FnMut(&Token<'i>) -> Scan,
) -> Option<usize> {
    seek(tokens, from, step).ok()
}

/// Like [`scan`], but a miss reports where the scan stopped: the aborting
/// token's index, or the end of `tokens`.
pub fn seek<'i>(
    tokens: &[Token<'i>],
    from: usize,
    mut step: impl FnMut(&Token<'i>) -> Scan,
) -> Result<usize, usize> {
    let Some(rest) = tokens.get(from..) else {
        return Err(tokens.len());
    };
    for (offset, token) in rest.iter().enumerate() {
        match step(token) {
            Scan::Found => return Ok(from + offset),
            Scan::Abort => return Err(from + offset),
            Scan::Continue => {}
        }
    }
    Err(tokens.len())
}

/// Whether the parser is at document level or inside an inline span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Block,
    Inline,
}

/// The parser state: a token slice, a cursor and the nesting depth.
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    depth: usize,
    max_depth: usize,
    mode: Mode,
    /// Opener text -> index before which such an opener cannot close.
    misses: HashMap<&'input str, usize>,
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a document-level parser over `tokens`.
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        Self::with_max_depth(tokens, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(tokens: &'t [Token<'input>], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
            mode: Mode::Block,
            misses: HashMap::new(),
        }
    }

    /// Parse all tokens into block-level nodes.
    pub fn parse(mut self) -> Result<Vec<Node>, ParseError> {
        match self.mode {
            Mode::Block => grammar::document(&mut self),
            Mode::Inline => grammar::inline::sequence(&mut self),
        }
    }

    /// Parse `self.tokens[range]` with a fresh inline parser one level deeper.
    pub(crate) fn nested(&self, start: usize, end: usize) -> Result<Vec<Node>, ParseError> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                depth,
                limit: self.max_depth,
            });
        }
        let tokens = self.tokens.get(start..end).unwrap_or_default();
        Parser {
            tokens,
            pos: 0,
            depth,
            max_depth: self.max_depth,
            mode: Mode::Inline,
            misses: HashMap::new(),
        }
        .parse()
    }

    /// Current token, or `None` at end.
    pub(crate) fn current(&self) -> Option<Token<'input>> {
        self.nth(0)
    }

    /// Look ahead `n` tokens.
    pub(crate) fn nth(&self, n: usize) -> Option<Token<'input>> {
        self.tokens.get(self.pos + n).copied()
    }

    /// The token just before the cursor.
    pub(crate) fn previous(&self) -> Option<Token<'input>> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)).copied()
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn tokens(&self) -> &'t [Token<'input>] {
        self.tokens
    }

    /// Consume the current token unconditionally.
    pub(crate) fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Move the cursor to `pos` (clamped to the end).
    pub(crate) fn jump(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    /// Scan forward from `from` with [`scan`].
    pub(crate) fn scan(
        &self,
        from: usize,
        step: impl FnMut(&Token<'input>) -> Scan,
    ) -> Option<usize> {
        scan(self.tokens, from, step)
    }

    /// Scan forward from `from` with [`seek`].
    pub(crate) fn seek(
        &self,
        from: usize,
        step: impl FnMut(&Token<'input>) -> Scan,
    ) -> Result<usize, usize> {
        seek(self.tokens, from, step)
    }

    /// Record that openers spelled `opener` cannot close before `until`.
    pub(crate) fn remember_miss(&mut self, opener: &'input str, until: usize) {
        let entry = self.misses.entry(opener).or_default();
        *entry = (*entry).max(until);
    }

    /// Whether an opener spelled `opener` at the cursor is already known not
    /// to close.
    pub(crate) fn known_miss(&self, opener: &str) -> bool {
        self.misses.get(opener).is_some_and(|&until| self.pos < until)
    }
}

/// Parse a token sequence into block-level nodes.
pub fn parse(tokens: &[Token<'_>]) -> Result<Vec<Node>, ParseError> {
    Parser::new(tokens).parse()
}
