//! Mutable token sequence of one PHP file

use std::ops::Index;

use crate::token::{Pattern, Token, TokenKind};
use crate::tokenizer::tokenize;

/// Direction for sibling lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Index one step away from `index`, if any
    pub fn step(self, index: usize) -> Option<usize> {
        match self {
            Direction::Forward => index.checked_add(1),
            Direction::Backward => index.checked_sub(1),
        }
    }
}

/// Balanced delimiter pairs understood by block lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Parenthesis,
    CurlyBrace,
    ArraySquareBrace,
    DestructuringSquareBrace,
    IndexSquareBrace,
}

impl BlockType {
    fn edges(self) -> (Pattern<'static>, Pattern<'static>) {
        match self {
            BlockType::Parenthesis => (Pattern::Punct("("), Pattern::Punct(")")),
            BlockType::CurlyBrace => (Pattern::Punct("{"), Pattern::Punct("}")),
            BlockType::ArraySquareBrace => (
                Pattern::Kind(TokenKind::ArraySquareBraceOpen),
                Pattern::Kind(TokenKind::ArraySquareBraceClose),
            ),
            BlockType::DestructuringSquareBrace => (
                Pattern::Kind(TokenKind::DestructuringSquareBraceOpen),
                Pattern::Kind(TokenKind::DestructuringSquareBraceClose),
            ),
            BlockType::IndexSquareBrace => (Pattern::Punct("["), Pattern::Punct("]")),
        }
    }
}

/// Ordered, mutable sequence of tokens
///
/// Mutations only raise the changed flag when they actually alter the
/// sequence, so rewriting a range with identical tokens is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<Token>,
    changed: bool,
}

impl Tokens {
    /// Tokenize PHP source code
    pub fn from_code(code: &str) -> Self {
        Self::from_tokens(tokenize(code))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            changed: false,
        }
    }

    /// Source code represented by the sequence
    pub fn generate_code(&self) -> String {
        self.tokens.iter().map(Token::content).collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    /// Whether any mutation altered the sequence
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_token_kind_found(&self, kind: TokenKind) -> bool {
        self.tokens.iter().any(|t| t.is_kind(kind))
    }

    pub fn is_any_token_kinds_found(&self, kinds: &[TokenKind]) -> bool {
        self.tokens.iter().any(|t| t.is_any_kind(kinds))
    }

    /// First index matching the pattern
    pub fn position(&self, pattern: &Pattern<'_>) -> Option<usize> {
        self.tokens.iter().position(|t| t.matches(pattern))
    }

    pub fn next_meaningful(&self, index: usize) -> Option<usize> {
        self.meaningful_sibling(index, Direction::Forward)
    }

    pub fn prev_meaningful(&self, index: usize) -> Option<usize> {
        self.meaningful_sibling(index, Direction::Backward)
    }

    /// Nearest token in `direction` that is not whitespace or a comment
    pub fn meaningful_sibling(&self, index: usize, direction: Direction) -> Option<usize> {
        self.sibling_where(index, direction, Token::is_meaningful)
    }

    /// Nearest following token that is not whitespace
    pub fn next_non_whitespace(&self, index: usize) -> Option<usize> {
        self.sibling_where(index, Direction::Forward, |t| !t.is_whitespace())
    }

    /// Nearest following token matching any of `patterns`
    pub fn next_token_matching(&self, index: usize, patterns: &[Pattern<'_>]) -> Option<usize> {
        self.sibling_where(index, Direction::Forward, |t| t.matches_any(patterns))
    }

    /// Nearest token in `direction` matching none of `patterns`
    pub fn sibling_not_matching(&self, index: usize, direction: Direction, patterns: &[Pattern<'_>]) -> Option<usize> {
        self.sibling_where(index, direction, |t| !t.matches_any(patterns))
    }

    fn sibling_where(&self, index: usize, direction: Direction, pred: impl Fn(&Token) -> bool) -> Option<usize> {
        let mut i = direction.step(index)?;
        while let Some(token) = self.tokens.get(i) {
            if pred(token) {
                return Some(i);
            }
            i = direction.step(i)?;
        }
        None
    }

    /// Index of the token closing the block opened at `index`
    pub fn find_block_end(&self, block: BlockType, index: usize) -> Option<usize> {
        let (open, close) = block.edges();
        if !self.tokens.get(index)?.matches(&open) {
            return None;
        }
        self.find_block_edge(index, Direction::Forward, &open, &close)
    }

    /// Index of the token opening the block closed at `index`
    pub fn find_block_start(&self, block: BlockType, index: usize) -> Option<usize> {
        let (open, close) = block.edges();
        if !self.tokens.get(index)?.matches(&close) {
            return None;
        }
        self.find_block_edge(index, Direction::Backward, &close, &open)
    }

    fn find_block_edge(&self, index: usize, direction: Direction, same: &Pattern<'_>, other: &Pattern<'_>) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = index;
        loop {
            let token = self.tokens.get(i)?;
            if token.matches(same) {
                depth += 1;
            } else if token.matches(other) {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            i = direction.step(i)?;
        }
    }

    /// Replace the inclusive range `start..=end` with `replacement`
    pub fn override_range(&mut self, start: usize, end: usize, replacement: Vec<Token>) {
        let end = end.min(self.tokens.len().saturating_sub(1));
        if start > end || start >= self.tokens.len() {
            self.insert_at(start, replacement);
            return;
        }
        if self.tokens[start..=end] == replacement[..] {
            return;
        }
        self.tokens.splice(start..=end, replacement);
        self.changed = true;
    }

    /// Insert `items` so that the first one ends up at `index`
    pub fn insert_at(&mut self, index: usize, items: Vec<Token>) {
        if items.is_empty() {
            return;
        }
        let index = index.min(self.tokens.len());
        self.tokens.splice(index..index, items);
        self.changed = true;
    }

    /// Replace a single token
    pub fn set(&mut self, index: usize, token: Token) {
        if let Some(slot) = self.tokens.get_mut(index) {
            if *slot != token {
                *slot = token;
                self.changed = true;
            }
        }
    }
}

impl Index<usize> for Tokens {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}
