//! ysds-core: token model and source editing for PHP fixers
//!
//! This crate provides:
//! - `Token`, `TokenKind`, `Pattern`: lexical units and matching prototypes
//! - `Tokens`: a mutable token sequence with navigation and block lookups
//! - `tokenize()`: the lexer behind `Tokens::from_code`
//! - `Edit` and `apply_edits()`: span-based replacements of source text

mod edit;
mod token;
mod tokenizer;
mod tokens;

pub use edit::{apply_edits, Edit, EditError};
pub use token::{Pattern, Token, TokenKind};
pub use tokenizer::tokenize;
pub use tokens::{BlockType, Direction, Tokens};
