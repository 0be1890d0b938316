//! Token scanning helpers shared by the fixers

use std::cmp::Ordering;

use ysds_core::{Pattern, Token, TokenKind, Tokens};

/// Nesting changes applied while reading an expression
///
/// Only these pairs move the counter, so interpolation braces, index
/// brackets and attribute openers never unbalance it.
static BLOCK_INCREMENTS: [(Pattern<'static>, i32); 6] = [
    (Pattern::Punct("("), 1),
    (Pattern::Punct(")"), -1),
    (Pattern::Punct("{"), 1),
    (Pattern::Punct("}"), -1),
    (Pattern::Kind(TokenKind::ArraySquareBraceOpen), 1),
    (Pattern::Kind(TokenKind::ArraySquareBraceClose), -1),
];

static BRACE_INCREMENTS: [(Pattern<'static>, i32); 2] = [(Pattern::Punct("{"), 1), (Pattern::Punct("}"), -1)];

static PAREN_INCREMENTS: [(Pattern<'static>, i32); 2] = [(Pattern::Punct("("), 1), (Pattern::Punct(")"), -1)];

/// Nesting change caused by `token`
pub fn block_increment(token: &Token) -> i32 {
    increment_in(token, &BLOCK_INCREMENTS)
}

fn increment_in(token: &Token, increments: &[(Pattern<'_>, i32)]) -> i32 {
    increments
        .iter()
        .find(|(pattern, _)| token.matches(pattern))
        .map_or(0, |(_, incr)| *incr)
}

/// Read tokens from `start` until a delimiter at nesting depth zero
///
/// Returns the tokens read, without trailing whitespace and comments, and
/// the index of the delimiter. The index is the sequence length when no
/// delimiter was found.
pub fn read_expression_until(tokens: &Tokens, start: usize, delimiters: &[Pattern<'_>]) -> (Vec<Token>, usize) {
    let mut buffer = Vec::new();
    let mut depth = 0;
    let mut i = start;

    while i < tokens.len() {
        let token = &tokens[i];
        if depth == 0 && token.matches_any(delimiters) {
            break;
        }
        depth += block_increment(token);
        buffer.push(token.clone());
        i += 1;
    }

    while buffer.last().is_some_and(|t| !t.is_meaningful()) {
        buffer.pop();
    }

    (buffer, i)
}

/// Whether the tokens form a literal or a class constant reference
pub fn is_const_like(tokens: &[Token]) -> bool {
    match tokens {
        [single] => single.is_any_kind(&[
            TokenKind::ConstantEncapsedString,
            TokenKind::LNumber,
            TokenKind::DNumber,
            TokenKind::String,
        ]),
        // Namespaced class names are not recognized.
        [class, colon, name] => {
            class.is_any_kind(&[TokenKind::Static, TokenKind::String])
                && colon.is_kind(TokenKind::DoubleColon)
                && name.is_kind(TokenKind::String)
        }
        _ => false,
    }
}

pub fn content_of_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(Token::content).collect()
}

/// Order two serialized expressions
///
/// Two numeric literals compare by value, anything else byte by byte.
pub fn compare_content(a: &str, b: &str) -> Ordering {
    match (numeric_value(a), numeric_value(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

fn numeric_value(content: &str) -> Option<f64> {
    let first = content.bytes().next()?;
    if !first.is_ascii_digit() && first != b'.' {
        return None;
    }
    let digits = content.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let radix = |prefix: &str, radix: u32| {
        lower
            .strip_prefix(prefix)
            .and_then(|rest| u64::from_str_radix(rest, radix).ok())
            .map(|v| v as f64)
    };

    radix("0x", 16)
        .or_else(|| radix("0b", 2))
        .or_else(|| radix("0o", 8))
        .or_else(|| lower.parse::<f64>().ok())
}

/// Index of the `{` opening the block that contains `index`
pub fn find_parent_block(tokens: &Tokens, index: usize) -> Option<usize> {
    find_enclosing(tokens, index, "{", &BRACE_INCREMENTS)
}

/// Index of the `(` opening the parenthesis that contains `index`
pub fn find_parent_paren(tokens: &Tokens, index: usize) -> Option<usize> {
    find_enclosing(tokens, index, "(", &PAREN_INCREMENTS)
}

fn find_enclosing(tokens: &Tokens, index: usize, open: &str, increments: &[(Pattern<'_>, i32)]) -> Option<usize> {
    if index >= tokens.len() {
        return None;
    }
    // We start inside the block, so reaching zero means we left it.
    let mut depth = -1;
    for i in (0..=index).rev() {
        let token = &tokens[i];
        depth += increment_in(token, increments);
        if depth == 0 && token.equals(open) {
            return Some(i);
        }
    }
    None
}

/// Index of the `class` keyword of the class that contains `index`
pub fn find_parent_class(tokens: &Tokens, index: usize) -> Option<usize> {
    let mut index = index;
    loop {
        let block = find_parent_block(tokens, index)?;
        let mut i = block.checked_sub(1)?;

        // Walk back through the block header. Hitting another block edge
        // means this was not a class body, so retry one level further out.
        loop {
            let token = &tokens[i];
            if token.is_kind(TokenKind::Class) {
                return Some(i);
            }
            if increment_in(token, &BRACE_INCREMENTS) != 0 {
                break;
            }
            i = i.checked_sub(1)?;
        }
        index = i;
    }
}

/// Token after which the line containing `index` starts
///
/// This is a whitespace token holding a line break, or the open tag when
/// the line is the one the tag is on or ends.
pub fn find_line_start(tokens: &Tokens, index: usize) -> Option<usize> {
    (0..index.min(tokens.len())).rev().find(|&i| {
        let token = &tokens[i];
        (token.is_whitespace() && token.content().contains('\n'))
            || token.is_any_kind(&[TokenKind::OpenTag, TokenKind::OpenTagWithEcho])
    })
}

/// Line break sequence used by a whitespace token
pub fn line_break_of(whitespace: &str) -> &'static str {
    if whitespace.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
