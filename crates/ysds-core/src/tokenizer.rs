//! Tokenizer front-end producing fixer tokens from PHP source
//!
//! Produces the token kinds the fixers work with. It is not a complete PHP
//! lexer: casts, alternative syntax and version specific tokens are emitted
//! as plain punctuation and keywords.

use crate::token::{Token, TokenKind};

const THREE_CHAR_OPERATORS: &[&str] = &["===", "!==", "<=>", "**=", "...", "<<=", ">>=", "??=", "?->"];

const TWO_CHAR_OPERATORS: &[&str] = &[
    "==", "!=", "<>", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", ".=", "%=", "&=",
    "|=", "^=", "->", "=>", "::", "<<", ">>", "??", "**",
];

/// Tokenize PHP source into a flat token list
///
/// Concatenating the content of the returned tokens yields `code` again.
pub fn tokenize(code: &str) -> Vec<Token> {
    let mut tokens = Lexer::new(code, false).run();
    classify_square_braces(&mut tokens);
    classify_lambda_use(&mut tokens);
    tokens
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    in_php: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, in_php: bool) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            in_php,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            if self.in_php {
                self.lex_php();
            } else {
                self.lex_html();
            }
        }
        self.tokens
    }

    fn push(&mut self, kind: TokenKind, end: usize) {
        self.tokens.push(Token::new(kind, &self.src[self.pos..end]));
        self.pos = end;
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        self.src[self.pos..].starts_with(text)
    }

    fn lex_html(&mut self) {
        let rest = &self.src[self.pos..];
        let open = find_ascii_case_insensitive(rest, "<?php").map(|i| (i, true));
        let echo = rest.find("<?=").map(|i| (i, false));
        let next = match (open, echo) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };

        let Some((offset, is_full)) = next else {
            self.push(TokenKind::InlineHtml, self.bytes.len());
            return;
        };

        if offset > 0 {
            self.push(TokenKind::InlineHtml, self.pos + offset);
        }

        if is_full {
            let mut end = self.pos + 5;
            if self.src[end..].starts_with("\r\n") {
                end += 2;
            } else if matches!(self.bytes.get(end), Some(b' ' | b'\t' | b'\n')) {
                end += 1;
            }
            self.push(TokenKind::OpenTag, end);
        } else {
            self.push(TokenKind::OpenTagWithEcho, self.pos + 3);
        }
        self.in_php = true;
    }

    fn lex_php(&mut self) {
        let c = self.bytes[self.pos];

        if is_whitespace(c) {
            let end = self.scan_while(self.pos, is_whitespace);
            self.push(TokenKind::Whitespace, end);
            return;
        }

        if self.starts_with("?>") {
            let mut end = self.pos + 2;
            if self.src[end..].starts_with("\r\n") {
                end += 2;
            } else if self.bytes.get(end) == Some(&b'\n') {
                end += 1;
            }
            self.push(TokenKind::CloseTag, end);
            self.in_php = false;
            return;
        }

        if self.starts_with("#[") {
            self.push(TokenKind::Punct, self.pos + 2);
            return;
        }

        if c == b'#' || self.starts_with("//") {
            self.lex_line_comment();
            return;
        }

        if self.starts_with("/*") {
            let end = self.src[self.pos + 2..]
                .find("*/")
                .map(|i| self.pos + 2 + i + 2)
                .unwrap_or(self.bytes.len());
            let is_doc = self.starts_with("/**")
                && self.bytes.get(self.pos + 3).is_some_and(|b| is_whitespace(*b));
            let kind = if is_doc { TokenKind::DocComment } else { TokenKind::Comment };
            self.push(kind, end);
            return;
        }

        if c == b'$' && self.peek(1).is_some_and(is_ident_start) {
            let end = self.scan_while(self.pos + 1, is_ident_char);
            self.push(TokenKind::Variable, end);
            return;
        }

        if self.starts_with("<<<") {
            self.lex_heredoc();
            return;
        }

        if is_ident_start(c) {
            self.lex_word();
            return;
        }

        if c == b'\\' {
            self.push(TokenKind::NsSeparator, self.pos + 1);
            return;
        }

        if c.is_ascii_digit() || (c == b'.' && self.peek(1).is_some_and(|b| b.is_ascii_digit())) {
            self.lex_number();
            return;
        }

        match c {
            b'\'' => {
                let end = scan_quoted(self.bytes, self.pos, b'\'');
                self.push(TokenKind::ConstantEncapsedString, end);
                return;
            }
            b'"' => {
                self.lex_double_quoted();
                return;
            }
            b'`' => {
                let end = scan_quoted(self.bytes, self.pos, b'`');
                self.push(TokenKind::EncapsedAndWhitespace, end);
                return;
            }
            _ => {}
        }

        for op in THREE_CHAR_OPERATORS.iter().chain(TWO_CHAR_OPERATORS) {
            if self.starts_with(op) {
                let kind = match *op {
                    "=>" => TokenKind::DoubleArrow,
                    "::" => TokenKind::DoubleColon,
                    "->" => TokenKind::ObjectOperator,
                    "?->" => TokenKind::NullsafeObjectOperator,
                    _ => TokenKind::Operator,
                };
                self.push(kind, self.pos + op.len());
                return;
            }
        }

        let width = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
        self.push(TokenKind::Punct, self.pos + width);
    }

    fn lex_line_comment(&mut self) {
        let mut end = self.pos;
        while end < self.bytes.len() {
            let b = self.bytes[end];
            if b == b'\n' || b == b'\r' || self.bytes[end..].starts_with(b"?>") {
                break;
            }
            end += 1;
        }
        self.push(TokenKind::Comment, end);
    }

    fn lex_word(&mut self) {
        let end = self.scan_while(self.pos, is_ident_char);
        let word = &self.src[self.pos..end];

        let after_member_access = self.last_meaningful().is_some_and(|t| {
            t.is_any_kind(&[
                TokenKind::ObjectOperator,
                TokenKind::NullsafeObjectOperator,
                TokenKind::DoubleColon,
                TokenKind::Function,
            ])
        });
        let after_double_colon = self.last_meaningful().is_some_and(|t| t.is_kind(TokenKind::DoubleColon));

        let kind = if after_double_colon && word.eq_ignore_ascii_case("class") {
            TokenKind::ClassConstant
        } else if after_member_access || self.bytes.get(end) == Some(&b'\\') {
            TokenKind::String
        } else {
            keyword_kind(word)
        };
        self.push(kind, end);
    }

    fn lex_number(&mut self) {
        let bytes = self.bytes;
        let start = self.pos;
        let prefixed = bytes[start] == b'0'
            && matches!(bytes.get(start + 1), Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O'));

        if prefixed {
            let end = self.scan_while(start + 2, |b| b.is_ascii_hexdigit() || b == b'_');
            self.push(TokenKind::LNumber, end);
            return;
        }

        let mut end = self.scan_while(start, |b| b.is_ascii_digit() || b == b'_');
        let mut is_float = false;

        if bytes.get(end) == Some(&b'.') && bytes.get(end + 1) != Some(&b'.') && bytes.get(end + 1) != Some(&b'=') {
            is_float = true;
            end = self.scan_while(end + 1, |b| b.is_ascii_digit() || b == b'_');
        }

        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            if bytes.get(exp).is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                end = self.scan_while(exp, |b| b.is_ascii_digit());
            }
        }

        let kind = if is_float { TokenKind::DNumber } else { TokenKind::LNumber };
        self.push(kind, end);
    }

    fn lex_heredoc(&mut self) {
        let mut label_start = self.scan_while(self.pos + 3, |b| b == b' ' || b == b'\t');
        let is_nowdoc = self.bytes.get(label_start) == Some(&b'\'');
        if matches!(self.bytes.get(label_start), Some(b'\'' | b'"')) {
            label_start += 1;
        }
        let label_end = self.scan_while(label_start, is_ident_char);
        let label = &self.src[label_start..label_end];

        let Some(body_start) = self.src[label_end..].find('\n').map(|i| label_end + i + 1) else {
            self.push(TokenKind::Heredoc, self.bytes.len());
            return;
        };
        let Some((closing_line, end)) = self.find_heredoc_end(label, body_start) else {
            self.push(TokenKind::Heredoc, self.bytes.len());
            return;
        };

        if is_nowdoc || !has_interpolation(&self.bytes[body_start..closing_line]) {
            self.push(TokenKind::Heredoc, end);
            return;
        }

        self.push(TokenKind::StartHeredoc, body_start);
        self.lex_interpolated_body(closing_line);
        self.push(TokenKind::EndHeredoc, end);
    }

    /// Start of the line holding the closing `label` and the offset after it
    fn find_heredoc_end(&self, label: &str, body_start: usize) -> Option<(usize, usize)> {
        if label.is_empty() {
            return None;
        }
        let mut line_start = body_start;
        while line_start < self.bytes.len() {
            let text_start = self.scan_while(line_start, |b| b == b' ' || b == b'\t');
            if self.src[text_start..].starts_with(label) {
                let after = text_start + label.len();
                if !self.bytes.get(after).is_some_and(|b| is_ident_char(*b)) {
                    return Some((line_start, after));
                }
            }
            line_start = line_start + self.src[line_start..].find('\n')? + 1;
        }
        None
    }

    fn lex_double_quoted(&mut self) {
        let end = scan_quoted(self.bytes, self.pos, b'"');
        let closed = end - self.pos >= 2 && self.bytes[end - 1] == b'"';
        let body_end = if closed { end - 1 } else { end };

        if !has_interpolation(&self.bytes[self.pos + 1..body_end]) {
            self.push(TokenKind::ConstantEncapsedString, end);
            return;
        }

        self.push(TokenKind::DoubleQuote, self.pos + 1);
        self.lex_interpolated_body(body_end);
        if closed {
            self.push(TokenKind::DoubleQuote, end);
        }
    }

    /// Lex the inside of an interpolated string up to `body_end`
    fn lex_interpolated_body(&mut self, body_end: usize) {
        let bytes = self.bytes;
        let mut literal_start = self.pos;
        let mut i = self.pos;

        while i < body_end {
            let b = bytes[i];

            if b == b'\\' {
                i += 2;
                continue;
            }

            let is_var = b == b'$' && bytes.get(i + 1).is_some_and(|n| is_ident_start(*n));
            let is_curly = b == b'{' && bytes.get(i + 1) == Some(&b'$');
            let is_dollar_curly = b == b'$' && bytes.get(i + 1) == Some(&b'{');

            if !(is_var || is_curly || is_dollar_curly) {
                i += 1;
                continue;
            }

            if i > literal_start {
                self.pos = literal_start;
                self.push(TokenKind::EncapsedAndWhitespace, i);
            }
            self.pos = i;

            if is_var {
                let end = self.scan_while(i + 1, is_ident_char);
                self.push(TokenKind::Variable, end);
                self.lex_simple_interpolation_tail(body_end);
            } else if is_curly {
                let close = find_matching_brace(bytes, i, body_end);
                self.push(TokenKind::CurlyOpen, i + 1);
                self.lex_nested(close);
                if close < body_end {
                    self.push(TokenKind::CurlyClose, close + 1);
                }
            } else {
                let close = find_matching_brace(bytes, i + 1, body_end);
                self.push(TokenKind::DollarOpenCurlyBraces, i + 2);
                let inner = &self.src[self.pos..close];
                if !inner.is_empty() && inner.bytes().all(is_ident_char) && is_ident_start(inner.as_bytes()[0]) {
                    self.push(TokenKind::StringVarname, close);
                } else {
                    self.lex_nested(close);
                }
                if close < body_end {
                    self.push(TokenKind::DollarCloseCurlyBraces, close + 1);
                }
            }

            i = self.pos;
            literal_start = i;
        }

        if body_end > literal_start {
            self.pos = literal_start;
            self.push(TokenKind::EncapsedAndWhitespace, body_end);
        }
        self.pos = body_end;
    }

    /// `$a[0]` and `$a->b` directly after a variable in a string
    fn lex_simple_interpolation_tail(&mut self, body_end: usize) {
        let bytes = self.bytes;

        if self.pos < body_end && bytes[self.pos] == b'[' {
            if let Some(rel) = bytes[self.pos..body_end].iter().position(|b| *b == b']') {
                let close = self.pos + rel;
                self.push(TokenKind::Punct, self.pos + 1);
                if close > self.pos {
                    let kind = match bytes[self.pos] {
                        b'$' => TokenKind::Variable,
                        b'0'..=b'9' | b'-' => TokenKind::LNumber,
                        _ => TokenKind::String,
                    };
                    self.push(kind, close);
                }
                self.push(TokenKind::Punct, close + 1);
            }
        } else if self.src[self.pos..body_end].starts_with("->")
            && bytes.get(self.pos + 2).is_some_and(|b| is_ident_start(*b))
        {
            self.push(TokenKind::ObjectOperator, self.pos + 2);
            let end = self.scan_while(self.pos, is_ident_char).min(body_end);
            self.push(TokenKind::String, end);
        }
    }

    fn lex_nested(&mut self, end: usize) {
        let nested = Lexer::new(&self.src[self.pos..end], true).run();
        self.tokens.extend(nested);
        self.pos = end;
    }

    fn last_meaningful(&self) -> Option<&Token> {
        self.tokens.iter().rev().find(|t| t.is_meaningful())
    }

    fn scan_while(&self, from: usize, pred: impl Fn(u8) -> bool) -> usize {
        let mut end = from;
        while end < self.bytes.len() && pred(self.bytes[end]) {
            end += 1;
        }
        end
    }
}

fn keyword_kind(word: &str) -> TokenKind {
    match word.to_ascii_lowercase().as_str() {
        "function" => TokenKind::Function,
        "fn" => TokenKind::Fn,
        "use" => TokenKind::Use,
        "new" => TokenKind::New,
        "class" => TokenKind::Class,
        "interface" => TokenKind::Interface,
        "trait" => TokenKind::Trait,
        "static" => TokenKind::Static,
        "public" => TokenKind::Public,
        "protected" => TokenKind::Protected,
        "private" => TokenKind::Private,
        "var" => TokenKind::Var,
        "readonly" => TokenKind::Readonly,
        "abstract" | "and" | "array" | "as" | "break" | "callable" | "case" | "catch" | "clone" | "const"
        | "continue" | "declare" | "default" | "die" | "do" | "echo" | "else" | "elseif" | "empty"
        | "enddeclare" | "endfor" | "endforeach" | "endif" | "endswitch" | "endwhile" | "eval" | "exit"
        | "extends" | "final" | "finally" | "for" | "foreach" | "global" | "goto" | "if" | "implements"
        | "include" | "include_once" | "instanceof" | "insteadof" | "isset" | "list" | "match"
        | "namespace" | "or" | "print" | "require" | "require_once" | "return" | "switch" | "throw"
        | "try" | "unset" | "while" | "xor" | "yield" => TokenKind::Keyword,
        _ => TokenKind::String,
    }
}

/// Tell array literals, destructuring targets and index access apart
fn classify_square_braces(tokens: &mut [Token]) {
    enum Open {
        Array(usize),
        Index,
        Attribute,
    }

    let mut stack: Vec<Open> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for i in 0..tokens.len() {
        if tokens[i].equals("#[") {
            stack.push(Open::Attribute);
        } else if tokens[i].equals("[") {
            let prev = tokens[..i].iter().rev().find(|t| t.is_meaningful());
            let is_index = prev.is_some_and(|t| {
                t.is_any_kind(&[
                    TokenKind::Variable,
                    TokenKind::String,
                    TokenKind::StringVarname,
                    TokenKind::ConstantEncapsedString,
                    TokenKind::ArraySquareBraceClose,
                    TokenKind::CurlyClose,
                    TokenKind::ClassConstant,
                ]) || t.equals(")")
                    || t.equals("]")
                    || t.equals("}")
            });
            stack.push(if is_index { Open::Index } else { Open::Array(i) });
        } else if tokens[i].equals("]") {
            if let Some(Open::Array(open)) = stack.pop() {
                tokens[open] = Token::new(TokenKind::ArraySquareBraceOpen, "[");
                tokens[i] = Token::new(TokenKind::ArraySquareBraceClose, "]");
                pairs.push((open, i));
            }
        }
    }

    pairs.sort_unstable();
    let mut destructuring_until: Option<usize> = None;

    for (open, close) in pairs {
        let nested = destructuring_until.is_some_and(|end| open < end);
        let next = tokens[close + 1..].iter().find(|t| t.is_meaningful());
        let prev = tokens[..open].iter().rev().find(|t| t.is_meaningful());
        let assigned = next.is_some_and(|t| t.equals("="));
        let foreach_target = prev.is_some_and(|t| t.is_kind(TokenKind::Keyword) && t.content().eq_ignore_ascii_case("as"));

        if nested || assigned || foreach_target {
            tokens[open] = Token::new(TokenKind::DestructuringSquareBraceOpen, "[");
            tokens[close] = Token::new(TokenKind::DestructuringSquareBraceClose, "]");
            if !nested {
                destructuring_until = Some(close);
            }
        }
    }
}

/// `use` directly after a closure signature
fn classify_lambda_use(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        if !tokens[i].is_kind(TokenKind::Use) {
            continue;
        }
        let after_signature = tokens[..i]
            .iter()
            .rev()
            .find(|t| t.is_meaningful())
            .is_some_and(|t| t.equals(")"));
        if after_signature {
            let content = tokens[i].content().to_string();
            tokens[i] = Token::new(TokenKind::UseLambda, content);
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// End offset (exclusive) of a quoted literal starting at `start`
fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn has_interpolation(body: &[u8]) -> bool {
    let mut i = 0;
    while i < body.len() {
        match body[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'$' if body.get(i + 1).is_some_and(|b| is_ident_start(*b) || *b == b'{') => return true,
            b'{' if body.get(i + 1) == Some(&b'$') => return true,
            _ => {}
        }
        i += 1;
    }
    false
}

/// Offset of the `}` closing the `{` at `open`, or `limit` when unbalanced
fn find_matching_brace(bytes: &[u8], open: usize, limit: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < limit {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            q @ (b'\'' | b'"') => {
                i = scan_quoted(bytes, i, q).min(limit);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    limit
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
