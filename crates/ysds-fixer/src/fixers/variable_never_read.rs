//! Detect local variables that are assigned but never read

use std::collections::{BTreeMap, HashMap};

use ysds_core::{BlockType, Direction, Pattern, Token, TokenKind, Tokens};

use super::{ConfigError, Fixer, FixerConfig};
use crate::util::{find_line_start, line_break_of};

const COMMENT: &str = "/* FIXME: Variable assigned but never read. */";
const FLAG: Pattern<'static> = Pattern::Exact(TokenKind::Comment, COMMENT);

const PROPERTY_MODIFIERS: [TokenKind; 6] = [
    TokenKind::Public,
    TokenKind::Protected,
    TokenKind::Private,
    TokenKind::Var,
    TokenKind::Readonly,
    TokenKind::Static,
];

/// Puts a FIXME comment above the first assignment of variables that are
/// never read in the same function
pub struct VariableNeverReadFixer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Assignment,
    Read,
    /// Appends, destructuring targets, static properties and declarations
    Ignored,
}

#[derive(Debug, Default)]
struct Usage {
    assignments: Vec<usize>,
    reads: usize,
}

impl Fixer for VariableNeverReadFixer {
    fn name(&self) -> &'static str {
        "variable_never_read"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/variable_never_read"
    }

    fn description(&self) -> &'static str {
        "Detects variables that are assigned but never read"
    }

    fn priority(&self) -> i32 {
        -20
    }

    fn is_candidate(&self, tokens: &Tokens) -> bool {
        tokens.is_token_kind_found(TokenKind::Function)
    }

    fn fix(&self, tokens: &mut Tokens, _config: &FixerConfig) -> Result<(), ConfigError> {
        // Insert position and trailing whitespace of each comment. One per line.
        let mut lines = BTreeMap::new();

        for i in 0..tokens.len() {
            if !tokens[i].is_kind(TokenKind::Function) {
                continue;
            }
            for usage in variable_usages(tokens, i).into_values() {
                let Some(&first_assignment) = usage.assignments.first() else {
                    continue;
                };
                if usage.reads == 0 {
                    if let Some(line) = line_to_flag(tokens, first_assignment) {
                        lines.insert(line + 1, comment_suffix(tokens[line].content(), tokens[line].is_whitespace()));
                    }
                }
            }
        }

        // Back to front so pending indices stay valid.
        for (at, suffix) in lines.into_iter().rev() {
            tokens.insert_at(at, vec![Token::comment(COMMENT), Token::whitespace(suffix)]);
        }
        Ok(())
    }
}

/// Token starting the line of the assignment at `index`, unless that line
/// is already flagged
fn line_to_flag(tokens: &Tokens, index: usize) -> Option<usize> {
    let prev = tokens.sibling_not_matching(
        index,
        Direction::Backward,
        &[
            Pattern::Punct(","),
            Pattern::Kind(TokenKind::Whitespace),
            Pattern::Kind(TokenKind::Variable),
            Pattern::Kind(TokenKind::DestructuringSquareBraceOpen),
        ],
    );
    if prev.is_some_and(|i| tokens[i].matches(&FLAG)) {
        return None;
    }

    let line = find_line_start(tokens, index)?;
    let flagged = [line.checked_sub(1), Some(line + 1)]
        .into_iter()
        .flatten()
        .any(|i| tokens.get(i).is_some_and(|t| t.matches(&FLAG)));
    (!flagged).then_some(line)
}

/// Whitespace put after the comment so the flagged line keeps its start
///
/// Indentation is repeated with a single line break. After an open tag the
/// comment gets its own line when the tag ends one, a space otherwise.
fn comment_suffix(line_start: &str, is_whitespace: bool) -> String {
    if is_whitespace {
        collapse_line_breaks(line_start)
    } else if line_start.ends_with('\n') {
        line_break_of(line_start).to_string()
    } else {
        " ".to_string()
    }
}

/// Whitespace with runs of line breaks reduced to a single one
fn collapse_line_breaks(whitespace: &str) -> String {
    let mut out = String::with_capacity(whitespace.len());
    let mut rest = whitespace;
    let mut after_break = false;
    while let Some(c) = rest.chars().next() {
        let line_break = if rest.starts_with("\r\n") {
            Some("\r\n")
        } else if c == '\n' {
            Some("\n")
        } else {
            None
        };
        match line_break {
            Some(lb) => {
                if !after_break {
                    out.push_str(lb);
                }
                after_break = true;
                rest = &rest[lb.len()..];
            }
            None => {
                out.push(c);
                after_break = false;
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

/// Assignments and reads per variable inside the function declared at
/// `function`
fn variable_usages(tokens: &Tokens, function: usize) -> HashMap<String, Usage> {
    let mut usages: HashMap<String, Usage> = HashMap::new();

    let Some(body_start) = tokens.next_token_matching(function, &[Pattern::Punct("{"), Pattern::Punct(";")]) else {
        return usages;
    };
    // Declarations without body, e.g. in interfaces.
    if tokens[body_start].equals(";") {
        return usages;
    }
    // Closures importing variables share them with the outer scope.
    if (function..body_start).any(|i| tokens[i].is_kind(TokenKind::UseLambda)) {
        return usages;
    }
    let Some(body_end) = tokens.find_block_end(BlockType::CurlyBrace, body_start) else {
        return usages;
    };

    let mut i = body_start + 1;
    while i < body_end {
        let token = &tokens[i];

        // Nested functions are analyzed on their own. Only variables they
        // import through `use (...)` count as reads here.
        if token.is_kind(TokenKind::Function) {
            let Some(nested_start) = tokens.next_token_matching(i, &[Pattern::Punct("{"), Pattern::Punct(";")]) else {
                break;
            };
            for name in imported_variables(tokens, i, nested_start) {
                usages.entry(name).or_default().reads += 1;
            }
            i = if tokens[nested_start].equals("{") {
                match tokens.find_block_end(BlockType::CurlyBrace, nested_start) {
                    Some(nested_end) => nested_end + 1,
                    None => break,
                }
            } else {
                nested_start + 1
            };
            continue;
        }

        if token.is_kind(TokenKind::Variable) {
            let usage = usages.entry(token.content().to_string()).or_default();
            match classify_access(tokens, i) {
                Access::Assignment => usage.assignments.push(i),
                Access::Read => usage.reads += 1,
                Access::Ignored => {}
            }
        }
        i += 1;
    }

    usages
}

/// Variables listed in the `use (...)` clause of a closure signature
fn imported_variables(tokens: &Tokens, start: usize, end: usize) -> Vec<String> {
    let Some(use_index) = (start..end).find(|&i| tokens[i].is_kind(TokenKind::UseLambda)) else {
        return Vec::new();
    };
    let Some(open) = tokens.next_meaningful(use_index).filter(|&i| tokens[i].equals("(")) else {
        return Vec::new();
    };
    let close = tokens.find_block_end(BlockType::Parenthesis, open).unwrap_or(end);
    (open..close)
        .filter(|&i| tokens[i].is_kind(TokenKind::Variable))
        .map(|i| tokens[i].content().to_string())
        .collect()
}

fn classify_access(tokens: &Tokens, index: usize) -> Access {
    let is_append = tokens.get(index + 1).is_some_and(|t| t.equals("["))
        && tokens.get(index + 2).is_some_and(|t| t.equals("]"));
    if is_append {
        return Access::Ignored;
    }

    let prev = tokens.sibling_not_matching(
        index,
        Direction::Backward,
        &[
            Pattern::Punct(","),
            Pattern::Kind(TokenKind::Comment),
            Pattern::Kind(TokenKind::DocComment),
            Pattern::Kind(TokenKind::Whitespace),
            Pattern::Kind(TokenKind::Variable),
        ],
    );
    // Destructuring may bind values that are never used on purpose.
    let skipped = [TokenKind::DestructuringSquareBraceOpen, TokenKind::DoubleColon];
    if prev.is_some_and(|i| tokens[i].is_any_kind(&skipped)) || is_property_declaration(tokens, index) {
        return Access::Ignored;
    }

    let next = tokens.sibling_not_matching(
        index,
        Direction::Forward,
        &[
            Pattern::Punct(","),
            Pattern::Kind(TokenKind::Comment),
            Pattern::Kind(TokenKind::DocComment),
            Pattern::Kind(TokenKind::Whitespace),
        ],
    );
    if next.is_some_and(|i| tokens[i].equals("=")) {
        Access::Assignment
    } else {
        Access::Read
    }
}

/// `public ?Foo $x = ...` and friends in anonymous classes
fn is_property_declaration(tokens: &Tokens, index: usize) -> bool {
    let type_parts = [
        Pattern::Kind(TokenKind::String),
        Pattern::Kind(TokenKind::NsSeparator),
        Pattern::Kind(TokenKind::Whitespace),
        Pattern::Kind(TokenKind::Comment),
        Pattern::Kind(TokenKind::DocComment),
        Pattern::Punct("?"),
        Pattern::Punct("|"),
        Pattern::Punct("&"),
    ];
    tokens
        .sibling_not_matching(index, Direction::Backward, &type_parts)
        .is_some_and(|i| tokens[i].is_any_kind(&PROPERTY_MODIFIERS))
}
