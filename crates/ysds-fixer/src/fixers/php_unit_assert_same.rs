//! Prefer `assertSame()` over `assertEquals()` for constant expectations
//!
//! `assertEquals(1, $num)` also passes for `"1"` and `true`.

use ysds_core::{Pattern, Token, TokenKind, Tokens};

use super::{ConfigError, Fixer, FixerConfig};
use crate::util::read_expression_until;

const ASSERT_EQUALS: Pattern<'static> = Pattern::Exact(TokenKind::String, "assertEquals");

/// Replaces `assertEquals` with `assertSame` when the expected value is
/// built from literals only
pub struct PhpUnitAssertSameFixer;

impl Fixer for PhpUnitAssertSameFixer {
    fn name(&self) -> &'static str {
        "php_unit_assert_same"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/php_unit_assert_same"
    }

    fn description(&self) -> &'static str {
        "Prefer assertSame() for constant assertions"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_candidate(&self, tokens: &Tokens) -> bool {
        tokens.position(&ASSERT_EQUALS).is_some()
    }

    fn fix(&self, tokens: &mut Tokens, _config: &FixerConfig) -> Result<(), ConfigError> {
        for i in 0..tokens.len() {
            if tokens[i].matches(&ASSERT_EQUALS) && expects_constant(tokens, i) {
                tokens.set(i, Token::new(TokenKind::String, "assertSame"));
            }
        }
        Ok(())
    }
}

/// Whether the call named at `index` has a constant first argument
fn expects_constant(tokens: &Tokens, index: usize) -> bool {
    let declares_method = tokens
        .prev_meaningful(index)
        .is_some_and(|i| tokens[i].is_kind(TokenKind::Function));
    if declares_method {
        return false;
    }

    let Some(open) = tokens.next_meaningful(index).filter(|&i| tokens[i].equals("(")) else {
        return false;
    };

    let (argument, _) = read_expression_until(tokens, open + 1, &[Pattern::Punct(","), Pattern::Punct(")")]);
    argument.iter().any(Token::is_meaningful) && argument.iter().all(is_constant_part)
}

fn is_constant_part(token: &Token) -> bool {
    match token.kind() {
        TokenKind::ConstantEncapsedString
        | TokenKind::LNumber
        | TokenKind::DNumber
        | TokenKind::ArraySquareBraceOpen
        | TokenKind::ArraySquareBraceClose
        | TokenKind::Whitespace
        | TokenKind::Comment
        | TokenKind::DocComment => true,
        TokenKind::String => ["true", "false", "null"]
            .iter()
            .any(|c| token.content().eq_ignore_ascii_case(c)),
        TokenKind::Operator => token.content() == "**",
        TokenKind::Punct => matches!(token.content(), "+" | "-" | "*" | "/" | "%" | "." | "(" | ")" | ","),
        _ => false,
    }
}
