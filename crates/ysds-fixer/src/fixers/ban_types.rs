//! Flag uses of banned class names

use std::collections::HashSet;

use ysds_core::{Direction, Pattern, Token, TokenKind, Tokens};

use super::{ConfigError, ConfigValue, Fixer, FixerConfig, FixerOption, OptionType};
use crate::util::block_increment;

const DEFAULT_MESSAGE: &str = "FIXME: This type is banned.";

/// Appends a comment to statements that import, instantiate or statically
/// access a banned type
pub struct BanTypesFixer;

struct BanTypesOptions {
    types: HashSet<String>,
    comment: String,
}

impl BanTypesOptions {
    fn from_config(config: &FixerConfig) -> Result<Self, ConfigError> {
        let types = config
            .string_list("types")?
            .iter()
            .map(|t| t.trim_matches('\\').to_string())
            .collect();
        let message = config.string_or("message", DEFAULT_MESSAGE)?;
        Ok(Self {
            types,
            comment: format!("/* {message} */"),
        })
    }
}

impl Fixer for BanTypesFixer {
    fn name(&self) -> &'static str {
        "ban_types"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/ban_types"
    }

    fn description(&self) -> &'static str {
        "Bans some subset of types from being used"
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn is_candidate(&self, tokens: &Tokens) -> bool {
        tokens.is_any_token_kinds_found(&[TokenKind::Use, TokenKind::New, TokenKind::DoubleColon])
    }

    fn fix(&self, tokens: &mut Tokens, config: &FixerConfig) -> Result<(), ConfigError> {
        let options = BanTypesOptions::from_config(config)?;
        if options.types.is_empty() {
            return Ok(());
        }

        let mut i = 0;
        while i < tokens.len() {
            if let Some(delimiter) = banned_statement_end(tokens, i, &options) {
                let comment = Token::comment(options.comment.clone());
                // Text after `?>` is inline HTML, so the comment goes in front of the tag.
                if tokens[delimiter].is_kind(TokenKind::CloseTag) {
                    tokens.insert_at(delimiter, vec![comment, Token::whitespace(" ")]);
                } else {
                    tokens.insert_at(delimiter + 1, vec![Token::whitespace(" "), comment]);
                }
            }
            i += 1;
        }
        Ok(())
    }

    fn options(&self) -> Vec<FixerOption> {
        vec![
            FixerOption {
                name: "types",
                description: "Types to ban",
                option_type: OptionType::StringArray,
                default: Some(ConfigValue::List(vec![])),
            },
            FixerOption {
                name: "message",
                description: "Message to write next to banned types",
                option_type: OptionType::String,
                default: Some(ConfigValue::String(DEFAULT_MESSAGE.to_string())),
            },
        ]
    }
}

/// Delimiter after which the ban comment goes, if `index` starts a use of
/// a banned type that is not flagged yet
fn banned_statement_end(tokens: &Tokens, index: usize, options: &BanTypesOptions) -> Option<usize> {
    let direction = match tokens[index].kind() {
        TokenKind::Use | TokenKind::New => Direction::Forward,
        TokenKind::DoubleColon => Direction::Backward,
        _ => return None,
    };

    let first = tokens.meaningful_sibling(index, direction)?;
    let delimiter = find_statement_end(tokens, index)?;

    let flag = Pattern::Exact(TokenKind::Comment, &options.comment);
    let neighbour = if tokens[delimiter].is_kind(TokenKind::CloseTag) {
        tokens.sibling_not_matching(delimiter, Direction::Backward, &[Pattern::Kind(TokenKind::Whitespace)])
    } else {
        tokens.next_non_whitespace(delimiter)
    };
    let already_flagged = neighbour.is_some_and(|i| tokens[i].matches(&flag));
    if already_flagged {
        return None;
    }

    let name = read_type_name(tokens, first, direction)?;
    options.types.contains(&name).then_some(delimiter)
}

/// Next `;`, `,` or `?>` that is not nested deeper than `index`
fn find_statement_end(tokens: &Tokens, index: usize) -> Option<usize> {
    let delimiters = [Pattern::Punct(";"), Pattern::Punct(","), Pattern::Kind(TokenKind::CloseTag)];
    let mut depth = 0;
    for i in index + 1..tokens.len() {
        let token = &tokens[i];
        if depth <= 0 && token.matches_any(&delimiters) {
            return Some(i);
        }
        depth += block_increment(token);
    }
    None
}

/// Class name made of identifiers and `\` starting at `index`
fn read_type_name(tokens: &Tokens, index: usize, direction: Direction) -> Option<String> {
    let name_parts = [Pattern::Kind(TokenKind::String), Pattern::Kind(TokenKind::NsSeparator)];
    if !tokens[index].matches_any(&name_parts) {
        return None;
    }

    let mut parts = Vec::new();
    let mut i = Some(index);
    while let Some(at) = i.filter(|&at| tokens.get(at).is_some_and(|t| t.matches_any(&name_parts))) {
        parts.push(tokens[at].content());
        i = direction.step(at);
    }
    if direction == Direction::Backward {
        parts.reverse();
    }

    let name = parts.concat();
    let name = name.trim_matches('\\');
    (!name.is_empty()).then(|| name.to_string())
}
