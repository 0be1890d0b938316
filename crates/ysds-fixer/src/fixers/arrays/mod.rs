//! Array literal fixers
//!
//! [`fix_arrays`] finds short array literals, splits them into entries,
//! asks an [`ArrayEntryPolicy`] for a new order and rebuilds the element
//! range in the layout the array already had.

mod ordered_array;
mod ordered_array_keys;
mod ordered_const_array;

pub use ordered_array::OrderedArrayFixer;
pub use ordered_array_keys::OrderedArrayKeysFixer;
pub use ordered_const_array::OrderedConstArrayFixer;

use log::debug;
use ysds_core::{BlockType, Pattern, Token, TokenKind, Tokens};

use super::{ConfigError, ConfigValue, FixerConfig, FixerOption, OptionType};
use crate::filter::Filter;
use crate::util::{content_of_tokens, line_break_of, read_expression_until};

/// One element of an array literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayEntry {
    pub key: Option<Vec<Token>>,
    pub value: Vec<Token>,
}

impl ArrayEntry {
    pub fn new(key: Option<Vec<Token>>, value: Vec<Token>) -> Self {
        Self { key, value }
    }

    pub fn key_content(&self) -> Option<String> {
        self.key.as_deref().map(content_of_tokens)
    }

    pub fn value_content(&self) -> String {
        content_of_tokens(&self.value)
    }

    fn comment_count(&self) -> usize {
        self.key
            .iter()
            .flatten()
            .chain(&self.value)
            .filter(|t| t.is_comment())
            .count()
    }
}

/// Decides the new order of an array's entries
pub trait ArrayEntryPolicy {
    /// New entries, or `None` to leave the array untouched
    fn transform_array_entries(&self, entries: &[ArrayEntry]) -> Option<Vec<ArrayEntry>>;
}

/// Options shared by the entry based array fixers
#[derive(Debug, Clone, Default)]
pub struct ArrayOptions {
    pub filter: Filter,
    pub min_count: usize,
}

impl ArrayOptions {
    pub fn from_config(config: &FixerConfig) -> Result<Self, ConfigError> {
        let min_count = config.number_or("min_count", 0)?;
        Ok(Self {
            filter: Filter::from_config(config.get("filter"))?,
            min_count: usize::try_from(min_count).unwrap_or(0),
        })
    }

    pub fn definitions() -> Vec<FixerOption> {
        vec![
            FixerOption {
                name: "filter",
                description: "Conditions an array has to satisfy, e.g. [['class', 'matches', '/MyClazz/']]",
                option_type: OptionType::Filter,
                default: Some(ConfigValue::List(vec![])),
            },
            FixerOption {
                name: "min_count",
                description: "Minimum array size to apply fixes for",
                option_type: OptionType::Number,
                default: Some(ConfigValue::Number(0)),
            },
        ]
    }
}

/// How the elements of an array are laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElementLayout {
    multiline: bool,
    separator: String,
}

impl ElementLayout {
    /// Derive the layout from the whitespace in front of the first element
    pub(crate) fn detect(tokens: &Tokens, first_element: usize) -> Self {
        let before = first_element.checked_sub(1).and_then(|i| tokens.get(i));
        match before {
            Some(token) if token.is_whitespace() && token.content().contains('\n') => {
                let content = token.content();
                let indent = content.rsplit('\n').next().unwrap_or_default();
                Self {
                    multiline: true,
                    separator: format!("{}{}", line_break_of(content), indent),
                }
            }
            _ => Self {
                multiline: false,
                separator: " ".to_string(),
            },
        }
    }

    /// Join elements with commas; multi-line arrays keep a trailing comma
    pub(crate) fn join(&self, elements: Vec<Vec<Token>>) -> Vec<Token> {
        let count = elements.len();
        let mut out = Vec::new();
        for (j, element) in elements.into_iter().enumerate() {
            out.extend(element);
            let is_last = j + 1 == count;
            if self.multiline || !is_last {
                out.push(Token::punct(","));
            }
            if !is_last {
                out.push(Token::whitespace(self.separator.clone()));
            }
        }
        out
    }
}

/// Number of comments between `start` and `end`, inclusive
pub(crate) fn comments_in_range(tokens: &Tokens, start: usize, end: usize) -> usize {
    (start..=end).filter(|&i| tokens[i].is_comment()).count()
}

/// Reorder every array literal in `tokens` according to `policy`
pub fn fix_arrays(tokens: &mut Tokens, options: &ArrayOptions, policy: &impl ArrayEntryPolicy) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_kind(TokenKind::ArraySquareBraceOpen) && options.filter.apply(tokens, i) {
            fix_array_at(tokens, i, options, policy);
        }
        i += 1;
    }
}

fn fix_array_at(tokens: &mut Tokens, open: usize, options: &ArrayOptions, policy: &impl ArrayEntryPolicy) {
    let Some(close) = tokens.find_block_end(BlockType::ArraySquareBrace, open) else {
        return;
    };
    let (Some(first), Some(last)) = (tokens.next_meaningful(open), tokens.prev_meaningful(close)) else {
        return;
    };
    if first >= close {
        return;
    }

    let entries = find_array_entries(tokens, open, close);
    if entries.is_empty() || entries.len() < options.min_count {
        return;
    }

    let kept_comments: usize = entries.iter().map(ArrayEntry::comment_count).sum();
    if comments_in_range(tokens, first, last) > kept_comments {
        debug!("skipping array at token {open}: rebuilding it would drop comments");
        return;
    }

    let Some(entries) = policy.transform_array_entries(&entries) else {
        return;
    };

    let layout = ElementLayout::detect(tokens, first);
    let elements = entries
        .into_iter()
        .map(|entry| {
            let mut element = Vec::new();
            if let Some(key) = entry.key {
                element.extend(key);
                element.push(Token::whitespace(" "));
                element.push(Token::new(TokenKind::DoubleArrow, "=>"));
                element.push(Token::whitespace(" "));
            }
            element.extend(entry.value);
            element
        })
        .collect();

    tokens.override_range(first, last, layout.join(elements));
}

/// Split the array opened at `open` and closed at `close` into entries
///
/// Returns no entries when an element is empty, e.g. `[1, , 2]`.
pub fn find_array_entries(tokens: &Tokens, open: usize, close: usize) -> Vec<ArrayEntry> {
    let value_delimiters = [Pattern::Punct(","), Pattern::Kind(TokenKind::ArraySquareBraceClose)];
    let key_delimiters = [
        Pattern::Punct(","),
        Pattern::Kind(TokenKind::ArraySquareBraceClose),
        Pattern::Kind(TokenKind::DoubleArrow),
    ];

    let Some(end) = tokens.prev_meaningful(close) else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    let mut i = open;

    while i < end {
        let Some(start) = tokens.next_meaningful(i) else {
            break;
        };
        let (found, delimiter) = read_expression_until(tokens, start, &key_delimiters);
        let is_keyed = tokens.get(delimiter).is_some_and(|t| t.is_kind(TokenKind::DoubleArrow));

        let (entry, delimiter) = if is_keyed {
            let Some(value_start) = tokens.next_meaningful(delimiter) else {
                return Vec::new();
            };
            let (value, delimiter) = read_expression_until(tokens, value_start, &value_delimiters);
            (ArrayEntry::new(Some(found), value), delimiter)
        } else {
            (ArrayEntry::new(None, found), delimiter)
        };

        if entry.value.is_empty() || entry.key.as_ref().is_some_and(Vec::is_empty) {
            return Vec::new();
        }
        entries.push(entry);
        i = delimiter;
    }

    entries
}
