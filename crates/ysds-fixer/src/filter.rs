//! Declarative position filters
//!
//! A filter is a list of conditions that all have to hold for a token
//! position, for example "inside a class whose name matches `/Test$/`":
//!
//! ```text
//! [['class', 'matches', '/Test$/'], ['invocation', 'not_equal', 'dataProvider']]
//! ```

use std::str::FromStr;

use regex::Regex;
use ysds_core::{Token, Tokens};

use crate::fixers::{ConfigError, ConfigValue};
use crate::util::{find_parent_class, find_parent_paren};

/// What a condition looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// Name of the enclosing class
    Class,
    /// Name of the function or method whose arguments contain the position
    Invocation,
}

impl FromStr for Subject {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(Subject::Class),
            "invocation" => Ok(Subject::Invocation),
            other => Err(ConfigError::InvalidFilter(format!("unknown subject `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Matches,
    NotMatches,
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Operator::Equal),
            "not_equal" => Ok(Operator::NotEqual),
            "matches" => Ok(Operator::Matches),
            "not_matches" => Ok(Operator::NotMatches),
            other => Err(ConfigError::InvalidFilter(format!("unknown operator `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
enum Test {
    Equal(String),
    NotEqual(String),
    Matches(Regex),
    NotMatches(Regex),
}

/// One `(subject, operator, argument)` condition
#[derive(Debug, Clone)]
pub struct Condition {
    subject: Subject,
    test: Test,
}

impl Condition {
    /// Build a condition, compiling regex arguments
    pub fn new(subject: Subject, operator: Operator, argument: &str) -> Result<Self, ConfigError> {
        let test = match operator {
            Operator::Equal => Test::Equal(argument.to_string()),
            Operator::NotEqual => Test::NotEqual(argument.to_string()),
            Operator::Matches => Test::Matches(compile_php_regex(argument)?),
            Operator::NotMatches => Test::NotMatches(compile_php_regex(argument)?),
        };
        Ok(Self { subject, test })
    }

    fn from_config(value: &ConfigValue) -> Result<Self, ConfigError> {
        let parts = value
            .as_list()
            .ok_or_else(|| ConfigError::InvalidFilter("condition must be a list".to_string()))?;
        let [subject, operator, argument] = parts else {
            return Err(ConfigError::InvalidFilter(format!(
                "condition must have 3 elements, got {}",
                parts.len()
            )));
        };
        let text = |v: &ConfigValue| {
            v.to_text()
                .ok_or_else(|| ConfigError::InvalidFilter("condition elements must be scalars".to_string()))
        };
        Self::new(text(subject)?.parse()?, text(operator)?.parse()?, &text(argument)?)
    }

    fn subject_token<'t>(&self, tokens: &'t Tokens, index: usize) -> Option<&'t Token> {
        let found = match self.subject {
            Subject::Class => find_parent_class(tokens, index).and_then(|i| tokens.next_meaningful(i)),
            Subject::Invocation => find_parent_paren(tokens, index).and_then(|i| tokens.prev_meaningful(i)),
        };
        found.map(|i| &tokens[i])
    }

    fn holds(&self, tokens: &Tokens, index: usize) -> bool {
        let content = self.subject_token(tokens, index).map(Token::content);
        match (&self.test, content) {
            (Test::Equal(expected), Some(content)) => content == expected,
            (Test::NotEqual(expected), Some(content)) => content != expected,
            (Test::Matches(re), Some(content)) => re.is_match(content),
            (Test::NotMatches(re), Some(content)) => !re.is_match(content),
            (Test::Equal(_) | Test::Matches(_), None) => false,
            (Test::NotEqual(_) | Test::NotMatches(_), None) => true,
        }
    }
}

/// Conjunction of conditions; an empty filter accepts every position
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Build from the `filter` option of a fixer
    pub fn from_config(value: Option<&ConfigValue>) -> Result<Self, ConfigError> {
        let Some(value) = value else {
            return Ok(Self::default());
        };
        let conditions = value
            .as_list()
            .ok_or_else(|| ConfigError::InvalidFilter("filter must be a list of conditions".to_string()))?;
        conditions
            .iter()
            .map(Condition::from_config)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether every condition holds at `index`
    pub fn apply(&self, tokens: &Tokens, index: usize) -> bool {
        self.conditions.iter().all(|c| c.holds(tokens, index))
    }
}

/// Compile a delimited PHP regular expression such as `/Foo/i`
pub fn compile_php_regex(pattern: &str) -> Result<Regex, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = pattern.trim_start();
    let mut chars = trimmed.chars();
    let open = chars.next().ok_or_else(|| invalid("empty pattern"))?;
    if open.is_alphanumeric() || open == '\\' || open.is_whitespace() {
        return Err(invalid("missing delimiter"));
    }
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };

    let body_and_flags = &trimmed[open.len_utf8()..];
    let end = body_and_flags.rfind(close).ok_or_else(|| invalid("missing closing delimiter"))?;
    let body = &body_and_flags[..end];
    let modifiers = &body_and_flags[end + close.len_utf8()..];

    let mut flags = String::new();
    for modifier in modifiers.chars() {
        match modifier {
            'i' | 'm' | 's' | 'x' | 'U' => flags.push(modifier),
            // UTF-8 mode and anchoring at the subject end are the defaults here.
            'u' | 'D' => {}
            other => return Err(invalid(&format!("unsupported modifier `{other}`"))),
        }
    }

    let source = if flags.is_empty() {
        body.to_string()
    } else {
        format!("(?{flags}){body}")
    };
    Regex::new(&source).map_err(|e| invalid(&e.to_string()))
}
