//! Parser for .php-cs-fixer.php configuration files
//!
//! The file is tokenized, never executed. Literal arrays passed to
//! `->setRules()` and literal paths passed to the finder are evaluated;
//! values only known at runtime are skipped.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::debug;
use thiserror::Error;
use ysds_core::{BlockType, Pattern, Token, TokenKind, Tokens};

use crate::fixers::{ConfigValue, FixerConfig};
use crate::util::read_expression_until;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid PHP config format: {0}")]
    InvalidFormat(String),
}

/// Configuration for a single fixer rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleConfig {
    /// Whether the rule is enabled
    pub enabled: bool,
    /// Rule-specific options
    pub options: HashMap<String, ConfigValue>,
}

impl RuleConfig {
    pub fn fixer_config(&self) -> FixerConfig {
        FixerConfig {
            options: self.options.clone(),
        }
    }
}

/// Finder configuration for file discovery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinderConfig {
    /// Directories to search (->in(__DIR__ . '/src'))
    pub paths: Vec<String>,
    /// Relative path prefixes files must match (->path(['src/', 'tests/']))
    pub path_filters: Vec<String>,
    /// Excluded directories (->exclude('vendor'), ->notPath('cache/'))
    pub exclude: Vec<String>,
}

/// Parsed PHP-CS-Fixer configuration
#[derive(Debug, Clone, Default)]
pub struct PhpCsFixerConfig {
    /// Every rule named in `->setRules()`, presets included
    pub rules: HashMap<String, RuleConfig>,
    /// Whether risky rules are allowed
    pub risky_allowed: bool,
    /// File finder configuration
    pub finder: FinderConfig,
}

impl PhpCsFixerConfig {
    /// Parse a .php-cs-fixer.php file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        parse_php_cs_fixer_config(&content)
    }

    /// Check if a specific rule is enabled
    pub fn is_rule_enabled(&self, name: &str) -> bool {
        self.rules.get(name).map(|r| r.enabled).unwrap_or(false)
    }

    /// Get configuration for a specific rule
    pub fn get_rule_config(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.get(name)
    }

    /// Enabled rules whose name starts with `prefix`, sorted
    pub fn enabled_rules(&self, prefix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .rules
            .iter()
            .filter(|(name, rule)| rule.enabled && name.starts_with(prefix))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Options of every enabled rule, keyed by rule name
    pub fn fixer_configs(&self) -> HashMap<String, FixerConfig> {
        self.rules
            .iter()
            .filter(|(_, rule)| rule.enabled)
            .map(|(name, rule)| (name.clone(), rule.fixer_config()))
            .collect()
    }
}

/// Parse PHP-CS-Fixer configuration from a string
pub fn parse_php_cs_fixer_config(content: &str) -> Result<PhpCsFixerConfig, ParseError> {
    let tokens = Tokens::from_code(content);
    let mut config = PhpCsFixerConfig::default();

    // ->setRiskyAllowed(true)
    if let Some(open) = method_calls(&tokens, "setRiskyAllowed").first() {
        let (value, _) = read_value(&tokens, open + 1);
        config.risky_allowed = value.and_then(|v| v.as_bool()).unwrap_or(false);
    }

    // ->setRules([...])
    if let Some(&open) = method_calls(&tokens, "setRules").first() {
        config.rules = parse_rules(&tokens, open)?;
    }

    // PhpCsFixer\Finder::create()->in(...)->path(...)->exclude(...)
    for open in method_calls(&tokens, "in") {
        config.finder.paths.extend(read_paths(&tokens, open));
    }
    for open in method_calls(&tokens, "path") {
        config.finder.path_filters.extend(read_paths(&tokens, open));
    }
    for method in ["exclude", "notPath"] {
        for open in method_calls(&tokens, method) {
            config.finder.exclude.extend(read_paths(&tokens, open));
        }
    }

    Ok(config)
}

/// Parse the rule array passed to `->setRules(`, `open` being the parenthesis
fn parse_rules(tokens: &Tokens, open: usize) -> Result<HashMap<String, RuleConfig>, ParseError> {
    let entries = match read_value(tokens, open + 1).0 {
        Some(ConfigValue::Map(entries)) => entries,
        Some(ConfigValue::List(items)) if items.is_empty() => BTreeMap::new(),
        _ => return Err(ParseError::InvalidFormat("setRules() expects an array literal".to_string())),
    };

    let mut rules = HashMap::new();
    for (name, value) in entries {
        let rule = match value {
            ConfigValue::Bool(enabled) => RuleConfig {
                enabled,
                options: HashMap::new(),
            },
            ConfigValue::Map(options) => RuleConfig {
                enabled: true,
                options: options.into_iter().collect(),
            },
            ConfigValue::List(items) if items.is_empty() => RuleConfig {
                enabled: true,
                options: HashMap::new(),
            },
            other => {
                debug!("ignoring rule {name} with unsupported value {other:?}");
                continue;
            }
        };
        rules.insert(name, rule);
    }

    Ok(rules)
}

/// Opening parentheses of every `->name(` call, in source order
fn method_calls(tokens: &Tokens, name: &str) -> Vec<usize> {
    (0..tokens.len())
        .filter(|&i| tokens[i].is_kind(TokenKind::String) && tokens[i].content().eq_ignore_ascii_case(name))
        .filter(|&i| {
            tokens
                .prev_meaningful(i)
                .is_some_and(|p| tokens[p].is_kind(TokenKind::ObjectOperator))
        })
        .filter_map(|i| tokens.next_meaningful(i).filter(|&n| tokens[n].equals("(")))
        .collect()
}

static VALUE_DELIMITERS: [Pattern<'static>; 4] = [
    Pattern::Punct(","),
    Pattern::Punct(")"),
    Pattern::Kind(TokenKind::ArraySquareBraceClose),
    Pattern::Kind(TokenKind::DoubleArrow),
];

/// Evaluate the literal expression starting at `start`
///
/// Returns `None` for anything but booleans, integers, strings and arrays
/// of those, together with the index of the token ending the expression.
fn read_value(tokens: &Tokens, start: usize) -> (Option<ConfigValue>, usize) {
    let (expression, end) = read_expression_until(tokens, start, &VALUE_DELIMITERS);
    let meaningful: Vec<&Token> = expression.iter().filter(|t| t.is_meaningful()).collect();

    let value = match meaningful.as_slice() {
        [] => None,
        [literal] if literal.is_kind(TokenKind::ConstantEncapsedString) => {
            Some(ConfigValue::String(unquote(literal.content())))
        }
        [number] if number.is_kind(TokenKind::LNumber) => number.content().parse().ok().map(ConfigValue::Number),
        [sign, number] if sign.equals("-") && number.is_kind(TokenKind::LNumber) => {
            number.content().parse::<i64>().ok().map(|n| ConfigValue::Number(-n))
        }
        [word] if word.is_kind(TokenKind::String) && word.content().eq_ignore_ascii_case("true") => {
            Some(ConfigValue::Bool(true))
        }
        [word] if word.is_kind(TokenKind::String) && word.content().eq_ignore_ascii_case("false") => {
            Some(ConfigValue::Bool(false))
        }
        [first, ..] if first.is_kind(TokenKind::ArraySquareBraceOpen) => {
            first_meaningful(tokens, start).and_then(|open| read_array(tokens, open, BlockType::ArraySquareBrace))
        }
        [keyword, paren, ..] if keyword.content().eq_ignore_ascii_case("array") && paren.equals("(") => {
            first_meaningful(tokens, start)
                .and_then(|i| tokens.next_meaningful(i))
                .and_then(|open| read_array(tokens, open, BlockType::Parenthesis))
        }
        _ => None,
    };

    if value.is_none() && !meaningful.is_empty() {
        debug!("skipping non-literal value `{}`", expression.iter().map(Token::content).collect::<String>());
    }

    (value, end)
}

/// Evaluate the array literal opened at `open`
fn read_array(tokens: &Tokens, open: usize, block: BlockType) -> Option<ConfigValue> {
    let close = tokens.find_block_end(block, open)?;
    let mut entries: Vec<(Option<String>, ConfigValue)> = Vec::new();
    let mut pos = open + 1;

    while pos < close {
        if tokens.next_meaningful(pos - 1) == Some(close) {
            break;
        }

        let (first, mut end) = read_value(tokens, pos);
        let entry = if tokens.get(end).is_some_and(|t| t.is_kind(TokenKind::DoubleArrow)) {
            let (value, value_end) = read_value(tokens, end + 1);
            end = value_end;
            first.and_then(|key| key.to_text()).zip(value).map(|(k, v)| (Some(k), v))
        } else {
            first.map(|v| (None, v))
        };
        entries.extend(entry);

        if end >= close {
            break;
        }
        pos = end + 1;
    }

    if entries.iter().all(|(key, _)| key.is_none()) {
        return Some(ConfigValue::List(entries.into_iter().map(|(_, v)| v).collect()));
    }

    let mut map = BTreeMap::new();
    let mut next_index = 0i64;
    for (key, value) in entries {
        let key = match key {
            Some(key) => {
                if let Ok(n) = key.parse::<i64>() {
                    next_index = next_index.max(n + 1);
                }
                key
            }
            None => {
                next_index += 1;
                (next_index - 1).to_string()
            }
        };
        map.insert(key, value);
    }
    Some(ConfigValue::Map(map))
}

fn first_meaningful(tokens: &Tokens, start: usize) -> Option<usize> {
    match tokens.get(start) {
        Some(token) if token.is_meaningful() => Some(start),
        Some(_) => tokens.next_meaningful(start),
        None => None,
    }
}

/// String paths passed to the call whose parenthesis is at `open`
///
/// `__DIR__ . '/src'` is read as `src`, a bare `__DIR__` as `.`.
fn read_paths(tokens: &Tokens, open: usize) -> Vec<String> {
    let Some(close) = tokens.find_block_end(BlockType::Parenthesis, open) else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    let mut current: Option<String> = None;
    let mut dir_relative = false;

    let mut flush = |current: &mut Option<String>, dir_relative: &mut bool| {
        if let Some(path) = current.take() {
            let path = if *dir_relative {
                path.trim_start_matches('/').to_string()
            } else {
                path
            };
            paths.push(if path.is_empty() { ".".to_string() } else { path });
        }
        *dir_relative = false;
    };

    for token in &tokens.as_slice()[open + 1..close] {
        if token.is_kind(TokenKind::ConstantEncapsedString) {
            current.get_or_insert_with(String::new).push_str(&unquote(token.content()));
        } else if token.is_kind(TokenKind::String) && token.content() == "__DIR__" {
            current.get_or_insert_with(String::new);
            dir_relative = true;
        } else if token.equals(",") || token.is_kind(TokenKind::ArraySquareBraceClose) {
            flush(&mut current, &mut dir_relative);
        }
    }
    flush(&mut current, &mut dir_relative);

    paths
}

/// Value of a single or double quoted string literal
fn unquote(literal: &str) -> String {
    let Some(quote) = literal.chars().next() else {
        return String::new();
    };
    let body = literal
        .get(1..literal.len().saturating_sub(1).max(1))
        .unwrap_or_default();

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        let escaped = match (quote, next) {
            ('\'', '\'') | (_, '\\') => Some(next),
            ('"', '"') | ('"', '$') => Some(next),
            ('"', 'n') => Some('\n'),
            ('"', 't') => Some('\t'),
            ('"', 'r') => Some('\r'),
            ('"', 'v') => Some('\u{0B}'),
            ('"', 'f') => Some('\u{0C}'),
            ('"', 'e') => Some('\u{1B}'),
            _ => None,
        };
        match escaped {
            Some(c) => out.push(c),
            None => {
                out.push('\\');
                out.push(next);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rules_of(content: &str) -> HashMap<String, RuleConfig> {
        parse_php_cs_fixer_config(content).unwrap().rules
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote(r"'/\\bfoo\d/'"), r"/\bfoo\d/");
        assert_eq!(unquote(r#""a\tb\$c""#), "a\tb$c");
        assert_eq!(unquote("''"), "");
    }

    #[test]
    fn test_parse_risky_allowed() {
        assert!(parse_php_cs_fixer_config("<?php $c->setRiskyAllowed(true);").unwrap().risky_allowed);
        assert!(!parse_php_cs_fixer_config("<?php $c->setRiskyAllowed(false);").unwrap().risky_allowed);
        assert!(!parse_php_cs_fixer_config("<?php // no risky setting").unwrap().risky_allowed);
    }

    #[test]
    fn test_parse_simple_rules() {
        let rules = rules_of(
            r#"<?php
            $config->setRules([
                '@PSR2' => true,
                'YSDS/ordered_array' => true,
                'YSDS/ban_types' => false,
            ]);
            "#,
        );

        assert!(rules["@PSR2"].enabled);
        assert!(rules["YSDS/ordered_array"].enabled);
        assert!(!rules["YSDS/ban_types"].enabled);
    }

    #[test]
    fn test_parse_nested_options() {
        let rules = rules_of(
            r#"<?php
            $config->setRules([
                'YSDS/ordered_array_keys' => [
                    'filter' => [['class', 'matches', '/Enum$/']],
                    'min_count' => 2,
                ],
                'YSDS/replace_strings' => [
                    'replacements' => ['yee' => 'boi', "tab\t" => ''],
                    'fix_common' => false,
                ],
                'YSDS/ban_types' => array('types' => array('\DateTime'), 'message' => 'Use Clock'),
            ]);
            "#,
        );

        let keys = &rules["YSDS/ordered_array_keys"];
        assert!(keys.enabled);
        assert_eq!(keys.options["min_count"], ConfigValue::Number(2));
        assert_eq!(
            keys.options["filter"],
            ConfigValue::List(vec![ConfigValue::List(vec![
                ConfigValue::String("class".into()),
                ConfigValue::String("matches".into()),
                ConfigValue::String("/Enum$/".into()),
            ])])
        );

        let replace = rules["YSDS/replace_strings"].fixer_config();
        assert!(!replace.bool_or("fix_common", true).unwrap());
        let replacements = replace.string_map("replacements").unwrap();
        assert_eq!(replacements.get("yee").map(String::as_str), Some("boi"));
        assert_eq!(replacements.get("tab\t").map(String::as_str), Some(""));

        let ban = rules["YSDS/ban_types"].fixer_config();
        assert_eq!(ban.string_list("types").unwrap(), vec!["\\DateTime"]);
        assert_eq!(ban.string_or("message", "").unwrap(), "Use Clock");
    }

    #[test]
    fn test_non_literal_values_are_skipped() {
        let rules = rules_of(
            r#"<?php
            $config->setRules([
                'header_comment' => ['header' => date('Y')],
                'YSDS/ban_types' => ['types' => [Foo::class, 'Bar']],
            ]);
            "#,
        );

        assert!(rules["header_comment"].enabled);
        assert!(rules["header_comment"].options.is_empty());
        assert_eq!(
            rules["YSDS/ban_types"].options["types"],
            ConfigValue::List(vec![ConfigValue::String("Bar".into())])
        );
    }

    #[test]
    fn test_mixed_keys_become_a_map() {
        let rules = rules_of("<?php $c->setRules(['r' => ['opt' => ['a', 'k' => 'b', 'c']]]);");
        let ConfigValue::Map(map) = &rules["r"].options["opt"] else {
            panic!("expected a map");
        };
        assert_eq!(map["0"], ConfigValue::String("a".into()));
        assert_eq!(map["k"], ConfigValue::String("b".into()));
        assert_eq!(map["1"], ConfigValue::String("c".into()));
    }

    #[test]
    fn test_set_rules_requires_an_array() {
        let err = parse_php_cs_fixer_config("<?php $c->setRules($rules);").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn test_parse_finder() {
        let config = parse_php_cs_fixer_config(
            r#"<?php
            $finder = PhpCsFixer\Finder::create()
                ->in([__DIR__ . '/src', 'lib'])
                ->exclude('vendor')
                ->notPath('cache/');
            "#,
        )
        .unwrap();

        assert_eq!(config.finder.paths, vec!["src", "lib"]);
        assert_eq!(config.finder.exclude, vec!["vendor", "cache/"]);
    }

    #[test]
    fn test_enabled_rules_and_fixer_configs() {
        let config = parse_php_cs_fixer_config(
            "<?php $c->setRules(['YSDS/b' => true, 'YSDS/a' => ['x' => 1], 'YSDS/c' => false, 'other' => true]);",
        )
        .unwrap();

        assert_eq!(config.enabled_rules("YSDS/"), vec!["YSDS/a", "YSDS/b"]);
        let configs = config.fixer_configs();
        assert_eq!(configs["YSDS/a"].number_or("x", 0).unwrap(), 1);
        assert!(!configs.contains_key("YSDS/c"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<?php

$finder = PhpCsFixer\Finder::create()
    ->path([
        'src/',
        'tests/',
    ])
    ->in(__DIR__);

return (new PhpCsFixer\Config())
    ->registerCustomFixers([
        new \YSDS\Lint\ReplaceStringsFixer(),
    ])
    ->setRiskyAllowed(true)
    ->setRules([
        '@PSR1' => true,
        '@PSR2' => true,
        'array_syntax' => [
            'syntax' => 'short',
        ],
        'method_argument_space' => [
            'keep_multiple_spaces_after_comma' => false,
            'on_multiline' => 'ignore',
        ],
        'no_trailing_whitespace_in_comment' => false,

        'YSDS/replace_strings' => [
            'fix_common' => true,
        ],
    ])
    ->setFinder($finder);
"#
        )
        .unwrap();

        let config = PhpCsFixerConfig::from_file(file.path()).unwrap();

        assert!(config.risky_allowed);
        assert_eq!(config.finder.paths, vec!["."]);
        assert_eq!(config.finder.path_filters, vec!["src/", "tests/"]);
        assert!(config.is_rule_enabled("array_syntax"));
        assert!(!config.is_rule_enabled("no_trailing_whitespace_in_comment"));
        assert_eq!(config.enabled_rules("YSDS/"), vec!["YSDS/replace_strings"]);
        assert_eq!(
            config.get_rule_config("YSDS/replace_strings").unwrap().options["fix_common"],
            ConfigValue::Bool(true)
        );
    }

    #[test]
    fn test_missing_file() {
        let err = PhpCsFixerConfig::from_file("/nonexistent/.php-cs-fixer.php").unwrap_err();
        assert!(matches!(err, ParseError::IoError(_)));
    }
}
