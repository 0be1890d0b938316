//! Replace configured substrings in every token

use std::collections::BTreeMap;

use ysds_core::{Token, Tokens};

use super::{ConfigError, ConfigValue, Fixer, FixerConfig, FixerOption, OptionType};

/// Invisible and look-alike characters fixed by `fix_common`
const COMMON_FIXES: [(&str, &str); 5] = [
    // no-break space
    ("\u{00A0}", " "),
    // figure space
    ("\u{2007}", " "),
    // narrow no-break space
    ("\u{202F}", " "),
    // word joiner
    ("\u{2060}", ""),
    // zero width space
    ("\u{200B}", ""),
];

/// Applies a substitution table to the content of every token
pub struct ReplaceStringsFixer;

/// Substitution table with `strtr` semantics
#[derive(Debug, Clone, Default)]
pub struct Replacements {
    // Longest keys first, so the first hit at a position is the longest.
    pairs: Vec<(String, String)>,
}

impl Replacements {
    pub fn new(table: BTreeMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = table.into_iter().filter(|(from, _)| !from.is_empty()).collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { pairs }
    }

    fn from_config(config: &FixerConfig) -> Result<Self, ConfigError> {
        let mut table = config.string_map("replacements")?;
        if config.bool_or("fix_common", true)? {
            for (from, to) in COMMON_FIXES {
                table.insert(from.to_string(), to.to_string());
            }
        }
        Ok(Self::new(table))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace matches left to right; replaced text is not scanned again
    pub fn apply(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(c) = rest.chars().next() {
            match self.pairs.iter().find(|(from, _)| rest.starts_with(from.as_str())) {
                Some((from, to)) => {
                    out.push_str(to);
                    rest = &rest[from.len()..];
                }
                None => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        out
    }
}

impl Fixer for ReplaceStringsFixer {
    fn name(&self) -> &'static str {
        "replace_strings"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/replace_strings"
    }

    fn description(&self) -> &'static str {
        "Replaces matched strings"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn is_candidate(&self, _tokens: &Tokens) -> bool {
        true
    }

    fn fix(&self, tokens: &mut Tokens, config: &FixerConfig) -> Result<(), ConfigError> {
        let replacements = Replacements::from_config(config)?;
        if replacements.is_empty() {
            return Ok(());
        }

        for i in 0..tokens.len() {
            let token = &tokens[i];
            let fixed = replacements.apply(token.content());
            if fixed != token.content() {
                let kind = token.kind();
                tokens.set(i, Token::new(kind, fixed));
            }
        }
        Ok(())
    }

    fn options(&self) -> Vec<FixerOption> {
        vec![
            FixerOption {
                name: "fix_common",
                description: "Apply common fixes (no break space, zero width space)",
                option_type: OptionType::Bool,
                default: Some(ConfigValue::Bool(true)),
            },
            FixerOption {
                name: "replacements",
                description: "Map of key-value replacements",
                option_type: OptionType::StringMap,
                default: None,
            },
        ]
    }
}
