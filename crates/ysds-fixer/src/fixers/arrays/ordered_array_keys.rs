//! Sort associative arrays by key

use ysds_core::{TokenKind, Tokens};

use super::{fix_arrays, ArrayEntry, ArrayEntryPolicy, ArrayOptions};
use crate::fixers::{ConfigError, Fixer, FixerConfig, FixerOption};
use crate::util::{compare_content, is_const_like};

/// Orders arrays whose keys are all literals or class constants
pub struct OrderedArrayKeysFixer;

impl ArrayEntryPolicy for OrderedArrayKeysFixer {
    fn transform_array_entries(&self, entries: &[ArrayEntry]) -> Option<Vec<ArrayEntry>> {
        let all_const_keys = entries
            .iter()
            .all(|e| e.key.as_deref().is_some_and(is_const_like));
        if !all_const_keys {
            return None;
        }

        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| compare_content(&a.key_content().unwrap_or_default(), &b.key_content().unwrap_or_default()));

        (sorted != entries).then_some(sorted)
    }
}

impl Fixer for OrderedArrayKeysFixer {
    fn name(&self) -> &'static str {
        "ordered_array_keys"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/ordered_array_keys"
    }

    fn description(&self) -> &'static str {
        "Make sure array keys are ordered"
    }

    fn is_candidate(&self, tokens: &Tokens) -> bool {
        tokens.is_token_kind_found(TokenKind::ArraySquareBraceOpen)
    }

    fn fix(&self, tokens: &mut Tokens, config: &FixerConfig) -> Result<(), ConfigError> {
        let options = ArrayOptions::from_config(config)?;
        fix_arrays(tokens, &options, self);
        Ok(())
    }

    fn options(&self) -> Vec<FixerOption> {
        ArrayOptions::definitions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixers::ConfigValue;

    fn fix_with(code: &str, config: &FixerConfig) -> Tokens {
        let mut tokens = Tokens::from_code(code);
        OrderedArrayKeysFixer.fix(&mut tokens, config).unwrap();
        tokens
    }

    fn fix(code: &str) -> String {
        fix_with(code, &FixerConfig::new()).generate_code()
    }

    #[test]
    fn test_sorts_single_line_array() {
        assert_eq!(
            fix("<?php return ['c' => 3, 'a' => 1, 'b' => 2];"),
            "<?php return ['a' => 1, 'b' => 2, 'c' => 3];"
        );
    }

    #[test]
    fn test_sorted_array_is_unchanged() {
        let tokens = fix_with("<?php return ['a' => 1, 'b' => 2, 'c' => 3];", &FixerConfig::new());
        assert!(!tokens.is_changed());
    }

    #[test]
    fn test_ignores_non_const_and_missing_keys() {
        for code in ["<?php return [b() => 2, 'a' => 1];", "<?php return ['b' => 2, 1];"] {
            assert_eq!(fix(code), code);
        }
    }

    #[test]
    fn test_sorts_multi_line_array_of_expressions() {
        let input = "<?php return [\n    'b' => fn () => null,\n    'c' => fn () => null,\n    'a' => fn () => null,\n];";
        let expected = "<?php return [\n    'a' => fn () => null,\n    'b' => fn () => null,\n    'c' => fn () => null,\n];";
        assert_eq!(fix(input), expected);
    }

    #[test]
    fn test_sorts_class_constant_keys() {
        let input = "<?php return [\n    static::B => fn () => null,\n    static::A => fn () => null,\n];";
        let expected = "<?php return [\n    static::A => fn () => null,\n    static::B => fn () => null,\n];";
        assert_eq!(fix(input), expected);
    }

    #[test]
    fn test_leaves_sorted_but_oddly_formatted_arrays_alone() {
        let code = "<?php return [\n    'a' =>\n      1,\n    'b' =>\n      2,\n    'c' =>\n      3,\n];";
        let tokens = fix_with(code, &FixerConfig::new());
        assert!(!tokens.is_changed());
        assert_eq!(tokens.generate_code(), code);
    }

    #[test]
    fn test_applies_filter() {
        let input = "<?php\nclass SkipMe {\n  function yee() {\n    if (true) {\n      return ['b' => 2, 'a' => 1];\n    }\n  }\n}\n$a = ['b' => 2, 'a' => 1];";
        let expected = "<?php\nclass SkipMe {\n  function yee() {\n    if (true) {\n      return ['b' => 2, 'a' => 1];\n    }\n  }\n}\n$a = ['a' => 1, 'b' => 2];";
        let condition = ConfigValue::List(vec![
            ConfigValue::String("class".into()),
            ConfigValue::String("not_equal".into()),
            ConfigValue::String("SkipMe".into()),
        ]);
        let config = FixerConfig::new().with_option("filter", ConfigValue::List(vec![condition]));

        assert_eq!(fix_with(input, &config).generate_code(), expected);
    }

    #[test]
    fn test_invalid_filter_is_an_error() {
        let config = FixerConfig::new().with_option("filter", ConfigValue::String("nope".into()));
        let mut tokens = Tokens::from_code("<?php ['b' => 1];");
        assert!(OrderedArrayKeysFixer.fix(&mut tokens, &config).is_err());
    }
}
