//! Sort arrays of constants without the entry template

use log::debug;
use ysds_core::{BlockType, Token, TokenKind, Tokens};

use super::{comments_in_range, ElementLayout};
use crate::fixers::{ConfigError, Fixer, FixerConfig};
use crate::util::{compare_content, content_of_tokens, is_const_like};

/// Orders arrays made only of literals and class constants
///
/// Elements are split on top level commas directly, so keyed arrays are
/// never candidates (`'a' => 1` is not a constant).
pub struct OrderedConstArrayFixer;

impl OrderedConstArrayFixer {
    fn fix_array_at(&self, tokens: &mut Tokens, open: usize) {
        let Some(close) = tokens.find_block_end(BlockType::ArraySquareBrace, open) else {
            return;
        };
        let (Some(first), Some(last)) = (tokens.next_meaningful(open), tokens.prev_meaningful(close)) else {
            return;
        };
        if first >= close {
            return;
        }

        let mut elements = find_array_elements(tokens, first, close);
        if elements.is_empty() || !elements.iter().all(|e| is_const_like(e)) {
            return;
        }
        if comments_in_range(tokens, first, last) > 0 {
            debug!("skipping array at token {open}: rebuilding it would drop comments");
            return;
        }

        elements.sort_by(|a, b| compare_content(&content_of_tokens(a), &content_of_tokens(b)));

        let layout = ElementLayout::detect(tokens, first);
        tokens.override_range(first, last, layout.join(elements));
    }
}

/// Elements between `first` and the closing bracket, trimmed of trivia
fn find_array_elements(tokens: &Tokens, first: usize, close: usize) -> Vec<Vec<Token>> {
    let mut elements = Vec::new();
    let mut buffer: Vec<Token> = Vec::new();
    let mut depth = 0;

    for i in first..=close {
        let token = &tokens[i];
        if buffer.is_empty() && !token.is_meaningful() {
            continue;
        }

        depth += match (token.kind(), token.content()) {
            (TokenKind::Punct, "(" | "{" | "[") | (TokenKind::ArraySquareBraceOpen, _) => 1,
            (TokenKind::Punct, ")" | "}" | "]") | (TokenKind::ArraySquareBraceClose, _) => -1,
            _ => 0,
        };

        if (token.equals(",") && depth == 0) || i == close {
            while buffer.last().is_some_and(|t| !t.is_meaningful()) {
                buffer.pop();
            }
            if !buffer.is_empty() {
                elements.push(std::mem::take(&mut buffer));
            }
        } else {
            buffer.push(token.clone());
        }
    }

    elements
}

impl Fixer for OrderedConstArrayFixer {
    fn name(&self) -> &'static str {
        "ordered_const_array"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/ordered_const_array"
    }

    fn description(&self) -> &'static str {
        "Arrays with only constant values should be ordered"
    }

    fn is_candidate(&self, tokens: &Tokens) -> bool {
        tokens.is_token_kind_found(TokenKind::ArraySquareBraceOpen)
    }

    fn fix(&self, tokens: &mut Tokens, _config: &FixerConfig) -> Result<(), ConfigError> {
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_kind(TokenKind::ArraySquareBraceOpen) {
                self.fix_array_at(tokens, i);
            }
            i += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(code: &str) -> Tokens {
        let mut tokens = Tokens::from_code(code);
        OrderedConstArrayFixer.fix(&mut tokens, &FixerConfig::new()).unwrap();
        tokens
    }

    #[test]
    fn test_sorts_single_line_array() {
        assert_eq!(fix("<?php return ['b', 'c', 'a'];").generate_code(), "<?php return ['a', 'b', 'c'];");
    }

    #[test]
    fn test_strings_sort_before_integers() {
        assert_eq!(fix("<?php return [1, 'b', 'c'];").generate_code(), "<?php return ['b', 'c', 1];");
    }

    #[test]
    fn test_ignores_arrays_of_expressions() {
        let tokens = fix("<?php return [foo(), bar()];");
        assert!(!tokens.is_changed());
    }

    #[test]
    fn test_sorts_multi_line_array() {
        let input = "<?php return [\n    'c',\n    'b',\n    'a',\n];";
        let expected = "<?php return [\n    'a',\n    'b',\n    'c',\n];";
        assert_eq!(fix(input).generate_code(), expected);
    }

    #[test]
    fn test_sorts_class_constants() {
        let input = "<?php return [\n    static::B,\n    static::A,\n    self::C,\n];";
        let expected = "<?php return [\n    self::C,\n    static::A,\n    static::B,\n];";
        assert_eq!(fix(input).generate_code(), expected);
    }

    #[test]
    fn test_sorted_array_is_not_marked_changed() {
        let tokens = fix("<?php return [\n    'a',\n    'b',\n];");
        assert!(!tokens.is_changed());
    }

    #[test]
    fn test_dynamic_array_does_not_stop_later_arrays() {
        let tokens = fix("<?php $a = [$x, 'a']; $b = ['d', 'c'];");
        assert_eq!(tokens.generate_code(), "<?php $a = [$x, 'a']; $b = ['c', 'd'];");
    }

    #[test]
    fn test_skips_arrays_with_comments() {
        let tokens = fix("<?php ['b', /* first */ 'a'];");
        assert!(!tokens.is_changed());
    }
}
