//! Sort arrays of constant values

use ysds_core::{TokenKind, Tokens};

use super::{fix_arrays, ArrayEntry, ArrayEntryPolicy, ArrayOptions};
use crate::fixers::{ConfigError, Fixer, FixerConfig, FixerOption};
use crate::util::{compare_content, is_const_like};

/// Orders list-style arrays whose values are all literals or class constants
pub struct OrderedArrayFixer;

impl ArrayEntryPolicy for OrderedArrayFixer {
    fn transform_array_entries(&self, entries: &[ArrayEntry]) -> Option<Vec<ArrayEntry>> {
        if !entries.iter().all(|e| e.key.is_none() && is_const_like(&e.value)) {
            return None;
        }

        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| compare_content(&a.value_content(), &b.value_content()));

        (sorted != entries).then_some(sorted)
    }
}

impl Fixer for OrderedArrayFixer {
    fn name(&self) -> &'static str {
        "ordered_array"
    }

    fn php_cs_fixer_name(&self) -> &'static str {
        "YSDS/ordered_array"
    }

    fn description(&self) -> &'static str {
        "Arrays with only constant values should be ordered"
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
