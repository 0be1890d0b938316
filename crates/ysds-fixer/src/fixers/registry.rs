//! Fixer registry for managing available fixers
//!
//! The registry collects all available fixers and provides methods
//! to look them up by name and apply them in priority order.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use ysds_core::{apply_edits, Edit, Tokens};

use super::arrays::{OrderedArrayFixer, OrderedArrayKeysFixer, OrderedConstArrayFixer};
use super::ban_types::BanTypesFixer;
use super::php_unit_assert_same::PhpUnitAssertSameFixer;
use super::replace_strings::ReplaceStringsFixer;
use super::variable_never_read::VariableNeverReadFixer;
use super::{Fixer, FixerConfig, FixerError};

/// Rule names kept working after the rule was renamed
const ALIASES: [(&str, &str); 1] = [("YSDS/php_unit_prefer_assert_same", "YSDS/php_unit_assert_same")];

/// Information about a registered fixer
#[derive(Debug, Clone)]
pub struct FixerInfo {
    pub name: &'static str,
    pub php_cs_fixer_name: &'static str,
    pub description: &'static str,
    pub priority: i32,
    pub is_risky: bool,
}

/// Registry of all available fixers
pub struct FixerRegistry {
    fixers: Vec<Arc<dyn Fixer>>,
    by_name: HashMap<&'static str, usize>,
    by_php_name: HashMap<&'static str, usize>,
}

impl FixerRegistry {
    /// Create a new registry with all built-in fixers
    pub fn new() -> Self {
        let mut registry = Self {
            fixers: Vec::new(),
            by_name: HashMap::new(),
            by_php_name: HashMap::new(),
        };

        registry.register(Arc::new(ReplaceStringsFixer));
        registry.register(Arc::new(PhpUnitAssertSameFixer));
        registry.register(Arc::new(OrderedArrayFixer));
        registry.register(Arc::new(OrderedArrayKeysFixer));
        registry.register(Arc::new(OrderedConstArrayFixer));
        registry.register(Arc::new(BanTypesFixer));
        registry.register(Arc::new(VariableNeverReadFixer));

        // Sort by priority (descending - higher priority runs first)
        registry.fixers.sort_by(|a, b| b.priority().cmp(&a.priority()));

        // Rebuild indices after sorting
        registry.by_name.clear();
        registry.by_php_name.clear();
        for (idx, fixer) in registry.fixers.iter().enumerate() {
            registry.by_name.insert(fixer.name(), idx);
            registry.by_php_name.insert(fixer.php_cs_fixer_name(), idx);
        }
        for (alias, target) in ALIASES {
            if let Some(&idx) = registry.by_php_name.get(target) {
                registry.by_php_name.insert(alias, idx);
            }
        }

        registry
    }

    /// Register a fixer
    fn register(&mut self, fixer: Arc<dyn Fixer>) {
        let idx = self.fixers.len();
        self.by_name.insert(fixer.name(), idx);
        self.by_php_name.insert(fixer.php_cs_fixer_name(), idx);
        self.fixers.push(fixer);
    }

    /// Get a fixer by its internal name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Fixer>> {
        self.by_name.get(name).map(|&idx| &self.fixers[idx])
    }

    /// Get a fixer by its PHP-CS-Fixer name or one of its aliases
    pub fn get_by_php_name(&self, name: &str) -> Option<&Arc<dyn Fixer>> {
        self.by_php_name.get(name).map(|&idx| &self.fixers[idx])
    }

    /// Look a fixer up by either kind of name
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Fixer>> {
        self.get_by_php_name(name).or_else(|| self.get(name))
    }

    /// Get all fixers in priority order
    pub fn all(&self) -> &[Arc<dyn Fixer>] {
        &self.fixers
    }

    /// Get information about all fixers
    pub fn list(&self) -> Vec<FixerInfo> {
        self.fixers
            .iter()
            .map(|f| FixerInfo {
                name: f.name(),
                php_cs_fixer_name: f.php_cs_fixer_name(),
                description: f.description(),
                priority: f.priority(),
                is_risky: f.is_risky(),
            })
            .collect()
    }

    /// Check source with specified fixers
    ///
    /// Runs fixers sequentially in priority order, each one on the output
    /// of the previous. `configs` holds the options per rule, keyed by the
    /// name the rule was requested with. Unknown rule names are skipped.
    ///
    /// Returns the fixed source and one edit per fixer that changed it.
    /// Edit offsets refer to the source as it was before that fixer ran.
    pub fn check(
        &self,
        source: &str,
        fixer_names: &[&str],
        configs: &HashMap<String, FixerConfig>,
    ) -> Result<(String, Vec<Edit>), FixerError> {
        let default_config = FixerConfig::default();
        let mut fixers_to_run: Vec<(&Arc<dyn Fixer>, &FixerConfig)> = Vec::new();

        for &name in fixer_names {
            let Some(fixer) = self.resolve(name) else {
                warn!("unknown rule {name}, skipping");
                continue;
            };
            if fixers_to_run.iter().any(|(f, _)| Arc::ptr_eq(f, fixer)) {
                continue;
            }
            let config = configs
                .get(name)
                .or_else(|| configs.get(fixer.php_cs_fixer_name()))
                .or_else(|| configs.get(fixer.name()))
                .unwrap_or(&default_config);
            fixers_to_run.push((fixer, config));
        }

        // Sort by priority (higher priority runs first)
        fixers_to_run.sort_by(|a, b| b.0.priority().cmp(&a.0.priority()));

        let mut edits = Vec::new();
        let mut current = source.to_string();

        for (fixer, config) in fixers_to_run {
            let mut tokens = Tokens::from_code(&current);
            if !fixer.is_candidate(&tokens) {
                continue;
            }
            fixer.fix(&mut tokens, config).map_err(|source| FixerError::Config {
                rule: fixer.php_cs_fixer_name().to_string(),
                source,
            })?;
            if !tokens.is_changed() {
                continue;
            }

            let fixed = tokens.generate_code();
            let Some(edit) = minimal_edit(&current, &fixed, fixer.as_ref()) else {
                continue;
            };
            current = apply_edits(&current, std::slice::from_ref(&edit)).map_err(|source| FixerError::Edit {
                rule: fixer.php_cs_fixer_name().to_string(),
                source,
            })?;
            debug!("{} changed bytes {}..{}", fixer.php_cs_fixer_name(), edit.start_offset(), edit.end_offset());
            edits.push(edit);
        }

        Ok((current, edits))
    }

    /// Check source with all fixers and default options
    pub fn check_all(&self, source: &str) -> Result<(String, Vec<Edit>), FixerError> {
        let names: Vec<&str> = self.fixers.iter().map(|f| f.php_cs_fixer_name()).collect();
        self.check(source, &names, &HashMap::new())
    }

    /// Number of registered fixers
    pub fn len(&self) -> usize {
        self.fixers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.fixers.is_empty()
    }
}

impl Default for FixerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Single edit turning `before` into `after`, covering only the bytes
/// between their common prefix and suffix
fn minimal_edit(before: &str, after: &str, fixer: &dyn Fixer) -> Option<Edit> {
    if before == after {
        return None;
    }

    let mut prefix = before
        .bytes()
        .zip(after.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    while !before.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = before.len().min(after.len()) - prefix;
    let mut suffix = before
        .bytes()
        .rev()
        .zip(after.bytes().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    while !before.is_char_boundary(before.len() - suffix) {
        suffix -= 1;
    }

    let edit = Edit::from_offsets(
        prefix,
        before.len() - suffix,
        &after[prefix..after.len() - suffix],
        fixer.description(),
    );
    Some(edit.with_rule(fixer.php_cs_fixer_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixers::ConfigValue;

    #[test]
    fn test_registry_has_fixers() {
        let registry = FixerRegistry::new();
        assert_eq!(registry.len(), 7);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_get_by_name() {
        let registry = FixerRegistry::new();

        assert!(registry.get("ordered_array_keys").is_some());
        assert!(registry.get_by_php_name("YSDS/ordered_array_keys").is_some());
        assert!(registry.get_by_php_name("YSDS/nope").is_none());

        let alias = registry.get_by_php_name("YSDS/php_unit_prefer_assert_same").unwrap();
        assert_eq!(alias.php_cs_fixer_name(), "YSDS/php_unit_assert_same");
    }

    #[test]
    fn test_priority_order() {
        let registry = FixerRegistry::new();
        for window in registry.all().windows(2) {
            assert!(
                window[0].priority() >= window[1].priority(),
                "{} (priority {}) should come before {} (priority {})",
                window[0].name(),
                window[0].priority(),
                window[1].name(),
                window[1].priority()
            );
        }
    }

    #[test]
    fn test_check_applies_fixers_in_sequence() {
        let registry = FixerRegistry::new();
        let source = "<?php\nfunction test() {\n  $this->assertEquals([2, 1], $x);\n}\n";

        let (fixed, edits) = registry
            .check(source, &["YSDS/ordered_array", "YSDS/php_unit_assert_same"], &HashMap::new())
            .unwrap();

        assert_eq!(fixed, "<?php\nfunction test() {\n  $this->assertSame([1, 2], $x);\n}\n");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].rule.as_deref(), Some("YSDS/php_unit_assert_same"));
        assert_eq!(edits[1].rule.as_deref(), Some("YSDS/ordered_array"));
        assert_eq!(edits[1].replacement, "1, 2");
    }

    #[test]
    fn test_check_uses_rule_options() {
        let registry = FixerRegistry::new();
        let mut configs = HashMap::new();
        configs.insert(
            "YSDS/ban_types".to_string(),
            FixerConfig::new().with_option("types", ConfigValue::List(vec![ConfigValue::String("Foo".into())])),
        );

        let (fixed, _) = registry.check("<?php new Foo();", &["YSDS/ban_types"], &configs).unwrap();
        assert_eq!(fixed, "<?php new Foo(); /* FIXME: This type is banned. */");
    }

    #[test]
    fn test_check_reports_config_errors() {
        let registry = FixerRegistry::new();
        let mut configs = HashMap::new();
        configs.insert(
            "YSDS/ordered_array".to_string(),
            FixerConfig::new().with_option("min_count", ConfigValue::Bool(true)),
        );

        let err = registry.check("<?php [1];", &["YSDS/ordered_array"], &configs).unwrap_err();
        assert!(err.to_string().starts_with("Rule YSDS/ordered_array:"));
    }

    #[test]
    fn test_check_skips_unknown_and_duplicate_rules() {
        let registry = FixerRegistry::new();
        let source = "<?php $this->assertEquals(1, $x);";

        let (fixed, edits) = registry
            .check(
                source,
                &["YSDS/unknown", "YSDS/php_unit_assert_same", "YSDS/php_unit_prefer_assert_same"],
                &HashMap::new(),
            )
            .unwrap();
        assert_eq!(fixed, "<?php $this->assertSame(1, $x);");
        assert_eq!(edits.len(), 1);
    }

    #[test]
    fn test_minimal_edit() {
        let fixer = ReplaceStringsFixer;
        let edit = minimal_edit("<?php 'a\u{a0}b';", "<?php 'a b';", &fixer).unwrap();
        assert_eq!((edit.start_offset(), edit.end_offset()), (8, 10));
        assert_eq!(edit.replacement, " ");

        let insert = minimal_edit("<?php a;", "<?php a; b;", &fixer).unwrap();
        assert_eq!((insert.start_offset(), insert.end_offset()), (8, 8));
        assert_eq!(insert.replacement, " b;");

        assert!(minimal_edit("same", "same", &fixer).is_none());
    }
}
