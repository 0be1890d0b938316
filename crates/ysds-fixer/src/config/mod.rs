//! Configuration parsing for PHP-CS-Fixer compatibility
//!
//! This module reads `.php-cs-fixer.php` configuration files and converts
//! the rules they enable into per-rule [`FixerConfig`](crate::FixerConfig)s.

mod php_parser;

pub use php_parser::{parse_php_cs_fixer_config, FinderConfig, ParseError, PhpCsFixerConfig, RuleConfig};
