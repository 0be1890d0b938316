//! ysds-fixer: custom PHP-CS-Fixer compatible rules
//!
//! This crate provides the `YSDS/*` fixers together with the token scanning
//! helpers they share, a priority ordered registry, and a reader for the
//! rule section of `.php-cs-fixer.php` files.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use ysds_fixer::FixerRegistry;
//!
//! let registry = FixerRegistry::new();
//! let (fixed, edits) = registry.check(source, &["YSDS/ordered_array_keys"], &HashMap::new())?;
//! ```

pub mod config;
pub mod filter;
pub mod fixers;
pub mod util;

pub use config::{PhpCsFixerConfig, RuleConfig};
pub use filter::Filter;
pub use fixers::{ConfigError, ConfigValue, Fixer, FixerConfig, FixerError, FixerRegistry};
