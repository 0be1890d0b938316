//! Configuration file support for ysds-lint
//!
//! Loads `.ysds-lint.toml` from the current directory or parent directories,
//! or a `.php-cs-fixer.php` file passed with `--config`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use ysds_fixer::config::FinderConfig;
use ysds_fixer::{ConfigValue, FixerConfig, PhpCsFixerConfig};

pub const CONFIG_FILE_NAME: &str = ".ysds-lint.toml";

/// Rules read from PHP-CS-Fixer config files
const RULE_PREFIX: &str = "YSDS/";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// If set, only these rules will run
    pub enabled: Option<Vec<String>>,
    /// Rules to exclude (applied after enabled)
    pub disabled: Vec<String>,
    /// Options per rule, `[rules.options."YSDS/ban_types"]`
    pub options: HashMap<String, HashMap<String, ConfigValue>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Paths to check when none are given on the command line,
    /// relative to the config file
    pub include: Vec<String>,
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.ysds-lint.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path, TOML or PHP-CS-Fixer
    pub fn load_path(path: &Path) -> Result<Config> {
        if path.extension().is_some_and(|ext| ext == "php") {
            let php_config = PhpCsFixerConfig::from_file(path)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            return Ok(Self::from_php_cs_fixer(&php_config));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Build a config from the `YSDS/` rules and finder of a PHP-CS-Fixer config
    pub fn from_php_cs_fixer(php_config: &PhpCsFixerConfig) -> Config {
        let enabled: Vec<String> = php_config
            .enabled_rules(RULE_PREFIX)
            .into_iter()
            .map(str::to_string)
            .collect();

        let options = enabled
            .iter()
            .filter_map(|name| {
                let rule = php_config.get_rule_config(name)?;
                (!rule.options.is_empty()).then(|| (name.clone(), rule.options.clone()))
            })
            .collect();

        let exclude = php_config
            .finder
            .exclude
            .iter()
            .map(|dir| {
                if dir.ends_with('/') {
                    dir.clone()
                } else {
                    format!("{dir}/")
                }
            })
            .collect();

        Config {
            rules: RulesConfig {
                enabled: Some(enabled),
                disabled: vec![],
                options,
            },
            paths: PathsConfig {
                include: finder_include(&php_config.finder),
                exclude,
            },
            output: OutputConfig::default(),
        }
    }

    /// Compute the rules to run, in a stable order without duplicates
    pub fn effective_rules(&self, all_rules: &[&str], cli_rules: &[String]) -> Vec<String> {
        // CLI rules override config completely
        let candidates: Vec<String> = if !cli_rules.is_empty() {
            cli_rules.to_vec()
        } else {
            match &self.rules.enabled {
                Some(enabled) => enabled.clone(),
                None => all_rules.iter().map(|s| s.to_string()).collect(),
            }
        };

        let mut rules: Vec<String> = Vec::with_capacity(candidates.len());
        for rule in candidates {
            if cli_rules.is_empty() && self.rules.disabled.contains(&rule) {
                continue;
            }
            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }
        rules
    }

    /// Options of each configured rule
    pub fn fixer_configs(&self) -> HashMap<String, FixerConfig> {
        self.rules
            .options
            .iter()
            .map(|(name, options)| {
                (
                    name.clone(),
                    FixerConfig {
                        options: options.clone(),
                    },
                )
            })
            .collect()
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            // Try glob matching
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                // Also try matching against just the file/dir name
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            // Also do simple prefix/contains matching for directory patterns
            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

/// Directories searched by a finder, narrowed by its `->path()` filters
fn finder_include(finder: &FinderConfig) -> Vec<String> {
    if finder.path_filters.is_empty() {
        return finder.paths.clone();
    }

    let roots = if finder.paths.is_empty() {
        vec![".".to_string()]
    } else {
        finder.paths.clone()
    };

    roots
        .iter()
        .flat_map(|root| {
            finder.path_filters.iter().map(move |filter| {
                if root == "." {
                    filter.clone()
                } else {
                    format!("{}/{}", root.trim_end_matches('/'), filter)
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[rules]
enabled = ["YSDS/ordered_array", "YSDS/ban_types"]
disabled = ["YSDS/ordered_array"]

[rules.options."YSDS/ban_types"]
types = ["\\DateTime"]
message = "Use the clock"

[paths]
include = ["src"]
exclude = ["vendor/", "*.generated.php"]

[output]
format = "json"
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(CONFIG_FILE_NAME));
        assert_eq!(
            config.rules.enabled,
            Some(vec!["YSDS/ordered_array".to_string(), "YSDS/ban_types".to_string()])
        );
        assert_eq!(config.rules.disabled, vec!["YSDS/ordered_array".to_string()]);
        assert_eq!(config.paths.include, vec!["src".to_string()]);
        assert_eq!(
            config.paths.exclude,
            vec!["vendor/".to_string(), "*.generated.php".to_string()]
        );
        assert_eq!(config.output.format, Some("json".to_string()));

        let ban = &config.fixer_configs()["YSDS/ban_types"];
        assert_eq!(ban.string_list("types").unwrap(), vec!["\\DateTime"]);
        assert_eq!(ban.string_or("message", "").unwrap(), "Use the clock");
    }

    #[test]
    fn test_load_from_parent_directory() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[rules]\ndisabled = [\"YSDS/ban_types\"]\n");
        let nested = temp.path().join("src").join("Domain");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(CONFIG_FILE_NAME));
        assert_eq!(config.rules.disabled, vec!["YSDS/ban_types".to_string()]);
    }

    #[test]
    fn test_load_empty_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert!(config.rules.enabled.is_none());
        assert!(config.rules.disabled.is_empty());
        assert!(config.rules.options.is_empty());
        assert!(config.paths.exclude.is_empty());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[rules]\nenabled = 3\n");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(temp.path().to_path_buf()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_php_cs_fixer_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".php-cs-fixer.dist.php");
        fs::write(
            &path,
            r#"<?php
$finder = PhpCsFixer\Finder::create()
    ->path(['src/', 'tests/'])
    ->exclude('cache')
    ->in(__DIR__);

return (new PhpCsFixer\Config())
    ->setRules([
        '@PSR2' => true,
        'YSDS/replace_strings' => ['fix_common' => false],
        'YSDS/ordered_array' => true,
        'YSDS/ban_types' => false,
    ])
    ->setFinder($finder);
"#,
        )
        .unwrap();

        let config = Config::load_path(&path).unwrap();

        assert_eq!(
            config.rules.enabled,
            Some(vec!["YSDS/ordered_array".to_string(), "YSDS/replace_strings".to_string()])
        );
        assert_eq!(config.paths.include, vec!["src/".to_string(), "tests/".to_string()]);
        assert_eq!(config.paths.exclude, vec!["cache/".to_string()]);

        let configs = config.fixer_configs();
        assert!(!configs["YSDS/replace_strings"].bool_or("fix_common", true).unwrap());
        assert!(!configs.contains_key("YSDS/ordered_array"));
    }

    #[test]
    fn test_finder_include() {
        let finder = FinderConfig {
            paths: vec!["app".to_string(), "lib/".to_string()],
            path_filters: vec!["Domain/".to_string()],
            exclude: vec![],
        };
        assert_eq!(finder_include(&finder), vec!["app/Domain/", "lib/Domain/"]);

        let plain = FinderConfig {
            paths: vec!["src".to_string()],
            ..Default::default()
        };
        assert_eq!(finder_include(&plain), vec!["src"]);
    }

    #[test]
    fn test_effective_rules_cli_override() {
        let config = Config {
            rules: RulesConfig {
                disabled: vec!["YSDS/ban_types".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let all_rules = &["YSDS/ordered_array", "YSDS/ban_types"];
        let cli_rules = vec!["YSDS/ban_types".to_string(), "YSDS/ban_types".to_string()];

        let effective = config.effective_rules(all_rules, &cli_rules);

        assert_eq!(effective, vec!["YSDS/ban_types".to_string()]);
    }

    #[test]
    fn test_effective_rules_config_enabled() {
        let config = Config {
            rules: RulesConfig {
                enabled: Some(vec!["YSDS/ordered_array".to_string(), "YSDS/ban_types".to_string()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let all_rules = &["YSDS/ordered_array", "YSDS/ban_types", "YSDS/replace_strings"];

        let effective = config.effective_rules(all_rules, &[]);

        assert_eq!(effective, vec!["YSDS/ordered_array".to_string(), "YSDS/ban_types".to_string()]);
    }

    #[test]
    fn test_effective_rules_with_disabled() {
        let config = Config {
            rules: RulesConfig {
                disabled: vec!["YSDS/ban_types".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let all_rules = &["YSDS/ordered_array", "YSDS/ban_types", "YSDS/replace_strings"];

        let effective = config.effective_rules(all_rules, &[]);

        assert_eq!(
            effective,
            vec!["YSDS/ordered_array".to_string(), "YSDS/replace_strings".to_string()]
        );
    }

    #[test]
    fn test_should_exclude_glob() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["*.generated.php".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("foo.generated.php")));
        assert!(!config.should_exclude(Path::new("foo.php")));
    }

    #[test]
    fn test_should_exclude_directory() {
        let config = Config {
            paths: PathsConfig {
                exclude: vec!["vendor/".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(config.should_exclude(Path::new("project/vendor/autoload.php")));
        assert!(config.should_exclude(Path::new("vendor/package/file.php")));
        assert!(!config.should_exclude(Path::new("src/vendor.php")));
    }
}
