//! ysds-lint - runs the YSDS PHP fixers over a code base
//!
//! Available rules:
//! - YSDS/ordered_array: Sort arrays of constant values
//! - YSDS/ordered_array_keys: Sort arrays by constant keys
//! - YSDS/ordered_const_array: Sort arrays made only of constants
//! - YSDS/ban_types: Mark statements that use banned types
//! - YSDS/php_unit_assert_same: Prefer assertSame() for constant expectations
//! - YSDS/replace_strings: Replace configured substrings, fix invisible characters
//! - YSDS/variable_never_read: Mark variables that are assigned but never read

mod config;
mod output;
mod process;

use anyhow::{bail, Result};
use clap::Parser;
use colored::*;
use log::debug;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;
use output::{EditInfo, OutputFormat, Reporter};
use process::{collect_files, write_file, FixerRun};
use ysds_fixer::FixerRegistry;

#[derive(Parser)]
#[command(name = "ysds-lint")]
#[command(version)]
#[command(about = "Custom PHP-CS-Fixer rules: ordered arrays, banned types, assertSame and more")]
struct Cli {
    /// Files or directories to process (default: paths from the config file)
    paths: Vec<PathBuf>,

    /// Apply fixes to files instead of reporting them
    #[arg(long)]
    fix: bool,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Path to config file: .ysds-lint.toml or .php-cs-fixer.php
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = FixerRegistry::new();

    // Handle --list-rules
    if cli.list_rules {
        list_rules(&registry);
        return Ok(ExitCode::SUCCESS);
    }

    // Load config file
    let (config, config_dir) = match &cli.config {
        Some(path) => (Config::load_path(path)?, parent_dir(path)),
        None => match Config::load()? {
            Some((cfg, path)) => (cfg, parent_dir(&path)),
            None => (Config::default(), PathBuf::from(".")),
        },
    };

    // Determine output format
    let format_name = cli
        .format
        .clone()
        .or_else(|| config.output.format.clone())
        .unwrap_or_else(|| "text".to_string());
    let output_format: OutputFormat = format_name.parse().map_err(anyhow::Error::msg)?;

    // Validate rule names from CLI
    for rule in &cli.rule {
        if registry.resolve(rule).is_none() {
            eprintln!(
                "{}: Unknown rule '{}'. Use --list-rules to see available rules.",
                "Error".red(),
                rule
            );
            return Ok(ExitCode::from(1));
        }
    }

    let all_rules: Vec<&str> = registry.all().iter().map(|f| f.php_cs_fixer_name()).collect();
    let enabled_rules = config.effective_rules(&all_rules, &cli.rule);
    if enabled_rules.is_empty() {
        eprintln!("{}: No rules enabled", "Error".red());
        return Ok(ExitCode::from(1));
    }
    let rule_names: Vec<&str> = enabled_rules.iter().map(String::as_str).collect();
    let fixer_configs = config.fixer_configs();

    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    if cli.verbose && output_format == OutputFormat::Text {
        println!("{}: {}", "Mode".bold(), if fix_mode { "fix" } else { "check" });
        println!("{}: {}", "Rules".bold(), rule_names.join(", "));
        println!();
    }

    let paths: Vec<PathBuf> = if cli.paths.is_empty() {
        config.paths.include.iter().map(|p| config_dir.join(p)).collect()
    } else {
        cli.paths.clone()
    };
    if paths.is_empty() {
        bail!("No paths given and none configured");
    }

    let (file_paths, missing_paths) = collect_files(&paths, &config);
    debug!("checking {} file(s)", file_paths.len());

    // Process files in parallel
    let fixer_run = FixerRun {
        registry: &registry,
        rules: &rule_names,
        configs: &fixer_configs,
    };
    let results: Vec<FileResult> = file_paths
        .par_iter()
        .map(|path| process_file_to_result(&fixer_run, path))
        .collect();

    let mut reporter = Reporter::new(output_format, cli.verbose);

    for path in &missing_paths {
        if output_format == OutputFormat::Text {
            eprintln!("{}: Path does not exist: {}", "Warning".yellow(), path.display());
        }
    }

    // Files are sorted, results keep their order
    for (result, path) in results.into_iter().zip(file_paths.iter()) {
        report_result(path, result, fix_mode, &mut reporter);
    }

    // Determine exit code
    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// List available rules
fn list_rules(registry: &FixerRegistry) {
    println!("{}", "Available rules:".bold());
    println!();

    let mut fixers = registry.list();
    fixers.sort_by(|a, b| a.php_cs_fixer_name.cmp(b.php_cs_fixer_name));

    for info in fixers {
        let risky_marker = if info.is_risky {
            " [risky]".yellow().to_string()
        } else {
            String::new()
        };

        println!(
            "  {} - {} (priority: {}){}",
            info.php_cs_fixer_name.green(),
            info.description,
            info.priority,
            risky_marker
        );
    }
}

/// Result of processing a single file (for parallel processing)
enum FileResult {
    /// File had no changes
    NoChanges,
    /// File has changes to report/apply
    HasChanges {
        edits: Vec<EditInfo>,
        old_source: String,
        new_source: String,
    },
    /// Reading or fixing the file failed
    Error(String),
}

/// Process a file and return a result (no output, suitable for parallel execution)
fn process_file_to_result(fixer_run: &FixerRun<'_>, path: &Path) -> FileResult {
    match fixer_run.process_file(path) {
        Ok(result) if result.edits.is_empty() => FileResult::NoChanges,
        Ok(result) => FileResult::HasChanges {
            edits: result.edits,
            old_source: result.old_source,
            new_source: result.new_source,
        },
        Err(e) => FileResult::Error(format!("{:#}", e)),
    }
}

/// Report a file result and optionally apply fixes
fn report_result(path: &Path, result: FileResult, fix_mode: bool, reporter: &mut Reporter) {
    match result {
        FileResult::NoChanges => {
            reporter.report_skipped(path);
        }
        FileResult::HasChanges {
            edits,
            old_source,
            new_source,
        } => {
            if !fix_mode {
                reporter.report_check(path, edits, &old_source, &new_source);
            } else if let Err(e) = write_file(path, &new_source) {
                reporter.report_error(path, &format!("{:#}", e));
            } else {
                reporter.report_fix(path, edits);
            }
        }
        FileResult::Error(msg) => {
            reporter.report_error(path, &msg);
        }
    }
}
