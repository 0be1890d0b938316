//! Reporting of lint results
//!
//! Every processed file ends up as a [`FileReport`]. Text output prints as
//! it goes, JSON is written once at the end, and diff output is a plain
//! unified patch that `git apply` accepts.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use colored::*;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "diff" => Ok(OutputFormat::Diff),
            other => Err(format!("Invalid output format '{other}'. Valid options: text, json, diff")),
        }
    }
}

/// A change made by one rule, positioned in the text that rule saw
#[derive(Debug, Clone, Serialize)]
pub struct EditInfo {
    pub rule: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Check mode found changes
    Changed,
    /// Changes were written back
    Fixed,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<EditInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub total_edits: usize,
    pub errors: usize,
    /// Edit count keyed by rule name
    pub rules: BTreeMap<String, usize>,
}

impl Summary {
    fn record(&mut self, report: &FileReport) {
        self.files_processed += 1;
        match report.status {
            FileStatus::Changed | FileStatus::Fixed => self.files_with_changes += 1,
            FileStatus::Failed => self.errors += 1,
            FileStatus::Unchanged => {}
        }
        self.total_edits += report.edits.len();
        for edit in &report.edits {
            *self.rules.entry(edit.rule.clone()).or_default() += 1;
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    version: &'static str,
    summary: &'a Summary,
    files: &'a [FileReport],
}

pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    reports: Vec<FileReport>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            reports: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// A file check mode would change
    pub fn report_check(&mut self, path: &Path, edits: Vec<EditInfo>, old_source: &str, new_source: &str) {
        if edits.is_empty() {
            self.report_skipped(path);
            return;
        }
        match self.format {
            OutputFormat::Text => {
                println!("{}", path.display().to_string().bold());
                for line in changed_lines(old_source, new_source) {
                    match line {
                        ChangedLine::Removed(text) => println!("  {}", format!("- {text}").red()),
                        ChangedLine::Added(text) => println!("  {}", format!("+ {text}").green()),
                    }
                }
                println!();
                print_edits(&edits);
            }
            OutputFormat::Diff => print!("{}", unified_diff(path, old_source, new_source)),
            OutputFormat::Json => {}
        }
        self.push(path, FileStatus::Changed, edits, None);
    }

    /// A file whose fixes were written
    pub fn report_fix(&mut self, path: &Path, edits: Vec<EditInfo>) {
        if edits.is_empty() {
            self.report_skipped(path);
            return;
        }
        if self.format == OutputFormat::Text {
            println!("{}", path.display().to_string().bold());
            print_edits(&edits);
        }
        self.push(path, FileStatus::Fixed, edits, None);
    }

    pub fn report_skipped(&mut self, path: &Path) {
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: no changes", path.display());
        }
        self.push(path, FileStatus::Unchanged, Vec::new(), None);
    }

    pub fn report_error(&mut self, path: &Path, error: &str) {
        if self.format == OutputFormat::Text {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), error);
        }
        self.push(path, FileStatus::Failed, Vec::new(), Some(error.to_string()));
    }

    fn push(&mut self, path: &Path, status: FileStatus, edits: Vec<EditInfo>, error: Option<String>) {
        let report = FileReport {
            path: path.display().to_string(),
            status,
            edits,
            error,
        };
        self.summary.record(&report);
        self.reports.push(report);
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Print the summary, or the whole JSON document
    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => print!("{}", render_summary(&self.summary, check_mode)),
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION"),
                    summary: &self.summary,
                    files: &self.reports,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            // A patch carries no summary.
            OutputFormat::Diff => {}
        }
        Ok(())
    }
}

fn print_edits(edits: &[EditInfo]) {
    for edit in edits {
        println!(
            "  {} {}:{} {} ({})",
            "->".green(),
            edit.line,
            edit.column,
            edit.message,
            edit.rule.dimmed()
        );
    }
    println!();
}

fn render_summary(summary: &Summary, check_mode: bool) -> String {
    let mut lines = vec![
        String::new(),
        "Summary".bold().underline().to_string(),
        format!("  Files processed: {}", summary.files_processed),
        format!(
            "  Files {}: {}",
            if check_mode { "with changes" } else { "fixed" },
            summary.files_with_changes
        ),
        format!("  Total edits: {}", summary.total_edits),
    ];
    lines.extend(summary.rules.iter().map(|(rule, count)| format!("    {rule}: {count}")));
    if summary.errors > 0 {
        lines.push(format!("  Errors: {}", summary.errors));
    }
    if check_mode && summary.total_edits > 0 {
        lines.push(String::new());
        lines.push("Run with --fix to apply changes".yellow().to_string());
    }
    lines.iter().map(|line| format!("{line}\n")).collect()
}

#[derive(Debug, PartialEq, Eq)]
enum ChangedLine<'a> {
    Removed(&'a str),
    Added(&'a str),
}

/// Lines removed and added between two versions of a file
fn changed_lines<'a>(old: &'a str, new: &'a str) -> Vec<ChangedLine<'a>> {
    diff::lines(old, new)
        .into_iter()
        .filter_map(|line| match line {
            diff::Result::Left(text) => Some(ChangedLine::Removed(text)),
            diff::Result::Right(text) => Some(ChangedLine::Added(text)),
            diff::Result::Both(..) => None,
        })
        .collect()
}

/// Patch in `diff -u` format with `a/` and `b/` prefixes
fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let path = path.display();
    let mut out = format!("--- a/{path}\n+++ b/{path}\n");

    let diff = TextDiff::from_lines(old, new);
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        out.push_str(&format!("{}\n", hunk.header()));
        for change in hunk.iter_changes() {
            out.push_str(&render_change(change.tag(), change.value(), change.missing_newline()));
        }
    }
    out
}

fn render_change(tag: ChangeTag, value: &str, missing_newline: bool) -> String {
    let sign = match tag {
        ChangeTag::Delete => '-',
        ChangeTag::Insert => '+',
        ChangeTag::Equal => ' ',
    };
    if missing_newline {
        format!("{sign}{value}\n\\ No newline at end of file\n")
    } else {
        format!("{sign}{value}")
    }
}
