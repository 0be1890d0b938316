//! File discovery and processing for ysds-lint

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ysds_core::apply_edits;
use ysds_fixer::{FixerConfig, FixerRegistry};

use crate::config::Config;
use crate::output::EditInfo;

/// Result of processing a single file
pub struct ProcessResult {
    /// Edits that were found/applied
    pub edits: Vec<EditInfo>,
    /// Original source code
    pub old_source: String,
    /// Source code after all fixers ran
    pub new_source: String,
}

/// Rules and options shared by every file of a run
pub struct FixerRun<'a> {
    pub registry: &'a FixerRegistry,
    pub rules: &'a [&'a str],
    pub configs: &'a HashMap<String, FixerConfig>,
}

impl FixerRun<'_> {
    /// Process a single PHP file and return the edits found
    pub fn process_file(&self, path: &Path) -> Result<ProcessResult> {
        let source_code = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        self.process_source(source_code)
            .with_context(|| format!("Failed to fix {}", path.display()))
    }

    /// Run the fixers over `source_code`
    pub fn process_source(&self, source_code: String) -> Result<ProcessResult> {
        let (new_source, edits) = self.registry.check(&source_code, self.rules, self.configs)?;

        // Each edit is relative to the output of the previous fixer
        let mut current = source_code.clone();
        let mut edit_infos = Vec::with_capacity(edits.len());
        for edit in &edits {
            let (line, column) = offset_to_line_column(&current, edit.start_offset());
            edit_infos.push(EditInfo {
                rule: edit.rule.clone().unwrap_or_default(),
                line,
                column,
                message: edit.message.clone(),
            });
            current = apply_edits(&current, std::slice::from_ref(edit))?;
        }

        Ok(ProcessResult {
            edits: edit_infos,
            old_source: source_code,
            new_source,
        })
    }
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}

/// PHP files under `paths`, sorted, and the paths that do not exist
pub fn collect_files(paths: &[PathBuf], config: &Config) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut file_paths: Vec<PathBuf> = Vec::new();
    let mut missing_paths: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "php"))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }

    file_paths.sort();
    file_paths.dedup();
    (file_paths, missing_paths)
}

/// Convert byte offset to line and column numbers (1-based)
fn offset_to_line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}
