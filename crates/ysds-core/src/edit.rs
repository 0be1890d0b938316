//! Span-based source code editing

use mago_database::file::FileId;
use mago_span::{Position, Span};
use thiserror::Error;

/// Errors that can occur during edit application
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Overlapping edits detected at offset {0}")]
    OverlappingEdits(usize),

    #[error("Edit span {start}..{end} out of bounds for source length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Edit span {start}..{end} does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },
}

/// A single replacement of a byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// The source span to replace
    pub span: Span,
    /// The replacement text
    pub replacement: String,
    /// Human-readable description of the edit
    pub message: String,
    /// Name of the rule that produced the edit
    pub rule: Option<String>,
}

impl Edit {
    pub fn new(span: Span, replacement: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Edit over plain byte offsets of a single in-memory file
    pub fn from_offsets(start: usize, end: usize, replacement: impl Into<String>, message: impl Into<String>) -> Self {
        let span = Span::new(FileId::new(b""), Position::new(start as u32), Position::new(end as u32));
        Self::new(span, replacement, message)
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn start_offset(&self) -> usize {
        self.span.start.offset as usize
    }

    pub fn end_offset(&self) -> usize {
        self.span.end.offset as usize
    }
}

/// Apply edits to source code
///
/// Edits are applied from the end of the source towards the start so that
/// earlier offsets stay valid. Overlapping or out of bounds edits are
/// rejected before anything is changed.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.start_offset().cmp(&a.start_offset()));

    let len = source.len();
    let mut prev_start: Option<usize> = None;
    for edit in &sorted {
        let (start, end) = (edit.start_offset(), edit.end_offset());
        if start > end || end > len {
            return Err(EditError::SpanOutOfBounds { start, end, len });
        }
        if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(EditError::NotCharBoundary { start, end });
        }
        if let Some(prev) = prev_start {
            if end > prev {
                return Err(EditError::OverlappingEdits(start));
            }
        }
        prev_start = Some(start);
    }

    let mut result = source.to_string();
    for edit in sorted {
        result.replace_range(edit.start_offset()..edit.end_offset(), &edit.replacement);
    }

    Ok(result)
}
