//! Paragraph and run types.

use crate::units::Length;
use serde::{Deserialize, Serialize};

/// A paragraph: ordered runs plus paragraph-level formatting.
///
/// Runs can be appended but not removed, so run identity (its position)
/// stays stable against the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    runs: Vec<Run>,

    /// Paragraph formatting
    pub format: ParagraphFormat,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single plain run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_run(Run::new(text));
        p
    }

    pub(crate) fn from_parts(runs: Vec<Run>, format: ParagraphFormat) -> Self {
        Self { runs, format }
    }

    /// Append a run.
    pub fn add_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    /// Runs in order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Mutable access to the runs.
    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }

    /// Line spacing multiplier; single spacing when unset.
    pub fn line_spacing(&self) -> f64 {
        self.format.line_spacing.unwrap_or(1.0)
    }
}

/// Paragraph-level formatting. `None` means "inherit from the style".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphFormat {
    /// Line spacing multiplier (1.0 = single, 2.0 = double)
    pub line_spacing: Option<f64>,

    /// Space before the paragraph
    pub space_before: Option<Length>,

    /// Space after the paragraph
    pub space_after: Option<Length>,

    /// Left indent
    pub left_indent: Option<Length>,

    /// First-line indent; negative for a hanging indent
    pub first_line_indent: Option<Length>,
}

/// A run of text with consistent formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The text content
    pub text: String,

    /// Run formatting
    pub format: RunFormat,
}

impl Run {
    /// Create a run with default formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat::default(),
        }
    }

    /// Create a run in the given font.
    pub fn with_font(text: impl Into<String>, font_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat {
                font_name: Some(font_name.into()),
                ..Default::default()
            },
        }
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Run-level formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormat {
    /// Font family name
    pub font_name: Option<String>,

    /// Font size
    pub font_size: Option<Length>,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,
}
