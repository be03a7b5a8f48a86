//! Direct style transfer from a reference document.
//!
//! Unlike rule application this copies page geometry and the body font
//! straight from the reference, without zone detection.

use crate::error::Result;
use crate::model::{Document, Margins};
use crate::scan::DEFAULT_FONT;
use crate::units::Length;
use serde::Serialize;
use std::path::Path;

/// Options for style transfer.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Number of leading reference paragraphs searched for a font
    pub sample_paragraphs: usize,

    /// Font used when none of the sampled first runs names one
    pub fallback_font: String,
}

impl TransferOptions {
    /// Create new transfer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of sampled paragraphs.
    pub fn with_sample_paragraphs(mut self, count: usize) -> Self {
        self.sample_paragraphs = count;
        self
    }

    /// Set the fallback font.
    pub fn with_fallback_font(mut self, font: impl Into<String>) -> Self {
        self.fallback_font = font.into();
        self
    }
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            sample_paragraphs: 5,
            fallback_font: DEFAULT_FONT.to_string(),
        }
    }
}

/// What a transfer applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferSummary {
    pub margins: Margins,
    pub page_width: Length,
    pub page_height: Length,
    pub font_name: String,

    /// Set when the reference named no font and the fallback was used
    pub font_is_default: bool,

    pub sections_updated: usize,
    pub runs_updated: usize,
}

/// Style transfer engine.
#[derive(Debug, Clone, Default)]
pub struct StyleTransfer {
    options: TransferOptions,
}

impl StyleTransfer {
    /// Create a new style transfer with the given options.
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }

    /// Font of the first run of the first sampled paragraph whose first run names one.
    fn reference_font(&self, reference: &Document) -> Option<String> {
        reference
            .paragraphs()
            .iter()
            .take(self.options.sample_paragraphs)
            .filter_map(|p| p.runs().first())
            .find_map(|run| run.format.font_name.clone())
    }

    /// Copy margins, page size and font from `reference` into `target`.
    pub fn transfer(&self, target: &mut Document, reference: &Document) -> Result<TransferSummary> {
        let source = reference.first_section();
        let margins = source.margins();
        let (page_width, page_height) = (source.page_width(), source.page_height());

        let (font_name, font_is_default) = match self.reference_font(reference) {
            Some(name) => (name, false),
            None => {
                log::info!("Reference names no font, using {}", self.options.fallback_font);
                (self.options.fallback_font.clone(), true)
            }
        };

        for section in target.sections_mut() {
            section.set_margins(margins)?;
            section.set_page_size(page_width, page_height)?;
        }

        let mut runs_updated = 0;
        for paragraph in target.paragraphs_mut() {
            for run in paragraph.runs_mut() {
                run.format.font_name = Some(font_name.clone());
                runs_updated += 1;
            }
        }

        let summary = TransferSummary {
            margins,
            page_width,
            page_height,
            font_name,
            font_is_default,
            sections_updated: target.sections().len(),
            runs_updated,
        };
        log::info!(
            "Applied margins T={} B={} L={} R={}, font {}",
            margins.top,
            margins.bottom,
            margins.left,
            margins.right,
            summary.font_name
        );
        Ok(summary)
    }

    /// Load `target` and `reference`, transfer and save to `output`.
    pub fn transfer_file<P, R, Q>(&self, target: P, reference: R, output: Q) -> Result<TransferSummary>
    where
        P: AsRef<Path>,
        R: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let reference = Document::open(reference)?;
        let mut doc = Document::open(target)?;
        let summary = self.transfer(&mut doc, &reference)?;
        doc.save(output)?;
        Ok(summary)
    }
}

/// Transfer with the default options.
pub fn transfer(target: &mut Document, reference: &Document) -> Result<TransferSummary> {
    StyleTransfer::default().transfer(target, reference)
}

/// Transfer between files with the default options.
pub fn transfer_file<P, R, Q>(target: P, reference: R, output: Q) -> Result<TransferSummary>
where
    P: AsRef<Path>,
    R: AsRef<Path>,
    Q: AsRef<Path>,
{
    StyleTransfer::default().transfer_file(target, reference, output)
}
