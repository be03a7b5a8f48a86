//! # docnorm
//!
//! Formatting normalization for Word (DOCX) documents.
//!
//! This library checks and rewrites the page geometry, fonts and paragraph
//! spacing of a document against an institutional style standard, such as
//! the formatting rules of a university thesis.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docnorm::{format_file, RuleSchema};
//!
//! fn main() -> docnorm::Result<()> {
//!     let rules = RuleSchema::from_file("rules.json")?;
//!     let result = format_file("thesis.docx", &rules, "thesis_formatted.docx")?;
//!     for warning in &result.warnings {
//!         println!("warning: {}", warning);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Template scanning**: derive margins and body font from a master document
//! - **Rule application**: global and per-zone rules from JSON
//! - **Zone detection**: abstract, chapter headings, bibliography and table of
//!   contents found in a flat paragraph list
//! - **Style transfer**: copy geometry and font straight from a reference
//! - **Lossless saving**: only changed attributes are rewritten; every other
//!   part of the package is kept as-is

pub mod apply;
pub mod config;
pub mod detect;
mod docx;
pub mod error;
pub mod job;
pub mod model;
pub mod rules;
pub mod scan;
pub mod transfer;
pub mod units;
pub mod zones;

// Re-export commonly used types
pub use apply::{ApplyReport, FormatResult, Formatter, Warning, WarningKind};
pub use config::EngineConfig;
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use error::{Error, Result};
pub use job::{Dispatcher, Job, JobResult, JobStatus, PdfCompressor};
pub use model::{Document, Margins, PageSection, Paragraph, ParagraphFormat, Run, RunFormat};
pub use rules::RuleSchema;
pub use scan::{ScanOptions, ScannedTemplate, Scanner};
pub use transfer::{StyleTransfer, TransferOptions, TransferSummary};
pub use units::{Length, LengthUnit, SizeValue};
pub use zones::{DetectorOptions, Zone, ZoneDetector, ZoneKind, ZoneSet};

use std::path::Path;

/// Open a DOCX file.
///
/// # Example
///
/// ```no_run
/// use docnorm::open;
///
/// let doc = open("thesis.docx").unwrap();
/// println!("Paragraphs: {}", doc.paragraph_count());
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> Result<Document> {
    Document::open(path)
}

/// Parse a DOCX package from bytes.
pub fn open_bytes(data: &[u8]) -> Result<Document> {
    Document::from_bytes(data)
}

/// Scan a master document into a rule template.
///
/// # Example
///
/// ```no_run
/// use docnorm::scan_file;
///
/// let template = scan_file("templates/skripsi/master.docx").unwrap();
/// println!("{}", template.to_json().unwrap());
/// ```
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<ScannedTemplate> {
    Scanner::default().scan_file(path)
}

/// Apply a rule set to a file and save the result.
pub fn format_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    rules: &RuleSchema,
    output: Q,
) -> Result<FormatResult> {
    apply::format_file(input, rules, output)
}

/// Copy margins, page size and font from `reference` into `target`, saving to `output`.
///
/// # Example
///
/// ```no_run
/// use docnorm::transfer_file;
///
/// let summary = transfer_file("draft.docx", "master.docx", "draft_styled.docx").unwrap();
/// println!("Font: {}", summary.font_name);
/// ```
pub fn transfer_file<P, R, Q>(target: P, reference: R, output: Q) -> Result<TransferSummary>
where
    P: AsRef<Path>,
    R: AsRef<Path>,
    Q: AsRef<Path>,
{
    transfer::transfer_file(target, reference, output)
}

/// Detect the zones of a DOCX file.
pub fn detect_zones<P: AsRef<Path>>(path: P) -> Result<ZoneSet> {
    let doc = Document::open(path)?;
    Ok(zones::detect(&doc))
}

/// Builder for working on one document with shared settings.
///
/// # Example
///
/// ```no_run
/// use docnorm::{Docnorm, RuleSchema};
///
/// let rules = RuleSchema::from_file("rules.json")?;
/// let mut session = Docnorm::new()
///     .with_split_on_anchor(true)
///     .open("thesis.docx")?;
/// let report = session.apply(&rules)?;
/// session.save("thesis_formatted.docx")?;
/// println!("{} warnings", report.warnings.len());
/// # Ok::<(), docnorm::Error>(())
/// ```
pub struct Docnorm {
    config: EngineConfig,
}

impl Docnorm {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Let a new zone anchor close the open zone.
    pub fn with_split_on_anchor(mut self, split: bool) -> Self {
        self.config.detector = self.config.detector.with_split_on_anchor(split);
        self
    }

    /// Set the number of paragraphs the scanner samples.
    pub fn with_scan_sample(mut self, paragraphs: usize) -> Self {
        self.config.scan = self.config.scan.with_sample_paragraphs(paragraphs);
        self
    }

    /// Set the font used when a reference names none.
    pub fn with_fallback_font(mut self, font: impl Into<String>) -> Self {
        let font = font.into();
        self.config.scan = self.config.scan.with_fallback_font(font.clone());
        self.config.transfer = self.config.transfer.with_fallback_font(font);
        self
    }

    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<DocnormSession> {
        Ok(DocnormSession {
            document: Document::open(path)?,
            config: self.config,
        })
    }

    /// Open a DOCX package from bytes.
    pub fn open_bytes(self, data: &[u8]) -> Result<DocnormSession> {
        Ok(DocnormSession {
            document: Document::from_bytes(data)?,
            config: self.config,
        })
    }
}

impl Default for Docnorm {
    fn default() -> Self {
        Self::new()
    }
}

/// A document opened through [`Docnorm`].
pub struct DocnormSession {
    /// The document being worked on
    pub document: Document,
    config: EngineConfig,
}

impl DocnormSession {
    /// Detected zones.
    pub fn zones(&self) -> ZoneSet {
        ZoneDetector::new(self.config.detector.clone()).detect(&self.document)
    }

    /// Scan the document as a master template.
    pub fn scan(&self) -> ScannedTemplate {
        Scanner::new(self.config.scan.clone()).scan(&self.document)
    }

    /// Apply a rule set.
    pub fn apply(&mut self, rules: &RuleSchema) -> Result<ApplyReport> {
        Formatter::new(self.config.detector.clone()).apply(&mut self.document, rules)
    }

    /// Copy geometry and font from a reference document.
    pub fn transfer_from(&mut self, reference: &Document) -> Result<TransferSummary> {
        StyleTransfer::new(self.config.transfer.clone()).transfer(&mut self.document, reference)
    }

    /// Save the document.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.document.save(path)
    }

    /// Serialize the document as DOCX bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.document.to_bytes()
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
