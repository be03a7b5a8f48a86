//! DOCX format detection and validation.

use crate::docx::{self, Package};
use crate::error::{Error, Result};
use std::path::Path;

/// DOCX package information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Name of the main document part (e.g. "word/document.xml")
    pub main_part: String,
    /// Number of entries in the ZIP container
    pub part_count: usize,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOCX ({}, {} parts)", self.main_part, self.part_count)
    }
}

/// Detect a DOCX package from a file path.
///
/// # Example
/// ```no_run
/// use docnorm::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("thesis.docx").unwrap();
/// println!("Main part: {}", format.main_part);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let data = std::fs::read(path)?;
    detect_format_from_bytes(&data)
}

/// Detect a DOCX package from its bytes.
///
/// # Returns
/// * `Ok(DocxFormat)` if the data is a ZIP container with a main document part
/// * `Err(Error::CorruptDocument)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !docx::is_zip(data) {
        return Err(Error::CorruptDocument("not a ZIP container".into()));
    }

    let package = Package::from_bytes(data)?;
    Ok(DocxFormat {
        main_part: package.main_part().to_string(),
        part_count: package.part_count(),
    })
}

/// Check if a file is a readable DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes are a readable DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
