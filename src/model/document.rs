//! Document-level types.

use super::{PageSection, Paragraph};
use crate::docx::{self, Package};
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// A word-processing document.
///
/// Paragraphs can be appended but not removed or reordered, and the
/// section count is fixed once the document exists; identity of both is
/// their position. A loaded document keeps its source package so that
/// saving rewrites only the attributes the model changed.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    paragraphs: Vec<Paragraph>,

    sections: Vec<PageSection>,

    #[serde(skip)]
    package: Option<Package>,
}

impl Document {
    /// Create a new empty document with a single A4 section.
    pub fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
            sections: vec![PageSection::default()],
            package: None,
        }
    }

    pub(crate) fn from_parts(
        paragraphs: Vec<Paragraph>,
        sections: Vec<PageSection>,
        package: Package,
    ) -> Self {
        Self {
            paragraphs,
            sections,
            package: Some(package),
        }
    }

    pub(crate) fn package(&self) -> Option<&Package> {
        self.package.as_ref()
    }

    /// Load a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        docx::load(path)
    }

    /// Parse a DOCX package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        docx::from_bytes(data)
    }

    /// Save as DOCX, atomically replacing `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        docx::save(self, path)
    }

    /// Serialize as DOCX bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        docx::to_bytes(self)
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Mutable access to the paragraphs.
    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    /// Get a paragraph by index.
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    /// Append a paragraph at the end of the body.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Check if the document has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Page sections in document order. Never empty.
    pub fn sections(&self) -> &[PageSection] {
        &self.sections
    }

    /// Mutable access to the page sections.
    pub fn sections_mut(&mut self) -> &mut [PageSection] {
        &mut self.sections
    }

    /// The first page section.
    pub fn first_section(&self) -> &PageSection {
        &self.sections[0]
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.first_section(), &PageSection::a4());
    }

    #[test]
    fn test_plain_text() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("Abstrak"));
        doc.add_paragraph(Paragraph::with_text("Isi"));
        assert_eq!(doc.plain_text(), "Abstrak\nIsi");
        assert_eq!(doc.paragraph_count(), 2);
    }
}
