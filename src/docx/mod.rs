//! DOCX package I/O.
//!
//! A DOCX file is a ZIP container; the only part docnorm interprets is the
//! main document part (normally `word/document.xml`). Every other entry is
//! carried through a load/save cycle byte-for-byte, in its original order
//! and with its original compression method.

mod reader;
mod writer;
pub(crate) mod xml;

use crate::error::{Error, Result};
use crate::model::Document;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use xml::XmlDocument;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Fallback location of the main document part.
pub(crate) const DEFAULT_MAIN_PART: &str = "word/document.xml";

const ROOT_RELS: &str = "_rels/.rels";
const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// ZIP local file header and empty-archive signatures.
const ZIP_MAGIC: [&[u8]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOC: usize = 1 << 20;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    stored: bool,
    is_dir: bool,
}

/// The raw entries of a DOCX package.
#[derive(Debug, Clone)]
pub struct Package {
    entries: Vec<Entry>,
    main_part: String,
}

impl Package {
    /// Read every entry of a ZIP container.
    pub(crate) fn from_bytes(data: &[u8]) -> Result<Self> {
        if !is_zip(data) {
            return Err(Error::CorruptDocument("not a ZIP container".into()));
        }

        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut buf = Vec::with_capacity(prealloc_size(file.size()));
            file.read_to_end(&mut buf)?;
            entries.push(Entry {
                name: file.name().to_string(),
                stored: file.compression() == CompressionMethod::Stored,
                is_dir: file.is_dir(),
                data: buf,
            });
        }

        let mut package = Self {
            entries,
            main_part: DEFAULT_MAIN_PART.to_string(),
        };
        package.main_part = package.resolve_main_part();
        if package.entry(&package.main_part).is_none() {
            return Err(Error::CorruptDocument(format!(
                "missing main document part {}",
                package.main_part
            )));
        }
        Ok(package)
    }

    /// A minimal package: one empty A4 section with 2.54 cm margins.
    pub(crate) fn blank() -> Self {
        let file = |name: &str, data: &str| Entry {
            name: name.to_string(),
            data: data.as_bytes().to_vec(),
            stored: false,
            is_dir: false,
        };
        Self {
            entries: vec![
                file("[Content_Types].xml", BLANK_CONTENT_TYPES),
                file(ROOT_RELS, BLANK_RELS),
                file(DEFAULT_MAIN_PART, BLANK_DOCUMENT),
            ],
            main_part: DEFAULT_MAIN_PART.to_string(),
        }
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Number of entries in the container.
    pub fn part_count(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn resolve_main_part(&self) -> String {
        let target = self
            .entry(ROOT_RELS)
            .and_then(|rels| std::str::from_utf8(&rels.data).ok())
            .and_then(|text| XmlDocument::parse(text).ok())
            .and_then(|tree| {
                tree.root
                    .elements()
                    .filter(|el| el.is("Relationship"))
                    .find(|el| el.attr("Type") == Some(OFFICE_DOCUMENT_REL))
                    .and_then(|el| el.attr("Target"))
                    .map(|target| target.trim_start_matches('/').to_string())
            });
        target.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
    }

    /// Parse the main document part.
    pub(crate) fn main_tree(&self) -> Result<XmlDocument> {
        let entry = self
            .entry(&self.main_part)
            .ok_or_else(|| Error::CorruptDocument(format!("missing {}", self.main_part)))?;
        let text = std::str::from_utf8(&entry.data)
            .map_err(|_| Error::CorruptDocument(format!("{} is not UTF-8", self.main_part)))?;
        XmlDocument::parse(text.trim_start_matches('\u{feff}'))
    }

    /// Write the container, replacing the main part with `main_xml`.
    fn write(&self, main_xml: &[u8]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let method = if entry.stored {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)?;
            if entry.name == self.main_part {
                zip.write_all(main_xml)?;
            } else {
                zip.write_all(&entry.data)?;
            }
        }
        Ok(zip.finish()?.into_inner())
    }
}

/// Check for a ZIP signature.
pub(crate) fn is_zip(data: &[u8]) -> bool {
    ZIP_MAGIC.iter().any(|magic| data.starts_with(magic))
}

/// Load a DOCX file into the document model.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    log::debug!("Loading {}", path.display());
    let data = std::fs::read(path)?;
    from_bytes(&data)
}

/// Parse DOCX bytes into the document model.
pub fn from_bytes(data: &[u8]) -> Result<Document> {
    let package = Package::from_bytes(data)?;
    let tree = package.main_tree()?;
    let (paragraphs, sections) = reader::read_document(&tree)?;
    Ok(Document::from_parts(paragraphs, sections, package))
}

/// Serialize a document as DOCX bytes.
///
/// A loaded document is written over its source package; a document built
/// in memory starts from a blank package.
pub fn to_bytes(doc: &Document) -> Result<Vec<u8>> {
    let blank;
    let package = match doc.package() {
        Some(package) => package,
        None => {
            blank = Package::blank();
            &blank
        }
    };

    let mut tree = package.main_tree()?;
    writer::sync_document(&mut tree, doc)?;
    package.write(&tree.to_bytes()?)
}

/// Save a document to `path`.
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `path`, so a failed save never leaves a partial file.
pub fn save<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(doc)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

const BLANK_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const BLANK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const BLANK_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

/// Capacity to reserve for an entry. The declared size comes from the
/// archive header and is only a hint; `read_to_end` grows past it.
fn prealloc_size(declared: u64) -> usize {
    usize::try_from(declared).unwrap_or(usize::MAX).min(MAX_PREALLOC)
}
