//! Shared DOCX fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

pub const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style></w:styles>"#;

/// Bytes of a tiny PNG-like media part, stored uncompressed.
pub const MEDIA: &[u8] = b"\x89PNG\r\n\x1a\n-not-really-an-image-";

/// A section with the given margins in twips (top, bottom, left, right) on A4.
pub fn a4_section(top: u32, bottom: u32, left: u32, right: u32) -> String {
    format!(
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="708" w:footer="708" w:gutter="0"/><w:cols w:space="708"/></w:sectPr>"#,
        top, right, bottom, left
    )
}

/// A paragraph with one run per text, all in `font` when given.
pub fn paragraph(texts: &[&str], font: Option<&str>) -> String {
    let mut xml = String::from("<w:p>");
    for text in texts {
        xml.push_str("<w:r>");
        if let Some(font) = font {
            xml.push_str(&format!(
                r#"<w:rPr><w:rFonts w:ascii="{0}" w:hAnsi="{0}"/></w:rPr>"#,
                font
            ));
        }
        xml.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t></w:r>"#, text));
    }
    xml.push_str("</w:p>");
    xml
}

/// Wrap body content in a `w:document`.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml"><w:body>{}</w:body></w:document>"#,
        W_NS, body
    )
}

/// Build a DOCX package around `document`, with styles, core properties and a stored media part.
pub fn build_docx(document: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let parts: [(&str, &[u8], SimpleFileOptions); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes(), deflated),
        ("_rels/.rels", ROOT_RELS.as_bytes(), deflated),
        ("word/document.xml", document.as_bytes(), deflated),
        ("word/styles.xml", STYLES.as_bytes(), deflated),
        ("docProps/core.xml", b"<cp:coreProperties xmlns:cp=\"urn:cp\"><cp:title>Skripsi</cp:title></cp:coreProperties>", deflated),
        ("word/media/image1.png", MEDIA, stored),
    ];
    for (name, data, options) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Write a fixture to `dir/name` and return its path.
pub fn write_docx(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_docx(&document_xml(body))).unwrap();
    path
}

/// Names of the entries of a ZIP container, in order.
pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Contents and compression method of one entry.
pub fn read_entry(bytes: &[u8], name: &str) -> (Vec<u8>, CompressionMethod) {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    (buf, file.compression())
}

/// The main document part as a string.
pub fn main_xml(bytes: &[u8]) -> String {
    String::from_utf8(read_entry(bytes, "word/document.xml").0).unwrap()
}
