//! Document model → WordprocessingML.
//!
//! The writer never regenerates `document.xml`. It compares each element
//! with what the reader would extract from it and rewrites only the
//! attributes that differ, so untouched paragraphs stay byte-identical.

use super::reader::{self, SectionLocation, SINGLE_LINE};
use super::xml::{Element, Node, XmlDocument};
use crate::error::{Error, Result};
use crate::model::{Document, PageSection, Paragraph, ParagraphFormat, Run, RunFormat};
use crate::units::Length;

/// Child order of `w:pPr` (CT_PPrBase), as far as it matters for insertion.
const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];

/// Child order of `w:rPr` (CT_RPr).
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath",
];

/// Child order of `w:sectPr` (CT_SectPr).
const SECTPR_ORDER: &[&str] = &[
    "headerReference", "footerReference", "footnotePr", "endnotePr", "type", "pgSz", "pgMar",
    "paperSrc", "pgBorders", "lnNumType", "pgNumType", "cols", "formProt", "vAlign", "noEndnote",
    "titlePg", "textDirection", "bidi", "rtlGutter", "docGrid", "printerSettings", "sectPrChange",
];

/// Bring `tree` in line with `doc`.
pub(crate) fn sync_document(tree: &mut XmlDocument, doc: &Document) -> Result<()> {
    let body = tree
        .root
        .child_mut("body")
        .ok_or_else(|| Error::CorruptDocument("document has no body".into()))?;

    sync_paragraphs(body, doc.paragraphs())?;
    sync_sections(body, doc.sections())?;
    Ok(())
}

fn sync_paragraphs(body: &mut Element, paragraphs: &[Paragraph]) -> Result<()> {
    let indices = body.child_indices("p");
    if paragraphs.len() < indices.len() {
        log::warn!(
            "Model has {} paragraphs but the part has {}; extra paragraphs are left as-is",
            paragraphs.len(),
            indices.len()
        );
    }

    for (paragraph, &index) in paragraphs.iter().zip(&indices) {
        if let Some(p) = body.element_at_mut(index) {
            sync_paragraph(p, paragraph)?;
        }
    }

    for paragraph in paragraphs.iter().skip(indices.len()) {
        let mut p = Element::new(body.qualified("p"));
        sync_paragraph(&mut p, paragraph)?;
        let at = trailing_section_index(body).unwrap_or(body.children.len());
        body.children.insert(at, Node::Element(p));
    }
    Ok(())
}

/// Index of the body's final `w:sectPr`, which must stay the last child.
fn trailing_section_index(body: &Element) -> Option<usize> {
    body.children
        .iter()
        .rposition(|node| matches!(node, Node::Element(_)))
        .filter(|&i| matches!(&body.children[i], Node::Element(el) if el.is("sectPr")))
}

fn sync_paragraph(p: &mut Element, paragraph: &Paragraph) -> Result<()> {
    sync_paragraph_format(p, &paragraph.format)?;

    let indices = p.child_indices("r");
    for (run, &index) in paragraph.runs().iter().zip(&indices) {
        if let Some(r) = p.element_at_mut(index) {
            sync_run(r, run)?;
        }
    }
    for run in paragraph.runs().iter().skip(indices.len()) {
        let mut r = Element::new(p.qualified("r"));
        sync_run(&mut r, run)?;
        p.children.push(Node::Element(r));
    }
    Ok(())
}

fn twips(value: Option<Length>) -> Option<i64> {
    value.map(Length::twips)
}

fn line_value(spacing: Option<f64>) -> Option<i64> {
    spacing.map(|s| (s * SINGLE_LINE).round() as i64)
}

fn sync_paragraph_format(p: &mut Element, format: &ParagraphFormat) -> Result<()> {
    let current = reader::read_paragraph_format(p)?;

    let line_changed = line_value(current.line_spacing) != line_value(format.line_spacing);
    let before_changed = twips(current.space_before) != twips(format.space_before);
    let after_changed = twips(current.space_after) != twips(format.space_after);
    let left_changed = twips(current.left_indent) != twips(format.left_indent);
    let first_changed = twips(current.first_line_indent) != twips(format.first_line_indent);

    if line_changed || before_changed || after_changed {
        let spacing = p.ensure_first_child("pPr").ensure_child("spacing", PPR_ORDER);
        if line_changed {
            match line_value(format.line_spacing) {
                Some(line) => {
                    spacing.set_attr("line", line.to_string());
                    spacing.set_attr("lineRule", "auto");
                }
                None => {
                    spacing.remove_attr("line");
                    spacing.remove_attr("lineRule");
                }
            }
        }
        if before_changed {
            set_twips(spacing, "before", format.space_before);
            spacing.remove_attr("beforeAutospacing");
        }
        if after_changed {
            set_twips(spacing, "after", format.space_after);
            spacing.remove_attr("afterAutospacing");
        }
    }

    if left_changed || first_changed {
        let ind = p.ensure_first_child("pPr").ensure_child("ind", PPR_ORDER);
        if left_changed {
            ind.remove_attr("start");
            set_twips(ind, "left", format.left_indent);
        }
        if first_changed {
            ind.remove_attr("firstLine");
            ind.remove_attr("hanging");
            match format.first_line_indent {
                Some(indent) if indent.emu() < 0 => {
                    ind.set_attr("hanging", indent.abs().twips().to_string())
                }
                Some(indent) => ind.set_attr("firstLine", indent.twips().to_string()),
                None => {}
            }
        }
    }
    Ok(())
}

fn set_twips(el: &mut Element, local: &str, value: Option<Length>) {
    match value {
        Some(length) => el.set_attr(local, length.twips().to_string()),
        None => el.remove_attr(local),
    }
}

fn sync_run(r: &mut Element, run: &Run) -> Result<()> {
    let current = reader::read_run_format(r)?;
    if current != run.format {
        sync_run_format(r, &current, &run.format);
    }
    if reader::run_text(r) != run.text {
        set_run_text(r, &run.text);
    }
    Ok(())
}

fn sync_run_format(r: &mut Element, current: &RunFormat, format: &RunFormat) {
    let rpr = r.ensure_first_child("rPr");

    if current.font_name != format.font_name {
        match &format.font_name {
            Some(name) => {
                let fonts = rpr.ensure_child("rFonts", RPR_ORDER);
                for theme in ["asciiTheme", "hAnsiTheme", "cstheme"] {
                    fonts.remove_attr(theme);
                }
                for slot in ["ascii", "hAnsi", "cs"] {
                    fonts.set_attr(slot, name.as_str());
                }
            }
            None => {
                if let Some(fonts) = rpr.child_mut("rFonts") {
                    fonts.remove_attr("ascii");
                    fonts.remove_attr("hAnsi");
                }
            }
        }
    }

    if current.font_size.map(Length::half_points) != format.font_size.map(Length::half_points) {
        match format.font_size {
            Some(size) => {
                let half_points = size.half_points().to_string();
                rpr.ensure_child("sz", RPR_ORDER)
                    .set_attr("val", half_points.as_str());
                rpr.ensure_child("szCs", RPR_ORDER)
                    .set_attr("val", half_points);
            }
            None => {
                rpr.remove_children("sz");
                rpr.remove_children("szCs");
            }
        }
    }

    if current.bold != format.bold {
        set_toggle(rpr, "b", format.bold);
    }
    if current.italic != format.italic {
        set_toggle(rpr, "i", format.italic);
    }
}

fn set_toggle(rpr: &mut Element, local: &str, on: bool) {
    if on {
        rpr.ensure_child(local, RPR_ORDER).remove_attr("val");
    } else {
        rpr.remove_children(local);
    }
}

/// Replace a run's text. Each `w:t` piece keeps its own share of the text,
/// so tabs and breaks between pieces stay where they are.
fn set_run_text(r: &mut Element, text: &str) {
    let pieces = r.child_indices("t");
    if pieces.is_empty() {
        if !text.is_empty() {
            let mut t = Element::new(r.qualified("t"));
            t.set_raw_attr("xml:space", "preserve");
            t.set_text(text);
            r.children.push(Node::Element(t));
        }
        return;
    }

    let current: Vec<String> = pieces
        .iter()
        .filter_map(|&index| r.element_at(index))
        .map(Element::text)
        .collect();

    match split_like(&current, text) {
        Some(parts) => {
            for (&index, part) in pieces.iter().zip(parts) {
                if let Some(t) = r.element_at_mut(index) {
                    if t.text() != part {
                        t.set_raw_attr("xml:space", "preserve");
                        t.set_text(&part);
                    }
                }
            }
        }
        None => {
            // Text no longer lines up with the pieces; keep it in the first one
            log::debug!("Run text changed shape, merging {} text pieces", pieces.len());
            for &index in pieces[1..].iter().rev() {
                r.children.remove(index);
            }
            if let Some(t) = r.element_at_mut(pieces[0]) {
                t.set_raw_attr("xml:space", "preserve");
                t.set_text(text);
            }
        }
    }
}

/// Cut `text` into one part per existing piece. Case mappings are applied
/// piece by piece; otherwise the parts follow the old character counts.
fn split_like(current: &[String], text: &str) -> Option<Vec<String>> {
    if current.len() == 1 {
        return Some(vec![text.to_string()]);
    }

    let mappings: [fn(&str) -> String; 2] = [str::to_uppercase, str::to_lowercase];
    for map in mappings {
        let mapped: Vec<String> = current.iter().map(|piece| map(piece)).collect();
        if mapped.concat() == text {
            return Some(mapped);
        }
    }

    let counts: Vec<usize> = current.iter().map(|piece| piece.chars().count()).collect();
    if counts.iter().sum::<usize>() != text.chars().count() {
        return None;
    }
    let mut chars = text.chars();
    Some(
        counts
            .iter()
            .map(|&count| chars.by_ref().take(count).collect())
            .collect(),
    )
}

fn sync_sections(body: &mut Element, sections: &[PageSection]) -> Result<()> {
    let mut locations = reader::section_locations(body);
    if locations.is_empty() {
        if sections.first() == Some(&PageSection::letter()) {
            return Ok(());
        }
        body.children.push(Node::Element(Element::new(body.qualified("sectPr"))));
        locations.push(SectionLocation::Body(body.children.len() - 1));
    }

    if locations.len() != sections.len() {
        return Err(Error::Other(format!(
            "document has {} sections but the model has {}",
            locations.len(),
            sections.len()
        )));
    }

    for (section, location) in sections.iter().zip(locations) {
        if let Some(sect) = section_element_mut(body, location) {
            sync_section(sect, section)?;
        }
    }
    Ok(())
}

fn section_element_mut(body: &mut Element, location: SectionLocation) -> Option<&mut Element> {
    match location {
        SectionLocation::InParagraph(i) => body
            .element_at_mut(i)?
            .child_mut("pPr")?
            .child_mut("sectPr"),
        SectionLocation::Body(i) => body.element_at_mut(i),
    }
}

fn sync_section(sect: &mut Element, section: &PageSection) -> Result<()> {
    let (margins, width, height) = reader::section_geometry(sect)?;

    if width.twips() != section.page_width().twips() || height.twips() != section.page_height().twips()
    {
        let pg_sz = sect.ensure_child("pgSz", SECTPR_ORDER);
        pg_sz.set_attr("w", section.page_width().twips().to_string());
        pg_sz.set_attr("h", section.page_height().twips().to_string());
    }

    let target = section.margins();
    let pairs = [
        ("top", margins.top, target.top),
        ("bottom", margins.bottom, target.bottom),
        ("left", margins.left, target.left),
        ("right", margins.right, target.right),
    ];
    if pairs.iter().any(|(_, now, want)| now.twips() != want.twips()) {
        let pg_mar = sect.ensure_child("pgMar", SECTPR_ORDER);
        for (name, _, want) in pairs {
            pg_mar.set_attr(name, want.twips().to_string());
        }
        // header, footer and gutter are required attributes of a fresh pgMar
        for (name, default) in [("header", "720"), ("footer", "720"), ("gutter", "0")] {
            if pg_mar.attr(name).is_none() {
                pg_mar.set_attr(name, default);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Margins;

    fn tree(body: &str) -> XmlDocument {
        XmlDocument::parse(&format!(
            r#"<w:document xmlns:w="urn:w"><w:body>{}</w:body></w:document>"#,
            body
        ))
        .unwrap()
    }

    fn serialized(tree: &XmlDocument) -> String {
        String::from_utf8(tree.to_bytes().unwrap()).unwrap()
    }

    fn read_back(tree: &XmlDocument) -> Document {
        let (paragraphs, sections) = reader::read_document(tree).unwrap();
        let mut doc = Document::new();
        for p in paragraphs {
            doc.add_paragraph(p);
        }
        doc.sections_mut()[0] = sections[0].clone();
        doc
    }

    #[test]
    fn test_unchanged_model_is_byte_identical() {
        let mut xml = tree(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:rFonts w:ascii="Arial"/></w:rPr><w:t>Judul</w:t></w:r></w:p><w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:bottom="1440" w:left="1440" w:right="1440"/></w:sectPr>"#,
        );
        let before = serialized(&xml);
        let doc = read_back(&xml);
        sync_document(&mut xml, &doc).unwrap();
        assert_eq!(serialized(&xml), before);
    }

    #[test]
    fn test_paragraph_format_written_in_schema_order() {
        let mut xml = tree(r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:jc w:val="both"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#);
        let mut doc = read_back(&xml);
        let format = &mut doc.paragraphs_mut()[0].format;
        format.line_spacing = Some(1.5);
        format.left_indent = Some(Length::from_cm(1.27));
        format.first_line_indent = Some(-Length::from_cm(1.27));
        sync_document(&mut xml, &doc).unwrap();

        let out = serialized(&xml);
        let style = out.find("w:pStyle").unwrap();
        let spacing = out.find("w:spacing").unwrap();
        let ind = out.find("w:ind").unwrap();
        let jc = out.find("w:jc").unwrap();
        assert!(style < spacing && spacing < ind && ind < jc);
        assert!(out.contains(r#"w:line="360""#));
        assert!(out.contains(r#"w:hanging="720""#));

        let reread = read_back(&xml);
        assert_eq!(reread.paragraphs()[0].format.line_spacing, Some(1.5));
    }

    #[test]
    fn test_run_format_and_text() {
        let mut xml = tree(
            r#"<w:p><w:r><w:rPr><w:rFonts w:asciiTheme="minorHAnsi"/><w:i/></w:rPr><w:t>Bab </w:t><w:tab/><w:t>ii</w:t></w:r></w:p>"#,
        );
        let mut doc = read_back(&xml);
        let run = &mut doc.paragraphs_mut()[0].runs_mut()[0];
        run.format.font_name = Some("Times New Roman".into());
        run.format.font_size = Some(Length::from_pt(14.0));
        run.format.bold = true;
        run.format.italic = false;
        run.text = run.text.to_uppercase();
        sync_document(&mut xml, &doc).unwrap();

        let out = serialized(&xml);
        assert!(!out.contains("asciiTheme"));
        assert!(out.contains(r#"w:sz w:val="28""#));
        assert!(out.contains(r#"BAB </w:t><w:tab/><w:t xml:space="preserve">II</w:t>"#));

        let reread = read_back(&xml);
        let run = &reread.paragraphs()[0].runs()[0];
        assert_eq!(run.text, "BAB II");
        assert_eq!(run.format.font_name.as_deref(), Some("Times New Roman"));
        assert!(run.format.bold);
        assert!(!run.format.italic);
    }

    #[test]
    fn test_run_text_keeps_piece_boundaries() {
        let mut xml = tree(
            r#"<w:p><w:r><w:t>ab</w:t><w:br/><w:t>cd</w:t></w:r><w:r><w:t>Bab</w:t><w:tab/><w:t>Satu</w:t></w:r></w:p>"#,
        );
        let mut doc = read_back(&xml);
        doc.paragraphs_mut()[0].runs_mut()[0].text = "wxyz".into();
        doc.paragraphs_mut()[0].runs_mut()[1].text = "bab satu dua".into();
        sync_document(&mut xml, &doc).unwrap();

        let out = serialized(&xml);
        assert!(out.contains(r#"wx</w:t><w:br/><w:t xml:space="preserve">yz</w:t>"#));
        // Text of a different length cannot be split, so it lands in the first piece
        assert!(out.contains(r#"<w:t xml:space="preserve">bab satu dua</w:t><w:tab/></w:r>"#));

        let reread = read_back(&xml);
        assert_eq!(reread.paragraphs()[0].runs()[0].text, "wxyz");
        assert_eq!(reread.paragraphs()[0].runs()[1].text, "bab satu dua");
    }

    #[test]
    fn test_split_like_maps_case_per_piece() {
        let pieces = vec!["Straße ".to_string(), "i".to_string()];
        assert_eq!(
            split_like(&pieces, "STRASSE I"),
            Some(vec!["STRASSE ".to_string(), "I".to_string()])
        );
        assert_eq!(
            split_like(&pieces, "straße i"),
            Some(vec!["straße ".to_string(), "i".to_string()])
        );
        assert_eq!(split_like(&pieces, "x"), None);
    }

    #[test]
    fn test_new_paragraphs_go_before_trailing_section() {
        let mut xml = tree(r#"<w:sectPr/>"#);
        let mut doc = read_back(&xml);
        doc.add_paragraph(Paragraph::with_text("appended"));
        sync_document(&mut xml, &doc).unwrap();

        let body = xml.root.child("body").unwrap();
        let names: Vec<_> = body.elements().map(|e| e.local_name().to_string()).collect();
        assert_eq!(names, vec!["p", "sectPr"]);
        assert_eq!(reader::read_document(&xml).unwrap().0[0].text(), "appended");
    }

    #[test]
    fn test_section_margins_only_touch_margins() {
        let mut xml = tree(
            r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
        );
        let mut doc = read_back(&xml);
        doc.sections_mut()[0]
            .set_margins(Margins::from_cm(4.0, 3.0, 4.0, 3.0))
            .unwrap();
        sync_document(&mut xml, &doc).unwrap();

        let out = serialized(&xml);
        assert!(out.contains(r#"w:top="2268""#));
        assert!(out.contains(r#"w:right="1701""#));
        assert!(out.contains(r#"w:header="708""#));
        assert!(out.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
    }

    #[test]
    fn test_missing_section_is_created_when_needed() {
        let mut xml = tree(r#"<w:p/>"#);
        let mut doc = read_back(&xml);
        doc.sections_mut()[0] = PageSection::a4();
        sync_document(&mut xml, &doc).unwrap();

        let out = serialized(&xml);
        assert!(out.contains(r#"w:w="11906""#));
        assert!(out.ends_with("</w:sectPr></w:body></w:document>"));
    }
}
