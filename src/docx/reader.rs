//! WordprocessingML → document model.
//!
//! Every function here is also used by the writer to read back the current
//! state of an element, so that only attributes the model changed are
//! rewritten.

use super::xml::{Element, Node, XmlDocument};
use crate::error::{Error, Result};
use crate::model::{Margins, PageSection, Paragraph, ParagraphFormat, Run, RunFormat};
use crate::units::Length;

/// `w:line` value for single spacing with `w:lineRule="auto"`.
pub(crate) const SINGLE_LINE: f64 = 240.0;

/// Where a `w:sectPr` sits relative to the body's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionLocation {
    /// Inside `w:pPr` of the paragraph at this body child index
    InParagraph(usize),
    /// Direct child of the body at this index
    Body(usize),
}

/// Read paragraphs and sections from a parsed `document.xml`.
pub(crate) fn read_document(tree: &XmlDocument) -> Result<(Vec<Paragraph>, Vec<PageSection>)> {
    let body = body(&tree.root)?;

    let paragraphs: Vec<Paragraph> = body
        .elements()
        .filter(|el| el.is("p"))
        .map(read_paragraph)
        .collect::<Result<_>>()?;

    let mut sections = Vec::new();
    for (i, location) in section_locations(body).into_iter().enumerate() {
        let sect = section_element(body, location)
            .ok_or_else(|| Error::CorruptDocument("section properties vanished".into()))?;
        let (margins, width, height) = section_geometry(sect)?;
        let section = PageSection::new(margins, width, height)
            .map_err(|e| Error::CorruptDocument(format!("section {}: {}", i + 1, e)))?;
        sections.push(section);
    }
    if sections.is_empty() {
        log::debug!("Document has no section properties, using Word defaults");
        sections.push(PageSection::letter());
    }

    log::debug!(
        "Read {} paragraphs and {} sections",
        paragraphs.len(),
        sections.len()
    );
    Ok((paragraphs, sections))
}

pub(crate) fn body(root: &Element) -> Result<&Element> {
    if !root.is("document") {
        return Err(Error::CorruptDocument(format!(
            "unexpected root element <{}>",
            root.name
        )));
    }
    root.child("body")
        .ok_or_else(|| Error::CorruptDocument("document has no body".into()))
}

/// Locations of every `w:sectPr` in document order.
pub(crate) fn section_locations(body: &Element) -> Vec<SectionLocation> {
    let mut locations = Vec::new();
    for (i, node) in body.children.iter().enumerate() {
        let Node::Element(el) = node else {
            continue;
        };
        if el.is("p") {
            if el.child("pPr").and_then(|ppr| ppr.child("sectPr")).is_some() {
                locations.push(SectionLocation::InParagraph(i));
            }
        } else if el.is("sectPr") {
            locations.push(SectionLocation::Body(i));
        }
    }
    locations
}

pub(crate) fn section_element(body: &Element, location: SectionLocation) -> Option<&Element> {
    match location {
        SectionLocation::InParagraph(i) => body.element_at(i)?.child("pPr")?.child("sectPr"),
        SectionLocation::Body(i) => body.element_at(i),
    }
}

/// Margins and page size of a `w:sectPr`, defaulting missing values to
/// Word's Letter geometry.
pub(crate) fn section_geometry(sect: &Element) -> Result<(Margins, Length, Length)> {
    let defaults = PageSection::letter();
    let d = defaults.margins();

    let pg_sz = sect.child("pgSz");
    let size = |name: &str, fallback: Length| -> Result<Length> {
        Ok(match pg_sz {
            Some(n) => twips_attr(n, name)?.unwrap_or(fallback),
            None => fallback,
        })
    };
    let width = size("w", defaults.page_width())?;
    let height = size("h", defaults.page_height())?;

    let pg_mar = sect.child("pgMar");
    let margin = |name: &str, fallback: Length| -> Result<Length> {
        Ok(match pg_mar {
            Some(n) => twips_attr(n, name)?.unwrap_or(fallback),
            None => fallback,
        })
    };
    let margins = Margins::new(
        margin("top", d.top)?,
        margin("bottom", d.bottom)?,
        margin("left", d.left)?,
        margin("right", d.right)?,
    );

    Ok((margins, width, height))
}

pub(crate) fn read_paragraph(p: &Element) -> Result<Paragraph> {
    let runs = p
        .elements()
        .filter(|el| el.is("r"))
        .map(read_run)
        .collect::<Result<_>>()?;
    Ok(Paragraph::from_parts(runs, read_paragraph_format(p)?))
}

pub(crate) fn read_paragraph_format(p: &Element) -> Result<ParagraphFormat> {
    let mut format = ParagraphFormat::default();
    let Some(ppr) = p.child("pPr") else {
        return Ok(format);
    };

    if let Some(spacing) = ppr.child("spacing") {
        let auto_rule = spacing.attr("lineRule").map_or(true, |rule| rule == "auto");
        if auto_rule {
            format.line_spacing = int_attr(spacing, "line")?.map(|line| line as f64 / SINGLE_LINE);
        }
        format.space_before = twips_attr(spacing, "before")?;
        format.space_after = twips_attr(spacing, "after")?;
    }

    if let Some(ind) = ppr.child("ind") {
        format.left_indent = match twips_attr(ind, "left")? {
            Some(left) => Some(left),
            None => twips_attr(ind, "start")?,
        };
        format.first_line_indent = match twips_attr(ind, "hanging")? {
            Some(hanging) => Some(-hanging),
            None => twips_attr(ind, "firstLine")?,
        };
    }

    Ok(format)
}

pub(crate) fn read_run(r: &Element) -> Result<Run> {
    Ok(Run {
        text: run_text(r),
        format: read_run_format(r)?,
    })
}

/// Concatenated `w:t` content of a run.
pub(crate) fn run_text(r: &Element) -> String {
    r.elements()
        .filter(|el| el.is("t"))
        .map(|t| t.text())
        .collect()
}

pub(crate) fn read_run_format(r: &Element) -> Result<RunFormat> {
    let mut format = RunFormat::default();
    let Some(rpr) = r.child("rPr") else {
        return Ok(format);
    };

    format.font_name = rpr
        .child("rFonts")
        .and_then(|fonts| fonts.attr("ascii").or_else(|| fonts.attr("hAnsi")))
        .map(str::to_string);
    if let Some(sz) = rpr.child("sz") {
        format.font_size = match int_attr(sz, "val")? {
            Some(half_points) => Some(
                Length::from_half_points(half_points).ok_or_else(|| out_of_range(sz, "val"))?,
            ),
            None => None,
        };
    }
    format.bold = toggle(rpr, "b");
    format.italic = toggle(rpr, "i");

    Ok(format)
}

/// An on/off property: present and not explicitly switched off.
fn toggle(rpr: &Element, local: &str) -> bool {
    rpr.child(local)
        .map(|el| !matches!(el.attr("val"), Some("0" | "false" | "off")))
        .unwrap_or(false)
}

/// A numeric attribute. Absent or non-numeric values read as `None`; numbers
/// no length could hold are a corrupt document.
fn int_attr(el: &Element, local: &str) -> Result<Option<i64>> {
    let Some(raw) = el.attr(local).map(str::trim) else {
        return Ok(None);
    };
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Some(value));
    }
    match raw.parse::<f64>() {
        Ok(value) if !value.is_finite() || value.abs() >= i64::MAX as f64 => {
            Err(out_of_range(el, local))
        }
        Ok(value) => Ok(Some(value.round() as i64)),
        Err(_) => Ok(None),
    }
}

fn twips_attr(el: &Element, local: &str) -> Result<Option<Length>> {
    match int_attr(el, local)? {
        Some(twips) => Length::from_twips(twips)
            .map(Some)
            .ok_or_else(|| out_of_range(el, local)),
        None => Ok(None),
    }
}

fn out_of_range(el: &Element, local: &str) -> Error {
    Error::CorruptDocument(format!(
        "<{}> attribute {} is out of range: {}",
        el.name,
        local,
        el.attr(local).unwrap_or_default()
    ))
}
