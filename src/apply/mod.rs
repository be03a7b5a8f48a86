//! Rule application.
//!
//! The formatter resolves every literal of a [`RuleSchema`] before it
//! touches the document, so a bad rule leaves the document exactly as it
//! was. Application then runs in a fixed order:
//!
//! 1. margins and page size on every section;
//! 2. global formatting on every paragraph outside the detected zones that
//!    is not itself a section marker;
//! 3. zone rules, in the order abstract, chapter headings, bibliography,
//!    table of contents.
//!
//! Applying the same schema twice yields the same document.

mod compiled;
mod warning;

pub use compiled::CompiledRules;
pub use warning::{Warning, WarningKind};

use crate::error::Result;
use crate::model::Document;
use crate::rules::RuleSchema;
use crate::zones::{DetectorOptions, ZoneDetector, ZoneKind, ZoneSet};
use compiled::CompiledZone;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of applying a schema to a document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// Non-fatal findings
    pub warnings: Vec<Warning>,

    /// Zones detected before formatting
    pub zones: ZoneSet,

    /// Paragraphs that received global formatting
    pub globally_formatted: usize,
}

/// Outcome of [`format_file`].
#[derive(Debug, Clone, Serialize)]
pub struct FormatResult {
    pub success: bool,
    pub warnings: Vec<Warning>,
    pub output_path: PathBuf,
}

/// Rule applicator.
#[derive(Default)]
pub struct Formatter {
    detector: ZoneDetector,
}

impl Formatter {
    /// Create a new formatter with the given detector options.
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            detector: ZoneDetector::new(options),
        }
    }

    /// Apply `schema` to `doc` in place.
    pub fn apply(&self, doc: &mut Document, schema: &RuleSchema) -> Result<ApplyReport> {
        let rules = CompiledRules::compile(schema)?;
        self.apply_compiled(doc, &rules)
    }

    /// Apply already compiled rules.
    pub fn apply_compiled(&self, doc: &mut Document, rules: &CompiledRules) -> Result<ApplyReport> {
        let zones = self.detector.detect(doc);
        let mut report = ApplyReport::default();

        for section in doc.sections_mut() {
            rules.apply_to_section(section)?;
        }

        if !rules.global.is_noop() {
            for (index, paragraph) in doc.paragraphs_mut().iter_mut().enumerate() {
                if zones.contains(index) || self.detector.is_section_marker(&paragraph.text()) {
                    continue;
                }
                rules.global.apply_to(paragraph);
                report.globally_formatted += 1;
            }
            log::debug!("Global formatting applied to {} paragraphs", report.globally_formatted);
        }

        for (kind, zone_rules) in &rules.zones {
            let members = zones.members(*kind);
            if !zones.has(*kind) {
                log::info!("Rules given for {} but no such zone was detected", kind);
                report.warnings.push(Warning::zone_not_found(*kind));
                continue;
            }
            apply_zone(doc, *kind, zone_rules, &members, &mut report);
        }

        report.zones = zones;
        Ok(report)
    }

    /// Load `input`, apply `schema` and save to `output`.
    pub fn format_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        schema: &RuleSchema,
        output: Q,
    ) -> Result<FormatResult> {
        let rules = CompiledRules::compile(schema)?;
        let mut doc = Document::open(input.as_ref())?;
        let report = self.apply_compiled(&mut doc, &rules)?;
        doc.save(output.as_ref())?;

        Ok(FormatResult {
            success: true,
            warnings: report.warnings,
            output_path: output.as_ref().to_path_buf(),
        })
    }
}

fn apply_zone(
    doc: &mut Document,
    kind: ZoneKind,
    rules: &CompiledZone,
    members: &[usize],
    report: &mut ApplyReport,
) {
    log::debug!("Formatting {} {} paragraph(s)", members.len(), kind);

    for &index in members {
        let Some(paragraph) = doc.paragraphs_mut().get_mut(index) else {
            continue;
        };
        rules.format.apply_to(paragraph);

        if let Some(transform) = rules.text_transform {
            for run in paragraph.runs_mut() {
                run.text = transform.apply(&run.text);
            }
        }
        if let Some(indent) = rules.indent_hanging {
            paragraph.format.left_indent = Some(indent);
            paragraph.format.first_line_indent = Some(-indent);
        }
    }

    if let Some(limit) = rules.max_words {
        let observed: usize = members
            .iter()
            .filter_map(|&i| doc.paragraph(i))
            .map(|p| p.word_count())
            .sum();
        if observed > limit {
            let warning = Warning::abstract_too_long(observed, limit);
            log::warn!("{}", warning);
            report.warnings.push(warning);
        }
    }
}

/// Apply a schema with the default detector.
pub fn apply(doc: &mut Document, schema: &RuleSchema) -> Result<ApplyReport> {
    Formatter::default().apply(doc, schema)
}

/// Format a file with the default detector.
pub fn format_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    schema: &RuleSchema,
    output: Q,
) -> Result<FormatResult> {
    Formatter::default().format_file(input, schema, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{Paragraph, Run};
    use crate::units::Length;

    fn doc(lines: &[&str]) -> Document {
        let mut doc = Document::new();
        for line in lines {
            doc.add_paragraph(Paragraph::with_text(*line));
        }
        doc
    }

    fn schema(json: &str) -> RuleSchema {
        RuleSchema::from_json(json).unwrap()
    }

    #[test]
    fn test_global_skips_zones_and_markers() {
        let mut d = doc(&["Judul skripsi", "ABSTRAK", "isi abstrak", "BAB I", "Latar belakang"]);
        let report = apply(&mut d, &schema(r#"{"global": {"font": {"name": "Times New Roman"}}}"#)).unwrap();

        let font = |i: usize| d.paragraphs()[i].runs()[0].format.font_name.clone();
        assert_eq!(font(0).as_deref(), Some("Times New Roman"));
        assert_eq!(font(1), None);
        assert_eq!(font(2), None);
        assert_eq!(font(3), None);
        assert_eq!(font(4).as_deref(), Some("Times New Roman"));
        assert_eq!(report.globally_formatted, 2);
    }

    #[test]
    fn test_abstract_too_long() {
        let mut lines = vec!["Abstrak"];
        lines.extend(std::iter::repeat("kata").take(150));
        let mut d = doc(&lines);

        let report = apply(
            &mut d,
            &schema(r#"{"sections": {"abstract": {"max_words": 100, "line_spacing": 1}}}"#),
        )
        .unwrap();

        assert_eq!(
            report.warnings,
            vec![Warning::abstract_too_long(150, 100)]
        );
        assert!(d.paragraphs()[1..].iter().all(|p| p.format.line_spacing == Some(1.0)));
        assert_eq!(d.paragraphs()[0].format.line_spacing, None);
    }

    #[test]
    fn test_chapter_uppercase_and_bold() {
        let mut d = Document::new();
        let mut heading = Paragraph::new();
        heading.add_run(Run::new("Bab Ii "));
        heading.add_run(Run::new("Metodologi"));
        d.add_paragraph(heading);

        apply(
            &mut d,
            &schema(r#"{"sections": {"chapter_headings": {"font_weight": "bold", "font_size": 14, "text_transform": "uppercase"}}}"#),
        )
        .unwrap();

        let p = &d.paragraphs()[0];
        assert_eq!(p.text(), "BAB II METODOLOGI");
        assert_eq!(p.runs().len(), 2);
        assert!(p.runs().iter().all(|r| r.format.bold));
        assert!(p.runs().iter().all(|r| r.format.font_size == Some(Length::from_pt(14.0))));
    }

    #[test]
    fn test_bibliography_hanging_indent() {
        let mut d = doc(&["Daftar Pustaka", "Smith, J. (2020). Judul."]);
        apply(&mut d, &schema(r#"{"sections": {"bibliography": {"indent_hanging": "1.27cm"}}}"#)).unwrap();

        let format = &d.paragraphs()[1].format;
        assert_eq!(format.left_indent, Some(Length::from_cm(1.27)));
        assert_eq!(format.first_line_indent, Some(-Length::from_cm(1.27)));
    }

    #[test]
    fn test_missing_zone_warns() {
        let mut d = doc(&["Pendahuluan"]);
        let report = apply(&mut d, &schema(r#"{"sections": {"table_of_contents": {"line_spacing": 1}}}"#)).unwrap();
        assert_eq!(report.warnings, vec![Warning::zone_not_found(ZoneKind::TableOfContents)]);
    }

    #[test]
    fn test_bad_rule_leaves_document_untouched() {
        let mut d = doc(&["Judul"]);
        let before = d.clone();
        let err = apply(
            &mut d,
            &schema(r#"{"global": {"font": {"name": "Arial"}, "margins": {"top": "4px"}}}"#),
        )
        .unwrap_err();

        assert!(matches!(err, Error::MissingInput { .. }));
        assert_eq!(d.paragraphs(), before.paragraphs());
        assert_eq!(d.sections(), before.sections());
    }

    #[test]
    fn test_paragraph_without_runs() {
        let mut d = Document::new();
        d.add_paragraph(Paragraph::new());
        apply(&mut d, &schema(r#"{"global": {"font": {"name": "Arial"}, "line_spacing": 2}}"#)).unwrap();
        assert_eq!(d.paragraphs()[0].format.line_spacing, Some(2.0));
        assert!(d.paragraphs()[0].runs().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let rules = schema(
            r#"{
                "global": {"margins": {"top": "4cm"}, "font": {"name": "Times New Roman", "size": 12}, "line_spacing": 1.5},
                "sections": {
                    "abstract": {"max_words": 3, "title_style": "italic"},
                    "chapter_headings": {"font_weight": "bold", "text_transform": "uppercase"},
                    "bibliography": {"indent_hanging": 1.27}
                }
            }"#,
        );
        let mut d = doc(&["Abstract", "one two three four", "Bab i pendahuluan", "text", "References", "ref"]);

        let first = apply(&mut d, &rules).unwrap();
        let once = d.clone();
        let second = apply(&mut d, &rules).unwrap();

        assert_eq!(d.paragraphs(), once.paragraphs());
        assert_eq!(d.sections(), once.sections());
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.zones, second.zones);
    }

    #[test]
    fn test_empty_document() {
        let mut d = Document::new();
        let report = apply(&mut d, &schema(r#"{"global": {"margins": {"top": 3}}, "sections": {"abstract": {"max_words": 10}}}"#)).unwrap();
        assert_eq!(d.first_section().margins().top, Length::from_cm(3.0));
        assert_eq!(report.warnings.len(), 1);
    }
}
