//! Rule extraction from a reference ("master") document.

use crate::error::Result;
use crate::model::Document;
use crate::rules::{FontRule, GlobalRules, MarginRules, RuleSchema};
use crate::units::SizeValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Font used when the reference has no explicit run fonts.
pub const DEFAULT_FONT: &str = "Times New Roman";

/// Options for the scanner.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of leading paragraphs sampled for the dominant font
    pub sample_paragraphs: usize,

    /// Font reported when no run in the sample names one
    pub fallback_font: String,

    /// Category label copied into the result
    pub category: Option<String>,
}

impl ScanOptions {
    /// Create new scan options with defaults.
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

    /// Set the category label.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            sample_paragraphs: 10,
            fallback_font: DEFAULT_FONT.to_string(),
            category: None,
        }
    }
}

/// Margins of the first section, in centimeters rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScannedMargins {
    pub top_cm: f64,
    pub bottom_cm: f64,
    pub left_cm: f64,
    pub right_cm: f64,
}

/// The dominant font of the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedFont {
    pub name: String,

    /// Set when no run named a font and the fallback was used
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

/// Rules derived from a reference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedTemplate {
    pub margin: ScannedMargins,

    pub font: ScannedFont,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ScannedTemplate {
    /// A rule schema setting only global margins and font.
    pub fn to_schema(&self) -> RuleSchema {
        let cm = |v: f64| Some(SizeValue::Number(v));
        let mut global = GlobalRules {
            margins: Some(MarginRules {
                top: cm(self.margin.top_cm),
                bottom: cm(self.margin.bottom_cm),
                left: cm(self.margin.left_cm),
                right: cm(self.margin.right_cm),
            }),
            ..Default::default()
        };
        global.format.font = Some(FontRule {
            name: Some(self.font.name.clone()),
            size: None,
        });

        RuleSchema {
            global,
            ..Default::default()
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::Other(e.to_string()))
    }
}

/// Reference document scanner.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    /// Create a new scanner with the given options.
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Derive rules from a document.
    pub fn scan(&self, doc: &Document) -> ScannedTemplate {
        let margins = doc.first_section().margins();
        let margin = ScannedMargins {
            top_cm: round2(margins.top.cm()),
            bottom_cm: round2(margins.bottom.cm()),
            left_cm: round2(margins.left.cm()),
            right_cm: round2(margins.right.cm()),
        };

        let font = match self.dominant_font(doc) {
            Some(name) => ScannedFont {
                name,
                is_default: false,
            },
            None => {
                log::info!(
                    "No run fonts in the first {} paragraphs, using {}",
                    self.options.sample_paragraphs,
                    self.options.fallback_font
                );
                ScannedFont {
                    name: self.options.fallback_font.clone(),
                    is_default: true,
                }
            }
        };

        log::debug!(
            "Scanned margins {}/{}/{}/{} cm, font {}",
            margin.top_cm,
            margin.bottom_cm,
            margin.left_cm,
            margin.right_cm,
            font.name
        );

        ScannedTemplate {
            margin,
            font,
            category: self.options.category.clone(),
        }
    }

    /// Most frequent run font over the sampled paragraphs; ties go to the
    /// font seen first.
    fn dominant_font(&self, doc: &Document) -> Option<String> {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let names = doc
            .paragraphs()
            .iter()
            .take(self.options.sample_paragraphs)
            .flat_map(|p| p.runs())
            .filter_map(|r| r.format.font_name.as_deref());

        for (order, name) in names.enumerate() {
            counts.entry(name).or_insert((0, order)).0 += 1;
        }

        counts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map(|(name, _)| name.to_string())
    }

    /// Load and scan a file.
    pub fn scan_file<P: AsRef<Path>>(&self, path: P) -> Result<ScannedTemplate> {
        let doc = Document::open(path)?;
        Ok(self.scan(&doc))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scan a document with the default options.
pub fn scan(doc: &Document) -> ScannedTemplate {
    Scanner::default().scan(doc)
}
