//! Rule schema.
//!
//! A rule set is plain JSON, either written by hand or produced by the
//! scanner. Every field is optional; absent fields leave the document's
//! own formatting alone.
//!
//! ```json
//! {
//!   "global": {
//!     "margins": { "top": "4cm", "bottom": 3, "left": "4cm", "right": "3cm" },
//!     "font": { "name": "Times New Roman", "size": 12 },
//!     "line_spacing": 1.5
//!   },
//!   "sections": {
//!     "abstract": { "max_words": 250, "line_spacing": 1 },
//!     "chapter_headings": { "font_weight": "bold", "text_transform": "uppercase" },
//!     "bibliography": { "indent_hanging": "1.27cm" }
//!   }
//! }
//! ```
//!
//! Bare numbers in size fields are centimeters; bare font sizes are points.

use crate::error::{Error, Result};
use crate::scan::ScannedTemplate;
use crate::units::SizeValue;
use crate::zones::ZoneKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSchema {
    /// Rules for the whole document
    #[serde(default)]
    pub global: GlobalRules,

    /// Rules per detected zone
    #[serde(default, alias = "zones")]
    pub sections: ZoneRuleMap,
}

impl RuleSchema {
    /// Parse a rule set from JSON.
    ///
    /// Accepts a full schema as well as the output of the scanner
    /// (`{"margin": {"top_cm": ...}, "font": {...}}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Convert an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let scanned = value.get("margin").is_some() && value.get("global").is_none();
        if scanned {
            let template: ScannedTemplate = serde_json::from_value(value)?;
            log::debug!("Rule set is a scanned template");
            return Ok(template.to_schema());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Read a rule set from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }

    /// Check if the schema sets nothing at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Resolve every literal without touching a document.
    ///
    /// Returns the same error `apply` would fail with.
    pub fn validate(&self) -> Result<()> {
        crate::apply::CompiledRules::compile(self).map(|_| ())
    }
}

/// Document-wide rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalRules {
    /// Page margins applied to every section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<MarginRules>,

    /// Page size applied to every section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSizeRules>,

    /// Formatting for body paragraphs
    #[serde(flatten)]
    pub format: FormatRules,
}

/// Formatting vocabulary shared by the global rules and every zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontRule>,

    /// Font size; takes precedence over `font.size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<SizeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_style: Option<FontStyle>,

    /// Line spacing multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<SizeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_before: Option<SizeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_after: Option<SizeValue>,
}

/// Font face and size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeValue>,
}

/// Page margins; each side is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<SizeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<SizeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<SizeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<SizeValue>,
}

/// Page dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSizeRules {
    pub width: SizeValue,
    pub height: SizeValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    Uppercase,
}

impl TextTransform {
    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::Uppercase => text.to_uppercase(),
        }
    }
}

/// Rules for one zone kind.
///
/// `max_words` is only checked for the abstract, `text_transform` only
/// applies to chapter headings and `indent_hanging` only to the
/// bibliography.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneRules {
    #[serde(flatten)]
    pub format: FormatRules,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_words: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<TextTransform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_hanging: Option<SizeValue>,
}

/// Zone rules keyed by zone kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneRuleMap {
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_: Option<ZoneRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_headings: Option<ZoneRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibliography: Option<ZoneRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<ZoneRules>,
}

impl ZoneRuleMap {
    /// Rules for one kind.
    pub fn get(&self, kind: ZoneKind) -> Option<&ZoneRules> {
        match kind {
            ZoneKind::Abstract => self.abstract_.as_ref(),
            ZoneKind::ChapterHeadings => self.chapter_headings.as_ref(),
            ZoneKind::Bibliography => self.bibliography.as_ref(),
            ZoneKind::TableOfContents => self.table_of_contents.as_ref(),
        }
    }

    /// Set the rules for one kind.
    pub fn set(&mut self, kind: ZoneKind, rules: ZoneRules) {
        let slot = match kind {
            ZoneKind::Abstract => &mut self.abstract_,
            ZoneKind::ChapterHeadings => &mut self.chapter_headings,
            ZoneKind::Bibliography => &mut self.bibliography,
            ZoneKind::TableOfContents => &mut self.table_of_contents,
        };
        *slot = Some(rules);
    }

    /// Kinds with rules, in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneKind, &ZoneRules)> {
        ZoneKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|rules| (kind, rules)))
    }
}
