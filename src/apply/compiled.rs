//! Rule literals resolved to typed values.

use crate::error::{Error, Result};
use crate::model::{Margins, PageSection, Paragraph};
use crate::rules::{FontStyle, FontWeight, FormatRules, RuleSchema, TextTransform, ZoneRules};
use crate::units::{self, Length, LengthUnit, SizeValue};
use crate::zones::ZoneKind;

/// Formatting with every literal parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CompiledFormat {
    pub font_name: Option<String>,
    pub font_size: Option<Length>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub line_spacing: Option<f64>,
    pub space_before: Option<Length>,
    pub space_after: Option<Length>,
}

impl CompiledFormat {
    fn compile(rules: &FormatRules, prefix: &str) -> Result<Self> {
        let font_size = match (&rules.font_size, rules.font.as_ref().and_then(|f| f.size.as_ref())) {
            (Some(size), _) => Some(font_size(size, &format!("{}.font_size", prefix))?),
            (None, Some(size)) => Some(font_size(size, &format!("{}.font.size", prefix))?),
            (None, None) => None,
        };

        let line_spacing = rules
            .line_spacing
            .as_ref()
            .map(|v| multiplier(v, &format!("{}.line_spacing", prefix)))
            .transpose()?;

        Ok(Self {
            font_name: rules
                .font
                .as_ref()
                .and_then(|f| f.name.as_deref())
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            font_size,
            bold: rules.font_weight.map(|w| w == FontWeight::Bold),
            italic: rules.title_style.map(|s| s == FontStyle::Italic),
            line_spacing,
            space_before: spacing(&rules.spacing_before, &format!("{}.spacing_before", prefix))?,
            space_after: spacing(&rules.spacing_after, &format!("{}.spacing_after", prefix))?,
        })
    }

    /// Whether applying this changes nothing.
    pub fn is_noop(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to one paragraph. Paragraphs without runs only get the
    /// paragraph-level values.
    pub fn apply_to(&self, paragraph: &mut Paragraph) {
        for run in paragraph.runs_mut() {
            if let Some(name) = &self.font_name {
                run.format.font_name = Some(name.clone());
            }
            if let Some(size) = self.font_size {
                run.format.font_size = Some(size);
            }
            if let Some(bold) = self.bold {
                run.format.bold = bold;
            }
            if let Some(italic) = self.italic {
                run.format.italic = italic;
            }
        }

        let format = &mut paragraph.format;
        if let Some(spacing) = self.line_spacing {
            format.line_spacing = Some(spacing);
        }
        if let Some(before) = self.space_before {
            format.space_before = Some(before);
        }
        if let Some(after) = self.space_after {
            format.space_after = Some(after);
        }
    }
}

/// A zone's compiled rules.
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledZone {
    pub format: CompiledFormat,
    pub max_words: Option<usize>,
    pub text_transform: Option<TextTransform>,
    pub indent_hanging: Option<Length>,
}

impl CompiledZone {
    fn compile(kind: ZoneKind, rules: &ZoneRules) -> Result<Self> {
        let prefix = format!("sections.{}", kind);
        let mut zone = Self {
            format: CompiledFormat::compile(&rules.format, &prefix)?,
            ..Default::default()
        };

        if rules.max_words.is_some() {
            match kind {
                ZoneKind::Abstract => zone.max_words = rules.max_words,
                _ => log::warn!("{}.max_words is only checked for the abstract", prefix),
            }
        }
        if rules.text_transform.is_some() {
            match kind {
                ZoneKind::ChapterHeadings => zone.text_transform = rules.text_transform,
                _ => log::warn!("{}.text_transform only applies to chapter headings", prefix),
            }
        }
        if let Some(indent) = &rules.indent_hanging {
            match kind {
                ZoneKind::Bibliography => {
                    zone.indent_hanging =
                        Some(length(indent, &format!("{}.indent_hanging", prefix))?)
                }
                _ => log::warn!("{}.indent_hanging only applies to the bibliography", prefix),
            }
        }
        Ok(zone)
    }
}

/// Partial margins: only the given sides change.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MarginOverride {
    pub top: Option<Length>,
    pub bottom: Option<Length>,
    pub left: Option<Length>,
    pub right: Option<Length>,
}

impl MarginOverride {
    pub fn merge(&self, current: Margins) -> Margins {
        Margins::new(
            self.top.unwrap_or(current.top),
            self.bottom.unwrap_or(current.bottom),
            self.left.unwrap_or(current.left),
            self.right.unwrap_or(current.right),
        )
    }
}

/// A rule schema ready to apply.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub(crate) margins: Option<MarginOverride>,
    pub(crate) page_size: Option<(Length, Length)>,
    pub(crate) global: CompiledFormat,
    pub(crate) zones: Vec<(ZoneKind, CompiledZone)>,
}

impl CompiledRules {
    /// Resolve every literal of `schema`.
    ///
    /// Fails with [`Error::MissingInput`] naming the first unusable field.
    pub fn compile(schema: &RuleSchema) -> Result<Self> {
        let global = &schema.global;

        let margins = match &global.margins {
            Some(m) => {
                let side = |value: &Option<SizeValue>, field: &str| {
                    value.as_ref().map(|v| positive(v, field)).transpose()
                };
                Some(MarginOverride {
                    top: side(&m.top, "global.margins.top")?,
                    bottom: side(&m.bottom, "global.margins.bottom")?,
                    left: side(&m.left, "global.margins.left")?,
                    right: side(&m.right, "global.margins.right")?,
                })
            }
            None => None,
        };

        let page_size = match &global.page_size {
            Some(size) => Some((
                positive(&size.width, "global.page_size.width")?,
                positive(&size.height, "global.page_size.height")?,
            )),
            None => None,
        };

        let zones = schema
            .sections
            .iter()
            .map(|(kind, rules)| CompiledZone::compile(kind, rules).map(|zone| (kind, zone)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            margins,
            page_size,
            global: CompiledFormat::compile(&global.format, "global")?,
            zones,
        })
    }

    /// Apply margins and page size to a section.
    pub(crate) fn apply_to_section(&self, section: &mut PageSection) -> Result<()> {
        if let Some(margins) = &self.margins {
            section.set_margins(margins.merge(section.margins()))?;
        }
        if let Some((width, height)) = self.page_size {
            section.set_page_size(width, height)?;
        }
        Ok(())
    }
}

fn length(value: &SizeValue, field: &str) -> Result<Length> {
    units::parse_length(value, LengthUnit::Centimeters).map_err(|e| Error::missing_input(field, e))
}

fn spacing(value: &Option<SizeValue>, field: &str) -> Result<Option<Length>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let spacing = length(value, field)?;
    if spacing.emu() < 0 {
        return Err(Error::missing_input(
            field,
            Error::InvalidGeometry(format!("spacing must not be negative, got {}", value)),
        ));
    }
    Ok(Some(spacing))
}

fn positive(value: &SizeValue, field: &str) -> Result<Length> {
    let length = length(value, field)?;
    if !length.is_positive() {
        return Err(Error::missing_input(
            field,
            Error::InvalidGeometry(format!("must be positive, got {}", value)),
        ));
    }
    Ok(length)
}

fn font_size(value: &SizeValue, field: &str) -> Result<Length> {
    let size = units::parse_font_size(value).map_err(|e| Error::missing_input(field, e))?;
    if !size.is_positive() {
        return Err(Error::missing_input(
            field,
            Error::InvalidUnit(format!("font size must be positive, got {}", value)),
        ));
    }
    Ok(size)
}

fn multiplier(value: &SizeValue, field: &str) -> Result<f64> {
    let spacing = units::parse_multiplier(value).map_err(|e| Error::missing_input(field, e))?;
    if spacing <= 0.0 {
        return Err(Error::missing_input(
            field,
            Error::InvalidUnit(format!("line spacing must be positive, got {}", value)),
        ));
    }
    Ok(spacing)
}
