//! Length units and size-literal parsing.
//!
//! All lengths are stored as English Metric Units (EMU), the integer unit
//! WordprocessingML uses for drawing geometry. Every unit docnorm reads or
//! writes (centimeters, inches, points, twips, half-points) divides EMU
//! evenly, so conversions through the canonical unit stay exact.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;
/// EMU per centimeter.
pub const EMU_PER_CM: i64 = 360_000;
/// EMU per point (1/72 inch).
pub const EMU_PER_PT: i64 = 12_700;
/// EMU per twip (1/20 point).
pub const EMU_PER_TWIP: i64 = 635;

/// A length, normalized to EMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length(i64);

impl Length {
    /// Zero length.
    pub const ZERO: Length = Length(0);

    /// Create a length from raw EMU.
    pub const fn from_emu(emu: i64) -> Self {
        Self(emu)
    }

    /// Create a length from a value in the given unit.
    pub fn from_unit(value: f64, unit: LengthUnit) -> Self {
        Self((value * unit.emu_per_unit() as f64).round() as i64)
    }

    /// Create a length from centimeters.
    pub fn from_cm(cm: f64) -> Self {
        Self::from_unit(cm, LengthUnit::Centimeters)
    }

    /// Create a length from inches.
    pub fn from_inches(inches: f64) -> Self {
        Self::from_unit(inches, LengthUnit::Inches)
    }

    /// Create a length from points.
    pub fn from_pt(pt: f64) -> Self {
        Self::from_unit(pt, LengthUnit::Points)
    }

    /// Create a length from twentieths of a point.
    ///
    /// Returns `None` when the value does not fit in EMU.
    pub const fn from_twips(twips: i64) -> Option<Self> {
        match twips.checked_mul(EMU_PER_TWIP) {
            Some(emu) => Some(Self(emu)),
            None => None,
        }
    }

    /// Create a length from half-points (the unit of `w:sz`).
    ///
    /// Returns `None` when the value does not fit in EMU.
    pub const fn from_half_points(half_points: i64) -> Option<Self> {
        match half_points.checked_mul(EMU_PER_PT / 2) {
            Some(emu) => Some(Self(emu)),
            None => None,
        }
    }

    /// Raw EMU value.
    pub const fn emu(self) -> i64 {
        self.0
    }

    /// Value in the given unit.
    pub fn to_unit(self, unit: LengthUnit) -> f64 {
        self.0 as f64 / unit.emu_per_unit() as f64
    }

    /// Value in centimeters.
    pub fn cm(self) -> f64 {
        self.to_unit(LengthUnit::Centimeters)
    }

    /// Value in inches.
    pub fn inches(self) -> f64 {
        self.to_unit(LengthUnit::Inches)
    }

    /// Value in points.
    pub fn pt(self) -> f64 {
        self.to_unit(LengthUnit::Points)
    }

    /// Value in twips, rounded to the nearest whole twip.
    pub fn twips(self) -> i64 {
        (self.0 as f64 / EMU_PER_TWIP as f64).round() as i64
    }

    /// Value in half-points, rounded to the nearest half-point.
    pub fn half_points(self) -> i64 {
        (self.0 as f64 * 2.0 / EMU_PER_PT as f64).round() as i64
    }

    /// Whether the length is strictly greater than zero.
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Absolute value.
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Render as a unit-suffixed literal that [`parse_length`] accepts.
    pub fn format_as(self, unit: LengthUnit) -> String {
        format!("{}{}", self.to_unit(unit), unit.suffix())
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Self::Output {
        Length(-self.0)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}cm", self.cm())
    }
}

/// Units accepted in size literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Centimeters (`cm`)
    Centimeters,
    /// Inches (`in`)
    Inches,
    /// Points (`pt`)
    Points,
}

impl LengthUnit {
    /// All recognized units.
    pub const ALL: [LengthUnit; 3] = [
        LengthUnit::Centimeters,
        LengthUnit::Inches,
        LengthUnit::Points,
    ];

    /// Literal suffix for this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Centimeters => "cm",
            LengthUnit::Inches => "in",
            LengthUnit::Points => "pt",
        }
    }

    fn emu_per_unit(self) -> i64 {
        match self {
            LengthUnit::Centimeters => EMU_PER_CM,
            LengthUnit::Inches => EMU_PER_INCH,
            LengthUnit::Points => EMU_PER_PT,
        }
    }

    fn from_suffix(literal: &str) -> Option<(&str, LengthUnit)> {
        Self::ALL.into_iter().find_map(|unit| {
            literal
                .strip_suffix(unit.suffix())
                .map(|number| (number, unit))
        })
    }
}

/// A size literal as it appears in rule configuration: a bare number or a
/// unit-suffixed string such as `"4cm"` or `" 1 IN "`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    /// A bare number, interpreted in the field's default unit
    Number(f64),
    /// A string, optionally suffixed with `cm`, `in` or `pt`
    Text(String),
}

impl From<f64> for SizeValue {
    fn from(value: f64) -> Self {
        SizeValue::Number(value)
    }
}

impl From<&str> for SizeValue {
    fn from(value: &str) -> Self {
        SizeValue::Text(value.to_string())
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Number(v) => write!(f, "{}", v),
            SizeValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Parse a size literal. Bare numbers and unsuffixed strings use `default_unit`.
pub fn parse_length(input: &SizeValue, default_unit: LengthUnit) -> Result<Length> {
    match input {
        SizeValue::Number(value) => {
            let value = finite(*value, input)?;
            Ok(Length::from_unit(value, default_unit))
        }
        SizeValue::Text(text) => {
            let literal = text.trim().to_ascii_lowercase();
            let (number, unit) =
                LengthUnit::from_suffix(&literal).unwrap_or((literal.as_str(), default_unit));
            let value = parse_number(number, input)?;
            Ok(Length::from_unit(value, unit))
        }
    }
}

/// Parse a font size literal. Numbers and unsuffixed strings are points.
pub fn parse_font_size(input: &SizeValue) -> Result<Length> {
    match input {
        SizeValue::Number(value) => Ok(Length::from_pt(finite(*value, input)?)),
        SizeValue::Text(text) => {
            let literal = text.trim().to_ascii_lowercase();
            let number = literal.strip_suffix("pt").unwrap_or(&literal);
            Ok(Length::from_pt(parse_number(number, input)?))
        }
    }
}

/// Parse a unitless multiplier such as a line spacing of `1.5` or `"2"`.
pub fn parse_multiplier(input: &SizeValue) -> Result<f64> {
    match input {
        SizeValue::Number(value) => finite(*value, input),
        SizeValue::Text(text) => parse_number(text, input),
    }
}

fn parse_number(number: &str, input: &SizeValue) -> Result<f64> {
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| Error::InvalidUnit(input.to_string()))?;
    finite(value, input)
}

fn finite(value: f64, input: &SizeValue) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidUnit(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_suffixed_lengths() {
        let cm = parse_length(&"4cm".into(), LengthUnit::Centimeters).unwrap();
        assert_eq!(cm, Length::from_cm(4.0));

        let inches = parse_length(&" 1 IN ".into(), LengthUnit::Centimeters).unwrap();
        assert_eq!(inches.emu(), EMU_PER_INCH);

        let pt = parse_length(&"12pt".into(), LengthUnit::Centimeters).unwrap();
        assert_eq!(pt, Length::from_pt(12.0));
    }

    #[test]
    fn test_bare_values_use_default_unit() {
        let number = parse_length(&SizeValue::Number(2.5), LengthUnit::Centimeters).unwrap();
        assert_eq!(number, Length::from_cm(2.5));

        let text = parse_length(&"2.5".into(), LengthUnit::Inches).unwrap();
        assert_eq!(text, Length::from_inches(2.5));
    }

    #[test]
    fn test_parse_invalid_literals() {
        for bad in ["12px", "abc", "cm", "", "nan", "inf"] {
            let result = parse_length(&bad.into(), LengthUnit::Centimeters);
            assert!(
                matches!(result, Err(Error::InvalidUnit(_))),
                "expected failure for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_font_size() {
        assert_eq!(parse_font_size(&SizeValue::Number(12.0)).unwrap().pt(), 12.0);
        assert_eq!(parse_font_size(&"11.5".into()).unwrap().pt(), 11.5);
        assert_eq!(parse_font_size(&" 14PT".into()).unwrap().pt(), 14.0);
        assert!(parse_font_size(&"12cm".into()).is_err());
    }

    #[test]
    fn test_parse_multiplier() {
        assert_eq!(parse_multiplier(&SizeValue::Number(1.5)).unwrap(), 1.5);
        assert_eq!(parse_multiplier(&" 2 ".into()).unwrap(), 2.0);
        assert!(parse_multiplier(&"double".into()).is_err());
    }

    #[test]
    fn test_docx_unit_conversions() {
        let margin = Length::from_cm(4.0);
        assert_eq!(margin.twips(), 2268);
        assert_eq!(Length::from_twips(1440), Some(Length::from_inches(1.0)));
        assert_eq!(Length::from_half_points(24), Some(Length::from_pt(12.0)));
        assert_eq!(Length::from_pt(10.5).half_points(), 21);
        assert_eq!(-Length::from_cm(1.0), Length::from_cm(-1.0));
    }

    #[test]
    fn test_docx_units_out_of_range() {
        assert_eq!(Length::from_twips(99_999_999_999_999_999), None);
        assert_eq!(Length::from_twips(i64::MIN), None);
        assert_eq!(Length::from_half_points(i64::MAX / 1000), None);
    }

    #[test]
    fn test_format_as() {
        assert_eq!(Length::from_cm(4.0).format_as(LengthUnit::Centimeters), "4cm");
        assert_eq!(Length::from_inches(1.0).format_as(LengthUnit::Points), "72pt");
    }

    proptest! {
        /// Property: formatting in any unit and parsing back is lossless
        #[test]
        fn format_then_parse_round_trips(emu in -50_000_000i64..50_000_000, unit_idx in 0usize..3) {
            let original = Length::from_emu(emu);
            for source in LengthUnit::ALL {
                let target = LengthUnit::ALL[unit_idx];
                let literal = SizeValue::Text(original.format_as(target));
                let parsed = parse_length(&literal, LengthUnit::Centimeters).unwrap();
                prop_assert!((parsed.to_unit(source) - original.to_unit(source)).abs() <= 0.01);
            }
        }

        /// Property: arbitrary strings never panic the parser
        #[test]
        fn parse_never_panics(input in ".{0,16}") {
            let _ = parse_length(&SizeValue::Text(input.clone()), LengthUnit::Centimeters);
            let _ = parse_font_size(&SizeValue::Text(input));
        }
    }
}
