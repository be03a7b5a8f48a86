//! Page section geometry.

use crate::error::{Error, Result};
use crate::units::Length;
use serde::{Deserialize, Serialize};

/// The four page margins of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    /// Top margin
    pub top: Length,
    /// Bottom margin
    pub bottom: Length,
    /// Left margin
    pub left: Length,
    /// Right margin
    pub right: Length,
}

impl Margins {
    /// Create margins from explicit lengths.
    pub fn new(top: Length, bottom: Length, left: Length, right: Length) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Create margins from centimeter values.
    pub fn from_cm(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self::new(
            Length::from_cm(top),
            Length::from_cm(bottom),
            Length::from_cm(left),
            Length::from_cm(right),
        )
    }

    /// Same margin on all four sides.
    pub fn uniform(margin: Length) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("top", self.top),
            ("bottom", self.bottom),
            ("left", self.left),
            ("right", self.right),
        ] {
            if !value.is_positive() {
                return Err(Error::InvalidGeometry(format!(
                    "{} margin must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// A page section: margins plus page size.
///
/// All six dimensions are strictly positive; every constructor and setter
/// enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSection {
    margins: Margins,
    page_width: Length,
    page_height: Length,
}

impl PageSection {
    /// Create a section, validating its geometry.
    pub fn new(margins: Margins, page_width: Length, page_height: Length) -> Result<Self> {
        margins.validate()?;
        validate_page_size(page_width, page_height)?;
        Ok(Self {
            margins,
            page_width,
            page_height,
        })
    }

    /// A4 portrait (21 x 29.7 cm) with 2.54 cm margins.
    pub fn a4() -> Self {
        Self {
            margins: Margins::uniform(Length::from_cm(2.54)),
            page_width: Length::from_cm(21.0),
            page_height: Length::from_cm(29.7),
        }
    }

    /// US Letter portrait with 1 inch margins (Word's default geometry).
    pub fn letter() -> Self {
        Self {
            margins: Margins::uniform(Length::from_inches(1.0)),
            page_width: Length::from_inches(8.5),
            page_height: Length::from_inches(11.0),
        }
    }

    /// Section margins.
    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Page width.
    pub fn page_width(&self) -> Length {
        self.page_width
    }

    /// Page height.
    pub fn page_height(&self) -> Length {
        self.page_height
    }

    /// Replace all four margins.
    pub fn set_margins(&mut self, margins: Margins) -> Result<()> {
        margins.validate()?;
        self.margins = margins;
        Ok(())
    }

    /// Replace the page size.
    pub fn set_page_size(&mut self, width: Length, height: Length) -> Result<()> {
        validate_page_size(width, height)?;
        self.page_width = width;
        self.page_height = height;
        Ok(())
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.page_width > self.page_height
    }
}

impl Default for PageSection {
    fn default() -> Self {
        Self::a4()
    }
}

fn validate_page_size(width: Length, height: Length) -> Result<()> {
    if !width.is_positive() || !height.is_positive() {
        return Err(Error::InvalidGeometry(format!(
            "page size must be positive, got {} x {}",
            width, height
        )));
    }
    Ok(())
}
