//! Document model types for DOCX formatting.
//!
//! This module defines the normalized view the scanner, zone detector and
//! formatter work on: an ordered sequence of paragraphs (each with ordered
//! runs) and one or more page sections. The model only carries the
//! attributes docnorm reads or rewrites; everything else in the source
//! package is kept aside and written back untouched.

mod document;
mod paragraph;
mod section;

pub use document::Document;
pub use paragraph::{Paragraph, ParagraphFormat, Run, RunFormat};
pub use section::{Margins, PageSection};
