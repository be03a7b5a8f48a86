//! Error types for docnorm library.

use std::io;
use thiserror::Error;

/// Result type alias for docnorm operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while scanning or formatting documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A size literal could not be parsed.
    #[error("Invalid size literal: {0}")]
    InvalidUnit(String),

    /// The container is not a readable DOCX package.
    #[error("Corrupted document: {0}")]
    CorruptDocument(String),

    /// A rule field could not be resolved to a usable value.
    #[error("Rule field `{field}` is unusable: {source}")]
    MissingInput {
        /// Dotted path of the offending rule field (e.g. `global.margins.top`)
        field: String,
        /// The underlying parse failure
        #[source]
        source: Box<Error>,
    },

    /// A margin or page dimension is not strictly positive.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// The rule schema JSON could not be parsed.
    #[error("Invalid rule schema: {0}")]
    InvalidRules(String),

    /// A template category has no master document.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error as an unusable rule field.
    pub fn missing_input(field: impl Into<String>, source: Error) -> Self {
        Error::MissingInput {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Stable name of the error kind, used in job result payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "IoError",
            Error::InvalidUnit(_) => "InvalidUnitError",
            Error::CorruptDocument(_) => "CorruptDocumentError",
            Error::MissingInput { .. } => "MissingInputError",
            Error::InvalidGeometry(_) => "InvalidGeometryError",
            Error::InvalidRules(_) => "InvalidRulesError",
            Error::TemplateNotFound(_) => "TemplateNotFoundError",
            Error::Other(_) => "Error",
        }
    }

    /// Whether the caller can fix this by changing its input.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Error::Io(_) | Error::Other(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::CorruptDocument(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptDocument(format!("XML error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidRules(err.to_string())
    }
}
