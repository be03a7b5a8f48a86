//! Non-fatal findings reported by the formatter.

use crate::zones::ZoneKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a warning is about, with its details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WarningKind {
    /// The abstract has more words than `max_words` allows
    AbstractTooLong { observed: usize, limit: usize },

    /// A zone has rules but was not found in the document
    ZoneNotFound { zone: ZoneKind },
}

/// A warning with a human-readable message.
///
/// Serializes flat: `{"kind": "AbstractTooLong", "observed": 150, "limit": 100, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(flatten)]
    pub kind: WarningKind,

    pub message: String,
}

impl Warning {
    pub fn abstract_too_long(observed: usize, limit: usize) -> Self {
        Self {
            message: format!("Abstract too long: {} words (max: {})", observed, limit),
            kind: WarningKind::AbstractTooLong { observed, limit },
        }
    }

    pub fn zone_not_found(zone: ZoneKind) -> Self {
        Self {
            message: format!("No {} zone found; its rules were not applied", zone),
            kind: WarningKind::ZoneNotFound { zone },
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
