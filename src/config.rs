//! Engine configuration.

use crate::error::{Error, Result};
use crate::scan::ScanOptions;
use crate::transfer::TransferOptions;
use crate::zones::DetectorOptions;
use std::path::{Path, PathBuf};

/// Environment variable holding the template root directory.
pub const TEMPLATES_ROOT_ENV: &str = "DOCNORM_TEMPLATES_ROOT";

/// File name of a category's reference document.
pub const MASTER_FILE: &str = "master.docx";

/// Configuration shared by the job dispatcher and the CLI.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory with one `<category>/master.docx` per template category
    pub templates_root: PathBuf,

    pub detector: DetectorOptions,

    pub scan: ScanOptions,

    pub transfer: TransferOptions,
}

impl EngineConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the template root taken from `DOCNORM_TEMPLATES_ROOT` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = std::env::var_os(TEMPLATES_ROOT_ENV).filter(|v| !v.is_empty()) {
            config.templates_root = PathBuf::from(root);
        }
        config
    }

    /// Set the template root directory.
    pub fn with_templates_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.templates_root = root.into();
        self
    }

    /// Set zone detector options.
    pub fn with_detector(mut self, options: DetectorOptions) -> Self {
        self.detector = options;
        self
    }

    /// Set scanner options.
    pub fn with_scan(mut self, options: ScanOptions) -> Self {
        self.scan = options;
        self
    }

    /// Set style transfer options.
    pub fn with_transfer(mut self, options: TransferOptions) -> Self {
        self.transfer = options;
        self
    }

    /// Path of a category's master document (which may not exist).
    pub fn master_path(&self, category: &str) -> PathBuf {
        self.templates_root.join(category).join(MASTER_FILE)
    }

    /// Resolve a reference given as a file path or a category name.
    ///
    /// An existing file is used as-is; otherwise the value is treated as a
    /// category and looked up under the template root.
    pub fn resolve_template(&self, reference: &str) -> Result<PathBuf> {
        let direct = Path::new(reference);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let category = reference.trim();
        if category.is_empty() || category.contains(|c: char| c == '/' || c == '\\') || category == ".." {
            return Err(Error::TemplateNotFound(reference.to_string()));
        }

        let master = self.master_path(category);
        if master.is_file() {
            log::debug!("Resolved template {} to {}", category, master.display());
            Ok(master)
        } else {
            Err(Error::TemplateNotFound(format!(
                "{} (looked for {})",
                reference,
                master.display()
            )))
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            templates_root: PathBuf::from("templates"),
            detector: DetectorOptions::default(),
            scan: ScanOptions::default(),
            transfer: TransferOptions::default(),
        }
    }
}
