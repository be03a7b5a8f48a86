//! Job boundary for the worker queue.
//!
//! A worker pops a JSON job descriptor, hands it to [`Dispatcher::run`] and
//! pushes back the [`JobResult`]. The dispatcher never panics and never
//! returns an error: every failure becomes a result with status `failed`
//! (the caller can fix its input) or `error` (an internal or I/O fault,
//! including a panic inside the job).
//!
//! ```json
//! {"type": "format", "input": "in.docx", "output": "out.docx", "rules": "rules.json"}
//! {"type": "format", "input": "in.docx", "output": "out.docx", "category": "skripsi"}
//! {"type": "scan_template", "input": "master.docx", "category": "skripsi"}
//! {"type": "compress_pdf", "input": "thesis.pdf"}
//! ```

use crate::apply::Formatter;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::rules::RuleSchema;
use crate::scan::Scanner;
use crate::transfer::StyleTransfer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Kind reported when a job panics.
pub const INTERNAL_ERROR_KIND: &str = "InternalError";

/// A job descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Format a document with a rule set, or by style transfer when no
    /// rules are given
    Format {
        input: PathBuf,
        output: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rules: Option<RulesSource>,
        /// Reference document path or template category for style transfer
        #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },

    /// Derive a rule set from a master document
    ScanTemplate {
        input: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },

    /// Compress a PDF through the configured compressor
    CompressPdf {
        input: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<PathBuf>,
    },
}

impl Job {
    /// Parse a job descriptor.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Other(format!("invalid job descriptor: {}", e)))
    }

    /// The `type` tag of this job.
    pub fn type_name(&self) -> &'static str {
        match self {
            Job::Format { .. } => "format",
            Job::ScanTemplate { .. } => "scan_template",
            Job::CompressPdf { .. } => "compress_pdf",
        }
    }
}

/// Where a format job's rules come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesSource {
    /// Path to a JSON rules file
    Path(PathBuf),
    /// Rule set given inline (full schema or scanned template)
    Inline(Value),
}

impl RulesSource {
    /// Load the rule set.
    pub fn load(&self) -> Result<RuleSchema> {
        match self {
            RulesSource::Path(path) => RuleSchema::from_file(path),
            RulesSource::Inline(value) => RuleSchema::from_value(value.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    /// The job's input was unusable
    Failed,
    /// Internal or I/O fault
    Error,
}

/// Result returned to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error kind name (e.g. `InvalidUnitError`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Job-specific output fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl JobResult {
    fn success(payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Self {
            status: JobStatus::Success,
            error: None,
            kind: None,
            payload,
        }
    }

    fn from_error(err: &Error) -> Self {
        let status = if err.is_caller_error() {
            JobStatus::Failed
        } else {
            JobStatus::Error
        };
        Self {
            status,
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
            payload: Map::new(),
        }
    }

    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self {
            status: JobStatus::Error,
            error: Some(format!("internal error: {}", message)),
            kind: Some(INTERNAL_ERROR_KIND.to_string()),
            payload: Map::new(),
        }
    }

    /// Whether the job succeeded.
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","error":"unserializable result: {}"}}"#, e)
        })
    }
}

/// Sizes reported by a PDF compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionReport {
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionReport {
    /// Space saved, in percent of the original size.
    pub fn saved_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

/// External PDF compression collaborator.
pub trait PdfCompressor: Send + Sync {
    /// Name of this compressor.
    fn name(&self) -> &str;

    /// Compress `input` into `output`.
    fn compress(&self, input: &Path, output: &Path) -> Result<CompressionReport>;
}

/// Runs jobs against an engine configuration.
pub struct Dispatcher {
    config: EngineConfig,
    compressor: Option<Arc<dyn PdfCompressor>>,
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            compressor: None,
        }
    }

    /// Register the PDF compressor used by `compress_pdf` jobs.
    pub fn with_compressor(mut self, compressor: Arc<dyn PdfCompressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse and run a JSON job descriptor.
    pub fn run_json(&self, json: &str) -> JobResult {
        match Job::from_json(json) {
            Ok(job) => self.run(&job),
            Err(err) => JobResult {
                status: JobStatus::Failed,
                error: Some(err.to_string()),
                kind: Some("InvalidJobError".to_string()),
                payload: Map::new(),
            },
        }
    }

    /// Run a job. A panic inside the job is caught and reported as an
    /// `error` result with kind `InternalError`.
    pub fn run(&self, job: &Job) -> JobResult {
        log::info!("Running {} job", job.type_name());
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.execute(job))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let result = JobResult::from_panic(payload.as_ref());
                log::error!(
                    "{} job panicked: {}",
                    job.type_name(),
                    result.error.as_deref().unwrap_or_default()
                );
                return result;
            }
        };
        match outcome {
            Ok(payload) => JobResult::success(payload),
            Err(err) => {
                if err.is_caller_error() {
                    log::warn!("{} job failed: {}", job.type_name(), err);
                } else {
                    log::error!("{} job errored: {}", job.type_name(), err);
                }
                JobResult::from_error(&err)
            }
        }
    }

    fn execute(&self, job: &Job) -> Result<Value> {
        match job {
            Job::Format {
                input,
                output,
                rules,
                reference,
                category,
            } => match rules {
                Some(source) => self.format(input, output, source),
                None => {
                    let reference = reference.as_deref().or(category.as_deref()).ok_or_else(|| {
                        Error::TemplateNotFound("format job needs rules, ref or category".into())
                    })?;
                    self.transfer(input, output, reference)
                }
            },
            Job::ScanTemplate { input, category } => self.scan(input, category.as_deref()),
            Job::CompressPdf { input, output } => self.compress(input, output.as_deref()),
        }
    }

    fn format(&self, input: &Path, output: &Path, source: &RulesSource) -> Result<Value> {
        let schema = source.load()?;
        let result = Formatter::new(self.config.detector.clone()).format_file(input, &schema, output)?;
        Ok(json!({
            "mode": "rules",
            "output_path": result.output_path,
            "warnings": result.warnings,
        }))
    }

    fn transfer(&self, input: &Path, output: &Path, reference: &str) -> Result<Value> {
        let reference = self.config.resolve_template(reference)?;
        let summary = StyleTransfer::new(self.config.transfer.clone()).transfer_file(input, &reference, output)?;
        Ok(json!({
            "mode": "transfer",
            "output_path": output,
            "reference": reference,
            "font": summary.font_name,
            "margins_cm": {
                "top": summary.margins.top.cm(),
                "bottom": summary.margins.bottom.cm(),
                "left": summary.margins.left.cm(),
                "right": summary.margins.right.cm(),
            },
        }))
    }

    fn scan(&self, input: &Path, category: Option<&str>) -> Result<Value> {
        let mut options = self.config.scan.clone();
        if let Some(category) = category {
            options = options.with_category(category);
        }
        let template = Scanner::new(options).scan_file(input)?;
        Ok(json!({ "rules": template }))
    }

    fn compress(&self, input: &Path, output: Option<&Path>) -> Result<Value> {
        let compressor = self.compressor.as_ref().ok_or_else(|| {
            Error::missing_input("compress_pdf", Error::Other("no PDF compressor configured".into()))
        })?;

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => compressed_path(input),
        };
        let report = compressor.compress(input, &output)?;
        log::info!("{} saved {:.2}% on {}", compressor.name(), report.saved_percent(), input.display());

        Ok(json!({
            "output_path": output,
            "original_size": report.original_size,
            "compressed_size": report.compressed_size,
            "saved_percent": format!("{:.2}%", report.saved_percent()),
        }))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// `thesis.pdf` → `thesis_compressed.pdf` next to the input.
fn compressed_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    input.with_file_name(format!("{}_compressed.pdf", stem))
}
