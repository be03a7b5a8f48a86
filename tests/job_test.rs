//! Integration tests for the job dispatcher.

mod common;

use common::*;
use docnorm::config::MASTER_FILE;
use docnorm::error::Result;
use docnorm::job::CompressionReport;
use docnorm::{Dispatcher, Document, EngineConfig, Job, JobStatus, PdfCompressor};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Mock compressor that keeps every tenth byte.
struct MockCompressor;

impl PdfCompressor for MockCompressor {
    fn name(&self) -> &str {
        "mock"
    }

    fn compress(&self, input: &Path, output: &Path) -> Result<CompressionReport> {
        let data = std::fs::read(input)?;
        let compressed: Vec<u8> = data.iter().step_by(10).copied().collect();
        std::fs::write(output, &compressed)?;
        Ok(CompressionReport {
            original_size: data.len() as u64,
            compressed_size: compressed.len() as u64,
        })
    }
}

fn master_body() -> String {
    let mut body = String::new();
    body.push_str(&paragraph(&["HALAMAN JUDUL"], Some("Cambria")));
    body.push_str(&a4_section(2268, 1701, 2268, 1701));
    body
}

fn draft_body() -> String {
    let mut body = String::new();
    body.push_str(&paragraph(&["Abstract"], Some("Calibri")));
    body.push_str(&paragraph(&["satu dua tiga empat lima"], Some("Calibri")));
    body.push_str(&paragraph(&["Chapter 1 Introduction"], Some("Calibri")));
    body.push_str(&a4_section(1440, 1440, 1440, 1440));
    body
}

/// A template root with `skripsi/master.docx`.
fn templates(root: &Path) -> EngineConfig {
    let category = root.join("templates").join("skripsi");
    std::fs::create_dir_all(&category).unwrap();
    std::fs::write(
        category.join(MASTER_FILE),
        build_docx(&document_xml(&master_body())),
    )
    .unwrap();
    EngineConfig::new().with_templates_root(root.join("templates"))
}

fn run(dispatcher: &Dispatcher, job: Value) -> Value {
    let result = dispatcher.run_json(&job.to_string());
    serde_json::from_str(&result.to_json()).unwrap()
}

#[test]
fn test_format_job_with_rules_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(dir.path(), "in.docx", &draft_body());
    let output = dir.path().join("out.docx");
    let rules = dir.path().join("rules.json");
    std::fs::write(
        &rules,
        r#"{"global": {"font": {"name": "Georgia"}}, "sections": {"abstract": {"max_words": 3}}}"#,
    )
    .unwrap();

    let result = run(
        &Dispatcher::default(),
        json!({"type": "format", "input": input, "output": output, "rules": rules}),
    );

    assert_eq!(result["status"], "success");
    assert_eq!(result["mode"], "rules");
    assert_eq!(result["output_path"], output.to_str().unwrap());
    assert_eq!(result["warnings"][0]["kind"], "AbstractTooLong");
    assert_eq!(result["warnings"][0]["observed"], 5);

    let doc = Document::open(&output).unwrap();
    assert_eq!(
        doc.paragraphs()[1].runs()[0].format.font_name.as_deref(),
        Some("Calibri")
    );
}

#[test]
fn test_format_job_with_inline_scanned_rules() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(dir.path(), "in.docx", &draft_body());
    let output = dir.path().join("out.docx");

    let rules = json!({
        "margin": {"top_cm": 4.0, "bottom_cm": 3.0, "left_cm": 4.0, "right_cm": 3.0},
        "font": {"name": "Times New Roman"}
    });
    let result = run(
        &Dispatcher::default(),
        json!({"type": "format", "input": input, "output": output, "rules": rules}),
    );
    assert_eq!(result["status"], "success");

    let doc = Document::open(&output).unwrap();
    assert!((doc.first_section().margins().left.cm() - 4.0).abs() < 0.01);
}

#[test]
fn test_format_job_by_category_transfers_style() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = Dispatcher::new(templates(dir.path()));
    let input = write_docx(dir.path(), "in.docx", &draft_body());
    let output = dir.path().join("out.docx");

    let result = run(
        &dispatcher,
        json!({"type": "format", "input": input, "output": output, "category": "skripsi"}),
    );

    assert_eq!(result["status"], "success");
    assert_eq!(result["mode"], "transfer");
    assert_eq!(result["font"], "Cambria");
    assert!((result["margins_cm"]["top"].as_f64().unwrap() - 4.0).abs() < 0.01);

    let doc = Document::open(&output).unwrap();
    assert!(doc
        .paragraphs()
        .iter()
        .flat_map(|p| p.runs())
        .all(|r| r.format.font_name.as_deref() == Some("Cambria")));
}

#[test]
fn test_format_job_unknown_category() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = Dispatcher::new(templates(dir.path()));
    let input = write_docx(dir.path(), "in.docx", &draft_body());
    let output = dir.path().join("out.docx");

    let result = run(
        &dispatcher,
        json!({"type": "format", "input": input, "output": output, "ref": "disertasi"}),
    );
    assert_eq!(result["status"], "failed");
    assert_eq!(result["kind"], "TemplateNotFoundError");
    assert!(!output.exists());
}

#[test]
fn test_format_job_bad_unit() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(dir.path(), "in.docx", &draft_body());
    let output = dir.path().join("out.docx");

    let result = run(
        &Dispatcher::default(),
        json!({
            "type": "format",
            "input": input,
            "output": output,
            "rules": {"global": {"margins": {"top": "2furlongs"}}}
        }),
    );
    assert_eq!(result["status"], "failed");
    assert_eq!(result["kind"], "MissingInputError");
    assert!(result["error"].as_str().unwrap().contains("global.margins.top"));
}

#[test]
fn test_format_job_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(
        &Dispatcher::default(),
        json!({
            "type": "format",
            "input": dir.path().join("missing.docx"),
            "output": dir.path().join("out.docx"),
            "rules": {"global": {}}
        }),
    );
    assert_eq!(result["status"], "error");
    assert_eq!(result["kind"], "IoError");
}

#[test]
fn test_format_job_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = paragraph(&["Abstract"], Some("Calibri"));
    body.push_str(r#"<w:p><w:r><w:rPr><w:sz w:val="1e30"/></w:rPr><w:t>besar</w:t></w:r></w:p>"#);
    body.push_str(r#"<w:sectPr><w:pgMar w:top="99999999999999999" w:bottom="1440" w:left="1440" w:right="1440"/></w:sectPr>"#);
    let input = write_docx(dir.path(), "in.docx", &body);
    let output = dir.path().join("out.docx");

    let result = run(
        &Dispatcher::default(),
        json!({"type": "format", "input": input, "output": output, "rules": {"global": {"font": {"name": "Arial"}}}}),
    );
    assert_eq!(result["status"], "failed");
    assert_eq!(result["kind"], "CorruptDocumentError");
    assert!(!output.exists());

    let not_a_docx = dir.path().join("garbage.docx");
    std::fs::write(&not_a_docx, b"PK\x03\x04 truncated").unwrap();
    let result = run(
        &Dispatcher::default(),
        json!({"type": "scan_template", "input": not_a_docx}),
    );
    assert_ne!(result["status"], "success");
    assert!(result["kind"].is_string());
}

#[test]
fn test_scan_template_job() {
    let dir = tempfile::tempdir().unwrap();
    let master = write_docx(dir.path(), "master.docx", &master_body());

    let result = run(
        &Dispatcher::default(),
        json!({"type": "scan_template", "input": master, "category": "skripsi"}),
    );

    assert_eq!(result["status"], "success");
    assert_eq!(result["rules"]["margin"]["top_cm"], 4.0);
    assert_eq!(result["rules"]["margin"]["right_cm"], 3.0);
    assert_eq!(result["rules"]["font"]["name"], "Cambria");
    assert_eq!(result["rules"]["category"], "skripsi");
}

#[test]
fn test_compress_pdf_job() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("thesis.pdf");
    std::fs::write(&pdf, vec![b'%'; 1000]).unwrap();

    let dispatcher = Dispatcher::default().with_compressor(Arc::new(MockCompressor));
    let result = run(&dispatcher, json!({"type": "compress_pdf", "input": pdf}));

    assert_eq!(result["status"], "success");
    assert_eq!(result["original_size"], 1000);
    assert_eq!(result["compressed_size"], 100);
    assert_eq!(result["saved_percent"], "90.00%");

    let compressed = dir.path().join("thesis_compressed.pdf");
    assert_eq!(result["output_path"], compressed.to_str().unwrap());
    assert_eq!(std::fs::metadata(&compressed).unwrap().len(), 100);
}

#[test]
fn test_typed_job_round_trip() {
    let job = Job::ScanTemplate {
        input: "master.docx".into(),
        category: None,
    };
    let json = serde_json::to_value(&job).unwrap();
    assert_eq!(json, json!({"type": "scan_template", "input": "master.docx"}));

    let result = Dispatcher::default().run(&job);
    assert_eq!(result.status, JobStatus::Error);
    assert!(!result.is_success());
}
