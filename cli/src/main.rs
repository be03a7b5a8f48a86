//! docnorm CLI - DOCX formatting normalization tool

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docnorm::{
    Dispatcher, Document, EngineConfig, Formatter, RuleSchema, ScanOptions, Scanner,
    StyleTransfer, WarningKind, ZoneDetector,
};

#[derive(Parser)]
#[command(name = "docnorm")]
#[command(version)]
#[command(about = "Normalize DOCX formatting against a style template", long_about = None)]
struct Cli {
    /// Directory holding <category>/master.docx templates
    #[arg(long, global = true, env = "DOCNORM_TEMPLATES_ROOT", value_name = "DIR")]
    templates_root: Option<PathBuf>,

    /// Let a new zone heading close the zone before it
    #[arg(long, global = true)]
    split_on_anchor: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a rule set from a master document
    Scan {
        /// Reference DOCX file
        #[arg(value_name = "FILE")]
        reference: PathBuf,

        /// Category label stored in the rules
        #[arg(short, long)]
        category: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Apply a JSON rule set to a document
    Format {
        /// Input DOCX file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Rule set (full schema or scanner output)
        #[arg(value_name = "RULES")]
        rules: PathBuf,

        /// Output DOCX file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Copy margins, page size and font from a reference document
    Transfer {
        /// Target DOCX file
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Reference DOCX file or template category
        #[arg(value_name = "REFERENCE")]
        reference: String,

        /// Output DOCX file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Show the zones detected in a document
    Zones {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Run a JSON job descriptor ("-" reads stdin)
    Job {
        #[arg(value_name = "JOB")]
        descriptor: String,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = engine_config(&cli);

    let result = match cli.command {
        Commands::Scan {
            reference,
            category,
            output,
        } => cmd_scan(&config, &reference, category, output.as_deref()),
        Commands::Format {
            input,
            rules,
            output,
        } => cmd_format(&config, &input, &rules, &output),
        Commands::Transfer {
            target,
            reference,
            output,
        } => cmd_transfer(&config, &target, &reference, &output),
        Commands::Zones { input, json } => cmd_zones(&config, &input, json),
        Commands::Job { descriptor } => cmd_job(config, &descriptor),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(root) = &cli.templates_root {
        config = config.with_templates_root(root);
    }
    let detector = config.detector.clone().with_split_on_anchor(cli.split_on_anchor);
    config.with_detector(detector)
}

fn cmd_scan(
    config: &EngineConfig,
    reference: &Path,
    category: Option<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options: ScanOptions = config.scan.clone();
    if let Some(category) = category {
        options = options.with_category(category);
    }

    let template = Scanner::new(options).scan_file(reference)?;
    let json = template.to_json()?;

    if template.font.is_default {
        eprintln!(
            "{} no run fonts found, using {}",
            "Note:".yellow(),
            template.font.name
        );
    }

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_format(
    config: &EngineConfig,
    input: &Path,
    rules: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading rules...");
    let schema = RuleSchema::from_file(rules)?;
    schema.validate()?;
    pb.inc(1);

    pb.set_message("Reading document...");
    let mut doc = Document::open(input)?;
    pb.inc(1);

    pb.set_message("Applying rules...");
    let report = Formatter::new(config.detector.clone()).apply(&mut doc, &schema)?;
    pb.inc(1);

    pb.set_message("Saving...");
    doc.save(output)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{} {}", "Saved to".green().bold(), output.display());
    println!(
        "  {} {} zone(s) detected, {} body paragraph(s) formatted",
        "├─".dimmed(),
        report.zones.len(),
        report.globally_formatted
    );

    if report.warnings.is_empty() {
        println!("  {} no warnings", "└─".dimmed());
    } else {
        let last = report.warnings.len() - 1;
        for (i, warning) in report.warnings.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            let message = match warning.kind {
                WarningKind::AbstractTooLong { .. } => warning.message.yellow(),
                WarningKind::ZoneNotFound { .. } => warning.message.dimmed(),
            };
            println!("  {} {}", branch.dimmed(), message);
        }
    }

    Ok(())
}

fn cmd_transfer(
    config: &EngineConfig,
    target: &Path,
    reference: &str,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = config.resolve_template(reference)?;
    let summary = StyleTransfer::new(config.transfer.clone()).transfer_file(target, &reference, output)?;

    println!("{} {}", "Saved to".green().bold(), output.display());
    println!("{}: {}", "Reference".bold(), reference.display());
    println!(
        "{}: T={:.2} B={:.2} L={:.2} R={:.2} cm",
        "Margins".bold(),
        summary.margins.top.cm(),
        summary.margins.bottom.cm(),
        summary.margins.left.cm(),
        summary.margins.right.cm()
    );
    println!(
        "{}: {:.2} x {:.2} cm",
        "Page".bold(),
        summary.page_width.cm(),
        summary.page_height.cm()
    );
    let font_note = if summary.font_is_default { " (default)" } else { "" };
    println!("{}: {}{}", "Font".bold(), summary.font_name, font_note.dimmed());

    Ok(())
}

fn cmd_zones(config: &EngineConfig, input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open(input)?;
    let zones = ZoneDetector::new(config.detector.clone()).detect(&doc);

    if json {
        println!("{}", serde_json::to_string_pretty(&zones)?);
        return Ok(());
    }

    println!("{}", "Detected Zones".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    if zones.is_empty() {
        println!("{}", "No zones found".yellow());
        return Ok(());
    }

    for zone in &zones {
        let heading = doc
            .paragraph(zone.anchor)
            .map(|p| p.text())
            .unwrap_or_default();
        println!(
            "{} #{} {}",
            zone.kind.to_string().bold(),
            zone.anchor,
            heading.trim().dimmed()
        );
        if zone.kind.is_keyword_zone() {
            println!(
                "  {} {} paragraph(s), {} words",
                "└─".dimmed(),
                zone.members.len(),
                zone.word_count(&doc)
            );
        }
    }

    Ok(())
}

fn cmd_job(config: EngineConfig, descriptor: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = if descriptor == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(descriptor)?
    };

    let result = Dispatcher::new(config).run_json(&json);
    println!("{}", result.to_json());

    if !result.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docnorm".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX formatting normalization tool");
    println!();
    println!("License: MIT");
}
