use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};

use exif_scramble::exif::{self, MetadataReport};
use exif_scramble::{config, pipeline, randomize};

#[derive(Parser, Debug)]
#[command(
    name = "exif-scramble",
    version,
    about = "Replace camera, timestamp, exposure and GPS metadata in JPEG files with random values"
)]
struct Cli {
    /// JPEG files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Process every .jpg/.jpeg file in a folder (top level only)
    #[arg(short, long, value_name = "DIR", conflicts_with = "paths")]
    folder: Option<PathBuf>,

    /// Print each file's metadata before randomizing [default: from config]
    #[arg(short = 'b', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    display_before: Option<bool>,

    /// Print each output file's metadata [default: from config]
    #[arg(short = 'a', long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    display_after: Option<bool>,

    /// Do not write Windows title/subject/tags/comments/author properties
    #[arg(long)]
    no_windows_props: bool,

    /// Only replace camera identity, resolution and orientation
    #[arg(long)]
    minimal: bool,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Display EXIF metadata and exit
    #[arg(long = "show-exif")]
    show_exif: bool,
}

impl Cli {
    fn inputs(&self) -> Vec<PathBuf> {
        match &self.folder {
            Some(folder) => vec![folder.clone()],
            None => self.paths.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let inputs = cli.inputs();
    if inputs.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let images = pipeline::collect_images(&inputs, pipeline::CollectOptions::CLI);
    if images.is_empty() {
        log::warn!("No JPEG files found in the specified paths.");
    }

    // Handle --show-exif
    if cli.show_exif {
        for image_path in &images {
            let report = exif::describe_file(image_path);
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "path": image_path.display().to_string(),
                        "metadata": report,
                    }))?
                );
            } else {
                print_report("File", image_path, &report);
            }
        }
        return Ok(());
    }

    // Load config, then let flags override it
    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.minimal {
        config.randomize.full = false;
    }
    if cli.no_windows_props {
        config.randomize.windows_props = false;
    }
    if let Some(before) = cli.display_before {
        config.display.before = before;
    }
    if let Some(after) = cli.display_after {
        config.display.after = after;
    }

    log::info!(
        "Found {} file(s) to process ({} randomization)",
        images.len(),
        if config.randomize.full { "full" } else { "minimal" }
    );

    let randomizer = randomize::Randomizer::new(randomize::RandomizeOptions::from(&config));

    let mut records = Vec::new();
    let summary = pipeline::run_batch(&images, &randomizer, &config.display, |_, result| {
        if cli.json {
            records.push(result.to_record());
            return;
        }
        if let Some(ref before) = result.before {
            print_report("Before", &result.path, before);
        }
        match &result.outcome {
            Ok(out) => {
                println!("{GREEN}✓{RESET} {} → {}", result.path.display(), out.display());
                if let Some(ref after) = result.after {
                    print_report("After", out, after);
                }
            }
            Err(e) => println!("{RED}✗{RESET} {} ({})", result.path.display(), e.kind()),
        }
    });

    // JSON output
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "results": records,
                "summary": summary,
            }))?
        );
        return Ok(());
    }

    // Summary
    println!();
    println!("{BOLD}Summary{RESET}");
    println!("  Processed : {}", summary.processed);
    println!("  Succeeded : {}", summary.succeeded);
    println!("  Failed    : {}", summary.failed);
    for (kind, count) in &summary.by_kind {
        println!("    {DIM}{:<12}{RESET} {count}", kind.to_string());
    }

    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print a metadata report, organized by section.
fn print_report(heading: &str, path: &Path, report: &MetadataReport) {
    println!();
    println!("{BOLD}{heading}:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    for section in &report.sections {
        println!("  {BOLD}{}{RESET}", section.title);
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for line in &section.lines {
            print_row(&line.label, &line.value);
        }
        println!();
    }
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
