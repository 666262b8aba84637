use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DisplayConfig;
use crate::exif::{MetadataReport, describe_file};
use crate::randomize::{FailureKind, RandomizeError, Randomizer};

/// Extensions picked up when expanding a directory.
const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// How directories in the input list are expanded.
///
/// The command-line driver matches only the top level of a folder and
/// compares extensions exactly; the desktop front end walks sub-folders and
/// ignores case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectOptions {
    /// Descend into sub-directories.
    pub recursive: bool,
    /// Match `.JPG` as well as `.jpg`.
    pub ignore_case: bool,
}

impl CollectOptions {
    pub const CLI: Self = Self {
        recursive: false,
        ignore_case: false,
    };

    pub const GUI: Self = Self {
        recursive: true,
        ignore_case: true,
    };
}

/// Expand a list of files and directories into the files to process.
///
/// Directories contribute their `.jpg`/`.jpeg` entries in file-name order.
/// Anything that is not a directory is passed through untouched, so a missing
/// or non-JPEG file still reaches the randomizer and is reported as a failure.
/// Repeated paths are kept once, in first-seen order.
///
/// # Example
///
/// ```rust,no_run
/// use exif_scramble::pipeline::{CollectOptions, collect_images};
/// use std::path::PathBuf;
///
/// let images = collect_images(
///     &[PathBuf::from("photo.jpg"), PathBuf::from("./photos/")],
///     CollectOptions::CLI,
/// );
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf], options: CollectOptions) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut walker = WalkDir::new(path).follow_links(true).sort_by_file_name();
            if !options.recursive {
                walker = walker.max_depth(1);
            }
            let before = images.len();
            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && is_jpeg(p, options.ignore_case) && seen.insert(p.to_path_buf()) {
                    images.push(p.to_path_buf());
                }
            }
            if images.len() == before {
                log::warn!("No JPEG files found in {}", path.display());
            }
        } else if seen.insert(path.clone()) {
            if !path.exists() {
                log::warn!("Path does not exist: {}", path.display());
            }
            images.push(path.clone());
        }
    }

    images
}

/// Check if a file has a `.jpg` or `.jpeg` extension.
fn is_jpeg(path: &Path, ignore_case: bool) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            if ignore_case {
                JPEG_EXTENSIONS.contains(&ext.to_lowercase().as_str())
            } else {
                JPEG_EXTENSIONS.contains(&ext)
            }
        })
        .unwrap_or(false)
}

/// The outcome of randomizing a single file.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub path: PathBuf,
    /// The output file, or why none was written.
    pub outcome: Result<PathBuf, RandomizeError>,
    /// The input's metadata, when requested.
    pub before: Option<MetadataReport>,
    /// The output's metadata, when requested and the write succeeded.
    pub after: Option<MetadataReport>,
}

impl ProcessResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// A serializable view for machine-readable output.
    pub fn to_record(&self) -> ProcessRecord {
        let (output, error, kind) = match &self.outcome {
            Ok(out) => (Some(out.clone()), None, None),
            Err(e) => (None, Some(e.to_string()), Some(e.kind())),
        };
        ProcessRecord {
            path: self.path.clone(),
            output,
            error,
            kind,
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<MetadataReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<MetadataReport>,
}

/// Randomize one file, capturing the before/after reports `display` asks for.
///
/// Never panics or returns early: every failure ends up in
/// [`ProcessResult::outcome`].
pub fn process_image(path: &Path, randomizer: &Randomizer, display: &DisplayConfig) -> ProcessResult {
    let before = display.before.then(|| describe_file(path));

    let outcome = randomizer.randomize_file(path);
    if let Err(ref e) = outcome {
        log::error!("{e}");
    }

    let after = match &outcome {
        Ok(out) if display.after => Some(describe_file(out)),
        _ => None,
    };

    ProcessResult {
        path: path.to_path_buf(),
        outcome,
        before,
        after,
    }
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures broken down by cause.
    pub by_kind: BTreeMap<FailureKind, usize>,
}

impl BatchSummary {
    pub fn record(&mut self, result: &ProcessResult) {
        self.processed += 1;
        match &result.outcome {
            Ok(_) => self.succeeded += 1,
            Err(e) => {
                self.failed += 1;
                *self.by_kind.entry(e.kind()).or_default() += 1;
            }
        }
    }
}

/// Randomize every file in order, continuing past failures.
///
/// `on_result` sees each result as soon as it is available.
pub fn run_batch(
    images: &[PathBuf],
    randomizer: &Randomizer,
    display: &DisplayConfig,
    mut on_result: impl FnMut(usize, &ProcessResult),
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (i, path) in images.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, images.len(), path.display());
        let result = process_image(path, randomizer, display);
        summary.record(&result);
        on_result(i, &result);
    }
    summary
}
