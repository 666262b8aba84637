//! # exif-scramble
//!
//! Replace the EXIF metadata of JPEG files with plausible random values: camera
//! identity, capture timestamps, exposure settings, descriptive text and GPS
//! position. The original file is left untouched; a prefixed copy carries the
//! new metadata.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_scramble::config::Config;
//! use exif_scramble::pipeline::{CollectOptions, collect_images, run_batch};
//! use exif_scramble::randomize::{RandomizeOptions, Randomizer};
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let randomizer = Randomizer::new(RandomizeOptions::from(&config));
//!
//!     let images = collect_images(&[PathBuf::from("./photos")], CollectOptions::CLI);
//!     let summary = run_batch(&images, &randomizer, &config.display, |_, result| {
//!         match &result.outcome {
//!             Ok(out) => println!("Wrote {}", out.display()),
//!             Err(e) => eprintln!("{e}"),
//!         }
//!     });
//!
//!     println!("{} of {} succeeded", summary.succeeded, summary.processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! ```rust,no_run
//! use exif_scramble::exif::{format_metadata, read_metadata};
//! use exif_scramble::randomize::{RandomizeOptions, generate_metadata};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let existing = read_metadata(Path::new("photo.jpg"))?;
//! println!("{}", format_metadata(&existing));
//!
//! let now = chrono::Local::now().naive_local();
//! let fresh = generate_metadata(&mut rand::rng(), now, &RandomizeOptions::default());
//! println!("{}", format_metadata(&fresh));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`exif`] — Metadata model, EXIF reading/writing, display formatting
//! - [`pipeline`] — Input expansion, per-file processing, batch summaries
//! - [`randomize`] — Random metadata synthesis and the file randomizer
//! - [`shell`] — Optional desktop shell property hook

pub mod config;
pub mod exif;
pub mod pipeline;
pub mod randomize;
pub mod shell;
