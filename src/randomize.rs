//! Metadata synthesis.
//!
//! [`generate_metadata`] builds a complete replacement [`MetadataSet`] from
//! fixed value pools and uniform ranges. [`Randomizer::randomize_file`] writes
//! it into a copy of a JPEG, discarding every original metadata segment.
//!
//! Nothing here is seeded: callers (and tests) can only rely on the shape of
//! the output and the ranges values are drawn from.

use chrono::{Duration, Local, NaiveDateTime};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::exif::{
    DecodedJpeg, FieldId, FieldValue, MetadataSet, Rational, WriteOptions, encode_utf16le,
    write_metadata_set,
};
use crate::shell::{ShellProperties, ShellProps, platform_default};

pub const ISO_VALUES: [u16; 6] = [100, 200, 400, 800, 1600, 3200];

pub const EXPOSURE_TIMES: [Rational; 6] = [
    Rational::new(1, 60),
    Rational::new(1, 125),
    Rational::new(1, 250),
    Rational::new(1, 500),
    Rational::new(1, 1000),
    Rational::new(1, 2000),
];

pub const F_NUMBERS: [Rational; 6] = [
    Rational::new(18, 10),
    Rational::new(28, 10),
    Rational::new(40, 10),
    Rational::new(56, 10),
    Rational::new(80, 10),
    Rational::new(110, 10),
];

pub const FOCAL_LENGTHS: [Rational; 6] = [
    Rational::new(24, 1),
    Rational::new(35, 1),
    Rational::new(50, 1),
    Rational::new(85, 1),
    Rational::new(105, 1),
    Rational::new(200, 1),
];

const MAKE_NAMES: [&str; 5] = ["Camera", "Optica", "Lumix", "Photon", "Vista"];
const MODEL_NAMES: [&str; 5] = ["Model", "Series", "Mark", "Pro", "Alpha"];
const SOFTWARE_NAMES: [&str; 5] = ["Software", "Studio", "Editor", "Darkroom", "Develop"];

/// Highest point on Earth, in meters.
pub const MAX_ALTITUDE_M: f64 = 8848.0;

const EXIF_VERSION: &[u8; 4] = b"0230";
const FLASHPIX_VERSION: &[u8; 4] = b"0100";
const GPS_VERSION: [u8; 4] = [2, 2, 0, 0];

const RESOLUTION_DPI: Rational = Rational::new(72, 1);
const RESOLUTION_UNIT_INCHES: u16 = 2;
const ORIENTATION_NORMAL: u16 = 1;
const COLOR_SPACE_SRGB: u16 = 1;
const ALTITUDE_ABOVE_SEA_LEVEL: u8 = 0;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const GPS_DATE_FORMAT: &str = "%Y:%m:%d";

/// Why a file could not be randomized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    NotFound,
    Decode,
    Encode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not found",
            Self::Decode => "decode error",
            Self::Encode => "encode error",
        })
    }
}

#[derive(Debug, Clone, Error)]
pub enum RandomizeError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Failed to write {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}

impl RandomizeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Decode { .. } => FailureKind::Decode,
            Self::Encode { .. } => FailureKind::Encode,
        }
    }

    fn decode(path: &Path, err: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        }
    }

    fn encode(path: &Path, err: impl fmt::Display) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        }
    }
}

/// Settings for one randomization run, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct RandomizeOptions {
    pub full: bool,
    pub windows_props: bool,
    pub max_age_days: u32,
    pub prefix: String,
    pub reencode: bool,
    pub jpeg_quality: u8,
    pub rewrite_after_save: bool,
}

impl Default for RandomizeOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RandomizeOptions {
    fn from(config: &Config) -> Self {
        Self {
            full: config.randomize.full,
            windows_props: config.randomize.windows_props,
            max_age_days: config.randomize.max_age_days,
            prefix: config.output.prefix.clone(),
            reencode: config.output.reencode,
            jpeg_quality: config.output.jpeg_quality,
            rewrite_after_save: config.output.rewrite_after_save,
        }
    }
}

/// Writes randomized copies of JPEG files.
pub struct Randomizer {
    options: RandomizeOptions,
    shell: Box<dyn ShellProperties>,
}

impl Randomizer {
    pub fn new(options: RandomizeOptions) -> Self {
        Self {
            options,
            shell: platform_default(),
        }
    }

    /// Use a custom shell property hook instead of the platform default.
    pub fn with_shell(mut self, shell: Box<dyn ShellProperties>) -> Self {
        self.shell = shell;
        self
    }

    pub fn options(&self) -> &RandomizeOptions {
        &self.options
    }

    /// Write `<dir>/<prefix><name>` carrying a freshly generated metadata set.
    ///
    /// The input file is never modified. An existing output file is overwritten.
    pub fn randomize_file(&self, path: &Path) -> Result<PathBuf, RandomizeError> {
        if !path.is_file() {
            return Err(RandomizeError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| RandomizeError::decode(path, e))?;
        let decoded = DecodedJpeg::from_bytes(bytes).map_err(|e| RandomizeError::decode(path, e))?;
        log::debug!(
            "Decoded {} ({}x{})",
            path.display(),
            decoded.pixels().width(),
            decoded.pixels().height()
        );

        let mut rng = rand::rng();
        let now = Local::now().naive_local();
        let text = self.options.full.then(|| random_text(&mut rng));
        let set = compose_metadata(&mut rng, now, &self.options, text.as_ref());
        log::debug!("Generated {} field(s)", set.len());

        let write_options = WriteOptions {
            reencode: self.options.reencode,
            jpeg_quality: self.options.jpeg_quality,
        };
        let out_bytes = write_metadata_set(decoded, &set, &write_options)
            .map_err(|e| RandomizeError::encode(path, e))?;

        let output = output_path(path, &self.options.prefix).ok_or_else(|| {
            RandomizeError::encode(path, "input path has no file name")
        })?;
        if output == path {
            return Err(RandomizeError::encode(
                path,
                "output path equals the input; set a non-empty prefix",
            ));
        }
        std::fs::write(&output, out_bytes).map_err(|e| RandomizeError::encode(&output, e))?;

        if self.options.rewrite_after_save {
            rewrite_in_place(&output).map_err(|e| RandomizeError::encode(&output, e))?;
        }

        if let Some(props) = text.filter(|_| self.options.windows_props) {
            if let Err(e) = self.shell.apply(&output, &props) {
                log::warn!(
                    "{} shell properties not applied to {}: {e:#}",
                    self.shell.name(),
                    output.display()
                );
            }
        }

        log::info!("Wrote {}", output.display());
        Ok(output)
    }
}

/// `<dir>/<prefix><file name>`, or `None` if `path` has no file name.
pub fn output_path(path: &Path, prefix: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_string_lossy();
    Some(path.with_file_name(format!("{prefix}{name}")))
}

fn rewrite_in_place(path: &Path) -> std::io::Result<()> {
    let bytes = std::fs::read(path)?;
    std::fs::write(path, bytes)
}

/// Generate a complete replacement metadata set.
///
/// Camera identity, resolution and orientation are always present. With
/// `options.full` the set also carries timestamps, exposure settings,
/// descriptive text and a GPS directory.
pub fn generate_metadata<R: Rng + ?Sized>(
    rng: &mut R,
    now: NaiveDateTime,
    options: &RandomizeOptions,
) -> MetadataSet {
    let text = options.full.then(|| random_text(rng));
    compose_metadata(rng, now, options, text.as_ref())
}

fn compose_metadata<R: Rng + ?Sized>(
    rng: &mut R,
    now: NaiveDateTime,
    options: &RandomizeOptions,
    text: Option<&ShellProps>,
) -> MetadataSet {
    let mut set = MetadataSet::new();

    set.set_ascii(FieldId::Make, pooled_name(rng, &MAKE_NAMES));
    set.set_ascii(FieldId::Model, pooled_name(rng, &MODEL_NAMES));
    set.set_ascii(FieldId::Software, pooled_name(rng, &SOFTWARE_NAMES));
    set.set_rationals(FieldId::XResolution, &[RESOLUTION_DPI]);
    set.set_rationals(FieldId::YResolution, &[RESOLUTION_DPI]);
    set.set(FieldId::ResolutionUnit, FieldValue::Short(vec![RESOLUTION_UNIT_INCHES]));
    set.set(FieldId::Orientation, FieldValue::Short(vec![ORIENTATION_NORMAL]));

    let Some(text) = text.filter(|_| options.full) else {
        return set;
    };

    let captured = capture_time(rng, now, options.max_age_days);
    let stamp = captured.format(EXIF_DATETIME_FORMAT).to_string();
    set.set_ascii(FieldId::DateTime, stamp.clone());
    set.set_ascii(FieldId::DateTimeOriginal, stamp.clone());
    set.set_ascii(FieldId::DateTimeDigitized, stamp);

    set.set(FieldId::IsoSpeed, FieldValue::Short(vec![pick(rng, &ISO_VALUES)]));
    set.set_rationals(FieldId::ExposureTime, &[pick(rng, &EXPOSURE_TIMES)]);
    set.set_rationals(FieldId::FNumber, &[pick(rng, &F_NUMBERS)]);
    set.set_rationals(FieldId::FocalLength, &[pick(rng, &FOCAL_LENGTHS)]);
    set.set(FieldId::ExifVersion, FieldValue::Undefined(EXIF_VERSION.to_vec()));
    set.set(FieldId::FlashpixVersion, FieldValue::Undefined(FLASHPIX_VERSION.to_vec()));
    set.set(FieldId::ColorSpace, FieldValue::Short(vec![COLOR_SPACE_SRGB]));
    set.set_ascii(FieldId::ImageUniqueId, unique_id(rng));

    set.set_ascii(FieldId::DocumentName, text.title.clone());
    set.set_ascii(FieldId::ImageDescription, text.subject.clone());
    set.set_ascii(FieldId::Artist, text.author.clone());
    set.set_ascii(
        FieldId::Copyright,
        format!("Copyright {} {}", captured.format("%Y"), text.author),
    );

    if options.windows_props {
        for (field, value) in [
            (FieldId::XpTitle, &text.title),
            (FieldId::XpSubject, &text.subject),
            (FieldId::XpKeywords, &text.tags),
            (FieldId::XpComment, &text.comments),
            (FieldId::XpAuthor, &text.author),
        ] {
            set.set(field, FieldValue::Byte(encode_utf16le(value)));
        }
    }

    add_gps(rng, &mut set, captured);
    set
}

fn add_gps<R: Rng + ?Sized>(rng: &mut R, set: &mut MetadataSet, captured: NaiveDateTime) {
    let latitude: f64 = rng.random_range(-90.0..90.0);
    let longitude: f64 = rng.random_range(-180.0..180.0);
    let altitude: f64 = rng.random_range(0.0..=MAX_ALTITUDE_M);

    set.set(FieldId::GpsVersionId, FieldValue::Byte(GPS_VERSION.to_vec()));
    set.set_ascii(FieldId::GpsLatitudeRef, if latitude >= 0.0 { "N" } else { "S" });
    set.set_rationals(FieldId::GpsLatitude, &decimal_to_dms(latitude));
    set.set_ascii(FieldId::GpsLongitudeRef, if longitude >= 0.0 { "E" } else { "W" });
    set.set_rationals(FieldId::GpsLongitude, &decimal_to_dms(longitude));
    set.set(FieldId::GpsAltitudeRef, FieldValue::Byte(vec![ALTITUDE_ABOVE_SEA_LEVEL]));
    set.set_rationals(
        FieldId::GpsAltitude,
        &[Rational::new((altitude * 100.0).trunc() as u32, 100)],
    );

    // Hour, minute and second are drawn independently.
    let time = [
        Rational::new(rng.random_range(0..24), 1),
        Rational::new(rng.random_range(0..60), 1),
        Rational::new(rng.random_range(0..60), 1),
    ];
    set.set_rationals(FieldId::GpsTimeStamp, &time);
    set.set_ascii(FieldId::GpsDateStamp, captured.format(GPS_DATE_FORMAT).to_string());
}

/// Convert decimal degrees to an unsigned degrees/minutes/seconds triple.
///
/// Each step truncates toward zero. Seconds carry two decimal places
/// (denominator 100). The sign is dropped; it belongs in the hemisphere
/// reference.
pub fn decimal_to_dms(value: f64) -> [Rational; 3] {
    let value = value.abs();
    let degrees = value.trunc();
    let minutes_f = (value - degrees) * 60.0;
    let minutes = minutes_f.trunc();
    let centiseconds = ((minutes_f - minutes) * 60.0 * 100.0).trunc();
    [
        Rational::new(degrees as u32, 1),
        Rational::new(minutes as u32, 1),
        Rational::new(centiseconds as u32, 100),
    ]
}

fn capture_time<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime, max_age_days: u32) -> NaiveDateTime {
    let window = i64::from(max_age_days) * 24 * 60 * 60;
    now - Duration::seconds(rng.random_range(0..=window))
}

fn pooled_name<R: Rng + ?Sized, const N: usize>(rng: &mut R, pool: &[&str; N]) -> String {
    let name = pick(rng, pool);
    format!("{name}{}", rng.random_range(10..=999))
}

/// Uniform choice from a fixed pool.
fn pick<R: Rng + ?Sized, T: Copy, const N: usize>(rng: &mut R, options: &[T; N]) -> T {
    const { assert!(N > 0, "value pools must not be empty") };
    options[rng.random_range(0..N)]
}

/// Ten uppercase hex digits.
fn unique_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:010X}", rng.random_range(0..1u64 << 40))
}

fn random_text<R: Rng + ?Sized>(rng: &mut R) -> ShellProps {
    let n = rng.random_range(1000..=9999);
    ShellProps {
        title: format!("Image {n}"),
        subject: format!("Photo {}", rng.random_range(1000..=9999)),
        tags: format!("photo;image;random{}", rng.random_range(100..=999)),
        comments: format!("Processed image {}", rng.random_range(1000..=9999)),
        author: format!("Photographer{}", rng.random_range(100..=999)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::{DirectoryKind, dms_to_decimal, gps_position};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn full() -> RandomizeOptions {
        RandomizeOptions::default()
    }

    fn minimal() -> RandomizeOptions {
        RandomizeOptions {
            full: false,
            ..RandomizeOptions::default()
        }
    }

    fn ascii(set: &MetadataSet, field: FieldId) -> String {
        set.get(field).and_then(FieldValue::as_ascii).unwrap().to_string()
    }

    fn single_rational(set: &MetadataSet, field: FieldId) -> Rational {
        set.get(field).and_then(FieldValue::as_rationals).unwrap()[0]
    }

    // ── decimal_to_dms ───────────────────────────────────────────────

    #[test]
    fn dms_truncates_each_step() {
        // 48.8584 -> 48° 51' 30.24"
        let dms = decimal_to_dms(48.8584);
        assert_eq!(dms[0], Rational::new(48, 1));
        assert_eq!(dms[1], Rational::new(51, 1));
        assert!((3023..=3024).contains(&dms[2].num));
        assert_eq!(dms[2].den, 100);
    }

    #[test]
    fn dms_drops_sign() {
        assert_eq!(decimal_to_dms(-33.5), decimal_to_dms(33.5));
        assert_eq!(decimal_to_dms(-33.5)[1], Rational::new(30, 1));
    }

    #[test]
    fn dms_round_trips_within_truncation_error() {
        for value in [0.0, 2.2945, 48.8584, 89.999, 179.5] {
            let back = dms_to_decimal(&decimal_to_dms(value), "N").unwrap();
            assert!(back <= value + 1e-9, "{back} > {value}");
            assert!(value - back < 0.01 / 3600.0 + 1e-9);
        }
    }

    // ── generate_metadata ────────────────────────────────────────────

    #[test]
    fn minimal_has_identity_resolution_orientation_only() {
        let set = generate_metadata(&mut rand::rng(), now(), &minimal());
        let expected: BTreeSet<FieldId> = [
            FieldId::Make,
            FieldId::Model,
            FieldId::Orientation,
            FieldId::XResolution,
            FieldId::YResolution,
            FieldId::ResolutionUnit,
            FieldId::Software,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.field_ids(), expected);
        assert!(set.directory(DirectoryKind::Gps).is_empty());
        assert_eq!(single_rational(&set, FieldId::XResolution), Rational::new(72, 1));
        assert_eq!(set.get(FieldId::Orientation).unwrap().first_short(), Some(1));
    }

    #[test]
    fn camera_names_follow_template() {
        for _ in 0..50 {
            let set = generate_metadata(&mut rand::rng(), now(), &minimal());
            for (field, pool) in [
                (FieldId::Make, MAKE_NAMES),
                (FieldId::Model, MODEL_NAMES),
                (FieldId::Software, SOFTWARE_NAMES),
            ] {
                let value = ascii(&set, field);
                let name = pool.iter().find(|n| value.starts_with(**n)).unwrap();
                let suffix = &value[name.len()..];
                assert!((2..=3).contains(&suffix.len()), "{value}");
                assert!(suffix.chars().all(|c| c.is_ascii_digit()), "{value}");
            }
        }
    }

    #[test]
    fn full_values_are_drawn_from_pools() {
        for _ in 0..50 {
            let set = generate_metadata(&mut rand::rng(), now(), &full());
            let iso = set.get(FieldId::IsoSpeed).unwrap().first_short().unwrap();
            assert!(ISO_VALUES.contains(&iso));
            assert!(EXPOSURE_TIMES.contains(&single_rational(&set, FieldId::ExposureTime)));
            assert!(F_NUMBERS.contains(&single_rational(&set, FieldId::FNumber)));
            assert!(FOCAL_LENGTHS.contains(&single_rational(&set, FieldId::FocalLength)));
        }
    }

    #[test]
    fn timestamps_share_one_value_within_window() {
        let set = generate_metadata(&mut rand::rng(), now(), &full());
        let stamp = ascii(&set, FieldId::DateTime);
        assert_eq!(stamp, ascii(&set, FieldId::DateTimeOriginal));
        assert_eq!(stamp, ascii(&set, FieldId::DateTimeDigitized));

        let parsed = NaiveDateTime::parse_from_str(&stamp, EXIF_DATETIME_FORMAT).unwrap();
        assert!(parsed <= now());
        assert!(parsed >= now() - Duration::days(730));

        let date = ascii(&set, FieldId::GpsDateStamp);
        assert_eq!(date, parsed.format(GPS_DATE_FORMAT).to_string());
    }

    #[test]
    fn unique_id_is_ten_uppercase_hex_digits() {
        for _ in 0..50 {
            let id = unique_id(&mut rand::rng());
            assert_eq!(id.len(), 10);
            assert!(id.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn gps_values_within_ranges() {
        for _ in 0..200 {
            let set = generate_metadata(&mut rand::rng(), now(), &full());
            let pos = gps_position(&set).unwrap();
            assert!((-90.0..90.0).contains(&pos.latitude), "{}", pos.latitude);
            assert!((-180.0..180.0).contains(&pos.longitude), "{}", pos.longitude);
            let alt = pos.altitude.unwrap();
            assert!((0.0..=MAX_ALTITUDE_M).contains(&alt), "{alt}");

            let time = set.get(FieldId::GpsTimeStamp).and_then(FieldValue::as_rationals).unwrap();
            assert!(time[0].num < 24 && time[1].num < 60 && time[2].num < 60);
        }
    }

    #[test]
    fn hemisphere_matches_sign() {
        for _ in 0..50 {
            let set = generate_metadata(&mut rand::rng(), now(), &full());
            let lat_ref = ascii(&set, FieldId::GpsLatitudeRef);
            let lon_ref = ascii(&set, FieldId::GpsLongitudeRef);
            assert!(lat_ref == "N" || lat_ref == "S");
            assert!(lon_ref == "E" || lon_ref == "W");
            let pos = gps_position(&set).unwrap();
            assert_eq!(lat_ref == "S", pos.latitude < 0.0);
            assert_eq!(lon_ref == "W", pos.longitude < 0.0);
        }
    }

    #[test]
    fn windows_props_toggle_xp_fields() {
        let with = generate_metadata(&mut rand::rng(), now(), &full());
        assert!(with.field_ids().iter().any(|f| f.is_xp()));

        let options = RandomizeOptions {
            windows_props: false,
            ..full()
        };
        let without = generate_metadata(&mut rand::rng(), now(), &options);
        assert!(!without.field_ids().iter().any(|f| f.is_xp()));

        // The title is still carried outside the Windows properties.
        let title = ascii(&without, FieldId::DocumentName);
        assert!(title.starts_with("Image "), "{title}");
        assert_eq!(ascii(&with, FieldId::DocumentName).len(), "Image 1234".len());
    }

    #[test]
    fn pick_reaches_every_pool_entry() {
        let mut rng = rand::rng();
        let seen: BTreeSet<&str> = (0..500).map(|_| pick(&mut rng, &MAKE_NAMES)).collect();
        assert_eq!(seen.len(), MAKE_NAMES.len());
        let seen: BTreeSet<u16> = (0..500).map(|_| pick(&mut rng, &ISO_VALUES)).collect();
        assert_eq!(seen.len(), ISO_VALUES.len());
    }

    #[test]
    fn same_field_set_across_runs() {
        let a = generate_metadata(&mut rand::rng(), now(), &full());
        let b = generate_metadata(&mut rand::rng(), now(), &full());
        assert_eq!(a.field_ids(), b.field_ids());
    }

    // ── errors and paths ─────────────────────────────────────────────

    #[test]
    fn output_path_prefixes_file_name() {
        assert_eq!(
            output_path(Path::new("/photos/a.jpg"), "modified_"),
            Some(PathBuf::from("/photos/modified_a.jpg"))
        );
        assert_eq!(output_path(Path::new("/"), "modified_"), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let randomizer = Randomizer::new(RandomizeOptions::default());
        let err = randomizer
            .randomize_file(Path::new("/nonexistent/photo.jpg"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[test]
    fn failure_kinds_serialize_kebab_case() {
        assert_eq!(serde_json::to_string(&FailureKind::NotFound).unwrap(), "\"not-found\"");
        assert_eq!(FailureKind::Encode.to_string(), "encode error");
    }
}
