//! Human-readable rendering of a [`MetadataSet`].
//!
//! Formatting never fails: anything that cannot be decoded is rendered as a
//! placeholder line instead.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::model::{DirectoryKind, FieldId, FieldValue, MetadataSet, Rational};
use super::reader::read_metadata;

/// A single `label: value` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

impl ReportLine {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A titled group of rows (basic info, capture info, GPS).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub lines: Vec<ReportLine>,
}

/// The rendered form of one image's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataReport {
    pub sections: Vec<ReportSection>,
}

impl MetadataReport {
    /// Find a row by section title and label.
    pub fn value(&self, section: &str, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title == section)?
            .lines
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.value.as_str())
    }
}

impl fmt::Display for MetadataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "  {}", section.title)?;
            for line in &section.lines {
                writeln!(f, "    {:<22} : {}", line.label, line.value)?;
            }
        }
        Ok(())
    }
}

pub const SECTION_BASIC: &str = "Basic Info";
pub const SECTION_CAPTURE: &str = "Capture Info";
pub const SECTION_GPS: &str = "GPS";

const NO_FIELDS: &str = "(no fields)";
const NO_GPS: &str = "No GPS data";

/// Read `path` and render its metadata; read problems become a placeholder.
pub fn describe_file(path: &Path) -> MetadataReport {
    match read_metadata(path) {
        Ok(set) => format_metadata(&set),
        Err(e) => MetadataReport {
            sections: vec![ReportSection {
                title: SECTION_BASIC.to_string(),
                lines: vec![ReportLine::new("Error", format!("Could not read metadata: {e}"))],
            }],
        },
    }
}

/// Render a metadata set grouped by directory.
pub fn format_metadata(set: &MetadataSet) -> MetadataReport {
    MetadataReport {
        sections: vec![
            directory_section(set, DirectoryKind::Primary, SECTION_BASIC),
            directory_section(set, DirectoryKind::Exif, SECTION_CAPTURE),
            gps_section(set),
        ],
    }
}

fn directory_section(set: &MetadataSet, kind: DirectoryKind, title: &str) -> ReportSection {
    let mut lines: Vec<ReportLine> = set
        .directory(kind)
        .iter()
        .map(|(field, value)| ReportLine::new(field.label(), format_value(field, value)))
        .collect();
    if lines.is_empty() {
        lines.push(ReportLine::new("Status", NO_FIELDS));
    }
    ReportSection {
        title: title.to_string(),
        lines,
    }
}

/// Render one value, special-casing exposure time, f-number and focal length.
pub fn format_value(field: FieldId, value: &FieldValue) -> String {
    match (field, value) {
        (FieldId::ExposureTime, FieldValue::Rational(r)) if r.len() == 1 => format_exposure_time(r[0]),
        (FieldId::FNumber, FieldValue::Rational(r)) if r.len() == 1 => format_f_number(r[0]),
        (FieldId::FocalLength, FieldValue::Rational(r)) if r.len() == 1 => format_focal_length(r[0]),
        (f, FieldValue::Byte(b)) if f.is_xp() => decode_utf16le(b),
        (_, FieldValue::Ascii(s)) => ascii_lossy(s),
        (_, FieldValue::Byte(b)) | (_, FieldValue::Undefined(b)) if is_textual(field) => {
            decode_ascii_lossy(b)
        }
        (_, FieldValue::Byte(b)) | (_, FieldValue::Undefined(b)) => join(b.iter()),
        (_, FieldValue::Short(v)) => join(v.iter()),
        (_, FieldValue::Rational(r)) => join(r.iter()),
    }
}

fn is_textual(field: FieldId) -> bool {
    matches!(field, FieldId::ExifVersion | FieldId::FlashpixVersion)
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// `1/250s` for sub-second exposures, `2.0s` otherwise.
pub fn format_exposure_time(r: Rational) -> String {
    if r.num == 0 || r.den == 0 {
        return r.to_string();
    }
    let reciprocal = r.den as f64 / r.num as f64;
    if reciprocal >= 1.0 {
        format!("1/{}s", reciprocal.round() as u64)
    } else {
        format!("{:.1}s", r.num as f64 / r.den as f64)
    }
}

/// `f/2.8`
pub fn format_f_number(r: Rational) -> String {
    match r.to_f64() {
        Some(v) => format!("f/{v:.1}"),
        None => r.to_string(),
    }
}

/// `50.0mm`
pub fn format_focal_length(r: Rational) -> String {
    match r.to_f64() {
        Some(v) => format!("{v:.1}mm"),
        None => r.to_string(),
    }
}

/// Decode bytes as ASCII, replacing anything outside the range.
pub fn decode_ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|b| **b != 0)
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

/// Replace every non-ASCII character of an already decoded string.
pub fn ascii_lossy(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|u| *u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Convert a degrees/minutes/seconds triple back to signed decimal degrees.
///
/// `S` and `W` references negate the result. Returns `None` unless the
/// triple has exactly three rationals with non-zero denominators.
pub fn dms_to_decimal(dms: &[Rational], reference: &str) -> Option<f64> {
    let [d, m, s] = dms else {
        return None;
    };
    let value = d.to_f64()? + m.to_f64()? / 60.0 + s.to_f64()? / 3600.0;
    match reference.trim() {
        "S" | "W" => Some(-value),
        _ => Some(value),
    }
}

fn coordinate(set: &MetadataSet, value: FieldId, reference: FieldId) -> Option<Option<f64>> {
    let dms = set.get(value)?;
    let reference = set.get(reference).and_then(FieldValue::as_ascii).unwrap_or("");
    Some(dms.as_rationals().and_then(|r| dms_to_decimal(r, reference)))
}

/// Latitude, longitude, altitude, as the formatter decodes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Recover decimal coordinates from a GPS directory, if present and well-formed.
pub fn gps_position(set: &MetadataSet) -> Option<GpsPosition> {
    let latitude = coordinate(set, FieldId::GpsLatitude, FieldId::GpsLatitudeRef)??;
    let longitude = coordinate(set, FieldId::GpsLongitude, FieldId::GpsLongitudeRef)??;
    Some(GpsPosition {
        latitude,
        longitude,
        altitude: altitude(set),
    })
}

fn altitude(set: &MetadataSet) -> Option<f64> {
    let meters = set
        .get(FieldId::GpsAltitude)?
        .as_rationals()?
        .first()?
        .to_f64()?;
    let below_sea_level = set.get(FieldId::GpsAltitudeRef).and_then(FieldValue::first_byte) == Some(1);
    Some(if below_sea_level { -meters } else { meters })
}

fn gps_section(set: &MetadataSet) -> ReportSection {
    let mut lines = Vec::new();
    let gps = set.directory(DirectoryKind::Gps);

    if gps.is_empty() {
        lines.push(ReportLine::new("Status", NO_GPS));
    } else {
        match coordinate(set, FieldId::GpsLatitude, FieldId::GpsLatitudeRef) {
            Some(Some(lat)) => lines.push(ReportLine::new("Latitude", format!("{lat:.6}"))),
            Some(None) => lines.push(ReportLine::new("Latitude", "(could not parse)")),
            None => lines.push(ReportLine::new("Latitude", "(not present)")),
        }
        match coordinate(set, FieldId::GpsLongitude, FieldId::GpsLongitudeRef) {
            Some(Some(lon)) => lines.push(ReportLine::new("Longitude", format!("{lon:.6}"))),
            Some(None) => lines.push(ReportLine::new("Longitude", "(could not parse)")),
            None => lines.push(ReportLine::new("Longitude", "(not present)")),
        }
        if gps.get(FieldId::GpsAltitude).is_some() {
            let text = altitude(set)
                .map(|a| format!("{a:.2} m"))
                .unwrap_or_else(|| "(could not parse)".to_string());
            lines.push(ReportLine::new("Altitude", text));
        }
        if let Some(time) = gps.get(FieldId::GpsTimeStamp) {
            lines.push(ReportLine::new("GPS Time", format_gps_time(time)));
        }
        if let Some(date) = gps.get(FieldId::GpsDateStamp) {
            lines.push(ReportLine::new(
                "GPS Date",
                format_value(FieldId::GpsDateStamp, date),
            ));
        }
    }

    ReportSection {
        title: SECTION_GPS.to_string(),
        lines,
    }
}

fn format_gps_time(value: &FieldValue) -> String {
    let parts: Option<Vec<u32>> = value.as_rationals().and_then(|r| {
        if r.len() != 3 {
            return None;
        }
        r.iter().map(|p| p.to_f64().map(|v| v as u32)).collect()
    });
    match parts.as_deref() {
        Some([h, m, s]) => format!("{h:02}:{m:02}:{s:02}"),
        _ => "(could not parse)".to_string(),
    }
}
