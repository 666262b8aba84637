use anyhow::Result;
use little_exif::endian::Endian;
use little_exif::exif_tag::ExifTag;
use little_exif::ifd::ExifTagGroup;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;
use std::path::Path;

use super::format::ascii_lossy;
use super::model::{DirectoryKind, FieldId, FieldValue, MetadataSet, Rational};

/// Read the EXIF block of an image into a [`MetadataSet`].
///
/// A file without EXIF (or with EXIF little_exif cannot parse) yields an
/// empty set. Only a missing file is an error.
pub fn read_metadata(path: &Path) -> Result<MetadataSet> {
    if !path.is_file() {
        anyhow::bail!("No such file: {}", path.display());
    }

    let mut set = MetadataSet::new();
    let Some(metadata) = load_existing_metadata(path) else {
        return Ok(set);
    };

    for tag in &metadata {
        if let Some((field, value)) = from_exif_tag(tag) {
            set.set(field, value);
        }
    }

    log::debug!("Read {} known EXIF field(s) from {}", set.len(), path.display());
    Ok(set)
}

/// Load EXIF metadata from a file path using little_exif.
/// Returns None if there is nothing to read or it can't parse.
fn load_existing_metadata(path: &Path) -> Option<Metadata> {
    let path_owned = path.to_path_buf();
    // Suppress panics from little_exif
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(move || Metadata::new_from_path(&path_owned));
    std::panic::set_hook(prev_hook);

    match result {
        Ok(Ok(m)) => Some(m),
        Ok(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        Err(_) => {
            log::debug!("little_exif panicked parsing EXIF");
            None
        }
    }
}

fn from_ur64(values: &[uR64]) -> FieldValue {
    FieldValue::Rational(
        values
            .iter()
            .map(|r| Rational::new(r.nominator, r.denominator))
            .collect(),
    )
}

/// little_exif falls back to Latin-1 for invalid UTF-8; only ASCII is kept.
fn ascii(s: &str) -> FieldValue {
    FieldValue::Ascii(ascii_lossy(s.trim_end_matches('\0')))
}

fn from_exif_tag(tag: &ExifTag) -> Option<(FieldId, FieldValue)> {
    let pair = match tag {
        ExifTag::ImageDescription(s) => (FieldId::ImageDescription, ascii(s)),
        ExifTag::Make(s) => (FieldId::Make, ascii(s)),
        ExifTag::Model(s) => (FieldId::Model, ascii(s)),
        ExifTag::Orientation(v) => (FieldId::Orientation, FieldValue::Short(v.clone())),
        ExifTag::XResolution(r) => (FieldId::XResolution, from_ur64(r)),
        ExifTag::YResolution(r) => (FieldId::YResolution, from_ur64(r)),
        ExifTag::ResolutionUnit(v) => (FieldId::ResolutionUnit, FieldValue::Short(v.clone())),
        ExifTag::Software(s) => (FieldId::Software, ascii(s)),
        ExifTag::ModifyDate(s) => (FieldId::DateTime, ascii(s)),
        ExifTag::Artist(s) => (FieldId::Artist, ascii(s)),
        ExifTag::Copyright(s) => (FieldId::Copyright, ascii(s)),
        ExifTag::ExposureTime(r) => (FieldId::ExposureTime, from_ur64(r)),
        ExifTag::FNumber(r) => (FieldId::FNumber, from_ur64(r)),
        ExifTag::ISO(v) => (FieldId::IsoSpeed, FieldValue::Short(v.clone())),
        ExifTag::ExifVersion(b) => (FieldId::ExifVersion, FieldValue::Undefined(b.clone())),
        ExifTag::DateTimeOriginal(s) => (FieldId::DateTimeOriginal, ascii(s)),
        ExifTag::CreateDate(s) => (FieldId::DateTimeDigitized, ascii(s)),
        ExifTag::FocalLength(r) => (FieldId::FocalLength, from_ur64(r)),
        ExifTag::FlashpixVersion(b) => (FieldId::FlashpixVersion, FieldValue::Undefined(b.clone())),
        ExifTag::ColorSpace(v) => (FieldId::ColorSpace, FieldValue::Short(v.clone())),
        ExifTag::ImageUniqueID(s) => (FieldId::ImageUniqueId, ascii(s)),
        ExifTag::GPSVersionID(b) => (FieldId::GpsVersionId, FieldValue::Byte(b.clone())),
        ExifTag::GPSLatitudeRef(s) => (FieldId::GpsLatitudeRef, ascii(s)),
        ExifTag::GPSLatitude(r) => (FieldId::GpsLatitude, from_ur64(r)),
        ExifTag::GPSLongitudeRef(s) => (FieldId::GpsLongitudeRef, ascii(s)),
        ExifTag::GPSLongitude(r) => (FieldId::GpsLongitude, from_ur64(r)),
        ExifTag::GPSAltitudeRef(b) => (FieldId::GpsAltitudeRef, FieldValue::Byte(b.clone())),
        ExifTag::GPSAltitude(r) => (FieldId::GpsAltitude, from_ur64(r)),
        ExifTag::GPSTimeStamp(r) => (FieldId::GpsTimeStamp, from_ur64(r)),
        ExifTag::GPSDateStamp(s) => (FieldId::GpsDateStamp, ascii(s)),
        ExifTag::UnknownSTRING(s, code, ExifTagGroup::GENERIC)
            if *code == FieldId::DocumentName.code() =>
        {
            (FieldId::DocumentName, ascii(s))
        }
        other => {
            // XP* tags have no dedicated variant; recognise them by code.
            if other.get_group() != ExifTagGroup::GENERIC {
                return None;
            }
            let field = FieldId::from_code(DirectoryKind::Primary, other.as_u16())
                .filter(|f| f.is_xp())?;
            (field, FieldValue::Byte(other.value_as_u8_vec(&Endian::Little)))
        }
    };
    Some(pair)
}
