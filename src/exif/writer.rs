use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};
use little_exif::endian::Endian;
use little_exif::exif_tag::ExifTag;
use little_exif::exif_tag_format::ExifTagFormat;
use little_exif::filetype::FileExtension;
use little_exif::ifd::ExifTagGroup;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;

use super::model::{FieldId, FieldValue, MetadataSet, Rational};

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// img-parts set_exif() expects just the TIFF data (after Exif\0\0)
const JPEG_EXIF_OVERHEAD: usize = 10; // 2 + 2 + 6

const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP13: u8 = 0xED;
const MARKER_COM: u8 = 0xFE;

const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// A JPEG that has been parsed into segments and fully decoded once.
///
/// Decoding the pixels up front is what distinguishes a corrupt or non-JPEG
/// input from a failure later on while writing.
pub struct DecodedJpeg {
    jpeg: Jpeg,
    pixels: DynamicImage,
}

impl DecodedJpeg {
    /// Parse the segment structure and decode the raster.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let pixels = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .context("Failed to decode JPEG pixel data")?;
        let jpeg = Jpeg::from_bytes(Bytes::from(bytes))
            .map_err(|e| anyhow::anyhow!("Failed to parse JPEG: {e}"))?;
        Ok(Self { jpeg, pixels })
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// How the output JPEG is assembled.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Re-encode the decoded raster instead of reusing the original scan data.
    pub reencode: bool,
    /// JPEG quality for re-encoding (1-100).
    pub jpeg_quality: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            reencode: false,
            jpeg_quality: 95,
        }
    }
}

/// Build the JPEG bytes for `decoded` carrying exactly the directories in `set`.
///
/// Every original metadata segment (EXIF, XMP, IPTC, comments) is discarded
/// first; nothing from the source block survives into the output.
pub fn write_metadata_set(
    decoded: DecodedJpeg,
    set: &MetadataSet,
    options: &WriteOptions,
) -> Result<Vec<u8>> {
    let mut jpeg = if options.reencode {
        reencode(&decoded.pixels, options.jpeg_quality)?
    } else {
        decoded.jpeg
    };

    let removed = strip_metadata(&mut jpeg);
    log::debug!("Stripped {removed} metadata segment(s)");

    let tiff = encode_exif_block(set)?;
    splice_exif(&mut jpeg, tiff);

    Ok(jpeg.encoder().bytes().to_vec())
}

/// Remove every APP1 (EXIF/XMP), APP13 (IPTC) and COM segment.
pub fn strip_metadata(jpeg: &mut Jpeg) -> usize {
    let segments = jpeg.segments_mut();
    let before = segments.len();
    segments.retain(|s| !matches!(s.marker(), MARKER_APP1 | MARKER_APP13 | MARKER_COM));
    before - segments.len()
}

/// Insert a TIFF-encoded EXIF block as the APP1 segment right after APP0.
pub fn splice_exif(jpeg: &mut Jpeg, tiff: Vec<u8>) {
    jpeg.set_exif(Some(Bytes::from(tiff)));

    // set_exif() inserts at a fixed index; EXIF readers expect it to lead.
    let target_pos = jpeg
        .segments()
        .iter()
        .position(|s| s.marker() == MARKER_APP0)
        .map(|p| p + 1)
        .unwrap_or(0);
    if let Some(new_pos) = find_exif_segment_pos(jpeg) {
        if new_pos != target_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            let target_pos = target_pos.min(segments.len());
            segments.insert(target_pos, seg);
        }
    }
}

/// Find the position of the EXIF APP1 segment in a JPEG.
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    find_exif_segment_pos_from_segments(jpeg.segments())
}

fn find_exif_segment_pos_from_segments(segments: &[JpegSegment]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s.marker() == MARKER_APP1 && s.contents().starts_with(EXIF_PREFIX))
}

/// Encode the decoded raster as a fresh baseline JPEG with no metadata.
fn reencode(pixels: &DynamicImage, quality: u8) -> Result<Jpeg> {
    let img = if pixels.color().has_color() {
        DynamicImage::ImageRgb8(pixels.to_rgb8())
    } else {
        DynamicImage::ImageLuma8(pixels.to_luma8())
    };

    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))
        .context("Failed to re-encode JPEG")?;

    Jpeg::from_bytes(Bytes::from(buf)).map_err(|e| anyhow::anyhow!("Failed to parse re-encoded JPEG: {e}"))
}

/// Serialize a metadata set to the TIFF payload of an EXIF APP1 segment.
pub fn encode_exif_block(set: &MetadataSet) -> Result<Vec<u8>> {
    let mut metadata = Metadata::new();
    for (field, value) in set.iter() {
        match to_exif_tag(field, value) {
            Some(tag) => metadata.set_tag(tag),
            None => log::warn!("Skipping {field:?}: unsupported value {value:?}"),
        }
    }

    let exif_bytes = metadata
        .as_u8_vec(FileExtension::JPEG)
        .context("Failed to serialize EXIF block")?;
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        anyhow::bail!("little_exif produced an empty EXIF block");
    }
    Ok(exif_bytes[JPEG_EXIF_OVERHEAD..].to_vec())
}

fn to_ur64(values: &[Rational]) -> Vec<uR64> {
    values
        .iter()
        .map(|r| uR64 {
            nominator: r.num,
            denominator: r.den,
        })
        .collect()
}

/// Create an IFD0 tag little_exif has no named variant for.
fn make_raw_tag(tag_id: u16, format: ExifTagFormat, raw_data: &[u8]) -> Option<ExifTag> {
    ExifTag::from_u16_with_data(
        tag_id,
        &format,
        &raw_data.to_vec(),
        &Endian::Little,
        &ExifTagGroup::GENERIC,
    )
    .ok()
}

/// Map one field onto the corresponding little_exif tag.
fn to_exif_tag(field: FieldId, value: &FieldValue) -> Option<ExifTag> {
    use FieldValue::*;

    let tag = match (field, value) {
        (FieldId::ImageDescription, Ascii(s)) => ExifTag::ImageDescription(s.clone()),
        (FieldId::Make, Ascii(s)) => ExifTag::Make(s.clone()),
        (FieldId::Model, Ascii(s)) => ExifTag::Model(s.clone()),
        (FieldId::Orientation, Short(v)) => ExifTag::Orientation(v.clone()),
        (FieldId::XResolution, Rational(r)) => ExifTag::XResolution(to_ur64(r)),
        (FieldId::YResolution, Rational(r)) => ExifTag::YResolution(to_ur64(r)),
        (FieldId::ResolutionUnit, Short(v)) => ExifTag::ResolutionUnit(v.clone()),
        (FieldId::Software, Ascii(s)) => ExifTag::Software(s.clone()),
        (FieldId::DateTime, Ascii(s)) => ExifTag::ModifyDate(s.clone()),
        (FieldId::Artist, Ascii(s)) => ExifTag::Artist(s.clone()),
        (FieldId::Copyright, Ascii(s)) => ExifTag::Copyright(s.clone()),
        (f, Byte(b)) if f.is_xp() => return make_raw_tag(f.code(), ExifTagFormat::INT8U, b),
        (f @ FieldId::DocumentName, Ascii(s)) => {
            return make_raw_tag(f.code(), ExifTagFormat::STRING, s.as_bytes());
        }
        (FieldId::ExposureTime, Rational(r)) => ExifTag::ExposureTime(to_ur64(r)),
        (FieldId::FNumber, Rational(r)) => ExifTag::FNumber(to_ur64(r)),
        (FieldId::IsoSpeed, Short(v)) => ExifTag::ISO(v.clone()),
        (FieldId::ExifVersion, Undefined(b)) => ExifTag::ExifVersion(b.clone()),
        (FieldId::DateTimeOriginal, Ascii(s)) => ExifTag::DateTimeOriginal(s.clone()),
        (FieldId::DateTimeDigitized, Ascii(s)) => ExifTag::CreateDate(s.clone()),
        (FieldId::FocalLength, Rational(r)) => ExifTag::FocalLength(to_ur64(r)),
        (FieldId::FlashpixVersion, Undefined(b)) => ExifTag::FlashpixVersion(b.clone()),
        (FieldId::ColorSpace, Short(v)) => ExifTag::ColorSpace(v.clone()),
        (FieldId::ImageUniqueId, Ascii(s)) => ExifTag::ImageUniqueID(s.clone()),
        (FieldId::GpsVersionId, Byte(b)) => ExifTag::GPSVersionID(b.clone()),
        (FieldId::GpsLatitudeRef, Ascii(s)) => ExifTag::GPSLatitudeRef(s.clone()),
        (FieldId::GpsLatitude, Rational(r)) => ExifTag::GPSLatitude(to_ur64(r)),
        (FieldId::GpsLongitudeRef, Ascii(s)) => ExifTag::GPSLongitudeRef(s.clone()),
        (FieldId::GpsLongitude, Rational(r)) => ExifTag::GPSLongitude(to_ur64(r)),
        (FieldId::GpsAltitudeRef, Byte(b)) => ExifTag::GPSAltitudeRef(b.clone()),
        (FieldId::GpsAltitude, Rational(r)) => ExifTag::GPSAltitude(to_ur64(r)),
        (FieldId::GpsTimeStamp, Rational(r)) => ExifTag::GPSTimeStamp(to_ur64(r)),
        (FieldId::GpsDateStamp, Ascii(s)) => ExifTag::GPSDateStamp(s.clone()),
        _ => return None,
    };
    Some(tag)
}

/// Encode a string as UTF-16LE bytes with a trailing NUL (XP* tag layout).
pub fn encode_utf16le(s: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = s.encode_utf16().flat_map(|c| c.to_le_bytes()).collect();
    bytes.push(0);
    bytes.push(0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn tiny_jpeg() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, image::Rgb([200, 30, 30])));
        let mut buf = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 90))
            .unwrap();
        buf
    }

    #[test]
    fn utf16le_is_nul_terminated() {
        assert_eq!(encode_utf16le("Hi"), vec![b'H', 0, b'i', 0, 0, 0]);
    }

    #[test]
    fn mismatched_value_type_is_rejected() {
        assert!(to_exif_tag(FieldId::Make, &FieldValue::Short(vec![1])).is_none());
        assert!(to_exif_tag(FieldId::Make, &FieldValue::Ascii("Camera10".into())).is_some());
    }

    #[test]
    fn strip_removes_comments_and_app1() {
        let mut jpeg = Jpeg::from_bytes(Bytes::from(tiny_jpeg())).unwrap();
        let segments = jpeg.segments_mut();
        segments.insert(1, JpegSegment::new_with_contents(MARKER_COM, Bytes::from_static(b"hello")));
        segments.insert(
            1,
            JpegSegment::new_with_contents(MARKER_APP1, Bytes::from_static(b"Exif\0\0MM\0*")),
        );

        assert_eq!(strip_metadata(&mut jpeg), 2);
        assert!(jpeg.segments().iter().all(|s| s.marker() != MARKER_COM));
        assert!(find_exif_segment_pos(&jpeg).is_none());
    }

    #[test]
    fn spliced_exif_follows_app0() {
        let mut set = MetadataSet::new();
        set.set_ascii(FieldId::Make, "Camera10");
        let decoded = DecodedJpeg::from_bytes(tiny_jpeg()).unwrap();
        let out = write_metadata_set(decoded, &set, &WriteOptions::default()).unwrap();

        let jpeg = Jpeg::from_bytes(Bytes::from(out)).unwrap();
        let app0 = jpeg.segments().iter().position(|s| s.marker() == MARKER_APP0);
        let exif = find_exif_segment_pos(&jpeg);
        assert!(exif.is_some());
        assert_eq!(exif, app0.map(|p| p + 1).or(Some(0)));
    }

    #[test]
    fn reencode_keeps_dimensions() {
        let decoded = DecodedJpeg::from_bytes(tiny_jpeg()).unwrap();
        let options = WriteOptions {
            reencode: true,
            jpeg_quality: 80,
        };
        let mut set = MetadataSet::new();
        set.set_ascii(FieldId::Software, "Studio123");
        let out = write_metadata_set(decoded, &set, &options).unwrap();

        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (16, 8));
    }

    #[test]
    fn gps_directory_is_encoded() {
        let mut set = MetadataSet::new();
        set.set_ascii(FieldId::Make, "Camera10");
        set.set_ascii(FieldId::DocumentName, "Image 1234");
        set.set(FieldId::GpsVersionId, FieldValue::Byte(vec![2, 2, 0, 0]));
        set.set_ascii(FieldId::GpsLatitudeRef, "S");
        set.set_rationals(
            FieldId::GpsLatitude,
            &[Rational::new(33, 1), Rational::new(51, 1), Rational::new(3144, 100)],
        );
        set.set_rationals(FieldId::GpsAltitude, &[Rational::new(5812, 100)]);
        set.set_ascii(FieldId::GpsDateStamp, "2024:05:17");
        set.set(FieldId::XpTitle, FieldValue::Byte(encode_utf16le("Image 1234")));

        let decoded = DecodedJpeg::from_bytes(tiny_jpeg()).unwrap();
        let out = write_metadata_set(decoded, &set, &WriteOptions::default()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gps.jpg");
        std::fs::write(&path, out).unwrap();

        let read = crate::exif::read_metadata(&path).unwrap();
        assert_eq!(read.field_ids(), set.field_ids());
        assert_eq!(read.get(FieldId::GpsLatitudeRef).and_then(FieldValue::as_ascii), Some("S"));
        assert_eq!(
            read.get(FieldId::GpsAltitude).and_then(FieldValue::as_rationals),
            Some(&[Rational::new(5812, 100)][..])
        );
        assert_eq!(read.get(FieldId::XpTitle), set.get(FieldId::XpTitle));
        assert_eq!(read.get(FieldId::DocumentName), set.get(FieldId::DocumentName));
    }

    #[test]
    fn garbage_is_not_decodable() {
        assert!(DecodedJpeg::from_bytes(b"not a jpeg at all".to_vec()).is_err());
    }
}
