//! Test fixtures: small JPEGs with and without EXIF blocks.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use exif_scramble::exif::{
    DecodedJpeg, FieldId, FieldValue, MetadataSet, Rational, WriteOptions, write_metadata_set,
};
use exif_scramble::randomize::decimal_to_dms;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

pub const EIFFEL_LAT: f64 = 48.8584;
pub const EIFFEL_LON: f64 = 2.2945;
pub const EIFFEL_ALT: f64 = 330.0;

/// A 100x100 red JPEG with no metadata at all.
pub fn plain_jpeg_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, image::Rgb([255, 0, 0])));
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 95))
        .unwrap();
    buf
}

pub fn write_plain_jpeg(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, plain_jpeg_bytes()).unwrap();
    path
}

/// Camera fields plus the Eiffel Tower position (48.8584 N, 2.2945 E, 330 m).
pub fn eiffel_metadata() -> MetadataSet {
    let mut set = MetadataSet::new();
    set.set_ascii(FieldId::Make, "TestCamera");
    set.set_ascii(FieldId::Model, "TestModel");
    set.set(FieldId::GpsVersionId, FieldValue::Byte(vec![2, 2, 0, 0]));
    set.set_ascii(FieldId::GpsLatitudeRef, "N");
    set.set_rationals(FieldId::GpsLatitude, &decimal_to_dms(EIFFEL_LAT));
    set.set_ascii(FieldId::GpsLongitudeRef, "E");
    set.set_rationals(FieldId::GpsLongitude, &decimal_to_dms(EIFFEL_LON));
    set.set_rationals(FieldId::GpsAltitude, &[Rational::new(EIFFEL_ALT as u32, 1)]);
    set.set(FieldId::GpsAltitudeRef, FieldValue::Byte(vec![0]));
    set
}

pub fn write_eiffel_jpeg(dir: &Path, name: &str) -> PathBuf {
    let decoded = DecodedJpeg::from_bytes(plain_jpeg_bytes()).unwrap();
    let bytes = write_metadata_set(decoded, &eiffel_metadata(), &WriteOptions::default()).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
