//! EXIF metadata model, reading, writing and display.
//!
//! - [`MetadataSet`] — the four IFDs of one EXIF block as typed fields
//! - [`read_metadata`] — decode a file's EXIF block into a set
//! - [`write_metadata_set`] — strip a JPEG's metadata segments and splice in a new block
//! - [`format_metadata`] — render a set as labeled lines for display

mod format;
mod model;
mod reader;
mod writer;

pub use format::{
    GpsPosition, MetadataReport, ReportLine, ReportSection, SECTION_BASIC, SECTION_CAPTURE,
    SECTION_GPS, describe_file, dms_to_decimal, format_exposure_time, format_f_number,
    format_focal_length, format_metadata, format_value, gps_position,
};
pub use model::{DirectoryKind, FieldId, FieldValue, MetadataDirectory, MetadataSet, Rational};
pub use reader::read_metadata;
pub use writer::{
    DecodedJpeg, WriteOptions, encode_exif_block, encode_utf16le, splice_exif, strip_metadata,
    write_metadata_set,
};
