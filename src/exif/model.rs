use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One of the EXIF tag groups stored in a JPEG's APP1 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectoryKind {
    /// IFD0 ("0th"): camera identity, resolution, Windows XP* properties.
    Primary,
    /// Exif sub-IFD: capture settings and timestamps.
    Exif,
    /// GPS sub-IFD.
    Gps,
    /// IFD1 ("1st"): thumbnail directory. Never populated by the randomizer.
    Thumbnail,
}

impl DirectoryKind {
    pub const ALL: [DirectoryKind; 4] = [Self::Primary, Self::Exif, Self::Gps, Self::Thumbnail];

    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "0th",
            Self::Exif => "Exif",
            Self::Gps => "GPS",
            Self::Thumbnail => "1st",
        }
    }
}

/// The closed set of tags this crate reads, generates and renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    // IFD0
    DocumentName,
    ImageDescription,
    Make,
    Model,
    Orientation,
    XResolution,
    YResolution,
    ResolutionUnit,
    Software,
    DateTime,
    Artist,
    Copyright,
    XpTitle,
    XpComment,
    XpAuthor,
    XpKeywords,
    XpSubject,
    // Exif IFD
    ExposureTime,
    FNumber,
    IsoSpeed,
    ExifVersion,
    DateTimeOriginal,
    DateTimeDigitized,
    FocalLength,
    FlashpixVersion,
    ColorSpace,
    ImageUniqueId,
    // GPS IFD
    GpsVersionId,
    GpsLatitudeRef,
    GpsLatitude,
    GpsLongitudeRef,
    GpsLongitude,
    GpsAltitudeRef,
    GpsAltitude,
    GpsTimeStamp,
    GpsDateStamp,
}

impl FieldId {
    pub const ALL: [FieldId; 36] = [
        Self::DocumentName,
        Self::ImageDescription,
        Self::Make,
        Self::Model,
        Self::Orientation,
        Self::XResolution,
        Self::YResolution,
        Self::ResolutionUnit,
        Self::Software,
        Self::DateTime,
        Self::Artist,
        Self::Copyright,
        Self::XpTitle,
        Self::XpComment,
        Self::XpAuthor,
        Self::XpKeywords,
        Self::XpSubject,
        Self::ExposureTime,
        Self::FNumber,
        Self::IsoSpeed,
        Self::ExifVersion,
        Self::DateTimeOriginal,
        Self::DateTimeDigitized,
        Self::FocalLength,
        Self::FlashpixVersion,
        Self::ColorSpace,
        Self::ImageUniqueId,
        Self::GpsVersionId,
        Self::GpsLatitudeRef,
        Self::GpsLatitude,
        Self::GpsLongitudeRef,
        Self::GpsLongitude,
        Self::GpsAltitudeRef,
        Self::GpsAltitude,
        Self::GpsTimeStamp,
        Self::GpsDateStamp,
    ];

    /// The numeric EXIF tag code.
    pub fn code(self) -> u16 {
        match self {
            Self::DocumentName => 0x010D,
            Self::ImageDescription => 0x010E,
            Self::Make => 0x010F,
            Self::Model => 0x0110,
            Self::Orientation => 0x0112,
            Self::XResolution => 0x011A,
            Self::YResolution => 0x011B,
            Self::ResolutionUnit => 0x0128,
            Self::Software => 0x0131,
            Self::DateTime => 0x0132,
            Self::Artist => 0x013B,
            Self::Copyright => 0x8298,
            Self::XpTitle => 0x9C9B,
            Self::XpComment => 0x9C9C,
            Self::XpAuthor => 0x9C9D,
            Self::XpKeywords => 0x9C9E,
            Self::XpSubject => 0x9C9F,
            Self::ExposureTime => 0x829A,
            Self::FNumber => 0x829D,
            Self::IsoSpeed => 0x8827,
            Self::ExifVersion => 0x9000,
            Self::DateTimeOriginal => 0x9003,
            Self::DateTimeDigitized => 0x9004,
            Self::FocalLength => 0x920A,
            Self::FlashpixVersion => 0xA000,
            Self::ColorSpace => 0xA001,
            Self::ImageUniqueId => 0xA420,
            Self::GpsVersionId => 0x0000,
            Self::GpsLatitudeRef => 0x0001,
            Self::GpsLatitude => 0x0002,
            Self::GpsLongitudeRef => 0x0003,
            Self::GpsLongitude => 0x0004,
            Self::GpsAltitudeRef => 0x0005,
            Self::GpsAltitude => 0x0006,
            Self::GpsTimeStamp => 0x0007,
            Self::GpsDateStamp => 0x001D,
        }
    }

    /// The directory this tag lives in.
    pub fn directory(self) -> DirectoryKind {
        match self {
            Self::DocumentName
            | Self::ImageDescription
            | Self::Make
            | Self::Model
            | Self::Orientation
            | Self::XResolution
            | Self::YResolution
            | Self::ResolutionUnit
            | Self::Software
            | Self::DateTime
            | Self::Artist
            | Self::Copyright
            | Self::XpTitle
            | Self::XpComment
            | Self::XpAuthor
            | Self::XpKeywords
            | Self::XpSubject => DirectoryKind::Primary,
            Self::ExposureTime
            | Self::FNumber
            | Self::IsoSpeed
            | Self::ExifVersion
            | Self::DateTimeOriginal
            | Self::DateTimeDigitized
            | Self::FocalLength
            | Self::FlashpixVersion
            | Self::ColorSpace
            | Self::ImageUniqueId => DirectoryKind::Exif,
            Self::GpsVersionId
            | Self::GpsLatitudeRef
            | Self::GpsLatitude
            | Self::GpsLongitudeRef
            | Self::GpsLongitude
            | Self::GpsAltitudeRef
            | Self::GpsAltitude
            | Self::GpsTimeStamp
            | Self::GpsDateStamp => DirectoryKind::Gps,
        }
    }

    /// Look up a field by directory and tag code.
    pub fn from_code(directory: DirectoryKind, code: u16) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.directory() == directory && f.code() == code)
    }

    /// Windows Explorer properties stored as UTF-16LE byte arrays.
    pub fn is_xp(self) -> bool {
        matches!(
            self,
            Self::XpTitle | Self::XpComment | Self::XpAuthor | Self::XpKeywords | Self::XpSubject
        )
    }

    /// Human-readable label used by the formatter.
    pub fn label(self) -> &'static str {
        match self {
            Self::DocumentName => "Title",
            Self::ImageDescription => "Description",
            Self::Make => "Make",
            Self::Model => "Model",
            Self::Orientation => "Orientation",
            Self::XResolution => "X Resolution",
            Self::YResolution => "Y Resolution",
            Self::ResolutionUnit => "Resolution Unit",
            Self::Software => "Software",
            Self::DateTime => "Date/Time",
            Self::Artist => "Artist",
            Self::Copyright => "Copyright",
            Self::XpTitle => "Title (Windows)",
            Self::XpComment => "Comments (Windows)",
            Self::XpAuthor => "Author (Windows)",
            Self::XpKeywords => "Tags (Windows)",
            Self::XpSubject => "Subject (Windows)",
            Self::ExposureTime => "Exposure Time",
            Self::FNumber => "F-Number",
            Self::IsoSpeed => "ISO",
            Self::ExifVersion => "Exif Version",
            Self::DateTimeOriginal => "Date/Time Original",
            Self::DateTimeDigitized => "Date/Time Digitized",
            Self::FocalLength => "Focal Length",
            Self::FlashpixVersion => "Flashpix Version",
            Self::ColorSpace => "Color Space",
            Self::ImageUniqueId => "Unique ID",
            Self::GpsVersionId => "GPS Version",
            Self::GpsLatitudeRef => "Latitude Ref",
            Self::GpsLatitude => "Latitude",
            Self::GpsLongitudeRef => "Longitude Ref",
            Self::GpsLongitude => "Longitude",
            Self::GpsAltitudeRef => "Altitude Ref",
            Self::GpsAltitude => "Altitude",
            Self::GpsTimeStamp => "GPS Time",
            Self::GpsDateStamp => "GPS Date",
        }
    }
}

/// An unsigned EXIF rational, kept as the raw numerator/denominator pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Floating-point value, or `None` for a zero denominator.
    pub fn to_f64(self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// A typed tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Ascii(String),
    Byte(Vec<u8>),
    Short(Vec<u16>),
    Rational(Vec<Rational>),
    Undefined(Vec<u8>),
}

impl FieldValue {
    pub fn as_ascii(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rationals(&self) -> Option<&[Rational]> {
        match self {
            Self::Rational(r) => Some(r),
            _ => None,
        }
    }

    pub fn first_short(&self) -> Option<u16> {
        match self {
            Self::Short(v) => v.first().copied(),
            _ => None,
        }
    }

    pub fn first_byte(&self) -> Option<u8> {
        match self {
            Self::Byte(v) | Self::Undefined(v) => v.first().copied(),
            _ => None,
        }
    }
}

/// One IFD: a mapping from field identifiers to values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDirectory {
    kind: DirectoryKind,
    fields: BTreeMap<FieldId, FieldValue>,
}

impl MetadataDirectory {
    pub fn new(kind: DirectoryKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> DirectoryKind {
        self.kind
    }

    pub fn get(&self, field: FieldId) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    fn insert(&mut self, field: FieldId, value: FieldValue) -> Option<FieldValue> {
        debug_assert_eq!(field.directory(), self.kind);
        self.fields.insert(field, value)
    }
}

/// The four directories of one EXIF block.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSet {
    primary: MetadataDirectory,
    exif: MetadataDirectory,
    gps: MetadataDirectory,
    thumbnail: MetadataDirectory,
}

impl Default for MetadataSet {
    fn default() -> Self {
        Self {
            primary: MetadataDirectory::new(DirectoryKind::Primary),
            exif: MetadataDirectory::new(DirectoryKind::Exif),
            gps: MetadataDirectory::new(DirectoryKind::Gps),
            thumbnail: MetadataDirectory::new(DirectoryKind::Thumbnail),
        }
    }
}

impl MetadataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(&self, kind: DirectoryKind) -> &MetadataDirectory {
        match kind {
            DirectoryKind::Primary => &self.primary,
            DirectoryKind::Exif => &self.exif,
            DirectoryKind::Gps => &self.gps,
            DirectoryKind::Thumbnail => &self.thumbnail,
        }
    }

    fn directory_mut(&mut self, kind: DirectoryKind) -> &mut MetadataDirectory {
        match kind {
            DirectoryKind::Primary => &mut self.primary,
            DirectoryKind::Exif => &mut self.exif,
            DirectoryKind::Gps => &mut self.gps,
            DirectoryKind::Thumbnail => &mut self.thumbnail,
        }
    }

    /// Insert a value into the directory the field belongs to.
    pub fn set(&mut self, field: FieldId, value: FieldValue) -> Option<FieldValue> {
        self.directory_mut(field.directory()).insert(field, value)
    }

    pub fn set_ascii(&mut self, field: FieldId, value: impl Into<String>) {
        self.set(field, FieldValue::Ascii(value.into()));
    }

    pub fn set_rationals(&mut self, field: FieldId, value: &[Rational]) {
        self.set(field, FieldValue::Rational(value.to_vec()));
    }

    pub fn get(&self, field: FieldId) -> Option<&FieldValue> {
        self.directory(field.directory()).get(field)
    }

    /// Every populated field across all directories.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        DirectoryKind::ALL
            .into_iter()
            .flat_map(move |kind| self.directory(kind).iter())
    }

    pub fn field_ids(&self) -> BTreeSet<FieldId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        DirectoryKind::ALL
            .into_iter()
            .map(|kind| self.directory(kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
