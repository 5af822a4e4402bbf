//! Decoded atom records.
//!
//! Every record is produced once by the decoders in [`crate::decode`] and is
//! read-only afterwards; fields are reached through accessors.

use crate::boxes::{BoxHeader, FourCC, QT_BRAND};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Seconds between 1904-01-01T00:00:00Z and the Unix epoch.
pub const MAC_EPOCH_OFFSET_SECS: i64 = 2_082_844_800;

/// Converts a raw QuickTime timestamp (unsigned seconds since 1904) into an
/// absolute UTC instant, at millisecond resolution.
pub fn mac_time(raw: u32) -> DateTime<Utc> {
    let millis = (i64::from(raw) - MAC_EPOCH_OFFSET_SECS) * 1000;
    // every u32 lands well inside chrono's range
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

/// One record per `read` directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Atom {
    Generic(GenericAtom),
    MovieHeader(MovieHeaderAtom),
    SampleTable(SampleTableAtom),
}

impl Atom {
    pub fn header(&self) -> &BoxHeader {
        match self {
            Atom::Generic(a) => &a.header,
            Atom::MovieHeader(a) => &a.header,
            Atom::SampleTable(a) => &a.header,
        }
    }

    pub fn tag(&self) -> FourCC {
        self.header().typ
    }

    pub fn size(&self) -> u32 {
        self.header().size
    }

    pub fn as_movie_header(&self) -> Option<&MovieHeaderAtom> {
        match self {
            Atom::MovieHeader(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sample_table(&self) -> Option<&SampleTableAtom> {
        match self {
            Atom::SampleTable(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericAtom> {
        match self {
            Atom::Generic(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Generic(a) => a.fmt(f),
            Atom::MovieHeader(a) => a.fmt(f),
            Atom::SampleTable(a) => a.fmt(f),
        }
    }
}

/// Any atom without a specialized decoder: header plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericAtom {
    pub(crate) header: BoxHeader,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub(crate) payload: Vec<u8>,
}

impl GenericAtom {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    /// The `size - 8` bytes following the header.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Display for GenericAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} size={} payload={} bytes",
            self.header.typ,
            self.header.size,
            self.payload.len()
        )
    }
}

/// The leading `ftyp` atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTypeAtom {
    pub(crate) header: BoxHeader,
    pub(crate) major_brand: FourCC,
    pub(crate) minor_version: u32,
    pub(crate) compatible_brands: Vec<FourCC>,
}

impl FileTypeAtom {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    pub fn major_brand(&self) -> FourCC {
        self.major_brand
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn compatible_brands(&self) -> &[FourCC] {
        &self.compatible_brands
    }

    /// True when `qt  ` is the major brand or one of the compatible brands.
    pub fn is_quicktime(&self) -> bool {
        self.major_brand == QT_BRAND || self.compatible_brands.contains(&QT_BRAND)
    }
}

impl fmt::Display for FileTypeAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ftyp {} major={} minor=0x{:08X} compatible={:?}",
            if self.is_quicktime() { "QT" } else { "NoQT" },
            self.major_brand,
            self.minor_version,
            self.compatible_brands
        )
    }
}

/// `mvhd`: movie-wide timing and presentation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieHeaderAtom {
    pub(crate) header: BoxHeader,
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    pub(crate) creation_time: u32,
    pub(crate) modification_time: u32,
    pub(crate) time_scale: u32,
    pub(crate) duration: u32,
    pub(crate) rate: u32,
    pub(crate) volume: u16,
    pub(crate) reserved: [u8; 10],
    pub(crate) matrix: [i32; 9],
    pub(crate) preview_time: u32,
    pub(crate) preview_duration: u32,
    pub(crate) poster_time: u32,
    pub(crate) selection_time: u32,
    pub(crate) selection_duration: u32,
    pub(crate) current_time: u32,
    pub(crate) next_track_id: u32,
}

impl MovieHeaderAtom {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> [u8; 3] {
        self.flags
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        mac_time(self.creation_time)
    }

    pub fn modification_time(&self) -> DateTime<Utc> {
        mac_time(self.modification_time)
    }

    /// Seconds since 1904 exactly as stored.
    pub fn raw_creation_time(&self) -> u32 {
        self.creation_time
    }

    pub fn raw_modification_time(&self) -> u32 {
        self.modification_time
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// In time-scale units.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Whole seconds; `None` when the time scale is zero.
    pub fn duration_secs(&self) -> Option<u32> {
        self.duration.checked_div(self.time_scale)
    }

    pub fn fps(&self) -> f64 {
        f64::from(self.time_scale) / 1000.0
    }

    /// Raw 16.16 fixed-point playback rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn preferred_rate(&self) -> f64 {
        f64::from(self.rate) / 65536.0
    }

    /// Raw 8.8 fixed-point volume.
    pub fn volume(&self) -> u16 {
        self.volume
    }

    pub fn preferred_volume(&self) -> f64 {
        f64::from(self.volume) / 256.0
    }

    pub fn reserved(&self) -> &[u8; 10] {
        &self.reserved
    }

    pub fn matrix(&self) -> &[i32; 9] {
        &self.matrix
    }

    pub fn preview_time(&self) -> u32 {
        self.preview_time
    }

    pub fn preview_duration(&self) -> u32 {
        self.preview_duration
    }

    pub fn poster_time(&self) -> u32 {
        self.poster_time
    }

    pub fn selection_time(&self) -> u32 {
        self.selection_time
    }

    pub fn selection_duration(&self) -> u32 {
        self.selection_duration
    }

    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    pub fn next_track_id(&self) -> u32 {
        self.next_track_id
    }
}

impl fmt::Display for MovieHeaderAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mvhd created={} modified={} timescale={} duration={} rate={:.2} volume={:.2} next_track_id={}",
            self.creation_time().format("%Y-%m-%d %H:%M:%S UTC"),
            self.modification_time().format("%Y-%m-%d %H:%M:%S UTC"),
            self.time_scale,
            self.duration,
            self.preferred_rate(),
            self.preferred_volume(),
            self.next_track_id
        )
    }
}

/// `stsd`: the sample-description table of one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleTableAtom {
    pub(crate) header: BoxHeader,
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    pub(crate) entries: Vec<SampleDescription>,
}

impl SampleTableAtom {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> [u8; 3] {
        self.flags
    }

    /// Equal to the declared entry count.
    pub fn entries(&self) -> &[SampleDescription] {
        &self.entries
    }
}

impl fmt::Display for SampleTableAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stsd entries={}", self.entries.len())?;
        for e in &self.entries {
            write!(f, "\n  {e}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleDescription {
    Video(VideoSampleDescription),
    /// A data format this crate does not model; its body was skipped.
    Unsupported { size: u32, data_format: FourCC },
}

impl SampleDescription {
    pub fn size(&self) -> u32 {
        match self {
            SampleDescription::Video(v) => v.size,
            SampleDescription::Unsupported { size, .. } => *size,
        }
    }

    pub fn data_format(&self) -> FourCC {
        match self {
            SampleDescription::Video(v) => v.data_format,
            SampleDescription::Unsupported { data_format, .. } => *data_format,
        }
    }

    pub fn as_video(&self) -> Option<&VideoSampleDescription> {
        match self {
            SampleDescription::Video(v) => Some(v),
            SampleDescription::Unsupported { .. } => None,
        }
    }
}

impl fmt::Display for SampleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleDescription::Video(v) => v.fmt(f),
            SampleDescription::Unsupported { size, data_format } => {
                write!(f, "{data_format} size={size} (not decoded)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSampleDescription {
    pub(crate) size: u32,
    pub(crate) data_format: FourCC,
    pub(crate) reserved: [u8; 6],
    pub(crate) data_reference_index: u16,
    pub(crate) version: u16,
    pub(crate) revision_level: u16,
    pub(crate) vendor: FourCC,
    pub(crate) temporal_quality: u32,
    pub(crate) spatial_quality: u32,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) horizontal_resolution: u32,
    pub(crate) vertical_resolution: u32,
    pub(crate) data_size: u32,
    pub(crate) frame_count: u16,
    pub(crate) compressor_name: String,
    pub(crate) depth: u16,
    pub(crate) color_table_id: i16,
    pub(crate) extensions: Vec<Extension>,
}

impl VideoSampleDescription {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn data_format(&self) -> FourCC {
        self.data_format
    }

    pub fn reserved(&self) -> &[u8; 6] {
        &self.reserved
    }

    pub fn data_reference_index(&self) -> u16 {
        self.data_reference_index
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn revision_level(&self) -> u16 {
        self.revision_level
    }

    pub fn vendor(&self) -> FourCC {
        self.vendor
    }

    pub fn temporal_quality(&self) -> u32 {
        self.temporal_quality
    }

    pub fn spatial_quality(&self) -> u32 {
        self.spatial_quality
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Pixels per inch, from 16.16 fixed point.
    pub fn horizontal_resolution(&self) -> f64 {
        f64::from(self.horizontal_resolution) / 65536.0
    }

    pub fn vertical_resolution(&self) -> f64 {
        f64::from(self.vertical_resolution) / 65536.0
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    pub fn frame_count(&self) -> u16 {
        self.frame_count
    }

    pub fn compressor_name(&self) -> &str {
        &self.compressor_name
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// -1 means the default color table.
    pub fn color_table_id(&self) -> i16 {
        self.color_table_id
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn color_info(&self) -> Option<&ColorInfoAtom> {
        self.extensions.iter().find_map(|e| match e {
            Extension::ColorInfo(c) => Some(c),
            _ => None,
        })
    }

    pub fn avc_config(&self) -> Option<&AvcConfigAtom> {
        self.extensions.iter().find_map(|e| match e {
            Extension::AvcConfig(c) => Some(c),
            _ => None,
        })
    }
}

impl fmt::Display for VideoSampleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} depth={} compressor={:?} extensions=[",
            self.data_format, self.width, self.height, self.depth, self.compressor_name
        )?;
        for (i, e) in self.extensions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e.header().typ)?;
        }
        write!(f, "]")
    }
}

/// Auxiliary atom following the fixed fields of a video sample description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extension {
    ColorInfo(ColorInfoAtom),
    AvcConfig(AvcConfigAtom),
    Generic(GenericAtom),
}

impl Extension {
    pub fn header(&self) -> &BoxHeader {
        match self {
            Extension::ColorInfo(a) => &a.header,
            Extension::AvcConfig(a) => &a.header,
            Extension::Generic(a) => &a.header,
        }
    }
}

/// `colr`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorInfoAtom {
    pub(crate) header: BoxHeader,
    pub(crate) parameter_type: FourCC,
    pub(crate) primaries_index: u16,
    pub(crate) transfer_function_index: u16,
    pub(crate) matrix_index: u16,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub(crate) trailing: Vec<u8>,
}

impl ColorInfoAtom {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    /// `nclc` for QuickTime, `nclx` for ISO files.
    pub fn parameter_type(&self) -> FourCC {
        self.parameter_type
    }

    pub fn primaries_index(&self) -> u16 {
        self.primaries_index
    }

    pub fn transfer_function_index(&self) -> u16 {
        self.transfer_function_index
    }

    pub fn matrix_index(&self) -> u16 {
        self.matrix_index
    }

    /// Bytes after the three indices, if the atom carries any.
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }

    pub fn full_range(&self) -> Option<bool> {
        if self.parameter_type != FourCC(*b"nclx") {
            return None;
        }
        self.trailing.first().map(|b| b & 0x80 != 0)
    }
}

/// `avcC`: the AVC decoder configuration record, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvcConfigAtom {
    pub(crate) header: BoxHeader,
    #[serde(serialize_with = "crate::util::serialize_hex")]
    pub(crate) record: Vec<u8>,
}

impl AvcConfigAtom {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    pub fn record(&self) -> &[u8] {
        &self.record
    }

    pub fn configuration_version(&self) -> Option<u8> {
        self.record.first().copied()
    }

    pub fn profile_indication(&self) -> Option<u8> {
        self.record.get(1).copied()
    }

    pub fn profile_compatibility(&self) -> Option<u8> {
        self.record.get(2).copied()
    }

    pub fn level_indication(&self) -> Option<u8> {
        self.record.get(3).copied()
    }

    /// Bytes per NAL unit length prefix (1, 2 or 4).
    pub fn nal_length_size(&self) -> Option<u8> {
        self.record.get(4).map(|b| (b & 0x03) + 1)
    }
}
