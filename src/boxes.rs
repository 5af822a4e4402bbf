use serde::{Serialize, Serializer};
use std::fmt;

/// Four-character atom tag, packed big-endian when viewed as a `u32`.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn from_u32(v: u32) -> Self {
        FourCC(v.to_be_bytes())
    }

    /// `char0 << 24 | char1 << 16 | char2 << 8 | char3`
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl From<u32> for FourCC {
    fn from(v: u32) -> Self {
        FourCC::from_u32(v)
    }
}

impl From<FourCC> for u32 {
    fn from(cc: FourCC) -> Self {
        cc.to_u32()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

pub const FTYP: FourCC = FourCC(*b"ftyp");
/// The `qt  ` brand carried by QuickTime movies.
pub const QT_BRAND: FourCC = FourCC(*b"qt  ");
pub const MOOV: FourCC = FourCC(*b"moov");
pub const MVHD: FourCC = FourCC(*b"mvhd");
pub const TRAK: FourCC = FourCC(*b"trak");
pub const MDIA: FourCC = FourCC(*b"mdia");
pub const MINF: FourCC = FourCC(*b"minf");
pub const STBL: FourCC = FourCC(*b"stbl");
pub const STSD: FourCC = FourCC(*b"stsd");
pub const COLR: FourCC = FourCC(*b"colr");
pub const AVCC: FourCC = FourCC(*b"avcC");

// sample description data formats
pub const AVC1: FourCC = FourCC(*b"avc1");
pub const SOWT: FourCC = FourCC(*b"sowt");

/// Size of the universal `(size, tag)` prefix.
pub const HEADER_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxHeader {
    pub size: u32, // total size including header
    pub typ: FourCC,
}

impl BoxHeader {
    pub fn payload_len(&self) -> u32 {
        self.size.saturating_sub(HEADER_SIZE)
    }
}
