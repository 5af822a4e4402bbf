use crate::boxes::FourCC;

/// Typed view over the QuickTime atoms this crate knows by name.
///
/// Anything not in this list becomes `KnownAtom::Unknown(fourcc)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownAtom {
    // File-level / top-level
    Ftyp,
    Moov,
    Mdat,
    Free,
    Skip,
    Wide,

    // moov children
    Mvhd,
    Trak,
    Udta,

    // trak children
    Tkhd,
    Edts,
    Mdia,

    // mdia children
    Mdhd,
    Hdlr,
    Minf,

    // minf children
    Vmhd,
    Smhd,
    Dinf,
    Stbl,

    // stbl children
    Stsd,
    Stts,
    Stss,
    Stsc,
    Stsz,
    Stco,
    Co64,

    // Sample entry formats
    Avc1,
    Sowt,

    // Sample description extensions
    Colr,
    Avcc,
    Pasp,
    Btrt,
    Fiel,

    // Anything else
    Unknown(FourCC),
}

impl From<FourCC> for KnownAtom {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownAtom::Ftyp,
            b"moov" => KnownAtom::Moov,
            b"mdat" => KnownAtom::Mdat,
            b"free" => KnownAtom::Free,
            b"skip" => KnownAtom::Skip,
            b"wide" => KnownAtom::Wide,

            b"mvhd" => KnownAtom::Mvhd,
            b"trak" => KnownAtom::Trak,
            b"udta" => KnownAtom::Udta,

            b"tkhd" => KnownAtom::Tkhd,
            b"edts" => KnownAtom::Edts,
            b"mdia" => KnownAtom::Mdia,

            b"mdhd" => KnownAtom::Mdhd,
            b"hdlr" => KnownAtom::Hdlr,
            b"minf" => KnownAtom::Minf,

            b"vmhd" => KnownAtom::Vmhd,
            b"smhd" => KnownAtom::Smhd,
            b"dinf" => KnownAtom::Dinf,
            b"stbl" => KnownAtom::Stbl,

            b"stsd" => KnownAtom::Stsd,
            b"stts" => KnownAtom::Stts,
            b"stss" => KnownAtom::Stss,
            b"stsc" => KnownAtom::Stsc,
            b"stsz" => KnownAtom::Stsz,
            b"stco" => KnownAtom::Stco,
            b"co64" => KnownAtom::Co64,

            b"avc1" => KnownAtom::Avc1,
            b"sowt" => KnownAtom::Sowt,

            b"colr" => KnownAtom::Colr,
            b"avcC" => KnownAtom::Avcc,
            b"pasp" => KnownAtom::Pasp,
            b"btrt" => KnownAtom::Btrt,
            b"fiel" => KnownAtom::Fiel,

            _ => KnownAtom::Unknown(cc),
        }
    }
}

impl KnownAtom {
    /// Does this atom hold nothing but child atoms (so `step into` makes sense)?
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            KnownAtom::Moov
                | KnownAtom::Trak
                | KnownAtom::Mdia
                | KnownAtom::Minf
                | KnownAtom::Stbl
                | KnownAtom::Edts
                | KnownAtom::Dinf
                | KnownAtom::Udta
        )
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            KnownAtom::Ftyp => "File Type Atom",
            KnownAtom::Moov => "Movie Atom",
            KnownAtom::Mdat => "Movie Data Atom",
            KnownAtom::Free => "Free Space Atom",
            KnownAtom::Skip => "Skip Atom",
            KnownAtom::Wide => "Wide Atom",
            KnownAtom::Mvhd => "Movie Header Atom",
            KnownAtom::Trak => "Track Atom",
            KnownAtom::Udta => "User Data Atom",
            KnownAtom::Tkhd => "Track Header Atom",
            KnownAtom::Edts => "Edit Atom",
            KnownAtom::Mdia => "Media Atom",
            KnownAtom::Mdhd => "Media Header Atom",
            KnownAtom::Hdlr => "Handler Reference Atom",
            KnownAtom::Minf => "Media Information Atom",
            KnownAtom::Vmhd => "Video Media Information Header",
            KnownAtom::Smhd => "Sound Media Information Header",
            KnownAtom::Dinf => "Data Information Atom",
            KnownAtom::Stbl => "Sample Table Atom",
            KnownAtom::Stsd => "Sample Description Atom",
            KnownAtom::Stts => "Time-to-Sample Atom",
            KnownAtom::Stss => "Sync Sample Atom",
            KnownAtom::Stsc => "Sample-to-Chunk Atom",
            KnownAtom::Stsz => "Sample Size Atom",
            KnownAtom::Stco => "Chunk Offset Atom",
            KnownAtom::Co64 => "64-bit Chunk Offset Atom",
            KnownAtom::Avc1 => "H.264 Video Sample Description",
            KnownAtom::Sowt => "Little-Endian PCM Sample Description",
            KnownAtom::Colr => "Color Parameter Atom",
            KnownAtom::Avcc => "AVC Decoder Configuration Atom",
            KnownAtom::Pasp => "Pixel Aspect Ratio Atom",
            KnownAtom::Btrt => "Bit Rate Atom",
            KnownAtom::Fiel => "Field Handling Atom",
            KnownAtom::Unknown(_) => "Unknown Atom",
        }
    }
}
