use crate::boxes::{BoxHeader, FourCC, HEADER_SIZE};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};

/// Decode-phase failure: the byte source is not a well-formed QuickTime stream.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(io::Error),
    #[error("premature end of file")]
    UnexpectedEof,
    #[error("not a QuickTime file: first atom is '{found}', expected 'ftyp'")]
    NotQuickTime { found: FourCC },
    #[error("atom '{tag}' not found before end of file")]
    TargetNotFound { tag: FourCC },
    #[error("invalid size {size} for atom '{typ}'")]
    InvalidSize { typ: FourCC, size: u32 },
    #[error("short skip: wanted {expected} bytes, skipped {skipped}")]
    ShortSkip { expected: u64, skipped: u64 },
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// A decoded record disagrees with its own declared sizing.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StructuralError {
    #[error("ftyp declares {declared} compatible brands, decoded {decoded}")]
    BrandCount { declared: usize, decoded: usize },
    #[error("stsd declares {declared} entries, decoded {decoded}")]
    EntryCount { declared: u32, decoded: usize },
    #[error("stsd declares {declared} entries but only has room for {room}")]
    EntryTableOverflow { declared: u32, room: u32 },
    #[error("sample description '{format}' of size {size} is smaller than its fixed fields ({min})")]
    EntryTooSmall { format: FourCC, size: u32, min: u32 },
    #[error("extension '{typ}' of size {size} overruns the remaining {remaining} bytes")]
    ExtensionOverrun { typ: FourCC, size: u32, remaining: u32 },
    #[error("atom '{typ}' ends before its fixed fields")]
    Truncated { typ: FourCC },
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ParseError::UnexpectedEof
        } else {
            ParseError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Re-labels running out of bytes inside an already captured payload:
/// the box itself is too short, the source is fine.
pub(crate) fn within<T>(typ: FourCC, res: Result<T>) -> Result<T> {
    res.map_err(|e| match e {
        ParseError::UnexpectedEof => StructuralError::Truncated { typ }.into(),
        other => other,
    })
}

fn check_size(h: BoxHeader) -> Result<BoxHeader> {
    if h.size < HEADER_SIZE {
        return Err(ParseError::InvalidSize { typ: h.typ, size: h.size });
    }
    Ok(h)
}

pub fn read_box_header<R: Read>(r: &mut R) -> Result<BoxHeader> {
    let size = r.read_u32::<BigEndian>()?;
    let typ = FourCC(read_array(r)?);
    check_size(BoxHeader { size, typ })
}

/// Like [`read_box_header`], but a source that is exhausted exactly at a box
/// boundary yields `None` instead of an error.
pub fn try_read_box_header<R: Read>(r: &mut R) -> Result<Option<BoxHeader>> {
    let mut buf = [0u8; 8];
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(ParseError::UnexpectedEof),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    let size = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let typ = FourCC([buf[4], buf[5], buf[6], buf[7]]);
    check_size(BoxHeader { size, typ }).map(Some)
}

pub fn read_array<R: Read, const N: usize>(r: &mut R) -> Result<[u8; N]> {
    let mut a = [0u8; N];
    r.read_exact(&mut a)?;
    Ok(a)
}

/// Reads exactly `len` bytes. The buffer grows with the data actually
/// delivered, so a bogus length cannot force a huge allocation up front.
pub fn read_bytes<R: Read>(r: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut v = Vec::new();
    r.by_ref().take(len).read_to_end(&mut v)?;
    if (v.len() as u64) < len {
        return Err(ParseError::UnexpectedEof);
    }
    Ok(v)
}

pub fn read_i32s<R: Read, const N: usize>(r: &mut R) -> Result<[i32; N]> {
    let mut a = [0i32; N];
    r.read_i32_into::<BigEndian>(&mut a)?;
    Ok(a)
}

/// Captures the `size - 8` payload bytes that follow `h`.
pub fn read_payload<R: Read>(r: &mut R, h: &BoxHeader) -> Result<Vec<u8>> {
    read_bytes(r, u64::from(h.payload_len()))
}

/// Discards `len` bytes and checks that all of them were actually consumed.
pub fn skip<R: Read>(r: &mut R, len: u64) -> Result<()> {
    let skipped = io::copy(&mut r.by_ref().take(len), &mut io::sink())?;
    if skipped != len {
        return Err(ParseError::ShortSkip { expected: len, skipped });
    }
    Ok(())
}

pub fn skip_payload<R: Read>(r: &mut R, h: &BoxHeader) -> Result<()> {
    skip(r, u64::from(h.payload_len()))
}
