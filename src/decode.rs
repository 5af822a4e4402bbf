//! One decoding function per atom kind. Each reads exactly the atom's
//! `size - 8` payload bytes from the source, then picks fields out of that
//! captured payload.

use crate::atoms::{
    Atom, AvcConfigAtom, ColorInfoAtom, Extension, FileTypeAtom, GenericAtom, MovieHeaderAtom,
    SampleDescription, SampleTableAtom, VideoSampleDescription,
};
use crate::boxes::{AVC1, AVCC, BoxHeader, COLR, FTYP, FourCC, HEADER_SIZE, MVHD, SOWT, STSD};
use crate::known_boxes::KnownAtom;
use crate::parser::{
    Result, StructuralError, read_array, read_box_header, read_i32s, read_payload, within,
};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use tracing::{debug, trace};

/// Total size of an `avc1` entry up to and including the color table id.
pub const VIDEO_SAMPLE_DESC_SIZE: u32 = 86;

const COMPRESSOR_NAME_SIZE: usize = 32;

/// Decodes a matched atom, choosing the specialized decoder by tag.
pub fn decode_atom<R: Read>(r: &mut R, h: &BoxHeader) -> Result<Atom> {
    let atom = match KnownAtom::from(h.typ) {
        KnownAtom::Mvhd => Atom::MovieHeader(decode_movie_header(r, h)?),
        KnownAtom::Stsd => Atom::SampleTable(decode_sample_table(r, h)?),
        _ => Atom::Generic(decode_generic(r, h)?),
    };
    debug!(typ = %h.typ, size = h.size, "decoded atom");
    Ok(atom)
}

pub fn decode_generic<R: Read>(r: &mut R, h: &BoxHeader) -> Result<GenericAtom> {
    Ok(GenericAtom {
        header: *h,
        payload: read_payload(r, h)?,
    })
}

/// Hands out the next `len` bytes of a captured payload without copying.
fn split_off<'a>(cur: &mut Cursor<&'a [u8]>, typ: FourCC, len: u32) -> Result<&'a [u8]> {
    let buf: &'a [u8] = *cur.get_ref();
    let start = cur.position() as usize;
    let end = start
        .checked_add(len as usize)
        .filter(|&end| end <= buf.len())
        .ok_or(StructuralError::Truncated { typ })?;
    cur.set_position(end as u64);
    Ok(&buf[start..end])
}

/// Runs `f` over a captured payload; running out of bytes means the atom
/// `typ` is shorter than its fixed fields.
fn fields<'a, T>(
    typ: FourCC,
    cur: &mut Cursor<&'a [u8]>,
    f: impl FnOnce(&mut Cursor<&'a [u8]>) -> Result<T>,
) -> Result<T> {
    within(typ, f(cur))
}

fn remaining<'a>(cur: &Cursor<&'a [u8]>) -> &'a [u8] {
    let buf: &'a [u8] = *cur.get_ref();
    &buf[(cur.position() as usize).min(buf.len())..]
}

/// Shorter than a header and all zero: padding some writers append.
fn is_zero_tail(rest: &[u8]) -> bool {
    rest.len() < HEADER_SIZE as usize && rest.iter().all(|&b| b == 0)
}

// ---------- ftyp ----------

#[derive(Default)]
struct FileTypeStage {
    major_brand: FourCC,
    minor_version: u32,
    brand_bytes: usize,
    compatible_brands: Vec<FourCC>,
}

impl FileTypeStage {
    fn finish(self, header: BoxHeader) -> Result<FileTypeAtom> {
        // a ragged tail still counts as a (partial) declared brand
        let declared = self.brand_bytes.div_ceil(4);
        if self.compatible_brands.len() != declared {
            return Err(StructuralError::BrandCount {
                declared,
                decoded: self.compatible_brands.len(),
            }
            .into());
        }
        Ok(FileTypeAtom {
            header,
            major_brand: self.major_brand,
            minor_version: self.minor_version,
            compatible_brands: self.compatible_brands,
        })
    }
}

pub fn decode_file_type<R: Read>(r: &mut R, h: &BoxHeader) -> Result<FileTypeAtom> {
    let payload = read_payload(r, h)?;
    let mut cur = Cursor::new(payload.as_slice());
    let mut stage = FileTypeStage::default();
    (stage.major_brand, stage.minor_version) = fields(FTYP, &mut cur, |c| {
        Ok((FourCC(read_array(c)?), c.read_u32::<BigEndian>()?))
    })?;
    let brands = remaining(&cur);
    stage.brand_bytes = brands.len();
    stage.compatible_brands = brands
        .chunks_exact(4)
        .map(|c| FourCC([c[0], c[1], c[2], c[3]]))
        .collect();
    stage.finish(*h)
}

// ---------- mvhd ----------

pub fn decode_movie_header<R: Read>(r: &mut R, h: &BoxHeader) -> Result<MovieHeaderAtom> {
    let payload = read_payload(r, h)?;
    let mut cur = Cursor::new(payload.as_slice());
    fields(MVHD, &mut cur, |c| {
        Ok(MovieHeaderAtom {
            header: *h,
            version: c.read_u8()?,
            flags: read_array(c)?,
            creation_time: c.read_u32::<BigEndian>()?,
            modification_time: c.read_u32::<BigEndian>()?,
            time_scale: c.read_u32::<BigEndian>()?,
            duration: c.read_u32::<BigEndian>()?,
            rate: c.read_u32::<BigEndian>()?,
            volume: c.read_u16::<BigEndian>()?,
            reserved: read_array(c)?,
            matrix: read_i32s(c)?,
            preview_time: c.read_u32::<BigEndian>()?,
            preview_duration: c.read_u32::<BigEndian>()?,
            poster_time: c.read_u32::<BigEndian>()?,
            selection_time: c.read_u32::<BigEndian>()?,
            selection_duration: c.read_u32::<BigEndian>()?,
            current_time: c.read_u32::<BigEndian>()?,
            next_track_id: c.read_u32::<BigEndian>()?,
        })
    })
}

// ---------- stsd ----------

struct SampleTableStage {
    version: u8,
    flags: [u8; 3],
    entry_count: u32,
    entries: Vec<SampleDescription>,
}

impl SampleTableStage {
    fn finish(self, header: BoxHeader) -> Result<SampleTableAtom> {
        if self.entries.len() != self.entry_count as usize {
            return Err(StructuralError::EntryCount {
                declared: self.entry_count,
                decoded: self.entries.len(),
            }
            .into());
        }
        Ok(SampleTableAtom {
            header,
            version: self.version,
            flags: self.flags,
            entries: self.entries,
        })
    }
}

pub fn decode_sample_table<R: Read>(r: &mut R, h: &BoxHeader) -> Result<SampleTableAtom> {
    let payload = read_payload(r, h)?;
    let mut cur = Cursor::new(payload.as_slice());

    let (version, flags, entry_count) = fields(STSD, &mut cur, |c| {
        Ok((c.read_u8()?, read_array(c)?, c.read_u32::<BigEndian>()?))
    })?;

    // every entry needs at least its own header
    let room = (remaining(&cur).len() as u32) / HEADER_SIZE;
    if entry_count > room {
        return Err(StructuralError::EntryTableOverflow {
            declared: entry_count,
            room,
        }
        .into());
    }

    let mut stage = SampleTableStage {
        version,
        flags,
        entry_count,
        entries: Vec::with_capacity(entry_count as usize),
    };
    for _ in 0..entry_count {
        stage.entries.push(decode_sample_description(&mut cur)?);
    }
    // entries past the declared count are decoded too, so finish sees the real count
    while !is_zero_tail(remaining(&cur)) {
        stage.entries.push(decode_sample_description(&mut cur)?);
    }
    stage.finish(*h)
}

fn decode_sample_description(cur: &mut Cursor<&[u8]>) -> Result<SampleDescription> {
    let entry = within(STSD, read_box_header(cur))?;
    let body = split_off(cur, entry.typ, entry.payload_len())?;
    if entry.typ == AVC1 {
        if entry.size < VIDEO_SAMPLE_DESC_SIZE {
            return Err(StructuralError::EntryTooSmall {
                format: entry.typ,
                size: entry.size,
                min: VIDEO_SAMPLE_DESC_SIZE,
            }
            .into());
        }
        return decode_video_sample_description(&entry, body).map(SampleDescription::Video);
    }
    if entry.typ == SOWT {
        trace!(size = entry.size, "keeping sound sample description opaque");
    } else {
        trace!(format = %entry.typ, size = entry.size, "skipping unsupported sample description");
    }
    Ok(SampleDescription::Unsupported {
        size: entry.size,
        data_format: entry.typ,
    })
}

/// `body` is everything after the entry's 8-byte header.
fn decode_video_sample_description(
    entry: &BoxHeader,
    body: &[u8],
) -> Result<VideoSampleDescription> {
    let mut cur = Cursor::new(body);
    let mut vsd = fields(entry.typ, &mut cur, |c| {
        Ok(VideoSampleDescription {
            size: entry.size,
            data_format: entry.typ,
            reserved: read_array(c)?,
            data_reference_index: c.read_u16::<BigEndian>()?,
            version: c.read_u16::<BigEndian>()?,
            revision_level: c.read_u16::<BigEndian>()?,
            vendor: FourCC(read_array(c)?),
            temporal_quality: c.read_u32::<BigEndian>()?,
            spatial_quality: c.read_u32::<BigEndian>()?,
            width: c.read_u16::<BigEndian>()?,
            height: c.read_u16::<BigEndian>()?,
            horizontal_resolution: c.read_u32::<BigEndian>()?,
            vertical_resolution: c.read_u32::<BigEndian>()?,
            data_size: c.read_u32::<BigEndian>()?,
            frame_count: c.read_u16::<BigEndian>()?,
            compressor_name: pascal_string(&read_array::<_, COMPRESSOR_NAME_SIZE>(c)?),
            depth: c.read_u16::<BigEndian>()?,
            color_table_id: c.read_i16::<BigEndian>()?,
            extensions: Vec::new(),
        })
    })?;
    vsd.extensions = decode_extensions(remaining(&cur))?;
    Ok(vsd)
}

/// Length byte followed by up to 31 characters.
fn pascal_string(field: &[u8; COMPRESSOR_NAME_SIZE]) -> String {
    let len = (field[0] as usize).min(COMPRESSOR_NAME_SIZE - 1);
    String::from_utf8_lossy(&field[1..=len]).into_owned()
}

fn decode_extensions(chain: &[u8]) -> Result<Vec<Extension>> {
    let mut cur = Cursor::new(chain);
    let mut left = chain.len() as u32;
    let mut extensions = Vec::new();
    while left > 0 {
        // some writers close the chain with a short run of zero bytes
        if is_zero_tail(remaining(&cur)) {
            trace!(bytes = left, "ignoring zero padding after extensions");
            break;
        }
        let h = within(AVC1, read_box_header(&mut cur))?;
        if h.size > left {
            return Err(StructuralError::ExtensionOverrun {
                typ: h.typ,
                size: h.size,
                remaining: left,
            }
            .into());
        }
        let body = split_off(&mut cur, h.typ, h.payload_len())?;
        let ext = match h.typ {
            COLR => Extension::ColorInfo(decode_color_info(&h, body)?),
            AVCC => Extension::AvcConfig(AvcConfigAtom {
                header: h,
                record: body.to_vec(),
            }),
            _ => Extension::Generic(GenericAtom {
                header: h,
                payload: body.to_vec(),
            }),
        };
        extensions.push(ext);
        // header sizes below 8 were rejected, so this always advances
        left -= h.size;
    }
    Ok(extensions)
}

fn decode_color_info(h: &BoxHeader, body: &[u8]) -> Result<ColorInfoAtom> {
    let mut cur = Cursor::new(body);
    let (parameter_type, primaries_index, transfer_function_index, matrix_index) =
        fields(COLR, &mut cur, |c| {
            Ok((
                FourCC(read_array(c)?),
                c.read_u16::<BigEndian>()?,
                c.read_u16::<BigEndian>()?,
                c.read_u16::<BigEndian>()?,
            ))
        })?;
    Ok(ColorInfoAtom {
        header: *h,
        parameter_type,
        primaries_index,
        transfer_function_index,
        matrix_index,
        trailing: remaining(&cur).to_vec(),
    })
}
