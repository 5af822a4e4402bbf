#![allow(dead_code)]

//! Hand-built QuickTime fixtures.

/// `size | typ | payload`
pub fn atom(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

pub fn container(typ: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    atom(typ, &children.concat())
}

pub fn ftyp(major: &[u8; 4], minor: u32, compatible: &[&[u8; 4]]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(major);
    p.extend_from_slice(&minor.to_be_bytes());
    for b in compatible {
        p.extend_from_slice(*b);
    }
    atom(b"ftyp", &p)
}

pub fn qt_ftyp() -> Vec<u8> {
    ftyp(b"qt  ", 0x2005_0300, &[b"qt  "])
}

/// A version 0 `mvhd` with a 100-byte payload.
pub fn mvhd(creation: u32, modification: u32, time_scale: u32, duration: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.push(0); // version
    p.extend_from_slice(&[0, 0, 0]); // flags
    p.extend_from_slice(&creation.to_be_bytes());
    p.extend_from_slice(&modification.to_be_bytes());
    p.extend_from_slice(&time_scale.to_be_bytes());
    p.extend_from_slice(&duration.to_be_bytes());
    p.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate 1.0
    p.extend_from_slice(&0x0100u16.to_be_bytes()); // volume 1.0
    p.extend_from_slice(&[0u8; 10]); // reserved
    for m in [0x0001_0000i32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        p.extend_from_slice(&m.to_be_bytes());
    }
    for v in [0u32, 0, 0, 0, 0, 0] {
        p.extend_from_slice(&v.to_be_bytes()); // preview .. current time
    }
    p.extend_from_slice(&3u32.to_be_bytes()); // next track id
    assert_eq!(p.len(), 100);
    atom(b"mvhd", &p)
}

/// An `avc1` sample description: 86 bytes of fixed fields plus `extensions`.
pub fn avc1(width: u16, height: u16, compressor: &str, extensions: &[Vec<u8>]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&[0u8; 6]); // reserved
    p.extend_from_slice(&1u16.to_be_bytes()); // data reference index
    p.extend_from_slice(&0u16.to_be_bytes()); // version
    p.extend_from_slice(&0u16.to_be_bytes()); // revision level
    p.extend_from_slice(b"appl"); // vendor
    p.extend_from_slice(&0u32.to_be_bytes()); // temporal quality
    p.extend_from_slice(&512u32.to_be_bytes()); // spatial quality
    p.extend_from_slice(&width.to_be_bytes());
    p.extend_from_slice(&height.to_be_bytes());
    p.extend_from_slice(&0x0048_0000u32.to_be_bytes()); // 72 dpi
    p.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    p.extend_from_slice(&0u32.to_be_bytes()); // data size
    p.extend_from_slice(&1u16.to_be_bytes()); // frame count
    let mut name = [0u8; 32];
    name[0] = compressor.len() as u8;
    name[1..=compressor.len()].copy_from_slice(compressor.as_bytes());
    p.extend_from_slice(&name);
    p.extend_from_slice(&24u16.to_be_bytes()); // depth
    p.extend_from_slice(&(-1i16).to_be_bytes()); // color table id
    assert_eq!(p.len(), 78);
    p.extend_from_slice(&extensions.concat());
    atom(b"avc1", &p)
}

pub fn colr_nclc(primaries: u16, transfer: u16, matrix: u16) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(b"nclc");
    p.extend_from_slice(&primaries.to_be_bytes());
    p.extend_from_slice(&transfer.to_be_bytes());
    p.extend_from_slice(&matrix.to_be_bytes());
    atom(b"colr", &p)
}

pub fn avcc(record: &[u8]) -> Vec<u8> {
    atom(b"avcC", record)
}

/// `stsd` declaring `count` entries, whatever `entries` actually holds.
pub fn stsd_declaring(count: u32, entries: &[Vec<u8>]) -> Vec<u8> {
    let mut p = vec![0u8, 0, 0, 0];
    p.extend_from_slice(&count.to_be_bytes());
    p.extend_from_slice(&entries.concat());
    atom(b"stsd", &p)
}

pub fn stsd(entries: &[Vec<u8>]) -> Vec<u8> {
    stsd_declaring(entries.len() as u32, entries)
}

/// A track whose sample table holds `stsd`.
pub fn trak(stsd: Vec<u8>) -> Vec<u8> {
    container(
        b"trak",
        &[
            atom(b"tkhd", &[0u8; 84]),
            container(
                b"mdia",
                &[
                    atom(b"mdhd", &[0u8; 24]),
                    atom(b"hdlr", &[0u8; 25]),
                    container(
                        b"minf",
                        &[
                            atom(b"vmhd", &[0u8; 12]),
                            container(b"stbl", &[stsd, atom(b"stts", &[0u8; 8])]),
                        ],
                    ),
                ],
            ),
        ],
    )
}

pub const AVCC_RECORD: [u8; 7] = [1, 0x64, 0x00, 0x28, 0xFF, 0xE1, 0x00];

/// ftyp, moov { mvhd, video trak, sound trak }, mdat
pub fn movie() -> Vec<u8> {
    let video = trak(stsd(&[avc1(
        1920,
        1080,
        "H.264",
        &[colr_nclc(1, 1, 1), avcc(&AVCC_RECORD)],
    )]));
    let sound = trak(stsd(&[atom(b"sowt", &[0u8; 28])]));
    [
        qt_ftyp(),
        container(b"moov", &[mvhd(3_786_912_000, 3_786_912_060, 24_000, 240_000), video, sound]),
        atom(b"mdat", &[0xAB; 16]),
    ]
    .concat()
}
