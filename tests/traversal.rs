mod common;

use common::{atom, container, movie, mvhd, qt_ftyp};
use qtwalk::boxes::{FourCC, MDIA, MOOV, MVHD, QT_BRAND};
use qtwalk::{
    Atom, Directive, Error, ParseError, StructuralError, compile, execute, execute_with_file_type,
    extract, extract_file,
};
use std::io::{Cursor, Write};

#[test]
fn rejects_non_quicktime_before_any_directive() {
    let data = [container(b"moov", &[mvhd(0, 0, 600, 600)]), qt_ftyp()].concat();
    let mut cur = Cursor::new(data);

    let err = execute(&mut cur, &[Directive::step_into(MOOV)]).unwrap_err();
    match err {
        ParseError::NotQuickTime { found } => assert_eq!(found, MOOV),
        other => panic!("expected NotQuickTime, got {other:?}"),
    }
    // only the first header was consumed
    assert_eq!(cur.position(), 8);
}

#[test]
fn empty_source_is_premature_end() {
    let mut cur = Cursor::new(Vec::new());
    assert!(matches!(
        execute(&mut cur, &[]),
        Err(ParseError::UnexpectedEof)
    ));
}

#[test]
fn reads_movie_header() {
    let data = [qt_ftyp(), container(b"moov", &[mvhd(3_786_912_000, 3_786_912_060, 24_000, 240_000)])].concat();
    let atoms = execute(
        &mut Cursor::new(data),
        &[Directive::step_into(MOOV), Directive::read(MVHD)],
    )
    .unwrap();

    assert_eq!(atoms.len(), 1);
    assert_eq!(atoms[0].tag(), MVHD);
    assert_eq!(atoms[0].size(), 108);
    let mvhd = atoms[0].as_movie_header().expect("mvhd record");
    assert_eq!(mvhd.time_scale(), 24_000);
    assert_eq!(mvhd.duration(), 240_000);
    assert_eq!(mvhd.fps(), 24.0);
    assert_eq!(mvhd.duration_secs(), Some(10));
    assert_eq!(mvhd.preferred_rate(), 1.0);
    assert_eq!(mvhd.preferred_volume(), 1.0);
    assert_eq!(mvhd.matrix()[8], 0x4000_0000);
    assert_eq!(mvhd.next_track_id(), 3);
    assert_eq!(mvhd.creation_time().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert_eq!(mvhd.modification_time().to_rfc3339(), "2024-01-01T00:01:00+00:00");
}

#[test]
fn file_type_is_returned_but_not_emitted() {
    let mut cur = Cursor::new(movie());
    let ex = execute_with_file_type(&mut cur, &[]).unwrap();
    assert!(ex.atoms.is_empty());
    assert_eq!(ex.file_type.major_brand(), QT_BRAND);
    assert_eq!(ex.file_type.compatible_brands(), &[QT_BRAND]);
    assert!(ex.file_type.is_quicktime());
}

#[test]
fn ragged_brand_list_is_structural() {
    let data = [atom(b"ftyp", b"qt  \0\0\0\0qt  \0"), atom(b"free", &[])].concat();
    let err = execute(&mut Cursor::new(data), &[]).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Structural(StructuralError::BrandCount { declared: 2, decoded: 1 })
    ));
}

#[test]
fn reads_both_sample_tables_in_order() {
    let prog = "step into moov\n\
                read mvhd\n\
                step into trak\n\
                step into mdia\n\
                step into minf\n\
                step into stbl\n\
                read stsd\n\
                step into trak\n\
                step into mdia\n\
                step into minf\n\
                step into stbl\n\
                read stsd";
    let atoms = extract(&mut Cursor::new(movie()), prog).unwrap();
    assert_eq!(atoms.len(), 3);
    assert!(matches!(atoms[0], Atom::MovieHeader(_)));

    let video = atoms[1].as_sample_table().expect("first stsd");
    assert_eq!(video.entries().len(), 1);
    assert_eq!(video.entries()[0].data_format(), FourCC(*b"avc1"));

    let sound = atoms[2].as_sample_table().expect("second stsd");
    assert_eq!(sound.entries().len(), 1);
    assert_eq!(sound.entries()[0].data_format(), FourCC(*b"sowt"));
    assert!(sound.entries()[0].as_video().is_none());
}

#[test]
fn generic_read_captures_payload() {
    let data = [qt_ftyp(), atom(b"free", &[]), atom(b"mdat", &[1, 2, 3])].concat();
    let atoms = extract(&mut Cursor::new(data), "read free\nread mdat").unwrap();
    assert_eq!(atoms.len(), 2);
    assert_eq!(atoms[0].as_generic().unwrap().payload(), &[] as &[u8]);
    assert_eq!(atoms[1].as_generic().unwrap().payload(), &[1, 2, 3]);
}

#[test]
fn scan_continues_past_the_end_of_a_container() {
    let atoms = extract(&mut Cursor::new(movie()), "step into moov\nread mdat").unwrap();
    assert_eq!(atoms.len(), 1);
    assert_eq!(atoms[0].tag(), FourCC(*b"mdat"));
    assert_eq!(atoms[0].as_generic().unwrap().payload(), &[0xAB; 16]);
}

#[test]
fn scan_never_goes_backwards() {
    let err = extract(&mut Cursor::new(movie()), "read mdat\nread moov").unwrap_err();
    match err {
        Error::Decode(ParseError::TargetNotFound { tag }) => assert_eq!(tag, MOOV),
        other => panic!("expected TargetNotFound, got {other:?}"),
    }
}

#[test]
fn missing_target_is_an_error_not_a_partial_result() {
    let err = extract(&mut Cursor::new(movie()), "step into moov\nread mvhd\nread udta")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(ParseError::TargetNotFound { .. })
    ));
}

#[test]
fn skip_then_read_sibling() {
    let directives = compile("step into moov\nskip mvhd\nstep into trak\nskip tkhd\nread mdia").unwrap();
    let atoms = execute(&mut Cursor::new(movie()), &directives).unwrap();
    assert_eq!(atoms.len(), 1);
    assert_eq!(atoms[0].tag(), MDIA);
}

#[test]
fn truncated_source_is_premature_end() {
    let mut data = [qt_ftyp(), container(b"moov", &[mvhd(0, 0, 600, 600)])].concat();
    data.truncate(data.len() - 30);
    let err = extract(&mut Cursor::new(data), "step into moov\nread mvhd").unwrap_err();
    assert!(matches!(err, Error::Decode(ParseError::UnexpectedEof)));
}

#[test]
fn short_skip_is_reported() {
    let mut data = [qt_ftyp(), atom(b"free", &[0u8; 64])].concat();
    data.truncate(data.len() - 10);
    let err = extract(&mut Cursor::new(data), "skip free").unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(ParseError::ShortSkip { expected: 64, skipped: 54 })
    ));
}

#[test]
fn short_mvhd_is_structural() {
    let data = [qt_ftyp(), atom(b"mvhd", &[0u8; 40])].concat();
    let err = extract(&mut Cursor::new(data), "read mvhd").unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(ParseError::Structural(StructuralError::Truncated { .. }))
    ));
}

#[test]
fn syntax_error_touches_no_input() {
    let mut cur = Cursor::new(movie());
    let err = extract(&mut cur, "step into moov\nread").unwrap_err();
    assert!(matches!(err, Error::Compile(_)));
    assert_eq!(cur.position(), 0);
}

#[test]
fn extract_file_reads_from_disk() {
    let path = std::env::temp_dir().join("qtwalk_extract_file_test.mov");
    let mut f = std::fs::File::create(&path).expect("create temp file failed");
    f.write_all(&movie()).expect("write temp data failed");
    drop(f);

    let ex = extract_file(&path, "step into moov\nread mvhd").unwrap();
    assert!(ex.file_type.is_quicktime());
    assert_eq!(ex.atoms.len(), 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn extract_file_reports_open_failure() {
    let err = extract_file("/definitely/not/here.mov", "read mvhd").unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
}

#[test]
fn atoms_serialize_to_json() {
    let atoms = extract(&mut Cursor::new(movie()), "step into moov\nread mvhd").unwrap();
    let v = serde_json::to_value(&atoms).unwrap();
    assert_eq!(v[0]["kind"], "movie_header");
    assert_eq!(v[0]["header"]["typ"], "mvhd");
    assert_eq!(v[0]["time_scale"], 24_000);
}
