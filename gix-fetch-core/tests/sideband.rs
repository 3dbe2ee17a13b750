use std::io::Read;

use gix_fetch_core::{
    pktline::{write_band, write_flush, LineReader, SidebandChannel},
    progress::Discard,
    sideband::{Failure, SidebandReader},
};
use pretty_assertions::assert_eq;

#[test]
fn pack_is_reassembled_from_many_packets() {
    let mut input = Vec::new();
    for chunk in [&b"PACK"[..], b"\x00\x00\x00\x02", b"\x00\x00\x00\x00"] {
        write_band(SidebandChannel::Data, chunk, &mut input).unwrap();
        write_band(SidebandChannel::Progress, b"Receiving objects\r", &mut input).unwrap();
    }
    write_flush(&mut input).unwrap();

    let mut lines = LineReader::new(input.as_slice());
    let mut monitor = Discard;
    let mut pack = Vec::new();
    let mut reader = SidebandReader::new(&mut lines, &mut monitor);
    reader.read_to_end(&mut pack).unwrap();
    assert_eq!(reader.failure(), None);
    assert_eq!(pack, b"PACK\x00\x00\x00\x02\x00\x00\x00\x00".to_vec());
}

#[test]
fn remote_error_is_reported_without_newline() {
    let mut input = Vec::new();
    write_band(SidebandChannel::Error, b"upload-pack: not our ref\n", &mut input).unwrap();

    let mut lines = LineReader::new(input.as_slice());
    let mut monitor = Discard;
    let mut reader = SidebandReader::new(&mut lines, &mut monitor);
    let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("not our ref"), "{err}");
    assert_eq!(reader.failure(), Some(&Failure::Remote("upload-pack: not our ref".into())));
}
