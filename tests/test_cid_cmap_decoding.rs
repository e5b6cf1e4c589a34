//! CID CMap decoding against resource-shaped input.
//!
//! Covers block detection, tolerance of malformed entry lines, line
//! terminators, overlapping definitions and the range expansion cap.

use std::io::Cursor;

use cid_metrics::fonts::cmap::{decode_cid_cmap, parse_cid_cmap, CMapDecoder};

fn decode(text: &str) -> cid_metrics::UnicodeToCidMap {
    decode_cid_cmap(Cursor::new(text.as_bytes()), 0x1_0000).unwrap()
}

#[test]
fn test_header_and_codespace_are_ignored() {
    let map = decode(
        "/CIDInit /ProcSet findresource begin\n\
         1 begincodespacerange\n<0000> <ffff>\nendcodespacerange\n\
         1 begincidchar\n<0041> 34\nendcidchar\n",
    );
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(0x41), Some(34));
    assert_eq!(map.get(0x0000), None);
}

#[test]
fn test_entry_lines_outside_blocks_are_ignored() {
    let map = decode("<0041> 34\n<0030> <0039> 16\n");
    assert!(map.is_empty());
}

#[test]
fn test_malformed_lines_are_skipped() {
    let map = decode(
        "4 begincidchar\n\
         <0041> 34\n\
         <00zz> 35\n\
         <0043>  36\n\
         <0044> 37\n\
         endcidchar\n\
         2 begincidrange\n\
         <0030> <0039> 16\n\
         <0061> 0x41\n\
         endcidrange\n",
    );
    assert_eq!(map.get(0x41), Some(34));
    assert_eq!(map.get(0x43), None);
    assert_eq!(map.get(0x44), Some(37));
    assert_eq!(map.get(0x30), Some(16));
    assert_eq!(map.get(0x39), Some(25));
    assert_eq!(map.get(0x61), None);
}

#[test]
fn test_block_end_requires_exact_line() {
    // " endcidchar" with a leading space does not close the block.
    let map = decode("1 begincidchar\n<0041> 1\n endcidchar\n<0042> 2\nendcidchar\n<0043> 3\n");
    assert_eq!(map.get(0x41), Some(1));
    assert_eq!(map.get(0x42), Some(2));
    assert_eq!(map.get(0x43), None);
}

#[test]
fn test_last_definition_wins() {
    let map = decode(
        "1 begincidrange\n<0041> <005a> 100\nendcidrange\n\
         1 begincidchar\n<0045> 7\nendcidchar\n",
    );
    assert_eq!(map.get(0x44), Some(103));
    assert_eq!(map.get(0x45), Some(7));
    assert_eq!(map.get(0x46), Some(105));
}

#[test]
fn test_surrogate_pair_entries() {
    let map = decode(
        "1 begincidchar\n<d840dc0b> 13910\nendcidchar\n\
         1 begincidrange\n<d840dc00> <d840dc02> 20000\nendcidrange\n",
    );
    assert_eq!(map.get(0x2000B), Some(13910));
    assert_eq!(map.get(0x20000), Some(20000));
    assert_eq!(map.get(0x20002), Some(20002));
    assert_eq!(map.get_char('\u{20001}'), Some(20001));
}

#[test]
fn test_line_terminators() {
    let lf = decode("1 begincidchar\n<0041> 1\nendcidchar\n");
    let crlf = decode("1 begincidchar\r\n<0041> 1\r\nendcidchar\r\n");
    let cr = decode("1 begincidchar\r<0041> 1\rendcidchar\r");
    assert_eq!(lf, crlf);
    assert_eq!(lf, cr);
    assert_eq!(lf, parse_cid_cmap(b"1 begincidchar\r\n<0041> 1\r\nendcidchar"));
}

#[test]
fn test_oversized_range_is_skipped() {
    let text = "1 begincidrange\n<0000> <00ff> 1\n<0100> <0101> 500\nendcidrange\n";
    let map = decode_cid_cmap(Cursor::new(text.as_bytes()), 16).unwrap();
    assert_eq!(map.get(0x00), None);
    assert_eq!(map.get(0x100), Some(500));
    assert_eq!(map.len(), 2);
}

#[test]
fn test_decoder_fed_incrementally() {
    let mut decoder = CMapDecoder::default();
    for line in ["2 begincidrange", "<3041> <3043> 842", "<30a1> <30a2> 925", "endcidrange"] {
        decoder.feed_line(line);
    }
    let map = decoder.finish();
    let mut entries: Vec<(u32, u32)> = map.iter().collect();
    entries.sort_unstable();
    assert_eq!(
        entries,
        vec![(0x3041, 842), (0x3042, 843), (0x3043, 844), (0x30a1, 925), (0x30a2, 926)]
    );
}

#[test]
fn test_invalid_utf8_does_not_abort() {
    let mut data = b"1 begincidchar\n% \xff\xfe comment\n".to_vec();
    data.extend_from_slice(b"<0041> 1\nendcidchar\n");
    let map = decode_cid_cmap(Cursor::new(data), 0x1_0000).unwrap();
    assert_eq!(map.get(0x41), Some(1));
}
