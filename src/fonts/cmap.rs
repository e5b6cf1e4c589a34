//! CID CMap decoder.
//!
//! Predefined CMaps such as `UniJIS-UTF16-H` map UTF-16BE encoded Unicode
//! text to CIDs of an Adobe character collection. Only the two block kinds
//! that carry mappings are decoded:
//!
//! ```text
//! 3 begincidchar
//! <3000> 633
//! <d840dc0b> 13910
//! endcidchar
//! 2 begincidrange
//! <0020> <007e> 1
//! <3041> <3093> 842
//! endcidrange
//! ```
//!
//! Everything else (`begincodespacerange`, `/CIDSystemInfo`, comments) is
//! ignored, as are lines inside a block that do not match the entry pattern.
//! Block starts are detected by suffix (`1 begincidchar`), block ends only by
//! an exact line match.

use regex::Regex;
use std::collections::HashMap;
use std::io::{self, BufRead};

use crate::config::DEFAULT_MAX_RANGE_LEN;

const BEGIN_CID_CHAR: &str = "begincidchar";
const END_CID_CHAR: &str = "endcidchar";
const BEGIN_CID_RANGE: &str = "begincidrange";
const END_CID_RANGE: &str = "endcidrange";

lazy_static::lazy_static! {
    static ref CID_CHAR_RE: Regex = Regex::new(r"^<([0-9a-fA-F]+)> ([0-9]+)$").unwrap();
    static ref CID_RANGE_RE: Regex =
        Regex::new(r"^<([0-9a-fA-F]+)> <([0-9a-fA-F]+)> ([0-9]+)$").unwrap();
}

/// Mapping from Unicode scalar values to CIDs.
///
/// Immutable once decoded; later entries overwrite earlier ones while
/// decoding, so the last definition in file order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnicodeToCidMap {
    map: HashMap<u32, u32>,
}

impl UnicodeToCidMap {
    /// Look up the CID for a code point.
    #[inline]
    pub fn get(&self, code_point: u32) -> Option<u32> {
        self.map.get(&code_point).copied()
    }

    /// Look up the CID for a character.
    #[inline]
    pub fn get_char(&self, ch: char) -> Option<u32> {
        self.get(ch as u32)
    }

    /// Whether a code point has a CID.
    pub fn contains(&self, code_point: u32) -> bool {
        self.map.contains_key(&code_point)
    }

    /// Number of mapped code points.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no code point is mapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(code point, CID)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.map.iter().map(|(&cp, &cid)| (cp, cid))
    }
}

impl FromIterator<(u32, u32)> for UnicodeToCidMap {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Line-oriented CMap decoder.
///
/// Feed lines in file order with [`CMapDecoder::feed_line`] and take the
/// result with [`CMapDecoder::finish`].
#[derive(Debug)]
pub struct CMapDecoder {
    in_cid_char: bool,
    in_cid_range: bool,
    max_range_len: u32,
    map: HashMap<u32, u32>,
    lines: usize,
    skipped: usize,
}

impl Default for CMapDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RANGE_LEN)
    }
}

impl CMapDecoder {
    /// Create a decoder that refuses ranges longer than `max_range_len`.
    pub fn new(max_range_len: u32) -> Self {
        Self {
            in_cid_char: false,
            in_cid_range: false,
            max_range_len,
            map: HashMap::new(),
            lines: 0,
            skipped: 0,
        }
    }

    /// Process one line (without its terminator).
    pub fn feed_line(&mut self, line: &str) {
        self.lines += 1;

        if line.ends_with(BEGIN_CID_CHAR) {
            self.in_cid_char = true;
        } else if line == END_CID_CHAR {
            self.in_cid_char = false;
        } else if line.ends_with(BEGIN_CID_RANGE) {
            self.in_cid_range = true;
        } else if line == END_CID_RANGE {
            self.in_cid_range = false;
        } else if self.in_cid_char {
            match parse_cidchar_line(line) {
                Some((code_point, cid)) => {
                    self.map.insert(code_point, cid);
                },
                None => self.skipped += 1,
            }
        } else if self.in_cid_range {
            match parse_cidrange_line(line) {
                Some((low, high, cid)) => self.apply_range(low, high, cid),
                None => self.skipped += 1,
            }
        }
    }

    fn apply_range(&mut self, low: u32, high: u32, cid: u32) {
        if high < low {
            self.skipped += 1;
            return;
        }

        let span = high - low;
        if span >= self.max_range_len {
            log::warn!(
                "CMap cidrange U+{:04X}..U+{:04X} covers {} code points (limit {}), skipped",
                low,
                high,
                u64::from(span) + 1,
                self.max_range_len
            );
            self.skipped += 1;
            return;
        }

        for offset in 0..=span {
            match cid.checked_add(offset) {
                Some(c) => {
                    self.map.insert(low + offset, c);
                },
                None => break,
            }
        }
    }

    /// Finish decoding and return the map.
    pub fn finish(self) -> UnicodeToCidMap {
        log::debug!(
            "Decoded CMap: {} lines, {} code points mapped, {} entry lines skipped",
            self.lines,
            self.map.len(),
            self.skipped
        );
        UnicodeToCidMap { map: self.map }
    }
}

/// Decode a CMap resource from a reader.
///
/// Line terminators may be `\n`, `\r\n` or a bare `\r`. Invalid UTF-8 is
/// replaced rather than rejected; only I/O failures are errors.
pub fn decode_cid_cmap<R: BufRead>(mut reader: R, max_range_len: u32) -> io::Result<UnicodeToCidMap> {
    let mut decoder = CMapDecoder::new(max_range_len);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        // A bare \r also terminates a line; \r\n leaves a trailing empty piece.
        let mut pieces = buf.split(|&b| b == b'\r').peekable();
        while let Some(piece) = pieces.next() {
            if piece.is_empty() && pieces.peek().is_none() && !buf.is_empty() {
                break;
            }
            decoder.feed_line(&String::from_utf8_lossy(piece));
        }
    }

    Ok(decoder.finish())
}

/// Decode an in-memory CMap resource with the default range cap.
///
/// # Examples
///
/// ```
/// use cid_metrics::fonts::cmap::parse_cid_cmap;
///
/// let data = b"1 begincidchar\n<3042> 843\nendcidchar";
/// let map = parse_cid_cmap(data);
/// assert_eq!(map.get(0x3042), Some(843));
/// ```
pub fn parse_cid_cmap(data: &[u8]) -> UnicodeToCidMap {
    let mut decoder = CMapDecoder::default();
    let content = String::from_utf8_lossy(data);
    for line in content.split(['\n', '\r']) {
        if line.is_empty() {
            continue;
        }
        decoder.feed_line(line);
    }
    decoder.finish()
}

/// Parse a cidchar line: `<src> cid`
fn parse_cidchar_line(line: &str) -> Option<(u32, u32)> {
    let caps = CID_CHAR_RE.captures(line)?;
    let code_point = utf16be_hex_to_code_point(&caps[1])?;
    let cid = caps[2].parse::<u32>().ok()?;
    Some((code_point, cid))
}

/// Parse a cidrange line: `<low> <high> cid`
fn parse_cidrange_line(line: &str) -> Option<(u32, u32, u32)> {
    let caps = CID_RANGE_RE.captures(line)?;
    let low = utf16be_hex_to_code_point(&caps[1])?;
    let high = utf16be_hex_to_code_point(&caps[2])?;
    let cid = caps[3].parse::<u32>().ok()?;
    Some((low, high, cid))
}

/// Interpret a hex token as UTF-16BE code units and return the first code point.
///
/// Four hex digits form one code unit; a surrogate pair (`d840dc0b`) decodes
/// to one supplementary code point. A two-digit token is a single code unit
/// in the Latin-1 range. Odd lengths and unpaired surrogates yield `None`.
fn utf16be_hex_to_code_point(hex: &str) -> Option<u32> {
    if hex.len() == 2 {
        return u32::from_str_radix(hex, 16).ok();
    }
    if hex.is_empty() || hex.len() % 4 != 0 {
        return None;
    }

    let units = hex
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).ok().and_then(|s| u16::from_str_radix(s, 16).ok()));

    let mut code_units = Vec::with_capacity(hex.len() / 4);
    for unit in units {
        code_units.push(unit?);
    }

    match char::decode_utf16(code_units).next()? {
        Ok(ch) => Some(ch as u32),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_cidchar_single() {
        let map = parse_cid_cmap(b"1 begincidchar\n<0041> 100\nendcidchar");
        assert_eq!(map.get(0x41), Some(100));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_directive_outside_block_ignored() {
        let data = b"begincidchar\n<0041> 100\nendcidchar\n<0042> 200\n/CMapName /Test def";
        let map = parse_cid_cmap(data);
        assert_eq!(map.get(0x41), Some(100));
        assert_eq!(map.get(0x42), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_parse_cidrange_expands_lockstep() {
        let map = parse_cid_cmap(b"1 begincidrange\n<0041> <0043> 100\nendcidrange");
        assert_eq!(map.get(0x41), Some(100));
        assert_eq!(map.get(0x42), Some(101));
        assert_eq!(map.get(0x43), Some(102));
        assert_eq!(map.get(0x44), None);
    }

    #[test]
    fn test_codespace_lines_skipped() {
        let data = b"1 begincodespacerange\n<0000> <ffff>\nendcodespacerange\n\
                     1 begincidrange\n<0000> <ffff>\n<0020> <0021> 1\nendcidrange";
        let map = parse_cid_cmap(data);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(0x20), Some(1));
        assert_eq!(map.get(0x0), None);
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let data = b"begincidchar\n<0041>  100\n<00ZZ> 5\n<0043> x\n<0044> 7\nendcidchar";
        let map = parse_cid_cmap(data);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(0x44), Some(7));
    }

    #[test]
    fn test_last_write_wins() {
        let data = b"begincidrange\n<0041> <0045> 10\nendcidrange\n\
                     begincidchar\n<0043> 99\nendcidchar\n\
                     begincidrange\n<0045> <0045> 50\nendcidrange";
        let map = parse_cid_cmap(data);
        assert_eq!(map.get(0x41), Some(10));
        assert_eq!(map.get(0x43), Some(99));
        assert_eq!(map.get(0x44), Some(13));
        assert_eq!(map.get(0x45), Some(50));
    }

    #[test]
    fn test_surrogate_pair_source() {
        let map = parse_cid_cmap(b"begincidchar\n<d840dc0b> 13910\nendcidchar");
        assert_eq!(map.get(0x2000B), Some(13910));
    }

    #[test]
    fn test_surrogate_pair_range() {
        let map = parse_cid_cmap(b"begincidrange\n<d840dc0b> <d840dc0d> 20\nendcidrange");
        assert_eq!(map.get(0x2000B), Some(20));
        assert_eq!(map.get(0x2000C), Some(21));
        assert_eq!(map.get(0x2000D), Some(22));
    }

    #[test]
    fn test_end_keyword_requires_exact_line() {
        // "  endcidchar" is not an exact match, so the block stays open.
        let data = b"begincidchar\n<0041> 1\n  endcidchar\n<0042> 2\nendcidchar\n<0043> 3";
        let map = parse_cid_cmap(data);
        assert_eq!(map.get(0x41), Some(1));
        assert_eq!(map.get(0x42), Some(2));
        assert_eq!(map.get(0x43), None);
    }

    #[test]
    fn test_begin_keyword_suffix_match() {
        let map = parse_cid_cmap(b"100 begincidrange\n<3041> <3042> 842\nendcidrange");
        assert_eq!(map.get(0x3041), Some(842));
        assert_eq!(map.get(0x3042), Some(843));
    }

    #[test]
    fn test_reversed_range_ignored() {
        let map = parse_cid_cmap(b"begincidrange\n<0043> <0041> 100\nendcidrange");
        assert!(map.is_empty());
    }

    #[test]
    fn test_oversized_range_skipped() {
        let mut decoder = CMapDecoder::new(4);
        decoder.feed_line("begincidrange");
        decoder.feed_line("<0041> <0045> 1");
        decoder.feed_line("<0041> <0044> 1");
        decoder.feed_line("endcidrange");
        let map = decoder.finish();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(0x45), None);
    }

    #[test]
    fn test_decode_reader_crlf_and_cr() {
        let data = b"begincidchar\r\n<0041> 1\r\nendcidchar\rbegincidchar\r<0042> 2\rendcidchar\r";
        let map = decode_cid_cmap(Cursor::new(&data[..]), DEFAULT_MAX_RANGE_LEN).unwrap();
        assert_eq!(map.get(0x41), Some(1));
        assert_eq!(map.get(0x42), Some(2));
    }

    #[test]
    fn test_decode_reader_matches_slice_parser() {
        let data = b"1 begincidrange\n<4e00> <4e05> 1200\nendcidrange\n1 begincidchar\n<3000> 633\nendcidchar\n";
        let from_reader = decode_cid_cmap(Cursor::new(&data[..]), DEFAULT_MAX_RANGE_LEN).unwrap();
        assert_eq!(from_reader, parse_cid_cmap(data));
    }

    #[test]
    fn test_utf16be_hex_to_code_point() {
        assert_eq!(utf16be_hex_to_code_point("0041"), Some(0x41));
        assert_eq!(utf16be_hex_to_code_point("41"), Some(0x41));
        assert_eq!(utf16be_hex_to_code_point("FF5E"), Some(0xFF5E));
        assert_eq!(utf16be_hex_to_code_point("D835DF0C"), Some(0x1D70C));
        assert_eq!(utf16be_hex_to_code_point("00410042"), Some(0x41));
        assert_eq!(utf16be_hex_to_code_point("D835"), None);
        assert_eq!(utf16be_hex_to_code_point("041"), None);
        assert_eq!(utf16be_hex_to_code_point(""), None);
    }

    #[test]
    fn test_cid_overflow_line_skipped() {
        let map = parse_cid_cmap(b"begincidchar\n<0041> 99999999999\nendcidchar");
        assert!(map.is_empty());
    }

    #[test]
    fn test_parse_empty_cmap() {
        assert!(parse_cid_cmap(b"").is_empty());
    }
}
