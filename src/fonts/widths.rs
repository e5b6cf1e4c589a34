//! Compact CID width tables.
//!
//! Composite fonts describe glyph widths with the run syntax of the PDF `/W`
//! array (ISO 32000-1:2008, Section 9.7.4.3):
//!
//! ```text
//! 1 [224 266 392] 9 10 322 27 [245 247]
//! ```
//!
//! - `c [w0 w1 ... wn]` assigns `w0` to CID `c`, `w1` to `c + 1`, and so on
//! - `c_first c_last w` assigns `w` to every CID in `c_first..=c_last`
//!
//! Widths are in 1000ths of em. CIDs without an entry use the font's
//! default width (`/DW`).
//!
//! Unlike CMap decoding, width decoding is strict: the tables are small
//! first-party strings, so any deviation from the grammar is an error.
//! Whitespace around brackets is the one leniency: `5 [ 100 ]` reads as
//! `5 [100]`, and an empty array `7 []` assigns nothing.

use std::collections::HashMap;
use std::fmt;
use std::iter::{Enumerate, Peekable};
use std::str::SplitWhitespace;

use crate::config::DEFAULT_MAX_RANGE_LEN;
use crate::error::{Error, Result};

/// One element group of a width array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidthRun {
    /// Consecutive CIDs starting at `start`, one width each
    Array {
        /// First CID
        start: u32,
        /// Width of `start + i` at index `i`
        widths: Vec<i32>,
    },
    /// Every CID in `first..=last` has the same width
    Range {
        /// First CID of the range
        first: u32,
        /// Last CID of the range (inclusive)
        last: u32,
        /// Shared width
        width: i32,
    },
}

impl WidthRun {
    /// Number of CIDs this run assigns; 0 for a reversed range.
    pub fn cid_count(&self) -> u64 {
        match self {
            WidthRun::Array { widths, .. } => widths.len() as u64,
            WidthRun::Range { first, last, .. } => last.checked_sub(*first).map_or(0, |span| u64::from(span) + 1),
        }
    }
}

impl fmt::Display for WidthRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidthRun::Array { start, widths } => {
                write!(f, "{} [", start)?;
                for (i, w) in widths.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", w)?;
                }
                f.write_str("]")
            },
            WidthRun::Range { first, last, width } => write!(f, "{} {} {}", first, last, width),
        }
    }
}

/// Render runs as a PDF `/W` array, e.g. `[1 [224 266] 9 10 322]`.
pub fn format_width_runs(runs: &[WidthRun]) -> String {
    let body = runs
        .iter()
        .map(|run| run.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{}]", body)
}

type Tokens<'a> = Peekable<Enumerate<SplitWhitespace<'a>>>;

fn malformed(position: usize, token: &str, reason: impl Into<String>) -> Error {
    Error::MalformedWidthTable {
        position,
        token: token.to_string(),
        reason: reason.into(),
    }
}

fn next_token<'a>(tokens: &mut Tokens<'a>, after: usize, expected: &str) -> Result<(usize, &'a str)> {
    tokens
        .next()
        .ok_or_else(|| malformed(after + 1, "", format!("unexpected end of input, expected {}", expected)))
}

fn parse_cid(position: usize, token: &str) -> Result<u32> {
    token
        .parse::<u32>()
        .map_err(|e| malformed(position, token, format!("expected a CID: {}", e)))
}

fn parse_width(position: usize, token: &str) -> Result<i32> {
    token
        .parse::<i32>()
        .map_err(|e| malformed(position, token, format!("expected a width: {}", e)))
}

/// Collect the widths of a bracketed run whose opening token is `open`.
///
/// The run may span several tokens (`[224 266 392]`) and the brackets may
/// stand alone (`[ 224 ]`).
fn read_bracketed(position: usize, open: &str, tokens: &mut Tokens<'_>) -> Result<Vec<i32>> {
    let mut widths = Vec::new();
    let mut current = (position, &open[1..]);

    loop {
        let (pos, raw) = current;
        let (body, closed) = match raw.strip_suffix(']') {
            Some(body) => (body, true),
            None => (raw, false),
        };
        if body.contains('[') || body.contains(']') {
            return Err(malformed(pos, raw, "nested or stray bracket"));
        }
        if !body.is_empty() {
            widths.push(parse_width(pos, body)?);
        }
        if closed {
            return Ok(widths);
        }
        current = tokens
            .next()
            .ok_or_else(|| malformed(position, open, "unterminated width array"))?;
    }
}

/// Decode a compact width source into runs, in source order.
///
/// After a starting CID, a token opening with `[` selects the array form;
/// anything else is read as the last CID of a range followed by its width.
pub fn decode_width_runs(source: &str, max_range_len: u32) -> Result<Vec<WidthRun>> {
    let mut tokens: Tokens<'_> = source.split_whitespace().enumerate().peekable();
    let mut runs = Vec::new();

    while let Some((pos, token)) = tokens.next() {
        let first = parse_cid(pos, token)?;
        let (next_pos, next) = next_token(&mut tokens, pos, "a width array or range end")?;

        if next.starts_with('[') {
            let widths = read_bracketed(next_pos, next, &mut tokens)?;
            if !widths.is_empty() && first.checked_add(widths.len() as u32 - 1).is_none() {
                return Err(malformed(next_pos, next, "width array runs past the largest CID"));
            }
            runs.push(WidthRun::Array {
                start: first,
                widths,
            });
        } else {
            let last = parse_cid(next_pos, next)?;
            let (width_pos, width_token) = next_token(&mut tokens, next_pos, "a range width")?;
            let width = parse_width(width_pos, width_token)?;

            if last < first {
                return Err(malformed(next_pos, next, format!("range end precedes start {}", first)));
            }
            if last - first >= max_range_len {
                return Err(malformed(
                    next_pos,
                    next,
                    format!("range {}..={} exceeds the limit of {} CIDs", first, last, max_range_len),
                ));
            }
            runs.push(WidthRun::Range { first, last, width });
        }
    }

    Ok(runs)
}

/// Decoded mapping from CID to advance width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthTable {
    widths: HashMap<u32, i32>,
    default_width: i32,
}

impl WidthTable {
    /// Decode a compact width source.
    ///
    /// # Examples
    ///
    /// ```
    /// use cid_metrics::fonts::widths::WidthTable;
    ///
    /// let table = WidthTable::decode("1 [100 200 300] 10 20 500", 1000).unwrap();
    /// assert_eq!(table.width(2), 200);
    /// assert_eq!(table.width(15), 500);
    /// assert_eq!(table.width(4), 1000);
    /// ```
    pub fn decode(source: &str, default_width: i32) -> Result<Self> {
        Self::decode_with_limit(source, default_width, DEFAULT_MAX_RANGE_LEN)
    }

    /// Decode with an explicit range expansion cap.
    pub fn decode_with_limit(source: &str, default_width: i32, max_range_len: u32) -> Result<Self> {
        let runs = decode_width_runs(source, max_range_len)?;
        let table = Self::from_runs(&runs, default_width);
        log::debug!("Decoded width table: {} runs, {} CIDs with explicit widths", runs.len(), table.len());
        Ok(table)
    }

    /// Build a table by applying runs in order; later runs overwrite earlier ones.
    pub fn from_runs(runs: &[WidthRun], default_width: i32) -> Self {
        let mut widths = HashMap::new();
        for run in runs {
            match run {
                WidthRun::Array { start, widths: ws } => {
                    for (i, &w) in ws.iter().enumerate() {
                        if let Some(cid) = start.checked_add(i as u32) {
                            widths.insert(cid, w);
                        }
                    }
                },
                WidthRun::Range { first, last, width } => {
                    for cid in *first..=*last {
                        widths.insert(cid, *width);
                    }
                },
            }
        }
        Self {
            widths,
            default_width,
        }
    }

    /// Width of a CID, falling back to the default width.
    #[inline]
    pub fn width(&self, cid: u32) -> i32 {
        self.widths.get(&cid).copied().unwrap_or(self.default_width)
    }

    /// Explicit width of a CID, if any.
    pub fn get(&self, cid: u32) -> Option<i32> {
        self.widths.get(&cid).copied()
    }

    /// Default width (`/DW`).
    pub fn default_width(&self) -> i32 {
        self.default_width
    }

    /// Number of CIDs with explicit widths.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    /// Whether no CID has an explicit width.
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Explicit `(cid, width)` entries in ascending CID order.
    pub fn entries(&self) -> Vec<(u32, i32)> {
        let mut entries: Vec<(u32, i32)> = self.widths.iter().map(|(&c, &w)| (c, w)).collect();
        entries.sort_unstable_by_key(|&(cid, _)| cid);
        entries
    }

    /// Re-encode the table in compact run form.
    ///
    /// Consecutive CIDs sharing a width (two or more) become ranges; other
    /// consecutive CIDs are gathered into arrays.
    pub fn to_runs(&self) -> Vec<WidthRun> {
        let entries = self.entries();
        let mut runs = Vec::new();
        let mut pending: Option<(u32, Vec<i32>)> = None;

        let mut i = 0;
        while i < entries.len() {
            let (cid, width) = entries[i];

            // Extend over consecutive CIDs with the same width.
            let mut j = i + 1;
            while j < entries.len() && entries[j].1 == width && entries[j].0 == entries[j - 1].0 + 1 {
                j += 1;
            }
            let last = entries[j - 1].0;

            let contiguous = pending
                .as_ref()
                .map(|(start, ws)| *start as u64 + ws.len() as u64 == cid as u64)
                .unwrap_or(false);

            if j - i >= 2 {
                if let Some((start, ws)) = pending.take() {
                    runs.push(WidthRun::Array { start, widths: ws });
                }
                runs.push(WidthRun::Range {
                    first: cid,
                    last,
                    width,
                });
            } else if contiguous {
                if let Some((_, ws)) = pending.as_mut() {
                    ws.push(width);
                }
            } else {
                if let Some((start, ws)) = pending.take() {
                    runs.push(WidthRun::Array { start, widths: ws });
                }
                pending = Some((cid, vec![width]));
            }

            i = j;
        }

        if let Some((start, ws)) = pending {
            runs.push(WidthRun::Array { start, widths: ws });
        }
        runs
    }
}
