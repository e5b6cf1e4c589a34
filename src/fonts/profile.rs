//! Font profiles: the static configuration of one composite font.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Registry of the Adobe character collections.
pub const ADOBE_REGISTRY: &str = "Adobe";

/// Script/language of a CJK font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Simplified Chinese (Adobe-GB1)
    #[serde(rename = "cn")]
    ChineseSimplified,
    /// Traditional Chinese (Adobe-CNS1)
    #[serde(rename = "tw")]
    ChineseTraditional,
    /// Japanese (Adobe-Japan1)
    #[serde(rename = "ja")]
    Japanese,
    /// Korean (Adobe-Korea1)
    #[serde(rename = "ko")]
    Korean,
}

impl Language {
    /// All languages with built-in profiles.
    pub const ALL: [Language; 4] = [
        Language::ChineseSimplified,
        Language::ChineseTraditional,
        Language::Japanese,
        Language::Korean,
    ];

    /// Short code: `cn`, `tw`, `ja` or `ko`.
    pub fn code(self) -> &'static str {
        match self {
            Language::ChineseSimplified => "cn",
            Language::ChineseTraditional => "tw",
            Language::Japanese => "ja",
            Language::Korean => "ko",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cn" => Ok(Language::ChineseSimplified),
            "tw" => Ok(Language::ChineseTraditional),
            "ja" => Ok(Language::Japanese),
            "ko" => Ok(Language::Korean),
            other => Err(Error::InvalidCode(format!("unknown language code '{}'", other))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Typeface style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Sans-serif (gothic/hei)
    Sans,
    /// Serif (mincho/song/ming/myungjo)
    Serif,
}

impl Style {
    /// All styles with built-in profiles.
    pub const ALL: [Style; 2] = [Style::Sans, Style::Serif];

    /// Short code: `sans` or `serif`.
    pub fn code(self) -> &'static str {
        match self {
            Style::Sans => "sans",
            Style::Serif => "serif",
        }
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sans" => Ok(Style::Sans),
            "serif" => Ok(Style::Serif),
            other => Err(Error::InvalidCode(format!("unknown style code '{}'", other))),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Character collection of a CIDFont (`/CIDSystemInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidSystemInfo {
    /// Issuer of the collection, "Adobe" for all built-in profiles
    pub registry: String,
    /// Collection name within the registry (e.g. "Japan1")
    pub ordering: String,
    /// Supplement number of the collection
    pub supplement: i32,
}

/// Font descriptor metrics, passed through to the document unchanged.
///
/// All values are in glyph space units (1000ths of em), except
/// `italic_angle` which is in degrees counter-clockwise from vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorMetrics {
    /// Font flags (ISO 32000-1:2008, Table 123)
    pub flags: i32,
    /// Italic angle in degrees
    pub italic_angle: i32,
    /// Maximum height above the baseline
    pub ascent: i32,
    /// Maximum depth below the baseline (negative)
    pub descent: i32,
    /// Height of flat capital letters
    pub cap_height: i32,
    /// Thickness of dominant vertical stems
    pub stem_v: i32,
    /// Bounding box `[llx, lly, urx, ury]`
    pub font_bbox: [i32; 4],
}

/// Static configuration of one composite font, selected from a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontProfile {
    /// PostScript name of the font (e.g. "KozMinPr6N-Regular")
    pub base_font_name: String,
    /// Character collection ordering (e.g. "Japan1")
    pub ordering: String,
    /// Character collection supplement
    pub supplement: i32,
    /// Width of CIDs without an explicit entry (`/DW`)
    pub default_width: i32,
    /// Identifier of the CMap resource (e.g. "UniJIS-UTF16-H")
    pub encoding_id: String,
    /// Compact run-encoded width source
    pub compact_widths: String,
    /// Descriptor metrics
    pub descriptor: DescriptorMetrics,
}

impl FontProfile {
    /// The `/CIDSystemInfo` of this font.
    pub fn cid_system_info(&self) -> CidSystemInfo {
        CidSystemInfo {
            registry: ADOBE_REGISTRY.to_string(),
            ordering: self.ordering.clone(),
            supplement: self.supplement,
        }
    }
}
