//! Metric catalog: font profiles keyed by language and style.
//!
//! The built-in catalog carries the eight Adobe CJK profiles (Simplified and
//! Traditional Chinese, Japanese, Korean; sans-serif and serif). Their width
//! tables come from the CID0 unicode font metrics distributed with TCPDF and
//! are embedded from `data/widths/`.
//!
//! Callers with their own metrics can build a catalog in code or load one
//! from JSON:
//!
//! ```
//! use cid_metrics::fonts::catalog::MetricCatalog;
//! use cid_metrics::fonts::{Language, Style};
//!
//! let json = r#"[{
//!     "language": "ko", "style": "sans",
//!     "base_font_name": "MyGothic", "ordering": "Korea1", "supplement": 2,
//!     "default_width": 1000, "encoding_id": "UniKS-UTF16-H",
//!     "compact_widths": "1 [500]",
//!     "descriptor": { "flags": 4, "italic_angle": 0, "ascent": 880, "descent": -120,
//!                     "cap_height": 700, "stem_v": 80, "font_bbox": [0, -120, 1000, 880] }
//! }]"#;
//! let catalog = MetricCatalog::from_json(json).unwrap();
//! assert!(catalog.get(Language::Korean, Style::Sans).is_some());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::fonts::profile::{DescriptorMetrics, FontProfile, Language, Style};

/// Key used when a string lookup names no known profile.
pub const FALLBACK_KEY: (Language, Style) = (Language::Japanese, Style::Sans);

lazy_static::lazy_static! {
    static ref BUILTIN: MetricCatalog = MetricCatalog::build_builtin();
}

/// One catalog entry in the JSON representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogEntry {
    language: Language,
    style: Style,
    #[serde(flatten)]
    profile: FontProfile,
}

/// Keyed table of font profiles.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    profiles: HashMap<(Language, Style), FontProfile>,
}

impl MetricCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Adobe CJK catalog.
    pub fn builtin() -> &'static MetricCatalog {
        &BUILTIN
    }

    /// Load a catalog from a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry.language, entry.style, entry.profile);
        }
        Ok(catalog)
    }

    /// Serialize the catalog as a JSON array, sorted by key.
    pub fn to_json(&self) -> Result<String> {
        let mut entries: Vec<CatalogEntry> = self
            .profiles
            .iter()
            .map(|(&(language, style), profile)| CatalogEntry {
                language,
                style,
                profile: profile.clone(),
            })
            .collect();
        entries.sort_by_key(|e| (e.language.code(), e.style.code()));
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Add or replace a profile.
    pub fn insert(&mut self, language: Language, style: Style, profile: FontProfile) {
        self.profiles.insert((language, style), profile);
    }

    /// Profile for a key.
    pub fn get(&self, language: Language, style: Style) -> Option<&FontProfile> {
        self.profiles.get(&(language, style))
    }

    /// Profile for string codes, failing if either code or the entry is unknown.
    pub fn get_strict(&self, language: &str, style: &str) -> Result<&FontProfile> {
        let unknown = || Error::UnknownProfile {
            language: language.to_string(),
            style: style.to_string(),
        };
        let lang = language.parse::<Language>().map_err(|_| unknown())?;
        let sty = style.parse::<Style>().map_err(|_| unknown())?;
        self.get(lang, sty).ok_or_else(unknown)
    }

    /// Profile for string codes, falling back to Japanese sans-serif.
    ///
    /// Returns `None` only when the catalog also lacks the fallback entry.
    pub fn select(&self, language: &str, style: &str) -> Option<&FontProfile> {
        match self.get_strict(language, style) {
            Ok(profile) => Some(profile),
            Err(_) => {
                log::warn!(
                    "No metric profile for '{}'/'{}', using {}/{}",
                    language,
                    style,
                    FALLBACK_KEY.0,
                    FALLBACK_KEY.1
                );
                self.get(FALLBACK_KEY.0, FALLBACK_KEY.1)
            },
        }
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Keys present in the catalog, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = (Language, Style)> + '_ {
        self.profiles.keys().copied()
    }

    fn build_builtin() -> Self {
        let mut catalog = Self::new();

        catalog.insert(
            Language::ChineseSimplified,
            Style::Sans,
            adobe_profile("AdobeHeitiStd-Regular", "GB1", 5, "UniGB-UTF16-H", CN_SANS, 766, 80, [-163, -283, 1087, 967]),
        );
        catalog.insert(
            Language::ChineseSimplified,
            Style::Serif,
            adobe_profile("AdobeSongStd-Light", "GB1", 5, "UniGB-UTF16-H", CN_SERIF, 626, 80, [-134, -254, 1001, 905]),
        );
        catalog.insert(
            Language::ChineseTraditional,
            Style::Sans,
            adobe_profile("AdobeFanHeitiStd-bold", "CNS1", 5, "UniCNS-UTF16-H", TW_SANS, 766, 80, [-163, -283, 1087, 967]),
        );
        catalog.insert(
            Language::ChineseTraditional,
            Style::Serif,
            adobe_profile("AdobeMingStd-Light", "CNS1", 5, "UniCNS-UTF16-H", TW_SERIF, 731, 80, [-38, -121, 1002, 918]),
        );
        catalog.insert(
            Language::Japanese,
            Style::Sans,
            adobe_profile("KozGoPr6N-Medium", "Japan1", 6, "UniJIS-UTF16-H", JA_SANS, 763, 116, [-538, -378, 1254, 1418]),
        );
        catalog.insert(
            Language::Japanese,
            Style::Serif,
            adobe_profile("KozMinPr6N-Regular", "Japan1", 6, "UniJIS-UTF16-H", JA_SERIF, 742, 80, [-437, -340, 1147, 1317]),
        );
        catalog.insert(
            Language::Korean,
            Style::Sans,
            adobe_profile("AdobeGothicStd-Bold", "Korea1", 2, "UniKS-UTF16-H", KO_SANS, 769, 80, [-165, -285, 1092, 972]),
        );
        catalog.insert(
            Language::Korean,
            Style::Serif,
            adobe_profile("AdobeMyungjoStd-Medium", "Korea1", 2, "UniKS-UTF16-H", KO_SERIF, 719, 80, [-28, -148, 1001, 883]),
        );

        catalog
    }
}

const CN_SANS: &str = include_str!("../../data/widths/cn_sans.txt");
const CN_SERIF: &str = include_str!("../../data/widths/cn_serif.txt");
const TW_SANS: &str = include_str!("../../data/widths/tw_sans.txt");
const TW_SERIF: &str = include_str!("../../data/widths/tw_serif.txt");
const JA_SANS: &str = include_str!("../../data/widths/ja_sans.txt");
const JA_SERIF: &str = include_str!("../../data/widths/ja_serif.txt");
const KO_SANS: &str = include_str!("../../data/widths/ko_sans.txt");
const KO_SERIF: &str = include_str!("../../data/widths/ko_serif.txt");

/// All built-in fonts share ascent/descent, flags and default width.
#[allow(clippy::too_many_arguments)]
fn adobe_profile(
    base_font_name: &str,
    ordering: &str,
    supplement: i32,
    encoding_id: &str,
    widths: &str,
    cap_height: i32,
    stem_v: i32,
    font_bbox: [i32; 4],
) -> FontProfile {
    FontProfile {
        base_font_name: base_font_name.to_string(),
        ordering: ordering.to_string(),
        supplement,
        default_width: 1000,
        encoding_id: encoding_id.to_string(),
        compact_widths: widths.trim().to_string(),
        descriptor: DescriptorMetrics {
            flags: 4,
            italic_angle: 0,
            ascent: 880,
            descent: -120,
            cap_height,
            stem_v,
            font_bbox,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::widths::WidthTable;

    #[test]
    fn test_builtin_has_all_combinations() {
        let catalog = MetricCatalog::builtin();
        assert_eq!(catalog.len(), 8);
        for lang in Language::ALL {
            for style in Style::ALL {
                assert!(catalog.get(lang, style).is_some(), "missing {}/{}", lang, style);
            }
        }
    }

    #[test]
    fn test_builtin_width_tables_decode() {
        let catalog = MetricCatalog::builtin();
        for (lang, style) in catalog.keys() {
            let profile = catalog.get(lang, style).unwrap();
            let table = WidthTable::decode(&profile.compact_widths, profile.default_width);
            assert!(table.is_ok(), "{}/{} width table failed: {:?}", lang, style, table.err());
            assert!(!table.unwrap().is_empty());
        }
    }

    #[test]
    fn test_builtin_japanese_serif() {
        let profile = MetricCatalog::builtin().get(Language::Japanese, Style::Serif).unwrap();
        assert_eq!(profile.base_font_name, "KozMinPr6N-Regular");
        assert_eq!(profile.ordering, "Japan1");
        assert_eq!(profile.supplement, 6);
        assert_eq!(profile.encoding_id, "UniJIS-UTF16-H");
        assert_eq!(profile.descriptor.cap_height, 742);

        let table = WidthTable::decode(&profile.compact_widths, profile.default_width).unwrap();
        assert_eq!(table.width(1), 278);
        assert_eq!(table.width(4), 614);
        assert_eq!(table.width(5), 614);
    }

    #[test]
    fn test_select_falls_back_to_japanese_sans() {
        let catalog = MetricCatalog::builtin();
        let profile = catalog.select("fr", "sans").unwrap();
        assert_eq!(profile.base_font_name, "KozGoPr6N-Medium");
        let profile = catalog.select("ko", "serif").unwrap();
        assert_eq!(profile.base_font_name, "AdobeMyungjoStd-Medium");
    }

    #[test]
    fn test_get_strict_unknown() {
        let err = MetricCatalog::builtin().get_strict("cn", "mono").unwrap_err();
        assert!(matches!(err, Error::UnknownProfile { .. }));
    }

    #[test]
    fn test_select_on_empty_catalog() {
        assert!(MetricCatalog::new().select("ja", "sans").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let json = MetricCatalog::builtin().to_json().unwrap();
        let loaded = MetricCatalog::from_json(&json).unwrap();
        assert_eq!(loaded.len(), 8);
        assert_eq!(
            loaded.get(Language::Korean, Style::Sans),
            MetricCatalog::builtin().get(Language::Korean, Style::Sans)
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(MetricCatalog::from_json("{not json"), Err(Error::Catalog(_))));
    }
}
