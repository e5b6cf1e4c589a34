//! Composite (Type 0 / CIDFontType0) CJK fonts.
//!
//! A [`CompositeFont`] resolves advance widths for Unicode text in two steps:
//!
//! 1. code point → CID through the encoding's CMap (`UniJIS-UTF16-H`, ...)
//! 2. CID → width through the decoded `/W` table, falling back to `/DW`
//!
//! Code points without a CID contribute zero width: characters outside the
//! font's repertoire are dropped from width accounting.
//!
//! The width table is decoded when the font is created; a malformed table
//! fails construction. The CMap is decoded on first use (or by
//! [`CompositeFont::load`]) and shared through a [`CMapCache`] when enabled.
//! A failed CMap load leaves the font permanently unusable.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock};

use crate::config::MetricsConfig;
use crate::error::{Error, Result};
use crate::fonts::cache::CMapCache;
use crate::fonts::catalog::MetricCatalog;
use crate::fonts::cmap::{decode_cid_cmap, UnicodeToCidMap};
use crate::fonts::profile::{CidSystemInfo, DescriptorMetrics, FontProfile, Language, Style};
use crate::fonts::resource::CMapSource;
use crate::fonts::widths::{WidthRun, WidthTable};

/// Load state of a composite font's CMap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Not yet requested
    Unloaded,
    /// Being decoded by another caller
    Loading,
    /// Ready for queries
    Loaded,
    /// Decoding failed; every query fails
    Failed,
}

#[derive(Debug)]
enum Phase {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

/// Marks the font failed if the decoder unwinds, so waiters never hang.
struct LoadGuard<'a> {
    font: &'a CompositeFont,
    armed: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        log::warn!("Font '{}' panicked while loading its CMap", self.font.profile.base_font_name);
        *self.font.lock_phase() = Phase::Failed("CMap load panicked".to_string());
        self.font.ready.notify_all();
    }
}

/// Everything a document writer needs to emit the descendant CIDFont.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidFontInfo {
    /// PostScript name (`/BaseFont`)
    pub base_font: String,
    /// Encoding CMap name (`/Encoding` of the Type 0 font)
    pub encoding: String,
    /// Character collection (`/CIDSystemInfo`)
    pub cid_system_info: CidSystemInfo,
    /// Default width (`/DW`)
    pub default_width: i32,
    /// Compact widths (`/W`)
    pub widths: Vec<WidthRun>,
    /// Font descriptor metrics
    pub descriptor: DescriptorMetrics,
}

/// A CJK composite font with lazily decoded CMap.
pub struct CompositeFont {
    profile: FontProfile,
    widths: WidthTable,
    source: Arc<dyn CMapSource>,
    cache: Option<Arc<CMapCache>>,
    max_range_len: u32,
    cmap: OnceLock<Arc<UnicodeToCidMap>>,
    phase: Mutex<Phase>,
    ready: Condvar,
}

impl fmt::Debug for CompositeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeFont")
            .field("base_font", &self.profile.base_font_name)
            .field("encoding", &self.profile.encoding_id)
            .field("widths", &self.widths.len())
            .field("state", &self.load_state())
            .finish()
    }
}

impl CompositeFont {
    /// Create a font from a profile, decoding its width table.
    ///
    /// Uses the global [`CMapCache`] when `config.share_cmaps` is set; the
    /// map is then shared with other fonts built on the same `source` instance.
    pub fn new(profile: FontProfile, source: Arc<dyn CMapSource>, config: &MetricsConfig) -> Result<Self> {
        let widths =
            WidthTable::decode_with_limit(&profile.compact_widths, profile.default_width, config.max_range_len)?;
        let cache = if config.share_cmaps {
            Some(CMapCache::global())
        } else {
            None
        };

        log::debug!(
            "Created composite font '{}' ({}, {} explicit widths)",
            profile.base_font_name,
            profile.encoding_id,
            widths.len()
        );

        Ok(Self {
            profile,
            widths,
            source,
            cache,
            max_range_len: config.max_range_len,
            cmap: OnceLock::new(),
            phase: Mutex::new(Phase::Unloaded),
            ready: Condvar::new(),
        })
    }

    /// Create a font from the built-in catalog.
    pub fn builtin(
        language: Language,
        style: Style,
        source: Arc<dyn CMapSource>,
        config: &MetricsConfig,
    ) -> Result<Self> {
        let profile = MetricCatalog::builtin()
            .get(language, style)
            .cloned()
            .ok_or_else(|| Error::UnknownProfile {
                language: language.to_string(),
                style: style.to_string(),
            })?;
        Self::new(profile, source, config)
    }

    /// Use a specific cache instead of the configured one.
    pub fn with_cache(mut self, cache: Arc<CMapCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The profile this font was created from.
    pub fn profile(&self) -> &FontProfile {
        &self.profile
    }

    /// The decoded width table.
    pub fn width_table(&self) -> &WidthTable {
        &self.widths
    }

    /// PostScript name.
    pub fn base_font(&self) -> &str {
        &self.profile.base_font_name
    }

    /// Descriptor metrics.
    pub fn descriptor(&self) -> &DescriptorMetrics {
        &self.profile.descriptor
    }

    /// Current load state.
    pub fn load_state(&self) -> LoadState {
        if self.cmap.get().is_some() {
            return LoadState::Loaded;
        }
        match &*self.lock_phase() {
            Phase::Unloaded => LoadState::Unloaded,
            Phase::Loading => LoadState::Loading,
            Phase::Loaded => LoadState::Loaded,
            Phase::Failed(_) => LoadState::Failed,
        }
    }

    /// Decode the CMap now. Does nothing if already loaded.
    pub fn load(&self) -> Result<()> {
        self.cmap().map(|_| ())
    }

    /// The decoded CMap, loading it on first use.
    pub fn cmap(&self) -> Result<&UnicodeToCidMap> {
        if let Some(map) = self.cmap.get() {
            return Ok(&**map);
        }
        self.load_slow().map(|map| &**map)
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn unavailable(&self, reason: &str) -> Error {
        Error::FontUnavailable {
            font: self.profile.base_font_name.clone(),
            reason: reason.to_string(),
        }
    }

    fn load_slow(&self) -> Result<&Arc<UnicodeToCidMap>> {
        let mut phase = self.lock_phase();
        loop {
            if let Some(map) = self.cmap.get() {
                return Ok(map);
            }
            if let Phase::Failed(reason) = &*phase {
                return Err(self.unavailable(reason));
            }
            if !matches!(*phase, Phase::Loading) {
                break;
            }
            phase = self.ready.wait(phase).unwrap_or_else(|poisoned| poisoned.into_inner());
        }

        *phase = Phase::Loading;
        drop(phase);
        log::debug!(
            "Loading CMap '{}' for font '{}'",
            self.profile.encoding_id,
            self.profile.base_font_name
        );

        let mut guard = LoadGuard { font: self, armed: true };
        let result = self.decode_cmap();
        guard.armed = false;

        let mut phase = self.lock_phase();
        let outcome = match result {
            Ok(map) => {
                *phase = Phase::Loaded;
                log::debug!(
                    "Font '{}' loaded: {} code points mapped",
                    self.profile.base_font_name,
                    map.len()
                );
                Ok(self.cmap.get_or_init(|| map))
            },
            Err(e) => {
                log::warn!("Font '{}' failed to load: {}", self.profile.base_font_name, e);
                *phase = Phase::Failed(e.to_string());
                Err(e)
            },
        };
        self.ready.notify_all();
        outcome
    }

    fn decode_cmap(&self) -> Result<Arc<UnicodeToCidMap>> {
        let encoding_id = self.profile.encoding_id.as_str();
        let decode = || -> Result<UnicodeToCidMap> {
            let reader = self.source.open(encoding_id)?;
            decode_cid_cmap(reader, self.max_range_len).map_err(|source| Error::ResourceUnavailable {
                resource: encoding_id.to_string(),
                source,
            })
        };

        match &self.cache {
            Some(cache) => cache.get_or_load(&self.source, encoding_id, self.max_range_len, decode),
            None => decode().map(Arc::new),
        }
    }

    /// CID of a code point, if the encoding maps it.
    pub fn cid_for(&self, code_point: u32) -> Result<Option<u32>> {
        Ok(self.cmap()?.get(code_point))
    }

    /// Width of a CID; does not need the CMap.
    #[inline]
    pub fn cid_width(&self, cid: u32) -> i32 {
        self.widths.width(cid)
    }

    /// Width of a code point in 1000ths of em; 0 if it has no CID.
    pub fn code_point_width(&self, code_point: u32) -> Result<i32> {
        let cmap = self.cmap()?;
        Ok(cmap.get(code_point).map_or(0, |cid| self.widths.width(cid)))
    }

    /// Width of a character in 1000ths of em; 0 if it has no CID.
    pub fn char_width(&self, ch: char) -> Result<i32> {
        self.code_point_width(ch as u32)
    }

    /// Total width of a string in 1000ths of em.
    pub fn text_width(&self, text: &str) -> Result<i64> {
        let cmap = self.cmap()?;
        Ok(text
            .chars()
            .filter_map(|ch| cmap.get_char(ch))
            .map(|cid| i64::from(self.widths.width(cid)))
            .sum())
    }

    /// Total width of UTF-16 text in 1000ths of em.
    ///
    /// Surrogate pairs count once. An unpaired surrogate is looked up as
    /// its own code unit value, which CMaps never map.
    pub fn utf16_width(&self, units: &[u16]) -> Result<i64> {
        let cmap = self.cmap()?;
        Ok(char::decode_utf16(units.iter().copied())
            .map(|r| r.map_or_else(|e| u32::from(e.unpaired_surrogate()), u32::from))
            .filter_map(|cp| cmap.get(cp))
            .map(|cid| i64::from(self.widths.width(cid)))
            .sum())
    }

    /// Encode text for a `-UTF16-H` CMap (UTF-16BE).
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
    }

    /// Decode UTF-16BE bytes; malformed input becomes U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let chunks = bytes.chunks_exact(2);
        let odd = !chunks.remainder().is_empty();
        let units: Vec<u16> = chunks.map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
        let mut text = String::from_utf16_lossy(&units);
        if odd {
            text.push(char::REPLACEMENT_CHARACTER);
        }
        text
    }

    /// Data for emitting the descendant CIDFont and its descriptor.
    pub fn descendant_info(&self) -> CidFontInfo {
        CidFontInfo {
            base_font: self.profile.base_font_name.clone(),
            encoding: self.profile.encoding_id.clone(),
            cid_system_info: self.profile.cid_system_info(),
            default_width: self.profile.default_width,
            widths: self.widths.to_runs(),
            descriptor: self.profile.descriptor,
        }
    }
}
