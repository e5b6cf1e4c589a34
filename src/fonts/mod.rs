//! Fonts and their glyph metrics.
//!
//! Composite CJK fonts resolve widths through two decoded tables: a CMap
//! (code point → CID, see [`cmap`]) and a width table (CID → width, see
//! [`widths`]). Single-byte fonts carry a flat width array.

pub mod cache;
pub mod catalog;
pub mod cmap;
pub mod composite;
pub mod font;
pub mod profile;
pub mod resource;
pub mod simple;
pub mod widths;

pub use cache::{CMapCache, CMapKey, CacheStats};
pub use catalog::MetricCatalog;
pub use cmap::{decode_cid_cmap, parse_cid_cmap, CMapDecoder, UnicodeToCidMap};
pub use composite::{CidFontInfo, CompositeFont, LoadState};
pub use font::{Font, FontMetrics};
pub use profile::{CidSystemInfo, DescriptorMetrics, FontProfile, Language, Style};
pub use resource::{CMapSource, DirectorySource, MemorySource};
pub use simple::{MMType1Font, SimpleFont, Type1Font};
pub use widths::{format_width_runs, WidthRun, WidthTable};
