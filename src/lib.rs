// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]

//! # cid_metrics
//!
//! Glyph metrics for PDF fonts, centered on CJK composite fonts.
//!
//! ## Core Features
//!
//! - **CMap decoding**: Adobe `*-UTF16-H` CMap resources (`begincidchar` /
//!   `begincidrange` blocks) into a code point → CID table
//! - **Width tables**: the `/W` run syntax (`c [w...]` and `c_first c_last w`)
//!   into a CID → width table, and back (ISO 32000-1:2008, 9.7.4.3)
//! - **Built-in catalog**: Adobe-GB1, CNS1, Japan1 and Korea1 sans/serif profiles
//! - **Lazy loading**: CMaps decode on first query and can be shared between
//!   fonts built on the same resource source
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cid_metrics::{CompositeFont, DirectorySource, FontMetrics, Language, MetricsConfig, Style};
//!
//! # fn main() -> cid_metrics::Result<()> {
//! let config = MetricsConfig::from_env().with_cmap_dir("/usr/share/poppler/cMap/Adobe-Japan1");
//! let source = Arc::new(DirectorySource::from_config(&config));
//! let font = CompositeFont::builtin(Language::Japanese, Style::Serif, source, &config)?;
//!
//! let width = font.text_width("こんにちは")?;
//! let points = font.scaled_text_width("こんにちは", 12.0)?;
//! println!("{} units, {:.1}pt", width, points);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Fonts, CMaps and width tables
pub mod fonts;

// Re-exports
pub use config::MetricsConfig;
pub use error::{Error, Result};
pub use fonts::{
    CMapCache, CMapSource, CompositeFont, DirectorySource, Font, FontMetrics, FontProfile, Language,
    MemorySource, MetricCatalog, Style, UnicodeToCidMap, WidthRun, WidthTable,
};
