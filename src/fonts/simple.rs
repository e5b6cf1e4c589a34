//! Single-byte fonts: simple, Type 1 and multiple master.
//!
//! These fonts address glyphs with one-byte codes, so their widths are a
//! flat `/Widths` array starting at `/FirstChar`. Characters above U+00FF
//! have no code in the font and contribute zero width.

use crate::fonts::profile::DescriptorMetrics;

/// The standard 14 Type 1 fonts every conforming reader provides.
pub const STANDARD_14: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-Oblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-BoldOblique",
    "Helvetica-Oblique",
    "Symbol",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "ZapfDingbats",
];

/// A font with a single-byte width array.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFont {
    base_font: String,
    first_char: u8,
    widths: Vec<i32>,
    missing_width: i32,
    descriptor: DescriptorMetrics,
}

impl SimpleFont {
    /// Create a font; `widths[i]` is the width of code `first_char + i`.
    pub fn new(base_font: impl Into<String>, first_char: u8, widths: Vec<i32>, descriptor: DescriptorMetrics) -> Self {
        Self {
            base_font: base_font.into(),
            first_char,
            widths,
            missing_width: 0,
            descriptor,
        }
    }

    /// Width of codes outside the array (`/MissingWidth`).
    pub fn with_missing_width(mut self, width: i32) -> Self {
        self.missing_width = width;
        self
    }

    /// PostScript name.
    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// First code covered by the width array.
    pub fn first_char(&self) -> u8 {
        self.first_char
    }

    /// Last code covered by the width array, if any.
    pub fn last_char(&self) -> Option<u8> {
        let len = u32::try_from(self.widths.len()).ok()?;
        let last = u32::from(self.first_char) + len.checked_sub(1)?;
        u8::try_from(last).ok()
    }

    /// The `/Widths` array.
    pub fn widths(&self) -> &[i32] {
        &self.widths
    }

    /// Descriptor metrics.
    pub fn descriptor(&self) -> &DescriptorMetrics {
        &self.descriptor
    }

    /// Width of a single-byte code.
    pub fn code_width(&self, code: u8) -> i32 {
        code.checked_sub(self.first_char)
            .and_then(|index| self.widths.get(usize::from(index)))
            .copied()
            .unwrap_or(self.missing_width)
    }

    /// Width of a character in 1000ths of em.
    pub fn char_width(&self, ch: char) -> i32 {
        match u8::try_from(u32::from(ch)) {
            Ok(code) => self.code_width(code),
            Err(_) => 0,
        }
    }

    /// Total width of a string in 1000ths of em.
    pub fn text_width(&self, text: &str) -> i64 {
        text.chars().map(|ch| i64::from(self.char_width(ch))).sum()
    }
}

/// A Type 1 font.
#[derive(Debug, Clone, PartialEq)]
pub struct Type1Font {
    font: SimpleFont,
    standard_14: bool,
}

impl Type1Font {
    /// Wrap simple font data as Type 1.
    pub fn new(font: SimpleFont) -> Self {
        let standard_14 = STANDARD_14.contains(&font.base_font());
        Self { font, standard_14 }
    }

    /// Whether this is one of the standard 14 fonts.
    pub fn is_standard_14(&self) -> bool {
        self.standard_14
    }

    /// Underlying width data.
    pub fn simple(&self) -> &SimpleFont {
        &self.font
    }
}

/// A multiple master Type 1 instance.
///
/// Metrics come from the instance's own width array; this type only adds
/// the instance naming convention.
#[derive(Debug, Clone, PartialEq)]
pub struct MMType1Font {
    font: Type1Font,
}

impl MMType1Font {
    /// Wrap simple font data as a multiple master instance.
    pub fn new(font: SimpleFont) -> Self {
        Self {
            font: Type1Font::new(font),
        }
    }

    /// Instance name with underscores read back as spaces,
    /// e.g. `MinionMM_366_465_11_` becomes `MinionMM 366 465 11 `.
    pub fn instance_name(&self) -> String {
        self.font.simple().base_font().replace('_', " ")
    }

    /// Underlying Type 1 font.
    pub fn type1(&self) -> &Type1Font {
        &self.font
    }
}
