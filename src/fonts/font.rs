//! Font variants behind one metrics interface.

use crate::error::Result;
use crate::fonts::composite::CompositeFont;
use crate::fonts::profile::DescriptorMetrics;
use crate::fonts::simple::{MMType1Font, SimpleFont, Type1Font};

/// Width and descriptor queries shared by every font variant.
///
/// Widths are in 1000ths of em.
pub trait FontMetrics {
    /// PostScript name.
    fn base_font(&self) -> &str;

    /// Descriptor metrics.
    fn descriptor(&self) -> &DescriptorMetrics;

    /// Width of one character.
    fn char_width(&self, ch: char) -> Result<i32>;

    /// Total width of a string.
    fn text_width(&self, text: &str) -> Result<i64> {
        text.chars()
            .try_fold(0i64, |total, ch| Ok(total + i64::from(self.char_width(ch)?)))
    }

    /// Width of a string in points at the given font size.
    fn scaled_text_width(&self, text: &str, font_size: f32) -> Result<f32> {
        Ok(self.text_width(text)? as f32 * font_size / 1000.0)
    }
}

impl FontMetrics for SimpleFont {
    fn base_font(&self) -> &str {
        SimpleFont::base_font(self)
    }

    fn descriptor(&self) -> &DescriptorMetrics {
        SimpleFont::descriptor(self)
    }

    fn char_width(&self, ch: char) -> Result<i32> {
        Ok(SimpleFont::char_width(self, ch))
    }

    fn text_width(&self, text: &str) -> Result<i64> {
        Ok(SimpleFont::text_width(self, text))
    }
}

impl FontMetrics for Type1Font {
    fn base_font(&self) -> &str {
        self.simple().base_font()
    }

    fn descriptor(&self) -> &DescriptorMetrics {
        self.simple().descriptor()
    }

    fn char_width(&self, ch: char) -> Result<i32> {
        Ok(self.simple().char_width(ch))
    }

    fn text_width(&self, text: &str) -> Result<i64> {
        Ok(self.simple().text_width(text))
    }
}

impl FontMetrics for MMType1Font {
    fn base_font(&self) -> &str {
        self.type1().base_font()
    }

    fn descriptor(&self) -> &DescriptorMetrics {
        FontMetrics::descriptor(self.type1())
    }

    fn char_width(&self, ch: char) -> Result<i32> {
        FontMetrics::char_width(self.type1(), ch)
    }

    fn text_width(&self, text: &str) -> Result<i64> {
        FontMetrics::text_width(self.type1(), text)
    }
}

impl FontMetrics for CompositeFont {
    fn base_font(&self) -> &str {
        CompositeFont::base_font(self)
    }

    fn descriptor(&self) -> &DescriptorMetrics {
        CompositeFont::descriptor(self)
    }

    fn char_width(&self, ch: char) -> Result<i32> {
        CompositeFont::char_width(self, ch)
    }

    fn text_width(&self, text: &str) -> Result<i64> {
        CompositeFont::text_width(self, text)
    }
}

/// Any supported font.
#[derive(Debug)]
pub enum Font {
    /// Single-byte font
    Simple(SimpleFont),
    /// Type 1 font
    Type1(Type1Font),
    /// Multiple master Type 1 instance
    MMType1(MMType1Font),
    /// CJK composite font
    Composite(CompositeFont),
}

impl Font {
    /// Whether this font uses multi-byte codes.
    pub fn is_composite(&self) -> bool {
        matches!(self, Font::Composite(_))
    }

    /// The composite font, if this is one.
    pub fn as_composite(&self) -> Option<&CompositeFont> {
        match self {
            Font::Composite(font) => Some(font),
            _ => None,
        }
    }

    fn metrics(&self) -> &dyn FontMetrics {
        match self {
            Font::Simple(font) => font,
            Font::Type1(font) => font,
            Font::MMType1(font) => font,
            Font::Composite(font) => font,
        }
    }
}

impl FontMetrics for Font {
    fn base_font(&self) -> &str {
        self.metrics().base_font()
    }

    fn descriptor(&self) -> &DescriptorMetrics {
        self.metrics().descriptor()
    }

    fn char_width(&self, ch: char) -> Result<i32> {
        self.metrics().char_width(ch)
    }

    fn text_width(&self, text: &str) -> Result<i64> {
        self.metrics().text_width(text)
    }
}

impl From<SimpleFont> for Font {
    fn from(font: SimpleFont) -> Self {
        Font::Simple(font)
    }
}

impl From<Type1Font> for Font {
    fn from(font: Type1Font) -> Self {
        Font::Type1(font)
    }
}

impl From<MMType1Font> for Font {
    fn from(font: MMType1Font) -> Self {
        Font::MMType1(font)
    }
}

impl From<CompositeFont> for Font {
    fn from(font: CompositeFont) -> Self {
        Font::Composite(font)
    }
}
