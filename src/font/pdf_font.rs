//! Logical fonts built by the font engine.

use std::collections::BTreeSet;

use super::doc_font::{DocFont, FontRef, FontType, StdEncoding};
use super::maps::{DocFontMaps, FontMapEntry};
use super::source::FontSource;

/// A font resolved from the document: its cleaned-up name, family and
/// style, the program it was built from, and the tables used to map its
/// codes to Unicode.
#[derive(Debug, Clone)]
pub struct PdfFont {
    source: FontSource,
    name: String,
    family: String,
    bold: bool,
    italic: bool,
    encoding: Option<StdEncoding>,
    has_to_unicode: bool,
    map: Option<FontMapEntry>,
    unmapped_codes: BTreeSet<u32>,
    warnings: bool,
}

impl PdfFont {
    /// Build a font from its validated source and the interpreter's
    /// metadata, applying any substitution entry for its name.
    pub fn new(source: FontSource, doc_font: &DocFont, maps: &DocFontMaps) -> Self {
        let name = source.name().to_string();
        let map = maps.check_font_map(&name).cloned();
        let base = maps.strip_subset_tag(&name);
        let (base_family, style) = split_style(base);

        let family = map
            .as_ref()
            .and_then(|m| m.family.clone())
            .or_else(|| doc_font.family.clone().filter(|f| !f.is_empty()))
            .or_else(|| source.family().map(str::to_string))
            .unwrap_or_else(|| base_family.to_string());

        let style = style.to_ascii_lowercase();
        let bold = map.as_ref().and_then(|m| m.bold).unwrap_or(
            doc_font.bold
                || ["bold", "black", "heavy", "semibold"]
                    .iter()
                    .any(|s| style.contains(s)),
        );
        let italic = map.as_ref().and_then(|m| m.italic).unwrap_or(
            doc_font.italic || style.contains("italic") || style.contains("oblique"),
        );

        Self {
            source,
            name,
            family,
            bold,
            italic,
            encoding: doc_font.encoding,
            has_to_unicode: doc_font.has_to_unicode,
            map,
            unmapped_codes: BTreeSet::new(),
            warnings: false,
        }
    }

    pub fn font_ref(&self) -> FontRef {
        self.source.font_ref()
    }

    pub fn font_type(&self) -> FontType {
        self.source.font_type()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    pub fn has_to_unicode(&self) -> bool {
        self.has_to_unicode
    }

    pub fn encoding(&self) -> Option<StdEncoding> {
        self.encoding
    }

    pub fn has_std_encoding(&self) -> bool {
        self.encoding.is_some()
    }

    /// Whether the substitution table says to drop this font's text.
    pub fn is_ignored(&self) -> bool {
        self.map.as_ref().is_some_and(|m| m.ignore)
    }

    /// Whether nothing is available to map this font's codes.
    pub fn is_unknown(&self) -> bool {
        self.map.is_none() && !self.has_to_unicode && self.encoding.is_none()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings
    }

    /// Map a character code to Unicode: substitution table first, then the
    /// value decoded by the interpreter, then the standard encoding.
    /// Failures are remembered as unmapped codes.
    pub fn remap_glyph(&mut self, code: u32, unicode: &[u32]) -> Option<u32> {
        let mapped = self
            .map
            .as_ref()
            .and_then(|m| m.remap(code))
            .or_else(|| unicode.first().copied().filter(|&u| u != 0 && char::from_u32(u).is_some()))
            .or_else(|| self.encoding.and_then(|e| e.decode(code)));

        if mapped.is_none() {
            self.unmapped_codes.insert(code);
            self.warnings = true;
        }
        mapped
    }

    pub fn has_unmapped_codes(&self) -> bool {
        !self.unmapped_codes.is_empty()
    }

    pub fn unmapped_codes_str(&self) -> String {
        self.unmapped_codes
            .iter()
            .map(|c| format!("{:#x}", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Forget unmapped codes so the next page reports only its own.
    pub fn clear_unmapped_codes(&mut self) {
        self.unmapped_codes.clear();
    }
}

/// Split `Arial-BoldMT` into `("Arial", "BoldMT")` and `Times,Italic` into
/// `("Times", "Italic")`.
fn split_style(name: &str) -> (&str, &str) {
    match name.find(['-', ',']) {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos + 1..]),
        _ => (name, ""),
    }
}
