//! Font resolution cache.

use std::collections::HashMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

use super::doc_font::{DocFont, FontRef, FontType};
use super::maps::DocFontMaps;
use super::pdf_font::PdfFont;
use super::source::{FontLocation, FontLocator, FontSource};

const MODULE: &str = "font_engine";

/// Outcome of mapping a character code through the active font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRemap {
    /// The code resolved to this Unicode value.
    Remapped(u32),
    /// The active font's text should be dropped.
    Ignore,
    /// Mapping failed; the value is a best-effort fallback.
    Error(u32),
}

/// Caches one [`PdfFont`] per document font identity and tracks the font
/// currently used by the interpreter.
#[derive(Debug)]
pub struct FontEngine<'a> {
    maps: &'a DocFontMaps,
    fonts: HashMap<FontRef, PdfFont>,
    cur_font: Option<FontRef>,
    has_font_warnings: bool,
}

impl<'a> FontEngine<'a> {
    pub fn new(maps: &'a DocFontMaps) -> Self {
        Self {
            maps,
            fonts: HashMap::new(),
            cur_font: None,
            has_font_warnings: false,
        }
    }

    /// Resolve a document font, building and caching it on first use. The
    /// font becomes the active one. Returns `None` (after reporting why) if
    /// the font can't be used.
    pub fn load_font(
        &mut self,
        font: &DocFont,
        locator: &dyn FontLocator,
        diag: &mut Diagnostics,
    ) -> Option<&PdfFont> {
        // flag the document if the font being replaced ran into trouble
        if let Some(prev) = self.cur_font.take() {
            if self.fonts.get(&prev).is_some_and(PdfFont::has_warnings) {
                self.has_font_warnings = true;
            }
        }

        match font.font_type {
            FontType::Type3 => {
                diag.warn(
                    DiagnosticKind::FontReadUnsupported,
                    MODULE,
                    format!("Unsupported font type ({}) for ref {}", font.font_type, font.id),
                );
                return None;
            }
            FontType::Unknown => {
                diag.error(
                    DiagnosticKind::FontReadUnsupported,
                    MODULE,
                    format!("Unsupported font type ({}) for ref {}", font.font_type, font.id),
                );
                return None;
            }
            _ => {}
        }

        if !self.fonts.contains_key(&font.id) {
            let pdf_font = self.build_font(font, locator, diag)?;
            log::debug!(
                "loaded font {} '{}' ({}, family {})",
                font.id,
                pdf_font.name(),
                pdf_font.font_type(),
                pdf_font.family()
            );
            self.fonts.insert(font.id, pdf_font);
        }

        self.cur_font = Some(font.id);
        self.fonts.get(&font.id)
    }

    fn build_font(
        &self,
        font: &DocFont,
        locator: &dyn FontLocator,
        diag: &mut Diagnostics,
    ) -> Option<PdfFont> {
        let Some(location) = locator.locate(&font.id) else {
            diag.error(
                DiagnosticKind::FontRead,
                MODULE,
                format!("Unable to locate font for ref {}", font.id),
            );
            return None;
        };

        let font_name = Self::sanitize_font_name(&font.name);

        let source = match location {
            FontLocation::Embedded(data) => {
                let embedded_name = Self::sanitize_font_name(&font.embedded_name);
                let name = Self::select_font_name(font_name, embedded_name);
                if data.is_empty() {
                    diag.error(
                        DiagnosticKind::FontRead,
                        MODULE,
                        format!("Embedded font data missing for ref {}", font.id),
                    );
                    return None;
                }
                FontSource::from_buffer(font.id, font.font_type, name, data)
            }
            FontLocation::External(path) => {
                FontSource::from_file(font.id, font.font_type, font_name, &path)
            }
        };

        match source {
            Ok(source) => Some(PdfFont::new(source, font, self.maps)),
            Err(e) => {
                diag.error(
                    DiagnosticKind::FontRead,
                    MODULE,
                    format!(
                        "Couldn't create font entry for ref {} - type: {}: {}",
                        font.id, font.font_type, e
                    ),
                );
                None
            }
        }
    }

    /// Drop non-printable characters and turn whitespace into `-`.
    pub fn sanitize_font_name(name: &str) -> String {
        name.chars()
            .filter_map(|c| {
                if c.is_ascii_graphic() {
                    Some(c)
                } else if c.is_whitespace() {
                    Some('-')
                } else {
                    None
                }
            })
            .collect()
    }

    /// Choose between the font dictionary name and the name inside the
    /// embedded program. The embedded name wins when the dictionary name
    /// is empty, when only the embedded name carries a subset tag, or when
    /// the dictionary name is a truncated prefix of it.
    pub fn select_font_name(font_name: String, embedded_name: String) -> String {
        if font_name.is_empty() {
            return embedded_name;
        }
        if embedded_name.is_empty() || font_name == embedded_name {
            return font_name;
        }

        let subset_mark = |s: &str| s.find('+') == Some(6);
        let more_garbled = !subset_mark(&font_name) && subset_mark(&embedded_name);
        let truncated =
            embedded_name.starts_with(font_name.as_str()) && font_name.len() < embedded_name.len();

        if more_garbled || truncated {
            embedded_name
        } else {
            font_name
        }
    }

    /// Map a character code through the active font. `unicode` holds the
    /// value(s) the interpreter decoded for the code, if any.
    pub fn get_code_unicode(
        &mut self,
        code: u32,
        unicode: &[u32],
        diag: &mut Diagnostics,
    ) -> CodeRemap {
        let Some(font) = self.cur_font.and_then(|r| self.fonts.get_mut(&r)) else {
            return CodeRemap::Error(u32::from(' '));
        };

        if font.is_ignored() {
            return CodeRemap::Ignore;
        }

        match font.remap_glyph(code, unicode) {
            Some(u) => CodeRemap::Remapped(u),
            None => {
                diag.error(
                    DiagnosticKind::FontMapping,
                    MODULE,
                    format!(
                        "encountered font '{}' that may need mappings or be exported",
                        font.name()
                    ),
                );
                CodeRemap::Error(code)
            }
        }
    }

    pub fn current_font(&self) -> Option<&PdfFont> {
        self.cur_font.and_then(|r| self.fonts.get(&r))
    }

    pub fn font(&self, font_ref: &FontRef) -> Option<&PdfFont> {
        self.fonts.get(font_ref)
    }

    pub fn font_mut(&mut self, font_ref: &FontRef) -> Option<&mut PdfFont> {
        self.fonts.get_mut(font_ref)
    }

    pub fn maps(&self) -> &DocFontMaps {
        self.maps
    }

    /// Whether any font used so far ran into mapping trouble, including
    /// the one still active.
    pub fn has_font_warnings(&self) -> bool {
        self.has_font_warnings || self.current_font().is_some_and(PdfFont::has_warnings)
    }

    /// Number of cached fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
