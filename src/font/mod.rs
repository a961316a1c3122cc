//! Font resolution.
//!
//! The content interpreter identifies fonts by an opaque [`FontRef`] and
//! reports their metadata as a [`DocFont`]. The [`FontEngine`] turns those
//! into cached [`PdfFont`]s: it locates the font program through a
//! [`FontLocator`], validates it, settles on a clean name, and applies any
//! overrides from the [`DocFontMaps`] substitution table. It also maps
//! character codes to Unicode for the active font.

mod doc_font;
mod engine;
mod maps;
mod pdf_font;
mod source;

pub use doc_font::{DocFont, FontRef, FontType, StdEncoding};
pub use engine::{CodeRemap, FontEngine};
pub use maps::{DocFontMaps, FontMapEntry};
pub use pdf_font::PdfFont;
pub use source::{FontLocation, FontLocator, FontSource};
