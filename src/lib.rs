//! # pagemodel
//!
//! Page accumulation engine for PDF content extraction.
//!
//! A content interpreter walks a page's drawing operators and reports what
//! it sees: font changes, colors, characters, paths, images. This library
//! turns that stream into a compact page model: deduplicated resources,
//! assembled text spans, clip-aware graphics records and page bounds, ready
//! to be written as JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagemodel::{DocFontMaps, Options, ReplayDocument, Replayer};
//!
//! fn main() -> pagemodel::Result<()> {
//!     let options = Options::new("out.json").with_debug_info(true);
//!     let maps = DocFontMaps::new()?;
//!
//!     // Replay recorded interpreter events
//!     let doc = ReplayDocument::load("events.json")?;
//!     let stats = Replayer::new(&options, &maps).run(&doc, None)?;
//!     println!("{} spans on {} pages", stats.span_count, stats.page_count);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Text assembly**: characters are grouped into spans by font, color,
//!   clip, transform and spacing; rotated spans get corrected bounds
//! - **Redaction**: text hidden under opaque filled rectangles is dropped or
//!   trimmed
//! - **Resource caches**: colors, fonts, images and glyph outlines are
//!   stored once per page and referenced by index
//! - **Font resolution**: one cached font per document font, with a
//!   substitution table for names, styles and glyph codes
//! - **Diagnostics**: per-page errors and warnings, mirrored to `log`

pub mod diagnostics;
pub mod error;
pub mod font;
pub mod model;
pub mod options;
pub mod page;
pub mod render;
pub mod replay;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{Error, Result};
pub use font::{
    CodeRemap, DocFont, DocFontMaps, FontEngine, FontLocation, FontLocator, FontRef, FontType,
    PdfFont,
};
pub use model::{
    BoundingBox, Coord, FillRule, GfxCmd, ImageData, Link, PathType, RgbColor, StreamProps,
    TextMetrics, TextSpan, Transform,
};
pub use options::Options;
pub use page::{PageFont, PageModel, PathGeometry, PathPoint, Subpath};
pub use render::{ConversionStats, JsonFormat, RenderResult};
pub use replay::{PageEvent, ReplayDocument, ReplayFontLocator, Replayer};

use std::path::Path;

/// Load the font substitution table named in `options`, or an empty one.
///
/// # Errors
///
/// Returns [`Error::FontEngineInit`] if the table can't be read or parsed.
pub fn load_font_maps(options: &Options) -> Result<DocFontMaps> {
    match &options.font_map_file {
        Some(path) => DocFontMaps::load(path),
        None => DocFontMaps::new(),
    }
}

/// Replay a recorded event file and write the page models to the output
/// file named in `options`.
///
/// Relative font paths in the recording are resolved against the
/// recording's directory.
///
/// # Example
///
/// ```no_run
/// use pagemodel::{replay_file, Options};
///
/// let options = Options::new("out.json").with_page(0);
/// let stats = replay_file("events.json", &options).unwrap();
/// assert!(stats.is_ok());
/// ```
pub fn replay_file<P: AsRef<Path>>(path: P, options: &Options) -> Result<ConversionStats> {
    let path = path.as_ref();
    let maps = load_font_maps(options)?;
    let doc = ReplayDocument::load(path)?;
    Replayer::new(options, &maps).run(&doc, path.parent())
}

/// Replay a recorded event file and return the rendered JSON without
/// writing it.
pub fn render_file<P: AsRef<Path>>(path: P, options: &Options) -> Result<RenderResult> {
    let path = path.as_ref();
    let maps = load_font_maps(options)?;
    let doc = ReplayDocument::load(path)?;
    Replayer::new(options, &maps).render(&doc, path.parent())
}
