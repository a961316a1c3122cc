//! Replay of recorded drawing events.
//!
//! The content interpreter that walks PDF content streams lives outside
//! this crate. What it reports can be recorded as a JSON document and fed
//! back through [`Replayer`], which drives a [`FontEngine`] and one
//! [`PageModel`] per page exactly as a live interpreter would.
//!
//! ```json
//! {
//!   "fonts": [
//!     { "id": {"num": 12}, "name": "ABCDEF+Helvetica", "font_type": "type1",
//!       "data": "JSFQUy1BZG9iZUZvbnQ=" }
//!   ],
//!   "pages": [
//!     { "number": 0, "width": 612, "height": 792,
//!       "events": [
//!         { "op": "set_font", "font": {"num": 12}, "size": 12 },
//!         { "op": "fill_color", "rgb": [0, 0, 0] },
//!         { "op": "char", "x": 72, "y": 100, "w": 7, "h": 0, "code": 65 },
//!         { "op": "end_text" }
//!       ] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::font::{CodeRemap, DocFont, DocFontMaps, FontEngine, FontLocation, FontLocator, FontRef};
use crate::model::{
    BoundingBox, FillRule, GlyphOutline, Link, PathType, StreamProps, TextMetrics, Transform,
};
use crate::options::Options;
use crate::page::{PageModel, PathGeometry};
use crate::render::{self, ConversionStats, RenderResult, DATA_FORMAT_VERSION};

/// A recorded document: the fonts it uses and its pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayDocument {
    #[serde(default)]
    pub fonts: Vec<ReplayFont>,
    #[serde(default)]
    pub pages: Vec<ReplayPage>,
}

impl ReplayDocument {
    /// Parse a recorded document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a recorded document from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn page(&self, number: u32) -> Option<&ReplayPage> {
        self.pages.iter().find(|p| p.number == number)
    }
}

/// Font metadata plus where its program can be found: base64 bytes for
/// embedded fonts, a file path for external ones.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFont {
    #[serde(flatten)]
    pub font: DocFont,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayPage {
    /// 0-based page index
    pub number: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: i32,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub events: Vec<PageEvent>,
}

/// A drawn character as the interpreter reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct CharEvent {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub ctm: Transform,
    /// Character code in the font's encoding
    pub code: u32,
    /// Unicode value(s) the interpreter decoded for `code`
    #[serde(default)]
    pub unicode: Vec<u32>,
    #[serde(default)]
    pub glyph_idx: Option<usize>,
    #[serde(default)]
    pub invisible: bool,
    #[serde(default)]
    pub metrics: TextMetrics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageEvent {
    /// Missing for inline images
    #[serde(default)]
    pub res_id: Option<i64>,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub props: StreamProps,
    /// Base64 image bytes
    pub data: String,
}

/// One recorded interpreter callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PageEvent {
    SetFont {
        font: FontRef,
        size: f64,
    },
    FillColor {
        rgb: [f64; 3],
    },
    StrokeColor {
        rgb: [f64; 3],
    },
    FillOpacity {
        value: f64,
    },
    StrokeOpacity {
        value: f64,
    },
    LineWidth {
        value: f64,
    },
    LineDash {
        #[serde(default)]
        pattern: Vec<f64>,
        #[serde(default)]
        phase: f64,
    },
    Ctm {
        matrix: Transform,
    },
    Save,
    Restore,
    Char(CharEvent),
    Path {
        geometry: PathGeometry,
        #[serde(rename = "type")]
        path_type: PathType,
        #[serde(default)]
        fill_rule: FillRule,
    },
    Image(ImageEvent),
    Glyph(GlyphOutline),
    Link(Link),
    EndText,
}

/// [`FontLocator`] over the fonts recorded in a [`ReplayDocument`].
#[derive(Debug, Default)]
pub struct ReplayFontLocator {
    locations: HashMap<FontRef, FontLocation>,
}

impl ReplayFontLocator {
    /// Decode embedded font data. Relative external paths are resolved
    /// against `base_dir` when given.
    pub fn new(fonts: &[ReplayFont], base_dir: Option<&Path>) -> Result<Self> {
        let mut locations = HashMap::new();

        for f in fonts {
            let location = match (&f.data, &f.path) {
                (Some(data), _) => FontLocation::Embedded(STANDARD.decode(data.trim())?),
                (None, Some(path)) => {
                    let path = match base_dir {
                        Some(dir) if path.is_relative() => dir.join(path),
                        _ => path.clone(),
                    };
                    FontLocation::External(path)
                }
                (None, None) => continue,
            };
            locations.insert(f.font.id, location);
        }

        Ok(Self { locations })
    }
}

impl FontLocator for ReplayFontLocator {
    fn locate(&self, font: &FontRef) -> Option<FontLocation> {
        self.locations.get(font).cloned()
    }
}

/// Document-level output record.
#[derive(Debug, Serialize)]
struct DocumentOutput {
    data_format_version: u32,
    page_count: usize,
    has_font_warnings: bool,
    pages: Vec<serde_json::Value>,
}

/// Drives the page model over recorded documents.
pub struct Replayer<'a> {
    options: &'a Options,
    maps: &'a DocFontMaps,
}

impl<'a> Replayer<'a> {
    pub fn new(options: &'a Options, maps: &'a DocFontMaps) -> Self {
        Self { options, maps }
    }

    /// Replay the selected pages and render them into one JSON document.
    /// Each page is finalized and serialized before the next one starts.
    pub fn render(&self, doc: &ReplayDocument, base_dir: Option<&Path>) -> Result<RenderResult> {
        let pages = self.selected_pages(doc)?;
        let locator = ReplayFontLocator::new(&doc.fonts, base_dir)?;
        let fonts: HashMap<FontRef, &DocFont> = doc.fonts.iter().map(|f| (f.font.id, &f.font)).collect();

        let mut engine = FontEngine::new(self.maps);
        let mut stats = ConversionStats::new();
        let mut output = Vec::with_capacity(pages.len());

        for page in pages {
            let model = self.replay_page(page, &fonts, &mut engine, &locator)?;
            stats.add_page(&model);
            output.push(render::page_to_value(&model)?);
            log::debug!("page {} done: {} spans", page.number, model.text_spans().len());
        }

        let document = DocumentOutput {
            data_format_version: DATA_FORMAT_VERSION,
            page_count: doc.pages.len(),
            has_font_warnings: engine.has_font_warnings(),
            pages: output,
        };
        let value = serde_json::to_value(document)?;
        let content = render::value_to_string(&value, self.options.json_format)?;

        Ok(RenderResult::new(content, stats))
    }

    /// Render and write to the configured output file. An existing file is
    /// only replaced when output is forced.
    pub fn run(&self, doc: &ReplayDocument, base_dir: Option<&Path>) -> Result<ConversionStats> {
        let out = &self.options.output_file;
        if out.exists() && !self.options.force_output {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{}' exists; use force to overwrite", out.display()),
            )));
        }

        let result = self.render(doc, base_dir)?;
        fs::write(out, result.content)?;
        Ok(result.stats)
    }

    fn selected_pages<'d>(&self, doc: &'d ReplayDocument) -> Result<Vec<&'d ReplayPage>> {
        let count = doc.pages.len() as u32;
        if let Some(n) = self.options.page_number {
            if n >= count || doc.page(n).is_none() {
                return Err(Error::PageOutOfRange(n, count));
            }
        }

        Ok(doc
            .pages
            .iter()
            .filter(|p| self.options.wants_page(p.number))
            .collect())
    }

    /// Feed one page's events through a fresh page model and finalize it.
    pub fn replay_page(
        &self,
        page: &ReplayPage,
        fonts: &HashMap<FontRef, &DocFont>,
        engine: &mut FontEngine<'_>,
        locator: &dyn FontLocator,
    ) -> Result<PageModel<'a>> {
        let mut model = PageModel::new(self.options, page.number, page.width, page.height, page.rotation);
        model.set_link_annotations(page.links.clone());

        for event in &page.events {
            apply_event(&mut model, event, fonts, engine, locator)?;
        }

        model.finalize(engine);
        Ok(model)
    }
}

fn apply_event(
    page: &mut PageModel<'_>,
    event: &PageEvent,
    fonts: &HashMap<FontRef, &DocFont>,
    engine: &mut FontEngine<'_>,
    locator: &dyn FontLocator,
) -> Result<()> {
    match event {
        PageEvent::SetFont { font, size } => {
            let doc_font = fonts
                .get(font)
                .ok_or_else(|| Error::InvalidEvent(format!("font {} is not declared", font)))?;
            // a font that fails to load leaves the text state as it was
            if let Some(f) = engine.load_font(doc_font, locator, page.diagnostics_mut()) {
                page.update_font(f, *size);
            }
        }
        PageEvent::FillColor { rgb: [r, g, b] } => page.update_fill_color(*r, *g, *b),
        PageEvent::StrokeColor { rgb: [r, g, b] } => page.update_stroke_color(*r, *g, *b),
        PageEvent::FillOpacity { value } => page.update_fill_opacity(*value),
        PageEvent::StrokeOpacity { value } => page.update_stroke_opacity(*value),
        PageEvent::LineWidth { value } => page.update_line_width(*value),
        PageEvent::LineDash { pattern, phase } => page.update_line_dash(pattern, *phase),
        PageEvent::Ctm { matrix } => page.update_ctm(*matrix),
        PageEvent::Save => page.push_gfx_state(),
        PageEvent::Restore => page.pop_gfx_state(),
        PageEvent::Char(c) => {
            let unicode = match engine.get_code_unicode(c.code, &c.unicode, page.diagnostics_mut()) {
                CodeRemap::Remapped(u) | CodeRemap::Error(u) => u,
                CodeRemap::Ignore => return Ok(()),
            };
            page.new_character(
                c.x,
                c.y,
                c.w,
                c.h,
                c.ctm,
                c.metrics,
                unicode,
                c.glyph_idx,
                c.invisible,
            );
        }
        PageEvent::Path {
            geometry,
            path_type,
            fill_rule,
        } => page.new_path(geometry, *path_type, *fill_rule),
        PageEvent::Image(img) => {
            let data = STANDARD.decode(img.data.trim())?;
            page.draw_image(img.res_id, img.bbox, img.props.clone(), &data);
        }
        PageEvent::Glyph(outline) => {
            page.register_glyph(outline.clone());
        }
        PageEvent::Link(link) => page.add_link(link.clone()),
        PageEvent::EndText => page.mark_end_of_text(),
    }
    Ok(())
}
