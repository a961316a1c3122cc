//! Page accumulation.
//!
//! A [`PageModel`] is fed the drawing events of one page by the content
//! interpreter: state updates (fonts, colors, transforms, save/restore)
//! followed by content (characters, paths, images). It assembles
//! characters into text spans, keeps deduplicated resource lists (colors,
//! fonts, images, glyph outlines) addressed by index, tracks clip regions,
//! and removes text hidden under opaque fills. Once the page is done,
//! [`PageModel::finalize`] flushes pending state and the model is handed
//! to the renderer.
//!
//! Problems with single items are reported to the page's
//! [`Diagnostics`] and the item is dropped.

mod graphics;
mod state;
mod text;

pub use graphics::{PathGeometry, PathPoint, Subpath};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::font::{FontEngine, FontRef, PdfFont};
use crate::model::{
    BoundingBox, Bounds, DocPath, GfxAttribs, GfxCmd, GlyphOutline, ImageData, Link, RgbColor,
    TextAttribs, TextSpan, Transform,
};
use crate::options::Options;

use state::{GfxState, TextState};

const MODULE: &str = "page";

/// A page font resource: one or more document fonts that look the same
/// (family, bold, italic) collapsed into one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFont {
    family: String,
    bold: bool,
    italic: bool,
    members: Vec<FontRef>,
    names: Vec<String>,
}

impl PageFont {
    pub fn new(font: &PdfFont) -> Self {
        Self {
            family: font.family().to_string(),
            bold: font.is_bold(),
            italic: font.is_italic(),
            members: vec![font.font_ref()],
            names: vec![font.name().to_string()],
        }
    }

    /// Same family and style. An equivalent font joins the member list.
    pub fn is_equivalent_to(&mut self, font: &PdfFont) -> bool {
        if self.bold != font.is_bold() || self.italic != font.is_italic() || self.family != font.family() {
            return false;
        }
        if !self.members.contains(&font.font_ref()) {
            self.members.push(font.font_ref());
            self.names.push(font.name().to_string());
        }
        true
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

    /// Document fonts collapsed into this entry.
    pub fn members(&self) -> &[FontRef] {
        &self.members
    }

    /// Names of the member fonts, in the order they were seen.
    pub fn equivalent_names(&self) -> &[String] {
        &self.names
    }

    fn has_member(&self, font_ref: FontRef) -> bool {
        self.members.contains(&font_ref)
    }
}

/// Everything drawn on one page.
#[derive(Debug)]
pub struct PageModel<'a> {
    options: &'a Options,
    number: u32,
    width: f64,
    height: f64,
    rotation: i32,

    colors: Vec<RgbColor>,
    fonts: Vec<PageFont>,
    images: Vec<ImageData>,
    glyphs: Vec<GlyphOutline>,
    // font seen in a state update but not used by any character yet
    pending_font: Option<PageFont>,
    next_inline_id: i64,

    text: TextState,
    gfx: GfxState,

    text_spans: Vec<TextSpan>,
    clip_paths: Vec<DocPath>,
    graphics: Vec<GfxCmd>,
    links: Vec<Link>,

    has_invisible_text: bool,
    diagnostics: Diagnostics,
}

impl<'a> PageModel<'a> {
    pub fn new(options: &'a Options, number: u32, width: f64, height: f64, rotation: i32) -> Self {
        Self {
            options,
            number,
            width,
            height,
            rotation,
            colors: Vec::new(),
            fonts: Vec::new(),
            images: Vec::new(),
            glyphs: Vec::new(),
            pending_font: None,
            next_inline_id: -1,
            text: TextState::default(),
            gfx: GfxState::default(),
            text_spans: Vec::new(),
            clip_paths: Vec::new(),
            graphics: Vec::new(),
            links: Vec::new(),
            has_invisible_text: false,
            diagnostics: Diagnostics::new(),
        }
    }

    // ------------------------------------------------------------------
    // resources

    pub fn get_color_index(&self, r: f64, g: f64, b: f64) -> Option<usize> {
        self.colors.iter().position(|c| c.equals(r, g, b))
    }

    /// Index of the color, registering it first if needed.
    pub fn register_color(&mut self, r: f64, g: f64, b: f64) -> usize {
        match self.get_color_index(r, g, b) {
            Some(idx) => idx,
            None => {
                self.colors.push(RgbColor::new(r, g, b));
                self.colors.len() - 1
            }
        }
    }

    fn get_font_index(&mut self, font: &PdfFont) -> Option<usize> {
        self.fonts.iter_mut().position(|f| f.is_equivalent_to(font))
    }

    /// Make `font` the current text font. A font not yet in the page font
    /// list is staged and only added once a character uses it; staging a
    /// different font discards the previously staged one.
    pub fn update_font(&mut self, font: &PdfFont, size: f64) {
        let font_idx = self.get_font_index(font);

        let staged = self
            .pending_font
            .as_ref()
            .is_some_and(|p| p.has_member(font.font_ref()));

        if font_idx.is_none() && !staged {
            if let Some(prev) = self.pending_font.replace(PageFont::new(font)) {
                log::debug!(
                    "page {}: discarding unused pending font '{}'",
                    self.number,
                    prev.equivalent_names().join(", ")
                );
            }
        }

        self.text.attribs.update_font(font_idx, size);
    }

    /// Index of an identical glyph outline, registering it first if needed.
    pub fn register_glyph(&mut self, glyph: GlyphOutline) -> usize {
        match self.glyphs.iter().position(|g| *g == glyph) {
            Some(idx) => idx,
            None => {
                self.glyphs.push(glyph);
                self.glyphs.len() - 1
            }
        }
    }

    // ------------------------------------------------------------------
    // graphics state

    pub fn update_ctm(&mut self, ctm: Transform) {
        self.gfx.attribs.update_ctm(ctm);
    }

    pub fn push_gfx_state(&mut self) {
        self.gfx.push();
    }

    pub fn pop_gfx_state(&mut self) {
        self.gfx.pop();
    }

    pub fn update_fill_color(&mut self, r: f64, g: f64, b: f64) {
        let idx = self.register_color(r, g, b);
        self.gfx.attribs.fill.color_idx = Some(idx);
    }

    pub fn update_stroke_color(&mut self, r: f64, g: f64, b: f64) {
        let idx = self.register_color(r, g, b);
        self.gfx.attribs.stroke.color_idx = Some(idx);
    }

    pub fn update_fill_opacity(&mut self, opacity: f64) {
        self.gfx.attribs.fill.opacity = opacity;
    }

    pub fn update_stroke_opacity(&mut self, opacity: f64) {
        self.gfx.attribs.stroke.opacity = opacity;
    }

    pub fn update_line_width(&mut self, width: f64) {
        self.gfx.attribs.line_width = width;
    }

    pub fn update_line_dash(&mut self, pattern: &[f64], phase: f64) {
        self.gfx.attribs.update_line_dash(phase, pattern);
    }

    // ------------------------------------------------------------------
    // links and page geometry

    pub fn set_link_annotations(&mut self, links: Vec<Link>) {
        self.links = links;
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// First link whose area contains the center of `bbox`.
    pub fn inside_link(&self, bbox: &BoundingBox) -> Option<usize> {
        let center = bbox.center();
        self.links.iter().position(|l| l.encloses(&center))
    }

    pub fn page_bbox(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Whether any part of `bbox` is on the page.
    pub fn inside_page(&self, bbox: &BoundingBox) -> bool {
        self.page_bbox().intersects(bbox)
    }

    // ------------------------------------------------------------------
    // lifecycle

    /// Flush the open span and, in debug mode, report font mapping issues
    /// for the fonts used on this page.
    pub fn finalize(&mut self, engine: &mut FontEngine<'_>) {
        self.mark_end_of_text();

        if !self.options.include_debug_info {
            return;
        }

        for page_font in &self.fonts {
            for font_ref in page_font.members() {
                let Some(font) = engine.font_mut(font_ref) else {
                    continue;
                };

                if font.is_unknown() {
                    let mut msg = format!("Failed to map font {} ({}", font.name(), font.font_type());
                    if let Some(enc) = font.encoding() {
                        msg.push_str(", ");
                        msg.push_str(enc.name());
                    }
                    msg.push(')');
                    self.diagnostics.error(DiagnosticKind::FontMapping, MODULE, msg);
                }

                if font.has_unmapped_codes() && (!font.has_std_encoding() || !font.has_to_unicode()) {
                    self.diagnostics.warn(
                        DiagnosticKind::FontMapping,
                        MODULE,
                        format!(
                            "Font '{}' has custom encoding w/ unmapped codes: {}",
                            font.name(),
                            font.unmapped_codes_str()
                        ),
                    );
                }

                // next page reports only its own codes
                font.clear_unmapped_codes();
            }
        }
    }

    // ------------------------------------------------------------------
    // accessors

    pub fn options(&self) -> &Options {
        self.options
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn has_invisible_text(&self) -> bool {
        self.has_invisible_text
    }

    /// No errors were reported for this page.
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.errors_reported()
    }

    pub fn colors(&self) -> &[RgbColor] {
        &self.colors
    }

    pub fn fonts(&self) -> &[PageFont] {
        &self.fonts
    }

    pub fn pending_font(&self) -> Option<&PageFont> {
        self.pending_font.as_ref()
    }

    pub fn images(&self) -> &[ImageData] {
        &self.images
    }

    pub fn glyphs(&self) -> &[GlyphOutline] {
        &self.glyphs
    }

    pub fn text_spans(&self) -> &[TextSpan] {
        &self.text_spans
    }

    /// The span still being assembled, if any.
    pub fn open_span(&self) -> Option<&TextSpan> {
        self.text.span.as_ref()
    }

    pub fn clip_paths(&self) -> &[DocPath] {
        &self.clip_paths
    }

    pub fn graphics(&self) -> &[GfxCmd] {
        &self.graphics
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn text_attribs(&self) -> &TextAttribs {
        &self.text.attribs
    }

    pub fn gfx_attribs(&self) -> &GfxAttribs {
        &self.gfx.attribs
    }

    /// Active clip path id.
    pub fn clip_idx(&self) -> Option<usize> {
        self.gfx.clip_path()
    }

    pub fn text_bounds(&self) -> &Bounds {
        &self.text.bounds
    }

    pub fn gfx_bounds(&self) -> &Bounds {
        &self.gfx.bounds
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}
