//! JSON rendering for finalized pages.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Bounds, DocPath, GfxCmd, ImageData, ImagePlacement, Link, RgbColor, TextSpan};
use crate::page::{PageFont, PageModel};

/// Version of the output layout.
pub const DATA_FORMAT_VERSION: u32 = 1;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct FontOutput<'p> {
    family: &'p str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    italic: bool,
    #[serde(rename = "equivalent_doc_fonts", skip_serializing_if = "Option::is_none")]
    equivalent: Option<&'p [String]>,
}

impl<'p> FontOutput<'p> {
    fn new(font: &'p PageFont, debug: bool) -> Self {
        Self {
            family: font.family(),
            bold: font.is_bold(),
            italic: font.is_italic(),
            equivalent: debug.then(|| font.equivalent_names()),
        }
    }
}

/// Images keyed by resource id, in the order they were cached.
struct ImageMap<'p>(&'p [ImageData]);

impl Serialize for ImageMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for image in self.0 {
            map.serialize_entry(&image.id.to_string(), image)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Resources<'p> {
    colors: &'p [RgbColor],
    fonts: Vec<FontOutput<'p>>,
    images: ImageMap<'p>,
    glyphs: &'p [crate::model::GlyphOutline],
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum GraphicOutput<'p> {
    Path(&'p DocPath),
    Image(&'p ImagePlacement),
}

impl<'p> From<&'p GfxCmd> for GraphicOutput<'p> {
    fn from(cmd: &'p GfxCmd) -> Self {
        match cmd {
            GfxCmd::Path(p) => GraphicOutput::Path(p),
            GfxCmd::Image(i) => GraphicOutput::Image(i),
        }
    }
}

#[derive(Serialize)]
struct PageOutput<'p> {
    data_format_version: u32,
    pgnum: u32,
    is_ok: bool,
    width: f64,
    height: f64,
    rotation: i32,
    has_invisible_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_bounds: Option<&'p BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gfx_bounds: Option<&'p BoundingBox>,
    bounds: Bounds,
    resources: Resources<'p>,
    text_spans: &'p [TextSpan],
    graphics: Vec<GraphicOutput<'p>>,
    links: &'p [Link],
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'p Diagnostics>,
}

#[derive(Serialize)]
struct LinkPageOutput<'p> {
    data_format_version: u32,
    pgnum: u32,
    width: f64,
    height: f64,
    links: &'p [Link],
}

impl<'p> PageOutput<'p> {
    fn new(page: &'p PageModel<'_>) -> Self {
        let debug = page.options().include_debug_info;

        // page bounds only cover what was actually stored
        let mut bounds = Bounds::new();
        let text_bounds = if page.text_spans().is_empty() {
            None
        } else {
            page.text_bounds().bounding_box()
        };
        let gfx_bounds = if page.graphics().is_empty() {
            None
        } else {
            page.gfx_bounds().bounding_box()
        };
        for b in text_bounds.iter().chain(gfx_bounds.iter()) {
            bounds.expand(b);
        }

        let graphics = page
            .clip_paths()
            .iter()
            .map(GraphicOutput::Path)
            .chain(page.graphics().iter().map(GraphicOutput::from))
            .collect();

        let diagnostics = page.diagnostics();

        Self {
            data_format_version: DATA_FORMAT_VERSION,
            pgnum: page.number(),
            is_ok: page.is_ok(),
            width: page.width(),
            height: page.height(),
            rotation: page.rotation(),
            has_invisible_text: page.has_invisible_text(),
            text_bounds,
            gfx_bounds,
            bounds,
            resources: Resources {
                colors: page.colors(),
                fonts: page.fonts().iter().map(|f| FontOutput::new(f, debug)).collect(),
                images: ImageMap(page.images()),
                glyphs: page.glyphs(),
            },
            text_spans: page.text_spans(),
            graphics,
            links: page.links(),
            errors: diagnostics.errors_or_warnings_reported().then_some(diagnostics),
        }
    }
}

/// Convert a finalized page to a JSON value.
pub fn page_to_value(page: &PageModel<'_>) -> Result<Value> {
    let value = if page.options().link_output_only {
        serde_json::to_value(LinkPageOutput {
            data_format_version: DATA_FORMAT_VERSION,
            pgnum: page.number(),
            width: page.width(),
            height: page.height(),
            links: page.links(),
        })
    } else {
        serde_json::to_value(PageOutput::new(page))
    };

    value.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert a finalized page to JSON.
pub fn to_json(page: &PageModel<'_>, format: JsonFormat) -> Result<String> {
    let value = page_to_value(page)?;
    value_to_string(&value, format)
}

/// Render any JSON value in the given format.
pub fn value_to_string(value: &Value, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
