//! Characters and text spans.

use serde::{Serialize, Serializer};

use super::geometry::{BoundingBox, Coord, Transform};
use super::graphics::PaintAttribs;

/// A glyph may start this far (in multiples of the font size) from where
/// the previous glyph's advance ended and still continue the same span.
const SPAN_JOIN_TOLERANCE: f64 = 0.5;

/// Linear parts of two transforms closer than this count as the same
/// orientation.
const CTM_EPSILON: f64 = 1e-6;

/// Text state carried into every character.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextAttribs {
    /// Index into the page font list; `None` until a font is committed.
    pub font_idx: Option<usize>,
    pub font_size: f64,
    pub invisible: bool,
    /// Link annotation enclosing the character, if any.
    pub link_idx: Option<usize>,
}

impl TextAttribs {
    pub fn update_font(&mut self, font_idx: Option<usize>, font_size: f64) {
        self.font_idx = font_idx;
        self.font_size = font_size;
    }

    pub fn are_valid(&self) -> bool {
        self.font_idx.is_some()
    }
}

/// Vertical font metrics reported by the interpreter for a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, serde::Deserialize)]
pub struct TextMetrics {
    pub ascent: f64,
    pub descent: f64,
}

/// A single drawn glyph. Immutable once built; owned by the span that
/// accepted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub bbox: BoundingBox,
    /// Glyph origin as reported by the interpreter.
    pub origin: Coord,
    /// Displacement to the next glyph origin.
    pub advance: Coord,
    pub ctm: Transform,
    pub unicode: u32,
    pub attribs: TextAttribs,
    pub fill: PaintAttribs,
    pub metrics: TextMetrics,
    pub glyph_idx: Option<usize>,
    pub clip_idx: Option<usize>,
}

impl Character {
    pub fn is_space(&self) -> bool {
        char::from_u32(self.unicode).is_some_and(char::is_whitespace)
    }

    pub fn next_origin(&self) -> Coord {
        Coord::new(self.origin.x + self.advance.x, self.origin.y + self.advance.y)
    }

    pub fn as_char(&self) -> char {
        char::from_u32(self.unicode).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

fn same_orientation(t1: &Transform, t2: &Transform) -> bool {
    (t1.a - t2.a).abs() < CTM_EPSILON
        && (t1.b - t2.b).abs() < CTM_EPSILON
        && (t1.c - t2.c).abs() < CTM_EPSILON
        && (t1.d - t2.d).abs() < CTM_EPSILON
}

/// A run of characters sharing attributes and laid out contiguously.
#[derive(Debug, Clone, Default)]
pub struct TextSpan {
    chars: Vec<Character>,
    bbox: Option<BoundingBox>,
}

impl TextSpan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, c: Character) {
        match self.bbox.as_mut() {
            Some(b) => b.expand(&c.bbox),
            None => self.bbox = Some(c.bbox),
        }
        self.chars.push(c);
    }

    /// Whether `c` can be appended to this span: same text and paint
    /// attributes, same orientation, and it starts roughly where the last
    /// glyph's advance ended.
    pub fn spans(&self, c: &Character) -> bool {
        let Some(last) = self.chars.last() else {
            return true;
        };

        if last.attribs != c.attribs
            || last.fill != c.fill
            || last.clip_idx != c.clip_idx
            || !same_orientation(&last.ctm, &c.ctm)
        {
            return false;
        }

        let gap = last.next_origin().distance(&c.origin);
        gap <= c.attribs.font_size.abs() * SPAN_JOIN_TOLERANCE
    }

    /// Drop trailing whitespace and recompute the bounds.
    pub fn finalize(&mut self) {
        while self.chars.last().is_some_and(Character::is_space) {
            self.chars.pop();
        }
        self.recompute_bbox();
    }

    /// Remove the characters whose horizontal center falls inside the
    /// region.
    pub fn whiteout(&mut self, region: &BoundingBox) {
        self.chars.retain(|c| {
            let center = c.bbox.center();
            let covered = center.x >= region.x_min
                && center.x <= region.x_max
                && c.bbox.intersects(region);
            !covered
        });
        self.recompute_bbox();
    }

    fn recompute_bbox(&mut self) {
        let mut chars = self.chars.iter();
        self.bbox = chars.next().map(|first| {
            chars.fold(first.bbox, |mut acc, c| {
                acc.expand(&c.bbox);
                acc
            })
        });
    }

    pub fn length(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[Character] {
        &self.chars
    }

    pub fn text(&self) -> String {
        self.chars.iter().map(Character::as_char).collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox.unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Replace the span bounds; used once rotated spans are corrected.
    pub fn set_bounding_box(&mut self, bbox: BoundingBox) {
        self.bbox = Some(bbox);
    }

    fn first(&self) -> Option<&Character> {
        self.chars.first()
    }

    pub fn ctm(&self) -> Transform {
        self.first().map(|c| c.ctm).unwrap_or_default()
    }

    pub fn font_size(&self) -> f64 {
        self.first().map(|c| c.attribs.font_size).unwrap_or(0.0)
    }

    pub fn font_idx(&self) -> Option<usize> {
        self.first().and_then(|c| c.attribs.font_idx)
    }

    pub fn clip_id(&self) -> Option<usize> {
        self.first().and_then(|c| c.clip_idx)
    }

    pub fn link_idx(&self) -> Option<usize> {
        self.first().and_then(|c| c.attribs.link_idx)
    }
}

#[derive(Serialize)]
struct SpanOutput {
    text: String,
    bbox: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    font_idx: Option<usize>,
    font_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_idx: Option<usize>,
    opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ctm: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_idx: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    invisible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    glyphs: Vec<GlyphRef>,
    x_positions: Vec<f64>,
}

#[derive(Serialize)]
struct GlyphRef {
    pos: usize,
    glyph_idx: usize,
}

impl Serialize for TextSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ctm = self.ctm();
        let fill = self.first().map(|c| c.fill).unwrap_or_default();
        let glyphs: Vec<GlyphRef> = self
            .chars
            .iter()
            .enumerate()
            .filter_map(|(pos, c)| c.glyph_idx.map(|glyph_idx| GlyphRef { pos, glyph_idx }))
            .collect();

        SpanOutput {
            text: self.text(),
            bbox: self.bounding_box(),
            font_idx: self.font_idx(),
            font_size: self.font_size(),
            color_idx: fill.color_idx,
            opacity: fill.opacity,
            ctm: ctm.is_rotated().then_some(ctm),
            clip_id: self.clip_id(),
            link_idx: self.link_idx(),
            invisible: self.first().is_some_and(|c| c.attribs.invisible),
            glyphs,
            x_positions: self.chars.iter().map(|c| c.origin.x).collect(),
        }
        .serialize(serializer)
    }
}
