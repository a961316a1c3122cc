//! Graphics records: paint attributes, paths, clip paths, image placements
//! and glyph outlines.

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Coord, Transform};

/// Color and opacity used for either filling or stroking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaintAttribs {
    /// Index into the page color list.
    #[serde(rename = "color_idx", skip_serializing_if = "Option::is_none")]
    pub color_idx: Option<usize>,
    pub opacity: f64,
}

impl Default for PaintAttribs {
    fn default() -> Self {
        Self {
            color_idx: None,
            opacity: 1.0,
        }
    }
}

/// Graphics state attributes. Copied onto every path at creation time and
/// saved/restored as a whole by the state stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GfxAttribs {
    pub fill: PaintAttribs,
    pub stroke: PaintAttribs,
    pub line_width: f64,
    /// Dash phase at the head, followed by the dash pattern. Empty for
    /// solid lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_dash: Vec<f64>,
    #[serde(skip)]
    pub ctm: Transform,
    /// Active clip path, if any.
    #[serde(skip)]
    pub clip_idx: Option<usize>,
}

impl Default for GfxAttribs {
    fn default() -> Self {
        Self {
            fill: PaintAttribs::default(),
            stroke: PaintAttribs::default(),
            line_width: 1.0,
            line_dash: Vec::new(),
            ctm: Transform::identity(),
            clip_idx: None,
        }
    }
}

impl GfxAttribs {
    pub fn update_ctm(&mut self, ctm: Transform) {
        self.ctm = ctm;
    }

    pub fn update_line_dash(&mut self, phase: f64, pattern: &[f64]) {
        self.line_dash.clear();
        if pattern.is_empty() {
            return;
        }
        self.line_dash.reserve(pattern.len() + 1);
        self.line_dash.push(phase);
        self.line_dash.extend_from_slice(pattern);
    }
}

/// What a path is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    Fill,
    Stroke,
    Clip,
}

/// Rule used to decide the inside of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    #[default]
    NonZeroWinding,
    EvenOdd,
}

/// One drawing command of a path, in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo(Coord),
    LineTo(Coord),
    CurveTo(Coord, Coord, Coord),
    Close,
}

/// A path drawn on the page (fill, stroke) or a clip region.
#[derive(Debug, Clone, Serialize)]
pub struct DocPath {
    #[serde(rename = "type")]
    path_type: PathType,
    fill_rule: FillRule,
    #[serde(flatten)]
    attribs: GfxAttribs,
    commands: Vec<PathCommand>,
    bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_idx: Option<usize>,
}

impl DocPath {
    pub fn new(path_type: PathType, attribs: GfxAttribs, fill_rule: FillRule) -> Self {
        Self {
            path_type,
            fill_rule,
            attribs,
            commands: Vec::new(),
            bbox: None,
            clip_id: None,
            link_idx: None,
        }
    }

    fn track(&mut self, c: Coord) {
        let pt = BoundingBox::from_corners(c, c);
        match self.bbox.as_mut() {
            Some(b) => b.expand(&pt),
            None => self.bbox = Some(pt),
        }
    }

    pub fn move_to(&mut self, c: Coord) {
        self.track(c);
        self.commands.push(PathCommand::MoveTo(c));
    }

    pub fn line_to(&mut self, c: Coord) {
        self.track(c);
        self.commands.push(PathCommand::LineTo(c));
    }

    /// Control points count towards the bounds; this over-approximates
    /// curves slightly.
    pub fn curve_to(&mut self, c1: Coord, c2: Coord, c3: Coord) {
        self.track(c1);
        self.track(c2);
        self.track(c3);
        self.commands.push(PathCommand::CurveTo(c1, c2, c3));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn path_type(&self) -> PathType {
        self.path_type
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn attribs(&self) -> &GfxAttribs {
        &self.attribs
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Bounds of all points in the path; a zero box for empty paths.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox.unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Truncate the stored bounds to a clip region. The geometry itself is
    /// left untouched.
    pub fn clip_bounds(&mut self, clip: &BoundingBox) {
        if let Some(b) = self.bbox.as_mut() {
            *b = b.clip(clip);
        }
    }

    pub fn clip_id(&self) -> Option<usize> {
        self.clip_id
    }

    pub fn set_clip_id(&mut self, id: usize) {
        self.clip_id = Some(id);
    }

    pub fn link_idx(&self) -> Option<usize> {
        self.link_idx
    }

    pub fn set_link_idx(&mut self, idx: Option<usize>) {
        self.link_idx = idx;
    }

    /// Geometric equality used to deduplicate clip paths.
    pub fn equals(&self, other: &DocPath) -> bool {
        self.fill_rule == other.fill_rule && self.commands == other.commands
    }

    /// Whether the path is a single axis-aligned rectangle.
    pub fn is_rectangular(&self) -> bool {
        let mut points: Vec<Coord> = Vec::with_capacity(5);
        for (i, cmd) in self.commands.iter().enumerate() {
            match cmd {
                PathCommand::MoveTo(c) if i == 0 => points.push(*c),
                PathCommand::LineTo(c) if i > 0 => points.push(*c),
                PathCommand::Close if i == self.commands.len() - 1 => {}
                _ => return false,
            }
        }

        // a trailing line back to the start is the same as a close
        if points.len() == 5 && points[4] == points[0] {
            points.pop();
        }
        if points.len() != 4 {
            return false;
        }

        let edge_aligned = |a: &Coord, b: &Coord| a.x == b.x || a.y == b.y;
        let alternating = |a: &Coord, b: &Coord, c: &Coord| {
            (a.x == b.x && b.y == c.y) || (a.y == b.y && b.x == c.x)
        };
        (0..4).all(|i| edge_aligned(&points[i], &points[(i + 1) % 4]))
            && alternating(&points[0], &points[1], &points[2])
            && alternating(&points[1], &points[2], &points[3])
    }
}

/// An image drawn on the page. The pixel data lives in the page's image
/// resource list under `res_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePlacement {
    pub res_id: i64,
    pub bbox: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_idx: Option<usize>,
}

/// Entry of the page graphics list.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GfxCmd {
    Path(DocPath),
    Image(ImagePlacement),
}

impl GfxCmd {
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            GfxCmd::Path(p) => p.bounding_box(),
            GfxCmd::Image(i) => i.bbox,
        }
    }
}

/// Outline of a glyph that couldn't be mapped to text and is drawn as
/// a shape instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphOutline {
    pub commands: Vec<PathCommand>,
    pub bbox: BoundingBox,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> DocPath {
        let mut p = DocPath::new(PathType::Fill, GfxAttribs::default(), FillRule::default());
        p.move_to(Coord::new(x, y));
        p.line_to(Coord::new(x + w, y));
        p.line_to(Coord::new(x + w, y + h));
        p.line_to(Coord::new(x, y + h));
        p.close();
        p
    }

    #[test]
    fn test_path_bbox_tracks_points() {
        let p = rect(10.0, 20.0, 30.0, 40.0);
        assert_eq!(p.bounding_box(), BoundingBox::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_rectangle_detection() {
        assert!(rect(0.0, 0.0, 5.0, 5.0).is_rectangular());

        let mut tri = DocPath::new(PathType::Fill, GfxAttribs::default(), FillRule::default());
        tri.move_to(Coord::new(0.0, 0.0));
        tri.line_to(Coord::new(10.0, 0.0));
        tri.line_to(Coord::new(5.0, 8.0));
        tri.close();
        assert!(!tri.is_rectangular());

        let mut skew = DocPath::new(PathType::Fill, GfxAttribs::default(), FillRule::default());
        skew.move_to(Coord::new(0.0, 0.0));
        skew.line_to(Coord::new(10.0, 1.0));
        skew.line_to(Coord::new(10.0, 11.0));
        skew.line_to(Coord::new(0.0, 10.0));
        assert!(!skew.is_rectangular());
    }

    #[test]
    fn test_explicit_return_to_start_is_rectangle() {
        let mut p = DocPath::new(PathType::Fill, GfxAttribs::default(), FillRule::default());
        p.move_to(Coord::new(0.0, 0.0));
        p.line_to(Coord::new(0.0, 10.0));
        p.line_to(Coord::new(20.0, 10.0));
        p.line_to(Coord::new(20.0, 0.0));
        p.line_to(Coord::new(0.0, 0.0));
        assert!(p.is_rectangular());
    }

    #[test]
    fn test_geometric_equality_ignores_attribs() {
        let a = rect(0.0, 0.0, 5.0, 5.0);
        let mut attribs = GfxAttribs::default();
        attribs.line_width = 4.0;
        let mut b = DocPath::new(PathType::Clip, attribs, FillRule::default());
        for cmd in a.commands() {
            match *cmd {
                PathCommand::MoveTo(c) => b.move_to(c),
                PathCommand::LineTo(c) => b.line_to(c),
                PathCommand::CurveTo(c1, c2, c3) => b.curve_to(c1, c2, c3),
                PathCommand::Close => b.close(),
            }
        }
        assert!(a.equals(&b));
    }

    #[test]
    fn test_line_dash_stores_phase_first() {
        let mut attribs = GfxAttribs::default();
        attribs.update_line_dash(2.0, &[3.0, 1.0]);
        assert_eq!(attribs.line_dash, vec![2.0, 3.0, 1.0]);
        attribs.update_line_dash(0.0, &[]);
        assert!(attribs.line_dash.is_empty());
    }
}
