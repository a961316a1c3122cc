//! Paths, clip regions and images.

use std::fs;

use serde::Deserialize;

use crate::diagnostics::DiagnosticKind;
use crate::error::Error;
use crate::model::{
    BoundingBox, ClipState, Coord, DocPath, FillRule, GfxCmd, ImageData, ImagePlacement, PathType,
    StreamProps,
};

use super::{PageModel, MODULE};

/// A path point as reported by the interpreter, already in page space.
/// Curve points come in threes: two control points and the end point, all
/// flagged as `curve`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub curve: bool,
}

impl PathPoint {
    pub fn line(x: f64, y: f64) -> Self {
        Self { x, y, curve: false }
    }

    pub fn curve(x: f64, y: f64) -> Self {
        Self { x, y, curve: true }
    }

    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Subpath {
    pub points: Vec<PathPoint>,
    #[serde(default)]
    pub closed: bool,
}

/// Path geometry handed over by the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PathGeometry {
    pub subpaths: Vec<Subpath>,
}

impl PathGeometry {
    /// Single closed rectangle.
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            subpaths: vec![Subpath {
                points: vec![
                    PathPoint::line(x, y),
                    PathPoint::line(x + w, y),
                    PathPoint::line(x + w, y + h),
                    PathPoint::line(x, y + h),
                ],
                closed: true,
            }],
        }
    }
}

impl PageModel<'_> {
    /// Store a path drawn with the current graphics attributes. Clip paths
    /// become the active clip; other paths are clipped, checked against the
    /// page and may hide text underneath.
    pub fn new_path(&mut self, geometry: &PathGeometry, path_type: PathType, fill_rule: FillRule) {
        let mut path = DocPath::new(path_type, self.gfx.attribs.clone(), fill_rule);

        for subpath in &geometry.subpaths {
            let points = &subpath.points;
            let Some(first) = points.first() else {
                continue;
            };
            path.move_to(first.coord());

            let mut j = 1;
            while j < points.len() {
                if points[j].curve && j + 2 < points.len() {
                    path.curve_to(points[j].coord(), points[j + 1].coord(), points[j + 2].coord());
                    j += 3;
                } else {
                    path.line_to(points[j].coord());
                    j += 1;
                }
            }

            if subpath.closed {
                path.close();
            }
        }

        if path.is_empty() {
            log::trace!("ignoring {:?} path without points", path_type);
            return;
        }

        if path_type == PathType::Clip {
            let idx = match self.find_clip_path(&path) {
                Some(idx) => idx,
                None => {
                    let idx = self.clip_paths.len();
                    path.set_clip_id(idx);
                    self.clip_paths.push(path);
                    idx
                }
            };
            self.gfx.attribs.clip_idx = Some(idx);
            return;
        }

        if let Some(clip_id) = self.gfx.clip_path() {
            if let Some(clip) = self.clip_paths.get(clip_id) {
                let cb = clip.bounding_box();
                match path.bounding_box().is_clipped_by(&cb) {
                    ClipState::FullyClipped => return,
                    ClipState::PartiallyClipped => path.clip_bounds(&cb),
                    ClipState::Unclipped => {}
                }
                path.set_clip_id(clip_id);
            }
        }

        let bbox = path.bounding_box();
        if !self.inside_page(&bbox) {
            return;
        }

        if path_type == PathType::Fill
            && self.gfx.attribs.fill.opacity == 1.0
            && path.is_rectangular()
        {
            self.remove_spans_overlapped_by_region(&bbox);
        }

        path.set_link_idx(self.inside_link(&bbox));
        self.gfx.bounds.expand(&bbox);
        self.graphics.push(GfxCmd::Path(path));
    }

    /// Id of a stored clip path with the same geometry.
    pub fn find_clip_path(&self, path: &DocPath) -> Option<usize> {
        self.clip_paths.iter().position(|p| p.equals(path))
    }

    /// Record a placement of a cached image.
    pub fn new_image(&mut self, res_id: i64, bbox: BoundingBox) {
        let mut img = ImagePlacement {
            res_id,
            bbox,
            clip_id: None,
            link_idx: self.inside_link(&bbox),
        };

        let mut img_bbox = bbox;
        if let Some(clip_id) = self.gfx.clip_path() {
            img.clip_id = Some(clip_id);
            if let Some(clip) = self.clip_paths.get(clip_id) {
                img_bbox = img_bbox.clip(&clip.bounding_box());
            }
        }

        self.graphics.push(GfxCmd::Image(img));
        self.gfx.bounds.expand(&img_bbox);
    }

    /// Whether an image with this resource id is cached. A hit counts as
    /// one more reference.
    pub fn image_is_cached(&mut self, res_id: i64) -> bool {
        match self.images.iter_mut().find(|i| i.equals(res_id)) {
            Some(img) => {
                img.add_ref();
                true
            }
            None => false,
        }
    }

    /// Resource id of a cached image with this content hash. A hit counts
    /// as one more reference.
    pub fn inlined_image_is_cached(&mut self, md5: &str) -> Option<i64> {
        let img = self.images.iter_mut().find(|i| i.md5 == md5)?;
        img.add_ref();
        Some(img.id)
    }

    /// Write an image to the resource directory and add it to the image
    /// list. `width` and `height` are the drawn size, which may differ from
    /// the stream's. Existing files are kept unless output is forced.
    #[allow(clippy::too_many_arguments)]
    pub fn cache_image(
        &mut self,
        res_id: i64,
        bbox: BoundingBox,
        width: u32,
        height: u32,
        properties: StreamProps,
        data: &[u8],
        md5: &str,
    ) -> bool {
        let mime_type = ImageData::detect_mime_type(data).unwrap_or("application/octet-stream");
        let extension = ImageData::extension_for(mime_type);

        let paths = match self.options.image_path(self.number, res_id, extension) {
            Ok(paths) => paths,
            Err(e) => {
                self.diagnostics.error(
                    DiagnosticKind::PageData,
                    MODULE,
                    format!("failed to determine absolute file path to write image data to disk: {}", e),
                );
                return false;
            }
        };

        if self.options.force_output || !paths.abs.exists() {
            if let Err(source) = fs::write(&paths.abs, data) {
                let err = Error::ImageWrite {
                    path: paths.abs,
                    source,
                };
                self.diagnostics.error(DiagnosticKind::PageData, MODULE, err.to_string());
                return false;
            }
        }

        self.images.push(ImageData::new(
            res_id, bbox, width, height, properties, md5, paths.rel, mime_type,
        ));
        true
    }

    /// Draw an image: reuse the cached copy when the resource id (or, for
    /// inline images without one, the content hash) is known, otherwise
    /// write it out first. Returns false if the image couldn't be stored.
    ///
    /// Negative ids are reserved for inline images; a negative `res_id`
    /// is treated as no id at all.
    pub fn draw_image(
        &mut self,
        res_id: Option<i64>,
        bbox: BoundingBox,
        properties: StreamProps,
        data: &[u8],
    ) -> bool {
        let res_id = res_id.filter(|id| *id >= 0);
        let id = match res_id {
            Some(id) if self.image_is_cached(id) => id,
            Some(id) => {
                let md5 = ImageData::content_hash(data);
                if !self.cache_new_image(id, bbox, properties, data, &md5) {
                    return false;
                }
                id
            }
            None => {
                let md5 = ImageData::content_hash(data);
                match self.inlined_image_is_cached(&md5) {
                    Some(id) => id,
                    None => {
                        let id = self.next_inline_id;
                        if !self.cache_new_image(id, bbox, properties, data, &md5) {
                            return false;
                        }
                        self.next_inline_id -= 1;
                        id
                    }
                }
            }
        };

        self.new_image(id, bbox);
        true
    }

    fn cache_new_image(
        &mut self,
        res_id: i64,
        bbox: BoundingBox,
        properties: StreamProps,
        data: &[u8],
        md5: &str,
    ) -> bool {
        let (width, height) = (properties.width, properties.height);
        self.cache_image(res_id, bbox, width, height, properties, data, md5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Character, Coord as Pt, PaintAttribs, TextAttribs, TextMetrics, TextSpan, Transform};
    use crate::options::Options;

    const PNG: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn page(options: &Options) -> PageModel<'_> {
        PageModel::new(options, 0, 612.0, 792.0, 0)
    }

    /// Store a span directly, skipping font setup.
    fn add_span(page: &mut PageModel<'_>, text: &str, x: f64, w: f64) {
        let mut span = TextSpan::new();
        for (i, c) in text.chars().enumerate() {
            let cx = x + w * i as f64;
            span.push_back(Character {
                bbox: BoundingBox::new(cx, 100.0, w, -12.0),
                origin: Pt::new(cx, 100.0),
                advance: Pt::new(w, 0.0),
                ctm: Transform::identity(),
                unicode: c as u32,
                attribs: TextAttribs {
                    font_idx: Some(0),
                    font_size: 12.0,
                    invisible: false,
                    link_idx: None,
                },
                fill: PaintAttribs {
                    color_idx: Some(0),
                    opacity: 1.0,
                },
                metrics: TextMetrics::default(),
                glyph_idx: None,
                clip_idx: None,
            });
        }
        page.text_spans.push(span);
    }

    #[test]
    fn test_curves_and_close() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        let geometry = PathGeometry {
            subpaths: vec![Subpath {
                points: vec![
                    PathPoint::line(0.0, 0.0),
                    PathPoint::curve(10.0, 0.0),
                    PathPoint::curve(10.0, 10.0),
                    PathPoint::curve(0.0, 10.0),
                    PathPoint::line(0.0, 5.0),
                ],
                closed: true,
            }],
        };
        page.new_path(&geometry, PathType::Stroke, FillRule::NonZeroWinding);

        let GfxCmd::Path(path) = &page.graphics()[0] else {
            panic!("expected a path");
        };
        assert_eq!(path.commands().len(), 4);
        assert_eq!(path.bounding_box(), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_clip_paths_deduplicated() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        let clip = PathGeometry::rect(0.0, 0.0, 100.0, 100.0);

        page.new_path(&clip, PathType::Clip, FillRule::NonZeroWinding);
        assert_eq!(page.clip_idx(), Some(0));

        page.push_gfx_state();
        page.new_path(&PathGeometry::rect(5.0, 5.0, 10.0, 10.0), PathType::Clip, FillRule::EvenOdd);
        assert_eq!(page.clip_idx(), Some(1));
        page.pop_gfx_state();

        page.new_path(&clip, PathType::Clip, FillRule::NonZeroWinding);
        assert_eq!(page.clip_paths().len(), 2);
        assert_eq!(page.clip_idx(), Some(0));
        assert_eq!(page.clip_paths()[0].clip_id(), Some(0));
    }

    #[test]
    fn test_paths_against_clip() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        page.new_path(&PathGeometry::rect(0.0, 0.0, 100.0, 100.0), PathType::Clip, FillRule::default());

        // fully clipped: dropped
        page.new_path(&PathGeometry::rect(200.0, 200.0, 10.0, 10.0), PathType::Stroke, FillRule::default());
        assert!(page.graphics().is_empty());

        // partially clipped: bounds truncated
        page.new_path(&PathGeometry::rect(90.0, 90.0, 20.0, 20.0), PathType::Stroke, FillRule::default());
        let GfxCmd::Path(path) = &page.graphics()[0] else {
            panic!("expected a path");
        };
        assert_eq!(path.bounding_box(), BoundingBox::new(90.0, 90.0, 10.0, 10.0));
        assert_eq!(path.clip_id(), Some(0));
        assert_eq!(
            page.gfx_bounds().bounding_box(),
            Some(&BoundingBox::new(90.0, 90.0, 10.0, 10.0))
        );
    }

    #[test]
    fn test_path_outside_page_dropped() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        page.new_path(&PathGeometry::rect(700.0, 10.0, 10.0, 10.0), PathType::Fill, FillRule::default());
        assert!(page.graphics().is_empty());
        assert!(!page.gfx_bounds().is_set());
    }

    #[test]
    fn test_redaction_ratios() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        page.update_fill_color(1.0, 1.0, 1.0);

        // spans are 40 wide, 12 tall, y 88..100
        add_span(&mut page, "AAAA", 0.0, 10.0);
        add_span(&mut page, "BBBB", 100.0, 10.0);
        add_span(&mut page, "CDEF", 200.0, 10.0);

        // covers all of the first span
        page.new_path(&PathGeometry::rect(-5.0, 80.0, 50.0, 30.0), PathType::Fill, FillRule::default());
        // 10% of the second
        page.new_path(&PathGeometry::rect(136.0, 80.0, 20.0, 30.0), PathType::Fill, FillRule::default());
        // about half of the third, from the right
        page.new_path(&PathGeometry::rect(218.0, 80.0, 40.0, 30.0), PathType::Fill, FillRule::default());

        let texts: Vec<String> = page.text_spans().iter().map(|s| s.text()).collect();
        assert_eq!(texts, ["BBBB", "CD"]);
        assert_eq!(page.graphics().len(), 3);
    }

    #[test]
    fn test_fill_wider_than_span_keeps_it() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        page.update_fill_color(1.0, 1.0, 1.0);
        add_span(&mut page, "ABCD", 0.0, 10.0);

        // covers the full width but only the bottom half: ratio 0.5
        page.new_path(&PathGeometry::rect(-10.0, 94.0, 60.0, 10.0), PathType::Fill, FillRule::default());
        let texts: Vec<String> = page.text_spans().iter().map(|s| s.text()).collect();
        assert_eq!(texts, ["ABCD"]);
    }

    #[test]
    fn test_empty_paths_ignored() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        page.new_path(&PathGeometry::rect(100.0, 100.0, 10.0, 10.0), PathType::Fill, FillRule::default());
        page.new_path(&PathGeometry::default(), PathType::Fill, FillRule::default());
        let no_points = PathGeometry {
            subpaths: vec![Subpath::default()],
        };
        page.new_path(&no_points, PathType::Stroke, FillRule::default());

        assert_eq!(page.graphics().len(), 1);
        assert_eq!(
            page.gfx_bounds().bounding_box(),
            Some(&BoundingBox::new(100.0, 100.0, 10.0, 10.0))
        );

        // an empty clip doesn't become the active clip
        page.new_path(&PathGeometry::default(), PathType::Clip, FillRule::default());
        assert!(page.clip_paths().is_empty());
        assert_eq!(page.clip_idx(), None);
        page.new_path(&PathGeometry::rect(200.0, 200.0, 10.0, 10.0), PathType::Stroke, FillRule::default());
        assert_eq!(page.graphics().len(), 2);
    }

    #[test]
    fn test_no_redaction_for_translucent_or_stroked() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        add_span(&mut page, "AAAA", 0.0, 10.0);

        page.new_path(&PathGeometry::rect(-5.0, 80.0, 50.0, 30.0), PathType::Stroke, FillRule::default());
        page.update_fill_opacity(0.5);
        page.new_path(&PathGeometry::rect(-5.0, 80.0, 50.0, 30.0), PathType::Fill, FillRule::default());
        assert_eq!(page.text_spans().len(), 1);
    }

    #[test]
    fn test_image_clipped_bounds() {
        let options = Options::new("out.json");
        let mut page = page(&options);
        page.new_path(&PathGeometry::rect(0.0, 0.0, 50.0, 50.0), PathType::Clip, FillRule::default());
        page.new_image(3, BoundingBox::new(25.0, 25.0, 50.0, 50.0));

        let GfxCmd::Image(img) = &page.graphics()[0] else {
            panic!("expected an image");
        };
        assert_eq!(img.clip_id, Some(0));
        assert_eq!(img.bbox, BoundingBox::new(25.0, 25.0, 50.0, 50.0));
        assert_eq!(
            page.gfx_bounds().bounding_box(),
            Some(&BoundingBox::new(25.0, 25.0, 25.0, 25.0))
        );
    }

    #[test]
    fn test_image_reused_by_resource_id() {
        let tmp = tempfile::tempdir().unwrap();
        let options = Options::new(tmp.path().join("doc.json"));
        let mut page = page(&options);
        let props = StreamProps {
            width: 4,
            height: 4,
            ..Default::default()
        };
        let bbox = BoundingBox::new(10.0, 10.0, 40.0, 40.0);

        assert!(page.draw_image(Some(7), bbox, props.clone(), &PNG));
        let written = tmp.path().join("doc_images/p0_7.png");
        assert!(written.exists());

        // a second draw must not touch the file
        std::fs::write(&written, b"sentinel").unwrap();
        assert!(page.draw_image(Some(7), bbox, props, &PNG));
        assert_eq!(std::fs::read(&written).unwrap(), b"sentinel");

        assert_eq!(page.images().len(), 1);
        assert_eq!(page.images()[0].ref_count, 2);
        assert_eq!(page.images()[0].path, "doc_images/p0_7.png");
        assert_eq!(page.graphics().len(), 2);
    }

    #[test]
    fn test_inline_images_deduplicated_by_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let options = Options::new(tmp.path().join("doc.json"));
        let mut page = page(&options);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);

        assert!(page.draw_image(None, bbox, StreamProps::default(), &PNG));
        assert!(page.draw_image(None, bbox, StreamProps::default(), &PNG));
        let mut other = PNG.to_vec();
        other.push(1);
        assert!(page.draw_image(None, bbox, StreamProps::default(), &other));

        let ids: Vec<i64> = page.images().iter().map(|i| i.id).collect();
        assert_eq!(ids, [-1, -2]);
        assert_eq!(page.images()[0].ref_count, 2);
        assert_eq!(page.inlined_image_is_cached("nope"), None);
    }

    #[test]
    fn test_negative_resource_id_treated_as_inline() {
        let tmp = tempfile::tempdir().unwrap();
        let options = Options::new(tmp.path().join("doc.json"));
        let mut page = page(&options);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let mut other = PNG.to_vec();
        other.push(1);

        assert!(page.draw_image(Some(-1), bbox, StreamProps::default(), &PNG));
        assert!(page.draw_image(None, bbox, StreamProps::default(), &other));

        let ids: Vec<i64> = page.images().iter().map(|i| i.id).collect();
        assert_eq!(ids, [-1, -2]);
        let second = tmp.path().join(&page.images()[1].path);
        assert_eq!(std::fs::read(second).unwrap(), other);
        assert_eq!(page.images()[1].md5, ImageData::content_hash(&other));
    }

    #[test]
    fn test_unwritable_image_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();
        let options = Options::new(tmp.path().join("doc.json")).with_resource_dir(&blocker);
        let mut page = page(&options);

        let ok = page.draw_image(Some(1), BoundingBox::new(0.0, 0.0, 5.0, 5.0), StreamProps::default(), &PNG);
        assert!(!ok);
        assert!(page.images().is_empty());
        assert!(page.graphics().is_empty());
        assert!(!page.is_ok());
    }
}
