//! Text assembly: characters into spans, span bounds and redaction.

use crate::diagnostics::DiagnosticKind;
use crate::model::{BoundingBox, Character, Coord, TextMetrics, Transform};

use super::{PageModel, MODULE};

/// Below this share of a span's area covered by an opaque fill, the span
/// is left alone.
const REDACT_MIN_RATIO: f64 = 0.25;

/// Above this share the span is considered hidden.
const REDACT_FULL_RATIO: f64 = 0.8;

impl PageModel<'_> {
    /// Add a character drawn by the interpreter. `(x, y)` is the glyph
    /// origin; `(w, h)` its advance in page space.
    ///
    /// Returns false if the character was rejected or dropped.
    #[allow(clippy::too_many_arguments)]
    pub fn new_character(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        ctm: Transform,
        metrics: TextMetrics,
        unicode: u32,
        glyph_idx: Option<usize>,
        invisible: bool,
    ) -> bool {
        // work on a copy until the character is accepted
        let mut ta = self.text.attribs;
        let mut used_pending_font = false;

        if ta.font_idx.is_none() && self.pending_font.is_some() {
            ta.font_idx = Some(self.fonts.len());
            used_pending_font = true;
        }

        let fill = self.gfx.attribs.fill;
        if !ta.are_valid() || fill.color_idx.is_none() {
            self.diagnostics.error(
                DiagnosticKind::PageData,
                MODULE,
                "attempted to add character but no font and/or color have been registered",
            );
            return false;
        }

        if invisible {
            self.has_invisible_text = true;
            if !self.options.include_invisible_text {
                return false;
            }
        }

        // the interpreter reports no height for horizontal text so the
        // font size stands in for it; rotated spans get corrected later
        let rotated = ctm.is_rotated();
        let bbox = if rotated {
            BoundingBox::new(x, y, w, h)
        } else {
            BoundingBox::new(x, y, w, -ta.font_size)
        };
        let advance = if rotated {
            Coord::new(w, h)
        } else {
            Coord::new(w, 0.0)
        };

        ta.invisible = invisible;
        ta.link_idx = self.inside_link(&bbox);

        let c = Character {
            bbox,
            origin: Coord::new(x, y),
            advance,
            ctm,
            unicode,
            attribs: ta,
            fill,
            metrics,
            glyph_idx,
            clip_idx: self.gfx.clip_path(),
        };

        if self.text.span.as_ref().is_some_and(|span| !span.spans(&c)) {
            self.insert_pending_span();
        }

        if !self.text.push_char(c) {
            return false;
        }

        if used_pending_font {
            if let Some(font) = self.pending_font.take() {
                self.fonts.push(font);
            }
        }
        self.text.attribs = ta;
        true
    }

    /// Close the open span and store it if it's worth keeping. Returns
    /// whether a span was stored.
    pub fn insert_pending_span(&mut self) -> bool {
        let Some(mut span) = self.text.pop_span() else {
            return false;
        };

        span.finalize();
        if span.is_empty() {
            return false;
        }

        let mut span_bbox = span.bounding_box();

        let ctm = span.ctm();
        if ctm.is_rotated() {
            let angle = ctm.rotation();
            let p1 = span_bbox.p1();

            // undo the rotation to get the horizontal extent, pad the
            // height by the font size, then rotate back
            let unrotate = Transform::rotation_at(-angle, p1.x, p1.y);
            let mut extent = unrotate.transform_delta(span_bbox.width(), -span_bbox.height());
            extent.y = extent.y.abs() + span.font_size();

            let rotate = Transform::rotation_at(-angle, p1.x, p1.y);
            let p2 = rotate.transform(extent.x, -extent.y);
            span_bbox = BoundingBox::from_corners(p1, p2);
            span.set_bounding_box(span_bbox);
        }

        if !self.inside_page(&span_bbox) {
            log::trace!("dropping span outside of page: '{}'", span.text());
            return false;
        }

        // the clipped box only feeds the text bounds
        if let Some(clip) = span.clip_id().and_then(|id| self.clip_paths.get(id)) {
            span_bbox = span_bbox.clip(&clip.bounding_box());
        }

        self.text_spans.push(span);
        self.text.bounds.expand(&span_bbox);
        true
    }

    /// End of a text object: store the open span.
    pub fn mark_end_of_text(&mut self) {
        if self.text.span.is_some() {
            self.insert_pending_span();
        }
    }

    /// Remove or truncate stored spans hidden by an opaque rectangular
    /// fill. Rotated spans are skipped.
    pub(super) fn remove_spans_overlapped_by_region(&mut self, region: &BoundingBox) {
        self.text_spans.retain_mut(|span| {
            if span.ctm().is_rotated() {
                return true;
            }

            let sbbox = span.bounding_box();
            let ratio = sbbox.intersection_area_ratio(region);

            if ratio < REDACT_MIN_RATIO {
                return true;
            }
            if ratio > REDACT_FULL_RATIO {
                log::trace!("removing span covered by fill: '{}'", span.text());
                return false;
            }

            // partly covered; only trim when the fill doesn't span the
            // whole width of the text
            if sbbox.x_min < region.x_min || sbbox.x_max > region.x_max {
                span.whiteout(region);
                return !span.is_empty();
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::font::{DocFont, DocFontMaps, FontEngine, FontLocation, FontLocator, FontRef, FontType};
    use crate::model::{BoundingBox, TextMetrics, Transform};
    use crate::options::Options;
    use crate::page::PageModel;

    struct Embedded;

    impl FontLocator for Embedded {
        fn locate(&self, _font: &FontRef) -> Option<FontLocation> {
            Some(FontLocation::Embedded(b"%!PS-AdobeFont".to_vec()))
        }
    }

    fn ready_page<'a>(options: &'a Options, engine: &mut FontEngine<'_>) -> PageModel<'a> {
        let doc = DocFont::new(FontRef::new(1, 0), "Helvetica", FontType::Type1);
        let mut page = PageModel::new(options, 0, 612.0, 792.0, 0);
        let font = engine
            .load_font(&doc, &Embedded, page.diagnostics_mut())
            .cloned()
            .unwrap();
        page.update_font(&font, 12.0);
        page.update_fill_color(0.0, 0.0, 0.0);
        page
    }

    fn put(page: &mut PageModel<'_>, c: char, x: f64, w: f64) -> bool {
        page.new_character(
            x,
            100.0,
            w,
            0.0,
            Transform::identity(),
            TextMetrics::default(),
            c as u32,
            None,
            false,
        )
    }

    #[test]
    fn test_rejects_without_font_or_color() {
        let options = Options::new("out.json");
        let mut page = PageModel::new(&options, 0, 612.0, 792.0, 0);
        page.update_fill_color(0.0, 0.0, 0.0);

        assert!(!put(&mut page, 'A', 10.0, 7.0));
        assert!(page.open_span().is_none());
        assert!(page.fonts().is_empty());
        assert!(!page.is_ok());
    }

    #[test]
    fn test_pending_font_committed_on_use() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        assert!(page.fonts().is_empty());
        assert!(put(&mut page, 'A', 10.0, 7.0));
        assert_eq!(page.fonts().len(), 1);
        assert!(page.pending_font().is_none());
        assert_eq!(page.text_attribs().font_idx, Some(0));
    }

    #[test]
    fn test_leading_space_dropped_and_pending_font_kept() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        assert!(!put(&mut page, ' ', 10.0, 3.0));
        assert!(page.fonts().is_empty());
        assert!(page.pending_font().is_some());
    }

    #[test]
    fn test_gap_starts_new_span() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        put(&mut page, 'A', 10.0, 7.0);
        put(&mut page, 'B', 17.0, 7.0);
        put(&mut page, 'C', 100.0, 7.0);
        page.mark_end_of_text();

        let texts: Vec<String> = page.text_spans().iter().map(|s| s.text()).collect();
        assert_eq!(texts, ["AB", "C"]);
    }

    #[test]
    fn test_whitespace_only_span_discarded() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        put(&mut page, 'A', 10.0, 7.0);
        put(&mut page, ' ', 17.0, 3.0);
        page.mark_end_of_text();
        assert_eq!(page.text_spans()[0].text(), "A");

        // nothing open, nothing stored
        assert!(!page.insert_pending_span());
        assert_eq!(page.text_spans().len(), 1);
    }

    #[test]
    fn test_span_outside_page_dropped() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        put(&mut page, 'A', 700.0, 7.0);
        page.mark_end_of_text();
        assert!(page.text_spans().is_empty());
        assert!(!page.text_bounds().is_set());
    }

    #[test]
    fn test_invisible_text_flagged_and_dropped() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        let kept = page.new_character(
            10.0,
            100.0,
            7.0,
            0.0,
            Transform::identity(),
            TextMetrics::default(),
            'A' as u32,
            None,
            true,
        );
        assert!(!kept);
        assert!(page.has_invisible_text());
        assert!(page.open_span().is_none());
    }

    #[test]
    fn test_rotated_span_bbox() {
        let maps = DocFontMaps::new().unwrap();
        let mut engine = FontEngine::new(&maps);
        let options = Options::new("out.json");
        let mut page = ready_page(&options, &mut engine);

        // 90 degree rotation; each glyph advances 7 units down the page
        let ctm = Transform::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        for (i, c) in ['A', 'B'].into_iter().enumerate() {
            page.new_character(
                100.0,
                100.0 + 7.0 * i as f64,
                0.0,
                7.0,
                ctm,
                TextMetrics::default(),
                c as u32,
                None,
                false,
            );
        }
        page.mark_end_of_text();

        let span = &page.text_spans()[0];
        assert_eq!(span.length(), 2);
        // naive box is 0 wide and 14 tall; corrected box extends left by
        // the font size
        let b = span.bounding_box();
        assert!((b.x_min - 88.0).abs() < 1e-9);
        assert!((b.x_max - 100.0).abs() < 1e-9);
        assert!((b.y_min - 100.0).abs() < 1e-9);
        assert!((b.y_max - 114.0).abs() < 1e-9);
        assert_ne!(b, BoundingBox::new(100.0, 100.0, 0.0, 14.0));
    }
}
