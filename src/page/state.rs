//! Transient state tracked while a page is being drawn.

use crate::model::{Bounds, Character, GfxAttribs, TextAttribs, TextSpan};

/// Current text attributes, the span being assembled and the bounds of
/// every stored span.
#[derive(Debug, Default)]
pub(crate) struct TextState {
    pub attribs: TextAttribs,
    pub span: Option<TextSpan>,
    pub bounds: Bounds,
}

impl TextState {
    /// Append a character to the open span, opening one if needed.
    /// Whitespace never opens a span; returns false if `c` was dropped.
    pub fn push_char(&mut self, c: Character) -> bool {
        match self.span.as_mut() {
            Some(span) => span.push_back(c),
            None => {
                if c.is_space() {
                    return false;
                }
                let mut span = TextSpan::new();
                span.push_back(c);
                self.span = Some(span);
            }
        }
        true
    }

    pub fn pop_span(&mut self) -> Option<TextSpan> {
        self.span.take()
    }
}

/// Current graphics attributes with the save/restore stack, and the bounds
/// of every stored graphic.
#[derive(Debug, Default)]
pub(crate) struct GfxState {
    pub attribs: GfxAttribs,
    stack: Vec<GfxAttribs>,
    pub bounds: Bounds,
}

impl GfxState {
    pub fn push(&mut self) {
        self.stack.push(self.attribs.clone());
    }

    /// Restore the last saved attributes. Unbalanced restores are ignored.
    pub fn pop(&mut self) {
        if let Some(attribs) = self.stack.pop() {
            self.attribs = attribs;
        }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clip_path(&self) -> Option<usize> {
        self.attribs.clip_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Coord, PaintAttribs, TextMetrics, Transform};

    fn ch(c: char, x: f64) -> Character {
        Character {
            bbox: BoundingBox::new(x, 10.0, 5.0, -10.0),
            origin: Coord::new(x, 10.0),
            advance: Coord::new(5.0, 0.0),
            ctm: Transform::identity(),
            unicode: c as u32,
            attribs: TextAttribs::default(),
            fill: PaintAttribs::default(),
            metrics: TextMetrics::default(),
            glyph_idx: None,
            clip_idx: None,
        }
    }

    #[test]
    fn test_space_never_opens_span() {
        let mut state = TextState::default();
        assert!(!state.push_char(ch(' ', 0.0)));
        assert!(state.span.is_none());

        assert!(state.push_char(ch('a', 0.0)));
        assert!(state.push_char(ch(' ', 5.0)));
        assert_eq!(state.pop_span().map(|s| s.length()), Some(2));
        assert!(state.span.is_none());
    }

    #[test]
    fn test_gfx_stack() {
        let mut state = GfxState::default();
        state.attribs.line_width = 2.0;
        state.push();
        state.attribs.line_width = 5.0;
        state.attribs.clip_idx = Some(0);
        assert_eq!(state.depth(), 1);

        state.pop();
        assert_eq!(state.attribs.line_width, 2.0);
        assert_eq!(state.clip_path(), None);

        // extra pop is a no-op
        state.pop();
        assert_eq!(state.attribs.line_width, 2.0);
    }
}
