//! Records accumulated for a page.
//!
//! These types are the building blocks the page model stores and
//! serializes: geometry, colors, text spans, paths, images and links.
//! Cross references between them are plain indices into the owning list.

mod color;
mod geometry;
mod graphics;
mod link;
mod resource;
mod text;

pub use color::RgbColor;
pub use geometry::{BoundingBox, Bounds, ClipState, Coord, Transform};
pub use graphics::{
    DocPath, FillRule, GfxAttribs, GfxCmd, GlyphOutline, ImagePlacement, PaintAttribs,
    PathCommand, PathType,
};
pub use link::Link;
pub use resource::{ImageData, StreamProps};
pub use text::{Character, TextAttribs, TextMetrics, TextSpan};
