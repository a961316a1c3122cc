//! Link annotations.

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Coord};

/// A clickable region of the page pointing at a URI or a page of the same
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub bbox: BoundingBox,

    /// Target URI for external links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Target page for internal links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_page: Option<u32>,
}

impl Link {
    pub fn to_uri(bbox: BoundingBox, uri: impl Into<String>) -> Self {
        Self {
            bbox,
            uri: Some(uri.into()),
            dest_page: None,
        }
    }

    pub fn to_page(bbox: BoundingBox, page: u32) -> Self {
        Self {
            bbox,
            uri: None,
            dest_page: Some(page),
        }
    }

    pub fn encloses(&self, p: &Coord) -> bool {
        self.bbox.contains(p)
    }
}
