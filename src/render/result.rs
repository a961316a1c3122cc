//! Rendering result with statistics.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Severity;
use crate::page::PageModel;

/// Result of rendering a document: the serialized pages plus statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered JSON document
    pub content: String,

    /// Totals over every rendered page
    pub stats: ConversionStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, stats: ConversionStats) -> Self {
        Self { content, stats }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Totals collected while pages are finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of pages rendered
    pub page_count: u32,

    /// Stored text spans
    pub span_count: u32,

    /// Characters in stored spans
    pub char_count: u32,

    /// Paths and image placements, clip paths excluded
    pub graphic_count: u32,

    /// Distinct clip paths
    pub clip_count: u32,

    /// Distinct image resources
    pub image_count: u32,

    /// Page fonts (after merging equivalent document fonts)
    pub font_count: u32,

    /// Pages that reported at least one error
    pub failed_pages: u32,

    /// Error diagnostics, repeats included
    pub error_count: u32,

    /// Warning diagnostics, repeats included
    pub warning_count: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the totals of a finalized page.
    pub fn add_page(&mut self, page: &PageModel<'_>) {
        self.page_count += 1;
        self.span_count += page.text_spans().len() as u32;
        self.char_count += page.text_spans().iter().map(|s| s.length() as u32).sum::<u32>();
        self.graphic_count += page.graphics().len() as u32;
        self.clip_count += page.clip_paths().len() as u32;
        self.image_count += page.images().len() as u32;
        self.font_count += page.fonts().len() as u32;

        if !page.is_ok() {
            self.failed_pages += 1;
        }
        for d in page.diagnostics().entries() {
            match d.severity {
                Severity::Error => self.error_count += d.count,
                Severity::Warning => self.warning_count += d.count,
            }
        }
    }

    /// Whether every page came through without errors.
    pub fn is_ok(&self) -> bool {
        self.failed_pages == 0
    }
}
