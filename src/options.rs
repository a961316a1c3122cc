//! Run-wide options and output path resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::render::JsonFormat;

/// Options for one conversion run. Built once and shared by reference with
/// the font engine and every page model.
#[derive(Debug, Clone)]
pub struct Options {
    /// Destination for the serialized output
    pub output_file: PathBuf,

    /// Directory images are written to
    pub resource_dir: PathBuf,

    /// Emit extra font diagnostics and equivalent font names
    pub include_debug_info: bool,

    /// Keep characters flagged invisible (OCR layers)
    pub include_invisible_text: bool,

    /// Only emit link data for each page
    pub link_output_only: bool,

    /// Overwrite existing output and image files
    pub force_output: bool,

    /// Font substitution table to load
    pub font_map_file: Option<PathBuf>,

    /// Only process this page (0-indexed)
    pub page_number: Option<u32>,

    /// JSON layout of the output
    pub json_format: JsonFormat,
}

/// Where an image gets written and how the output refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePaths {
    pub abs: PathBuf,
    /// Path relative to the output file's directory
    pub rel: String,
}

impl Options {
    /// Create options writing to `output_file`. Images default to a
    /// `<stem>_images` directory next to it.
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        let output_file = output_file.into();
        let resource_dir = default_resource_dir(&output_file);
        Self {
            output_file,
            resource_dir,
            include_debug_info: false,
            include_invisible_text: false,
            link_output_only: false,
            force_output: false,
            font_map_file: None,
            page_number: None,
            json_format: JsonFormat::Pretty,
        }
    }

    /// Set the image directory.
    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    /// Enable or disable debug metadata.
    pub fn with_debug_info(mut self, enable: bool) -> Self {
        self.include_debug_info = enable;
        self
    }

    /// Enable or disable invisible text.
    pub fn with_invisible_text(mut self, enable: bool) -> Self {
        self.include_invisible_text = enable;
        self
    }

    /// Emit links only.
    pub fn links_only(mut self) -> Self {
        self.link_output_only = true;
        self
    }

    /// Allow overwriting existing files.
    pub fn with_force_output(mut self, force: bool) -> Self {
        self.force_output = force;
        self
    }

    /// Set the font substitution table file.
    pub fn with_font_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_map_file = Some(path.into());
        self
    }

    /// Only process one page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page_number = Some(page);
        self
    }

    /// Set the JSON format.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Whether `page` should be processed.
    pub fn wants_page(&self, page: u32) -> bool {
        self.page_number.map_or(true, |p| p == page)
    }

    /// Resolve the storage path for an image of `page`. The resource
    /// directory is created on demand.
    pub fn image_path(&self, page: u32, res_id: i64, extension: &str) -> Result<ImagePaths> {
        ensure_dir(&self.resource_dir).map_err(|e| {
            log::error!(
                "cannot use '{}' as image directory: {}",
                self.resource_dir.display(),
                e
            );
            Error::ImagePath(res_id)
        })?;

        let file_name = if res_id < 0 {
            format!("p{}_inline{}.{}", page, -res_id, extension)
        } else {
            format!("p{}_{}.{}", page, res_id, extension)
        };
        let abs = self.resource_dir.join(file_name);
        let rel = self.relative_to_output(&abs);
        Ok(ImagePaths { abs, rel })
    }

    fn relative_to_output(&self, path: &Path) -> String {
        let base = self.output_file.parent().unwrap_or_else(|| Path::new(""));
        let rel = path.strip_prefix(base).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

fn default_resource_dir(output_file: &Path) -> PathBuf {
    let stem = output_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir_name = format!("{}_images", stem);
    match output_file.parent() {
        Some(parent) => parent.join(dir_name),
        None => PathBuf::from(dir_name),
    }
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "exists and is not a directory",
            ));
        }
        return Ok(());
    }
    fs::create_dir_all(dir)
}
