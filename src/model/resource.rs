//! Image resources written to disk and shared by every placement that
//! draws them.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;

/// Properties of the source image stream as stored in the document. These
/// may differ from the drawn size when a transform scales the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamProps {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Color space (e.g., "DeviceRGB", "DeviceGray")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_space: Option<String>,

    /// Bits per component (e.g., 8)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits_per_component: Option<u8>,

    /// Stream filter (e.g., "DCTDecode")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// A cached image. Two images are the same resource when their resource
/// ids match or when their content hashes match.
#[derive(Debug, Clone, Serialize)]
pub struct ImageData {
    /// Resource id (object number, or a page-local id for inline images)
    pub id: i64,

    /// Bounds of the first placement
    pub bbox: BoundingBox,

    /// Drawn width in pixels
    pub width: u32,

    /// Drawn height in pixels
    pub height: u32,

    /// Original stream properties
    #[serde(flatten)]
    pub properties: StreamProps,

    /// MIME type detected from the data
    pub mime_type: String,

    /// Hex MD5 of the image bytes
    pub md5: String,

    /// Path of the written file, relative to the output
    pub path: String,

    /// Number of placements that use this image
    pub ref_count: u32,
}

impl ImageData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        bbox: BoundingBox,
        width: u32,
        height: u32,
        properties: StreamProps,
        md5: impl Into<String>,
        path: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            bbox,
            width,
            height,
            properties,
            mime_type: mime_type.into(),
            md5: md5.into(),
            path: path.into(),
            ref_count: 1,
        }
    }

    pub fn equals(&self, res_id: i64) -> bool {
        self.id == res_id
    }

    /// Record one more placement of this image.
    pub fn add_ref(&mut self) {
        self.ref_count += 1;
    }

    /// Hex MD5 digest of image bytes.
    pub fn content_hash(data: &[u8]) -> String {
        let digest = Md5::digest(data);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// File extension for a MIME type.
    pub fn extension_for(mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/tiff" => "tiff",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/jp2" | "image/jpeg2000" => "jp2",
            // For raw image data without recognized format, use .raw
            _ => "raw",
        }
    }

    /// Detect MIME type from data magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }

        // GIF: GIF87a or GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("image/gif");
        }

        // TIFF: 49 49 2A 00 (little-endian) or 4D 4D 00 2A (big-endian)
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("image/tiff");
        }

        // BMP: BM
        if data.starts_with(b"BM") {
            return Some("image/bmp");
        }

        // WEBP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("image/webp");
        }

        // JPEG 2000: 00 00 00 0C 6A 50 20 20
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
            return Some("image/jp2");
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mime_type() {
        // JPEG
        let jpeg_data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(ImageData::detect_mime_type(&jpeg_data), Some("image/jpeg"));

        // PNG
        let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageData::detect_mime_type(&png_data), Some("image/png"));

        // Unknown
        let unknown = vec![0x00, 0x00, 0x00, 0x00];
        assert_eq!(ImageData::detect_mime_type(&unknown), None);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(ImageData::extension_for("image/jpeg"), "jpg");
        assert_eq!(ImageData::extension_for("application/octet-stream"), "raw");
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            ImageData::content_hash(b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_ne!(
            ImageData::content_hash(b"abc"),
            ImageData::content_hash(b"abd")
        );
    }

    #[test]
    fn test_ref_counting() {
        let mut img = ImageData::new(
            7,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            10,
            10,
            StreamProps::default(),
            "hash",
            "out_images/7.png",
            "image/png",
        );
        assert!(img.equals(7));
        assert_eq!(img.ref_count, 1);
        img.add_ref();
        assert_eq!(img.ref_count, 2);
    }
}
