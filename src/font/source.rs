//! Font programs: where they come from and whether they can be read.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::doc_font::{FontRef, FontType};

/// Where a font's program lives.
#[derive(Debug, Clone, PartialEq)]
pub enum FontLocation {
    /// Program bytes embedded in the document.
    Embedded(Vec<u8>),
    /// A system font file substituted for a non-embedded font.
    External(PathBuf),
}

/// Locates font programs for the content interpreter's font identities.
pub trait FontLocator {
    /// Returns `None` if the font can't be located at all.
    fn locate(&self, font: &FontRef) -> Option<FontLocation>;
}

/// A validated font program.
#[derive(Debug, Clone)]
pub struct FontSource {
    font_ref: FontRef,
    font_type: FontType,
    name: String,
    data: Vec<u8>,
    path: Option<PathBuf>,
    family: Option<String>,
}

impl FontSource {
    /// Build a source from embedded program bytes.
    pub fn from_buffer(
        font_ref: FontRef,
        font_type: FontType,
        name: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Self> {
        let name = name.into();
        let family = validate(font_type, &name, &data)?;
        Ok(Self {
            font_ref,
            font_type,
            name,
            data,
            path: None,
            family,
        })
    }

    /// Build a source from a font file on disk.
    pub fn from_file(
        font_ref: FontRef,
        font_type: FontType,
        name: impl Into<String>,
        path: &Path,
    ) -> Result<Self> {
        let name = name.into();
        let data = fs::read(path).map_err(|e| Error::InvalidFontSource {
            name: name.clone(),
            reason: format!("cannot read '{}': {}", path.display(), e),
        })?;
        let mut source = Self::from_buffer(font_ref, font_type, name, data)?;
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    pub fn font_ref(&self) -> FontRef {
        self.font_ref
    }

    pub fn font_type(&self) -> FontType {
        self.font_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_embedded(&self) -> bool {
        self.path.is_none()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Family name stored in the program's name table (TrueType and
    /// OpenType only).
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

/// Check that `data` looks like a program of the given technology.
/// Returns the family name recorded in the program when there is one.
fn validate(font_type: FontType, name: &str, data: &[u8]) -> Result<Option<String>> {
    let invalid = |reason: &str| Error::InvalidFontSource {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if data.is_empty() {
        return Err(invalid("empty font program"));
    }

    match font_type {
        FontType::TrueType | FontType::OpenType | FontType::CidTrueType => {
            let face = ttf_parser::Face::parse(data, 0)
                .map_err(|e| invalid(&format!("not a valid sfnt font: {}", e)))?;
            Ok(face
                .names()
                .into_iter()
                .find(|n| n.name_id == ttf_parser::name_id::FAMILY)
                .and_then(|n| n.to_string()))
        }
        FontType::Type1C | FontType::CidType0C => {
            // bare CFF: header major version is 1
            if data[0] != 1 {
                return Err(invalid("not a CFF font program"));
            }
            Ok(None)
        }
        FontType::Type1 | FontType::CidType0 => {
            if data.starts_with(b"%!") || data.starts_with(&[0x80, 0x01]) {
                Ok(None)
            } else {
                Err(invalid("not a Type 1 font program"))
            }
        }
        FontType::Type3 | FontType::Unknown => Err(invalid("unsupported font technology")),
    }
}
