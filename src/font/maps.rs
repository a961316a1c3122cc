//! Font substitution table.
//!
//! Some documents carry fonts whose codes can't be mapped to Unicode from
//! the font alone (symbol fonts, custom encodings). The table supplies
//! per-font overrides: a family and style to report, an explicit
//! code-to-Unicode map, or a flag to ignore the font's text entirely.
//!
//! The table is loaded once per run and is read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Overrides for one font, keyed by its name without the subset tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontMapEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    /// Drop all text drawn with this font.
    #[serde(default)]
    pub ignore: bool,

    /// Character code to Unicode code point.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub glyphs: BTreeMap<u32, u32>,
}

impl FontMapEntry {
    pub fn remap(&self, code: u32) -> Option<u32> {
        self.glyphs.get(&code).copied()
    }
}

#[derive(Debug, Deserialize)]
struct FontMapFile {
    #[serde(default)]
    fonts: Vec<FontMapEntry>,
}

/// The loaded substitution table.
#[derive(Debug, Clone)]
pub struct DocFontMaps {
    entries: Vec<FontMapEntry>,
    subset_tag: Regex,
}

impl DocFontMaps {
    /// An empty table.
    pub fn new() -> Result<Self> {
        let subset_tag = Regex::new(r"^[A-Z]{6}\+")
            .map_err(|e| Error::FontEngineInit(format!("subset tag pattern: {}", e)))?;
        Ok(Self {
            entries: Vec::new(),
            subset_tag,
        })
    }

    /// Load the table from a JSON file. Any failure here is fatal for the
    /// run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            Error::FontEngineInit(format!("cannot read font map '{}': {}", path.display(), e))
        })?;
        Self::from_json(&json).map_err(|e| match e {
            Error::FontEngineInit(_) => e,
            other => Error::FontEngineInit(format!("font map '{}': {}", path.display(), other)),
        })
    }

    /// Parse a table from JSON: `{"fonts": [{"name": ..., ...}]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: FontMapFile = serde_json::from_str(json)?;
        let mut maps = Self::new()?;
        for entry in file.fonts {
            maps.add(entry)?;
        }
        log::debug!("loaded {} font map entries", maps.entries.len());
        Ok(maps)
    }

    /// Add an entry. Names are stored without a subset tag; a later entry
    /// for the same name replaces the earlier one.
    pub fn add(&mut self, mut entry: FontMapEntry) -> Result<()> {
        let name = self.strip_subset_tag(entry.name.trim()).to_string();
        if name.is_empty() {
            return Err(Error::InvalidFontMap("entry without a name".to_string()));
        }
        entry.name = name;

        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Name without its `ABCDEF+` subset tag.
    pub fn strip_subset_tag<'a>(&self, name: &'a str) -> &'a str {
        match self.subset_tag.find(name) {
            Some(m) => &name[m.end()..],
            None => name,
        }
    }

    pub fn is_subset_tagged(&self, name: &str) -> bool {
        self.subset_tag.is_match(name)
    }

    /// Find the overrides for a font name, ignoring any subset tag.
    pub fn check_font_map(&self, font_name: &str) -> Option<&FontMapEntry> {
        let name = self.strip_subset_tag(font_name);
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[FontMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for DocFontMaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "(no font substitutions configured)");
        }
        for entry in &self.entries {
            write!(f, "{}", entry.name)?;
            if let Some(family) = &entry.family {
                write!(f, " -> {}", family)?;
            }
            if entry.bold == Some(true) {
                write!(f, " [bold]")?;
            }
            if entry.italic == Some(true) {
                write!(f, " [italic]")?;
            }
            if entry.ignore {
                write!(f, " (ignored)")?;
            }
            if !entry.glyphs.is_empty() {
                write!(f, " ({} glyph mappings)", entry.glyphs.len())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
