//! Fonts as reported by the content interpreter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a font resource within a document (its object
/// reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontRef {
    pub num: u32,
    #[serde(default)]
    pub gen: u16,
}

impl FontRef {
    pub fn new(num: u32, gen: u16) -> Self {
        Self { num, gen }
    }
}

impl fmt::Display for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.num, self.gen)
    }
}

/// Font technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontType {
    Type1,
    #[serde(rename = "type1c")]
    Type1C,
    Type3,
    TrueType,
    OpenType,
    CidType0,
    #[serde(rename = "cid_type0c")]
    CidType0C,
    CidTrueType,
    Unknown,
}

impl FontType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontType::Type1 => "Type1",
            FontType::Type1C => "Type1C",
            FontType::Type3 => "Type3",
            FontType::TrueType => "TrueType",
            FontType::OpenType => "OpenType",
            FontType::CidType0 => "CIDType0",
            FontType::CidType0C => "CIDType0C",
            FontType::CidTrueType => "CIDTrueType",
            FontType::Unknown => "Unknown",
        }
    }

    pub fn is_cid(&self) -> bool {
        matches!(
            self,
            FontType::CidType0 | FontType::CidType0C | FontType::CidTrueType
        )
    }
}

impl fmt::Display for FontType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in simple font encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StdEncoding {
    #[serde(rename = "StandardEncoding")]
    Standard,
    #[serde(rename = "WinAnsiEncoding")]
    WinAnsi,
    #[serde(rename = "MacRomanEncoding")]
    MacRoman,
}

/// WinAnsi codes 0x80..=0x9F. Zero marks an undefined code.
const WIN_ANSI_HIGH: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

impl StdEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            StdEncoding::Standard => "StandardEncoding",
            StdEncoding::WinAnsi => "WinAnsiEncoding",
            StdEncoding::MacRoman => "MacRomanEncoding",
        }
    }

    /// Unicode value of a single-byte code, if the encoding defines one.
    /// Only the printable ASCII range is shared by all three encodings.
    pub fn decode(&self, code: u32) -> Option<u32> {
        if code >= 256 {
            return None;
        }
        match (self, code) {
            (StdEncoding::Standard, 0x27) => Some(0x2019),
            (StdEncoding::Standard, 0x60) => Some(0x2018),
            (_, 0x20..=0x7E) => Some(code),
            (StdEncoding::WinAnsi, 0x80..=0x9F) => {
                match WIN_ANSI_HIGH[(code - 0x80) as usize] {
                    0 => None,
                    u => Some(u32::from(u)),
                }
            }
            (StdEncoding::WinAnsi, 0xA0..=0xFF) => Some(code),
            _ => None,
        }
    }
}

/// Font metadata reported by the interpreter alongside its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocFont {
    pub id: FontRef,

    /// Name from the font dictionary, possibly subset-tagged
    #[serde(default)]
    pub name: String,

    /// Name stored inside the embedded font program
    #[serde(default)]
    pub embedded_name: String,

    pub font_type: FontType,

    #[serde(default)]
    pub family: Option<String>,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    /// Whether the font dictionary carries a ToUnicode CMap
    #[serde(default)]
    pub has_to_unicode: bool,

    #[serde(default)]
    pub encoding: Option<StdEncoding>,
}

impl DocFont {
    pub fn new(id: FontRef, name: impl Into<String>, font_type: FontType) -> Self {
        Self {
            id,
            name: name.into(),
            embedded_name: String::new(),
            font_type,
            family: None,
            bold: false,
            italic: false,
            has_to_unicode: false,
            encoding: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_ref_display() {
        assert_eq!(FontRef::new(12, 0).to_string(), "12 0 R");
    }

    #[test]
    fn test_win_ansi_decode() {
        let enc = StdEncoding::WinAnsi;
        assert_eq!(enc.decode(0x41), Some(0x41));
        assert_eq!(enc.decode(0x80), Some(0x20AC));
        assert_eq!(enc.decode(0x81), None);
        assert_eq!(enc.decode(0xE9), Some(0xE9));
        assert_eq!(enc.decode(0x141), None);
    }

    #[test]
    fn test_standard_quotes() {
        assert_eq!(StdEncoding::Standard.decode(0x27), Some(0x2019));
        assert_eq!(StdEncoding::Standard.decode(0xE9), None);
        assert_eq!(StdEncoding::MacRoman.decode(0x27), Some(0x27));
    }

    #[test]
    fn test_deserialize_doc_font() {
        let json = r#"{"id":{"num":5},"name":"ABCDEF+Arial","font_type":"true_type","encoding":"WinAnsiEncoding"}"#;
        let font: DocFont = serde_json::from_str(json).unwrap();
        assert_eq!(font.id, FontRef::new(5, 0));
        assert_eq!(font.font_type, FontType::TrueType);
        assert_eq!(font.encoding, Some(StdEncoding::WinAnsi));
        assert!(!font.bold);
    }
}
