//! Integration tests for font resolution.

use std::collections::HashMap;

use pagemodel::font::{
    CodeRemap, DocFont, DocFontMaps, FontEngine, FontLocation, FontLocator, FontRef, FontType,
    StdEncoding,
};
use pagemodel::{DiagnosticKind, Diagnostics, Options, PageModel, TextMetrics, Transform};

#[derive(Default)]
struct Programs(HashMap<FontRef, FontLocation>);

impl Programs {
    fn type1(mut self, num: u32) -> Self {
        self.0.insert(
            FontRef::new(num, 0),
            FontLocation::Embedded(b"%!PS-AdobeFont-1.0".to_vec()),
        );
        self
    }
}

impl FontLocator for Programs {
    fn locate(&self, font: &FontRef) -> Option<FontLocation> {
        self.0.get(font).cloned()
    }
}

fn doc_font(num: u32, name: &str, font_type: FontType) -> DocFont {
    DocFont::new(FontRef::new(num, 0), name, font_type)
}

#[test]
fn test_fonts_cached_by_identity() {
    let maps = DocFontMaps::new().unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default().type1(1).type1(2);
    let mut diag = Diagnostics::new();

    let a = doc_font(1, "Times-Roman", FontType::Type1);
    let b = doc_font(2, "Times-Bold", FontType::Type1);

    assert!(engine.load_font(&a, &programs, &mut diag).is_some());
    assert!(engine.load_font(&b, &programs, &mut diag).is_some());
    assert!(engine.load_font(&a, &programs, &mut diag).is_some());
    assert_eq!(engine.len(), 2);
    assert_eq!(engine.current_font().map(|f| f.font_ref()), Some(FontRef::new(1, 0)));
    assert!(diag.is_empty());
}

#[test]
fn test_unsupported_and_missing_fonts_not_cached() {
    let maps = DocFontMaps::new().unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default();
    let mut diag = Diagnostics::new();

    assert!(engine
        .load_font(&doc_font(3, "Glyphs", FontType::Type3), &programs, &mut diag)
        .is_none());
    assert!(engine
        .load_font(&doc_font(4, "Mystery", FontType::Unknown), &programs, &mut diag)
        .is_none());
    assert!(engine
        .load_font(&doc_font(5, "Missing", FontType::TrueType), &programs, &mut diag)
        .is_none());

    assert!(engine.is_empty());
    assert_eq!(diag.count_of(DiagnosticKind::FontReadUnsupported), 2);
    assert_eq!(diag.count_of(DiagnosticKind::FontRead), 1);
    // Type3 is only a warning
    assert!(diag.errors_reported());
}

#[test]
fn test_code_mapping_order() {
    let maps = DocFontMaps::from_json(
        r#"{"fonts":[{"name":"Symbolic","glyphs":{"97":945}}]}"#,
    )
    .unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default().type1(1);
    let mut diag = Diagnostics::new();

    let mut font = doc_font(1, "ABCDEF+Symbolic", FontType::Type1);
    font.encoding = Some(StdEncoding::WinAnsi);
    engine.load_font(&font, &programs, &mut diag).unwrap();

    // table beats the interpreter's value
    assert_eq!(engine.get_code_unicode(97, &[97], &mut diag), CodeRemap::Remapped(945));
    // interpreter value next
    assert_eq!(engine.get_code_unicode(98, &[0x3b2], &mut diag), CodeRemap::Remapped(0x3b2));
    // then the standard encoding
    assert_eq!(engine.get_code_unicode(0x80, &[], &mut diag), CodeRemap::Remapped(0x20ac));
    assert!(!engine.has_font_warnings());
}

#[test]
fn test_unmapped_codes_raise_warnings() {
    let maps = DocFontMaps::new().unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default().type1(1).type1(2);
    let mut diag = Diagnostics::new();

    engine
        .load_font(&doc_font(1, "Custom", FontType::Type1), &programs, &mut diag)
        .unwrap();
    assert_eq!(engine.get_code_unicode(0x81, &[], &mut diag), CodeRemap::Error(0x81));
    assert!(engine.has_font_warnings());
    assert_eq!(diag.count_of(DiagnosticKind::FontMapping), 1);

    // switching fonts keeps the document flag
    engine
        .load_font(&doc_font(2, "Other", FontType::Type1), &programs, &mut diag)
        .unwrap();
    assert!(engine.has_font_warnings());
}

#[test]
fn test_no_active_font_maps_to_space() {
    let maps = DocFontMaps::new().unwrap();
    let mut engine = FontEngine::new(&maps);
    let mut diag = Diagnostics::new();
    assert_eq!(engine.get_code_unicode(65, &[65], &mut diag), CodeRemap::Error(0x20));
}

#[test]
fn test_ignored_font() {
    let maps = DocFontMaps::from_json(r#"{"fonts":[{"name":"Watermark","ignore":true}]}"#).unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default().type1(1);
    let mut diag = Diagnostics::new();

    engine
        .load_font(&doc_font(1, "XYZABC+Watermark", FontType::Type1), &programs, &mut diag)
        .unwrap();
    assert_eq!(engine.get_code_unicode(65, &[65], &mut diag), CodeRemap::Ignore);
}

#[test]
fn test_font_name_selection() {
    assert_eq!(
        FontEngine::select_font_name(String::new(), "Embedded".into()),
        "Embedded"
    );
    assert_eq!(
        FontEngine::select_font_name("Arial".into(), "ABCDEF+Arial".into()),
        "ABCDEF+Arial"
    );
    assert_eq!(
        FontEngine::select_font_name("Helvetica-Bo".into(), "Helvetica-Bold".into()),
        "Helvetica-Bold"
    );
    assert_eq!(
        FontEngine::select_font_name("Garamond".into(), "Other".into()),
        "Garamond"
    );
    assert_eq!(FontEngine::sanitize_font_name("My Font\u{7}"), "My-Font");
}

#[test]
fn test_equivalent_fonts_share_page_entry() {
    let maps = DocFontMaps::new().unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default().type1(1).type1(2);
    let options = Options::new("out.json").with_debug_info(true);
    let mut page = PageModel::new(&options, 0, 612.0, 792.0, 0);
    page.update_fill_color(0.0, 0.0, 0.0);

    let put = |page: &mut PageModel<'_>, x: f64| {
        page.new_character(
            x,
            50.0,
            5.0,
            0.0,
            Transform::identity(),
            TextMetrics::default(),
            'a' as u32,
            None,
            false,
        )
    };

    let f1 = engine
        .load_font(&doc_font(1, "AAAAAA+Arial-Bold", FontType::Type1), &programs, page.diagnostics_mut())
        .cloned()
        .unwrap();
    page.update_font(&f1, 10.0);
    assert!(put(&mut page, 10.0));

    let f2 = engine
        .load_font(&doc_font(2, "BBBBBB+Arial-Bold", FontType::Type1), &programs, page.diagnostics_mut())
        .cloned()
        .unwrap();
    page.update_font(&f2, 10.0);
    assert!(page.pending_font().is_none());
    assert!(put(&mut page, 15.0));

    assert_eq!(page.fonts().len(), 1);
    let pf = &page.fonts()[0];
    assert_eq!(pf.family(), "Arial");
    assert!(pf.is_bold());
    assert_eq!(pf.members().len(), 2);

    // debug mode reports fonts nothing could map
    page.finalize(&mut engine);
    assert!(page.diagnostics().errors_reported());
}

#[test]
fn test_pending_font_overwritten() {
    let maps = DocFontMaps::new().unwrap();
    let mut engine = FontEngine::new(&maps);
    let programs = Programs::default().type1(1).type1(2);
    let options = Options::new("out.json");
    let mut page = PageModel::new(&options, 0, 612.0, 792.0, 0);

    let f1 = engine
        .load_font(&doc_font(1, "Courier", FontType::Type1), &programs, page.diagnostics_mut())
        .cloned()
        .unwrap();
    page.update_font(&f1, 10.0);
    let f2 = engine
        .load_font(&doc_font(2, "Times-Italic", FontType::Type1), &programs, page.diagnostics_mut())
        .cloned()
        .unwrap();
    page.update_font(&f2, 10.0);

    let pending = page.pending_font().unwrap();
    assert_eq!(pending.family(), "Times");
    assert!(pending.is_italic());
    assert!(page.fonts().is_empty());
}
