//! Content stream operators
//!
//! The 73 operator tokens of ISO 32000-1 Annex A. `F` is the obsolete spelling
//! of `f` and maps to the same operator.

/// Content stream operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Path construction and painting
    FillStrokeNonZeroRule,      // B
    FillStrokeEvenOddRule,      // B*
    CloseFillStrokeNonZeroRule, // b
    CloseFillStrokeEvenOddRule, // b*
    Bezier,                     // c
    ClosePath,                  // h
    LineTo,                     // l
    MoveTo,                     // m
    NoPaint,                    // n
    Rectangle,                  // re
    Stroke,                     // S
    CloseStroke,                // s
    FillNonZeroRule,            // f, F
    FillEvenOddRule,            // f*
    BezierNoP1,                 // v
    BezierNoP2,                 // y
    ClippingPathNonZeroRule,    // W
    ClippingPathEvenOddRule,    // W*

    // Marked content and compatibility
    BeginMarkedContentPropList,  // BDC
    BeginMarkedContent,          // BMC
    DefineMarkedContentPropList, // DP
    DefineMarkedContent,         // MP
    EndMarkedContent,            // EMC
    BeginCompatibility,          // BX
    EndCompatibility,            // EX

    // Inline images and external objects
    BeginInlineImage,     // BI
    BeginInlineImageData, // ID
    EndInlineImage,       // EI
    XObject,              // Do

    // Graphics state
    TransMatrix,                // cm
    LineDashPattern,            // d
    ParamFromGraphicsStateDict, // gs
    FlatnessTolerance,          // i
    LineJoinStyle,              // j
    LineCapStyle,               // J
    MiterLimit,                 // M
    SaveGraphicsState,          // q
    RestoreGraphicsState,       // Q
    ColorRenderingIntent,       // ri
    LineWidth,                  // w
    PaintAreaShadingPattern,    // sh

    // Type 3 fonts
    GlyphWidthType3,     // d0
    GlyphWidthBBoxType3, // d1

    // Color
    ColorSpaceForStroking,      // CS
    ColorSpaceForNonStroking,   // cs
    GrayLevelForStroking,       // G
    GrayLevelForNonStroking,    // g
    CmykColorForStroking,       // K
    CmykColorForNonStroking,    // k
    RgbColorForStroking,        // RG
    RgbColorForNonStroking,     // rg
    ColorForStroking,           // SC
    ColorForNonStroking,        // sc
    ColorForStrokingSpecial,    // SCN
    ColorForNonStrokingSpecial, // scn

    // Text
    BeginText,               // BT
    EndTextObject,           // ET
    MoveToStartOfNextLine,   // T*
    SetCharSpacing,          // Tc
    MoveTextPos,             // Td
    MoveTextPosSetLeading,   // TD
    SelectFontAndSize,       // Tf
    ShowText,                // Tj
    ShowTextWithGlyphPos,    // TJ
    TextLeading,             // TL
    TextMatrix,              // Tm
    TextRenderingMode,       // Tr
    TextRize,                // Ts
    TextWorkSpacing,         // Tw
    TextHorizontalScaling,   // Tz
    MoveToNextLineAndShow,   // '
    WordCharSpacingShowText, // "
}

/// Operator tokens in byte order
static OPERATOR_TABLE: [(&str, Operator); 73] = [
    ("\"", Operator::WordCharSpacingShowText),
    ("'", Operator::MoveToNextLineAndShow),
    ("B", Operator::FillStrokeNonZeroRule),
    ("B*", Operator::FillStrokeEvenOddRule),
    ("BDC", Operator::BeginMarkedContentPropList),
    ("BI", Operator::BeginInlineImage),
    ("BMC", Operator::BeginMarkedContent),
    ("BT", Operator::BeginText),
    ("BX", Operator::BeginCompatibility),
    ("CS", Operator::ColorSpaceForStroking),
    ("DP", Operator::DefineMarkedContentPropList),
    ("Do", Operator::XObject),
    ("EI", Operator::EndInlineImage),
    ("EMC", Operator::EndMarkedContent),
    ("ET", Operator::EndTextObject),
    ("EX", Operator::EndCompatibility),
    ("F", Operator::FillNonZeroRule),
    ("G", Operator::GrayLevelForStroking),
    ("ID", Operator::BeginInlineImageData),
    ("J", Operator::LineCapStyle),
    ("K", Operator::CmykColorForStroking),
    ("M", Operator::MiterLimit),
    ("MP", Operator::DefineMarkedContent),
    ("Q", Operator::RestoreGraphicsState),
    ("RG", Operator::RgbColorForStroking),
    ("S", Operator::Stroke),
    ("SC", Operator::ColorForStroking),
    ("SCN", Operator::ColorForStrokingSpecial),
    ("T*", Operator::MoveToStartOfNextLine),
    ("TD", Operator::MoveTextPosSetLeading),
    ("TJ", Operator::ShowTextWithGlyphPos),
    ("TL", Operator::TextLeading),
    ("Tc", Operator::SetCharSpacing),
    ("Td", Operator::MoveTextPos),
    ("Tf", Operator::SelectFontAndSize),
    ("Tj", Operator::ShowText),
    ("Tm", Operator::TextMatrix),
    ("Tr", Operator::TextRenderingMode),
    ("Ts", Operator::TextRize),
    ("Tw", Operator::TextWorkSpacing),
    ("Tz", Operator::TextHorizontalScaling),
    ("W", Operator::ClippingPathNonZeroRule),
    ("W*", Operator::ClippingPathEvenOddRule),
    ("b", Operator::CloseFillStrokeNonZeroRule),
    ("b*", Operator::CloseFillStrokeEvenOddRule),
    ("c", Operator::Bezier),
    ("cm", Operator::TransMatrix),
    ("cs", Operator::ColorSpaceForNonStroking),
    ("d", Operator::LineDashPattern),
    ("d0", Operator::GlyphWidthType3),
    ("d1", Operator::GlyphWidthBBoxType3),
    ("f", Operator::FillNonZeroRule),
    ("f*", Operator::FillEvenOddRule),
    ("g", Operator::GrayLevelForNonStroking),
    ("gs", Operator::ParamFromGraphicsStateDict),
    ("h", Operator::ClosePath),
    ("i", Operator::FlatnessTolerance),
    ("j", Operator::LineJoinStyle),
    ("k", Operator::CmykColorForNonStroking),
    ("l", Operator::LineTo),
    ("m", Operator::MoveTo),
    ("n", Operator::NoPaint),
    ("q", Operator::SaveGraphicsState),
    ("re", Operator::Rectangle),
    ("rg", Operator::RgbColorForNonStroking),
    ("ri", Operator::ColorRenderingIntent),
    ("s", Operator::CloseStroke),
    ("sc", Operator::ColorForNonStroking),
    ("scn", Operator::ColorForNonStrokingSpecial),
    ("sh", Operator::PaintAreaShadingPattern),
    ("v", Operator::BezierNoP1),
    ("w", Operator::LineWidth),
    ("y", Operator::BezierNoP2),
];

impl Operator {
    /// Find the operator for a token
    pub fn lookup(token: &str) -> Option<Operator> {
        OPERATOR_TABLE
            .binary_search_by(|(mnemonic, _)| mnemonic.as_bytes().cmp(token.as_bytes()))
            .ok()
            .map(|index| OPERATOR_TABLE[index].1)
    }

    /// Canonical token; `F` is written as `f`
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Operator::FillStrokeNonZeroRule => "B",
            Operator::FillStrokeEvenOddRule => "B*",
            Operator::CloseFillStrokeNonZeroRule => "b",
            Operator::CloseFillStrokeEvenOddRule => "b*",
            Operator::Bezier => "c",
            Operator::ClosePath => "h",
            Operator::LineTo => "l",
            Operator::MoveTo => "m",
            Operator::NoPaint => "n",
            Operator::Rectangle => "re",
            Operator::Stroke => "S",
            Operator::CloseStroke => "s",
            Operator::FillNonZeroRule => "f",
            Operator::FillEvenOddRule => "f*",
            Operator::BezierNoP1 => "v",
            Operator::BezierNoP2 => "y",
            Operator::ClippingPathNonZeroRule => "W",
            Operator::ClippingPathEvenOddRule => "W*",
            Operator::BeginMarkedContentPropList => "BDC",
            Operator::BeginMarkedContent => "BMC",
            Operator::DefineMarkedContentPropList => "DP",
            Operator::DefineMarkedContent => "MP",
            Operator::EndMarkedContent => "EMC",
            Operator::BeginCompatibility => "BX",
            Operator::EndCompatibility => "EX",
            Operator::BeginInlineImage => "BI",
            Operator::BeginInlineImageData => "ID",
            Operator::EndInlineImage => "EI",
            Operator::XObject => "Do",
            Operator::TransMatrix => "cm",
            Operator::LineDashPattern => "d",
            Operator::ParamFromGraphicsStateDict => "gs",
            Operator::FlatnessTolerance => "i",
            Operator::LineJoinStyle => "j",
            Operator::LineCapStyle => "J",
            Operator::MiterLimit => "M",
            Operator::SaveGraphicsState => "q",
            Operator::RestoreGraphicsState => "Q",
            Operator::ColorRenderingIntent => "ri",
            Operator::LineWidth => "w",
            Operator::PaintAreaShadingPattern => "sh",
            Operator::GlyphWidthType3 => "d0",
            Operator::GlyphWidthBBoxType3 => "d1",
            Operator::ColorSpaceForStroking => "CS",
            Operator::ColorSpaceForNonStroking => "cs",
            Operator::GrayLevelForStroking => "G",
            Operator::GrayLevelForNonStroking => "g",
            Operator::CmykColorForStroking => "K",
            Operator::CmykColorForNonStroking => "k",
            Operator::RgbColorForStroking => "RG",
            Operator::RgbColorForNonStroking => "rg",
            Operator::ColorForStroking => "SC",
            Operator::ColorForNonStroking => "sc",
            Operator::ColorForStrokingSpecial => "SCN",
            Operator::ColorForNonStrokingSpecial => "scn",
            Operator::BeginText => "BT",
            Operator::EndTextObject => "ET",
            Operator::MoveToStartOfNextLine => "T*",
            Operator::SetCharSpacing => "Tc",
            Operator::MoveTextPos => "Td",
            Operator::MoveTextPosSetLeading => "TD",
            Operator::SelectFontAndSize => "Tf",
            Operator::ShowText => "Tj",
            Operator::ShowTextWithGlyphPos => "TJ",
            Operator::TextLeading => "TL",
            Operator::TextMatrix => "Tm",
            Operator::TextRenderingMode => "Tr",
            Operator::TextRize => "Ts",
            Operator::TextWorkSpacing => "Tw",
            Operator::TextHorizontalScaling => "Tz",
            Operator::MoveToNextLineAndShow => "'",
            Operator::WordCharSpacingShowText => "\"",
        }
    }

    /// Variant name, used as the trailing comment in listings
    pub fn name(&self) -> String {
        format!("{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        for pair in OPERATOR_TABLE.windows(2) {
            assert!(
                pair[0].0.as_bytes() < pair[1].0.as_bytes(),
                "{:?} must sort before {:?}",
                pair[0].0,
                pair[1].0
            );
        }
    }

    #[test]
    fn test_every_entry_is_found() {
        for (mnemonic, op) in OPERATOR_TABLE.iter() {
            assert_eq!(Operator::lookup(mnemonic), Some(*op));
        }
    }

    #[test]
    fn test_mnemonic_round_trip() {
        for (mnemonic, op) in OPERATOR_TABLE.iter() {
            if *mnemonic == "F" {
                continue;
            }
            assert_eq!(op.mnemonic(), *mnemonic);
        }
    }

    #[test]
    fn test_alias_and_unknown() {
        assert_eq!(Operator::lookup("F"), Some(Operator::FillNonZeroRule));
        assert_eq!(Operator::FillNonZeroRule.mnemonic(), "f");
        assert_eq!(Operator::lookup("Tx"), None);
        assert_eq!(Operator::lookup(""), None);
        assert_eq!(Operator::lookup("BTX"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Operator::BeginText.name(), "BeginText");
        assert_eq!(Operator::TextRize.name(), "TextRize");
    }
}
