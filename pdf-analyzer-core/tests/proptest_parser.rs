//! Property-based tests for the lexer, filters and report formatting

mod common;

use common::{ascii85_encode, lzw_literals, png_up_encode, zlib};
use pdf_analyzer::parser::filter_impls::{
    adler32, decode_ascii85, decode_flate, decode_lzw, predictor::png_up,
};
use pdf_analyzer::parser::{
    parse_contents, Lexer, LexerMode, MemorySource, Operator, OutputBuffer, PdfArray,
    PdfDictionary, PdfName, PdfObject, PdfString,
};
use pdf_analyzer::reports::{byte_array_to_hex, byte_array_to_string};
use proptest::prelude::*;

fn pdf_value() -> impl Strategy<Value = PdfObject> {
    let leaf = prop_oneof![
        Just(PdfObject::Null),
        any::<bool>().prop_map(PdfObject::Boolean),
        any::<i32>().prop_map(PdfObject::Integer),
        (1u32..100_000).prop_map(PdfObject::Reference),
        "/[A-Za-z][A-Za-z0-9]{0,8}".prop_map(|n| PdfObject::Name(PdfName::new(n))),
        prop::collection::vec(any::<u8>(), 0..40)
            .prop_map(|b| PdfObject::String(PdfString::new(b))),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6)
                .prop_map(|items| PdfObject::Array(PdfArray(items))),
            prop::collection::vec(("[A-Za-z]{1,8}", inner), 0..6).prop_map(|entries| {
                let mut dict = PdfDictionary::new();
                for (key, value) in entries {
                    dict.insert(format!("/{key}"), value);
                }
                PdfObject::Dictionary(dict)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn test_written_values_parse_back(value in pdf_value()) {
        let mut out = OutputBuffer::new();
        value.write_pdf(&mut out);
        let source = MemorySource::new(out.into_bytes());
        let mut lexer = Lexer::new(source, LexerMode::Document).unwrap();

        prop_assert_eq!(lexer.parse_next_item().unwrap(), Some(value));
    }

    #[test]
    fn test_integer_operands(values in prop::collection::vec(-100_000i32..100_000, 4)) {
        let text = format!("{} {} {} {} re", values[0], values[1], values[2], values[3]);
        let operations = parse_contents(text.as_bytes()).unwrap();

        prop_assert_eq!(operations.len(), 1);
        prop_assert_eq!(operations[0].operator, Operator::Rectangle);
        let operands: Vec<PdfObject> = values.iter().map(|&v| PdfObject::Integer(v)).collect();
        prop_assert_eq!(&operations[0].operands, &operands);
    }

    #[test]
    fn test_hex_string_operand(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let text = format!("<{}> Tj", hex::encode(&bytes));
        let operations = parse_contents(text.as_bytes()).unwrap();

        prop_assert_eq!(operations.len(), 1);
        let string = operations[0].operands[0].as_string().unwrap();
        prop_assert_eq!(string.as_bytes(), &bytes[..]);
    }

    #[test]
    fn test_name_operand(name in "[A-Za-z][A-Za-z0-9]{0,20}") {
        let text = format!("/{name} 12 Tf");
        let operations = parse_contents(text.as_bytes()).unwrap();

        let operand = operations[0].operands[0].as_name().unwrap();
        prop_assert_eq!(operand.as_str(), format!("/{name}"));
    }

    #[test]
    fn test_flate_decodes_zlib_output(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(decode_flate(&zlib(&data)).unwrap(), data);
    }

    #[test]
    fn test_adler32_matches_zlib_trailer(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let compressed = zlib(&data);
        let trailer = &compressed[compressed.len() - 4..];
        prop_assert_eq!(&adler32(&data).to_be_bytes()[..], trailer);
    }

    #[test]
    fn test_adler32_matches_unreduced_sums(byte in any::<u8>(), len in 0usize..20_000) {
        let data = vec![byte; len];
        let mut low: u64 = 1;
        let mut high: u64 = 0;
        for &b in &data {
            low += u64::from(b);
            high += low;
        }
        let expected = (((high % 65521) << 16) | (low % 65521)) as u32;
        prop_assert_eq!(adler32(&data), expected);
    }

    #[test]
    fn test_ascii85_decodes_any_encoding(data in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(decode_ascii85(&ascii85_encode(&data)).unwrap(), data);
    }

    #[test]
    fn test_lzw_literal_codes(data in prop::collection::vec(any::<u8>(), 0..200)) {
        prop_assert_eq!(decode_lzw(&lzw_literals(&data)).unwrap(), data);
    }

    #[test]
    fn test_png_up_rows(columns in 1usize..12, rows in 1usize..20, seed in any::<u8>()) {
        let data: Vec<u8> = (0..columns * rows)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect();
        prop_assert_eq!(png_up(&png_up_encode(&data, columns), columns).unwrap(), data);
    }

    #[test]
    fn test_hex_dump_shape(data in prop::collection::vec(any::<u8>(), 0..200)) {
        let dump = byte_array_to_hex(&data);
        let lines: Vec<&str> = dump.split_terminator("\r\n").collect();

        prop_assert_eq!(lines.len(), data.len().div_ceil(16));
        for (index, line) in lines.iter().enumerate() {
            prop_assert_eq!(line.len(), 76);
            let offset = format!("{:08X}", index * 16);
            prop_assert!(line.starts_with(&offset));
        }
    }

    #[test]
    fn test_display_text_line_ends(data in prop::collection::vec(any::<u8>(), 0..200)) {
        let text = byte_array_to_string(&data);
        let bytes = text.as_bytes();

        for (index, &byte) in bytes.iter().enumerate() {
            if byte == b'\n' {
                prop_assert!(index > 0 && bytes[index - 1] == b'\r');
            }
            if byte == b'\r' {
                prop_assert_eq!(bytes.get(index + 1), Some(&b'\n'));
            }
        }
        prop_assert!(data.is_empty() || text.ends_with("\r\n"));
    }
}
