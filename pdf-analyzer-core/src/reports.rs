//! Text reports over an opened document
//!
//! Plain text renderings used by the command line tool: the file summary,
//! single object summaries, content stream listings and hex dumps.

use crate::encryption::{DecryptionStatus, EncryptionType};
use crate::error::{PdfError, Result};
use crate::parser::{ByteSource, ContentOperation, IndirectObject, OutputBuffer, PdfReader};

/// Summary record of a document
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DocumentInfo {
    pub file_name: String,
    pub version: String,
    pub object_count: usize,
    pub page_count: i32,
    pub decryption_status: DecryptionStatus,
    pub encryption_type: Option<EncryptionType>,
    pub permissions: Vec<&'static str>,
    pub invalid_file: bool,
    pub unsupported_page_tree: bool,
    pub warnings: Vec<String>,
}

impl DocumentInfo {
    pub fn from_reader<S: ByteSource>(reader: &PdfReader<S>, file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            version: reader.version().to_string(),
            object_count: reader.object_count(),
            page_count: reader.page_count(),
            decryption_status: reader.decryption_status(),
            encryption_type: reader.encryption_type(),
            permissions: reader.permissions().describe(),
            invalid_file: reader.is_invalid_file(),
            unsupported_page_tree: reader.has_unsupported_page_tree(),
            warnings: reader.warnings().to_vec(),
        }
    }
}

/// Bytes as display text: every line break becomes CRLF, control characters
/// and bytes 127-159 become `.`, and non-empty output ends with CRLF.
pub fn byte_array_to_string(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() + bytes.len() / 16);
    let mut last = 0u8;
    for &byte in bytes {
        match byte {
            b'\n' if last == b'\r' => {}
            b'\n' | b'\r' => text.push_str("\r\n"),
            0..=31 | 127..=159 => text.push('.'),
            _ => text.push(char::from(byte)),
        }
        last = byte;
    }
    if !text.is_empty() && !text.ends_with('\n') {
        text.push_str("\r\n");
    }
    text
}

/// Hex dump, 16 bytes per line: offset, two groups of eight bytes, then the
/// printable characters
pub fn byte_array_to_hex(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() / 16 * 78 + 78);
    for (line, chunk) in bytes.chunks(16).enumerate() {
        text.push_str(&format!("{:08X}  ", line * 16));
        for index in 0..16 {
            if index == 8 {
                text.push(' ');
            }
            match chunk.get(index) {
                Some(byte) => text.push_str(&format!("{byte:02X}")),
                None => text.push_str("  "),
            }
            text.push(' ');
        }
        text.push(' ');
        for index in 0..16 {
            text.push(match chunk.get(index) {
                Some(&byte) if (b' '..=b'~').contains(&byte) => char::from(byte),
                Some(_) => '.',
                None => ' ',
            });
        }
        text.push_str("\r\n");
    }
    text
}

/// Trailer and every object of the document
pub fn pdf_file_summary<S: ByteSource>(reader: &PdfReader<S>, file_name: &str) -> String {
    let mut out = OutputBuffer::new();
    out.append_message(&format!("PDF file name: {file_name}"));
    out.add_eol();
    out.append_message("Trailer Dictionary");
    out.append_message("------------------");
    if let Some(trailer) = reader.trailer() {
        trailer.write_to(&mut out);
    }
    out.add_eol();
    out.add_eol();
    out.append_message("Indirect Objects");
    out.append_message("----------------");
    for object in reader.objects() {
        object.write_summary(&mut out);
    }
    byte_array_to_string(out.as_bytes())
}

pub fn object_summary(object: &IndirectObject) -> String {
    let mut out = OutputBuffer::new();
    object.write_summary(&mut out);
    byte_array_to_string(out.as_bytes())
}

/// Summary of object `number`
pub fn object_report<S: ByteSource>(reader: &PdfReader<S>, number: u32) -> Result<String> {
    reader
        .object(number)
        .map(object_summary)
        .ok_or(PdfError::InvalidObjectReference(number))
}

/// Annotated operator listing: operands, mnemonic, `% OperatorName`
pub fn contents_to_text(operations: &[ContentOperation]) -> Vec<u8> {
    let mut out = OutputBuffer::new();
    for operation in operations {
        operation.write_to(&mut out);
    }
    out.into_bytes()
}

/// Operator listing of page `index`
pub fn page_listing<S: ByteSource>(reader: &mut PdfReader<S>, index: usize) -> Result<String> {
    if !reader.is_active() {
        return Err(PdfError::Locked(reader.decryption_status()));
    }
    if reader.pages().map_or(true, |pages| index >= pages.len()) {
        return Err(PdfError::InvalidPageNumber(index));
    }
    let operations = reader.page_operations(index)?;
    Ok(byte_array_to_string(&contents_to_text(&operations)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Operator, PdfObject};

    #[test]
    fn test_line_breaks_become_crlf() {
        assert_eq!(byte_array_to_string(b"a\nb\rc\r\nd"), "a\r\nb\r\nc\r\nd\r\n");
        assert_eq!(byte_array_to_string(b"line\r\n"), "line\r\n");
        assert_eq!(byte_array_to_string(b""), "");
    }

    #[test]
    fn test_control_bytes_become_dots() {
        assert_eq!(byte_array_to_string(b"\x00\tA\x7F\x9F"), "..A..\r\n");
        assert_eq!(byte_array_to_string(&[0xE9]), "\u{e9}\r\n");
    }

    #[test]
    fn test_hex_full_line() {
        let dump = byte_array_to_hex(b"0123456789ABCDEF");
        assert_eq!(
            dump,
            "00000000  30 31 32 33 34 35 36 37  38 39 41 42 43 44 45 46  0123456789ABCDEF\r\n"
        );
    }

    #[test]
    fn test_hex_partial_line() {
        let data: Vec<u8> = (0u8..18).collect();
        let dump = byte_array_to_hex(&data);
        let lines: Vec<&str> = dump.split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(lines[1].len(), 76);
        assert!(lines[1].starts_with("00000010  10 11 "));
        assert_eq!(&lines[1][16..60], " ".repeat(44));
        assert_eq!(&lines[1][60..], format!("..{}", " ".repeat(14)));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_contents_listing() {
        let operations = vec![
            ContentOperation::new(Operator::SaveGraphicsState),
            ContentOperation::with_operands(
                Operator::LineWidth,
                vec![PdfObject::Real(0.5)],
            ),
        ];
        let text = String::from_utf8(contents_to_text(&operations)).unwrap();
        assert_eq!(text, "q % SaveGraphicsState\n0.5 w % LineWidth\n");
    }
}
