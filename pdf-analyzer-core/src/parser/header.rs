//! PDF file framing
//!
//! Validates the `%PDF-1.x` header (ISO 32000-1 Section 7.5.2) and locates the
//! `startxref` offset in front of the final `%%EOF` (Section 7.5.5).

use super::byte_class::is_white_space;
use super::source::ByteSource;
use super::{ParseError, ParseOptions, ParseResult};

/// Smallest file that can hold a header, a trailer and `%%EOF`
const MIN_FILE_SIZE: u64 = 32;

/// Bytes examined at each end of the file
const SCAN_WINDOW: u64 = 1024;

const SIGNATURE: &[u8] = b"%PDF-1.";

/// PDF Version information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Result of framing validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFrame {
    pub version: PdfVersion,
    /// Leading white space before `%PDF`. File offsets inside the document
    /// are relative to this position.
    pub start_position: u64,
    /// Offset of the newest cross-reference section, relative to `start_position`
    pub startxref: u64,
    /// Second line is a comment with at least four bytes above 127
    pub has_binary_marker: bool,
}

impl FileFrame {
    /// Validate the header and trailer of the whole input
    pub fn parse<S: ByteSource>(source: &mut S, options: &ParseOptions) -> ParseResult<Self> {
        let len = source.len();
        if len > options.max_file_size {
            return Err(ParseError::FileTooLarge {
                size: len,
                limit: options.max_file_size,
            });
        }
        if len < MIN_FILE_SIZE {
            return Err(ParseError::FileTooSmall(len));
        }

        source.set_position(0)?;
        let head = source.read_bytes(SCAN_WINDOW.min(len) as usize)?;
        let (version, start_position, has_binary_marker) = parse_header(&head)?;

        let tail_start = len - SCAN_WINDOW.min(len);
        source.set_position(tail_start)?;
        let tail = source.read_bytes((len - tail_start) as usize)?;
        let startxref = find_startxref(&tail)?;

        Ok(FileFrame {
            version,
            start_position: start_position as u64,
            startxref,
            has_binary_marker,
        })
    }
}

fn parse_header(head: &[u8]) -> ParseResult<(PdfVersion, usize, bool)> {
    let start = head
        .iter()
        .position(|&b| !is_white_space(b))
        .ok_or_else(|| ParseError::InvalidHeader("file starts with white space only".to_string()))?;

    let signature = &head[start..];
    let minor = match (signature.strip_prefix(SIGNATURE), signature.get(SIGNATURE.len())) {
        (Some(_), Some(&digit @ b'0'..=b'7')) => digit - b'0',
        _ => {
            return Err(ParseError::InvalidHeader(
                "bad signature: must be %PDF-1.x".to_string(),
            ))
        }
    };

    Ok((PdfVersion::new(1, minor), start, has_binary_marker(signature)))
}

fn has_binary_marker(signature: &[u8]) -> bool {
    let Some(eol) = signature.iter().position(|&b| b == b'\n' || b == b'\r') else {
        return false;
    };
    let rest = &signature[eol..];
    let Some(comment) = rest.iter().position(|&b| !is_white_space(b)) else {
        return false;
    };
    let line = &rest[comment..];
    if line.first() != Some(&b'%') {
        return false;
    }
    line.iter()
        .skip(1)
        .take_while(|&&b| b != b'\n' && b != b'\r')
        .filter(|&&b| b >= 128)
        .count()
        >= 4
}

/// Scan backwards for `EOL %%EOF`, tolerating trailing garbage, then read
/// the `startxref` offset in front of it.
fn find_startxref(tail: &[u8]) -> ParseResult<u64> {
    let missing_eof = || ParseError::InvalidTrailer("missing %%EOF at end of the file".to_string());

    let eof = tail
        .windows(6)
        .rposition(|w| matches!(w[0], b'\n' | b'\r') && &w[1..] == b"%%EOF")
        .ok_or_else(missing_eof)?;

    // Last byte in front of the end of line before %%EOF
    let mut ptr = eof;
    let mut back = || -> Option<u8> {
        ptr = ptr.checked_sub(1)?;
        Some(tail[ptr])
    };

    let mut ch = back();
    while ch.is_some_and(is_white_space) {
        ch = back();
    }

    let mut offset: u64 = 0;
    let mut power: u64 = 1;
    let mut digits = 0;
    while let Some(digit @ b'0'..=b'9') = ch {
        offset = offset.saturating_add(power.saturating_mul(u64::from(digit - b'0')));
        power = power.saturating_mul(10);
        digits += 1;
        ch = back();
    }
    if digits == 0 {
        return Err(ParseError::InvalidTrailer(
            "missing cross-reference offset after startxref".to_string(),
        ));
    }

    while ch.is_some_and(is_white_space) {
        ch = back();
    }
    let keyword_end = ptr + 1;
    if ch.is_none() || keyword_end < 9 || &tail[keyword_end - 9..keyword_end] != b"startxref" {
        return Err(ParseError::InvalidTrailer(
            "missing startxref at end of the file".to_string(),
        ));
    }

    Ok(offset)
}
