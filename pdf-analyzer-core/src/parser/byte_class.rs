//! PDF character classes
//!
//! ISO 32000-1 Section 7.2.2 splits the byte range into white-space, delimiter
//! and regular characters. The table is built at compile time.

const WHITE_SPACE: u8 = 2;
const DELIMITER: u8 = 1;

/// Class bits per byte: bit 0 = delimiter, bit 1 = white space.
/// White-space bytes are delimiters too.
static CLASS: [u8; 256] = build_class_table();

const fn build_class_table() -> [u8; 256] {
    let mut table = [0u8; 256];

    // NUL, TAB, LF, FF, CR, SP
    let white = [0x00u8, 0x09, 0x0A, 0x0C, 0x0D, 0x20];
    let mut i = 0;
    while i < white.len() {
        table[white[i] as usize] = WHITE_SPACE | DELIMITER;
        i += 1;
    }

    let delimiters = *b"()<>[]{}/%";
    let mut i = 0;
    while i < delimiters.len() {
        table[delimiters[i] as usize] = DELIMITER;
        i += 1;
    }

    table
}

/// White space or one of `( ) < > [ ] { } / %`
#[inline]
pub fn is_delimiter(byte: u8) -> bool {
    CLASS[byte as usize] != 0
}

/// NUL, TAB, LF, FF, CR or SP
#[inline]
pub fn is_white_space(byte: u8) -> bool {
    CLASS[byte as usize] & WHITE_SPACE != 0
}

/// End-of-file counts as a delimiter for token termination.
#[inline]
pub fn is_delimiter_or_eof(byte: Option<u8>) -> bool {
    byte.map_or(true, is_delimiter)
}

#[inline]
pub fn is_white_space_opt(byte: Option<u8>) -> bool {
    byte.is_some_and(is_white_space)
}
