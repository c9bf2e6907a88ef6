//! Text output buffer for PDF syntax listings
//!
//! Objects and content operators are rendered back into PDF syntax for
//! diagnostics. The buffer inserts a single space between adjacent tokens that
//! would otherwise run together and wraps long lines.

use super::byte_class::is_delimiter;

/// Soft line length before a break is inserted
const LINE_LENGTH: usize = 100;

#[derive(Debug, Clone)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    eol_marker: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            eol_marker: LINE_LENGTH,
        }
    }

    pub fn add(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn add_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Append a token, separated by a space if both sides are regular characters
    pub fn append_text(&mut self, text: &str) {
        self.append_token(text.as_bytes());
    }

    pub fn append_token(&mut self, token: &[u8]) {
        let Some(&first) = token.first() else {
            return;
        };
        if let Some(&last) = self.bytes.last() {
            if !is_delimiter(last) && !is_delimiter(first) {
                self.bytes.push(b' ');
            }
        }
        self.bytes.extend_from_slice(token);
    }

    /// Append a line of text followed by end of line
    pub fn append_message(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
        self.add_eol();
    }

    pub fn add_eol(&mut self) {
        self.bytes.push(b'\n');
        self.eol_marker = self.bytes.len() + LINE_LENGTH;
    }

    /// Break the line if it grew past the soft limit
    pub fn test_eol(&mut self) {
        if self.bytes.len() > self.eol_marker {
            self.add_eol();
        }
    }

    /// Same as `test_eol` inside a literal string: the break is escaped
    pub fn test_esc_eol(&mut self) {
        if self.bytes.len() > self.eol_marker {
            self.bytes.push(b'\\');
            self.add_eol();
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
