//! PDF Lexer
//!
//! Reads PDF objects according to ISO 32000-1 Sections 7.2 and 7.3. One byte
//! of lookahead is kept in `next`; every reader leaves it on the first byte
//! after the item it consumed. The same grammar serves the file body and
//! content streams, selected by [`LexerMode`].

use super::byte_class::{is_delimiter, is_delimiter_or_eof, is_white_space_opt};
use super::content::ContentOperation;
use super::objects::{Keyword, PdfArray, PdfDictionary, PdfName, PdfObject, PdfString};
use super::operators::Operator;
use super::source::ByteSource;
use super::{ParseError, ParseResult};

const DEFAULT_MAX_DEPTH: usize = 256;

/// What bare tokens mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerMode {
    /// File body: `N 0 R` references and document keywords
    Document,
    /// Content stream: bare tokens are operators
    Content,
}

/// PDF Lexer over any [`ByteSource`]
pub struct Lexer<S> {
    source: S,
    next: Option<u8>,
    mode: LexerMode,
    max_depth: usize,
    depth: usize,
    lenient: bool,
    tolerated_anomaly: bool,
}

impl<S: ByteSource> Lexer<S> {
    /// Create a lexer positioned on the first byte of `source`
    pub fn new(source: S, mode: LexerMode) -> ParseResult<Self> {
        let mut lexer = Self {
            source,
            next: None,
            mode,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            lenient: true,
            tolerated_anomaly: false,
        };
        lexer.read_first_char()?;
        Ok(lexer)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// In strict mode `stream` followed by a lone CR is an error
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    /// Lookahead byte, `None` at end of input
    pub fn next_char(&self) -> Option<u8> {
        self.next
    }

    /// Offset of the lookahead byte
    pub fn position(&self) -> u64 {
        self.source.position() - u64::from(self.next.is_some())
    }

    /// Offset of the byte after the lookahead; where raw stream data starts
    /// right after a `stream` keyword
    pub fn raw_position(&self) -> u64 {
        self.source.position()
    }

    pub fn len(&self) -> u64 {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Jump to `position` and load the lookahead byte
    pub fn set_position(&mut self, position: u64) -> ParseResult<()> {
        self.depth = 0;
        self.source.set_position(position)?;
        self.read_first_char()
    }

    pub fn read_first_char(&mut self) -> ParseResult<()> {
        self.next = self.source.read_byte()?;
        Ok(())
    }

    /// Raw bytes starting at `position`; fewer at end of input
    pub fn read_raw(&mut self, position: u64, count: usize) -> ParseResult<Vec<u8>> {
        self.source.set_position(position)?;
        let bytes = self.source.read_bytes(count)?;
        self.read_first_char()?;
        Ok(bytes)
    }

    /// Set when a known producer defect was tolerated; cleared by the call
    pub fn take_tolerated_anomaly(&mut self) -> bool {
        std::mem::take(&mut self.tolerated_anomaly)
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn read_char(&mut self) -> ParseResult<Option<u8>> {
        self.next = self.source.read_byte()?;
        Ok(self.next)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(self.position(), message)
    }

    pub fn skip_white_space(&mut self) -> ParseResult<()> {
        while is_white_space_opt(self.next) {
            self.read_char()?;
        }
        Ok(())
    }

    /// Skip white space and any number of `%` comments
    pub fn skip_comments(&mut self) -> ParseResult<()> {
        loop {
            self.skip_white_space()?;
            if self.next != Some(b'%') {
                return Ok(());
            }
            loop {
                match self.read_char()? {
                    None => return Ok(()),
                    Some(b'\n' | b'\r') => break,
                    Some(_) => {}
                }
            }
        }
    }

    /// Read from the source past white space without touching the lookahead
    fn read_past_white_space(&mut self) -> ParseResult<Option<u8>> {
        loop {
            let ch = self.source.read_byte()?;
            if !is_white_space_opt(ch) {
                return Ok(ch);
            }
        }
    }

    /// Parse an indirect object header `N 0 obj`. Returns the object number,
    /// or `None` when the input does not start with a valid header.
    pub fn parse_object_header(&mut self) -> ParseResult<Option<u32>> {
        self.skip_comments()?;
        let Some(first @ b'0'..=b'9') = self.next else {
            return Ok(None);
        };
        let token = self.read_token(first)?;
        let number = match token.parse::<i32>() {
            Ok(n) if n > 0 => n as u32,
            _ => return Ok(None),
        };

        if !is_white_space_opt(self.next) {
            return Ok(None);
        }
        self.next = self.read_past_white_space()?;
        if self.next != Some(b'0') {
            return Ok(None);
        }
        if !is_white_space_opt(self.read_char()?) {
            return Ok(None);
        }
        self.next = self.read_past_white_space()?;
        if self.next != Some(b'o')
            || self.source.read_byte()? != Some(b'b')
            || self.source.read_byte()? != Some(b'j')
        {
            return Ok(None);
        }
        if !is_delimiter_or_eof(self.read_char()?) {
            return Ok(None);
        }
        Ok(Some(number))
    }

    /// Parse the next object, keyword or operator. `None` at end of input.
    pub fn parse_next_item(&mut self) -> ParseResult<Option<PdfObject>> {
        self.skip_comments()?;
        let Some(first) = self.next else {
            return Ok(None);
        };

        match first {
            b'(' => return self.read_literal_string().map(Some),
            b'[' => return self.read_array().map(Some),
            b'<' => {
                match self.source.read_byte()? {
                    Some(b'<') => {
                        return self
                            .read_dictionary(false)
                            .map(|dict| Some(PdfObject::Dictionary(dict)))
                    }
                    Some(_) => self.source.step_back()?,
                    None => {}
                }
                return self.read_hex_string().map(Some);
            }
            _ => {}
        }

        let token = self.read_token(first)?;

        if token.starts_with('/') {
            if token.len() == 1 {
                return Err(self.error("Empty name token"));
            }
            return Ok(Some(PdfObject::Name(PdfName(token))));
        }

        if let Ok(value) = token.parse::<i32>() {
            if self.mode == LexerMode::Document && value > 0 && self.test_reference()? {
                return Ok(Some(PdfObject::Reference(value as u32)));
            }
            return Ok(Some(PdfObject::Integer(value)));
        }

        if let Some(value) = parse_real(&token) {
            if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
                return Ok(Some(PdfObject::Integer(value as i32)));
            }
            return Ok(Some(PdfObject::Real(value)));
        }

        match token.as_str() {
            "false" => return Ok(Some(PdfObject::Boolean(false))),
            "true" => return Ok(Some(PdfObject::Boolean(true))),
            "null" => return Ok(Some(PdfObject::Null)),
            _ => {}
        }

        match self.mode {
            LexerMode::Document => self.document_keyword(&token).map(Some),
            LexerMode::Content => self.content_operator(&token).map(Some),
        }
    }

    fn document_keyword(&mut self, token: &str) -> ParseResult<PdfObject> {
        let keyword = match token {
            "stream" => {
                self.check_stream_eol()?;
                Keyword::Stream
            }
            "endstream" => Keyword::EndStream,
            "endobj" => Keyword::EndObj,
            "xref" => Keyword::XRef,
            "n" => Keyword::N,
            "f" => Keyword::F,
            "trailer" => Keyword::Trailer,
            _ => return Err(self.error(format!("Unknown token: {token}"))),
        };
        Ok(PdfObject::Keyword(keyword))
    }

    /// `stream` must be followed by LF or CR LF
    fn check_stream_eol(&mut self) -> ParseResult<()> {
        match self.next {
            Some(b'\n') => Ok(()),
            Some(b'\r') => {
                match self.source.read_byte()? {
                    Some(b'\n') => return Ok(()),
                    Some(_) => self.source.step_back()?,
                    None => {}
                }
                if !self.lenient {
                    return Err(self.error("Stream keyword followed by CR without LF"));
                }
                tracing::debug!(
                    "Stream keyword at {} followed by CR without LF",
                    self.position()
                );
                self.tolerated_anomaly = true;
                Ok(())
            }
            _ => Err(self.error("Stream keyword must be followed by end of line")),
        }
    }

    fn content_operator(&mut self, token: &str) -> ParseResult<PdfObject> {
        match Operator::lookup(token) {
            None => Err(self.error(format!("Unknown contents operator: {token}"))),
            Some(Operator::BeginInlineImage) => self.read_inline_image(),
            Some(Operator::BeginInlineImageData | Operator::EndInlineImage) => {
                Err(self.error(format!("Unexpected token: {token}")))
            }
            Some(op) => Ok(PdfObject::Operator(ContentOperation::new(op))),
        }
    }

    /// Accumulate a regular token starting with the lookahead byte
    fn read_token(&mut self, first: u8) -> ParseResult<String> {
        let mut token = String::new();
        token.push(first as char);
        while let Some(ch) = self.read_char()? {
            if is_delimiter(ch) {
                break;
            }
            token.push(ch as char);
        }
        Ok(token)
    }

    /// After a positive integer, look for `0 R`. On failure the source is
    /// restored and the lookahead is unchanged.
    fn test_reference(&mut self) -> ParseResult<bool> {
        let saved = self.source.position();

        let found = 'probe: {
            if !is_white_space_opt(self.next) {
                break 'probe None;
            }
            if self.read_past_white_space()? != Some(b'0') {
                break 'probe None;
            }
            if !is_white_space_opt(self.source.read_byte()?) {
                break 'probe None;
            }
            if self.read_past_white_space()? != Some(b'R') {
                break 'probe None;
            }
            let after = self.source.read_byte()?;
            if !is_delimiter_or_eof(after) {
                break 'probe None;
            }
            Some(after)
        };

        match found {
            Some(after) => {
                self.next = after;
                Ok(true)
            }
            None => {
                self.source.set_position(saved)?;
                Ok(false)
            }
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn read_literal_string(&mut self) -> ParseResult<PdfObject> {
        let mut bytes = Vec::new();
        let mut level = 0usize;
        let mut escape = false;

        loop {
            let Some(ch) = self.read_char()? else {
                return Err(self.error("Invalid string (end of input)"));
            };

            if escape {
                escape = false;
                let byte = match ch {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'b' => 0x08,
                    b'f' => 0x0C,
                    b'\n' => continue,
                    b'\r' => {
                        match self.source.read_byte()? {
                            Some(b'\n') => {}
                            Some(_) => self.source.step_back()?,
                            None => return Err(self.error("Invalid string (end of input)")),
                        }
                        continue;
                    }
                    b'0'..=b'7' => self.read_octal(ch)?,
                    other => other,
                };
                bytes.push(byte);
                continue;
            }

            match ch {
                b'\\' => {
                    escape = true;
                    continue;
                }
                b'(' => level += 1,
                b')' => {
                    if level == 0 {
                        break;
                    }
                    level -= 1;
                }
                _ => {}
            }
            bytes.push(ch);
        }

        self.read_char()?;
        Ok(PdfObject::String(PdfString(bytes)))
    }

    /// Up to three octal digits; the value is taken modulo 256
    fn read_octal(&mut self, first: u8) -> ParseResult<u8> {
        let mut value = u32::from(first - b'0');
        for _ in 0..2 {
            match self.source.read_byte()? {
                Some(digit @ b'0'..=b'7') => value = (value << 3) + u32::from(digit - b'0'),
                Some(_) => {
                    self.source.step_back()?;
                    return Ok(value as u8);
                }
                None => return Err(self.error("Invalid string (end of input)")),
            }
        }
        Ok((value & 0xFF) as u8)
    }

    fn read_hex_string(&mut self) -> ParseResult<PdfObject> {
        let mut bytes = Vec::new();
        let mut high: Option<u8> = None;

        loop {
            let Some(ch) = self.read_char()? else {
                return Err(self.error("Invalid hex string (end of input)"));
            };
            if ch == b'>' {
                break;
            }
            if is_white_space_opt(Some(ch)) {
                continue;
            }
            let nibble = match ch {
                b'0'..=b'9' => ch - b'0',
                b'A'..=b'F' => ch - b'A' + 10,
                b'a'..=b'f' => ch - b'a' + 10,
                _ => return Err(self.error("Invalid hex string")),
            };
            match high.take() {
                Some(h) => bytes.push((h << 4) | nibble),
                None => high = Some(nibble),
            }
        }
        if let Some(h) = high {
            bytes.push(h << 4);
        }

        self.read_char()?;
        Ok(PdfObject::String(PdfString(bytes)))
    }

    fn read_array(&mut self) -> ParseResult<PdfObject> {
        self.enter()?;
        let mut items = Vec::new();
        self.read_char()?;

        loop {
            self.skip_comments()?;
            match self.next {
                None => return Err(self.error("Invalid array (end of input)")),
                Some(b']') => break,
                Some(_) => {}
            }
            let item = self
                .parse_next_item()?
                .ok_or_else(|| self.error("Invalid array (end of input)"))?;
            items.push(item);
        }

        self.read_char()?;
        self.leave();
        Ok(PdfObject::Array(PdfArray(items)))
    }

    /// Dictionary body after `<<`. Inline image dictionaries end at `ID`.
    fn read_dictionary(&mut self, inline_image: bool) -> ParseResult<PdfDictionary> {
        self.enter()?;
        let mut dict = PdfDictionary::new();
        self.read_char()?;

        loop {
            self.skip_comments()?;
            let Some(ch) = self.next else {
                return Err(self.error("Invalid dictionary (end of input)"));
            };

            if ch != b'/' {
                let closing = if inline_image {
                    ch == b'I' && self.source.read_byte()? == Some(b'D')
                } else {
                    ch == b'>' && self.source.read_byte()? == Some(b'>')
                };
                if closing {
                    break;
                }
                return Err(self.error("Invalid dictionary (name entry must have /)"));
            }

            let key = self.read_token(ch)?;
            let value = self
                .parse_next_item()?
                .ok_or_else(|| self.error("Invalid dictionary (end of input)"))?;
            dict.insert(key, value);
        }

        self.read_char()?;
        self.leave();
        Ok(dict)
    }

    /// `BI <dict> ID <data> EI`. Only unfiltered images can be delimited.
    fn read_inline_image(&mut self) -> ParseResult<PdfObject> {
        let dict = self.read_dictionary(true)?;

        let entry = |short: &str, long: &str| dict.get(short).or_else(|| dict.get(long));

        let width = entry("/W", "/Width")
            .and_then(PdfObject::as_integer)
            .filter(|w| *w > 0)
            .ok_or_else(|| self.error("Parse inline image: width error"))?;
        let height = entry("/H", "/Height")
            .and_then(PdfObject::as_integer)
            .filter(|h| *h > 0)
            .ok_or_else(|| self.error("Parse inline image: height error"))?;
        let bits = entry("/BPC", "/BitsPerComponent")
            .and_then(PdfObject::as_integer)
            .filter(|b| matches!(b, 1 | 2 | 4 | 8))
            .ok_or_else(|| self.error("Parse inline image: bits per component error"))?;

        let mut components = match entry("/CS", "/ColorSpace") {
            None => 0,
            Some(cs) => match cs.as_name().map(PdfName::as_str) {
                Some("/G" | "/DeviceGray") => 1,
                Some("/RGB" | "/DeviceRGB") => 3,
                Some("/CMYK" | "/DeviceCMYK") => 4,
                _ => return Err(self.error("Parse inline image: color space error")),
            },
        };
        if entry("/IM", "/ImageMask").and_then(PdfObject::as_bool) == Some(true) {
            components = 1;
        }
        if components == 0 {
            return Err(self.error("Parse inline image: color space is missing"));
        }
        if entry("/F", "/Filter").is_some() {
            return Err(self.error("Parse inline image: filters are not supported"));
        }
        if !is_white_space_opt(self.next) {
            return Err(self.error("Parse inline image: ID must be followed by white space"));
        }

        let row_bytes = (width as u64 * bits as u64 * components + 7) / 8;
        let size = row_bytes * height as u64;
        if size > self.source.len() {
            return Err(self.error("Invalid inline image (end of input)"));
        }
        let data = self.source.read_bytes(size as usize)?;
        if (data.len() as u64) < size {
            return Err(self.error("Invalid inline image (end of input)"));
        }

        self.read_char()?;
        self.skip_white_space()?;
        if self.next != Some(b'E') || self.source.read_byte()? != Some(b'I') {
            return Err(self.error("Parse inline image: EI is missing"));
        }
        self.read_char()?;

        Ok(PdfObject::Operator(ContentOperation::with_operands(
            Operator::BeginInlineImage,
            vec![PdfObject::Dictionary(dict), PdfObject::String(PdfString(data))],
        )))
    }
}

/// Decimal number with an optional sign and at most one period. Exponents are
/// not PDF syntax.
fn parse_real(token: &str) -> Option<f64> {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    let mut seen_digit = false;
    let mut seen_point = false;
    for ch in digits.chars() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    token.parse::<f64>().ok()
}
