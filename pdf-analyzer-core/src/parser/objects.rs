//! PDF Object Model
//!
//! Values produced by the lexer according to ISO 32000-1 Section 7.3. Names
//! keep their leading `/`. Dictionaries are kept sorted by key so lookups are
//! binary searches and a repeated key replaces the earlier value.

use super::content::ContentOperation;
use super::output::OutputBuffer;

/// PDF Name object, stored with its leading `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdfName(pub String);

/// PDF String object (raw bytes, before or after decryption)
#[derive(Debug, Clone, PartialEq)]
pub struct PdfString(pub Vec<u8>);

/// PDF Array object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfObject>);

/// PDF Dictionary object, sorted by key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(Vec<(PdfName, PdfObject)>);

/// Document-level keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Stream,
    EndStream,
    EndObj,
    XRef,
    Trailer,
    /// In-use xref table entry
    N,
    /// Free xref table entry
    F,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Stream => "stream",
            Keyword::EndStream => "endstream",
            Keyword::EndObj => "endobj",
            Keyword::XRef => "xref",
            Keyword::Trailer => "trailer",
            Keyword::N => "n",
            Keyword::F => "f",
        }
    }
}

/// PDF Object types
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    Name(PdfName),
    String(PdfString),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    /// Indirect reference; the generation is always 0
    Reference(u32),
    Keyword(Keyword),
    /// Content stream operator with its operands
    Operator(ContentOperation),
}

/// How strings are rendered by [`PdfObject::write_to`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStyle {
    /// Readable listing: `\xHH` for unprintable bytes, hex form for binary data
    Display,
    /// Valid PDF syntax that parses back to the same bytes
    File,
}

impl PdfObject {
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integer or real as f64
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfObject::Integer(i) => Some(*i as f64),
            PdfObject::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&PdfName> {
        match self {
            PdfObject::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<u32> {
        match self {
            PdfObject::Reference(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        match self {
            PdfObject::Keyword(k) => Some(*k),
            _ => None,
        }
    }

    pub fn as_operator(&self) -> Option<&ContentOperation> {
        match self {
            PdfObject::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Value type name used in object summaries
    pub fn type_name(&self) -> &'static str {
        match self {
            PdfObject::Null => "Null",
            PdfObject::Boolean(_) => "Boolean",
            PdfObject::Integer(_) => "Integer",
            PdfObject::Real(_) => "Real",
            PdfObject::Name(_) => "Name",
            PdfObject::String(_) => "PDFString",
            PdfObject::Array(_) => "Array",
            PdfObject::Dictionary(_) => "Dictionary",
            PdfObject::Reference(_) => "Reference",
            PdfObject::Keyword(_) => "Keyword",
            PdfObject::Operator(_) => "Operator",
        }
    }

    /// Render in the readable listing style
    pub fn write_to(&self, out: &mut OutputBuffer) {
        self.write_styled(out, StringStyle::Display);
    }

    /// Render as PDF syntax that the lexer reads back unchanged
    pub fn write_pdf(&self, out: &mut OutputBuffer) {
        self.write_styled(out, StringStyle::File);
    }

    pub fn write_styled(&self, out: &mut OutputBuffer, style: StringStyle) {
        out.test_eol();
        match self {
            PdfObject::Dictionary(dict) => dict.write_styled(out, style),
            PdfObject::Array(array) => {
                out.add(b'[');
                for item in &array.0 {
                    item.write_styled(out, style);
                }
                out.add(b']');
            }
            PdfObject::String(s) => match style {
                StringStyle::Display => s.write_display(out),
                StringStyle::File => s.write_literal(out),
            },
            PdfObject::Operator(op) => op.write_to(out),
            PdfObject::Null => out.append_text("null"),
            PdfObject::Boolean(b) => out.append_text(if *b { "true" } else { "false" }),
            PdfObject::Integer(i) => out.append_text(&i.to_string()),
            PdfObject::Real(r) => out.append_text(&format_real(*r)),
            PdfObject::Name(n) => out.append_token(&n.to_bytes()),
            PdfObject::Reference(n) => out.append_text(&format!("{n} 0 R")),
            PdfObject::Keyword(k) => out.append_text(k.as_str()),
        }
    }

    /// Decrypt every string in this value in place. A failing string keeps its
    /// bytes; the number of such failures is returned.
    pub(crate) fn decrypt_strings<F, E>(&mut self, decrypt: &mut F) -> usize
    where
        F: FnMut(&[u8]) -> Result<Vec<u8>, E>,
    {
        match self {
            PdfObject::Dictionary(dict) => dict.decrypt_strings(decrypt),
            PdfObject::Array(array) => array
                .0
                .iter_mut()
                .map(|item| item.decrypt_strings(decrypt))
                .sum(),
            PdfObject::String(s) => match decrypt(&s.0) {
                Ok(plain) => {
                    s.0 = plain;
                    0
                }
                Err(_) => 1,
            },
            _ => 0,
        }
    }
}

/// Real numbers print with a period, in single precision, and tiny values as 0
pub fn format_real(value: f64) -> String {
    if value.abs() < 0.0001 {
        return "0".to_string();
    }
    let single = value as f32;
    if single.fract() == 0.0 && single.abs() < 1e9 {
        return format!("{}", single as i64);
    }
    format!("{single}")
}

impl PdfName {
    /// Create a name; a missing leading `/` is added
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('/') {
            PdfName(name)
        } else {
            PdfName(format!("/{name}"))
        }
    }

    /// Name including the leading `/`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the leading `/`
    pub fn bare(&self) -> &str {
        self.0.strip_prefix('/').unwrap_or(&self.0)
    }

    /// File bytes of the name. The lexer maps each byte to one char, so
    /// chars up to U+00FF are written back as single bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len());
        for ch in self.0.chars() {
            match u8::try_from(ch) {
                Ok(byte) => bytes.push(byte),
                Err(_) => bytes.extend_from_slice(ch.encode_utf8(&mut [0; 4]).as_bytes()),
            }
        }
        bytes
    }
}

impl PartialEq<str> for PdfName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PdfName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for PdfName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PdfString {
    pub fn new(data: Vec<u8>) -> Self {
        PdfString(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Text value: UTF-16BE with a byte order mark, otherwise Latin-1
    pub fn to_text(&self) -> String {
        match self.0.as_slice() {
            [0xFE, 0xFF, rest @ ..] => {
                let units: Vec<u16> = rest
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            bytes => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    /// Literal string in listing form, or hex form when mostly unprintable
    fn write_display(&self, out: &mut OutputBuffer) {
        let printable = self.0.iter().filter(|b| (b' '..=b'~').contains(b)).count();
        if 10 * printable < 9 * self.0.len() {
            out.add(b'<');
            for &b in &self.0 {
                out.test_eol();
                out.add_slice(format!("{b:02x}").as_bytes());
            }
            out.add(b'>');
            return;
        }

        out.add(b'(');
        for &b in &self.0 {
            out.test_esc_eol();
            match b {
                b'\r' => out.add_slice(b"\\r"),
                b'\n' => out.add_slice(b"\\n"),
                b'\\' | b'(' | b')' => {
                    out.add(b'\\');
                    out.add(b);
                }
                b' '..=b'~' => out.add(b),
                _ => out.add_slice(format!("\\x{b:02x}").as_bytes()),
            }
        }
        out.add(b')');
    }

    /// Literal string that parses back to the same bytes
    fn write_literal(&self, out: &mut OutputBuffer) {
        out.add(b'(');
        for &b in &self.0 {
            out.test_esc_eol();
            match b {
                b'\r' => out.add_slice(b"\\r"),
                b'\n' => out.add_slice(b"\\n"),
                b'\\' | b'(' | b')' => {
                    out.add(b'\\');
                    out.add(b);
                }
                _ => out.add(b),
            }
        }
        out.add(b')');
    }
}

impl PdfArray {
    pub fn new() -> Self {
        PdfArray(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.0.get(index)
    }

    pub fn push(&mut self, obj: PdfObject) {
        self.0.push(obj);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfObject> {
        self.0.iter()
    }
}

impl PdfDictionary {
    pub fn new() -> Self {
        PdfDictionary(Vec::new())
    }

    fn search(&self, key: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|(k, _)| k.as_str().cmp(key))
    }

    /// Insert or replace
    pub fn insert(&mut self, key: impl Into<String>, value: PdfObject) {
        let key = PdfName::new(key);
        match self.search(key.as_str()) {
            Ok(index) => self.0[index].1 = value,
            Err(index) => self.0.insert(index, (key, value)),
        }
    }

    /// Look up by full name, e.g. `"/Type"`
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.search(key).ok().map(|index| &self.0[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PdfObject> {
        match self.search(key) {
            Ok(index) => Some(&mut self.0[index].1),
            Err(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_ok()
    }

    pub fn remove(&mut self, key: &str) -> Option<PdfObject> {
        self.search(key).ok().map(|index| self.0.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&PdfName, &PdfObject)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn get_integer(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(PdfObject::as_integer)
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PdfObject::as_name).map(PdfName::as_str)
    }

    /// Value of `/Type`
    pub fn get_type(&self) -> Option<&str> {
        self.get_name("/Type")
    }

    pub fn write_to(&self, out: &mut OutputBuffer) {
        self.write_styled(out, StringStyle::Display);
    }

    pub(crate) fn write_styled(&self, out: &mut OutputBuffer, style: StringStyle) {
        out.test_eol();
        out.add_slice(b"<<");
        for (key, value) in &self.0 {
            out.append_token(&key.to_bytes());
            value.write_styled(out, style);
        }
        out.add_slice(b">>");
    }

    pub(crate) fn decrypt_strings<F, E>(&mut self, decrypt: &mut F) -> usize
    where
        F: FnMut(&[u8]) -> Result<Vec<u8>, E>,
    {
        self.0
            .iter_mut()
            .map(|(_, value)| value.decrypt_strings(decrypt))
            .sum()
    }
}

impl FromIterator<(String, PdfObject)> for PdfDictionary {
    fn from_iter<I: IntoIterator<Item = (String, PdfObject)>>(iter: I) -> Self {
        let mut dict = PdfDictionary::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}
