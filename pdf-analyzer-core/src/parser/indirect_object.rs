//! Indirect objects as located by the cross-reference chain
//!
//! Every object starts as a free stub holding either a file position or, for
//! objects compressed in an object stream, the parent object and index. The
//! reader fills in the body in later passes.

use super::objects::{PdfDictionary, PdfObject};
use super::output::OutputBuffer;

/// Kind of object body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ObjectType {
    /// Not read yet, or never found
    Free,
    /// Any value other than a dictionary
    Other,
    Dictionary,
    /// Dictionary followed by stream data
    Stream,
}

/// Parsed object body
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    Free,
    Other(PdfObject),
    Dictionary(PdfDictionary),
    Stream {
        dictionary: PdfDictionary,
        /// Absolute offset of the first data byte
        position: u64,
        /// Verified data length; zero when `/Length` could not be trusted
        length: u64,
    },
}

/// One numbered object of the document
#[derive(Debug, Clone)]
pub struct IndirectObject {
    object_number: u32,
    file_position: u64,
    parent: Option<(u32, u32)>,
    pub(crate) body: ObjectBody,
    type_hint: Option<String>,
    pub(crate) contents: Option<Vec<u32>>,
}

impl IndirectObject {
    /// Object stored at `file_position` in the file
    pub fn new(object_number: u32, file_position: u64) -> Self {
        Self {
            object_number,
            file_position,
            parent: None,
            body: ObjectBody::Free,
            type_hint: None,
            contents: None,
        }
    }

    /// Object number `index` inside object stream `parent`
    pub fn compressed(object_number: u32, parent: u32, index: u32) -> Self {
        Self {
            parent: Some((parent, index)),
            ..Self::new(object_number, 0)
        }
    }

    pub fn object_number(&self) -> u32 {
        self.object_number
    }

    /// Offset of the `N 0 obj` header; for compressed objects, the offset
    /// inside the decoded object stream
    pub fn file_position(&self) -> u64 {
        self.file_position
    }

    pub(crate) fn set_file_position(&mut self, position: u64) {
        self.file_position = position;
    }

    /// Parent object stream number and index for compressed objects
    pub fn parent(&self) -> Option<(u32, u32)> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: u32, index: u32) {
        self.parent = Some((parent, index));
    }

    pub fn body(&self) -> &ObjectBody {
        &self.body
    }

    pub fn object_type(&self) -> ObjectType {
        match self.body {
            ObjectBody::Free => ObjectType::Free,
            ObjectBody::Other(_) => ObjectType::Other,
            ObjectBody::Dictionary(_) => ObjectType::Dictionary,
            ObjectBody::Stream { .. } => ObjectType::Stream,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self.body, ObjectBody::Free)
    }

    /// Dictionary of a dictionary or stream object
    pub fn dictionary(&self) -> Option<&PdfDictionary> {
        match &self.body {
            ObjectBody::Dictionary(dict) | ObjectBody::Stream { dictionary: dict, .. } => Some(dict),
            _ => None,
        }
    }

    pub(crate) fn dictionary_mut(&mut self) -> Option<&mut PdfDictionary> {
        match &mut self.body {
            ObjectBody::Dictionary(dict) | ObjectBody::Stream { dictionary: dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Value of an `Other` object
    pub fn value(&self) -> Option<&PdfObject> {
        match &self.body {
            ObjectBody::Other(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.body, ObjectBody::Stream { .. })
    }

    /// Offset of the stream data, zero for other objects
    pub fn stream_position(&self) -> u64 {
        match self.body {
            ObjectBody::Stream { position, .. } => position,
            _ => 0,
        }
    }

    pub fn stream_length(&self) -> u64 {
        match self.body {
            ObjectBody::Stream { length, .. } => length,
            _ => 0,
        }
    }

    pub(crate) fn set_stream_length(&mut self, new_length: u64) {
        if let ObjectBody::Stream { length, .. } = &mut self.body {
            *length = new_length;
        }
    }

    /// `/Type` of the dictionary when read, or the role the object plays in
    /// the document (`/Contents`, `/JpegImage`, a catalog key...)
    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    pub(crate) fn set_type_hint(&mut self, hint: &str) {
        if let Some(previous) = &self.type_hint {
            if previous != hint {
                tracing::debug!(
                    "Object {} type hint changed from {} to {}",
                    self.object_number,
                    previous,
                    hint
                );
            }
        }
        self.type_hint = Some(hint.to_string());
    }

    /// Dictionary `/Type`, falling back to the type hint
    pub fn type_name(&self) -> Option<&str> {
        self.dictionary()
            .and_then(PdfDictionary::get_type)
            .or_else(|| self.type_hint())
    }

    pub fn subtype(&self) -> Option<&str> {
        self.dictionary().and_then(|dict| dict.get_name("/Subtype"))
    }

    /// Content stream object numbers of a page object, in drawing order.
    /// `None` until the page's contents have been looked up.
    pub fn contents(&self) -> Option<&[u32]> {
        self.contents.as_deref()
    }

    /// `Free`, `Dictionary`, `Stream` or the type of the value
    pub fn description(&self) -> &'static str {
        match &self.body {
            ObjectBody::Free => "Free",
            ObjectBody::Other(value) => value.type_name(),
            ObjectBody::Dictionary(_) => "Dictionary",
            ObjectBody::Stream { .. } => "Stream",
        }
    }

    /// Multi-line description used by the object summary report
    pub fn write_summary(&self, out: &mut OutputBuffer) {
        out.append_message(&format!("Object number: {}", self.object_number));
        out.append_message(&format!("Object Value Type: {}", self.description()));
        out.append_message(&format!(
            "File Position: {0} Hex: {0:X}",
            self.file_position
        ));
        if let Some((parent, index)) = self.parent {
            out.append_message(&format!("Parent object number: {parent}"));
            out.append_message(&format!("Parent object index: {index}"));
        }
        if let ObjectBody::Stream {
            position, length, ..
        } = self.body
        {
            out.append_message(&format!("Stream Position: {0} Hex: {0:X}", position));
            out.append_message(&format!("Stream Length: {0} Hex: {0:X}", length));
        }

        match &self.body {
            ObjectBody::Dictionary(dict) | ObjectBody::Stream { dictionary: dict, .. } => {
                if let Some(type_name) = self.type_name() {
                    out.append_message(&format!("Object Type: {type_name}"));
                }
                if let Some(subtype) = self.subtype() {
                    out.append_message(&format!("Object Subtype: {subtype}"));
                }
                dict.write_to(out);
                out.add_eol();
            }
            ObjectBody::Other(value) => {
                value.write_to(out);
                out.add_eol();
            }
            ObjectBody::Free => {}
        }
        out.add_eol();
    }
}
