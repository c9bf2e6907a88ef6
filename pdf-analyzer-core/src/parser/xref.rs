//! PDF Cross-Reference Chain
//!
//! Walks the cross-reference sections of a document from the newest one
//! (at `startxref`) back through `/Prev`, according to ISO 32000-1 Sections
//! 7.5.4, 7.5.6 and 7.5.8. Tables and streams may be mixed, and a table may
//! point at a stream through `/XRefStm` (hybrid files). An object number is
//! taken from the newest section that lists it.

use super::filters;
use super::indirect_object::IndirectObject;
use super::objects::{Keyword, PdfDictionary, PdfObject};
use super::reader::PdfReader;
use super::source::ByteSource;
use super::xref_stream::{XRefEntry, XRefStreamLayout};
use super::{ParseError, ParseResult};
use std::collections::HashSet;

/// Generation numbers accepted for objects in use
fn is_supported_generation(generation: i64) -> bool {
    generation == 0 || generation == 65535
}

fn multi_generation() -> ParseError {
    ParseError::InvalidXRef("No support for multi-generation PDF file".to_string())
}

/// Offset stored under `key`, as a document position
fn offset_entry(dict: &PdfDictionary, key: &str) -> ParseResult<Option<u64>> {
    match dict.get(key) {
        None => Ok(None),
        Some(PdfObject::Integer(offset)) => u64::try_from(*offset)
            .map(Some)
            .map_err(|_| ParseError::InvalidXRef(format!("{key} offset {offset} is negative"))),
        Some(other) => Err(ParseError::InvalidXRef(format!(
            "{key} must be an integer, found {}",
            other.type_name()
        ))),
    }
}

impl<S: ByteSource> PdfReader<S> {
    /// Read every section of the chain
    pub(crate) fn read_xref_chain(&mut self) -> ParseResult<()> {
        let mut visited = HashSet::new();
        let mut next = Some(self.frame.startxref);

        while let Some(offset) = next {
            if !visited.insert(offset) {
                return Err(ParseError::CircularReference(format!(
                    "cross-reference section at offset {offset} is reached twice"
                )));
            }
            if visited.len() > self.options.max_xref_chain {
                return Err(ParseError::InvalidXRef(format!(
                    "more than {} cross-reference sections",
                    self.options.max_xref_chain
                )));
            }

            tracing::debug!("Reading cross-reference section at offset {}", offset);
            next = self.read_xref_section(offset)?;
        }

        if self.trailer.is_none() {
            return Err(ParseError::InvalidTrailer(
                "no trailer dictionary found".to_string(),
            ));
        }
        tracing::debug!(
            "Cross-reference chain: {} sections, {} objects, {} object streams",
            visited.len(),
            self.objects.len(),
            self.object_streams.len()
        );
        Ok(())
    }

    /// Read the section at `offset` and return its `/Prev`
    fn read_xref_section(&mut self, offset: u64) -> ParseResult<Option<u64>> {
        self.seek(offset)?;
        match self.lexer.parse_next_item()? {
            Some(PdfObject::Keyword(Keyword::XRef)) => self.read_xref_table(),
            _ => self.read_xref_stream(offset),
        }
    }

    /// Register an object unless a newer section already did. Object 0 is
    /// the head of the free list and never stored.
    pub(crate) fn add_object(&mut self, object: IndirectObject) -> bool {
        let number = object.object_number();
        if number == 0 || self.objects.contains_key(&number) {
            return false;
        }
        self.objects.insert(number, object);
        true
    }

    /// The newest trailer is the document trailer
    fn set_trailer(&mut self, dict: PdfDictionary) -> ParseResult<()> {
        match dict.get_integer("/Size") {
            Some(size) if size > 0 => {}
            _ => {
                return Err(ParseError::InvalidTrailer(
                    "/Size is missing or zero".to_string(),
                ))
            }
        }
        self.trailer = Some(dict);
        Ok(())
    }

    fn next_integer(&mut self, what: &str) -> ParseResult<i64> {
        match self.lexer.parse_next_item()? {
            Some(PdfObject::Integer(value)) => Ok(i64::from(value)),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(ParseError::InvalidXRef(format!(
                "end of file while reading {what}"
            ))),
        }
    }

    /// Subsections after the `xref` keyword, then the trailer
    fn read_xref_table(&mut self) -> ParseResult<Option<u64>> {
        loop {
            let first = match self.lexer.parse_next_item()? {
                Some(PdfObject::Keyword(Keyword::Trailer)) => break,
                Some(PdfObject::Integer(first)) => i64::from(first),
                _ => {
                    return Err(ParseError::InvalidXRef(
                        "expected a subsection header or 'trailer'".to_string(),
                    ))
                }
            };
            let count = self.next_integer("subsection entry count")?;
            if first < 0 || count < 0 {
                return Err(ParseError::InvalidXRef(format!(
                    "invalid subsection {first} {count}"
                )));
            }

            for number in first..first + count {
                let offset = self.next_integer("entry offset")?;
                let generation = self.next_integer("entry generation")?;
                let in_use = match self.lexer.parse_next_item()? {
                    Some(PdfObject::Keyword(Keyword::N)) => true,
                    Some(PdfObject::Keyword(Keyword::F)) => false,
                    _ => {
                        return Err(ParseError::InvalidXRef(format!(
                            "entry for object {number} must end with 'n' or 'f'"
                        )))
                    }
                };
                tracing::trace!("xref entry {}: {} {} {}", number, offset, generation, in_use);

                if !in_use || offset == 0 {
                    continue;
                }
                if !is_supported_generation(generation) {
                    return Err(multi_generation());
                }
                let number = u32::try_from(number)
                    .map_err(|_| ParseError::InvalidXRef(format!("object number {number}")))?;
                let offset = u64::try_from(offset)
                    .map_err(|_| ParseError::InvalidXRef(format!("entry offset {offset}")))?;
                self.add_object(IndirectObject::new(number, offset));
            }
        }

        let trailer = match self.lexer.parse_next_item()? {
            Some(PdfObject::Dictionary(dict)) => dict,
            _ => {
                return Err(ParseError::InvalidTrailer(
                    "'trailer' must be followed by a dictionary".to_string(),
                ))
            }
        };
        if self.trailer.is_none() {
            self.set_trailer(trailer.clone())?;
        }

        if let Some(stream_offset) = offset_entry(&trailer, "/XRefStm")? {
            tracing::debug!("Hybrid file: cross-reference stream at {}", stream_offset);
            if self.read_xref_stream(stream_offset)?.is_some() {
                return Err(ParseError::InvalidXRef(
                    "/XRefStm stream must not have /Prev".to_string(),
                ));
            }
        }

        offset_entry(&trailer, "/Prev")
    }

    /// Cross-reference stream object at `offset`
    fn read_xref_stream(&mut self, offset: u64) -> ParseResult<Option<u64>> {
        self.seek(offset)?;
        let number = self.lexer.parse_object_header()?.ok_or_else(|| {
            ParseError::InvalidXRef(format!(
                "no cross-reference table or stream at offset {offset}"
            ))
        })?;

        let mut object = IndirectObject::new(number, offset);
        Self::parse_object(&mut self.lexer, self.frame.start_position, &mut object)?;
        let dict = match (object.is_stream(), object.dictionary()) {
            (true, Some(dict)) => dict.clone(),
            _ => {
                return Err(ParseError::object(
                    number,
                    "cross-reference stream object is not a stream",
                ))
            }
        };
        if self.trailer.is_none() {
            self.set_trailer(dict.clone())?;
        }

        match self.objects.get_mut(&number) {
            Some(existing) if existing.file_position() != offset => {
                return Err(ParseError::InvalidXRef(format!(
                    "object {number} is listed twice at different positions"
                )))
            }
            Some(existing) => {
                if existing.is_free() {
                    *existing = object.clone();
                }
            }
            None => {
                self.objects.insert(number, object.clone());
            }
        }

        // The length of a cross-reference stream is always direct
        let length = dict
            .get_integer("/Length")
            .and_then(|length| usize::try_from(length).ok())
            .ok_or_else(|| ParseError::MissingKey("/Length in cross-reference stream".to_string()))?;
        let data = self
            .lexer
            .read_raw(self.frame.start_position + object.stream_position(), length)?;
        let decoded = filters::decode_stream(data, &dict)?.ok_or_else(|| {
            ParseError::StreamDecodeError(format!(
                "cross-reference stream {number} uses an unsupported filter"
            ))
        })?;

        let layout = XRefStreamLayout::from_dict(&dict)?;
        for (entry_number, entry) in layout.entries(&decoded)? {
            match entry {
                XRefEntry::Free => {}
                XRefEntry::InUse { offset, generation } => {
                    if !is_supported_generation(i64::from(generation)) {
                        return Err(multi_generation());
                    }
                    if offset != 0 {
                        self.add_object(IndirectObject::new(entry_number, offset));
                    }
                }
                XRefEntry::Compressed { stream, index } => {
                    if self.add_object(IndirectObject::compressed(entry_number, stream, index)) {
                        self.object_streams.insert(stream);
                    }
                }
            }
        }

        offset_entry(&dict, "/Prev")
    }
}
