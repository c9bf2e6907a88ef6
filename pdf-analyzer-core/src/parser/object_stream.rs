//! PDF Object Stream Expansion
//!
//! Fills in objects stored in object streams (PDF 1.5+, ISO 32000-1 Section
//! 7.5.7). The decoded stream starts with `/N` pairs of object number and
//! offset; offsets count from `/First`.

use super::indirect_object::ObjectBody;
use super::lexer::{Lexer, LexerMode};
use super::objects::PdfObject;
use super::reader::PdfReader;
use super::source::{ByteSource, MemorySource};
use super::{ParseError, ParseResult};

impl<S: ByteSource> PdfReader<S> {
    /// Parse the children of object stream `number` whose cross-reference
    /// entry names this stream
    pub(crate) fn process_object_stream(&mut self, number: u32) -> ParseResult<()> {
        let object = self
            .objects
            .get(&number)
            .ok_or(ParseError::InvalidReference(number))?;
        let dict = match (object.is_stream(), object.dictionary()) {
            (true, Some(dict)) => dict.clone(),
            _ => return Err(ParseError::object(number, "object stream is not a stream")),
        };

        let count = dict
            .get_integer("/N")
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n > 0)
            .ok_or_else(|| ParseError::object(number, "object stream /N must be positive"))?;
        let first = dict
            .get_integer("/First")
            .and_then(|first| u64::try_from(first).ok())
            .ok_or_else(|| ParseError::MissingKey("/First in object stream".to_string()))?;
        if let Some(extends) = dict.get("/Extends").and_then(PdfObject::as_reference) {
            if let Some(object) = self.objects.get_mut(&number) {
                object.set_parent(extends, 0);
            }
        }

        tracing::debug!("Expanding object stream {} with {} objects", number, count);
        let raw = self.fetch_stream(number)?;
        let data = self.decode_stream_data(number, raw)?.ok_or_else(|| {
            ParseError::StreamDecodeError(format!(
                "object stream {number} uses an unsupported filter"
            ))
        })?;

        let mut lexer = Lexer::new(MemorySource::new(data), LexerMode::Document)?
            .with_max_depth(self.options.max_depth);

        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            let child = header_integer(&mut lexer, number)?;
            let offset = header_integer(&mut lexer, number)?;
            pairs.push((child, u64::from(offset)));
        }

        for (child, offset) in pairs {
            let Some(object) = self.objects.get_mut(&child) else {
                tracing::debug!("Object {} of object stream {} is not referenced", child, number);
                continue;
            };
            if object.parent().map(|(parent, _)| parent) != Some(number) || !object.is_free() {
                continue;
            }

            let position = first + offset;
            object.set_file_position(position);
            lexer.set_position(position)?;
            let value = lexer.parse_next_item()?.ok_or_else(|| {
                ParseError::object(child, format!("nothing at offset {offset} of object stream {number}"))
            })?;
            object.body = match value {
                PdfObject::Dictionary(dict) => {
                    if let Some(type_name) = dict.get_type() {
                        object.set_type_hint(type_name);
                    }
                    ObjectBody::Dictionary(dict)
                }
                value => ObjectBody::Other(value),
            };
        }
        Ok(())
    }
}

fn header_integer(lexer: &mut Lexer<MemorySource<Vec<u8>>>, stream: u32) -> ParseResult<u32> {
    match lexer.parse_next_item()? {
        Some(PdfObject::Integer(value)) if value >= 0 => Ok(value as u32),
        _ => Err(ParseError::object(
            stream,
            "object stream header must hold object number and offset pairs",
        )),
    }
}
