//! Byte sources for the lexer
//!
//! The lexer reads one byte at a time, occasionally steps back over the byte it
//! just read, and jumps to absolute offsets when following the xref chain. The
//! same grammar runs over a seekable file and over an in-memory buffer (content
//! streams, object streams).

use super::{ParseError, ParseResult};
use std::io::{BufReader, Read, Seek, SeekFrom};

/// Random-access byte input consumed by [`super::lexer::Lexer`]
pub trait ByteSource {
    /// Read one byte. `None` at end of input; the position does not move past the end.
    fn read_byte(&mut self) -> ParseResult<Option<u8>>;

    /// Move back over the byte returned by the last successful `read_byte`.
    fn step_back(&mut self) -> ParseResult<()>;

    /// Current absolute position
    fn position(&self) -> u64;

    /// Jump to an absolute position
    fn set_position(&mut self, position: u64) -> ParseResult<()>;

    /// Total length of the input
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move relative to the current position
    fn skip(&mut self, delta: i64) -> ParseResult<()> {
        let target = self.position() as i64 + delta;
        if target < 0 {
            return Err(ParseError::SyntaxError {
                position: self.position(),
                message: format!("Cannot skip {delta} bytes before start of input"),
            });
        }
        self.set_position(target as u64)
    }

    /// Read up to `count` bytes; fewer are returned at end of input.
    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count);
        while bytes.len() < count {
            match self.read_byte()? {
                Some(b) => bytes.push(b),
                None => break,
            }
        }
        Ok(bytes)
    }
}

/// In-memory source over any byte container
#[derive(Debug, Clone)]
pub struct MemorySource<B> {
    data: B,
    position: usize,
}

impl<B: AsRef<[u8]>> MemorySource<B> {
    pub fn new(data: B) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes from the current position to the end
    pub fn remaining(&self) -> &[u8] {
        let data = self.data.as_ref();
        &data[self.position.min(data.len())..]
    }
}

impl<B: AsRef<[u8]>> ByteSource for MemorySource<B> {
    fn read_byte(&mut self) -> ParseResult<Option<u8>> {
        let data = self.data.as_ref();
        if self.position >= data.len() {
            return Ok(None);
        }
        let b = data[self.position];
        self.position += 1;
        Ok(Some(b))
    }

    fn step_back(&mut self) -> ParseResult<()> {
        if self.position == 0 {
            return Err(ParseError::SyntaxError {
                position: 0,
                message: "Cannot step back before start of input".to_string(),
            });
        }
        self.position -= 1;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn set_position(&mut self, position: u64) -> ParseResult<()> {
        // Positions past the end are allowed; reads there return end of input.
        self.position = usize::try_from(position).unwrap_or(usize::MAX);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>> {
        let data = self.data.as_ref();
        let start = self.position.min(data.len());
        let end = start.saturating_add(count).min(data.len());
        self.position = end;
        Ok(data[start..end].to_vec())
    }
}

/// Buffered source over a seekable reader (normally a `File`)
pub struct FileSource<R: Read + Seek> {
    reader: BufReader<R>,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> FileSource<R> {
    pub fn new(mut inner: R) -> ParseResult<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader: BufReader::with_capacity(64 * 1024, inner),
            position: 0,
            len,
        })
    }
}

impl<R: Read + Seek> ByteSource for FileSource<R> {
    fn read_byte(&mut self) -> ParseResult<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn step_back(&mut self) -> ParseResult<()> {
        if self.position == 0 {
            return Err(ParseError::SyntaxError {
                position: 0,
                message: "Cannot step back before start of input".to_string(),
            });
        }
        self.reader.seek_relative(-1)?;
        self.position -= 1;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn set_position(&mut self, position: u64) -> ParseResult<()> {
        // seek_relative keeps the buffer when the target is inside it
        let delta = position as i64 - self.position as i64;
        self.reader.seek_relative(delta)?;
        self.position = position;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn read_bytes(&mut self, count: usize) -> ParseResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count.min(self.len as usize));
        let read = (&mut self.reader).take(count as u64).read_to_end(&mut bytes)?;
        self.position += read as u64;
        Ok(bytes)
    }
}
