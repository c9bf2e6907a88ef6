//! PDF Parser Module
//!
//! Object-level reader for PDF files according to ISO 32000-1: file framing,
//! cross-reference chains (tables, streams and hybrid files), indirect objects,
//! object streams, stream filters, the page tree and content stream operators.

pub mod byte_class;
pub mod content;
pub mod filter_impls;
pub mod filters;
pub mod header;
pub mod indirect_object;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod operators;
pub mod output;
pub mod page_tree;
pub mod reader;
pub mod source;
#[cfg(test)]
mod test_helpers;
pub mod xref;
pub mod xref_stream;

use crate::encryption::EncryptionError;

pub use self::content::{parse_contents, ContentOperation};
pub use self::filters::Filter;
pub use self::header::{FileFrame, PdfVersion};
pub use self::indirect_object::{IndirectObject, ObjectBody, ObjectType};
pub use self::lexer::{Lexer, LexerMode};
pub use self::objects::{Keyword, PdfArray, PdfDictionary, PdfName, PdfObject, PdfString};
pub use self::operators::Operator;
pub use self::output::OutputBuffer;
pub use self::reader::PdfReader;
pub use self::source::{ByteSource, FileSource, MemorySource};
pub use self::xref_stream::{XRefEntry, XRefStreamLayout};
pub use crate::encryption::DecryptionStatus;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PDF header: {0}")]
    InvalidHeader(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("File too small to be a PDF document: {0} bytes")]
    FileTooSmall(u64),

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: u64, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Invalid object reference: {0} 0 R")]
    InvalidReference(u32),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref: {0}")]
    InvalidXRef(String),

    #[error("Invalid trailer: {0}")]
    InvalidTrailer(String),

    #[error("Circular reference detected: {0}")]
    CircularReference(String),

    #[error("Nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),

    #[error("Invalid object {object_number}: {message}")]
    InvalidObject { object_number: u32, message: String },

    #[error("Invalid page tree: {0}")]
    InvalidPageTree(String),

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Document is not active (password required)")]
    NotActive,
}

impl ParseError {
    pub(crate) fn syntax(position: u64, message: impl Into<String>) -> Self {
        ParseError::SyntaxError {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn object(object_number: u32, message: impl Into<String>) -> Self {
        ParseError::InvalidObject {
            object_number,
            message: message.into(),
        }
    }
}

/// Reader configuration
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Larger files are rejected before any parsing
    pub max_file_size: u64,
    /// Maximum number of `/Prev` hops in the xref chain
    pub max_xref_chain: usize,
    /// Nesting bound for arrays, dictionaries, the decrypt walk and the page tree
    pub max_depth: usize,
    /// Tolerate a bare CR after `stream` and unverifiable stream lengths
    pub lenient_syntax: bool,
    /// Keep a message for every tolerated anomaly
    pub collect_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_file_size: 0x4000_0000,
            max_xref_chain: 1024,
            max_depth: 256,
            lenient_syntax: true,
            collect_warnings: true,
        }
    }
}

impl ParseOptions {
    /// Fail on every deviation from the file format
    pub fn strict() -> Self {
        Self {
            lenient_syntax: false,
            ..Default::default()
        }
    }

    /// Tolerate known producer bugs and record them
    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_max_xref_chain(mut self, hops: usize) -> Self {
        self.max_xref_chain = hops;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_collect_warnings(mut self, collect: bool) -> Self {
        self.collect_warnings = collect;
        self
    }
}
