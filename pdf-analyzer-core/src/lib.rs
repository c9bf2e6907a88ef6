//! # pdf-analyzer
//!
//! An object-level PDF reader for inspecting how a file is put together.
//!
//! ## Features
//!
//! - **File framing**: `%PDF-1.x` header, binary marker and `startxref` location
//! - **Cross references**: classic tables, cross-reference streams, `/Prev` chains
//!   and hybrid files with `/XRefStm`
//! - **Object streams**: compressed objects are expanded into the object table
//! - **Standard security handler**: RC4 128-bit and AES-128 documents, user and
//!   owner passwords
//! - **Stream filters**: Flate, LZW, ASCII85 and PNG predictors; DCT data is passed through
//! - **Page tree**: page array, contents streams and an annotated operator listing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_analyzer::parser::PdfReader;
//! use pdf_analyzer::reports;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = PdfReader::open("document.pdf")?;
//! println!("Version: {}", reader.version());
//! println!("Objects: {}", reader.object_count());
//!
//! if reader.is_active() {
//!     for page in 0..reader.page_count().max(0) as usize {
//!         let operations = reader.page_operations(page)?;
//!         let listing = reports::contents_to_text(&operations);
//!         println!("{}", String::from_utf8_lossy(&listing));
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Encrypted documents
//!
//! ```rust,no_run
//! use pdf_analyzer::parser::{ParseOptions, PdfReader};
//! use pdf_analyzer::DecryptionStatus;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = PdfReader::open("secret.pdf")?;
//! if reader.decryption_status() == DecryptionStatus::InvalidPassword {
//!     reader.test_password("letmein")?;
//! }
//!
//! // Or supply the password up front
//! let reader = PdfReader::open_with_options("secret.pdf", Some("letmein"), ParseOptions::strict())?;
//! println!("{:?}", reader.permissions().describe());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parser`] - Lexer, object model, cross references, filters and the page tree
//! - [`encryption`] - Standard security handler
//! - [`reports`] - Text renderings of documents, objects and content streams

pub mod encryption;
pub mod error;
pub mod parser;
pub mod reports;

pub use encryption::{DecryptionStatus, EncryptionType, Permissions};
pub use error::{PdfError, Result};

// Re-export parsing types
pub use parser::{
    ContentOperation, IndirectObject, ObjectType, Operator, ParseError, ParseOptions, PdfArray,
    PdfDictionary, PdfName, PdfObject, PdfReader, PdfString,
};
pub use reports::DocumentInfo;

/// Current version of pdf-analyzer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header versions accepted by the reader
pub mod pdf_version {
    /// `%PDF-1.0` through `%PDF-1.7`
    pub const SUPPORTED_VERSIONS: &[&str] =
        &["1.0", "1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7"];
}
