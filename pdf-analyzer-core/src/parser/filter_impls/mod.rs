//! PDF stream filter implementations
//!
//! Decoders for the filters of ISO 32000-1:2008 Section 7.4 that the reader
//! understands. JPEG data (DCTDecode) is passed through undecoded.

pub mod adler32;
pub mod ascii85;
pub mod flate;
pub mod lzw;
pub mod predictor;

pub use adler32::adler32;
pub use ascii85::decode_ascii85;
pub use flate::decode_flate;
pub use lzw::decode_lzw;
pub use predictor::apply_predictor;
