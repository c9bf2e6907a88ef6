//! FlateDecode filter (ISO 32000-1 Section 7.4.4)
//!
//! The zlib wrapper is checked here: header check bits, compression method,
//! no preset dictionary, and the Adler-32 trailer against the inflated data.

use super::adler32::adler32;
use crate::parser::{ParseError, ParseResult};

#[cfg(feature = "compression")]
use flate2::read::DeflateDecoder;
#[cfg(feature = "compression")]
use std::io::Read;

const METHOD_MASK: u16 = 0x0F00;
const METHOD_DEFLATE: u16 = 0x0800;
const METHOD_STORED: u16 = 0x0000;
const PRESET_DICTIONARY: u16 = 0x0020;

pub fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    if data.len() < 6 {
        return Err(ParseError::StreamDecodeError(format!(
            "Flate stream too short: {} bytes",
            data.len()
        )));
    }

    let header = u16::from_be_bytes([data[0], data[1]]);
    let method = header & METHOD_MASK;
    if header % 31 != 0
        || (method != METHOD_DEFLATE && method != METHOD_STORED)
        || header & PRESET_DICTIONARY != 0
    {
        return Err(ParseError::StreamDecodeError(format!(
            "Invalid zlib header {header:#06x}"
        )));
    }

    let body = &data[2..data.len() - 4];
    let output = if method == METHOD_DEFLATE {
        inflate(body)?
    } else {
        body.to_vec()
    };

    let trailer = &data[data.len() - 4..];
    let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = adler32(&output);
    if expected != actual {
        return Err(ParseError::StreamDecodeError(format!(
            "Adler-32 mismatch: stored {expected:#010x}, computed {actual:#010x}"
        )));
    }

    Ok(output)
}

#[cfg(feature = "compression")]
fn inflate(body: &[u8]) -> ParseResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(body);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| ParseError::StreamDecodeError(format!("Flate decode error: {e}")))?;
    Ok(result)
}

#[cfg(not(feature = "compression"))]
fn inflate(_body: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::StreamDecodeError(
        "FlateDecode requires 'compression' feature".to_string(),
    ))
}
