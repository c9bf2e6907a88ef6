//! PNG predictor post-processing for Flate and LZW streams
//!
//! Only predictor 12 (PNG Up) is undone, which is what cross-reference and
//! object streams use in practice.

use crate::parser::objects::PdfDictionary;
use crate::parser::{ParseError, ParseResult};

/// PNG filter type for "Up"
const PNG_UP: u8 = 2;

/// Undo the predictor named in `/DecodeParms`. `Ok(None)` for predictors
/// other than 1 and 12.
pub fn apply_predictor(data: Vec<u8>, decode_parms: Option<&PdfDictionary>) -> ParseResult<Option<Vec<u8>>> {
    let Some(parms) = decode_parms else {
        return Ok(Some(data));
    };
    match parms.get_integer("/Predictor") {
        None | Some(1) => return Ok(Some(data)),
        Some(12) => {}
        Some(other) => {
            tracing::debug!("Predictor {} is not supported", other);
            return Ok(None);
        }
    }

    let columns = match parms.get_integer("/Columns").unwrap_or(0) {
        c if c < 0 => {
            return Err(ParseError::StreamDecodeError(
                "/DecodeParms /Columns is negative".to_string(),
            ))
        }
        0 => 1,
        c => c as usize,
    };

    png_up(&data, columns).map(Some)
}

/// Each row is a filter byte followed by `columns` bytes. The first row is
/// taken as is; later rows must use the Up filter.
pub fn png_up(data: &[u8], columns: usize) -> ParseResult<Vec<u8>> {
    let rows = data.len() / (columns + 1);
    if rows < 1 {
        return Err(ParseError::StreamDecodeError(
            "/DecodeParms /Columns is greater than stream length".to_string(),
        ));
    }

    let mut output = Vec::with_capacity(rows * columns);
    let mut chunks = data.chunks_exact(columns + 1).take(rows);

    if let Some(first) = chunks.next() {
        output.extend_from_slice(&first[1..]);
    }
    for (row, chunk) in chunks.enumerate() {
        if chunk[0] != PNG_UP {
            return Err(ParseError::StreamDecodeError(format!(
                "PNG filter {} in row {} is not supported",
                chunk[0],
                row + 1
            )));
        }
        let previous = row * columns;
        for (index, &byte) in chunk[1..].iter().enumerate() {
            let above = output[previous + index];
            output.push(above.wrapping_add(byte));
        }
    }

    Ok(output)
}
