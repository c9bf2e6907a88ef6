//! PDF Stream Filters
//!
//! Handles decompression and decoding of PDF streams according to ISO 32000-1 Section 7.4

use super::filter_impls::{apply_predictor, decode_ascii85, decode_flate, decode_lzw};
use super::objects::{PdfDictionary, PdfObject};
use super::{ParseError, ParseResult};

/// PDF filters known to the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Flate decode (zlib/deflate compression)
    FlateDecode,

    /// LZW decode
    LZWDecode,

    /// ASCII 85 decode
    ASCII85Decode,

    /// DCT decode (JPEG); the data is returned undecoded
    DCTDecode,

    /// Any other filter name, including its leading `/`
    Unsupported(String),
}

impl Filter {
    /// Parse filter from a name such as `/FlateDecode`
    pub fn from_name(name: &str) -> Self {
        match name {
            "/FlateDecode" => Filter::FlateDecode,
            "/LZWDecode" => Filter::LZWDecode,
            "/ASCII85Decode" => Filter::ASCII85Decode,
            "/DCTDecode" => Filter::DCTDecode,
            other => Filter::Unsupported(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Filter::FlateDecode => "/FlateDecode",
            Filter::LZWDecode => "/LZWDecode",
            Filter::ASCII85Decode => "/ASCII85Decode",
            Filter::DCTDecode => "/DCTDecode",
            Filter::Unsupported(name) => name,
        }
    }
}

/// Filters named by `/Filter`, in application order. A missing entry is an
/// empty chain; anything other than a name or an array of names is an error.
pub fn filter_chain(dict: &PdfDictionary) -> ParseResult<Vec<Filter>> {
    match dict.get("/Filter") {
        None => Ok(Vec::new()),
        Some(PdfObject::Name(name)) => Ok(vec![Filter::from_name(name.as_str())]),
        Some(PdfObject::Array(array)) => array
            .iter()
            .map(|item| {
                item.as_name()
                    .map(|name| Filter::from_name(name.as_str()))
                    .ok_or_else(invalid_filter)
            })
            .collect(),
        Some(_) => Err(invalid_filter()),
    }
}

fn invalid_filter() -> ParseError {
    ParseError::StreamDecodeError("/Filter must be a name or an array of names".to_string())
}

/// Decode stream data according to its dictionary.
///
/// Returns `Ok(None)` when a filter or predictor is not supported. Decoding
/// stops at `/DCTDecode` and returns the JPEG data as it is at that point.
pub fn decode_stream(data: Vec<u8>, dict: &PdfDictionary) -> ParseResult<Option<Vec<u8>>> {
    let filters = filter_chain(dict)?;
    decode_with_filters(data, &filters, dict)
}

/// Decode with an already resolved filter chain
pub fn decode_with_filters(
    mut data: Vec<u8>,
    filters: &[Filter],
    dict: &PdfDictionary,
) -> ParseResult<Option<Vec<u8>>> {
    let decode_parms = dict.get("/DecodeParms").and_then(PdfObject::as_dict);

    for filter in filters {
        data = match filter {
            Filter::FlateDecode => match apply_predictor(decode_flate(&data)?, decode_parms)? {
                Some(decoded) => decoded,
                None => return Ok(None),
            },
            Filter::LZWDecode => match apply_predictor(decode_lzw(&data)?, decode_parms)? {
                Some(decoded) => decoded,
                None => return Ok(None),
            },
            Filter::ASCII85Decode => decode_ascii85(&data)?,
            Filter::DCTDecode => return Ok(Some(data)),
            Filter::Unsupported(name) => {
                tracing::debug!("Filter {} is not supported", name);
                return Ok(None);
            }
        };
    }

    Ok(Some(data))
}
