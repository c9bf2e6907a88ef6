//! ASCII85Decode filter (ISO 32000-1 Section 7.4.3)

use crate::parser::byte_class::is_white_space;
use crate::parser::{ParseError, ParseResult};

const POWERS_85: [u32; 5] = [85 * 85 * 85 * 85, 85 * 85 * 85, 85 * 85, 85, 1];

/// Decode base-85 data. Decoding stops at the first `~`; white space is ignored.
pub fn decode_ascii85(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() * 4 / 5 + 4);
    let mut state = 0usize;
    let mut value: u32 = 0;

    for &ch in data {
        if ch == b'~' {
            break;
        }
        if is_white_space(ch) {
            continue;
        }
        if ch == b'z' && state == 0 {
            result.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&ch) {
            return Err(ParseError::StreamDecodeError(format!(
                "Invalid ASCII85 character: {:#04x}",
                ch
            )));
        }

        value = value.wrapping_add(POWERS_85[state].wrapping_mul(u32::from(ch - b'!')));
        state += 1;
        if state == 5 {
            result.extend_from_slice(&value.to_be_bytes());
            state = 0;
            value = 0;
        }
    }

    if state != 0 {
        if state == 1 {
            return Err(ParseError::StreamDecodeError(
                "Invalid ASCII85 final group length".to_string(),
            ));
        }
        for power in &POWERS_85[state..] {
            value = value.wrapping_add(power.wrapping_mul(u32::from(b'u' - b'!')));
        }
        result.extend_from_slice(&value.to_be_bytes()[..state - 1]);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_groups() {
        assert_eq!(decode_ascii85(b"87cURD]i,\"Ebo80~>").unwrap(), b"Hello World!");
    }

    #[test]
    fn test_partial_group() {
        assert_eq!(decode_ascii85(b"87cURD]i,\"Ebo7~>").unwrap(), b"Hello World");
        assert_eq!(decode_ascii85(b"@:E_W~>").unwrap(), b"abcd");
        assert_eq!(decode_ascii85(b"@/~>").unwrap(), b"a");
    }

    #[test]
    fn test_zero_group_and_white_space() {
        assert_eq!(decode_ascii85(b"z\n@:E\r\n_W ~>").unwrap(), b"\0\0\0\0abcd");
    }

    #[test]
    fn test_invalid_input() {
        assert!(decode_ascii85(b"@:E_Wv~>").is_err());
        assert!(decode_ascii85(b"@:E_W@~>").is_err());
    }

    #[test]
    fn test_empty() {
        assert!(decode_ascii85(b"~>").unwrap().is_empty());
        assert!(decode_ascii85(b"").unwrap().is_empty());
    }
}
