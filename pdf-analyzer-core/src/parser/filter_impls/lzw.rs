//! LZWDecode filter (ISO 32000-1 Section 7.4.4)
//!
//! Variable code width from 9 to 12 bits, most significant bit first, with
//! the early change of code width that PDF uses by default.

use crate::parser::{ParseError, ParseResult};

const CLEAR_TABLE: u16 = 256;
const END_OF_DATA: u16 = 257;
const FIRST_FREE: usize = 258;
const TABLE_SIZE: usize = 4096;

pub fn decode_lzw(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut table: Vec<Vec<u8>> = Vec::with_capacity(TABLE_SIZE);
    reset_table(&mut table);

    let mut output = Vec::with_capacity(data.len() * 3);
    let mut input = data.iter();
    let mut bit_buffer: u32 = 0;
    let mut bit_count: u32 = 0;
    let mut code_length: u32 = 9;
    let mut previous: Option<usize> = None;

    loop {
        while bit_count <= 16 {
            let Some(&byte) = input.next() else {
                break;
            };
            bit_buffer = (bit_buffer << 8) | u32::from(byte);
            bit_count += 8;
        }
        // a missing end-of-data code is tolerated
        if bit_count < code_length {
            break;
        }

        let code = ((bit_buffer >> (bit_count - code_length)) & ((1 << code_length) - 1)) as u16;
        bit_count -= code_length;

        if code == END_OF_DATA {
            break;
        }
        if code == CLEAR_TABLE {
            reset_table(&mut table);
            code_length = 9;
            previous = None;
            continue;
        }

        let code = code as usize;
        let entry = match previous {
            None if code < table.len() => {
                output.extend_from_slice(&table[code]);
                previous = Some(code);
                continue;
            }
            Some(prev) if code < table.len() => {
                let entry = table[code].clone();
                if table.len() < TABLE_SIZE {
                    let mut added = table[prev].clone();
                    added.push(entry[0]);
                    table.push(added);
                }
                entry
            }
            Some(prev) if code == table.len() && table.len() < TABLE_SIZE => {
                let mut entry = table[prev].clone();
                entry.push(entry[0]);
                table.push(entry.clone());
                entry
            }
            _ => {
                return Err(ParseError::StreamDecodeError(format!(
                    "LZW code {code} is not in the table"
                )))
            }
        };

        output.extend_from_slice(&entry);
        previous = Some(code);

        if matches!(table.len(), 511 | 1023 | 2047) {
            code_length += 1;
        }
    }

    Ok(output)
}

fn reset_table(table: &mut Vec<Vec<u8>>) {
    table.clear();
    table.extend((0..=255u8).map(|b| vec![b]));
    // clear-table and end-of-data codes
    table.push(Vec::new());
    table.push(Vec::new());
    debug_assert_eq!(table.len(), FIRST_FREE);
}
