//! Cross-reference stream entries
//!
//! Decodes the binary entry table of a `/Type /XRef` stream according to
//! ISO 32000-1 Section 7.5.8. Each entry is three big-endian fields whose
//! widths come from `/W`; `/Index` lists the object number ranges covered.

use super::objects::{PdfDictionary, PdfObject};
use super::{ParseError, ParseResult};

/// One decoded cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Type 0, a deleted object
    Free,
    /// Type 1, an object at a file offset
    InUse { offset: u64, generation: u32 },
    /// Type 2, object `index` inside object stream `stream`
    Compressed { stream: u32, index: u32 },
}

/// Field widths and covered ranges of a cross-reference stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRefStreamLayout {
    pub widths: [usize; 3],
    /// `(first object number, count)` pairs
    pub index: Vec<(u32, u32)>,
}

impl XRefStreamLayout {
    pub fn from_dict(dict: &PdfDictionary) -> ParseResult<Self> {
        let w = dict
            .get("/W")
            .and_then(PdfObject::as_array)
            .filter(|w| w.len() == 3)
            .ok_or_else(|| ParseError::InvalidXRef("XRef object missing W array".to_string()))?;
        let mut widths = [0usize; 3];
        for (width, item) in widths.iter_mut().zip(w.iter()) {
            *width = item
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|&n| n <= 8)
                .ok_or_else(|| ParseError::InvalidXRef(format!("Invalid /W entry {item:?}")))?;
        }

        let index = match dict.get("/Index").and_then(PdfObject::as_array) {
            Some(array) => {
                if array.len() % 2 != 0 {
                    return Err(ParseError::InvalidXRef(
                        "/Index must hold pairs of integers".to_string(),
                    ));
                }
                let numbers = array
                    .iter()
                    .map(|item| {
                        item.as_integer()
                            .and_then(|n| u32::try_from(n).ok())
                            .ok_or_else(|| {
                                ParseError::InvalidXRef(format!("Invalid /Index entry {item:?}"))
                            })
                    })
                    .collect::<ParseResult<Vec<u32>>>()?;
                numbers.chunks(2).map(|pair| (pair[0], pair[1])).collect()
            }
            None => {
                let size = dict
                    .get_integer("/Size")
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        ParseError::MissingKey("/Size in cross-reference stream".to_string())
                    })?;
                vec![(0, size)]
            }
        };

        Ok(Self { widths, index })
    }

    /// Bytes per entry
    pub fn entry_len(&self) -> usize {
        self.widths.iter().sum()
    }

    /// Decode every entry of `data` with its object number
    pub fn entries(&self, data: &[u8]) -> ParseResult<Vec<(u32, XRefEntry)>> {
        let entry_len = self.entry_len();
        if entry_len == 0 {
            return Err(ParseError::InvalidXRef("/W widths are all zero".to_string()));
        }

        let total: u64 = self.index.iter().map(|&(_, count)| u64::from(count)).sum();
        let available = (data.len() / entry_len) as u64;
        if total > available {
            return Err(ParseError::InvalidXRef(format!(
                "cross-reference stream holds {available} entries, /Index declares {total}"
            )));
        }

        let mut entries = Vec::with_capacity(total as usize);
        let mut records = data.chunks_exact(entry_len);
        for &(first, count) in &self.index {
            for object_number in first..first.saturating_add(count) {
                let Some(record) = records.next() else {
                    break;
                };
                entries.push((object_number, self.decode(object_number, record)?));
            }
        }
        Ok(entries)
    }

    fn decode(&self, object_number: u32, record: &[u8]) -> ParseResult<XRefEntry> {
        let [w1, w2, _] = self.widths;
        // A zero width type field means type 1
        let entry_type = if w1 == 0 { 1 } else { field(&record[..w1]) };
        let field2 = field(&record[w1..w1 + w2]);
        let field3 = field(&record[w1 + w2..]);

        tracing::trace!(
            "xref stream entry {}: type {} {} {}",
            object_number,
            entry_type,
            field2,
            field3
        );

        match entry_type {
            0 => Ok(XRefEntry::Free),
            1 => Ok(XRefEntry::InUse {
                offset: field2,
                generation: field3 as u32,
            }),
            2 => {
                let stream = u32::try_from(field2)
                    .map_err(|_| ParseError::InvalidXRef(format!("object stream {field2}")))?;
                Ok(XRefEntry::Compressed {
                    stream,
                    index: field3 as u32,
                })
            }
            other => Err(ParseError::InvalidXRef(format!(
                "unknown entry type {other} for object {object_number}"
            ))),
        }
    }
}

/// Big-endian unsigned field; empty fields are zero
fn field(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::objects::PdfArray;

    fn ints(values: &[i32]) -> PdfObject {
        PdfObject::Array(PdfArray(values.iter().map(|&v| PdfObject::Integer(v)).collect()))
    }

    fn dict(w: &[i32], index: Option<&[i32]>, size: i32) -> PdfDictionary {
        let mut dict = PdfDictionary::new();
        dict.insert("/W", ints(w));
        dict.insert("/Size", PdfObject::Integer(size));
        if let Some(index) = index {
            dict.insert("/Index", ints(index));
        }
        dict
    }

    #[test]
    fn test_field() {
        assert_eq!(field(&[]), 0);
        assert_eq!(field(&[0x01, 0x02]), 0x0102);
        assert_eq!(field(&[0xFF, 0x00, 0x10]), 0xFF0010);
    }

    #[test]
    fn test_default_index() {
        let layout = XRefStreamLayout::from_dict(&dict(&[1, 2, 1], None, 6)).unwrap();
        assert_eq!(layout.index, vec![(0, 6)]);
        assert_eq!(layout.entry_len(), 4);
    }

    #[test]
    fn test_missing_w() {
        let mut d = dict(&[1, 2], None, 3);
        assert!(XRefStreamLayout::from_dict(&d).is_err());
        d.remove("/W");
        assert!(matches!(
            XRefStreamLayout::from_dict(&d),
            Err(ParseError::InvalidXRef(_))
        ));
    }

    #[test]
    fn test_entries() {
        let layout = XRefStreamLayout::from_dict(&dict(&[1, 2, 1], Some(&[0, 2, 10, 2]), 12)).unwrap();
        let data = [
            0, 0x00, 0x00, 0xFF, // 0: free
            1, 0x01, 0x0F, 0x00, // 1: offset 271
            2, 0x00, 0x05, 0x03, // 10: object stream 5 index 3
            1, 0x00, 0x09, 0x00, // 11: offset 9
        ];
        assert_eq!(
            layout.entries(&data).unwrap(),
            vec![
                (0, XRefEntry::Free),
                (1, XRefEntry::InUse { offset: 271, generation: 0 }),
                (10, XRefEntry::Compressed { stream: 5, index: 3 }),
                (11, XRefEntry::InUse { offset: 9, generation: 0 }),
            ]
        );
    }

    #[test]
    fn test_zero_type_width_defaults_to_in_use() {
        let layout = XRefStreamLayout::from_dict(&dict(&[0, 2, 0], Some(&[3, 1]), 4)).unwrap();
        assert_eq!(
            layout.entries(&[0x01, 0x00]).unwrap(),
            vec![(3, XRefEntry::InUse { offset: 256, generation: 0 })]
        );
    }

    #[test]
    fn test_unknown_type() {
        let layout = XRefStreamLayout::from_dict(&dict(&[1, 1, 1], None, 1)).unwrap();
        assert!(layout.entries(&[7, 0, 0]).is_err());
    }

    #[test]
    fn test_truncated_data() {
        let layout = XRefStreamLayout::from_dict(&dict(&[1, 1, 1], None, 3)).unwrap();
        assert!(layout.entries(&[1, 0, 0, 1, 0]).is_err());
    }
}
