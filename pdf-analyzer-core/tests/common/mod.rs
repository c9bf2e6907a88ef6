//! Builders for synthetic PDF files with correct cross-reference offsets

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// PNG Up rows of `columns` bytes, as written by predictor 12 encoders
pub fn png_up_encode(data: &[u8], columns: usize) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(data.len() + data.len() / columns);
    let mut previous = vec![0u8; columns];
    for row in data.chunks(columns) {
        encoded.push(2);
        for (index, &byte) in row.iter().enumerate() {
            encoded.push(byte.wrapping_sub(previous[index]));
            previous[index] = byte;
        }
    }
    encoded
}

/// ASCII85 with `z` for zero groups and the `~>` end marker
pub fn ascii85_encode(data: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(data.len() * 5 / 4 + 8);
    for chunk in data.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(group);
        if chunk.len() == 4 && value == 0 {
            encoded.push(b'z');
            continue;
        }
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + b'!';
            value /= 85;
        }
        encoded.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    encoded.extend_from_slice(b"~>");
    encoded
}

/// LZW stream holding one 9-bit literal code per byte, then end of data.
/// Valid while the code table stays below 511 entries.
pub fn lzw_literals(data: &[u8]) -> Vec<u8> {
    let codes = data.iter().map(|&b| u16::from(b)).chain([257]);
    let mut out = Vec::new();
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for code in codes {
        buffer = (buffer << 9) | u32::from(code);
        bits += 9;
        while bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    if bits > 0 {
        out.push((buffer << (8 - bits)) as u8);
    }
    out
}

/// One cross-reference stream row for `/W [1 4 2]`
#[derive(Debug, Clone, Copy)]
pub enum Row {
    Free,
    InUse(usize),
    Compressed(u32, u16),
}

impl Row {
    fn encode(self, out: &mut Vec<u8>) {
        let (kind, field2, field3) = match self {
            Row::Free => (0u8, 0u32, 0u16),
            Row::InUse(offset) => (1, offset as u32, 0),
            Row::Compressed(stream, index) => (2, stream, index),
        };
        out.push(kind);
        out.extend_from_slice(&field2.to_be_bytes());
        out.extend_from_slice(&field3.to_be_bytes());
    }
}

pub struct PdfBuilder {
    data: Vec<u8>,
    offsets: BTreeMap<u32, usize>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::with_version("1.5")
    }

    pub fn with_version(version: &str) -> Self {
        let mut data = format!("%PDF-{version}\n").into_bytes();
        data.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Self {
            data,
            offsets: BTreeMap::new(),
        }
    }

    pub fn object(self, number: u32, body: &str) -> Self {
        self.raw_object(number, body.as_bytes())
    }

    pub fn raw_object(mut self, number: u32, body: &[u8]) -> Self {
        self.offsets.insert(number, self.data.len());
        self.data
            .extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        self.data.extend_from_slice(body);
        self.data.extend_from_slice(b"\nendobj\n");
        self
    }

    /// Stream with a direct `/Length`; `entries` are extra dictionary entries
    pub fn stream(self, number: u32, entries: &str, data: &[u8]) -> Self {
        let mut body = format!("<< {entries} /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.raw_object(number, &body)
    }

    pub fn flate_stream(self, number: u32, entries: &str, data: &[u8]) -> Self {
        let entries = format!("{entries} /Filter /FlateDecode");
        self.stream(number, &entries, &zlib(data))
    }

    /// Flate compressed `/ObjStm` holding `children` in order
    pub fn object_stream(self, number: u32, children: &[(u32, &str)]) -> Self {
        let mut header = String::new();
        let mut bodies = String::new();
        for (child, body) in children {
            header.push_str(&format!("{child} {} ", bodies.len()));
            bodies.push_str(body);
            bodies.push('\n');
        }
        let entries = format!(
            "/Type /ObjStm /N {} /First {}",
            children.len(),
            header.len()
        );
        self.flate_stream(number, &entries, format!("{header}{bodies}").as_bytes())
    }

    pub fn offset(&self, number: u32) -> usize {
        self.offsets[&number]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Classic table over every object, the trailer and the file end
    pub fn finish(mut self, trailer: &str) -> Vec<u8> {
        let size = self.size();
        let xref = self.data.len();
        let table = self.table(0, size);
        self.data.extend_from_slice(table.as_bytes());
        self.data.extend_from_slice(
            format!("trailer\n<< /Size {size} {trailer} >>\nstartxref\n{xref}\n%%EOF\n")
                .as_bytes(),
        );
        self.data
    }

    /// Flate compressed cross-reference stream with PNG Up rows as object
    /// `number`, covering every object plus `compressed` children given as
    /// `(object, object stream, index)`
    pub fn finish_xref_stream(
        mut self,
        number: u32,
        compressed: &[(u32, u32, u16)],
        trailer: &str,
    ) -> Vec<u8> {
        let xref = self.data.len();
        self.offsets.insert(number, xref);
        let size = compressed
            .iter()
            .map(|(n, _, _)| n + 1)
            .chain([self.size()])
            .max()
            .unwrap_or(1);

        let rows: Vec<Row> = (0..size)
            .map(|object| {
                if let Some(&(_, stream, index)) = compressed.iter().find(|(n, _, _)| *n == object) {
                    Row::Compressed(stream, index)
                } else if let Some(&offset) = self.offsets.get(&object) {
                    Row::InUse(offset)
                } else {
                    Row::Free
                }
            })
            .collect();

        let stream = xref_stream_object(
            number,
            &rows,
            &format!("/Size {size} {trailer}"),
        );
        self.data.extend_from_slice(&stream);
        self.data
            .extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());
        self.data
    }

    /// Hybrid file: a classic table for the plain objects and a trailer whose
    /// `/XRefStm` points at a stream listing only `compressed`
    pub fn finish_hybrid(
        mut self,
        stream_number: u32,
        compressed: &[(u32, u32, u16)],
        trailer: &str,
    ) -> Vec<u8> {
        let first = compressed.iter().map(|(n, _, _)| *n).min().unwrap_or(0);
        let rows: Vec<Row> = compressed
            .iter()
            .map(|&(_, stream, index)| Row::Compressed(stream, index))
            .collect();
        let stream_offset = self.data.len();
        let stream = xref_stream_object(
            stream_number,
            &rows,
            &format!("/Size 1 /Index [{first} {}]", rows.len()),
        );
        self.data.extend_from_slice(&stream);

        let size = self.size().max(stream_number + 1);
        let xref = self.data.len();
        let table = self.table(0, size);
        self.data.extend_from_slice(table.as_bytes());
        self.data.extend_from_slice(
            format!(
                "trailer\n<< /Size {size} /XRefStm {stream_offset} {trailer} >>\nstartxref\n{xref}\n%%EOF\n"
            )
            .as_bytes(),
        );
        self.data
    }

    fn size(&self) -> u32 {
        self.offsets.keys().next_back().map_or(1, |&n| n + 1)
    }

    fn table(&self, first: u32, count: u32) -> String {
        let mut table = format!("xref\n{first} {count}\n");
        for number in first..first + count {
            match self.offsets.get(&number) {
                Some(offset) => table.push_str(&format!("{offset:010} 00000 n \n")),
                None => table.push_str("0000000000 65535 f \n"),
            }
        }
        table
    }
}

fn xref_stream_object(number: u32, rows: &[Row], entries: &str) -> Vec<u8> {
    let mut raw = Vec::with_capacity(rows.len() * 7);
    for row in rows {
        row.encode(&mut raw);
    }
    let data = zlib(&png_up_encode(&raw, 7));

    let mut object = format!(
        "{number} 0 obj\n<< /Type /XRef /W [1 4 2] {entries} /Filter /FlateDecode \
         /DecodeParms << /Predictor 12 /Columns 7 >> /Length {} >>\nstream\n",
        data.len()
    )
    .into_bytes();
    object.extend_from_slice(&data);
    object.extend_from_slice(b"\nendstream\nendobj\n");
    object
}

fn last_startxref(data: &[u8]) -> usize {
    let text = String::from_utf8_lossy(data);
    let start = text.rfind("startxref\n").unwrap() + "startxref\n".len();
    text[start..].lines().next().unwrap().parse().unwrap()
}

/// Append an incremental update with a classic table replacing `objects`
pub fn append_revision(mut data: Vec<u8>, objects: &[(u32, &str)], trailer: &str) -> Vec<u8> {
    let prev = last_startxref(&data);
    let mut table = String::from("xref\n");
    let mut entries = String::new();
    for (number, body) in objects {
        entries.push_str(&format!("{number} 1\n{:010} 00000 n \n", data.len()));
        data.extend_from_slice(format!("{number} 0 obj\n{body}\nendobj\n").as_bytes());
    }
    table.push_str(&entries);
    let xref = data.len();
    table.push_str(&format!(
        "trailer\n<< {trailer} /Prev {prev} >>\nstartxref\n{xref}\n%%EOF\n"
    ));
    data.extend_from_slice(table.as_bytes());
    data
}

/// Catalog in 1, page tree root in 2, one page in 3 with contents in 4
pub fn single_page(builder: PdfBuilder, contents: &[u8]) -> PdfBuilder {
    builder
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>",
        )
        .flate_stream(4, "", contents)
}
