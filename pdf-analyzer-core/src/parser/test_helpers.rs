//! Helpers for creating test PDFs with correct xref offsets

use std::collections::BTreeMap;

/// Document body assembled object by object; `finish` appends a classic
/// cross-reference table that points at every object.
pub struct TestDocument {
    data: Vec<u8>,
    offsets: BTreeMap<u32, usize>,
}

impl TestDocument {
    pub fn new() -> Self {
        Self {
            data: b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec(),
            offsets: BTreeMap::new(),
        }
    }

    /// `N 0 obj <body> endobj`
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

    /// Stream object with a direct `/Length`; `entries` are extra dictionary entries
    pub fn stream(self, number: u32, entries: &str, data: &[u8]) -> Self {
        let mut body = format!("<< {entries} /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.raw_object(number, &body)
    }

    /// Uncompressed `/ObjStm` holding `children` in order
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
        let data = format!("{header}{bodies}");
        self.stream(number, &entries, data.as_bytes())
    }

    /// Arbitrary bytes listed in the xref under `number`
    pub fn raw_at(mut self, number: u32, bytes: &[u8]) -> Self {
        self.offsets.insert(number, self.data.len());
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn offset(&self, number: u32) -> usize {
        self.offsets[&number]
    }

    /// Append the xref table, the trailer with `/Size` plus `entries`, and
    /// the file end
    pub fn finish(mut self, entries: &str) -> Vec<u8> {
        let size = self.offsets.keys().next_back().map_or(1, |&n| n + 1);
        let xref = self.data.len();

        let mut table = format!("xref\n0 {size}\n");
        for number in 0..size {
            match self.offsets.get(&number) {
                Some(offset) => table.push_str(&format!("{offset:010} 00000 n \n")),
                None => table.push_str("0000000000 65535 f \n"),
            }
        }
        table.push_str(&format!(
            "trailer\n<< /Size {size} {entries} >>\nstartxref\n{xref}\n%%EOF\n"
        ));
        self.data.extend_from_slice(table.as_bytes());
        self.data
    }

    /// Append an uncompressed cross-reference stream as object `number`.
    /// `compressed` lists `(object, object stream, index)` triples.
    pub fn finish_xref_stream(
        mut self,
        number: u32,
        compressed: &[(u32, u32, u32)],
        entries: &str,
    ) -> Vec<u8> {
        let xref = self.data.len();
        self.offsets.insert(number, xref);
        let size = self
            .offsets
            .keys()
            .chain(compressed.iter().map(|(n, _, _)| n))
            .max()
            .map_or(1, |&n| n + 1);

        let mut table = Vec::new();
        for object in 0..size {
            if let Some(&(_, stream, index)) = compressed.iter().find(|(n, _, _)| *n == object) {
                table.push(2);
                table.extend_from_slice(&stream.to_be_bytes());
                table.extend_from_slice(&(index as u16).to_be_bytes());
            } else if let Some(&offset) = self.offsets.get(&object) {
                table.push(1);
                table.extend_from_slice(&(offset as u32).to_be_bytes());
                table.extend_from_slice(&[0, 0]);
            } else {
                table.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0]);
            }
        }

        self.data.extend_from_slice(
            format!(
                "{number} 0 obj\n<< /Type /XRef /Size {size} /W [1 4 2] {entries} /Length {} >>\nstream\n",
                table.len()
            )
            .as_bytes(),
        );
        self.data.extend_from_slice(&table);
        self.data.extend_from_slice(
            format!("\nendstream\nendobj\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
        );
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_point_at_headers() {
        let doc = TestDocument::new()
            .object(1, "<< /Type /Catalog >>")
            .object(3, "42");
        let one = doc.offset(1);
        let three = doc.offset(3);
        let data = doc.finish("/Root 1 0 R");

        assert!(data[one..].starts_with(b"1 0 obj"));
        assert!(data[three..].starts_with(b"3 0 obj\n42\nendobj"));
        let text = String::from_utf8_lossy(&data);
        assert!(text.contains("xref\n0 4\n0000000000 65535 f \n"));
        assert!(text.contains("0000000000 65535 f \n"));
        assert!(text.ends_with("%%EOF\n"));
    }
}
