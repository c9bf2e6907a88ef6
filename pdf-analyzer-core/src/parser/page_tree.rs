//! PDF Page Tree
//!
//! Flattens the page tree (ISO 32000-1 Section 7.7.3) into the list of page
//! objects in document order and gathers the content streams of each page.
//!
//! # Overview
//!
//! - **Page tree nodes** (`/Type /Pages`) hold `/Kids` and `/Count`
//! - **Page objects** (`/Type /Page`) are the leaves
//! - **Inherited attributes** on intermediate nodes are detected but not
//!   propagated; [`PdfReader::has_unsupported_page_tree`] reports them
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_analyzer::parser::PdfReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = PdfReader::open("document.pdf")?;
//!
//! for index in 0..reader.pages().map_or(0, |pages| pages.len()) {
//!     for operation in reader.page_operations(index)? {
//!         println!("{:?} {:?}", operation.operator, operation.operands);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use super::content::{parse_contents, ContentOperation};
use super::indirect_object::IndirectObject;
use super::objects::PdfObject;
use super::reader::PdfReader;
use super::source::ByteSource;
use super::{ParseError, ParseResult};
use std::collections::HashSet;

/// Keys of an intermediate node that carries nothing for its pages to inherit
const PLAIN_NODE_KEYS: usize = 4;

impl<S: ByteSource> PdfReader<S> {
    /// Walk the tree from the root node. The number of leaves must match the
    /// root's `/Count`.
    pub(crate) fn build_page_array(&mut self) -> ParseResult<()> {
        let root = self
            .pages_object
            .ok_or_else(|| ParseError::InvalidPageTree("no /Pages root".to_string()))?;

        let mut pages = Vec::new();
        let mut visited = HashSet::from([root]);
        self.collect_pages(root, 0, &mut visited, &mut pages)?;

        if i64::try_from(pages.len()).ok() != Some(i64::from(self.page_count)) {
            return Err(ParseError::InvalidPageTree(format!(
                "/Count is {} but the tree holds {} pages",
                self.page_count,
                pages.len()
            )));
        }
        self.pages = Some(pages);
        Ok(())
    }

    fn collect_pages(
        &mut self,
        node: u32,
        depth: usize,
        visited: &mut HashSet<u32>,
        pages: &mut Vec<u32>,
    ) -> ParseResult<()> {
        if depth > self.options.max_depth {
            return Err(ParseError::TooDeep(self.options.max_depth));
        }

        for kid in self.kids_array(node)? {
            if !visited.insert(kid) {
                return Err(ParseError::CircularReference(format!(
                    "page tree node {kid} is reached twice"
                )));
            }
            let Some(object) = self.objects.get(&kid) else {
                continue;
            };
            if object.type_name() == Some("/Page") {
                pages.push(kid);
                continue;
            }

            let key_count = object.dictionary().map_or(0, |dict| dict.len());
            if key_count > PLAIN_NODE_KEYS {
                self.note_unsupported_page_tree(kid);
            }
            self.collect_pages(kid, depth + 1, visited, pages)?;
        }
        Ok(())
    }

    /// Object numbers in `/Kids` of `node`. Every kid must be a page or a
    /// page tree node. `/Kids` may itself be a reference to an array.
    pub fn kids_array(&self, node: u32) -> ParseResult<Vec<u32>> {
        let dict = self
            .object(node)
            .and_then(IndirectObject::dictionary)
            .ok_or_else(|| {
                ParseError::InvalidPageTree(format!("node {node} is not a dictionary"))
            })?;
        let kids = dict
            .get("/Kids")
            .ok_or_else(|| ParseError::MissingKey(format!("/Kids in page tree node {node}")))?;
        let kids = self.array_of(kids).ok_or_else(|| {
            ParseError::InvalidPageTree(format!("/Kids of node {node} is not an array"))
        })?;

        kids.iter()
            .map(|kid| {
                let number = kid.as_reference().ok_or_else(|| {
                    ParseError::InvalidPageTree(format!("node {node} has a direct kid"))
                })?;
                let object = self
                    .object(number)
                    .ok_or(ParseError::InvalidReference(number))?;
                match (object.dictionary(), object.type_name()) {
                    (Some(_), Some("/Page" | "/Pages")) => Ok(number),
                    _ => Err(ParseError::InvalidPageTree(format!(
                        "kid {number} of node {node} is neither a page nor a page tree node"
                    ))),
                }
            })
            .collect()
    }

    /// Content stream object numbers of `page`, in drawing order. The list is
    /// computed once; each stream is tagged `/Contents`.
    pub fn contents_array(&mut self, page: u32) -> ParseResult<Vec<u32>> {
        let object = self
            .objects
            .get(&page)
            .ok_or(ParseError::InvalidReference(page))?;
        if let Some(contents) = object.contents() {
            return Ok(contents.to_vec());
        }
        if object.type_name() != Some("/Page") {
            return Err(ParseError::object(page, "object is not a page"));
        }
        let not_stream = |number: u32| {
            ParseError::object(page, format!("/Contents entry {number} is not a stream"))
        };

        let streams: Vec<u32> = match object.dictionary().and_then(|dict| dict.get("/Contents")) {
            None => Vec::new(),
            Some(PdfObject::Reference(target)) => {
                let target = *target;
                match self.object(target) {
                    Some(contents) if contents.is_stream() => vec![target],
                    Some(contents) => match contents.value().and_then(PdfObject::as_array) {
                        Some(array) => stream_references(array.iter(), page)?,
                        None => return Err(not_stream(target)),
                    },
                    None => return Err(ParseError::InvalidReference(target)),
                }
            }
            Some(PdfObject::Array(array)) => stream_references(array.iter(), page)?,
            Some(_) => {
                return Err(ParseError::object(
                    page,
                    "/Contents must be a stream or an array of streams",
                ))
            }
        };

        for &number in &streams {
            let stream = self
                .objects
                .get_mut(&number)
                .filter(|stream| stream.is_stream())
                .ok_or_else(|| not_stream(number))?;
            stream.set_type_hint("/Contents");
        }
        if let Some(object) = self.objects.get_mut(&page) {
            object.contents = Some(streams.clone());
        }
        Ok(streams)
    }

    /// Decoded content streams of page `index`, joined by a newline. Empty
    /// streams are skipped.
    pub fn page_contents(&mut self, index: usize) -> ParseResult<Vec<u8>> {
        self.ensure_active()?;
        let page = self
            .pages
            .as_ref()
            .and_then(|pages| pages.get(index))
            .copied()
            .ok_or_else(|| ParseError::InvalidPageTree(format!("no page at index {index}")))?;

        let mut contents = Vec::new();
        for number in self.contents_array(page)? {
            if self.object(number).map_or(0, IndirectObject::stream_length) == 0 {
                continue;
            }
            let raw = self.fetch_stream(number)?;
            let decoded = self.decode_stream_data(number, raw)?.ok_or_else(|| {
                ParseError::StreamDecodeError(format!(
                    "content stream {number} uses an unsupported filter"
                ))
            })?;
            if !contents.is_empty() {
                contents.push(b'\n');
            }
            contents.extend_from_slice(&decoded);
        }
        Ok(contents)
    }

    /// Operators of page `index`
    pub fn page_operations(&mut self, index: usize) -> ParseResult<Vec<ContentOperation>> {
        let contents = self.page_contents(index)?;
        parse_contents(&contents)
    }
}

fn stream_references<'a>(
    items: impl Iterator<Item = &'a PdfObject>,
    page: u32,
) -> ParseResult<Vec<u32>> {
    items
        .map(|item| {
            item.as_reference().ok_or_else(|| {
                ParseError::object(page, "/Contents array must hold references")
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::parser::test_helpers::TestDocument;
    use crate::parser::{Operator, ParseError, PdfReader};

    fn two_level_tree(middle_entries: &str) -> Vec<u8> {
        TestDocument::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R 6 0 R] /Count 3 >>")
            .object(
                3,
                &format!("<< /Type /Pages /Parent 2 0 R /Kids [4 0 R 5 0 R] /Count 2 {middle_entries} >>"),
            )
            .object(4, "<< /Type /Page /Parent 3 0 R /Contents [7 0 R 8 0 R] >>")
            .object(5, "<< /Type /Page /Parent 3 0 R >>")
            .object(6, "<< /Type /Page /Parent 2 0 R /Contents 7 0 R >>")
            .stream(7, "", b"q 1 0 0 1 0 0 cm")
            .stream(8, "", b"Q")
            .finish("/Root 1 0 R")
    }

    #[test]
    fn test_pages_in_document_order() {
        let reader = PdfReader::from_bytes(two_level_tree("")).unwrap();
        assert_eq!(reader.pages(), Some(&[4, 5, 6][..]));
        assert!(!reader.has_unsupported_page_tree());
        assert_eq!(reader.kids_array(3).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_inherited_attributes_are_flagged() {
        let reader =
            PdfReader::from_bytes(two_level_tree("/Resources << /Font << >> >>")).unwrap();
        assert_eq!(reader.pages().map(<[u32]>::len), Some(3));
        assert!(reader.has_unsupported_page_tree());
        assert!(!reader.is_invalid_file());
    }

    #[test]
    fn test_contents_are_joined() {
        let mut reader = PdfReader::from_bytes(two_level_tree("")).unwrap();
        assert_eq!(reader.page_contents(0).unwrap(), b"q 1 0 0 1 0 0 cm\nQ");
        assert_eq!(reader.contents_array(4).unwrap(), vec![7, 8]);
        assert_eq!(reader.object(8).unwrap().type_hint(), Some("/Contents"));
        assert_eq!(reader.object(4).unwrap().contents(), Some(&[7, 8][..]));

        assert!(reader.page_contents(1).unwrap().is_empty());

        let ops = reader.page_operations(2).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operator, Operator::SaveGraphicsState);
        assert_eq!(ops[1].operator, Operator::TransMatrix);
        assert_eq!(ops[1].operands.len(), 6);

        assert!(matches!(
            reader.page_contents(3),
            Err(ParseError::InvalidPageTree(_))
        ));
    }

    #[test]
    fn test_contents_by_reference_to_array() {
        let data = TestDocument::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
            .object(3, "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>")
            .object(4, "[5 0 R 6 0 R]")
            .stream(5, "", b"BT")
            .stream(6, "", b"ET")
            .finish("/Root 1 0 R");
        let mut reader = PdfReader::from_bytes(data).unwrap();
        assert_eq!(reader.page_contents(0).unwrap(), b"BT\nET");
    }

    #[test]
    fn test_count_mismatch_is_not_fatal() {
        let data = TestDocument::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 2 >>")
            .object(3, "<< /Type /Page /Parent 2 0 R >>")
            .finish("/Root 1 0 R");
        let mut reader = PdfReader::from_bytes(data).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.pages(), None);
        assert!(reader.is_invalid_file());
        assert!(reader.page_contents(0).is_err());
    }

    #[test]
    fn test_cyclic_tree() {
        let data = TestDocument::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
            .object(3, "<< /Type /Pages /Parent 2 0 R /Kids [2 0 R] /Count 1 >>")
            .finish("/Root 1 0 R");
        let reader = PdfReader::from_bytes(data).unwrap();
        assert_eq!(reader.pages(), None);
        assert!(reader.warnings()[0].contains("reached twice"));
    }

    #[test]
    fn test_kid_of_wrong_type() {
        let data = TestDocument::new()
            .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
            .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
            .object(3, "<< /Type /Font >>")
            .finish("/Root 1 0 R");
        let reader = PdfReader::from_bytes(data).unwrap();
        assert!(reader.kids_array(2).is_err());
        assert_eq!(reader.pages(), None);
    }
}
