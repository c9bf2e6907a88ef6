//! High-level PDF Reader API
//!
//! Opens a document in two steps. Construction validates the file frame and
//! walks the cross-reference chain, leaving one stub per object. Once the
//! password question is settled the reader becomes active: every object is
//! parsed, stream lengths are verified, strings are decrypted, object streams
//! are expanded and the page tree is flattened.

use super::header::{FileFrame, PdfVersion};
use super::indirect_object::{IndirectObject, ObjectBody};
use super::lexer::{Lexer, LexerMode};
use super::objects::{Keyword, PdfArray, PdfDictionary, PdfObject};
use super::source::{ByteSource, FileSource, MemorySource};
use super::{filters, ParseError, ParseOptions, ParseResult};
use crate::encryption::{
    CryptoEngine, DecryptionStatus, EncryptionDictionary, EncryptionType, Permissions,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// High-level PDF reader
pub struct PdfReader<S: ByteSource> {
    pub(crate) lexer: Lexer<S>,
    pub(crate) options: ParseOptions,
    pub(crate) frame: FileFrame,
    /// Every object named by the cross-reference chain, by object number
    pub(crate) objects: BTreeMap<u32, IndirectObject>,
    pub(crate) trailer: Option<PdfDictionary>,
    /// Object streams holding at least one compressed object
    pub(crate) object_streams: BTreeSet<u32>,
    document_id: Option<Vec<u8>>,
    /// Object holding the encryption dictionary; never decrypted
    encrypt_object: Option<u32>,
    encryption_dict: Option<PdfDictionary>,
    crypto: Option<CryptoEngine>,
    decryption_status: DecryptionStatus,
    active: bool,
    invalid_file: bool,
    warnings: Vec<String>,
    catalog: Option<u32>,
    pub(crate) pages_object: Option<u32>,
    pub(crate) page_count: i32,
    pub(crate) pages: Option<Vec<u32>>,
    pub(crate) unsupported_page_tree: bool,
}

impl PdfReader<FileSource<File>> {
    /// Open a PDF file from a path with the empty password
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::open_with_options(path, None, ParseOptions::lenient())
    }

    /// Open a PDF file from a path with strict parsing
    pub fn open_strict<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::open_with_options(path, None, ParseOptions::strict())
    }

    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        password: Option<&str>,
        options: ParseOptions,
    ) -> ParseResult<Self> {
        let file = File::open(path)?;
        Self::new_with_options(FileSource::new(file)?, password, options)
    }
}

impl PdfReader<MemorySource<Vec<u8>>> {
    /// Read a document held in memory
    pub fn from_bytes(data: Vec<u8>) -> ParseResult<Self> {
        Self::from_bytes_with_options(data, None, ParseOptions::default())
    }

    pub fn from_bytes_with_options(
        data: Vec<u8>,
        password: Option<&str>,
        options: ParseOptions,
    ) -> ParseResult<Self> {
        Self::new_with_options(MemorySource::new(data), password, options)
    }
}

impl<R: Read + Seek> PdfReader<FileSource<R>> {
    /// Read from any seekable reader
    pub fn from_reader(reader: R) -> ParseResult<Self> {
        Self::new_with_options(FileSource::new(reader)?, None, ParseOptions::default())
    }
}

impl<S: ByteSource> PdfReader<S> {
    /// Create a reader over `source`. When the document is encrypted and the
    /// password (empty when `None`) is rejected, the reader is returned
    /// inactive; see [`PdfReader::decryption_status`] and
    /// [`PdfReader::test_password`].
    pub fn new_with_options(
        mut source: S,
        password: Option<&str>,
        options: ParseOptions,
    ) -> ParseResult<Self> {
        let frame = FileFrame::parse(&mut source, &options)?;
        tracing::debug!(
            "PDF {} header at {}, startxref {}",
            frame.version,
            frame.start_position,
            frame.startxref
        );

        let lexer = Lexer::new(source, LexerMode::Document)?
            .with_max_depth(options.max_depth)
            .with_lenient(options.lenient_syntax);

        let mut reader = Self {
            lexer,
            options,
            frame,
            objects: BTreeMap::new(),
            trailer: None,
            object_streams: BTreeSet::new(),
            document_id: None,
            encrypt_object: None,
            encryption_dict: None,
            crypto: None,
            decryption_status: DecryptionStatus::FileNotProtected,
            active: false,
            invalid_file: false,
            warnings: Vec::new(),
            catalog: None,
            pages_object: None,
            page_count: 0,
            pages: None,
            unsupported_page_tree: false,
        };

        reader.read_xref_chain()?;
        reader.open_document(password)?;
        Ok(reader)
    }

    /// Settle encryption, then activate the reader when the document is readable
    fn open_document(&mut self, password: Option<&str>) -> ParseResult<()> {
        let trailer = self
            .trailer
            .as_ref()
            .ok_or_else(|| ParseError::InvalidTrailer("no trailer dictionary".to_string()))?;

        self.document_id = trailer
            .get("/ID")
            .and_then(PdfObject::as_array)
            .and_then(|id| id.get(0))
            .and_then(PdfObject::as_string)
            .map(|id| id.as_bytes().to_vec());

        let Some(encrypt) = trailer.get("/Encrypt").cloned() else {
            self.decryption_status = DecryptionStatus::FileNotProtected;
            return self.set_reader_active();
        };

        let dict = match encrypt {
            PdfObject::Reference(number) => {
                self.read_object(number)?;
                self.encrypt_object = Some(number);
                let object = self
                    .objects
                    .get_mut(&number)
                    .ok_or(ParseError::InvalidReference(number))?;
                object.set_type_hint("/Encryption");
                object.dictionary().cloned()
            }
            PdfObject::Dictionary(dict) => Some(dict),
            _ => None,
        }
        .ok_or_else(|| ParseError::InvalidTrailer("/Encrypt is not a dictionary".to_string()))?;

        let document_id = self
            .document_id
            .clone()
            .ok_or_else(|| ParseError::MissingKey("/ID in encrypted document".to_string()))?;

        let parsed = EncryptionDictionary::from_dict(&dict);
        self.encryption_dict = Some(dict);
        match parsed {
            None => {
                tracing::debug!("Encryption dictionary describes an unsupported handler");
                self.decryption_status = DecryptionStatus::Unsupported;
            }
            Some(parsed) => {
                self.crypto = Some(CryptoEngine::new(&parsed, document_id));
                self.test_password(password.unwrap_or(""))?;
            }
        }
        Ok(())
    }

    /// Try another password on an encrypted document. Returns true when the
    /// reader is (or already was) active.
    pub fn test_password(&mut self, password: &str) -> ParseResult<bool> {
        if self.active {
            return Ok(true);
        }
        let Some(crypto) = self.crypto.as_mut() else {
            return Ok(false);
        };

        let status = crypto.test_password(password)?;
        self.decryption_status = status;
        if !status.is_readable() {
            return Ok(false);
        }
        self.set_reader_active()?;
        Ok(true)
    }

    fn set_reader_active(&mut self) -> ParseResult<()> {
        let numbers: Vec<u32> = self.objects.keys().copied().collect();
        for &number in &numbers {
            self.read_object(number)?;
        }
        for &number in &numbers {
            self.resolve_stream_length(number)?;
        }

        self.decrypt_all_strings();

        let object_streams: Vec<u32> = self.object_streams.iter().copied().collect();
        for number in object_streams {
            self.process_object_stream(number)?;
        }

        self.locate_page_tree()?;
        self.active = true;

        if self.pages_object.is_none() {
            self.pages = None;
        } else if let Err(err) = self.build_page_array() {
            self.pages = None;
            self.flag_anomaly(format!("Page tree could not be flattened: {err}"));
        }
        Ok(())
    }

    /// Parse the body of a free, uncompressed object
    pub(crate) fn read_object(&mut self, number: u32) -> ParseResult<()> {
        let object = self
            .objects
            .get_mut(&number)
            .ok_or(ParseError::InvalidReference(number))?;
        if !object.is_free() || object.parent().is_some() {
            return Ok(());
        }

        Self::parse_object(&mut self.lexer, self.frame.start_position, object)?;
        if self.lexer.take_tolerated_anomaly() {
            self.flag_anomaly(format!(
                "Object {number}: stream keyword followed by CR without LF"
            ));
        }
        Ok(())
    }

    /// Parse `N 0 obj ... endobj` at the object's file position
    pub(crate) fn parse_object(
        lexer: &mut Lexer<S>,
        start: u64,
        object: &mut IndirectObject,
    ) -> ParseResult<()> {
        let number = object.object_number();
        lexer.set_position(start + object.file_position())?;
        if lexer.parse_object_header()? != Some(number) {
            return Err(ParseError::object(
                number,
                format!("no object header at position {}", object.file_position()),
            ));
        }

        let missing_endobj = || ParseError::object(number, "'endobj' token is missing");
        let value = lexer.parse_next_item()?.ok_or_else(missing_endobj)?;

        object.body = match value {
            PdfObject::Dictionary(dict) => {
                if let Some(type_name) = dict.get_type() {
                    object.set_type_hint(type_name);
                }
                match lexer.parse_next_item()? {
                    Some(PdfObject::Keyword(Keyword::Stream)) => ObjectBody::Stream {
                        dictionary: dict,
                        position: lexer.raw_position() - start,
                        length: 0,
                    },
                    Some(PdfObject::Keyword(Keyword::EndObj)) => ObjectBody::Dictionary(dict),
                    _ => return Err(missing_endobj()),
                }
            }
            // An empty object body is the null object
            PdfObject::Keyword(Keyword::EndObj) => ObjectBody::Other(PdfObject::Null),
            value => match lexer.parse_next_item()? {
                Some(PdfObject::Keyword(Keyword::EndObj)) => ObjectBody::Other(value),
                _ => return Err(missing_endobj()),
            },
        };
        Ok(())
    }

    /// Settle the data length of a stream object. A `/Length` reference is
    /// replaced by its value. A length that does not end in front of
    /// `endstream endobj` becomes zero and flags the file.
    fn resolve_stream_length(&mut self, number: u32) -> ParseResult<()> {
        let Some(object) = self.objects.get(&number) else {
            return Ok(());
        };
        let (Some(dict), true) = (object.dictionary(), object.is_stream()) else {
            return Ok(());
        };
        let position = object.stream_position();
        let length_entry = dict.get("/Length").cloned();

        let declared = match length_entry {
            Some(PdfObject::Integer(length)) => Some(length),
            Some(PdfObject::Reference(target)) => {
                let resolved = self
                    .objects
                    .get(&target)
                    .and_then(IndirectObject::value)
                    .and_then(PdfObject::as_integer);
                if let (Some(length), Some(dict)) = (
                    resolved,
                    self.objects
                        .get_mut(&number)
                        .and_then(IndirectObject::dictionary_mut),
                ) {
                    dict.insert("/Length", PdfObject::Integer(length));
                }
                resolved
            }
            _ => None,
        };

        let length = match declared.and_then(|length| u64::try_from(length).ok()) {
            Some(0) => 0,
            Some(length) if self.ends_with_endstream(position + length) => length,
            _ => {
                self.tolerate(ParseError::object(
                    number,
                    format!("stream /Length {declared:?} does not end at 'endstream'"),
                ))?;
                0
            }
        };

        if let Some(object) = self.objects.get_mut(&number) {
            object.set_stream_length(length);
        }
        Ok(())
    }

    /// True when `endstream` and `endobj` follow `position`
    fn ends_with_endstream(&mut self, position: u64) -> bool {
        let absolute = self.frame.start_position + position;
        if absolute >= self.lexer.len() {
            return false;
        }
        let lexer = &mut self.lexer;
        let mut probe = || -> ParseResult<bool> {
            lexer.set_position(absolute)?;
            let first = lexer.parse_next_item()?;
            let second = lexer.parse_next_item()?;
            Ok(matches!(
                (first, second),
                (
                    Some(PdfObject::Keyword(Keyword::EndStream)),
                    Some(PdfObject::Keyword(Keyword::EndObj))
                )
            ))
        };
        probe().unwrap_or(false)
    }

    /// Decrypt the strings of every uncompressed object except the encryption
    /// dictionary and cross-reference streams
    fn decrypt_all_strings(&mut self) {
        let Some(crypto) = self.crypto.as_ref().filter(|crypto| crypto.has_key()) else {
            return;
        };

        let mut failures = Vec::new();
        for (&number, object) in self.objects.iter_mut() {
            if Some(number) == self.encrypt_object
                || object.parent().is_some()
                || object.type_name() == Some("/XRef")
            {
                continue;
            }
            let mut decrypt = |data: &[u8]| crypto.decrypt(number, data);
            let failed = match &mut object.body {
                ObjectBody::Other(value) => value.decrypt_strings(&mut decrypt),
                ObjectBody::Dictionary(dict) | ObjectBody::Stream { dictionary: dict, .. } => {
                    dict.decrypt_strings(&mut decrypt)
                }
                ObjectBody::Free => 0,
            };
            if failed > 0 {
                failures.push((number, failed));
            }
        }

        for (number, failed) in failures {
            self.flag_anomaly(format!(
                "Object {number}: {failed} string(s) could not be decrypted"
            ));
        }
    }

    /// Find the catalog and the root of the page tree
    fn locate_page_tree(&mut self) -> ParseResult<()> {
        let root = self
            .trailer
            .as_ref()
            .and_then(|trailer| trailer.get("/Root"))
            .and_then(PdfObject::as_reference)
            .ok_or_else(|| ParseError::MissingKey("/Root in trailer".to_string()))?;
        let catalog = self
            .objects
            .get(&root)
            .and_then(IndirectObject::dictionary)
            .cloned()
            .ok_or_else(|| ParseError::object(root, "catalog is not a dictionary"))?;

        for (key, value) in catalog.iter() {
            if let Some(object) = value
                .as_reference()
                .and_then(|target| self.objects.get_mut(&target))
            {
                object.set_type_hint(key.as_str());
            }
        }
        self.catalog = Some(root);

        let Some(pages) = catalog.get("/Pages").and_then(PdfObject::as_reference) else {
            self.flag_anomaly("Catalog has no /Pages reference".to_string());
            return Ok(());
        };
        let Some(pages_dict) = self
            .objects
            .get(&pages)
            .and_then(IndirectObject::dictionary)
        else {
            self.flag_anomaly(format!("Page tree root {pages} is not a dictionary"));
            return Ok(());
        };

        let count = pages_dict.get_integer("/Count");
        let entries = pages_dict.len();
        self.page_count = count.unwrap_or(0);
        if count.is_none() {
            self.flag_anomaly(format!("Page tree root {pages} has no /Count"));
        }
        // /Type /Kids /Count only; anything else would be inherited by the pages
        let inherits = self.page_count > 0 && entries != 3;
        self.pages_object = Some(pages);
        if inherits {
            self.note_unsupported_page_tree(pages);
        }
        Ok(())
    }

    /// Page tree nodes carry attributes the pages would inherit
    pub(crate) fn note_unsupported_page_tree(&mut self, node: u32) {
        if self.unsupported_page_tree {
            return;
        }
        self.unsupported_page_tree = true;
        tracing::warn!("Page tree node {} carries inheritable attributes", node);
        if self.options.collect_warnings {
            self.warnings
                .push(format!("Page tree node {node} carries inheritable attributes"));
        }
    }

    /// Record a tolerated defect
    pub(crate) fn flag_anomaly(&mut self, message: String) {
        self.invalid_file = true;
        tracing::warn!("{}", message);
        if self.options.collect_warnings {
            self.warnings.push(message);
        }
    }

    /// Fail in strict mode, flag the file otherwise
    pub(crate) fn tolerate(&mut self, error: ParseError) -> ParseResult<()> {
        if !self.options.lenient_syntax {
            return Err(error);
        }
        self.flag_anomaly(error.to_string());
        Ok(())
    }

    pub(crate) fn ensure_active(&self) -> ParseResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(ParseError::NotActive)
        }
    }

    /// Jump to a document offset
    pub(crate) fn seek(&mut self, position: u64) -> ParseResult<()> {
        let absolute = self.frame.start_position + position;
        if absolute >= self.lexer.len() {
            return Err(ParseError::InvalidXRef(format!(
                "offset {position} is past the end of the file"
            )));
        }
        self.lexer.set_position(absolute)
    }

    /// Stream data as stored in the file, decrypted
    pub(crate) fn fetch_stream(&mut self, number: u32) -> ParseResult<Vec<u8>> {
        let object = self
            .objects
            .get(&number)
            .ok_or(ParseError::InvalidReference(number))?;
        if !object.is_stream() {
            return Err(ParseError::object(number, "object is not a stream"));
        }
        let is_xref = object.type_name() == Some("/XRef");
        let length = usize::try_from(object.stream_length())
            .map_err(|_| ParseError::object(number, "stream length overflow"))?;
        let position = self.frame.start_position + object.stream_position();

        let data = self.lexer.read_raw(position, length)?;
        match &self.crypto {
            Some(crypto) if crypto.has_key() && !is_xref => Ok(crypto.decrypt(number, &data)?),
            _ => Ok(data),
        }
    }

    /// Apply the filters of stream `number` to `data`. DCT data is marked as
    /// a JPEG image.
    pub(crate) fn decode_stream_data(
        &mut self,
        number: u32,
        data: Vec<u8>,
    ) -> ParseResult<Option<Vec<u8>>> {
        let object = self
            .objects
            .get_mut(&number)
            .ok_or(ParseError::InvalidReference(number))?;
        let dict = object
            .dictionary()
            .ok_or_else(|| ParseError::object(number, "object is not a stream"))?;

        let chain = filters::filter_chain(dict)?;
        let decoded = filters::decode_with_filters(data, &chain, dict)?;
        if decoded.is_some() && chain.contains(&filters::Filter::DCTDecode) {
            object.set_type_hint("/JpegImage");
        }
        Ok(decoded)
    }

    /// Decrypted but still encoded stream data
    pub fn read_stream(&mut self, number: u32) -> ParseResult<Vec<u8>> {
        self.ensure_active()?;
        self.fetch_stream(number)
    }

    /// Decode `data` read from stream `number`. `None` when a filter is not
    /// supported.
    pub fn decompress_stream(
        &mut self,
        number: u32,
        data: Vec<u8>,
    ) -> ParseResult<Option<Vec<u8>>> {
        self.ensure_active()?;
        self.decode_stream_data(number, data)
    }

    /// Read and decode stream `number`
    pub fn decoded_stream(&mut self, number: u32) -> ParseResult<Option<Vec<u8>>> {
        let data = self.read_stream(number)?;
        self.decode_stream_data(number, data)
    }

    pub fn object(&self, number: u32) -> Option<&IndirectObject> {
        self.objects.get(&number)
    }

    /// All objects in object number order
    pub fn objects(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn trailer(&self) -> Option<&PdfDictionary> {
        self.trailer.as_ref()
    }

    /// Catalog object number
    pub fn catalog(&self) -> Option<u32> {
        self.catalog
    }

    /// A dictionary given directly or by reference
    pub fn dictionary_of<'a>(&'a self, value: &'a PdfObject) -> Option<&'a PdfDictionary> {
        match value {
            PdfObject::Dictionary(dict) => Some(dict),
            PdfObject::Reference(number) => self.object(*number)?.dictionary(),
            _ => None,
        }
    }

    /// An array given directly or by reference
    pub fn array_of<'a>(&'a self, value: &'a PdfObject) -> Option<&'a PdfArray> {
        match value {
            PdfObject::Array(array) => Some(array),
            PdfObject::Reference(number) => self.object(*number)?.value()?.as_array(),
            _ => None,
        }
    }

    pub fn version(&self) -> PdfVersion {
        self.frame.version
    }

    pub fn frame(&self) -> &FileFrame {
        &self.frame
    }

    /// Get parsing options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn decryption_status(&self) -> DecryptionStatus {
        self.decryption_status
    }

    /// Check if the PDF is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.encryption_dict.is_some()
    }

    pub fn encryption_dictionary(&self) -> Option<&PdfDictionary> {
        self.encryption_dict.as_ref()
    }

    pub fn encryption_type(&self) -> Option<EncryptionType> {
        self.encryption_dict.as_ref().map(EncryptionDictionary::support)
    }

    /// Permissions granted by `/P`; everything for unprotected files
    pub fn permissions(&self) -> Permissions {
        match &self.crypto {
            Some(crypto) => crypto.permissions(),
            None => Permissions::all(),
        }
    }

    pub fn document_id(&self) -> Option<&[u8]> {
        self.document_id.as_deref()
    }

    /// True once objects, streams and the page tree are available
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True when a non-conforming construct was tolerated
    pub fn is_invalid_file(&self) -> bool {
        self.invalid_file
    }

    /// True when page tree nodes carry attributes that are not propagated to
    /// the pages
    pub fn has_unsupported_page_tree(&self) -> bool {
        self.unsupported_page_tree
    }

    /// Messages for every tolerated anomaly
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// `/Count` of the page tree root
    pub fn page_count(&self) -> i32 {
        self.page_count
    }

    /// Page object numbers in document order; `None` when the page tree could
    /// not be flattened
    pub fn pages(&self) -> Option<&[u32]> {
        self.pages.as_deref()
    }
}
