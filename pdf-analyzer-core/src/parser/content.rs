//! PDF Content Stream Parser
//!
//! Splits a decoded content stream into operators with their operands
//! according to ISO 32000-1 Section 7.8.2. Operands are any objects preceding
//! an operator; inline images carry their dictionary and data as operands.

use super::lexer::{Lexer, LexerMode};
use super::objects::PdfObject;
use super::operators::Operator;
use super::output::OutputBuffer;
use super::source::MemorySource;
use super::{ParseError, ParseResult};

/// A single operator in a content stream
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOperation {
    pub operator: Operator,
    pub operands: Vec<PdfObject>,
}

impl ContentOperation {
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            operands: Vec::new(),
        }
    }

    pub fn with_operands(operator: Operator, operands: Vec<PdfObject>) -> Self {
        Self { operator, operands }
    }

    /// Inline image dictionary, for `BI` operations
    pub fn inline_image_dict(&self) -> Option<&super::PdfDictionary> {
        match self.operator {
            Operator::BeginInlineImage => self.operands.first().and_then(PdfObject::as_dict),
            _ => None,
        }
    }

    /// One listing line: operands, mnemonic and the operator name as a comment.
    /// Inline image data is not reproduced.
    pub fn write_to(&self, out: &mut OutputBuffer) {
        if let Some(dict) = self.inline_image_dict() {
            out.add_slice(b"BI ");
            for (key, value) in dict.iter() {
                out.append_token(&key.to_bytes());
                value.write_to(out);
            }
            out.add_slice(b" ID");
            out.append_text("INLINE IMAGE DATA EI % InlineImage");
            out.add_eol();
            return;
        }

        for operand in &self.operands {
            operand.write_to(out);
            out.add(b' ');
        }
        out.append_text(self.operator.mnemonic());
        out.add_slice(b" % ");
        out.append_text(&self.operator.name());
        out.add_eol();
    }
}

/// Parse a decoded content stream
pub fn parse_contents(data: &[u8]) -> ParseResult<Vec<ContentOperation>> {
    let mut lexer = Lexer::new(MemorySource::new(data), LexerMode::Content)?;
    let mut operations = Vec::new();
    let mut operands = Vec::new();

    while let Some(item) = lexer.parse_next_item()? {
        match item {
            PdfObject::Operator(mut operation) => {
                if operation.operator != Operator::BeginInlineImage {
                    operation.operands = std::mem::take(&mut operands);
                } else {
                    operands.clear();
                }
                operations.push(operation);
            }
            operand => operands.push(operand),
        }
    }

    if !operands.is_empty() {
        return Err(ParseError::syntax(
            lexer.position(),
            format!(
                "Content stream ends with {} operands and no operator",
                operands.len()
            ),
        ));
    }

    Ok(operations)
}
