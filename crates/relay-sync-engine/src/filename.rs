//! Receipt file name grammar.
//!
//! ```text
//! file      := category "_" stem ".xml"
//! receipt   : original_bn := stem up to the first "("
//! successed : id := text after the first "." of the stem, up to "(" or end
//! failed    : same as successed
//! other     : no extra keys
//! ```
//!
//! The category and suffix match ASCII case-insensitively; extracted values
//! keep their case.

use crate::error::{SyncError, SyncResult};

const XML_SUFFIX: &str = ".xml";

/// What a receipt file name says about its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptName {
    /// Customs receipt for the business number `original_bn`.
    Receipt { original_bn: String },
    /// Success or failure status for command `id`.
    Status { id: String },
    /// Anything else, uploaded as is.
    Other,
}

impl ReceiptName {
    /// Value of the `action` receipt parameter.
    pub fn action(&self) -> &'static str {
        match self {
            ReceiptName::Receipt { .. } => "receipt",
            ReceiptName::Status { .. } => "status",
            ReceiptName::Other => "other",
        }
    }
}

/// True if `file_name` ends in `.xml`, any case.
pub fn has_xml_suffix(file_name: &str) -> bool {
    strip_xml_suffix(file_name).is_some()
}

fn strip_xml_suffix(file_name: &str) -> Option<&str> {
    let split = file_name.len().checked_sub(XML_SUFFIX.len())?;
    let suffix = file_name.get(split..)?;
    suffix
        .eq_ignore_ascii_case(XML_SUFFIX)
        .then(|| &file_name[..split])
}

/// Parse the bare file name (no directories) of an outbound receipt.
pub fn parse_receipt_filename(file_name: &str) -> SyncResult<ReceiptName> {
    let malformed = || SyncError::MalformedFilename(file_name.to_string());

    let base = strip_xml_suffix(file_name).ok_or_else(malformed)?;
    let Some((category, stem)) = base.split_once('_') else {
        return Ok(ReceiptName::Other);
    };

    if category.eq_ignore_ascii_case("receipt") {
        let original_bn = until_paren(stem);
        if original_bn.is_empty() {
            return Err(malformed());
        }
        return Ok(ReceiptName::Receipt {
            original_bn: original_bn.to_string(),
        });
    }

    if category.eq_ignore_ascii_case("successed") || category.eq_ignore_ascii_case("failed") {
        let (_, tail) = stem.split_once('.').ok_or_else(malformed)?;
        let id = until_paren(tail);
        if id.is_empty() {
            return Err(malformed());
        }
        return Ok(ReceiptName::Status { id: id.to_string() });
    }

    Ok(ReceiptName::Other)
}

fn until_paren(text: &str) -> &str {
    text.split('(').next().unwrap_or_default()
}
