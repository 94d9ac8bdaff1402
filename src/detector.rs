//! Document format detection
//!
//! Word documents come in two containers: the legacy OLE2 compound file
//! (`.doc`) and the ZIP-based Office Open XML package (`.docx`). Only the
//! latter can be decoded, so legacy files are recognized up front and
//! rejected before any parsing is attempted.

use crate::DocxError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// OLE2 compound file signature used by legacy `.doc` files
const OLE2_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// ZIP local file header signature
const ZIP_SIGNATURE: [u8; 4] = *b"PK\x03\x04";

/// Document container classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Office Open XML package
    Docx,
    /// Legacy binary Word document
    LegacyDoc,
    /// Neither signature matched
    Unknown,
}

/// Detect the format of a document on disk
///
/// A `.doc` extension is treated as legacy regardless of content.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<DocumentFormat, DocxError> {
    let path = path.as_ref();

    if has_legacy_extension(path) {
        return Ok(DocumentFormat::LegacyDoc);
    }

    let mut header = Vec::with_capacity(OLE2_SIGNATURE.len());
    File::open(path)?
        .take(OLE2_SIGNATURE.len() as u64)
        .read_to_end(&mut header)?;

    Ok(detect_format_mem(&header))
}

/// Detect the format of an in-memory document from its leading bytes
pub fn detect_format_mem(buffer: &[u8]) -> DocumentFormat {
    if buffer.starts_with(&OLE2_SIGNATURE) {
        DocumentFormat::LegacyDoc
    } else if buffer.starts_with(&ZIP_SIGNATURE) {
        DocumentFormat::Docx
    } else {
        DocumentFormat::Unknown
    }
}

fn has_legacy_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("doc"))
        .unwrap_or(false)
}
