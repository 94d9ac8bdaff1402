//! Target coordinate extraction from Word documents
//!
//! This crate provides:
//! - Up-front rejection of legacy binary `.doc` files
//! - Paragraph text extraction from `.docx` packages
//! - Pairing of `Target<N>` markers with `Center: x m; y m; z m` lines
//! - CSV export of the resulting table

pub mod detector;
pub mod export;
pub mod extractor;
pub mod reader;

pub use detector::{detect_format, detect_format_mem, DocumentFormat};
pub use export::{to_csv_string, write_csv, CsvOptions, DEFAULT_OUTPUT_NAME};
pub use extractor::{
    extract_from_text, extract_targets, extract_targets_with_stats, Extraction, ScanStats,
    TargetRecord, TargetScanner,
};
pub use reader::{read_paragraphs, read_paragraphs_mem, read_text, read_text_mem, ReaderOptions};

use std::path::Path;

/// High-level document processing result
#[derive(Debug)]
pub struct DocxProcessResult {
    /// Extracted rows, in document order
    pub records: Vec<TargetRecord>,
    /// Statistics of the extraction pass
    pub stats: ScanStats,
    /// Number of paragraphs decoded from the document
    pub paragraph_count: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl DocxProcessResult {
    /// No target data was found; this is not an error
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Process a document file
///
/// This function will:
/// 1. Reject legacy `.doc` files before any decoding
/// 2. Decode the paragraphs and join them into one text
/// 3. Scan the text for target/center pairs
pub fn process_docx<P: AsRef<Path>>(path: P) -> Result<DocxProcessResult, DocxError> {
    process_docx_with_options(path, &ReaderOptions::default())
}

/// Process a document file with custom reader options
pub fn process_docx_with_options<P: AsRef<Path>>(
    path: P,
    options: &ReaderOptions,
) -> Result<DocxProcessResult, DocxError> {
    let start = std::time::Instant::now();

    if detect_format(&path)? == DocumentFormat::LegacyDoc {
        return Err(DocxError::UnsupportedFormat);
    }

    let paragraphs = read_paragraphs(&path, options)?;
    Ok(finish(paragraphs, start))
}

/// Process a document from memory buffer
pub fn process_docx_mem(buffer: &[u8]) -> Result<DocxProcessResult, DocxError> {
    process_docx_mem_with_options(buffer, &ReaderOptions::default())
}

/// Process a document from memory buffer with custom reader options
pub fn process_docx_mem_with_options(
    buffer: &[u8],
    options: &ReaderOptions,
) -> Result<DocxProcessResult, DocxError> {
    let start = std::time::Instant::now();

    if detect_format_mem(buffer) == DocumentFormat::LegacyDoc {
        return Err(DocxError::UnsupportedFormat);
    }

    let paragraphs = read_paragraphs_mem(buffer, options)?;
    Ok(finish(paragraphs, start))
}

fn finish(paragraphs: Vec<String>, start: std::time::Instant) -> DocxProcessResult {
    let text = paragraphs.join("\n");
    let Extraction { records, stats } = extract_from_text(&text);

    if records.is_empty() {
        log::info!("no target data found in {} paragraphs", paragraphs.len());
    }

    DocxProcessResult {
        records,
        stats,
        paragraph_count: paragraphs.len(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("legacy .doc files are not supported; convert the file to .docx and try again")]
    UnsupportedFormat,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("DOCX archive error: {0}")]
    Archive(String),
    #[error("DOCX package has no main document part")]
    MissingDocumentPart,
    #[error("XML parsing error: {0}")]
    Xml(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DocxError {
    /// Whether the input was rejected for its format rather than failing to process
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, DocxError::UnsupportedFormat)
    }
}

impl From<zip::result::ZipError> for DocxError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => DocxError::Io(io),
            other => DocxError::Archive(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for DocxError {
    fn from(e: quick_xml::Error) -> Self {
        DocxError::Xml(e.to_string())
    }
}
