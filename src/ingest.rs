//! Converts an uploaded CV file into raw text.
//!
//! Plain text is taken as is; PDFs go through a [`PageTextExtractor`], by
//! default the `pdf-extract` crate.

use crate::{Error, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Pdf,
}

impl FileKind {
    /// A `.pdf` extension or a PDF header makes a PDF; anything else is text.
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        let has_pdf_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if has_pdf_extension || bytes.starts_with(PDF_MAGIC) {
            FileKind::Pdf
        } else {
            FileKind::PlainText
        }
    }
}

/// Extracts the text of every page of a PDF, in page order.
pub trait PageTextExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PageTextExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed documents.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        match outcome {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(Error::Extraction(format!("could not read PDF: {}", e))),
            Err(_) => Err(Error::Extraction(
                "PDF parser aborted on this document".to_string(),
            )),
        }
    }
}

/// Page texts joined by line breaks, surrounding whitespace trimmed.
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n").trim().to_string()
}

pub fn ingest_bytes(
    kind: FileKind,
    bytes: &[u8],
    extractor: &dyn PageTextExtractor,
) -> Result<String> {
    match kind {
        FileKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Extraction(format!("file is not valid UTF-8 text: {}", e))),
        FileKind::Pdf => {
            let pages = extractor.extract_pages(bytes)?;
            tracing::debug!("Extracted text from {} PDF pages", pages.len());
            Ok(join_pages(&pages))
        }
    }
}

pub fn ingest_file(path: &Path, extractor: &dyn PageTextExtractor) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::Extraction(format!("could not read {}: {}", path.display(), e))
    })?;
    let kind = FileKind::detect(path, &bytes);
    tracing::info!("Ingesting {} as {:?} ({} bytes)", path.display(), kind, bytes.len());
    ingest_bytes(kind, &bytes, extractor)
}
