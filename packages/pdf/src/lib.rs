#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page-ordered text extraction for roster documents.
//!
//! Roster reports are published as PDFs whose tables flatten into plain
//! lines when extracted. This crate turns raw document bytes into an
//! [`ExtractedDocument`]: the non-blank lines of every page, in order, plus
//! the numbers of pages that yielded no text at all. Text extraction is
//! pure Rust ([`pdf_extract`]); no layout analysis is attempted.
//!
//! Implementations of [`TextSource`]:
//!
//! - [`PdfTextSource`] for PDF bytes.
//! - [`PlainTextSource`] for already-extracted text, pages separated by
//!   form feeds.
//! - [`AutoTextSource`] picks one of the two from the leading bytes.

pub mod text;

/// Magic bytes every PDF file starts with.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Errors specific to document text extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The document contained no bytes.
    #[error("Document '{0}' is empty")]
    Empty(String),

    /// PDF text extraction failed.
    #[error("PDF extraction error in '{name}': {message}")]
    Extraction { name: String, message: String },

    /// Plain-text input was not valid UTF-8.
    #[error("Document '{0}' is neither a PDF nor UTF-8 text")]
    NotText(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lines recovered from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    /// Non-blank lines in reading order, trailing whitespace removed.
    pub lines: Vec<String>,
}

impl PageText {
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// The text of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Display name the document was uploaded under.
    pub name: String,
    /// Every page, including pages without text.
    pub pages: Vec<PageText>,
}

impl ExtractedDocument {
    /// Builds a document from raw per-page text.
    #[must_use]
    pub fn from_page_texts<S: AsRef<str>>(name: impl Into<String>, pages: &[S]) -> Self {
        let name = name.into();
        let pages: Vec<PageText> = pages
            .iter()
            .enumerate()
            .map(|(i, page)| PageText {
                number: i + 1,
                lines: text::page_lines(page.as_ref()),
            })
            .collect();

        let document = Self { name, pages };
        let missing = document.pages_without_text();
        if !missing.is_empty() {
            log::warn!(
                "{}: {} of {} pages have no extractable text",
                document.name,
                missing.len(),
                document.pages.len()
            );
        }
        document
    }

    /// All lines of the document in page order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.lines.iter().map(String::as_str))
    }

    /// Lines of the first page, empty if the first page has no text.
    #[must_use]
    pub fn first_page_lines(&self) -> &[String] {
        self.pages.first().map_or(&[], |page| page.lines.as_slice())
    }

    /// Page numbers that yielded no text.
    #[must_use]
    pub fn pages_without_text(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|page| !page.has_text())
            .map(|page| page.number)
            .collect()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|page| page.lines.len()).sum()
    }
}

/// Anything that turns document bytes into page-ordered lines.
pub trait TextSource {
    /// Extracts the text of the document `name` from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] when the bytes are empty or unreadable. Pages
    /// without text are not an error.
    fn extract(&self, bytes: &[u8], name: &str) -> Result<ExtractedDocument, PdfError>;
}

/// PDF text extraction via [`pdf_extract`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn extract(&self, bytes: &[u8], name: &str) -> Result<ExtractedDocument, PdfError> {
        if bytes.is_empty() {
            return Err(PdfError::Empty(name.to_owned()));
        }

        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            PdfError::Extraction {
                name: name.to_owned(),
                message: e.to_string(),
            }
        })?;

        log::debug!("Extracted {} pages of text from {name}", pages.len());

        Ok(ExtractedDocument::from_page_texts(name, &pages))
    }
}

/// Already-extracted text. Pages are separated by form feed characters,
/// the way `pdftotext` writes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract(&self, bytes: &[u8], name: &str) -> Result<ExtractedDocument, PdfError> {
        if bytes.is_empty() {
            return Err(PdfError::Empty(name.to_owned()));
        }

        let text = std::str::from_utf8(bytes).map_err(|_| PdfError::NotText(name.to_owned()))?;
        let pages = text::split_pages(text);

        Ok(ExtractedDocument::from_page_texts(name, &pages))
    }
}

/// Dispatches on the leading bytes: PDFs go to [`PdfTextSource`], anything
/// else to [`PlainTextSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoTextSource;

impl TextSource for AutoTextSource {
    fn extract(&self, bytes: &[u8], name: &str) -> Result<ExtractedDocument, PdfError> {
        if is_pdf(bytes) {
            PdfTextSource.extract(bytes, name)
        } else {
            PlainTextSource.extract(bytes, name)
        }
    }
}

/// Whether `bytes` start with the PDF signature.
#[must_use]
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_are_rejected() {
        assert!(matches!(
            PdfTextSource.extract(&[], "a.pdf"),
            Err(PdfError::Empty(name)) if name == "a.pdf"
        ));
        assert!(matches!(
            PlainTextSource.extract(&[], "a.txt"),
            Err(PdfError::Empty(_))
        ));
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        assert!(matches!(
            PdfTextSource.extract(b"%PDF-1.4 garbage", "broken.pdf"),
            Err(PdfError::Extraction { .. })
        ));
    }

    #[test]
    fn plain_text_pages_split_on_form_feed() {
        let doc = PlainTextSource
            .extract(b"Fecha: 01/02/2024\nLINE 2\n\x0c\n\x0cPAGE 3\n", "roster.txt")
            .unwrap();

        assert_eq!(doc.pages.len(), 3);
        assert_eq!(doc.first_page_lines(), ["Fecha: 01/02/2024", "LINE 2"]);
        assert_eq!(doc.pages_without_text(), vec![2]);
        assert_eq!(doc.lines().collect::<Vec<_>>(), vec![
            "Fecha: 01/02/2024",
            "LINE 2",
            "PAGE 3"
        ]);
        assert_eq!(doc.line_count(), 3);
    }

    #[test]
    fn invalid_utf8_is_not_text() {
        assert!(matches!(
            PlainTextSource.extract(&[0xff, 0xfe, 0x00], "blob.bin"),
            Err(PdfError::NotText(_))
        ));
    }

    #[test]
    fn auto_source_detects_pdf_signature() {
        assert!(is_pdf(b"%PDF-1.7\n"));
        assert!(!is_pdf(b"111111JEFE DE SERVICIO"));
        let doc = AutoTextSource.extract(b"111111JEFE", "plain.txt").unwrap();
        assert_eq!(doc.line_count(), 1);
    }

    #[test]
    fn first_page_lines_of_empty_document() {
        let doc = ExtractedDocument::default();
        assert!(doc.first_page_lines().is_empty());
        assert!(doc.pages_without_text().is_empty());
    }
}
