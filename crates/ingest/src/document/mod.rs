mod pdf;
mod txt;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number (for PDFs). For TXT, always 1.
    pub page_number: usize,
    /// The extracted text content.
    pub text: String,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    /// File type: "pdf", "txt"
    pub file_type: String,
    /// Extracted pages with text.
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// All pages concatenated, separated by a blank line.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    /// True when no page carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// Extract text from file bytes based on the filename's extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let ext = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    };

    let pages = match ext.as_str() {
        "pdf" => pdf::extract_pdf(bytes)?,
        "txt" | "text" => txt::extract_txt(bytes)?,
        other => return Err(ExtractionError::UnsupportedType(other.to_string())),
    };

    for page in &pages {
        debug!(
            "Extracted text from page {}: {} characters",
            page.page_number,
            page.text.len()
        );
    }

    let doc = ExtractedDocument {
        filename: filename.to_string(),
        file_type: ext,
        pages,
    };
    info!(
        filename = %doc.filename,
        "Text extraction completed - Total characters: {}",
        doc.total_chars()
    );
    Ok(doc)
}

/// Read a file from disk and extract its text.
pub fn extract_file(path: &Path) -> Result<ExtractedDocument, ExtractionError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Extracting text from: {}", path.display());
    let bytes = std::fs::read(path)?;
    extract_text(&bytes, &filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = extract_text(b"irrelevant", "slides.pptx").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(ref e) if e == "pptx"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = extract_text(b"irrelevant", "README").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", "broken.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::PdfError(_)));
    }

    #[test]
    fn txt_dispatch_is_case_insensitive() {
        let doc = extract_text(b"Plain words.", "NOTES.TXT").unwrap();
        assert_eq!(doc.file_type, "txt");
        assert_eq!(doc.full_text(), "Plain words.");
        assert!(!doc.is_blank());
    }

    #[test]
    fn extract_file_reads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lecture.txt");
        std::fs::write(&path, "  Cells divide.  ").unwrap();
        let doc = extract_file(&path).unwrap();
        assert_eq!(doc.filename, "lecture.txt");
        assert_eq!(doc.total_chars(), "Cells divide.".len());
    }

    #[test]
    fn extract_file_missing_is_io_error() {
        let err = extract_file(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[test]
    fn full_text_joins_pages_with_blank_line() {
        let doc = ExtractedDocument {
            filename: "a.pdf".into(),
            file_type: "pdf".into(),
            pages: vec![
                PageContent { page_number: 1, text: "One".into() },
                PageContent { page_number: 2, text: "Two".into() },
            ],
        };
        assert_eq!(doc.full_text(), "One\n\nTwo");
    }
}
