use tracing::warn;

use super::{ExtractionError, PageContent};

/// Page separator emitted by pdf-extract.
const FORM_FEED: char = '\x0C';

pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages = split_pages(&text);
    if pages.is_empty() {
        // Image-only scans land here; the pipeline reports them as "no text".
        warn!("PDF contains no extractable text");
    }
    Ok(pages)
}

/// Split pdf-extract output into its non-blank pages. Page numbers keep
/// their position in the document, so a skipped blank page leaves a gap.
fn split_pages(text: &str) -> Vec<PageContent> {
    text.split(FORM_FEED)
        .enumerate()
        .filter_map(|(i, page)| {
            let page = page.trim();
            (!page.is_empty()).then(|| PageContent {
                page_number: i + 1,
                text: page.to_string(),
            })
        })
        .collect()
}
