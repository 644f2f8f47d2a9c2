//! Document-to-text extraction for uploaded résumés (PDF, DOCX, plain text).
//!
//! Extraction only recovers text; cleaning happens in the normalizer.

pub mod docx;
pub mod pdf;

use thiserror::Error;

use crate::models::{DocumentFormat, RawDocument};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported document format '{0}' (expected pdf, docx or txt)")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Extracts the raw text of a document according to its format tag.
///
/// - PDF: page texts in page order plus an optional synthesized `Links:` line;
/// - DOCX: paragraphs joined by newline in document order;
/// - TXT: UTF-8 with invalid bytes dropped.
pub fn extract_text(document: &RawDocument) -> Result<String, IngestError> {
    let format = document
        .parsed_format()
        .ok_or_else(|| IngestError::UnsupportedFormat(document.format.clone()))?;
    match format {
        DocumentFormat::Pdf => pdf::extract_pdf(&document.bytes),
        DocumentFormat::Docx => docx::extract_docx(&document.bytes),
        DocumentFormat::Txt => Ok(decode_utf8_dropping_invalid(&document.bytes)),
    }
}

fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::normalize;
    use crate::extraction::patterns::extract_name;
    use bytes::Bytes;

    #[test]
    fn test_txt_drops_invalid_utf8() {
        let doc = RawDocument::from_upload("cv.txt", Bytes::from_static(b"Jane \xff Doe"));
        assert_eq!(extract_text(&doc).unwrap(), "Jane  Doe");
    }

    #[test]
    fn test_invalid_byte_inside_word_keeps_word_whole() {
        let doc = RawDocument::from_upload(
            "cv.txt",
            Bytes::from_static(b"Jo\xffhn Smith Email: j@s.io"),
        );
        let text = normalize(&extract_text(&doc).unwrap());
        assert_eq!(text, "John Smith Email: j@s.io");
        assert_eq!(extract_name(&text).as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let doc = RawDocument::from_upload("cv.odt", Bytes::from_static(b"x"));
        let err = extract_text(&doc).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ref f) if f == "odt"));
    }
}
