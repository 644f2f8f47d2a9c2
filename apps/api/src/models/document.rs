use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Maps a format tag or file extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }
}

/// Uploaded bytes plus their declared format. Consumed once by text extraction.
///
/// `format` is the raw tag; unsupported tags are rejected at extraction time
/// so the batch can report them per document.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub format: String,
    pub bytes: Bytes,
}

impl RawDocument {
    /// Builds a document whose format tag is the filename extension.
    pub fn from_upload(filename: impl Into<String>, bytes: Bytes) -> Self {
        let filename = filename.into();
        let format = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            filename,
            format,
            bytes,
        }
    }

    pub fn parsed_format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_extension(&self.format)
    }
}
