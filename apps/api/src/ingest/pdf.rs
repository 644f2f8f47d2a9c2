use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use super::IngestError;

/// Substrings that mark a link as worth surfacing (profiles, demos, hosted apps).
pub const LINK_KEYWORDS: &[&str] = &[
    "linkedin",
    "github",
    "portfolio",
    "vercel",
    "netlify",
    "streamlit",
    "huggingface",
    "render",
    "demo",
    "live",
    "project",
];

static URI_ANNOTATION_RE: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"/URI\s*\(([^)]+)\)").unwrap());
static PLAIN_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:https?://|www\.)[^\s<>()\[\]"']+"#).unwrap());

pub fn extract_pdf(bytes: &[u8]) -> Result<String, IngestError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::Pdf(e.to_string()))?;
    let links = discover_links(bytes, &text);
    Ok(append_links_line(text, &links))
}

/// Hyperlink annotations plus plain-text URLs matching [`LINK_KEYWORDS`],
/// sorted and deduplicated.
pub fn discover_links(raw: &[u8], text: &str) -> Vec<String> {
    let annotated = URI_ANNOTATION_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string());
    let plain = PLAIN_URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string());

    let mut links: Vec<String> = annotated
        .chain(plain)
        .filter(|url| !url.is_empty())
        .filter(|url| {
            let lower = url.to_ascii_lowercase();
            LINK_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .collect();
    links.sort();
    links.dedup();
    links
}

fn append_links_line(mut text: String, links: &[String]) -> String {
    if links.is_empty() {
        return text;
    }
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str("Links: ");
    text.push_str(&links.join(", "));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovers_annotations_and_plain_urls() {
        let raw = b"<< /S /URI /URI (https://github.com/jane) >> << /URI (mailto:j@d.com) >>";
        let text = "Portfolio: https://jane.vercel.app. Blog https://blog.example.com";
        let links = discover_links(raw, text);
        assert_eq!(
            links,
            vec!["https://github.com/jane".to_string(), "https://jane.vercel.app".to_string()]
        );
    }

    #[test]
    fn test_links_are_deduplicated() {
        let raw = b"/URI (https://linkedin.com/in/j) /URI (https://linkedin.com/in/j)";
        assert_eq!(discover_links(raw, "").len(), 1);
    }

    #[test]
    fn test_links_line_is_appended() {
        let out = append_links_line("Jane".to_string(), &["https://a.live".to_string()]);
        assert_eq!(out, "Jane\nLinks: https://a.live");
        assert_eq!(append_links_line("Jane".to_string(), &[]), "Jane");
    }

    #[test]
    fn test_invalid_pdf_is_an_error() {
        assert!(matches!(extract_pdf(b"not a pdf"), Err(IngestError::Pdf(_))));
    }
}
