//! Pattern extraction engine.
//!
//! Each field extractor is a pure function over normalized text. None of them
//! fail: a miss is `None` for scalars and an empty `Vec` for sequences.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::ExtractionConfig;
use super::section::Section;
use crate::models::{CandidateRecord, Engine, ProjectEntry};

static NAME_STOPWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Curriculum Vitae|Resume").unwrap());
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+| [A-Z]\.?){0,2}").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d \t\-]{8,}\d").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static LINKEDIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/[^\s|]+").unwrap()
});
static GITHUB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[^\s|]+").unwrap());
static WEBSITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://|www\.)[a-zA-Z0-9\-]+(?:\.[a-zA-Z0-9\-]+)*\.[a-z]{2,}(?:/[^\s|]*)?")
        .unwrap()
});
static SKILL_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n|,|•|-").unwrap());
static PROJECT_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s-\s|•").unwrap());
static ACHIEVEMENT_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s-\s|•|\n").unwrap());

const ITEM_TRIM: &[char] = &[' ', '-', '•', '\t'];
const URL_TRIM: &[char] = &['.', ',', ';'];

/// Runs every field extractor with one vocabulary.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    config: Arc<ExtractionConfig>,
}

impl PatternExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Extracts a full record from normalized text.
    pub fn extract(&self, text: &str) -> CandidateRecord {
        let links = extract_links(text);
        CandidateRecord {
            name: extract_name(text),
            email: extract_email(text),
            phone: extract_phone(text),
            location: self.location(text),
            skills: Some(self.skills(text)),
            education: Some(self.education(text)),
            projects: Some(
                self.projects(text)
                    .into_iter()
                    .map(ProjectEntry::Title)
                    .collect(),
            ),
            certifications: Some(self.certifications(text)),
            achievements: Some(self.achievements(text)),
            linkedin: links.linkedin,
            github: links.github,
            websites: links.websites,
            ..CandidateRecord::blank(Engine::Patterns)
        }
    }

    pub fn location(&self, text: &str) -> Option<String> {
        let span = self.config.find_section(Section::Location, text)?;
        let end = span
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '.' | '-')))
            .unwrap_or(span.len());
        non_empty(span[..end].trim())
    }

    pub fn skills(&self, text: &str) -> Vec<String> {
        self.config
            .find_section(Section::Skills, text)
            .map(|span| split_items(&SKILL_SPLIT_RE, span))
            .unwrap_or_default()
    }

    /// Education entries start at a degree keyword and must mention a year.
    pub fn education(&self, text: &str) -> Vec<String> {
        let Some(span) = self.config.find_section(Section::Education, text) else {
            return Vec::new();
        };

        let mut starts: Vec<usize> = self
            .config
            .degree_start_re
            .find_iter(span)
            .map(|m| m.start())
            .collect();
        if starts.first() != Some(&0) {
            starts.insert(0, 0);
        }
        starts.dedup();

        let mut entries = Vec::new();
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(span.len());
            let entry = collapse_spaces(&span[start..end]);
            if !entry.is_empty() && YEAR_RE.is_match(&entry) {
                entries.push(entry);
            }
        }
        entries
    }

    pub fn projects(&self, text: &str) -> Vec<String> {
        self.config
            .find_section(Section::Projects, text)
            .map(|span| split_items(&PROJECT_SPLIT_RE, span))
            .unwrap_or_default()
    }

    pub fn certifications(&self, text: &str) -> Vec<String> {
        let Some(span) = self.config.find_section(Section::Certifications, text) else {
            return Vec::new();
        };
        let broken = match &self.config.issuer_break_re {
            Some(re) => re.replace_all(span, "\n${1}").into_owned(),
            None => span.to_string(),
        };
        broken
            .split('\n')
            .map(|c| c.trim_matches(ITEM_TRIM))
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn achievements(&self, text: &str) -> Vec<String> {
        self.config
            .find_section(Section::Achievements, text)
            .map(|span| split_items(&ACHIEVEMENT_SPLIT_RE, span))
            .unwrap_or_default()
    }
}

/// First run of one to three capitalized words in the header, i.e. the text
/// before the first Location/Email/Phone label.
pub fn extract_name(text: &str) -> Option<String> {
    let header = ["Location", "Email", "Phone"]
        .iter()
        .fold(text, |head, label| head.split(label).next().unwrap_or(head));
    let header = NAME_STOPWORD_RE.replace_all(header, "");
    NAME_RE
        .find(&header)
        .and_then(|m| non_empty(m.as_str().trim()))
}

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Links {
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub websites: Vec<String>,
}

/// Scans the whole text for profile links. LinkedIn and GitHub keep their first
/// match; other sites exclude those hosts and anything containing `@`.
pub fn extract_links(text: &str) -> Links {
    let linkedin = LINKEDIN_RE.find(text).and_then(|m| with_scheme(m.as_str()));
    let github = GITHUB_RE.find(text).and_then(|m| with_scheme(m.as_str()));

    let mut websites: Vec<String> = Vec::new();
    for m in WEBSITE_RE.find_iter(text) {
        let lower = m.as_str().to_ascii_lowercase();
        if lower.contains("linkedin.com") || lower.contains("github.com") || lower.contains('@') {
            continue;
        }
        if let Some(site) = with_scheme(m.as_str()) {
            if !websites.contains(&site) {
                websites.push(site);
            }
        }
    }

    Links {
        linkedin,
        github,
        websites,
    }
}

fn with_scheme(url: &str) -> Option<String> {
    let url = url.trim_matches(URL_TRIM);
    if url.is_empty() {
        return None;
    }
    if url.to_ascii_lowercase().starts_with("http") {
        Some(url.to_string())
    } else {
        Some(format!("https://{url}"))
    }
}

fn split_items(splitter: &Regex, span: &str) -> Vec<String> {
    splitter
        .split(span)
        .map(|item| item.trim_matches(ITEM_TRIM))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::normalize::normalize;

    const SAMPLE: &str = "Location: Berlin, Germany Email: a@b.com Phone: +49-30-1234567 \
        Skills: Python, SQL Education: B.Sc Computer Science 2018";

    #[test]
    fn test_round_trip_known_fields() {
        let record = PatternExtractor::default().extract(SAMPLE);
        assert_eq!(record.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(record.email.as_deref(), Some("a@b.com"));
        assert_eq!(record.phone.as_deref(), Some("+49-30-1234567"));
        assert_eq!(record.skills, Some(vec!["Python".to_string(), "SQL".to_string()]));
        assert_eq!(
            record.education,
            Some(vec!["B.Sc Computer Science 2018".to_string()])
        );
        assert_eq!(record.engine, Engine::Patterns);
    }

    #[test]
    fn test_round_trip_survives_normalization() {
        let record = PatternExtractor::default().extract(&normalize(SAMPLE));
        assert_eq!(record.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(record.skills, Some(vec!["Python".to_string(), "SQL".to_string()]));
    }

    #[test]
    fn test_link_extraction() {
        let text = "see https://github.com/alice and https://linkedin.com/in/alice, \
            portfolio https://alice.dev.";
        let links = extract_links(text);
        assert_eq!(links.github.as_deref(), Some("https://github.com/alice"));
        assert_eq!(links.linkedin.as_deref(), Some("https://linkedin.com/in/alice"));
        assert_eq!(links.websites, vec!["https://alice.dev".to_string()]);
    }

    #[test]
    fn test_links_gain_scheme() {
        let links = extract_links("linkedin.com/in/bob | www.bob.io | www.bob.io");
        assert_eq!(links.linkedin.as_deref(), Some("https://linkedin.com/in/bob"));
        assert_eq!(links.websites, vec!["https://www.bob.io".to_string()]);
    }

    #[test]
    fn test_website_with_at_sign_is_skipped() {
        let links = extract_links("https://medium.com/@carol");
        assert!(links.websites.is_empty());
    }

    #[test]
    fn test_missing_education_is_empty_sequence() {
        let record = PatternExtractor::default().extract("Jane Doe Skills: Go");
        assert_eq!(record.education, Some(vec![]));
        assert_eq!(record.projects, Some(vec![]));
    }

    #[test]
    fn test_extractors_are_total_on_garbage() {
        let extractor = PatternExtractor::default();
        for input in ["", "   ", "Skills", "Education:", "|||", "Location: |", "@@@ http://"] {
            let record = extractor.extract(input);
            assert!(record.location.as_deref().map_or(true, |l| !l.is_empty()));
            assert!(record.skills.is_some());
            assert!(record.education.is_some());
        }
    }

    #[test]
    fn test_name_from_header() {
        assert_eq!(
            extract_name("Curriculum Vitae\nJane Mary Doe\nEmail: j@d.com").as_deref(),
            Some("Jane Mary Doe")
        );
        assert_eq!(
            extract_name("RESUME Tom A. Smith Phone: 1").as_deref(),
            Some("Tom A. Smith")
        );
        assert_eq!(extract_name("email only Email: x@y.zz"), None);
    }

    #[test]
    fn test_location_stops_at_disallowed_character() {
        let extractor = PatternExtractor::default();
        assert_eq!(
            extractor.location("Based in: Pune, India\nProfile: builder").as_deref(),
            Some("Pune, India")
        );
        assert_eq!(extractor.location("Location: | Email: x"), None);
    }

    #[test]
    fn test_skills_split_on_separators() {
        let extractor = PatternExtractor::default();
        assert_eq!(
            extractor.skills("Technical Skills: Rust\n• Go, SQL - Docker Experience: 3y"),
            vec!["Rust", "Go", "SQL", "Docker"]
        );
    }

    #[test]
    fn test_education_splits_on_degrees_and_requires_year() {
        let extractor = PatternExtractor::default();
        let text = "Education: MIT 2010 B.Tech CSE 2015 - 2019 M.Tech AI Certifications: x";
        assert_eq!(
            extractor.education(text),
            vec!["MIT 2010", "B.Tech CSE 2015 - 2019"]
        );
    }

    #[test]
    fn test_projects_split_on_spaced_dash_only() {
        let extractor = PatternExtractor::default();
        assert_eq!(
            extractor.projects("Projects: Real-time chat - Price tracker • CLI Skills: x"),
            vec!["Real-time chat", "Price tracker", "CLI"]
        );
    }

    #[test]
    fn test_certifications_break_before_issuers() {
        let extractor = PatternExtractor::default();
        assert_eq!(
            extractor.certifications(
                "Certifications: AWS Solutions Architect Google Data Analytics\n• Scrum Master"
            ),
            vec!["AWS Solutions Architect", "Google Data Analytics", "Scrum Master"]
        );
    }

    #[test]
    fn test_achievements_split() {
        let extractor = PatternExtractor::default();
        assert_eq!(
            extractor.achievements("Achievements: Won hackathon - Dean's list\nOpen source Profile"),
            vec!["Won hackathon", "Dean's list", "Open source"]
        );
    }
}
