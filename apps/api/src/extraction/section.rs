//! Section segmenter: locates a labelled span of résumé text between an anchor
//! keyword and the nearest "next section" keyword.

use regex::{Regex, RegexBuilder};

/// The résumé sections the pattern engine segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Location,
    Skills,
    Education,
    Projects,
    Certifications,
    Achievements,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Location,
        Section::Skills,
        Section::Education,
        Section::Projects,
        Section::Certifications,
        Section::Achievements,
    ];

    pub fn default_anchors(&self) -> &'static [&'static str] {
        match self {
            Section::Location => &["Location", "Place", "Based in", "Current Location"],
            Section::Skills => &["Technical Skills", "Skills"],
            Section::Education => &["Education"],
            Section::Projects => &["Projects"],
            Section::Certifications => &["Certifications"],
            Section::Achievements => &["Achievements"],
        }
    }

    pub fn default_terminators(&self) -> &'static [&'static str] {
        match self {
            Section::Location => &[
                "|",
                "Email",
                "Profile",
                "Education",
                "Experience",
                "Achievements",
            ],
            Section::Skills => &[
                "Professional",
                "Experience",
                "Achievements",
                "Education",
                "Profile",
            ],
            Section::Education => &[
                "Certifications",
                "Skills",
                "Experience",
                "Profile",
                "Projects",
            ],
            Section::Projects => &[
                "Certifications",
                "Achievements",
                "Education",
                "Skills",
                "Work Experience",
                "Profile",
            ],
            Section::Certifications => &[
                "Achievements",
                "Projects",
                "Education",
                "Skills",
                "Work Experience",
                "Profile",
            ],
            Section::Achievements => &[
                "Certifications",
                "Projects",
                "Education",
                "Skills",
                "Work Experience",
                "Profile",
            ],
        }
    }
}

/// Compiled anchor/terminator pair for one section.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    anchor: Regex,
    terminator: Option<Regex>,
}

impl SectionMatcher {
    /// Compiles the keyword sets. Keywords are literals: matching is
    /// case-insensitive and any whitespace inside a keyword matches any run of
    /// whitespace. Anchors starting with a word character must start at a word
    /// boundary; terminators match anywhere.
    pub fn new<A, T>(anchors: &[A], terminators: &[T]) -> Result<Self, regex::Error>
    where
        A: AsRef<str>,
        T: AsRef<str>,
    {
        // Nothing may match when the anchor set is empty.
        let anchor_pattern =
            keyword_alternation(anchors, true).unwrap_or_else(|| r"\b\B".to_string());
        let anchor = RegexBuilder::new(&format!(r"(?:{anchor_pattern})[:\s\-]*"))
            .case_insensitive(true)
            .build()?;
        let terminator = keyword_alternation(terminators, false)
            .map(|pattern| RegexBuilder::new(&pattern).case_insensitive(true).build())
            .transpose()?;
        Ok(Self { anchor, terminator })
    }

    /// Returns the trimmed span after the first anchor, up to the first
    /// terminator or end of text. `None` means no anchor was found; `Some("")`
    /// means the section is present but empty.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        let anchor = self.anchor.find(text)?;
        let rest = &text[anchor.end()..];
        let end = self
            .terminator
            .as_ref()
            .and_then(|t| t.find(rest))
            .map_or(rest.len(), |m| m.start());
        Some(rest[..end].trim())
    }
}

/// Builds `kw1|kw2|...` with the longest keywords first so that overlapping
/// keywords ("Technical Skills" vs "Skills") prefer the longer form.
fn keyword_alternation<K: AsRef<str>>(keywords: &[K], word_start: bool) -> Option<String> {
    let mut keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return None;
    }
    keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    keywords.dedup();

    let alternatives: Vec<String> = keywords
        .into_iter()
        .map(|keyword| {
            let body = keyword
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            let starts_with_word = keyword
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if word_start && starts_with_word {
                format!(r"\b{body}")
            } else {
                body
            }
        })
        .collect();
    Some(alternatives.join("|"))
}
