use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::section::{Section, SectionMatcher};

/// Degree keywords that start a new education entry (matched case-sensitively).
pub const DEFAULT_DEGREES: &[&str] = &[
    "B.Sc",
    "M.Sc",
    "MBA",
    "B.Tech",
    "M.Tech",
    "PhD",
    "B.Com",
    "Bachelor",
    "Master",
    "Doctorate",
];

/// Issuer names that begin a new certification when run together on one line.
pub const DEFAULT_ISSUERS: &[&str] = &["AWS", "Google", "Advanced", "Microsoft", "IBM"];

static DEFAULT_CONFIG: Lazy<ExtractionConfig> = Lazy::new(|| {
    ExtractionConfigBuilder::new()
        .build()
        .expect("default extraction vocabulary must compile")
});

/// Controls how a keyword list is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

fn resolve_strings(list: &ListOverride<String>, defaults: &[&str]) -> Vec<String> {
    let defaults: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    list.resolve(&defaults)
}

/// Compiled vocabulary for the pattern engine.
///
/// Build with [`ExtractionConfigBuilder`]; `ExtractionConfig::default()` is
/// the stock vocabulary.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    sections: HashMap<Section, SectionMatcher>,
    /// Case-sensitive degree starts, used to split an education span.
    pub(crate) degree_start_re: Regex,
    /// Whitespace before an issuer name.
    pub(crate) issuer_break_re: Option<Regex>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::new()
    }

    pub fn section(&self, section: Section) -> Option<&SectionMatcher> {
        self.sections.get(&section)
    }

    /// Segments `text` for `section`.
    pub fn find_section<'t>(&self, section: Section, text: &'t str) -> Option<&'t str> {
        self.section(section)?.find(text)
    }
}

#[derive(Debug, Clone, Default)]
struct SectionOverride {
    anchors: ListOverride<String>,
    terminators: ListOverride<String>,
}

/// Builder for [`ExtractionConfig`].
///
/// Fails fast with `regex::Error` if a keyword set cannot be compiled.
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfigBuilder {
    sections: HashMap<Section, SectionOverride>,
    degrees: ListOverride<String>,
    issuers: ListOverride<String>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchors(mut self, section: Section, anchors: ListOverride<String>) -> Self {
        self.sections.entry(section).or_default().anchors = anchors;
        self
    }

    pub fn terminators(mut self, section: Section, terminators: ListOverride<String>) -> Self {
        self.sections.entry(section).or_default().terminators = terminators;
        self
    }

    pub fn degrees(mut self, degrees: ListOverride<String>) -> Self {
        self.degrees = degrees;
        self
    }

    pub fn issuers(mut self, issuers: ListOverride<String>) -> Self {
        self.issuers = issuers;
        self
    }

    pub fn build(self) -> Result<ExtractionConfig, regex::Error> {
        let mut sections = HashMap::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let overrides = self.sections.get(&section).cloned().unwrap_or_default();
            let anchors = resolve_strings(&overrides.anchors, section.default_anchors());
            let terminators =
                resolve_strings(&overrides.terminators, section.default_terminators());
            sections.insert(section, SectionMatcher::new(&anchors, &terminators)?);
        }

        let degrees = literal_alternation(&resolve_strings(&self.degrees, DEFAULT_DEGREES));
        let issuers = literal_alternation(&resolve_strings(&self.issuers, DEFAULT_ISSUERS));

        let degree_start_re = match &degrees {
            Some(alt) => Regex::new(alt)?,
            // An empty degree list never splits.
            None => Regex::new(r"\b\B")?,
        };
        let issuer_break_re = issuers
            .as_ref()
            .map(|alt| Regex::new(&format!(r"\s({alt})")))
            .transpose()?;

        Ok(ExtractionConfig {
            sections,
            degree_start_re,
            issuer_break_re,
        })
    }
}

fn literal_alternation(words: &[String]) -> Option<String> {
    let mut escaped: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    escaped.sort_by(|a, b| b.len().cmp(&a.len()));
    Some(escaped.join("|"))
}
