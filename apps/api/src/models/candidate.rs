use serde::{Deserialize, Serialize};

use crate::enrichment::GeoPoint;

/// Which extraction path produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Patterns,
    Llm,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Patterns => "patterns",
            Engine::Llm => "llm",
        }
    }
}

/// A project line. The pattern engine yields plain titles; the LLM engine
/// yields `{name, links}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectEntry {
    Title(String),
    Linked {
        name: Option<String>,
        links: Option<Vec<String>>,
    },
}

impl ProjectEntry {
    /// Flat rendering for tabular export: `name (link, link)`.
    pub fn display(&self) -> String {
        match self {
            ProjectEntry::Title(title) => title.clone(),
            ProjectEntry::Linked { name, links } => {
                let name = name.as_deref().unwrap_or_default();
                match links.as_deref() {
                    Some(links) if !links.is_empty() => {
                        format!("{name} ({})", links.join(", ")).trim().to_string()
                    }
                    _ => name.to_string(),
                }
            }
        }
    }
}

/// Structured candidate profile extracted from one document.
///
/// Sequence fields are `Option<Vec<_>>`: the pattern engine always fills them
/// (`Some(vec![])` when the section is absent) while the LLM engine reports
/// `None` for empty or missing sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub engine: Engine,
    pub name: Option<String>,
    /// LLM engine only.
    pub profession: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<String>>,
    /// LLM engine only.
    pub experience: Option<Vec<String>>,
    pub projects: Option<Vec<ProjectEntry>>,
    pub certifications: Option<Vec<String>>,
    pub achievements: Option<Vec<String>>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub websites: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub gender: Option<String>,
}

impl CandidateRecord {
    /// The record produced when nothing could be extracted, following the
    /// engine's sequence convention.
    pub fn blank(engine: Engine) -> Self {
        let filled = engine == Engine::Patterns;
        Self {
            engine,
            name: None,
            profession: None,
            email: None,
            phone: None,
            location: None,
            skills: filled.then(Vec::new),
            education: filled.then(Vec::new),
            experience: None,
            projects: filled.then(Vec::new),
            certifications: filled.then(Vec::new),
            achievements: filled.then(Vec::new),
            linkedin: None,
            github: None,
            websites: Vec::new(),
            latitude: None,
            longitude: None,
            country: None,
            gender: None,
        }
    }

    pub fn apply_geo(&mut self, point: &GeoPoint) {
        self.latitude = Some(point.latitude);
        self.longitude = Some(point.longitude);
        self.country = Some(point.country.clone());
    }

    /// True when no scalar field and no sequence entry was extracted.
    pub fn is_empty(&self) -> bool {
        let seq_empty = |s: &Option<Vec<String>>| s.as_ref().map_or(true, |v| v.is_empty());
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.linkedin.is_none()
            && self.github.is_none()
            && self.websites.is_empty()
            && seq_empty(&self.skills)
            && seq_empty(&self.education)
            && seq_empty(&self.experience)
            && seq_empty(&self.certifications)
            && seq_empty(&self.achievements)
            && self.projects.as_ref().map_or(true, |p| p.is_empty())
    }
}
