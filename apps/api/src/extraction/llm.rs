//! LLM-backed extractor: prompts a generative model for a strict JSON record,
//! then repairs the reply into a [`CandidateRecord`].
//!
//! Post-processing rules:
//! - strings equal to "null" (any case) or blank become null;
//! - lists that are empty or hold only null-like items become null;
//! - `github_link` / `linkedin_link` gain an `https://` scheme when missing.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::prompts::build_extraction_prompt;
use crate::llm_client::{parse_json_reply, LlmError, TextGenerator};
use crate::models::{CandidateRecord, Engine, ProjectEntry};

#[derive(Clone)]
pub struct LlmExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl LlmExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Single model round trip. Fails on transport errors and on replies that
    /// are not a JSON object.
    pub async fn try_extract(&self, text: &str) -> Result<CandidateRecord, LlmError> {
        let prompt = build_extraction_prompt(text);
        let reply = self.generator.generate(&prompt).await?;
        let value: Value = parse_json_reply(&reply)?;
        match value {
            Value::Object(map) => Ok(record_from_reply(map)),
            other => Err(LlmError::Parse(serde::de::Error::custom(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn record_from_reply(mut map: Map<String, Value>) -> CandidateRecord {
    let mut take = |key: &str| map.remove(key).unwrap_or(Value::Null);

    let name = scalar(take("name"));
    let profession = scalar(take("profession"));
    let phone = scalar(take("phone_number"));
    let email = scalar(take("email"));
    let location = scalar(take("location"));
    let github = scalar(take("github_link")).map(|url| with_scheme(&url));
    let linkedin = scalar(take("linkedin_link")).map(|url| with_scheme(&url));
    let skills = string_list(take("skills"));
    let education = string_list(take("education"));
    let experience = string_list(take("experience"));
    let projects = project_list(take("projects"));
    let certifications = string_list(take("certifications"));
    let achievements = string_list(take("achievements"));

    CandidateRecord {
        name,
        profession,
        email,
        phone,
        location,
        skills,
        education,
        experience,
        projects,
        certifications,
        achievements,
        linkedin,
        github,
        ..CandidateRecord::blank(Engine::Llm)
    }
}

/// A string, number or boolean; null-like strings and anything else are `None`.
fn scalar(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn string_list(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.into_iter().filter_map(scalar).collect();
            (!items.is_empty()).then_some(items)
        }
        // A bare string where a list was asked for.
        other => scalar(other).map(|s| vec![s]),
    }
}

fn project_list(value: Value) -> Option<Vec<ProjectEntry>> {
    let Value::Array(items) = value else {
        return scalar(value).map(|s| vec![ProjectEntry::Title(s)]);
    };
    let projects: Vec<ProjectEntry> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(mut obj) => {
                let name = scalar(obj.remove("name").unwrap_or(Value::Null));
                let links = string_list(obj.remove("links").unwrap_or(Value::Null));
                (name.is_some() || links.is_some()).then_some(ProjectEntry::Linked { name, links })
            }
            other => scalar(other).map(ProjectEntry::Title),
        })
        .collect();
    (!projects.is_empty()).then_some(projects)
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::CandidateExtractor;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedGenerator {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|_| LlmError::EmptyContent)
        }
    }

    #[tokio::test]
    async fn test_fenced_reply_is_parsed() {
        let generator = CannedGenerator::ok(
            "```json\n{\"name\": \"Jane Doe\", \"email\": \"j@d.com\", \"skills\": [\"Rust\"]}\n```",
        );
        let extractor = LlmExtractor::new(generator.clone());
        let record = extractor.try_extract("Jane Doe").await.unwrap();
        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.skills, Some(vec!["Rust".to_string()]));
        assert_eq!(record.engine, Engine::Llm);
        assert!(generator.prompts.lock().unwrap()[0].ends_with("Jane Doe"));
    }

    #[tokio::test]
    async fn test_null_like_values_are_coerced() {
        let generator = CannedGenerator::ok(
            r#"{"name": "NULL", "location": "  ", "phone_number": 4930123,
                "skills": [], "education": [null, "null"], "certifications": ["AWS SAA"],
                "github_link": "github.com/jane", "linkedin_link": "https://linkedin.com/in/jane"}"#,
        );
        let record = LlmExtractor::new(generator).try_extract("x").await.unwrap();
        assert!(record.name.is_none());
        assert!(record.location.is_none());
        assert_eq!(record.phone.as_deref(), Some("4930123"));
        assert!(record.skills.is_none());
        assert!(record.education.is_none());
        assert_eq!(record.certifications, Some(vec!["AWS SAA".to_string()]));
        assert_eq!(record.github.as_deref(), Some("https://github.com/jane"));
        assert_eq!(record.linkedin.as_deref(), Some("https://linkedin.com/in/jane"));
    }

    #[tokio::test]
    async fn test_projects_keep_links() {
        let generator = CannedGenerator::ok(
            r#"{"projects": [{"name": "Bot", "links": ["https://github.com/j/bot"]},
                             {"name": "Site", "links": null}, "Plain"]}"#,
        );
        let record = LlmExtractor::new(generator).try_extract("x").await.unwrap();
        assert_eq!(
            record.projects,
            Some(vec![
                ProjectEntry::Linked {
                    name: Some("Bot".to_string()),
                    links: Some(vec!["https://github.com/j/bot".to_string()]),
                },
                ProjectEntry::Linked {
                    name: Some("Site".to_string()),
                    links: None,
                },
                ProjectEntry::Title("Plain".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_non_object_reply_is_parse_error() {
        let generator = CannedGenerator::ok("[1, 2]");
        let err = LlmExtractor::new(generator).try_extract("x").await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_null_record() {
        let failing: Arc<dyn CandidateExtractor> =
            Arc::new(LlmExtractor::new(CannedGenerator::failing()));
        let out = failing.extract("x".to_string()).await;
        assert_eq!(out.record, CandidateRecord::blank(Engine::Llm));
        assert!(out.fallback.is_some());

        let garbled: Arc<dyn CandidateExtractor> =
            Arc::new(LlmExtractor::new(CannedGenerator::ok("not json")));
        let out = garbled.extract("x".to_string()).await;
        assert!(out.record.name.is_none() && out.record.skills.is_none());
        assert!(out.fallback.unwrap().contains("JSON"));
    }
}
