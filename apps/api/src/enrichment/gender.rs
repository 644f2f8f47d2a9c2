use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

pub const UNKNOWN: &str = "unknown";

/// Infers a gender label from a first name. Total: failures are "unknown".
#[async_trait]
pub trait GenderClassifier: Send + Sync {
    async fn classify(&self, first_name: &str) -> String;
}

/// Client for a genderize.io-compatible service.
#[derive(Debug, Clone)]
pub struct GenderizeClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenderizeResponse {
    gender: Option<String>,
}

impl GenderizeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
        })
    }

    async fn lookup(&self, first_name: &str) -> Result<Option<String>, reqwest::Error> {
        let response: GenderizeResponse = self
            .client
            .get(&self.base_url)
            .query(&[("name", first_name)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.gender)
    }
}

#[async_trait]
impl GenderClassifier for GenderizeClient {
    async fn classify(&self, first_name: &str) -> String {
        match self.lookup(first_name).await {
            Ok(gender) => label(gender),
            Err(e) => {
                warn!("gender lookup for '{first_name}' failed: {e}");
                UNKNOWN.to_string()
            }
        }
    }
}

fn label(gender: Option<String>) -> String {
    match gender.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("male") => "male".to_string(),
        Some("female") => "female".to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// The first whitespace-separated word of a full name.
pub fn first_name(full_name: &str) -> Option<&str> {
    full_name.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(label(Some("male".into())), "male");
        assert_eq!(label(Some("Female".into())), "female");
        assert_eq!(label(None), "unknown");
        assert_eq!(label(Some("other".into())), "unknown");
    }

    #[test]
    fn test_first_name() {
        assert_eq!(first_name("  Jane Mary Doe"), Some("Jane"));
        assert_eq!(first_name(""), None);
    }

    #[test]
    fn test_response_with_null_gender() {
        let parsed: GenderizeResponse =
            serde_json::from_str(r#"{"name":"kim","gender":null,"probability":0.0}"#).unwrap();
        assert_eq!(label(parsed.gender), "unknown");
    }
}
