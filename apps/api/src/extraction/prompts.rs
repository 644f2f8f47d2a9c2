use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NULL_CONVENTION_INSTRUCTION};

/// Keys the model must return, in order.
pub const REQUIRED_KEYS: &[&str] = &[
    "name",
    "profession",
    "phone_number",
    "email",
    "location",
    "github_link",
    "linkedin_link",
    "skills",
    "education",
    "experience",
    "projects",
    "certifications",
    "achievements",
];

const EXTRACTION_RULES: &str = "\
1. Personal info: return a concise string or null if missing. location must be the \
personal contact address ONLY; ignore job, education and project locations. \
github_link and linkedin_link: search the entire text for URLs containing 'github.com' \
or 'linkedin.com/in/'; if several are found use the first one; null if none.
2. skills: all technical/professional skills as a list of strings; [] if none.
3. education, experience, certifications, achievements: each a list of single-line \
strings, no summaries; [] when the section is missing.
   - education: \"Degree/Program - Institution (Year Range)\", include all levels.
   - experience: \"Role - Organization\".
   - certifications: \"Certification Title or Issuer\", only items explicitly listed as certifications.
   - achievements: \"Key Result\", at most 10 words.
4. projects: a list of objects {\"name\": \"...\", \"links\": [...]}; [] if no projects. \
links holds project-specific URLs only (GitHub/demo); null when there is none.";

/// Builds the extraction prompt for one normalized résumé.
pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        "You are a fast, precise resume information extraction system. \
Your ONLY output must be a single JSON object.\n\n\
Required JSON keys: [{keys}]\n\n\
Extraction rules:\n{EXTRACTION_RULES}\n\n\
Final mandate:\n- {JSON_ONLY_INSTRUCTION}\n- {NULL_CONVENTION_INSTRUCTION}\n\
- Keep all values extremely concise.\n\n\
Text sections:\n{text}",
        keys = REQUIRED_KEYS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_key_and_appends_text() {
        let prompt = build_extraction_prompt("Jane Doe Skills: Go");
        for key in REQUIRED_KEYS {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.ends_with("Text sections:\nJane Doe Skills: Go"));
    }
}
