use serde::Deserialize;
use thiserror::Error;

use crate::batch::BatchRow;
use crate::models::ProjectEntry;

/// Separator used when a sequence field is flattened into one cell.
pub const LIST_SEPARATOR: &str = "; ";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Flush(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportColumns {
    /// Name, Email, Phone, Location, Skills, Education.
    #[default]
    Basic,
    /// Basic plus links, remaining sections, coordinates and gender.
    Full,
}

const BASIC_HEADERS: &[&str] = &["Name", "Email", "Phone", "Location", "Skills", "Education"];
const FULL_EXTRA_HEADERS: &[&str] = &[
    "Filename",
    "LinkedIn",
    "GitHub",
    "Websites",
    "Projects",
    "Certifications",
    "Achievements",
    "Latitude",
    "Longitude",
    "Country",
    "Gender",
];

/// Serializes rows as CSV. Null fields and absent sequences become empty cells.
pub fn export_csv<'a>(
    rows: impl IntoIterator<Item = &'a BatchRow>,
    columns: ExportColumns,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut headers: Vec<&str> = BASIC_HEADERS.to_vec();
    if columns == ExportColumns::Full {
        headers.extend_from_slice(FULL_EXTRA_HEADERS);
    }
    writer.write_record(&headers)?;

    for row in rows {
        let r = &row.record;
        let mut record = vec![
            text(&r.name),
            text(&r.email),
            text(&r.phone),
            text(&r.location),
            list(&r.skills),
            list(&r.education),
        ];
        if columns == ExportColumns::Full {
            record.extend([
                row.filename.clone(),
                text(&r.linkedin),
                text(&r.github),
                r.websites.join(LIST_SEPARATOR),
                projects(&r.projects),
                list(&r.certifications),
                list(&r.achievements),
                number(r.latitude),
                number(r.longitude),
                text(&r.country),
                text(&r.gender),
            ]);
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn list(value: &Option<Vec<String>>) -> String {
    value
        .as_ref()
        .map(|items| items.join(LIST_SEPARATOR))
        .unwrap_or_default()
}

fn projects(value: &Option<Vec<ProjectEntry>>) -> String {
    value
        .iter()
        .flatten()
        .map(ProjectEntry::display)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::row;

    #[test]
    fn test_basic_columns() {
        let mut jane = row("Jane Doe", Some("Berlin, Germany"), "Germany", &["Rust", "Go"]);
        jane.record.education = None;
        let csv = String::from_utf8(export_csv([&jane], ExportColumns::Basic).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Name,Email,Phone,Location,Skills,Education\n\
             Jane Doe,,,\"Berlin, Germany\",Rust; Go,\n"
        );
    }

    #[test]
    fn test_full_columns_flatten_projects() {
        let mut jane = row("Jane", None, "India", &[]);
        jane.record.projects = Some(vec![
            ProjectEntry::Title("Chess".to_string()),
            ProjectEntry::Linked {
                name: Some("Site".to_string()),
                links: Some(vec!["https://a.dev".to_string()]),
            },
        ]);
        let csv = String::from_utf8(export_csv([&jane], ExportColumns::Full).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap().split(',').count(), 17);
        let data = lines.next().unwrap();
        assert!(data.starts_with("Jane,,,,,,Jane.txt,"));
        assert!(data.contains("Chess; Site (https://a.dev)"));
        assert!(data.ends_with(",1,2,India,"));
    }

    #[test]
    fn test_columns_parse_lowercase() {
        let full: ExportColumns = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(full, ExportColumns::Full);
        assert_eq!(ExportColumns::default(), ExportColumns::Basic);
    }
}
