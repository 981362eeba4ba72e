//! Participant list ingestion
//!
//! Turns external data into a `(headers, participants)` pair the draw core
//! can trust: at most three headers, every participant's fields restricted
//! to them.

use crate::types::{Fields, Participant, MAX_HEADERS};
use serde_json::Value;

/// Number of participants in the generated demo pool
pub const MOCK_POOL_SIZE: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to parse JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to parse CSV: {0}")]
    InvalidCsv(#[from] csv::Error),

    #[error("CSV line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Expected a JSON array of objects")]
    NotAnArray,

    #[error("No participants found")]
    Empty,

    #[error("No valid headers found")]
    NoHeaders,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPool {
    pub headers: Vec<String>,
    pub participants: Vec<Participant>,
}

impl ImportedPool {
    /// Build a pool from rows of column -> value. Headers are trimmed,
    /// blank ones dropped, and capped at three.
    pub fn from_rows(
        headers: Vec<String>,
        rows: Vec<Fields>,
    ) -> Result<Self, ImportError> {
        let headers: Vec<String> = headers
            .into_iter()
            .filter(|h| !h.trim().is_empty())
            .take(MAX_HEADERS)
            .collect();

        if headers.is_empty() {
            return Err(ImportError::NoHeaders);
        }
        if rows.is_empty() {
            return Err(ImportError::Empty);
        }

        let participants = rows
            .into_iter()
            .map(|row| {
                let fields = headers
                    .iter()
                    .map(|h| {
                        let value = row.get(h).map(|v| v.trim().to_string()).unwrap_or_default();
                        (h.clone(), value)
                    })
                    .collect();
                Participant::new(fields)
            })
            .collect();

        Ok(Self {
            headers,
            participants,
        })
    }
}

/// Parse a JSON array of flat objects. Headers come from the first object's
/// keys in document order.
pub fn parse_json(content: &str) -> Result<ImportedPool, ImportError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    let first = match items.first() {
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(ImportError::NotAnArray),
        None => return Err(ImportError::Empty),
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let rows = items
        .iter()
        .map(|item| match item {
            Value::Object(obj) => Ok(obj
                .iter()
                .map(|(k, v)| (k.clone(), stringify(v)))
                .collect()),
            _ => Err(ImportError::NotAnArray),
        })
        .collect::<Result<Vec<_>, _>>()?;

    ImportedPool::from_rows(headers, rows)
}

/// Parse CSV with a header row. Cells are trimmed and rows with no values
/// are skipped; any other row must have one cell per header column.
pub fn parse_csv(content: &str) -> Result<ImportedPool, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != headers.len() {
            return Err(ImportError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect(),
        );
    }

    ImportedPool::from_rows(headers, rows)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Headers of the generated demo pool
pub fn mock_headers() -> Vec<String> {
    vec![
        "Staff ID".to_string(),
        "Name".to_string(),
        "Company".to_string(),
    ]
}

/// Demo pool used until the operator imports a real list
pub fn mock_pool() -> ImportedPool {
    let participants = (1..=MOCK_POOL_SIZE)
        .map(|i| {
            let company = if i % 2 == 1 { "JET COMMERCE" } else { "OTHER CORP" };
            let fields = Fields::from([
                ("Staff ID".to_string(), format!("S{:03}", i)),
                ("Name".to_string(), format!("Participant {}", i)),
                ("Company".to_string(), company.to_string()),
            ]);
            Participant {
                id: format!("mock-{}", i),
                fields,
                is_preselected: false,
            }
        })
        .collect();

    ImportedPool {
        headers: mock_headers(),
        participants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_keeps_key_order_and_caps_headers() {
        let content = r#"[
            {"Staff ID": "S1", "Name": "Ada", "Team": "Core", "Extra": "x"},
            {"Staff ID": "S2", "Name": "Grace", "Team": "Infra"}
        ]"#;

        let pool = parse_json(content).unwrap();
        assert_eq!(pool.headers, vec!["Staff ID", "Name", "Team"]);
        assert_eq!(pool.participants.len(), 2);
        assert!(!pool.participants[0].fields.contains_key("Extra"));
        assert_eq!(pool.participants[1].fields["Team"], "Infra");
    }

    #[test]
    fn test_parse_json_stringifies_values() {
        let content = r#"[{"Name": "Ada", "Number": 7, "Note": null}]"#;
        let pool = parse_json(content).unwrap();
        let fields = &pool.participants[0].fields;
        assert_eq!(fields["Number"], "7");
        assert_eq!(fields["Note"], "");
    }

    #[test]
    fn test_parse_json_missing_values_are_blank() {
        let content = r#"[{"Name": "Ada", "Team": "Core"}, {"Name": "Grace"}]"#;
        let pool = parse_json(content).unwrap();
        assert_eq!(pool.participants[1].fields["Team"], "");
    }

    #[test]
    fn test_parse_json_errors() {
        assert!(matches!(parse_json("{oops"), Err(ImportError::InvalidJson(_))));
        assert!(matches!(parse_json(r#"{"a": 1}"#), Err(ImportError::NotAnArray)));
        assert!(matches!(parse_json("[]"), Err(ImportError::Empty)));
        assert!(matches!(parse_json("[1, 2]"), Err(ImportError::NotAnArray)));
        assert!(matches!(parse_json(r#"[{"  ": "x"}]"#), Err(ImportError::NoHeaders)));
    }

    #[test]
    fn test_parse_csv_caps_headers_and_drops_blank_ones() {
        let content = "Staff ID, Name ,,Team,Extra\nS1, Ada ,x,Core,1\nS2,Grace,y,Infra,2\n";

        let pool = parse_csv(content).unwrap();
        assert_eq!(pool.headers, vec!["Staff ID", "Name", "Team"]);
        assert_eq!(pool.participants.len(), 2);

        let ada = &pool.participants[0];
        assert_eq!(ada.fields["Name"], "Ada");
        assert_eq!(ada.fields["Team"], "Core");
        assert!(!ada.fields.contains_key("Extra"));
        assert_eq!(ada.display_fields(&pool.headers), vec!["S1", "Ada", "Core"]);
    }

    #[test]
    fn test_parse_csv_skips_blank_rows() {
        let content = "Name,Team\nAda,Core\n\n , \n\"Hopper, Grace\",Infra\n";

        let pool = parse_csv(content).unwrap();
        assert_eq!(pool.participants.len(), 2);
        assert_eq!(pool.participants[1].fields["Name"], "Hopper, Grace");
    }

    #[test]
    fn test_parse_csv_errors() {
        assert!(matches!(
            parse_csv("Name,Team\nAda,Core\nGrace,Infra,extra\n"),
            Err(ImportError::RaggedRow {
                line: 3,
                expected: 2,
                found: 3
            })
        ));
        assert!(matches!(
            parse_csv("Name,Team\nAda\n"),
            Err(ImportError::RaggedRow { found: 1, .. })
        ));
        assert!(matches!(parse_csv("Name,Team\n"), Err(ImportError::Empty)));
        assert!(matches!(parse_csv(""), Err(ImportError::NoHeaders)));
        assert!(matches!(parse_csv(" , \nx,y\n"), Err(ImportError::NoHeaders)));
    }

    #[test]
    fn test_import_assigns_unique_ids() {
        let content = r#"[{"Name": "Ada"}, {"Name": "Ada"}]"#;
        let pool = parse_json(content).unwrap();
        assert_ne!(pool.participants[0].id, pool.participants[1].id);
    }

    #[test]
    fn test_mock_pool() {
        let pool = mock_pool();
        assert_eq!(pool.participants.len(), MOCK_POOL_SIZE);
        assert_eq!(pool.headers, mock_headers());
        assert_eq!(pool.participants[0].fields["Staff ID"], "S001");
        assert_eq!(pool.participants[0].fields["Company"], "JET COMMERCE");
    }
}
