use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// Opaque ID types for type safety
pub type ParticipantId = String;
pub type Sequence = u64;

/// Column name -> value, in import order
pub type Fields = IndexMap<String, String>;

/// Maximum number of header columns a pool may carry
pub const MAX_HEADERS: usize = 3;

/// Upper bound for `DrawConfig::winner_count`
pub const MAX_WINNER_COUNT: u32 = 50;

/// Upper bound for `DrawConfig::grid_columns` (0 = auto layout)
pub const MAX_GRID_COLUMNS: u32 = 7;

/// Placeholder rendered for a header with no value
pub const MISSING_FIELD: &str = "-";

pub const DEFAULT_BACKGROUND: &str = "#2563eb";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    /// Display order comes from the pool headers when known
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub is_preselected: bool,
}

impl Participant {
    pub fn new(fields: Fields) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            fields,
            is_preselected: false,
        }
    }

    /// Values in header order, at most three, `-` for missing ones.
    /// Falls back to the participant's own keys when no headers are known.
    pub fn display_fields(&self, headers: &[String]) -> Vec<String> {
        let keys: Vec<&String> = if headers.is_empty() {
            self.fields.keys().collect()
        } else {
            headers.iter().collect()
        };

        keys.into_iter()
            .take(MAX_HEADERS)
            .map(|h| match self.fields.get(h) {
                Some(v) if !v.is_empty() => v.clone(),
                _ => MISSING_FIELD.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawPhase {
    #[default]
    Idle,
    Rolling,
    Revealed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrawConfig {
    pub winner_count: u32,
    /// 0 = auto layout
    pub grid_columns: u32,
    /// 0 = manual stop only
    pub duration_seconds: u32,
    pub background_color: String,
    pub remove_winners_from_pool: bool,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            winner_count: 1,
            grid_columns: 0,
            duration_seconds: 5,
            background_color: DEFAULT_BACKGROUND.to_string(),
            remove_winners_from_pool: true,
        }
    }
}

/// The replicated draw state. Only `DrawSession` builds these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DrawState {
    pub phase: DrawPhase,
    pub active_pool: Vec<Participant>,
    pub headers: Vec<String>,
    /// Non-empty only while `phase == Revealed`
    pub winners: Vec<Participant>,
    pub config: DrawConfig,
    pub sequence: Sequence,
}

/// One entry of the operator-local history log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    /// ISO8601 timestamp of the Stop transition
    pub timestamp: String,
    pub winners: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operator,
    Display,
}
