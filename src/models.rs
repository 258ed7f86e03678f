//! Board Models
//!
//! Data structures matching backend entities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque card identifier (backend `_id`)
pub type CardId = String;

/// Card priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Task card shown on the board (matches backend task)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id", alias = "id")]
    pub id: CardId,
    pub title: String,
    /// Rich-text (HTML) body
    #[serde(default)]
    pub description: String,
    /// User ids
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    /// Name of the status column this card sits in
    pub column: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Card {
    /// Create a card with empty optional fields
    pub fn new(id: impl Into<CardId>, title: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            assignees: Vec::new(),
            due_date: None,
            priority: Priority::default(),
            column: column.into(),
            attachments: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// Status column (matches backend status)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: i32,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
        }
    }
}

/// What is being carried during one drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub card_id: CardId,
    pub source_column: String,
}

/// `dueDate` arrives either as `2024-05-01` or as a full RFC 3339 timestamp.
mod due_date_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), FORMAT) {
            return Ok(Some(date));
        }
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| Some(dt.date_naive()))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_from_backend_json() {
        let json = r#"{
            "_id": "64f1",
            "title": "Write report",
            "description": "<p>draft</p>",
            "assignees": ["u1", "u2"],
            "dueDate": "2024-05-01T10:30:00.000Z",
            "priority": "High",
            "column": "TODO",
            "tags": ["docs"]
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.id, "64f1");
        assert_eq!(card.priority, Priority::High);
        assert_eq!(card.due_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(card.assignees.len(), 2);
        assert!(card.attachments.is_empty());
    }

    #[test]
    fn test_card_minimal_json_uses_defaults() {
        let json = r#"{"id":"c1","title":"t","column":"Done","dueDate":null}"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.priority, Priority::Medium);
        assert_eq!(card.due_date, None);
        assert_eq!(card.description, "");
    }

    #[test]
    fn test_card_serializes_plain_due_date() {
        let mut card = Card::new("c1", "t", "TODO");
        card.due_date = NaiveDate::from_ymd_opt(2024, 12, 31);
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["dueDate"], "2024-12-31");
        assert_eq!(value["_id"], "c1");
        assert_eq!(value["priority"], "medium");
    }

    #[test]
    fn test_bad_due_date_is_rejected() {
        let json = r#"{"_id":"c1","title":"t","column":"TODO","dueDate":"tomorrow"}"#;
        let result: Result<Card, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
