use serde::{Deserialize, Serialize};

/// One word as stored upstream.
///
/// Field aliases accept the storage document names (`_id`, `word`,
/// `group_number`) so exported collections can be fed in unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "word")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(
        default,
        alias = "group_number",
        alias = "groupNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_rank: Option<f64>,
}

impl WordRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_group(mut self, group_rank: f64) -> Self {
        self.group_rank = Some(group_rank);
        self
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_storage_documents() {
        let raw = r#"{ "_id": "65f0", "word": "rust", "group_number": 2, "weight": 3.5 }"#;
        let record: WordRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id.as_deref(), Some("65f0"));
        assert_eq!(record.text, "rust");
        assert_eq!(record.group_rank, Some(2.0));
        assert_eq!(record.weight, Some(3.5));
    }

    #[test]
    fn optional_fields_default_to_none() {
        let record: WordRecord = serde_json::from_str(r#"{ "text": "solo" }"#).unwrap();
        assert_eq!(record, WordRecord::new("solo"));
        assert!(record.has_text());
        assert!(!WordRecord::new(" \t").has_text());
    }
}
