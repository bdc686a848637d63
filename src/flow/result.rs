use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response envelope returned for every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proxy: String,
    pub message: String,
    /// Whole-run wall time in milliseconds.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub engine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_page: String,
    #[serde(default)]
    pub items_on_page: u32,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default)]
    pub infinite_scroll: u32,
    #[serde(default)]
    pub paginate: bool,
    #[serde(default)]
    pub paginate_limit: u32,
    #[serde(default)]
    pub record: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recording: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<ResultPage>,
    #[serde(default)]
    pub usage: ResultUsage,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultUsage {
    pub disk: HashMap<String, u64>,
    pub bandwidth: HashMap<String, f64>,
}

/// One visited page: identity plus everything the steps extracted there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPage {
    pub title: String,
    pub url: String,
    /// 1-based page number.
    pub page: u32,
    /// Per-page wall time in milliseconds.
    pub duration: u64,
    pub content: Vec<ResultContent>,
}

/// One extracted item. `content` is the payload; tables carry their JSON
/// serialization here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub length: usize,
    pub content: String,
}

impl ResultContent {
    pub fn new(kind: &str, name: &str, content: String) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            length: content.len(),
            content,
        }
    }
}

/// Structured table payload, serialized to JSON as the content string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub name: String,
    pub column: usize,
    pub row: usize,
    pub header: Vec<ResultTableHead>,
    pub data: Vec<Vec<ResultTableData>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultTableHead {
    /// 1-based column index.
    pub index: usize,
    pub length: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultTableData {
    #[serde(rename = "type")]
    pub kind: String,
    /// 1-based column index.
    pub index: usize,
    pub length: usize,
    pub name: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_empty_optional_fields() {
        let envelope = RunResult {
            code: 404,
            message: "Flow not found for abc".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(json["code"], 404);
        assert!(json.get("id").is_none());
        assert!(json.get("recording").is_none());
        assert!(json.get("result").is_none());
        // errors and usage always serialize.
        assert_eq!(json["errors"], serde_json::json!([]));
        assert!(json.get("usage").is_some());
    }

    #[test]
    fn content_type_field_serializes_as_type() {
        let content = ResultContent::new("text", "title", "Hello".to_string());
        let json = serde_json::to_value(&content).expect("serializes");
        assert_eq!(json["type"], "text");
        assert_eq!(json["length"], 5);
        assert_eq!(json["content"], "Hello");
    }

    #[test]
    fn pages_carry_one_based_numbers() {
        let page = ResultPage {
            title: "t".to_string(),
            url: "https://example.test".to_string(),
            page: 1,
            duration: 12,
            content: vec![],
        };
        let json = serde_json::to_value(&page).expect("serializes");
        assert_eq!(json["page"], 1);
        assert_eq!(json["content"], serde_json::json!([]));
    }
}
