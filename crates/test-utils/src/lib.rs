//! Sift test utilities.
//!
//! Row fixtures shaped like the `questions` and `sessions` tables (as
//! `row_to_json` returns them), plus JSON assertion helpers.

use serde_json::{Map, Value as JsonValue, json};
use uuid::Uuid;

/// Create a question row with the required columns filled in.
pub fn test_question(subject: &str, exam_type: &str) -> TestRow {
    TestRow::new().with_fields(json!({
        "question_text": "Placeholder question",
        "subject": subject,
        "exam_type": exam_type,
        "is_active": true,
    }))
}

/// Create a session row with the required columns filled in.
pub fn test_session(user_id: &str, status: &str) -> TestRow {
    TestRow::new().with_fields(json!({
        "user_id": user_id,
        "status": status,
    }))
}

/// A row builder for entity fixtures.
///
/// Every row gets a fresh `id` and null audit columns.
#[derive(Debug, Clone)]
pub struct TestRow {
    columns: Map<String, JsonValue>,
}

impl TestRow {
    pub fn new() -> Self {
        let mut columns = Map::new();
        columns.insert("id".into(), json!(Uuid::now_v7()));
        for audit in ["created_at", "updated_at", "created_by", "updated_by"] {
            columns.insert(audit.into(), JsonValue::Null);
        }
        Self { columns }
    }

    /// Set a custom ID.
    pub fn with_id(self, id: Uuid) -> Self {
        self.with("id", json!(id))
    }

    /// Set one column.
    pub fn with(mut self, column: &str, value: JsonValue) -> Self {
        self.columns.insert(column.to_string(), value);
        self
    }

    /// Set a text column.
    pub fn text(self, column: &str, value: &str) -> Self {
        self.with(column, json!(value))
    }

    /// Set an integer column.
    pub fn int(self, column: &str, value: i64) -> Self {
        self.with(column, json!(value))
    }

    /// Set a column to NULL.
    pub fn null(self, column: &str) -> Self {
        self.with(column, JsonValue::Null)
    }

    /// Merge every key of a JSON object into the row.
    pub fn with_fields(mut self, fields: JsonValue) -> Self {
        if let JsonValue::Object(fields) = fields {
            self.columns.extend(fields);
        }
        self
    }

    pub fn id(&self) -> Option<Uuid> {
        self.columns
            .get("id")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// The finished row.
    pub fn build(self) -> JsonValue {
        JsonValue::Object(self.columns)
    }
}

impl Default for TestRow {
    fn default() -> Self {
        Self::new()
    }
}

impl From<TestRow> for JsonValue {
    fn from(row: TestRow) -> Self {
        row.build()
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON array holds exactly these strings, in order.
    pub fn strings_eq(value: &Value, expected: &[&str]) {
        let actual: Vec<&str> = value
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        assert_eq!(actual, expected, "string array mismatch in: {value}");
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}
