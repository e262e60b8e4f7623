//! Typed views over Sentry API responses.
//!
//! Commands fetch raw `serde_json::Value` so `--format json` round-trips every
//! field the API returned; the table path deserializes these views from the
//! raw payload and keeps only what gets displayed. All fields default so a
//! sparse response never fails a command.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub status: String,
    pub substatus: Option<String>,
    pub level: String,
    pub priority: Option<String>,
    pub count: String,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub permalink: Option<String>,
    pub project: Option<ProjectRef>,
    pub first_release: Option<Release>,
    pub last_release: Option<Release>,
    pub tags: Vec<IssueTag>,
}

/// The issues endpoint embeds the project as an object; older payloads use a
/// bare slug string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProjectRef {
    Slug(String),
    Info { slug: String },
}

impl ProjectRef {
    pub fn slug(&self) -> &str {
        match self {
            ProjectRef::Slug(s) => s,
            ProjectRef::Info { slug } => slug,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct IssueTag {
    pub key: String,
    pub total_values: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Release {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "eventID")]
    pub event_id: String,
    pub id: Option<String>,
    pub title: String,
    pub message: String,
    pub date_created: String,
    pub tags: Vec<EventTag>,
    pub sdk: Option<Sdk>,
    pub release: Option<Release>,
    pub context: Value,
    pub entries: Vec<EventEntry>,
}

impl Event {
    /// Events list rows carry `eventID`; fall back to `id` when absent.
    pub fn display_id(&self) -> &str {
        if self.event_id.is_empty() {
            self.id.as_deref().unwrap_or("")
        } else {
            &self.event_id
        }
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EventTag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Sdk {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EventEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExceptionData {
    pub values: Vec<ExceptionValue>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<String>,
    pub stacktrace: Option<Stacktrace>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Stacktrace {
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Frame {
    pub filename: String,
    pub line_no: Option<u64>,
    pub function: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Project {
    pub slug: String,
    pub name: String,
    pub platform: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TagDetail {
    pub key: String,
    pub unique_values: Option<u64>,
    pub top_values: Vec<TagValue>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TagValue {
    pub value: String,
    pub count: u64,
}

/// One row from the discover events endpoint; field names carry dots.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DiscoverRow {
    pub title: String,
    pub id: String,
    pub trace: String,
    pub span_id: Option<String>,
    #[serde(rename = "transaction.duration")]
    pub duration: Option<f64>,
    #[serde(rename = "transaction.status")]
    pub status: Option<String>,
    pub project: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Span {
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub op: Option<String>,
    pub description: Option<String>,
    pub start_timestamp: f64,
    pub timestamp: f64,
}

impl Span {
    pub fn duration(&self) -> f64 {
        self.timestamp - self.start_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_deserializes_from_sparse_payload() {
        let issue: Issue = serde_json::from_value(json!({
            "id": "24",
            "shortId": "OTEL-COLLECTOR-Q",
            "title": "connection refused",
            "status": "unresolved",
            "level": "error",
            "count": "349",
        }))
        .unwrap();
        assert_eq!(issue.short_id, "OTEL-COLLECTOR-Q");
        assert_eq!(issue.count, "349");
        assert!(issue.permalink.is_none());
        assert!(issue.tags.is_empty());
    }

    #[test]
    fn project_ref_accepts_object_and_string() {
        let issue: Issue = serde_json::from_value(json!({
            "project": {"slug": "otel-collector", "name": "OTel Collector"}
        }))
        .unwrap();
        assert_eq!(issue.project.unwrap().slug(), "otel-collector");

        let issue: Issue = serde_json::from_value(json!({"project": "backend"})).unwrap();
        assert_eq!(issue.project.unwrap().slug(), "backend");
    }

    #[test]
    fn event_falls_back_to_id_when_event_id_missing() {
        let event: Event = serde_json::from_value(json!({
            "id": "abc123",
            "tags": [{"key": "server_name", "value": "web-1"}],
        }))
        .unwrap();
        assert_eq!(event.display_id(), "abc123");
        assert_eq!(event.tag_value("server_name"), Some("web-1"));
        assert_eq!(event.tag_value("release"), None);
    }

    #[test]
    fn discover_row_reads_dotted_fields() {
        let row: DiscoverRow = serde_json::from_value(json!({
            "title": "GET /checkout",
            "id": "d3f1d812",
            "trace": "ab".repeat(16),
            "transaction.duration": 182.5,
            "transaction.status": "ok",
            "timestamp": "2026-08-01T12:00:00+00:00",
        }))
        .unwrap();
        assert_eq!(row.duration, Some(182.5));
        assert_eq!(row.status.as_deref(), Some("ok"));
    }

    #[test]
    fn span_duration_is_end_minus_start() {
        let span: Span = serde_json::from_value(json!({
            "span_id": "aaaa",
            "start_timestamp": 10.0,
            "timestamp": 10.25,
        }))
        .unwrap();
        assert!((span.duration() - 0.25).abs() < 1e-9);
    }
}
