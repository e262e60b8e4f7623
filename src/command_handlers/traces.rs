//! `transactions`, `trace`, `transaction`, and `spans`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::config::EffectiveConfig;
use crate::error::{Error, Result};
use crate::models::{DiscoverRow, Span};
use crate::output::{
    print_json, render, render_detail, short_timestamp, truncate_chars, Column, OutputFormat,
};

static TRACE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").unwrap());

const MAX_DESCRIPTION_LENGTH: usize = 50;
const TIMELINE_BAR_WIDTH: usize = 40;

/// Checked in dispatch before configuration is resolved, so a malformed id is
/// always a usage error regardless of config state.
pub fn validate_trace_id(trace_id: &str) -> Result<()> {
    if TRACE_ID.is_match(trace_id) {
        return Ok(());
    }
    Err(Error::Validation(format!(
        "invalid trace id '{trace_id}': expected a 32-character hex string"
    )))
}

pub fn list_transactions(config: &EffectiveConfig, max: usize, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = client.get(&format!(
        "/organizations/{}/events/\
         ?query=event.type:transaction project:{}\
         &field=title&field=id&field=trace&field=transaction.duration\
         &field=transaction.status&field=project&field=timestamp\
         &sort=-timestamp",
        config.org, config.project
    ))?;

    let mut events = data_array(&payload);
    if events.is_empty() {
        info!(project = %config.project, "no transactions found");
        return Ok(());
    }
    events.truncate(max);

    if format == OutputFormat::Json {
        print_json(&Value::Array(events));
        return Ok(());
    }

    let rows: Vec<Value> = events
        .iter()
        .map(|event| {
            let row: DiscoverRow = serde_json::from_value(event.clone()).unwrap_or_default();
            json!({
                "title": row.title,
                "id": row.id,
                "trace": row.trace,
                "duration": row.duration.map(|d| d.to_string()).unwrap_or_default(),
                "status": row.status.unwrap_or_default(),
                "timestamp": short_timestamp(&row.timestamp),
            })
        })
        .collect();

    let columns = [
        Column::new("Transaction", "title").width(30),
        Column::new("Event ID", "id").width(36),
        Column::new("Trace ID", "trace").width(36),
        Column::new("Duration (ms)", "duration").right(),
        Column::new("Status", "status"),
        Column::new("Timestamp", "timestamp"),
    ];
    render(
        &rows,
        format,
        &columns,
        Some(&format!("Showing {} transactions", rows.len())),
    );
    Ok(())
}

pub fn lookup_trace(
    config: &EffectiveConfig,
    trace_id: &str,
    max: usize,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = client.get(&format!(
        "/organizations/{}/events/?query=trace:{trace_id}\
         &field=title&field=id&field=span_id&field=transaction.duration\
         &field=transaction.status&field=project&field=timestamp",
        config.org
    ))?;

    let mut events = data_array(&payload);
    if events.is_empty() {
        info!(%trace_id, "no events found for trace");
        return Ok(());
    }

    events.sort_by(|a, b| {
        let ts = |v: &Value| v.get("timestamp").and_then(Value::as_str).unwrap_or("").to_string();
        ts(a).cmp(&ts(b))
    });
    events.truncate(max);

    if format == OutputFormat::Json {
        print_json(&Value::Array(events));
        return Ok(());
    }

    let rows: Vec<Value> = events
        .iter()
        .map(|event| {
            let row: DiscoverRow = serde_json::from_value(event.clone()).unwrap_or_default();
            json!({
                "title": row.title,
                "span_id": row.span_id.unwrap_or_default(),
                "duration": row.duration.map(|d| d.to_string()).unwrap_or_default(),
                "status": row.status.unwrap_or_default(),
                "project": row.project.unwrap_or_default(),
                "timestamp": short_timestamp(&row.timestamp),
            })
        })
        .collect();

    let columns = [
        Column::new("Transaction", "title").width(40),
        Column::new("Span ID", "span_id").width(16),
        Column::new("Duration", "duration").right(),
        Column::new("Status", "status"),
        Column::new("Project", "project"),
        Column::new("Timestamp", "timestamp"),
    ];
    render(
        &rows,
        format,
        &columns,
        Some(&format!("Showing {} events", rows.len())),
    );
    Ok(())
}

pub fn show_transaction(
    config: &EffectiveConfig,
    event_id: &str,
    timeline: bool,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = client
        .get(&format!(
            "/organizations/{}/events/{}:{event_id}/",
            config.org, config.project
        ))
        .map_err(|e| e.describe_not_found(format!("no such event '{event_id}'")))?;

    if format == OutputFormat::Json {
        print_json(&payload);
        return Ok(());
    }

    let id_prefix: String = event_id.chars().take(8).collect();
    println!("\n=== Transaction {id_prefix}... ===");

    let trace_ctx = payload.pointer("/contexts/trace");
    let trace_field = |key: &str| -> String {
        trace_ctx
            .and_then(|t| t.get(key))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "N/A".to_string())
    };
    let string_field = |key: &str| -> String {
        payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("N/A")
            .to_string()
    };

    let rows = vec![
        ("Transaction", string_field("title")),
        ("Event ID", string_field("eventID")),
        ("Trace ID", trace_field("trace_id")),
        ("Span ID", trace_field("span_id")),
        ("Parent Span", trace_field("parent_span_id")),
        ("Duration", format!("{} ms", trace_field("duration"))),
        ("Status", trace_field("status")),
        ("Timestamp", string_field("dateCreated")),
    ];
    render_detail(&rows);

    let (spans, _root, _duration) = extract_spans(&payload);
    if spans.is_empty() {
        println!("\nNo span data found");
        return Ok(());
    }

    if timeline {
        render_timeline(&spans);
    } else {
        let rows: Vec<Value> = spans
            .iter()
            .map(|span| {
                json!({
                    "operation": span.op.clone().unwrap_or_default(),
                    "description": truncate_chars(
                        span.description.as_deref().unwrap_or(""),
                        MAX_DESCRIPTION_LENGTH,
                    ),
                    "duration": format!("{:.3}", span.duration()),
                })
            })
            .collect();
        let columns = [
            Column::new("Operation", "operation").width(20),
            Column::new("Description", "description").width(50),
            Column::new("Duration (s)", "duration").right(),
        ];
        println!();
        render(
            &rows,
            OutputFormat::Table,
            &columns,
            Some(&format!("{} spans", spans.len())),
        );
    }

    println!();
    Ok(())
}

pub fn show_spans(
    config: &EffectiveConfig,
    event_id: &str,
    op_filter: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = client
        .get(&format!(
            "/organizations/{}/events/{}:{event_id}/",
            config.org, config.project
        ))
        .map_err(|e| e.describe_not_found(format!("no such event '{event_id}'")))?;

    // Spans stay raw `Value`s through filtering so JSON output keeps every
    // field the API returned; the typed view is only for the tree.
    let mut spans = span_values(&payload);
    if spans.is_empty() {
        info!(%event_id, "no span data found");
        return Ok(());
    }

    if let Some(filter) = op_filter {
        retain_matching_ops(&mut spans, filter);
        if spans.is_empty() {
            info!(op = %filter, "no spans matching op filter");
            return Ok(());
        }
    }

    if format == OutputFormat::Json {
        print_json(&Value::Array(spans));
        return Ok(());
    }

    let (root_span_id, txn_duration) = trace_meta(&payload);
    let typed: Vec<Span> = spans
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    let tree = build_span_tree(&typed, root_span_id.as_deref());
    print_span_tree(&tree, typed.len(), txn_duration);
    Ok(())
}

fn retain_matching_ops(spans: &mut Vec<Value>, filter: &str) {
    let ops: Vec<&str> = filter.split(',').map(str::trim).collect();
    spans.retain(|s| ops.contains(&s.get("op").and_then(Value::as_str).unwrap_or("")));
}

/// Root span id and transaction duration (seconds) from the trace context.
/// The API reports the duration in milliseconds.
fn trace_meta(event: &Value) -> (Option<String>, f64) {
    let trace_ctx = event.pointer("/contexts/trace");
    let root_span_id = trace_ctx
        .and_then(|t| t.get("span_id"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let txn_duration = trace_ctx
        .and_then(|t| t.get("duration"))
        .and_then(Value::as_f64)
        .map(|ms| ms / 1000.0)
        .unwrap_or(0.0);
    (root_span_id, txn_duration)
}

/// Raw span objects from the event's `spans` entry, untouched.
fn span_values(event: &Value) -> Vec<Value> {
    event
        .get("entries")
        .and_then(Value::as_array)
        .and_then(|entries| {
            entries
                .iter()
                .find(|e| e.get("type").and_then(Value::as_str) == Some("spans"))
        })
        .and_then(|entry| entry.get("data"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn extract_spans(event: &Value) -> (Vec<Span>, Option<String>, f64) {
    let (root_span_id, txn_duration) = trace_meta(event);
    let spans = span_values(event)
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    (spans, root_span_id, txn_duration)
}

fn data_array(payload: &Value) -> Vec<Value> {
    payload
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub(crate) struct SpanNode {
    pub op: String,
    pub description: String,
    pub duration: f64,
}

/// Parent/child structure over spans; index 0 is the synthetic root for the
/// transaction itself. Spans whose parent is missing hang off the root.
pub(crate) struct SpanTree {
    pub nodes: Vec<SpanNode>,
    pub children: Vec<Vec<usize>>,
}

pub(crate) fn build_span_tree(spans: &[Span], root_span_id: Option<&str>) -> SpanTree {
    use std::collections::HashMap;

    let root_id = root_span_id.unwrap_or("root").to_string();
    let mut nodes = vec![SpanNode {
        op: "transaction".to_string(),
        description: String::new(),
        duration: 0.0,
    }];
    let mut children: Vec<Vec<usize>> = vec![Vec::new()];
    let mut index: HashMap<String, usize> = HashMap::new();
    index.insert(root_id, 0);

    let mut parents: Vec<(usize, Option<String>)> = Vec::new();
    for span in spans {
        if span.span_id.is_empty() {
            continue;
        }
        if index.contains_key(&span.span_id) {
            warn!(span_id = %span.span_id, "duplicate span_id skipped");
            continue;
        }
        let idx = nodes.len();
        nodes.push(SpanNode {
            op: span.op.clone().unwrap_or_else(|| "(unknown)".to_string()),
            description: span
                .description
                .clone()
                .unwrap_or_else(|| "(no description)".to_string()),
            duration: span.duration(),
        });
        children.push(Vec::new());
        index.insert(span.span_id.clone(), idx);
        parents.push((idx, span.parent_span_id.clone()));
    }

    // Parenting is resolved after all nodes exist, so order in the payload
    // does not matter.
    for (idx, parent_id) in parents {
        let parent_idx = parent_id
            .as_deref()
            .and_then(|p| index.get(p).copied())
            .filter(|&p| p != idx)
            .unwrap_or(0);
        children[parent_idx].push(idx);
    }

    SpanTree { nodes, children }
}

fn print_span_tree(tree: &SpanTree, total_spans: usize, txn_duration: f64) {
    println!("{}", tree.nodes[0].op);
    print_branch(tree, 0, "");
    println!("\n{total_spans} spans | {txn_duration:.3}s total");
}

fn print_branch(tree: &SpanTree, idx: usize, prefix: &str) {
    let kids = &tree.children[idx];
    for (i, &child) in kids.iter().enumerate() {
        let last = i + 1 == kids.len();
        let node = &tree.nodes[child];
        let connector = if last { "└─" } else { "├─" };
        println!(
            "{prefix}{connector} {} {} {:.3}s",
            node.op,
            truncate_chars(&node.description, MAX_DESCRIPTION_LENGTH),
            node.duration
        );
        let next_prefix = format!("{prefix}{}", if last { "   " } else { "│  " });
        print_branch(tree, child, &next_prefix);
    }
}

/// Gantt-style timeline: one row per span with a bar positioned by its offset
/// into the transaction.
fn render_timeline(spans: &[Span]) {
    let min_start = spans
        .iter()
        .map(|s| s.start_timestamp)
        .fold(f64::INFINITY, f64::min);
    let max_end = spans
        .iter()
        .map(|s| s.timestamp)
        .fold(f64::NEG_INFINITY, f64::max);
    let total = max_end - min_start;

    if total <= 0.0 {
        println!("\nCannot render timeline (zero duration)");
        return;
    }

    let rows: Vec<Value> = spans
        .iter()
        .map(|span| {
            let offset = span.start_timestamp - min_start;
            let duration = span.duration();
            let pos = (offset / total * TIMELINE_BAR_WIDTH as f64) as usize;
            let len = ((duration / total * TIMELINE_BAR_WIDTH as f64) as usize).max(1);
            json!({
                "op": span.op.clone().unwrap_or_default(),
                "description": truncate_chars(span.description.as_deref().unwrap_or(""), 35),
                "start": format!("{offset:.3}s"),
                "duration": format!("{duration:.3}s"),
                "bar": format!("{}{}", " ".repeat(pos), "█".repeat(len)),
            })
        })
        .collect();

    let columns = [
        Column::new("Op", "op").width(20),
        Column::new("Description", "description").width(35),
        Column::new("Start", "start").right(),
        Column::new("Dur (s)", "duration").right(),
        Column::new("Timeline", "bar"),
    ];
    println!();
    render(&rows, OutputFormat::Table, &columns, None);
    println!("\n  Total duration: {total:.3}s");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: &str, parent: Option<&str>, op: &str, start: f64, end: f64) -> Span {
        Span {
            span_id: id.to_string(),
            parent_span_id: parent.map(str::to_string),
            op: Some(op.to_string()),
            description: Some(format!("{op} description")),
            start_timestamp: start,
            timestamp: end,
        }
    }

    #[test]
    fn trace_id_must_be_32_hex_chars() {
        assert!(validate_trace_id("abc123def456789012345678901234ab").is_ok());
        assert!(validate_trace_id("ABC123DEF456789012345678901234AB").is_ok());
        assert!(validate_trace_id("abc123").is_err());
        assert!(validate_trace_id("zzc123def456789012345678901234ab").is_err());

        let err = validate_trace_id("nope").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn span_tree_attaches_children_to_parents() {
        let spans = vec![
            span("aaaa", Some("root0000"), "http.server", 0.0, 1.0),
            span("bbbb", Some("aaaa"), "db.query", 0.1, 0.3),
            span("cccc", Some("aaaa"), "cache.get", 0.4, 0.5),
        ];
        let tree = build_span_tree(&spans, Some("root0000"));

        assert_eq!(tree.nodes.len(), 4);
        assert_eq!(tree.children[0], vec![1]);
        // aaaa is node 1 and owns both leaf spans.
        assert_eq!(tree.children[1], vec![2, 3]);
        assert!((tree.nodes[2].duration - 0.2).abs() < 1e-9);
    }

    #[test]
    fn orphan_spans_hang_off_the_root() {
        let spans = vec![span("aaaa", Some("missing"), "db.query", 0.0, 0.1)];
        let tree = build_span_tree(&spans, None);
        assert_eq!(tree.children[0], vec![1]);
    }

    #[test]
    fn duplicate_span_ids_are_skipped() {
        let spans = vec![
            span("aaaa", None, "first", 0.0, 1.0),
            span("aaaa", None, "second", 0.0, 2.0),
        ];
        let tree = build_span_tree(&spans, None);
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[1].op, "first");
    }

    #[test]
    fn filtered_spans_keep_fields_beyond_the_typed_view() {
        let event = json!({
            "entries": [{
                "type": "spans",
                "data": [
                    {
                        "span_id": "aaaa",
                        "op": "db.query",
                        "exclusive_time": 12.5,
                        "tags": {"db.system": "postgres"},
                        "hash": "77adba75e2b3f511",
                    },
                    {"span_id": "bbbb", "op": "cache.get"},
                ],
            }],
        });

        let mut spans = span_values(&event);
        assert_eq!(spans.len(), 2);

        retain_matching_ops(&mut spans, "db.query");
        assert_eq!(spans.len(), 1);
        // Fields the table view never shows must survive for JSON output.
        assert_eq!(spans[0]["exclusive_time"], json!(12.5));
        assert_eq!(spans[0]["tags"]["db.system"], json!("postgres"));
    }

    #[test]
    fn op_filter_accepts_comma_separated_lists() {
        let event = json!({
            "entries": [{
                "type": "spans",
                "data": [
                    {"span_id": "aaaa", "op": "db.query"},
                    {"span_id": "bbbb", "op": "cache.get"},
                    {"span_id": "cccc", "op": "http.client"},
                ],
            }],
        });

        let mut spans = span_values(&event);
        retain_matching_ops(&mut spans, "db.query, http.client");
        let ops: Vec<&str> = spans
            .iter()
            .map(|s| s["op"].as_str().unwrap())
            .collect();
        assert_eq!(ops, ["db.query", "http.client"]);
    }

    #[test]
    fn child_appearing_before_parent_still_attaches() {
        let spans = vec![
            span("bbbb", Some("aaaa"), "db.query", 0.1, 0.2),
            span("aaaa", None, "http.server", 0.0, 1.0),
        ];
        let tree = build_span_tree(&spans, None);
        // bbbb is node 1, aaaa is node 2; bbbb must be aaaa's child.
        assert_eq!(tree.children[2], vec![1]);
        assert_eq!(tree.children[0], vec![2]);
    }
}
