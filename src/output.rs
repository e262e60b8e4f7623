//! Table and JSON rendering for display records.

use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, ContentArrangement, Table, Width};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Declarative column spec: header text, the row key to pull, and styling.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub key: &'static str,
    pub right_align: bool,
    pub max_width: Option<u16>,
}

impl Column {
    pub fn new(header: &'static str, key: &'static str) -> Self {
        Column {
            header,
            key,
            right_align: false,
            max_width: None,
        }
    }

    pub fn right(mut self) -> Self {
        self.right_align = true;
        self
    }

    pub fn width(mut self, max: u16) -> Self {
        self.max_width = Some(max);
        self
    }
}

/// Render shaped rows as a table or pretty JSON. The footer (e.g. "Showing 5
/// issues") is only printed in table mode so JSON output stays parseable.
pub fn render(rows: &[Value], format: OutputFormat, columns: &[Column], footer: Option<&str>) {
    match format {
        OutputFormat::Json => print_json_rows(rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                return;
            }
            println!("{}", build_table(rows, columns));
            if let Some(footer) = footer {
                println!("\n{footer}");
            }
        }
    }
}

/// Print a raw API payload untouched; used by detail commands in JSON mode so
/// every field the server returned survives.
pub fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn print_json_rows(rows: &[Value]) {
    println!(
        "{}",
        serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
    );
}

pub(crate) fn build_table(rows: &[Value], columns: &[Column]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|c| Cell::new(c.header)).collect::<Vec<_>>());

    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(cell_text(row.get(c.key))))
                .collect::<Vec<_>>(),
        );
    }

    for (column, spec) in table.column_iter_mut().zip(columns.iter()) {
        if spec.right_align {
            column.set_cell_alignment(CellAlignment::Right);
        }
        if let Some(max) = spec.max_width {
            column.set_constraint(ColumnConstraint::UpperBoundary(Width::Fixed(max)));
        }
    }

    table
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Truncate to a character budget, ellipsis included, without splitting a
/// UTF-8 character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Timestamps arrive as RFC 3339 with sub-second precision and offsets; the
/// tables only want `YYYY-MM-DDTHH:MM:SS`.
pub fn short_timestamp(ts: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Err(_) => ts.chars().take(19).collect(),
    }
}

/// Two-column field/value table used by the detail views.
pub fn render_detail(rows: &[(&str, String)]) {
    let shaped: Vec<Value> = rows
        .iter()
        .map(|(field, value)| serde_json::json!({"field": field, "value": value}))
        .collect();
    let columns = [Column::new("Field", "field"), Column::new("Value", "value")];
    println!("{}", build_table(&shaped, &columns));
}
