//! `event`, `events`, and `tags`.

use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::config::EffectiveConfig;
use crate::error::Result;
use crate::models::{Event, ExceptionData, Issue, TagDetail};
use crate::output::{print_json, render, render_detail, Column, OutputFormat};

/// Users pass either the numeric issue id or the short id; the events and tags
/// endpoints only accept the numeric one. One extra lookup normalizes both and
/// recovers the short id for display.
fn resolve_issue_ids(
    client: &ApiClient,
    org: &str,
    issue_id: &str,
) -> Result<(String, String)> {
    let payload = client
        .get(&format!("/organizations/{org}/issues/{issue_id}/"))
        .map_err(|e| e.describe_not_found(format!("no such issue '{issue_id}'")))?;
    let issue: Issue = serde_json::from_value(payload)?;

    let numeric = if issue.id.is_empty() {
        issue_id.to_string()
    } else {
        issue.id
    };
    let short = if issue.short_id.is_empty() {
        issue_id.to_string()
    } else {
        issue.short_id
    };
    Ok((numeric, short))
}

pub fn show_event(
    config: &EffectiveConfig,
    issue_id: &str,
    event_id: Option<&str>,
    context_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let (numeric_id, short_id) = resolve_issue_ids(&client, &config.org, issue_id)?;

    let endpoint = match event_id {
        Some(id) => format!(
            "/organizations/{}/issues/{numeric_id}/events/{id}/",
            config.org
        ),
        None => format!(
            "/organizations/{}/issues/{numeric_id}/events/latest/",
            config.org
        ),
    };
    let payload = client
        .get(&endpoint)
        .map_err(|e| e.describe_not_found(format!("no such event for issue '{short_id}'")))?;

    if format == OutputFormat::Json {
        print_json(&payload);
        return Ok(());
    }

    let event: Event = serde_json::from_value(payload)?;

    println!("\n=== Latest Event for {short_id} ===");
    let mut rows = vec![
        ("Event ID", or_na(&event.event_id)),
        ("Title", or_na(&event.title)),
        ("Message", or_na(&event.message)),
        ("Date", or_na(&event.date_created)),
    ];
    if let Some(server) = event.tag_value("server_name") {
        rows.push(("Server", server.to_string()));
    }
    if let Some(sdk) = &event.sdk {
        rows.push(("SDK", format!("{} {}", sdk.name, sdk.version)));
    }
    if let Some(release) = &event.release {
        rows.push(("Release", release.version.clone()));
    }
    render_detail(&rows);

    print_event_context(&event.context);

    for entry in &event.entries {
        match entry.kind.as_str() {
            "message" if !context_only => {
                if let Some(formatted) = entry
                    .data
                    .get("formatted")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                {
                    println!("\nFormatted Message:\n  {formatted}");
                }
            }
            "exception" => {
                let data: ExceptionData =
                    serde_json::from_value(entry.data.clone()).unwrap_or_default();
                print_exception_entry(&data);
            }
            _ => {}
        }
    }

    println!();
    Ok(())
}

fn or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

fn print_event_context(ctx: &Value) {
    let Some(ctx) = ctx.as_object().filter(|m| !m.is_empty()) else {
        return;
    };
    println!("\nContext:");
    if let Some(caller) = ctx.get("caller").and_then(Value::as_str) {
        println!("  Caller: {caller}");
    }
    if let Some(stack) = ctx.get("stack").and_then(Value::as_str) {
        println!("  Stack:");
        for line in stack.lines() {
            println!("    {line}");
        }
    }
}

fn print_exception_entry(data: &ExceptionData) {
    println!("\nException:");
    for exc in &data.values {
        let kind = exc.kind.as_deref().unwrap_or("Exception");
        let value = exc.value.as_deref().unwrap_or("");
        println!("  {kind}: {value}");

        let frames = exc
            .stacktrace
            .as_ref()
            .map(|st| st.frames.as_slice())
            .unwrap_or(&[]);
        if !frames.is_empty() {
            println!("  Stacktrace:");
            let innermost = frames.len().saturating_sub(5);
            for frame in &frames[innermost..] {
                let line = frame
                    .line_no
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                let function = frame.function.as_deref().unwrap_or("");
                println!("    {}:{line} in {function}", frame.filename);
            }
        }
    }
}

pub fn list_events(
    config: &EffectiveConfig,
    issue_id: &str,
    max: usize,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let (numeric_id, _short_id) = resolve_issue_ids(&client, &config.org, issue_id)?;

    let payload = client.get(&format!(
        "/organizations/{}/issues/{numeric_id}/events/",
        config.org
    ))?;
    let events: Vec<Event> = serde_json::from_value(payload)?;

    if events.is_empty() {
        println!("No events found");
        return Ok(());
    }

    let events = &events[..events.len().min(max)];
    let rows: Vec<Value> = events
        .iter()
        .map(|event| {
            json!({
                "eventID": event.display_id(),
                "date": crate::output::short_timestamp(&event.date_created),
                "server": event.tag_value("server_name").unwrap_or("-"),
            })
        })
        .collect();

    let columns = [
        Column::new("Event ID", "eventID").width(36),
        Column::new("Date", "date"),
        Column::new("Server", "server"),
    ];
    render(
        &rows,
        format,
        &columns,
        Some(&format!("Showing {} events", events.len())),
    );
    Ok(())
}

/// One tag value's slice of an issue's events.
#[derive(Debug, Clone, PartialEq)]
pub struct TagShare {
    pub value: String,
    pub count: u64,
    pub percent: f64,
}

/// Frequency distribution over raw tag values: per distinct value its count
/// and `count / total * 100`, sorted by descending count with ties in
/// first-seen order.
pub fn distribution<'a, I>(values: I) -> Vec<TagShare>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut pairs: Vec<(String, u64)> = Vec::new();
    for value in values {
        match pairs.iter_mut().find(|(v, _)| v == value) {
            Some(pair) => pair.1 += 1,
            None => pairs.push((value.to_string(), 1)),
        }
    }
    distribution_from_counts(pairs)
}

/// Same distribution computed from pre-aggregated `(value, count)` pairs, as
/// returned by the tag detail endpoint. Percentages are always derived locally
/// from the counts.
pub fn distribution_from_counts<I>(pairs: I) -> Vec<TagShare>
where
    I: IntoIterator<Item = (String, u64)>,
{
    let pairs: Vec<(String, u64)> = pairs.into_iter().collect();
    let total: u64 = pairs.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<TagShare> = pairs
        .into_iter()
        .map(|(value, count)| TagShare {
            percent: count as f64 / total as f64 * 100.0,
            value,
            count,
        })
        .collect();
    // Stable sort keeps first-seen order for equal counts.
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

pub fn show_tags(
    config: &EffectiveConfig,
    issue_id: &str,
    tag_key: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let (numeric_id, _short_id) = resolve_issue_ids(&client, &config.org, issue_id)?;

    match tag_key {
        Some(key) => {
            let payload = client
                .get(&format!(
                    "/organizations/{}/issues/{numeric_id}/tags/{key}/",
                    config.org
                ))
                .map_err(|e| e.describe_not_found(format!("no such tag '{key}'")))?;
            let detail: TagDetail = serde_json::from_value(payload)?;

            if detail.top_values.is_empty() {
                println!("No values found for tag '{key}'");
                return Ok(());
            }

            let shares = distribution_from_counts(
                detail
                    .top_values
                    .iter()
                    .map(|v| (v.value.clone(), v.count)),
            );
            let rows: Vec<Value> = shares
                .iter()
                .map(|share| {
                    json!({
                        "value": crate::output::truncate_chars(&share.value, 30),
                        "count": share.count.to_string(),
                        "percent": format!("{:.1}%", share.percent),
                    })
                })
                .collect();

            let columns = [
                Column::new("Value", "value").width(30),
                Column::new("Count", "count").right(),
                Column::new("Percent", "percent").right(),
            ];
            let unique = detail
                .unique_values
                .map(|n| n.to_string())
                .unwrap_or_else(|| "N/A".into());
            render(
                &rows,
                format,
                &columns,
                Some(&format!("Total unique values: {unique}")),
            );
        }
        None => {
            let payload = client.get(&format!(
                "/organizations/{}/issues/{numeric_id}/",
                config.org
            ))?;
            let issue: Issue = serde_json::from_value(payload)?;

            if issue.tags.is_empty() {
                println!("No tags found");
                return Ok(());
            }

            let rows: Vec<Value> = issue
                .tags
                .iter()
                .map(|tag| json!({"key": tag.key, "total": tag.total_values.to_string()}))
                .collect();
            let columns = [
                Column::new("Tag Key", "key"),
                Column::new("Unique Values", "total").right(),
            ];
            render(&rows, format, &columns, None);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_counts_sorts_and_percentages() {
        let shares = distribution(["x", "y", "x", "x"]);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].value, "x");
        assert_eq!(shares[0].count, 3);
        assert!((shares[0].percent - 75.0).abs() < 1e-9);
        assert_eq!(shares[1].value, "y");
        assert_eq!(shares[1].count, 1);
        assert!((shares[1].percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn distribution_breaks_ties_by_first_seen_order() {
        let shares = distribution(["b", "a", "b", "a", "c"]);
        let order: Vec<&str> = shares.iter().map(|s| s.value.as_str()).collect();
        // b and a tie at 2; b was seen first.
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn distribution_of_nothing_is_empty() {
        assert!(distribution(std::iter::empty::<&str>()).is_empty());
        assert!(distribution_from_counts([("x".to_string(), 0)]).is_empty());
    }

    #[test]
    fn distribution_from_counts_keeps_api_ordering_for_ties() {
        let shares = distribution_from_counts([
            ("web-1".to_string(), 2),
            ("web-2".to_string(), 5),
            ("web-3".to_string(), 2),
        ]);
        let order: Vec<&str> = shares.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(order, ["web-2", "web-1", "web-3"]);
        assert!((shares[0].percent - 5.0 / 9.0 * 100.0).abs() < 1e-9);
    }
}
