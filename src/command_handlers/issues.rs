//! `list` and `show`.

use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::config::EffectiveConfig;
use crate::error::{Error, Result};
use crate::models::Issue;
use crate::output::{print_json, render, render_detail, Column, OutputFormat};

/// `--all-projects` switches to the org-wide endpoint, so a project filter
/// cannot apply. Checked in dispatch, before any network call.
pub fn check_project_scope(all_projects: bool, explicit_project: Option<&str>) -> Result<()> {
    if all_projects && explicit_project.is_some() {
        return Err(Error::Validation(
            "--all-projects/-A and --project/-p are mutually exclusive".to_string(),
        ));
    }
    Ok(())
}

pub fn list_issues(
    config: &EffectiveConfig,
    all_projects: bool,
    max: usize,
    status: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let client = ApiClient::new(config)?;

    let params = status
        .map(|s| format!("?query=is:{s}"))
        .unwrap_or_default();
    let endpoint = if all_projects {
        format!("/organizations/{}/issues/{params}", config.org)
    } else {
        format!(
            "/projects/{}/{}/issues/{params}",
            config.org, config.project
        )
    };

    let payload = client.get(&endpoint)?;
    let issues: Vec<Issue> = serde_json::from_value(payload)?;

    if issues.is_empty() {
        println!("No issues found");
        return Ok(());
    }

    let issues = &issues[..issues.len().min(max)];
    let rows: Vec<Value> = issues
        .iter()
        .map(|issue| {
            let mut row = json!({
                "id": issue.id,
                "shortId": issue.short_id,
                "status": issue.status,
                "level": issue.level,
                "count": issue.count,
                "title": issue.title,
            });
            if all_projects {
                row["project"] = json!(issue
                    .project
                    .as_ref()
                    .map(|p| p.slug().to_string())
                    .unwrap_or_default());
            }
            row
        })
        .collect();

    let mut columns = vec![
        Column::new("ID", "id").width(6),
        Column::new("Short ID", "shortId").width(20),
    ];
    if all_projects {
        columns.push(Column::new("Project", "project").width(20));
    }
    columns.extend([
        Column::new("Status", "status").width(12),
        Column::new("Level", "level").width(8),
        Column::new("Count", "count").right().width(8),
        Column::new("Title", "title").width(50),
    ]);

    render(
        &rows,
        format,
        &columns,
        Some(&format!("Showing {} issues", issues.len())),
    );
    Ok(())
}

pub fn show_issue(config: &EffectiveConfig, issue_id: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = client
        .get(&format!(
            "/organizations/{}/issues/{issue_id}/",
            config.org
        ))
        .map_err(|e| e.describe_not_found(format!("no such issue '{issue_id}'")))?;

    if format == OutputFormat::Json {
        print_json(&payload);
        return Ok(());
    }

    let issue: Issue = serde_json::from_value(payload)?;

    let short_id = if issue.short_id.is_empty() {
        issue.id.clone()
    } else {
        issue.short_id.clone()
    };
    println!("\n=== Issue {short_id} ===");

    let status = match issue.substatus.as_deref().filter(|s| !s.is_empty()) {
        Some(sub) => format!("{} ({sub})", issue.status),
        None => issue.status.clone(),
    };

    let mut rows = vec![
        ("Title", issue.title.clone()),
        ("Status", status),
        ("Level", issue.level.clone()),
        (
            "Priority",
            issue.priority.clone().unwrap_or_else(|| "N/A".into()),
        ),
        ("Count", format!("{} events", issue.count)),
        (
            "First seen",
            issue.first_seen.clone().unwrap_or_else(|| "N/A".into()),
        ),
        (
            "Last seen",
            issue.last_seen.clone().unwrap_or_else(|| "N/A".into()),
        ),
        (
            "URL",
            issue.permalink.clone().unwrap_or_else(|| "N/A".into()),
        ),
    ];
    if let Some(release) = &issue.first_release {
        rows.push(("First release", release.version.clone()));
    }
    if let Some(release) = &issue.last_release {
        rows.push(("Last release", release.version.clone()));
    }
    render_detail(&rows);

    if !issue.tags.is_empty() {
        let tag_rows: Vec<Value> = issue
            .tags
            .iter()
            .take(8)
            .map(|tag| json!({"key": tag.key, "values": tag.total_values.to_string()}))
            .collect();
        let columns = [
            Column::new("Tag", "key"),
            Column::new("Unique Values", "values").right(),
        ];
        println!();
        render(
            &tag_rows,
            OutputFormat::Table,
            &columns,
            Some(&format!("{} tag types", issue.tags.len())),
        );
    }

    println!("\nUse 'sentry-tool event <id>' to see the latest event\n");
    Ok(())
}
