//! `list-projects` and `open`.

use std::process::Command;

use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::config::EffectiveConfig;
use crate::error::{Error, Result};
use crate::models::Project;
use crate::output::{render, Column, OutputFormat};

pub fn list_projects(config: &EffectiveConfig, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(config)?;
    let payload = client.get(&format!("/organizations/{}/projects/", config.org))?;
    let projects: Vec<Project> = serde_json::from_value(payload)?;

    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    let rows: Vec<Value> = projects
        .iter()
        .map(|project| {
            json!({
                "slug": project.slug,
                "name": project.name,
                "platform": project.platform.clone().unwrap_or_default(),
                "status": project.status,
            })
        })
        .collect();

    let columns = [
        Column::new("Slug", "slug"),
        Column::new("Name", "name"),
        Column::new("Platform", "platform"),
        Column::new("Status", "status"),
    ];
    render(
        &rows,
        format,
        &columns,
        Some(&format!("{} projects", projects.len())),
    );
    Ok(())
}

/// Open the web UI: the org issue dashboard, or one issue when an id is given.
pub fn open_sentry(config: &EffectiveConfig, issue_id: Option<&str>) -> Result<()> {
    let url = dashboard_url(config, issue_id);
    launch_browser(&url)?;
    println!("Opened: {url}");
    Ok(())
}

fn dashboard_url(config: &EffectiveConfig, issue_id: Option<&str>) -> String {
    let base = config.url.trim_end_matches('/');
    match issue_id {
        Some(id) => format!("{base}/organizations/{}/issues/{id}/", config.org),
        None => format!("{base}/organizations/{}/issues/", config.org),
    }
}

fn launch_browser(url: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    command.spawn().map_err(|e| Error::Io {
        context: format!("launching browser for {url}"),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EffectiveConfig {
        EffectiveConfig {
            url: "https://sentry.example.com/".to_string(),
            org: "acme".to_string(),
            project: "api".to_string(),
            auth_token: "tok".to_string(),
        }
    }

    #[test]
    fn dashboard_url_strips_trailing_slash() {
        assert_eq!(
            dashboard_url(&config(), None),
            "https://sentry.example.com/organizations/acme/issues/"
        );
    }

    #[test]
    fn dashboard_url_targets_the_issue_when_given() {
        assert_eq!(
            dashboard_url(&config(), Some("24")),
            "https://sentry.example.com/organizations/acme/issues/24/"
        );
    }
}
