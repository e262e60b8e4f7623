//! `config show|profiles|list-projects|validate`.
//!
//! These operate on the loaded file plus the raw environment snapshot rather
//! than a resolved profile, so they work (and stay useful) before any auth
//! token exists.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::client::ApiClient;
use crate::config::{mask_token, AppConfig, EnvOverrides, Profile, DEFAULT_PROJECT};
use crate::error::{Error, Result};
use crate::models::Project;
use crate::output::{print_json, render, Column, OutputFormat};

pub fn show(
    config: &AppConfig,
    overrides: &EnvOverrides,
    explicit_profile: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let active_name = explicit_profile
        .map(str::to_string)
        .or_else(|| overrides.profile.clone())
        .unwrap_or_else(|| config.default_profile.clone());
    let active = config.profiles.get(&active_name);

    match format {
        OutputFormat::Json => print_show_json(config, overrides, &active_name, active),
        OutputFormat::Table => print_show_tables(config, overrides, &active_name, active),
    }
    Ok(())
}

// Empty profile values fall back exactly as resolution does, so the displayed
// settings match what a command would actually use.
fn effective_field<'a>(
    override_value: Option<&'a str>,
    profile_value: Option<&'a str>,
    fallback: &'a str,
) -> (&'a str, bool) {
    match override_value {
        Some(v) => (v, true),
        None => (
            profile_value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback),
            false,
        ),
    }
}

fn print_show_json(
    config: &AppConfig,
    overrides: &EnvOverrides,
    active_name: &str,
    active: Option<&Profile>,
) {
    let empty = Profile::default();
    let profile = active.unwrap_or(&empty);

    let (url, _) = effective_field(
        overrides.url.as_deref(),
        profile.url.as_deref(),
        profile.url_or_default(),
    );
    let (org, _) = effective_field(
        overrides.org.as_deref(),
        profile.org.as_deref(),
        profile.org_or_default(),
    );
    let (project, _) = effective_field(
        overrides.project.as_deref(),
        profile.project.as_deref(),
        DEFAULT_PROJECT,
    );
    let token = overrides
        .auth_token
        .as_deref()
        .or(profile.auth_token.as_deref());

    let mut profiles = Map::new();
    for (name, p) in &config.profiles {
        profiles.insert(
            name.clone(),
            json!({
                "url": p.url_or_default(),
                "org": p.org_or_default(),
                "project": p.project.as_deref().unwrap_or(DEFAULT_PROJECT),
                "auth_token": mask_token(p.auth_token.as_deref()),
            }),
        );
    }

    print_json(&json!({
        "default_profile": config.default_profile,
        "active_profile": active_name,
        "effective": {
            "url": url,
            "org": org,
            "project": project,
            "auth_token": mask_token(token),
        },
        "profiles": profiles,
    }));
}

fn print_show_tables(
    config: &AppConfig,
    overrides: &EnvOverrides,
    active_name: &str,
    active: Option<&Profile>,
) {
    println!("\nDefault profile: {}", config.default_profile);
    if let Some(env_profile) = &overrides.profile {
        println!("  (override: SENTRY_PROFILE={env_profile})");
    }

    if let Some(profile) = active {
        let fields = [
            ("url", overrides.url.as_deref(), profile.url.as_deref(), profile.url_or_default(), "SENTRY_URL"),
            ("org", overrides.org.as_deref(), profile.org.as_deref(), profile.org_or_default(), "SENTRY_ORG"),
            ("project", overrides.project.as_deref(), profile.project.as_deref(), DEFAULT_PROJECT, "SENTRY_PROJECT"),
        ];

        let mut rows: Vec<Value> = fields
            .iter()
            .map(|(name, env, prof, fallback, env_name)| {
                let (value, from_env) = effective_field(*env, *prof, *fallback);
                json!({
                    "setting": name,
                    "value": value,
                    "source": if from_env { *env_name } else { "profile" },
                })
            })
            .collect();

        let (token, token_from_env) = match overrides.auth_token.as_deref() {
            Some(t) => (Some(t), true),
            None => (profile.auth_token.as_deref(), false),
        };
        rows.push(json!({
            "setting": "auth_token",
            "value": mask_token(token),
            "source": if token_from_env { "SENTRY_AUTH_TOKEN" } else { "profile" },
        }));

        let columns = [
            Column::new("Setting", "setting"),
            Column::new("Value", "value"),
            Column::new("Source", "source"),
        ];
        println!();
        render(&rows, OutputFormat::Table, &columns, Some("Effective Settings"));
    } else {
        println!("  (profile '{active_name}' not present in the config file)");
    }

    if config.profiles.is_empty() {
        println!("\nNo profiles configured");
        return;
    }

    let rows: Vec<Value> = config
        .profiles
        .iter()
        .map(|(name, profile)| {
            json!({
                "name": name,
                "default": if *name == config.default_profile { "*" } else { "" },
                "url": profile.url_or_default(),
                "org": profile.org_or_default(),
                "project": profile.project.as_deref().unwrap_or(DEFAULT_PROJECT),
                "auth_token": mask_token(profile.auth_token.as_deref()),
            })
        })
        .collect();

    let columns = [
        Column::new("Name", "name"),
        Column::new("Default", "default"),
        Column::new("URL", "url"),
        Column::new("Org", "org"),
        Column::new("Project", "project"),
        Column::new("Auth Token", "auth_token"),
    ];
    println!();
    render(
        &rows,
        OutputFormat::Table,
        &columns,
        Some(&format!("{} profiles", config.profiles.len())),
    );
}

pub fn profiles(config: &AppConfig, format: OutputFormat) -> Result<()> {
    if config.profiles.is_empty() {
        println!("No profiles configured.");
        return Ok(());
    }

    let rows: Vec<Value> = config
        .profiles
        .keys()
        .map(|name| {
            json!({
                "name": name,
                "default": if *name == config.default_profile { "*" } else { "" },
            })
        })
        .collect();

    let columns = [Column::new("Name", "name"), Column::new("Default", "default")];
    render(
        &rows,
        format,
        &columns,
        Some(&format!("{} profiles", rows.len())),
    );
    Ok(())
}

fn profile_projects(profile: &Profile) -> Result<Vec<Project>> {
    let token = profile
        .auth_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Configuration("no auth token configured".to_string()))?;

    let client = ApiClient::from_parts(profile.url_or_default(), token)?;
    let payload = client.get(&format!(
        "/organizations/{}/projects/",
        profile.org_or_default()
    ))?;
    Ok(serde_json::from_value(payload)?)
}

/// Enumerate projects per configured profile. Failures are reported inline per
/// profile so one bad profile never hides the others.
pub fn list_projects(config: &AppConfig, format: OutputFormat) -> Result<()> {
    if config.profiles.is_empty() {
        println!("No profiles configured.");
        return Ok(());
    }

    let mut rows: Vec<Value> = Vec::new();
    for (name, profile) in &config.profiles {
        if profile.auth_token.as_deref().map(str::trim).unwrap_or("").is_empty() {
            warn!(profile = %name, "profile has no auth token");
            rows.push(json!({"profile": name, "project": "(no auth token)"}));
            continue;
        }

        match profile_projects(profile) {
            Ok(projects) if projects.is_empty() => {
                rows.push(json!({"profile": name, "project": "(no projects)"}));
            }
            Ok(projects) => {
                rows.extend(
                    projects
                        .iter()
                        .map(|p| json!({"profile": name, "project": p.slug})),
                );
            }
            Err(Error::NotFound(_)) => {
                rows.push(json!({
                    "profile": name,
                    "project": format!("(org '{}' not found)", profile.org_or_default()),
                }));
            }
            Err(e) => {
                rows.push(json!({"profile": name, "project": format!("(error: {e})")}));
            }
        }
    }

    let columns = [Column::new("Profile", "profile"), Column::new("Project", "project")];
    render(&rows, format, &columns, None);
    Ok(())
}

/// Connectivity check: one projects query per profile, reported as OK/FAIL.
pub fn validate(config: &AppConfig, format: OutputFormat) -> Result<()> {
    if config.profiles.is_empty() {
        println!("No profiles configured.");
        return Ok(());
    }

    let mut rows: Vec<Value> = Vec::new();
    for (name, profile) in &config.profiles {
        let row = match profile_projects(profile) {
            Ok(projects) => {
                let slugs: Vec<&str> = projects.iter().map(|p| p.slug.as_str()).collect();
                let slugs = if slugs.is_empty() {
                    "(none)".to_string()
                } else {
                    slugs.join(", ")
                };
                json!({
                    "profile": name,
                    "status": "OK",
                    "projects": format!("{} projects: {slugs}", projects.len()),
                })
            }
            Err(Error::Configuration(_)) => {
                warn!(profile = %name, "profile has no auth token");
                json!({
                    "profile": name,
                    "status": "FAIL",
                    "projects": "No auth token configured",
                })
            }
            Err(Error::NotFound(_)) => json!({
                "profile": name,
                "status": "FAIL",
                "projects": format!("Organization '{}' not found", profile.org_or_default()),
            }),
            Err(e) => json!({"profile": name, "status": "FAIL", "projects": e.to_string()}),
        };
        rows.push(row);
    }

    let columns = [
        Column::new("Profile", "profile"),
        Column::new("Status", "status"),
        Column::new("Projects", "projects"),
    ];
    render(&rows, format, &columns, None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_field_prefers_override_then_profile_then_fallback() {
        assert_eq!(
            effective_field(Some("env"), Some("prof"), "def"),
            ("env", true)
        );
        assert_eq!(effective_field(None, Some("prof"), "def"), ("prof", false));
        assert_eq!(effective_field(None, None, "def"), ("def", false));
    }

    #[test]
    fn empty_profile_values_fall_back_like_resolution() {
        assert_eq!(effective_field(None, Some(""), "def"), ("def", false));
        assert_eq!(effective_field(None, Some("  "), "def"), ("def", false));
    }

    #[test]
    fn profile_without_token_fails_validation_without_network() {
        let profile = Profile::default();
        let err = profile_projects(&profile).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
