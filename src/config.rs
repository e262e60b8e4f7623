//! Profile configuration with layered precedence.
//!
//! Settings are resolved field-by-field from four layers, highest first:
//! CLI flags (`--project`), environment variables (`SENTRY_URL`, `SENTRY_ORG`,
//! `SENTRY_PROJECT`, `SENTRY_AUTH_TOKEN`), the selected profile from
//! `<config dir>/sentry-tool/config.toml`, and built-in defaults. Profile
//! selection itself follows `--profile` > `SENTRY_PROFILE` > `default_profile`
//! in the file > `"default"`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_URL: &str = "https://sentry.io";
pub const DEFAULT_ORG: &str = "sentry";
pub const DEFAULT_PROJECT: &str = "otel-collector";
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// One named bundle of connection settings. Every field is optional in the
/// file; validation happens after override layers are applied.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Profile {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Profile {
    pub fn url_or_default(&self) -> &str {
        non_empty(&self.url).unwrap_or(DEFAULT_URL)
    }

    pub fn org_or_default(&self) -> &str {
        non_empty(&self.org).unwrap_or(DEFAULT_ORG)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE_NAME.to_string(), Profile::default());
        AppConfig {
            default_profile: default_profile_name(),
            profiles,
        }
    }
}

/// Overrides captured once at the process boundary. Tests construct this
/// directly instead of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    /// `--project` flag; wins over everything for the project field.
    pub cli_project: Option<String>,
    /// `SENTRY_PROFILE`; affects profile selection, not field values.
    pub profile: Option<String>,
    pub url: Option<String>,
    pub org: Option<String>,
    pub project: Option<String>,
    pub auth_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        EnvOverrides {
            cli_project: None,
            profile: env_var("SENTRY_PROFILE"),
            url: env_var("SENTRY_URL"),
            org: env_var("SENTRY_ORG"),
            project: env_var("SENTRY_PROJECT"),
            auth_token: env_var("SENTRY_AUTH_TOKEN"),
        }
    }
}

// An override applies only when the variable is set and non-empty.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Fully resolved connection settings; `auth_token` is non-empty and trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub url: String,
    pub org: String,
    pub project: String,
    pub auth_token: String,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sentry-tool").join("config.toml"))
}

/// Load the well-known config file. A missing file is not an error; it falls
/// back to a config holding a single implicit default profile.
pub fn load_default() -> Result<AppConfig> {
    match default_config_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(AppConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<AppConfig> {
    let raw = fs_err::read_to_string(path)
        .map_err(|e| Error::Configuration(format!("reading {}: {e}", path.display())))?;
    toml::from_str(&raw)
        .map_err(|e| Error::Configuration(format!("parsing {}: {e}", path.display())))
}

/// Produce the effective profile for one invocation.
///
/// An unknown profile name is not an error: an empty profile is synthesized so
/// that environment variables alone can drive configuration with no file
/// present. Fails only when no auth token can be found for the selection.
pub fn resolve(
    config: &AppConfig,
    explicit_profile: Option<&str>,
    overrides: &EnvOverrides,
) -> Result<EffectiveConfig> {
    let name = explicit_profile
        .map(str::to_string)
        .or_else(|| overrides.profile.clone())
        .unwrap_or_else(|| config.default_profile.clone());

    let profile = config.profiles.get(&name).cloned().unwrap_or_default();
    tracing::debug!(profile = %name, "resolving configuration");

    let token = overrides
        .auth_token
        .clone()
        .or_else(|| profile.auth_token.clone())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let Some(auth_token) = token else {
        return Err(Error::Configuration(format!(
            "no auth token for profile '{name}'; set SENTRY_AUTH_TOKEN or add \
             auth_token to the profile"
        )));
    };

    let url = non_empty(&overrides.url)
        .unwrap_or_else(|| profile.url_or_default())
        .to_string();
    let org = non_empty(&overrides.org)
        .unwrap_or_else(|| profile.org_or_default())
        .to_string();
    let project = non_empty(&overrides.cli_project)
        .or_else(|| non_empty(&overrides.project))
        .or_else(|| non_empty(&profile.project))
        .unwrap_or(DEFAULT_PROJECT)
        .to_string();

    Ok(EffectiveConfig {
        url,
        org,
        project,
        auth_token,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Show only the tail of a token so config output stays paste-safe.
pub fn mask_token(token: Option<&str>) -> String {
    match token {
        Some(t) if !t.is_empty() => {
            let tail: String = t
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("***...{tail}")
        }
        _ => "(not set)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with(default: &str, entries: &[(&str, Profile)]) -> AppConfig {
        let mut profiles = BTreeMap::new();
        for (name, profile) in entries {
            profiles.insert(name.to_string(), profile.clone());
        }
        AppConfig {
            default_profile: default.to_string(),
            profiles,
        }
    }

    fn profile_with_token(token: &str) -> Profile {
        Profile {
            auth_token: Some(token.to_string()),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_token_everywhere_is_a_configuration_error() {
        let err = resolve(&AppConfig::default(), None, &EnvOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("auth token"));
    }

    #[test]
    fn env_token_alone_yields_builtin_defaults() {
        let overrides = EnvOverrides {
            auth_token: Some("abc".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&AppConfig::default(), None, &overrides).unwrap();
        assert_eq!(cfg.url, "https://sentry.io");
        assert_eq!(cfg.org, "sentry");
        assert_eq!(cfg.auth_token, "abc");
    }

    #[test]
    fn env_profile_selection_wins_over_file_default() {
        let config = config_with(
            "a",
            &[
                ("a", profile_with_token("x")),
                ("b", profile_with_token("y")),
            ],
        );
        let overrides = EnvOverrides {
            profile: Some("b".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&config, None, &overrides).unwrap();
        assert_eq!(cfg.auth_token, "y");
    }

    #[test]
    fn explicit_profile_flag_wins_over_env_selection() {
        let config = config_with(
            "a",
            &[
                ("a", profile_with_token("x")),
                ("b", profile_with_token("y")),
            ],
        );
        let overrides = EnvOverrides {
            profile: Some("b".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&config, Some("a"), &overrides).unwrap();
        assert_eq!(cfg.auth_token, "x");
    }

    #[test]
    fn unknown_profile_is_synthesized_not_fatal() {
        let config = config_with("a", &[("a", profile_with_token("x"))]);
        let overrides = EnvOverrides {
            auth_token: Some("envtok".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&config, Some("nope"), &overrides).unwrap();
        assert_eq!(cfg.auth_token, "envtok");
        assert_eq!(cfg.url, DEFAULT_URL);
    }

    #[test]
    fn field_overrides_apply_only_when_non_empty() {
        let profile = Profile {
            url: Some("https://sentry.example.com".into()),
            org: Some("acme".into()),
            project: Some("api".into()),
            auth_token: Some("tok".into()),
        };
        let config = config_with("default", &[("default", profile)]);
        let overrides = EnvOverrides {
            url: Some("".into()),
            org: Some("  ".into()),
            project: Some("web".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&config, None, &overrides).unwrap();
        // Empty and whitespace-only values are ignored.
        assert_eq!(cfg.url, "https://sentry.example.com");
        assert_eq!(cfg.org, "acme");
        assert_eq!(cfg.project, "web");
    }

    #[test]
    fn cli_project_beats_env_and_profile() {
        let profile = Profile {
            project: Some("from-profile".into()),
            auth_token: Some("tok".into()),
            ..Profile::default()
        };
        let config = config_with("default", &[("default", profile)]);
        let overrides = EnvOverrides {
            cli_project: Some("from-flag".into()),
            project: Some("from-env".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&config, None, &overrides).unwrap();
        assert_eq!(cfg.project, "from-flag");
    }

    #[test]
    fn token_is_trimmed_and_whitespace_token_rejected() {
        let overrides = EnvOverrides {
            auth_token: Some("  abc  ".into()),
            ..EnvOverrides::default()
        };
        let cfg = resolve(&AppConfig::default(), None, &overrides).unwrap();
        assert_eq!(cfg.auth_token, "abc");

        let overrides = EnvOverrides {
            auth_token: Some("   ".into()),
            ..EnvOverrides::default()
        };
        assert!(resolve(&AppConfig::default(), None, &overrides).is_err());
    }

    #[test]
    fn load_from_parses_profiles() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_profile = "work"

[profiles.work]
url = "https://sentry.example.com"
org = "acme"
auth_token = "sntrys_work"

[profiles.personal]
auth_token = "sntrys_home"
"#
        )
        .unwrap();
        let config = load_from(file.path()).unwrap();
        assert_eq!(config.default_profile, "work");
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(
            config.profiles["work"].org.as_deref(),
            Some("acme")
        );
    }

    #[test]
    fn load_from_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_profile = [not toml").unwrap();
        let err = load_from(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn mask_token_shows_last_four_chars() {
        assert_eq!(mask_token(Some("sntrys_abc123xyz9")), "***...xyz9");
        assert_eq!(mask_token(Some("ab")), "***...ab");
        assert_eq!(mask_token(Some("")), "(not set)");
        assert_eq!(mask_token(None), "(not set)");
    }
}
