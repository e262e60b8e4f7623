use crate::cli::{Cli, Commands, ConfigCommands};
use crate::command_handlers::{config_cmd, events, issues, projects, traces};
use crate::config::{self, EffectiveConfig, EnvOverrides};
use crate::error::Result;

/// Route one parsed invocation to its handler. Argument validation runs before
/// configuration resolution, and resolution before any network call, so usage
/// errors never depend on config state.
pub fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        profile,
        project,
        ..
    } = cli;
    let profile = profile.as_deref();
    let project = project.as_deref();

    match command {
        Commands::List {
            all_projects,
            max,
            status,
            format,
        } => {
            issues::check_project_scope(all_projects, project)?;
            let cfg = effective_config(profile, project)?;
            issues::list_issues(&cfg, all_projects, max, status.as_deref(), format)
        }
        Commands::Show { issue_id, format } => {
            let cfg = effective_config(profile, project)?;
            issues::show_issue(&cfg, &issue_id, format)
        }
        Commands::Event {
            issue_id,
            event,
            context,
            format,
        } => {
            let cfg = effective_config(profile, project)?;
            events::show_event(&cfg, &issue_id, event.as_deref(), context, format)
        }
        Commands::Events {
            issue_id,
            max,
            format,
        } => {
            let cfg = effective_config(profile, project)?;
            events::list_events(&cfg, &issue_id, max, format)
        }
        Commands::Tags {
            issue_id,
            tag_key,
            format,
        } => {
            let cfg = effective_config(profile, project)?;
            events::show_tags(&cfg, &issue_id, tag_key.as_deref(), format)
        }
        Commands::Transactions { max, format } => {
            let cfg = effective_config(profile, project)?;
            traces::list_transactions(&cfg, max, format)
        }
        Commands::Trace {
            trace_id,
            max,
            format,
        } => {
            traces::validate_trace_id(&trace_id)?;
            let cfg = effective_config(profile, project)?;
            traces::lookup_trace(&cfg, &trace_id, max, format)
        }
        Commands::Transaction {
            event_id,
            timeline,
            format,
        } => {
            let cfg = effective_config(profile, project)?;
            traces::show_transaction(&cfg, &event_id, timeline, format)
        }
        Commands::Spans {
            event_id,
            op,
            format,
        } => {
            let cfg = effective_config(profile, project)?;
            traces::show_spans(&cfg, &event_id, op.as_deref(), format)
        }
        Commands::ListProjects { format } => {
            let cfg = effective_config(profile, project)?;
            projects::list_projects(&cfg, format)
        }
        Commands::Open { issue_id } => {
            let cfg = effective_config(profile, project)?;
            projects::open_sentry(&cfg, issue_id.as_deref())
        }
        Commands::Config { command } => {
            let app = config::load_default()?;
            match command {
                ConfigCommands::Show { format } => {
                    config_cmd::show(&app, &EnvOverrides::from_env(), profile, format)
                }
                ConfigCommands::Profiles { format } => config_cmd::profiles(&app, format),
                ConfigCommands::ListProjects { format } => config_cmd::list_projects(&app, format),
                ConfigCommands::Validate { format } => config_cmd::validate(&app, format),
            }
        }
    }
}

fn effective_config(
    profile: Option<&str>,
    cli_project: Option<&str>,
) -> Result<EffectiveConfig> {
    let app = config::load_default()?;
    let mut overrides = EnvOverrides::from_env();
    overrides.cli_project = cli_project.map(str::to_string);
    config::resolve(&app, profile, &overrides)
}
