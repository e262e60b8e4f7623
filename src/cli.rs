use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    version,
    name = "sentry-tool",
    about = "Query Sentry issues, events, tags, and traces from the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use a named profile from the config file
    #[arg(short = 'P', long, global = true)]
    pub profile: Option<String>,

    /// Override the project slug from the active profile
    #[arg(short = 'p', long, global = true)]
    pub project: Option<String>,

    /// Print underlying error causes and debug logs
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List recent issues in a project.
    /// Examples:
    ///   sentry-tool list
    ///   sentry-tool list -p otel-collector -n 5
    ///   sentry-tool list -s unresolved
    ///   sentry-tool list -A
    List {
        /// List issues across all projects in the organization (conflicts with --project)
        #[arg(short = 'A', long)]
        all_projects: bool,
        /// Maximum issues to show
        #[arg(short = 'n', long = "max", default_value_t = 10)]
        max: usize,
        /// Filter by status: resolved, unresolved, muted
        #[arg(short = 's', long)]
        status: Option<String>,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show details for one issue (numeric or short ID like OTEL-COLLECTOR-Q)
    Show {
        issue_id: String,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show event details for an issue (latest by default)
    Event {
        issue_id: String,
        /// Specific event ID (default: latest)
        #[arg(short = 'e', long)]
        event: Option<String>,
        /// Show only context/stacktrace
        #[arg(short = 'c', long)]
        context: bool,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List recent events for an issue
    Events {
        issue_id: String,
        /// Maximum events to show
        #[arg(short = 'n', long = "max", default_value_t = 10)]
        max: usize,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show tag values for an issue; without TAG_KEY, lists available tags
    Tags {
        issue_id: String,
        /// Tag key to show the value distribution for (e.g. server_name)
        tag_key: Option<String>,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List recent transactions for the active project
    Transactions {
        /// Maximum transactions to show
        #[arg(short = 'n', long = "max", default_value_t = 10)]
        max: usize,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Look up all events belonging to a trace by its 32-character hex ID
    Trace {
        trace_id: String,
        /// Maximum events to show
        #[arg(short = 'n', long = "max", default_value_t = 25)]
        max: usize,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show detailed transaction information including spans
    Transaction {
        event_id: String,
        /// Show a Gantt-chart timeline of spans
        #[arg(short = 't', long)]
        timeline: bool,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Display transaction spans as a tree with optional operation filtering
    Spans {
        event_id: String,
        /// Filter spans by operation type (comma-separated)
        #[arg(long)]
        op: Option<String>,
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List all projects in the configured organization
    ListProjects {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Open the Sentry web UI in a browser (org dashboard, or one issue)
    Open {
        /// Issue ID to open directly
        issue_id: Option<String>,
    },
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Display the active profile, effective settings, and all profiles
    Show {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// List configured profile names with the default marked
    Profiles {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Enumerate projects for each configured profile
    ListProjects {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Verify connectivity to all configured profiles
    Validate {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["sentry-tool", "list", "-P", "work", "-p", "api"]);
        assert_eq!(cli.profile.as_deref(), Some("work"));
        assert_eq!(cli.project.as_deref(), Some("api"));
        assert!(matches!(cli.command, Commands::List { .. }));
    }

    #[test]
    fn tags_accepts_optional_key() {
        let cli = Cli::parse_from(["sentry-tool", "tags", "24", "server_name", "-f", "json"]);
        match cli.command {
            Commands::Tags {
                issue_id,
                tag_key,
                format,
            } => {
                assert_eq!(issue_id, "24");
                assert_eq!(tag_key.as_deref(), Some("server_name"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
