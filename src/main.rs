mod commands;
mod render;
mod utils;

use aayojana_core::model::{AttendanceStatus, Role};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aayojana")]
#[command(about = "Browse events, manage your registrations and rate what you attended")]
struct Cli {
    /// Act as this user id instead of the one in the config file
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show your roles
    Roles {
        /// Grant yourself a role (organizer, attendee, admin)
        #[arg(long)]
        grant: Option<Role>,
    },
    /// List events
    Events {
        /// Only show events in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Hide events that already happened
        #[arg(long)]
        upcoming: bool,
    },
    /// Show one event with its ratings and feedback
    Event {
        id: String,

        /// Rate the event (1-5)
        #[arg(long)]
        rate: Option<u8>,

        /// Leave feedback on the event
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Your event registrations
    Attend {
        #[command(subcommand)]
        command: AttendCommand,
    },
    /// Inspect or change the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum AttendCommand {
    /// List your registrations, most recent first
    List,
    /// Count registered, attended and upcoming events
    Stats,
    /// Register for an event
    Register { event_id: String },
    /// Change the status of a registration
    Mark {
        event_id: String,

        /// registered, attended or no-show
        status: AttendanceStatus,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print where the config file lives
    Path,
    /// Save the user id commands act as
    SetUser { user_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommand::Path => commands::config::path(),
            ConfigCommand::SetUser { user_id } => commands::config::set_user(user_id),
        },
        Commands::Events { category, upcoming } => {
            let session = commands::Session::connect(cli.user)?;
            commands::events::run(&session, category, upcoming).await
        }
        Commands::Roles { grant } => {
            let session = commands::Session::connect(cli.user)?;
            commands::roles::run(&session, grant).await
        }
        Commands::Event { id, rate, feedback } => {
            let session = commands::Session::connect(cli.user)?;
            commands::event::run(&session, id, rate, feedback).await
        }
        Commands::Attend { command } => {
            let session = commands::Session::connect(cli.user)?;
            match command {
                AttendCommand::List => commands::attend::list(&session).await,
                AttendCommand::Stats => commands::attend::stats(&session).await,
                AttendCommand::Register { event_id } => {
                    commands::attend::register(&session, event_id).await
                }
                AttendCommand::Mark { event_id, status } => {
                    commands::attend::mark(&session, event_id, status).await
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mark_with_dashed_status() {
        let cli = Cli::try_parse_from(["aayojana", "attend", "mark", "e1", "no-show"]).unwrap();
        match cli.command {
            Commands::Attend {
                command: AttendCommand::Mark { event_id, status },
            } => {
                assert_eq!(event_id, "e1");
                assert_eq!(status, AttendanceStatus::NoShow);
            }
            _ => panic!("expected attend mark"),
        }
    }

    #[test]
    fn user_override_is_global() {
        let cli = Cli::try_parse_from(["aayojana", "roles", "--grant", "Organizer", "--user", "u1"])
            .unwrap();
        assert_eq!(cli.user.as_deref(), Some("u1"));
        assert!(matches!(
            cli.command,
            Commands::Roles {
                grant: Some(Role::Organizer)
            }
        ));
    }

    #[test]
    fn parses_config_set_user() {
        let cli = Cli::try_parse_from(["aayojana", "config", "set-user", "u7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommand::SetUser { ref user_id }
            } if user_id == "u7"
        ));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Cli::try_parse_from(["aayojana", "roles", "--grant", "owner"]).is_err());
    }
}
