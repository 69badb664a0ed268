// Command-line surface of the `gigscout` binary. Every setting falls back to
// an environment variable (and therefore to `.env`).

use clap::{Parser, Subcommand};
use gigscout_common::settings::Settings;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "gigscout",
    version,
    about = "Finds new marketplace orders, responds to matching ones, and relays invitations to Telegram"
)]
pub struct CommandSettings {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the scraper, the relay and the operator bot (default).
    Run,

    /// Inspect or replace the keyword list.
    Keywords {
        #[command(subcommand)]
        action: KeywordsCommand,
    },

    /// Inspect recorded listings.
    Listings {
        #[command(subcommand)]
        action: ListingsCommand,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum KeywordsCommand {
    /// Print the stored keywords, one per line.
    Show,
    /// Replace the list with a comma-separated one, e.g. "сантехник, электрик".
    Set { list: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ListingsCommand {
    /// Listings a customer responded to that the operator has not been told about.
    Pending,
}

impl CommandSettings {
    /// The command to execute; `run` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> CommandSettings {
        CommandSettings::try_parse_from(std::iter::once("gigscout").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_run() {
        assert_eq!(parse(&[]).command(), Command::Run);
        assert_eq!(parse(&["run"]).command(), Command::Run);
    }

    #[test]
    fn keywords_set_takes_the_raw_list() {
        let cli = parse(&["keywords", "set", "сантехник, электрик"]);
        assert_eq!(
            cli.command(),
            Command::Keywords {
                action: KeywordsCommand::Set {
                    list: "сантехник, электрик".to_string()
                }
            }
        );
    }

    #[test]
    fn global_flags_precede_the_command() {
        let cli = parse(&["--data-dir", "/var/lib/gigscout", "listings", "pending"]);
        assert_eq!(cli.settings.data_dir, PathBuf::from("/var/lib/gigscout"));
        assert_eq!(
            cli.command(),
            Command::Listings {
                action: ListingsCommand::Pending
            }
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(CommandSettings::try_parse_from(["gigscout", "configure"]).is_err());
    }
}
