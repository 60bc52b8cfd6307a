use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_BROWSE_LIMIT: u32 = 20;

#[derive(Parser, Debug)]
#[command(name = "pokedex", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (same as setting POKEDEX_DEBUG)
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// No subcommand means `status`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Status)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Reconcile the roster and print metrics, recent captures and recommendations
    Status,

    /// List catalog entries
    Browse {
        /// How many entries to list
        #[arg(default_value_t = DEFAULT_BROWSE_LIMIT)]
        limit: u32,
    },

    /// Capture a pokemon by catalog id
    Capture {
        id: u32,
        /// Level to record; rolled in 1..=100 when omitted
        level: Option<u32>,
    },

    /// Release a captured pokemon
    Release { id: u32 },

    /// Print the roster as an export document
    Export,

    /// Merge the pokemon from an export document into the roster
    Import {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Keep printing fresh recommendations until interrupted
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        let argv = std::iter::once("pokedex").chain(args.iter().copied());
        Cli::try_parse_from(argv).map(|cli| cli.command())
    }

    #[test]
    fn command_parsing() {
        assert_eq!(parse(&[]).unwrap(), Command::Status);
        assert_eq!(parse(&["status"]).unwrap(), Command::Status);
        assert_eq!(parse(&["export"]).unwrap(), Command::Export);
        assert_eq!(
            parse(&["browse"]).unwrap(),
            Command::Browse {
                limit: DEFAULT_BROWSE_LIMIT
            }
        );
        assert_eq!(parse(&["browse", "5"]).unwrap(), Command::Browse { limit: 5 });
        assert_eq!(
            parse(&["capture", "25", "40"]).unwrap(),
            Command::Capture {
                id: 25,
                level: Some(40)
            }
        );
        assert_eq!(
            parse(&["capture", "25"]).unwrap(),
            Command::Capture { id: 25, level: None }
        );
        assert_eq!(parse(&["release", "7"]).unwrap(), Command::Release { id: 7 });
        assert_eq!(
            parse(&["import", "backup.json"]).unwrap(),
            Command::Import {
                path: PathBuf::from("backup.json")
            }
        );
        assert_eq!(parse(&["watch"]).unwrap(), Command::Watch);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(parse(&["capture", "pikachu"]).is_err());
        assert!(parse(&["release"]).is_err());
        assert!(parse(&["import"]).is_err());
        assert!(parse(&["fly"]).is_err());
    }

    #[test]
    fn debug_flag_is_global_to_the_invocation() {
        let cli = Cli::try_parse_from(["pokedex", "--debug", "export"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.command(), Command::Export);

        let cli = Cli::try_parse_from(["pokedex"]).unwrap();
        assert!(!cli.debug);
    }
}
