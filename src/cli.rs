//! Command-line interface for the ingestion binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::Category;

#[derive(Parser, Debug)]
#[command(author, version, about = "Publisher RSS ingestion with summaries and article lifecycle")]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, env = "NEWSBLITZ_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sweep the lifecycle, then fetch, summarize and store new articles
    Ingest,
    /// Run only the lifecycle sweep
    Sweep,
    /// Print active articles
    List {
        /// Only this category (AI, Health, Sports, Finance, Geopolitical, Crypto)
        #[arg(short = 'C', long, value_parser = parse_category)]
        category: Option<Category>,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// `ingest` when no subcommand was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Ingest)
    }
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse::<Category>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_ingest() {
        let cli = Cli::parse_from(["newsblitz"]);
        assert_eq!(cli.command(), Command::Ingest);
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::parse_from(["newsblitz", "-c", "/etc/newsblitz.toml", "sweep"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/newsblitz.toml")));
        assert_eq!(cli.command(), Command::Sweep);
    }

    #[test]
    fn test_list_options() {
        let cli = Cli::parse_from(["newsblitz", "list", "--category", "crypto", "-l", "5", "--json"]);
        assert_eq!(
            cli.command(),
            Command::List {
                category: Some(Category::Crypto),
                limit: 5,
                json: true,
            }
        );

        let cli = Cli::parse_from(["newsblitz", "list"]);
        assert_eq!(
            cli.command(),
            Command::List {
                category: None,
                limit: 20,
                json: false,
            }
        );
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["newsblitz", "list", "--category", "weather"]).is_err());
    }
}
