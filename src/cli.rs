use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Answer policy questions with cited sources from a local document corpus.
#[derive(Parser, Debug)]
#[command(name = "tenet", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "TENET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP API.
    Serve,
    /// Index the documents of a directory and print the report.
    Ingest {
        /// Directory to ingest instead of `data.dir`.
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Empty the collection first.
        #[arg(long)]
        reset: bool,
    },
    /// Ingest `data.dir`, then answer one question.
    Ask {
        query: String,
        /// Number of chunks to retrieve.
        #[arg(short, long)]
        k: Option<usize>,
    },
}

impl Cli {
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("config/default.toml"))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_k() {
        let cli = Cli::try_parse_from(["tenet", "ask", "Can I return it?", "-k", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Ask {
                query: "Can I return it?".into(),
                k: Some(2),
            }
        );
    }

    #[test]
    fn parses_ingest_flags_and_global_config() {
        let cli = Cli::try_parse_from([
            "tenet", "ingest", "--dir", "/srv/docs", "--reset", "--config", "tenet.toml",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Ingest {
                dir: Some(PathBuf::from("/srv/docs")),
                reset: true,
            }
        );
        assert_eq!(cli.config_path(), PathBuf::from("tenet.toml"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["tenet"]).is_err());
    }
}
