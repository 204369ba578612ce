use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Statistics for gateway configuration backups and configuration directories.
#[derive(Debug, Parser)]
#[command(name = "ember", version, about)]
pub struct Cli {
    /// More logging; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Settings file, merged over the per-user `ember.toml`.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Single-line JSON output.
    #[arg(long, global = true)]
    pub compact: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Statistics for a gateway backup (.gwbk) or configuration directory.
    #[command(visible_alias = "backup-stats")]
    Stats { path: PathBuf },
    /// Check whether a directory looks like a gateway configuration.
    #[command(visible_aliases = ["analyze-directory", "analyze-dir"])]
    Inspect { path: PathBuf },
    /// Identify what kind of file or directory a path is.
    Analyze { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["ember", "stats", "gw.gwbk"])]
    #[case(&["ember", "backup-stats", "gw.gwbk"])]
    fn test_stats_alias(#[case] args: &[&str]) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Stats { path } if path == PathBuf::from("gw.gwbk")));
    }

    #[rstest]
    #[case("inspect")]
    #[case("analyze-directory")]
    #[case("analyze-dir")]
    fn test_inspect_aliases(#[case] command: &str) {
        let cli = Cli::try_parse_from(["ember", command, "/srv/ignition"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect { .. }));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["ember", "analyze", "x.idb", "-vv", "--compact", "--config", "e.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.compact);
        assert_eq!(cli.config, Some(PathBuf::from("e.toml")));
    }

    #[test]
    fn test_missing_path() {
        assert!(Cli::try_parse_from(["ember", "stats"]).is_err());
    }
}
