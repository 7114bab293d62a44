use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "keepset",
    about = "keepset: prune a content store down to what matters",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Mark what to keep and delete everything else
    Prune(PruneArgs),
    /// Mark only and list the retain-set
    Mark(MarkArgs),
    /// Validate a job file
    CheckConfig(CheckConfigArgs),
    /// Show table row counts of a dataset
    Stats(StatsArgs),
}

#[derive(Args)]
pub struct JobArgs {
    /// Dataset JSON file
    #[arg(long)]
    pub data: PathBuf,
    /// Job TOML file; built-in presets when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Clock for recency windows (RFC 3339); defaults to now
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct PruneArgs {
    #[command(flatten)]
    pub job: JobArgs,
    /// Where to write the pruned dataset; defaults to --data
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Stop after marking and report the candidate count
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct MarkArgs {
    #[command(flatten)]
    pub job: JobArgs,
    /// Write the dataset with its retain-set here
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(long)]
    pub data: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_prune_with_global_flags() {
        let cli = Cli::try_parse_from([
            "keepset",
            "prune",
            "--data",
            "site.json",
            "--now",
            "2024-06-30T00:00:00Z",
            "--dry-run",
            "-v",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        let Command::Prune(args) = cli.command else {
            panic!("expected prune");
        };
        assert!(args.dry_run);
        assert_eq!(args.job.data, PathBuf::from("site.json"));
        assert_eq!(
            args.job.now,
            Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn check_config_requires_a_path() {
        assert!(Cli::try_parse_from(["keepset", "check-config"]).is_err());
        assert!(Cli::try_parse_from(["keepset", "check-config", "--config", "job.toml"]).is_ok());
    }

    #[test]
    fn bad_clock_is_rejected() {
        assert!(Cli::try_parse_from(["keepset", "mark", "--data", "x.json", "--now", "yesterday"]).is_err());
    }
}
