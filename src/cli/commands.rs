use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "digester")]
#[command(about = "Daily local-news digest aggregator with durable deduplication")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect all sections and write the digest draft
    Run {
        /// Dry run - collect and write the draft but don't record anything as sent
        #[arg(long)]
        dry_run: bool,

        /// Run even if a successful run is already recorded for today
        #[arg(long)]
        force: bool,
    },

    /// Show ledger statistics and the last successful run
    Status,

    /// Delete sent-article records older than the retention window
    Prune {
        /// Retention in days
        #[arg(long, default_value_t = 90)]
        days: u32,
    },
}
