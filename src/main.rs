use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use digester::cli::{Cli, Commands};
use digester::config::Config;
use digester::errors::{DigestError, DigestResult};
use digester::services::DigestService;
use digester::storage::{Ledger, SqliteLedger, SqliteStorage};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> DigestResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;
    let ledger = SqliteLedger::new(storage);

    match cli.command {
        Commands::Run { dry_run, force } => cmd_run(config, ledger, dry_run, force),
        Commands::Status => cmd_status(ledger),
        Commands::Prune { days } => cmd_prune(ledger, days),
    }
}

fn cmd_run(config: Config, ledger: SqliteLedger, dry_run: bool, force: bool) -> DigestResult<()> {
    let problems = config.validate();
    if !problems.is_empty() {
        println!("Configuration problems:");
        for problem in &problems {
            println!("  ! {}", problem);
        }
        return Err(DigestError::Config(
            "fix the problems above and run again".to_string(),
        ));
    }

    let today = Local::now().date_naive();
    let retention_days = config.retention_days;
    let service = DigestService::new(config, ledger);

    if !service.should_run(today, force)? {
        println!("Already ran successfully today. Use --force to run again.");
        return Ok(());
    }

    println!("Collecting digest for {}...\n", today);
    let digest = service.collect(today);

    println!(
        "Collected {} articles, {} national headlines, {} forecasts, {} historical events.",
        digest.articles.len(),
        digest.headlines.len(),
        digest.weather.len(),
        digest.history.events.len()
    );

    let draft_path = service.write_draft(&digest)?;
    println!("Draft written to {}", draft_path.display());

    if dry_run {
        println!("[DRY RUN] Nothing recorded as sent.");
        return Ok(());
    }

    match service.record_outcome(&digest) {
        Ok(()) => {
            let pruned = service.prune(retention_days)?;
            if pruned > 0 {
                println!("Pruned {} sent-article records past retention.", pruned);
            }
            println!("Run recorded: {} articles marked as sent.", digest.articles.len());
            Ok(())
        }
        Err(e) => {
            // Best effort; the original failure is the one worth surfacing
            let _ = service.record_failure(today, &e.to_string());
            Err(e)
        }
    }
}

fn cmd_status(ledger: SqliteLedger) -> DigestResult<()> {
    let stats = ledger.stats()?;

    println!("Ledger status:\n");
    println!("  Articles sent:   {}", stats.total_articles_sent);
    println!("  Successful runs: {}", stats.successful_runs);
    println!("  Failed runs:     {}", stats.failed_runs);

    match ledger.last_successful_run()? {
        Some(timestamp) => println!("  Last success:    {}", timestamp),
        None => println!("  Last success:    never"),
    }

    Ok(())
}

fn cmd_prune(ledger: SqliteLedger, days: u32) -> DigestResult<()> {
    let deleted = ledger.prune(days)?;
    if deleted == 0 {
        println!("Nothing to prune (retention: {} days).", days);
    } else {
        println!("Pruned {} sent-article records older than {} days.", deleted, days);
    }
    Ok(())
}
