mod config;
mod provider;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use provider::Provider;

#[derive(Parser)]
#[command(name = "cinesync")]
#[command(about = "Keep e-cinema ticket confirmations from your mailbox registered on your calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with a mail/calendar provider
    Auth {
        /// Provider to authenticate with (e.g., "google")
        provider: String,
    },
    /// Scan the mailbox once and register missing tickets on the calendar
    Run,
    /// Show which tickets would be registered, without writing anything
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Auth { provider } => cmd_auth(&provider).await,
        Commands::Run => cmd_run().await,
        Commands::Status => cmd_status().await,
    }
}

async fn cmd_auth(provider_name: &str) -> Result<()> {
    let provider = Provider::new(provider_name)?;

    println!("Authenticating with {}...", provider_name);

    // Provider handles the full OAuth flow and stores credentials/tokens
    let account = provider.authenticate().await?;

    println!("\nAuthenticated as: {}", account);
    println!("\nNow point your config.toml at the account:");
    println!();
    println!("search_key = \"シネマシティ\"");
    println!("senders = [\"ticket@cinemacity.co.jp\"]");
    println!("provider = \"{}\"", provider_name);
    println!("account = \"{}\"", account);
    println!();
    println!("Then run `cinesync run` to register your tickets.");

    Ok(())
}

async fn cmd_run() -> Result<()> {
    let cfg = config::load_config()?;
    let provider = Provider::from_config(&cfg)?;
    let settings = run::RunSettings {
        senders: cfg.senders,
        search_key: cfg.search_key,
    };

    let summary = run::run_once(&settings, &provider, &provider).await?;

    for title in &summary.created {
        println!("Registered: {}", title);
    }

    println!(
        "\n{} extracted, {} skipped, {} already registered, {} created",
        summary.plan.tickets.len(),
        summary.plan.skipped,
        summary.plan.covered,
        summary.created.len()
    );

    Ok(())
}

async fn cmd_status() -> Result<()> {
    let cfg = config::load_config()?;
    let provider = Provider::from_config(&cfg)?;
    let settings = run::RunSettings {
        senders: cfg.senders,
        search_key: cfg.search_key,
    };

    let plan = run::plan(&settings, &provider, &provider).await?;

    if plan.tickets.is_empty() {
        println!(
            "No tickets found in the mailbox ({} message(s) scanned).",
            plan.skipped
        );
        return Ok(());
    }

    if !plan.missing.is_empty() {
        println!("To register:");
        for ticket in &plan.missing {
            println!(
                "  + {} ({})",
                ticket.title,
                ticket.start_time.format("%Y-%m-%d %H:%M")
            );
        }
    }

    if plan.covered > 0 {
        println!("{} ticket(s) already on the calendar.", plan.covered);
    }

    if plan.missing.is_empty() {
        println!("Everything up to date.");
    } else {
        println!(
            "\nRun `cinesync run` to register {} ticket(s).",
            plan.missing.len()
        );
    }

    Ok(())
}
