//! Cardvault CLI - sync and browse a local trading-card catalog

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands, HoldingCommands};
use crate::commands::cards::run_cards;
use crate::commands::common::resolve_db_path;
use crate::commands::holdings::{run_holdings_add, run_holdings_list};
use crate::commands::runs::run_runs;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cardvault_core=warn".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Sync(args) => run_sync(&args, &db_path).await?,
        Commands::Cards {
            filter,
            limit,
            json,
        } => run_cards(&filter.criteria(), limit, json, &db_path)?,
        Commands::Holdings { command } => match command {
            HoldingCommands::Add {
                card_id,
                quantity,
                variant,
                notes,
            } => run_holdings_add(&card_id, quantity, &variant, notes.as_deref(), &db_path)?,
            HoldingCommands::List { json } => run_holdings_list(json, &db_path)?,
        },
        Commands::Runs { limit, json } => run_runs(limit, json, &db_path)?,
    }

    Ok(())
}
