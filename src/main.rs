//! Expanding Nim - participant CLI
//!
//! Connects to an Arbiter and plays one game, printing progress to stdout.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, PlayerArgs};
use expanding_nim::{
    ClientConfig, Driver, GameEvent, Mover, PlayerOrder, Session, TurnStatus,
};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const SEPARATOR: &str = "---------------------------------------";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    match cli.command {
        Command::Play(args) => run_play(args).await,
        Command::ShowConfig(args) => show_config(args),
    }
}

/// Play one game with the resolved configuration.
#[instrument(skip_all)]
async fn run_play(args: PlayerArgs) -> Result<()> {
    let config = args.resolve()?;
    let order = config.order();
    info!(player_name = %config.name(), endpoint = %config.endpoint(), %order, "Joining game");

    let session = Session::open_with_limit(
        config.name(),
        order,
        config.endpoint(),
        *config.max_frame_len(),
    )
    .await
    .with_context(|| format!("Could not join the game at {}", config.endpoint()))?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(event_rx));

    let strategy = config.strategy().build(*config.max_input_attempts());
    let result = Driver::new(session, strategy)
        .with_events(event_tx)
        .run()
        .await;

    // Driver dropped its sender; the printer drains and exits.
    printer.await?;

    // Reported once, by anyhow, on the way out of main.
    result.context("Game aborted")?;
    Ok(())
}

/// Print the configuration that `play` would use.
#[instrument(skip_all)]
fn show_config(args: PlayerArgs) -> Result<()> {
    let config: ClientConfig = args.resolve()?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Render driver events in the classic console format.
async fn print_events(mut event_rx: mpsc::UnboundedReceiver<GameEvent>) {
    while let Some(event) = event_rx.recv().await {
        match event {
            GameEvent::Started {
                name,
                order,
                params,
            } => {
                println!("Welcome to Expanding Nim, {}!", name);
                println!(
                    "You are {} and will go {}.",
                    order,
                    if order == PlayerOrder::First { "first" } else { "second" }
                );
                println!(
                    "The game starts with {} stones, {} resets, a maximum take of {} and {} seconds per player.",
                    params.init_stones(),
                    params.init_resets(),
                    params.init_max(),
                    params.game_time()
                );
                println!("{}", SEPARATOR);
            }
            GameEvent::Thinking { .. } => {}
            GameEvent::MovePlayed { mover, status } => print_move(mover, &status),
            GameEvent::GameOver(outcome) => {
                println!("Game over");
                println!("{}", outcome.outcome.reason);
                println!(
                    "{}",
                    if outcome.won() { "You win!" } else { "You lose." }
                );
            }
        }
    }
}

fn print_move(mover: Mover, status: &TurnStatus) {
    let who = match mover {
        Mover::Me => "You",
        Mover::Opponent => "Opponent",
    };
    if status.finished && status.stones_removed == 0 {
        // Terminal statuses may carry no move details.
        return;
    }
    println!(
        "{} took {} stones{}",
        who,
        status.stones_removed,
        if status.reset_used { " and used reset." } else { "." }
    );
    println!("Current max: {}", status.current_max);
    println!("Stones left: {}", status.stones_left);
    println!("{}", SEPARATOR);
}

fn initialize_tracing() {
    // Logs go to stderr so they never interleave with the game transcript.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
