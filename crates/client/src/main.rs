//! Headless match binary.
//!
//! ```bash
//! MATCH_SEED=7 MATCH_SELECTION=draft cargo run -p match-client
//! ```

use anyhow::Result;
use match_client::{CliConfig, logging, play};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let config = CliConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!(
        seed = config.seed,
        selection = %config.selection,
        max_turns = config.max_turns,
        "Starting match"
    );

    let report = play(&config).await?;
    match report.winner {
        Some(winner) => tracing::info!(
            %winner,
            turn = report.turn,
            hp_one = report.hp.one,
            hp_two = report.hp.two,
            "Match won"
        ),
        None => tracing::info!(turn = report.turn, "Match stopped at the turn limit"),
    }
    Ok(())
}
