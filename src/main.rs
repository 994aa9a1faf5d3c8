mod cli;
mod draw;
mod state;

use crate::cli::Command;
use crate::state::app_settings::AppSettings;
use anyhow::Context;
use log::{debug, info};
use slate_api::orchestrator::FallbackOrchestrator;
use slate_api::sources::default_sources;
use slate_api::store::StateStore;
use slate_api::validator::{ConsistencyValidator, summarize};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(command) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();
    setup_logging();

    let settings = AppSettings::load();
    debug!("settings: {settings:?}");

    let orchestrator = FallbackOrchestrator::new(
        default_sources(&settings.sources),
        StateStore::new(&settings.state_dir),
    )
    .with_cache_ttl(settings.cache_ttl);

    run(command, &orchestrator).await
}

/// Parse argv. Help and version are answered here; usage errors exit with 2.
fn handle_cli_args() -> Option<Command> {
    match cli::parse_args(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{}", cli::usage_text());
            None
        }
        Ok(Command::Version) => {
            println!("slate {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Ok(command) => Some(command),
        Err(message) => {
            eprintln!("{message}\n\n{}", cli::usage_text());
            std::process::exit(2);
        }
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Command, orchestrator: &FallbackOrchestrator) -> anyhow::Result<()> {
    match command {
        Command::Acquire { game_type, force, preference, json } => {
            let acquired = orchestrator.acquire(game_type, force, preference).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&acquired)?);
            } else {
                print!("{}", draw::draw_acquired(&acquired));
            }
        }
        Command::Compare { game_type, source_a, source_b, json } => {
            let slate_a = orchestrator
                .fetch_tier(game_type, source_a, true)
                .await
                .with_context(|| format!("fetching {game_type} from {source_a}"))?;
            let slate_b = orchestrator
                .fetch_tier(game_type, source_b, true)
                .await
                .with_context(|| format!("fetching {game_type} from {source_b}"))?;

            let result = ConsistencyValidator::default().compare(&slate_a, &slate_b);
            let summary = summarize(&result);
            if json {
                let report = serde_json::json!({ "result": result, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", draw::draw_validation(&slate_a, &slate_b, &result, &summary));
            }
        }
        Command::LastRound { game_type } => match orchestrator.last_round(game_type).await {
            Some(round) => println!("{round}"),
            None => println!("no saved round for {game_type}"),
        },
        Command::CheckNew { game_type } => match orchestrator.check_new_round(game_type).await {
            Some(round) => {
                info!("{game_type}: new round {round}");
                println!("{round}");
            }
            None => println!("no new round for {game_type}"),
        },
        Command::Help | Command::Version => {}
    }
    Ok(())
}
