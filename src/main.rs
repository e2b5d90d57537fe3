use std::process::ExitCode;

use deckorder_lib::{
    cli::{Cli, Commands},
    commands::{
        index::generate_index,
        reorder::{reorder_from_index, ReorderOptions},
    },
    core::{config::EngineConfig, errors::AppResult, run_log::RunLog},
    db::{default_data_dir, Database, DocumentProperties},
    host::{memory::InMemoryDeck, SlideHost},
    init_tracing,
    reorder::{
        groups::detect_groups,
        index_slides::{detect_index_slides, discover_from_mapping},
        mapping::load_mapping,
    },
};
use serde_json::json;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(code = err.code(), "{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<bool> {
    let config = EngineConfig::from_env();
    let mut deck = InMemoryDeck::load(&cli.deck)?;
    let data_dir = default_data_dir(cli.data_dir.clone())?;
    let db = Database::new(&data_dir).await?;
    let store = DocumentProperties::new(db, deck.document_id().to_string());
    info!(deck = %cli.deck.display(), data_dir = %data_dir.display(), "deck loaded");

    match cli.command {
        Commands::Index { write } => {
            let response = generate_index(&mut deck, &store, &config).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if write && response.success {
                deck.save(&cli.deck)?;
                info!("deck written back to {}", cli.deck.display());
            }
            Ok(response.success)
        }
        Commands::Reorder { write, dry_run } => {
            let response =
                reorder_from_index(&mut deck, &store, &config, ReorderOptions { dry_run }).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if write && !dry_run && response.success {
                deck.save(&cli.deck)?;
                info!("deck written back to {}", cli.deck.display());
            }
            Ok(response.success)
        }
        Commands::Inspect => {
            let mut log = RunLog::new();
            let slides = deck.slides().await?;
            let mapping = load_mapping(&store, &mut log).await;
            let mut index_slides = mapping
                .as_ref()
                .map(|mapping| discover_from_mapping(&slides, mapping, &config, &mut log))
                .unwrap_or_default();
            if index_slides.is_empty() {
                index_slides = detect_index_slides(&slides, &config, &mut log);
            }
            let groups = detect_groups(&slides, index_slides.len(), config.anchor_threshold(), &mut log);
            let report = json!({
                "documentId": deck.document_id(),
                "slideCount": slides.len(),
                "indexSlides": index_slides,
                "groups": groups,
                "mapping": mapping,
                "log": log.render(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(true)
        }
    }
}
