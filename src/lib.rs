pub mod cli;
pub mod commands;
pub mod core;
pub mod db;
pub mod host;
pub mod reorder;

use tracing_subscriber::EnvFilter;

fn log_level_from_env() -> &'static str {
    match std::env::var("DECKORDER_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

fn sqlx_debug_enabled() -> bool {
    matches!(
        std::env::var("DECKORDER_SQLX_DEBUG")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn filter_directives(level: &str, sqlx_debug: bool) -> String {
    if sqlx_debug {
        format!("{level},sqlx::query=debug")
    } else {
        format!("{level},sqlx::query=warn")
    }
}

/// Installs the global subscriber. `verbose` forces debug output.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { log_level_from_env() };
    let filter = EnvFilter::try_new(filter_directives(level, sqlx_debug_enabled()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
