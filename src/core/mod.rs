pub mod config;
pub mod errors;
pub mod run_log;
pub mod types;
