use std::time::Duration;

use crate::reorder::groups::AnchorThreshold;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub anchor_min_width: f64,
    pub anchor_min_height: f64,
    pub grid_spacing_tolerance: f64,
    pub grid_match_tolerance: f64,
    pub mapped_reading_tolerance: f64,
    pub detected_reading_tolerance: f64,
    pub move_delay: Duration,
    pub batch_delay: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub rate_limit_backoff: Duration,
    pub max_passes: usize,
    pub index_layout_id: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            anchor_min_width: 400.0,
            anchor_min_height: 200.0,
            grid_spacing_tolerance: 20.0,
            grid_match_tolerance: 60.0,
            mapped_reading_tolerance: 50.0,
            detected_reading_tolerance: 60.0,
            move_delay: Duration::from_millis(100),
            batch_delay: Duration::from_millis(300),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            rate_limit_backoff: Duration::from_millis(2000),
            max_passes: 2,
            index_layout_id: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_u64("DECKORDER_MOVE_DELAY_MS") {
            config.move_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("DECKORDER_BATCH_DELAY_MS") {
            config.batch_delay = Duration::from_millis(ms);
        }
        if let Some(attempts) = env_u64("DECKORDER_RETRY_ATTEMPTS") {
            config.retry_attempts = (attempts as u32).max(1);
        }
        if let Ok(layout) = std::env::var("DECKORDER_INDEX_LAYOUT") {
            let layout = layout.trim();
            if !layout.is_empty() {
                config.index_layout_id = Some(layout.to_string());
            }
        }
        config
    }

    pub fn anchor_threshold(&self) -> AnchorThreshold {
        AnchorThreshold {
            min_width: self.anchor_min_width,
            min_height: self.anchor_min_height,
        }
    }

    /// Zero pacing, for tests and dry runs against an in-memory deck.
    pub fn without_pacing() -> Self {
        Self {
            move_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
}
