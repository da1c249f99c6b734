//! Navigator configuration.

use std::time::Duration;

/// Navigator configuration.
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Upper bound for one persistence call; expiry is a persistence failure.
    pub commit_timeout: Duration,
    /// Upper bound for a catalog fetch.
    pub catalog_timeout: Duration,
    /// Buffer size of the navigator event channel.
    pub event_capacity: usize,
    /// Leading text of every correction note.
    pub note_prefix: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_secs(15),
            catalog_timeout: Duration::from_secs(30),
            event_capacity: 64,
            note_prefix: "Stock-take correction".to_string(),
        }
    }
}

impl NavigatorConfig {
    /// Defaults overridden by `STOCKTAKE_COMMIT_TIMEOUT_MS`,
    /// `STOCKTAKE_CATALOG_TIMEOUT_MS` and `STOCKTAKE_NOTE_PREFIX`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_millis("STOCKTAKE_COMMIT_TIMEOUT_MS") {
            config.commit_timeout = ms;
        }
        if let Some(ms) = env_millis("STOCKTAKE_CATALOG_TIMEOUT_MS") {
            config.catalog_timeout = ms;
        }
        if let Ok(prefix) = std::env::var("STOCKTAKE_NOTE_PREFIX") {
            if !prefix.trim().is_empty() {
                config.note_prefix = prefix;
            }
        }
        config
    }

    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn with_note_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.note_prefix = prefix.into();
        self
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            tracing::warn!("{} has invalid value {:?}; using default", key, raw);
            None
        }
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}
