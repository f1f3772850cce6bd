//! Independent worlds keyed by session id
//!
//! Each session owns its own store directory below the base store and its
//! own lock. Holding a session's lock serializes generation for that world;
//! different sessions never contend.

use crate::io::configuration::SamplerConfig;
use crate::io::error::{Result, invalid_parameter};
use crate::spatial::store::WorldStateStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Shared handle to one world's store
pub type SharedStore = Arc<Mutex<WorldStateStore>>;

/// Lazily opened per-session world stores
#[derive(Debug)]
pub struct WorldRegistry {
    config: SamplerConfig,
    worlds: Mutex<HashMap<String, SharedStore>>,
}

impl WorldRegistry {
    /// Create a registry whose sessions live under `config.store_dir`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            worlds: Mutex::new(HashMap::new()),
        })
    }

    /// Configuration shared by every session
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Store for `session`, opened on first use
    ///
    /// Session ids may contain ASCII letters, digits, `-` and `_`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid session id and
    /// propagates failures from [`WorldStateStore::open`]
    pub fn world(&self, session: &str) -> Result<SharedStore> {
        let config = self.session_config(session)?;

        let mut worlds = self.worlds.lock();
        if let Some(store) = worlds.get(session) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(Mutex::new(WorldStateStore::open(&config)?));
        worlds.insert(session.to_string(), Arc::clone(&store));
        debug!(session, "opened session world");
        Ok(store)
    }

    /// Configuration for the store of `session`
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid session id
    pub fn session_config(&self, session: &str) -> Result<SamplerConfig> {
        validate_session(session)?;
        Ok(self
            .config
            .with_store_dir(self.config.store_dir.join(session)))
    }

    /// Sessions opened so far, sorted
    pub fn sessions(&self) -> Vec<String> {
        let mut sessions: Vec<String> = self.worlds.lock().keys().cloned().collect();
        sessions.sort();
        sessions
    }
}

fn validate_session(session: &str) -> Result<()> {
    let valid = !session.is_empty()
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(invalid_parameter(
            "session",
            &session,
            &"must be non-empty and contain only ASCII letters, digits, '-' or '_'",
        ))
    }
}
