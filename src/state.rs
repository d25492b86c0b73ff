use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::catalog::Catalog;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub catalog: Arc<Catalog>,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AppState {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        config: AppConfig,
        llm: Box<dyn LlmProvider>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            db,
            config,
            llm,
            catalog,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialize turns per session key so messages for one conversation are
    /// processed in arrival order; unrelated sessions never contend here.
    pub async fn session_turn_lock(&self, session_id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.session_locks.lock().unwrap();
            if locks.len() > 1024 {
                locks.retain(|_, l| Arc::strong_count(l) > 1);
            }
            Arc::clone(locks.entry(session_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
