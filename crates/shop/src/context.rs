//! The shop's unit-of-work facade.

use std::sync::Arc;

use chrono::Utc;
use event_runner::{CommitError, CommitReport, LogSink, RunnerConfig};

use crate::handlers::{ShopRunner, shop_runner};
use crate::{ShopDb, StoreError};

/// Errors creating a [`ShopContext`].
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Registry(#[from] event_runner::RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A shop database paired with the runner that commits it.
pub struct ShopContext {
    db: ShopDb,
    runner: Arc<ShopRunner>,
}

impl ShopContext {
    pub fn new(db: ShopDb, runner: Arc<ShopRunner>) -> Self {
        Self { db, runner }
    }

    pub fn db(&self) -> &ShopDb {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut ShopDb {
        &mut self.db
    }

    /// Runs the event handlers and persists the tracked changes.
    pub fn save_changes(&mut self) -> Result<CommitReport, CommitError<StoreError>> {
        self.runner.commit(&mut self.db)
    }
}

/// Creates a context over a freshly seeded database.
pub fn create_seeded_context(
    log: Arc<dyn LogSink>,
    config: RunnerConfig,
) -> Result<ShopContext, ContextError> {
    let runner = shop_runner(log, config)?;
    let db = ShopDb::seeded(Utc::now())?;
    Ok(ShopContext::new(db, Arc::new(runner)))
}
