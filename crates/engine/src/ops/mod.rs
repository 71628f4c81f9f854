use std::{future::Future, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{EngineObserver, ExpenseMirror, MemoryMirror, NoopObserver, ResultEngine, locks::ListLocks};

mod bulk;
mod items;
mod ledger;
mod lists;
mod toggle;

pub use bulk::{FieldPatch, ListEdit};
pub use items::{ItemPatch, NewItem};
pub use ledger::{ExpenseSummary, ReconcileReport};
pub use lists::NewList;
pub use toggle::ToggleOutcome;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The budget reconciliation engine.
///
/// Lists, budgets and items live in the database and every multi-row change is
/// one transaction. The expense mirror is written after the commit; when that
/// write fails the engine logs it, notifies the observer and leaves the repair
/// to [`Engine::reconcile`].
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    mirror: Arc<dyn ExpenseMirror>,
    observer: Arc<dyn EngineObserver>,
    locks: ListLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Await a mirror write, turning a failure into a logged drift.
    async fn sync_mirror<F>(&self, list_id: &str, write: F) -> bool
    where
        F: Future<Output = ResultEngine<()>>,
    {
        match write.await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(list_id, error = %err, "expense mirror write failed, list needs reconcile");
                self.observer.on_reconciliation_needed(list_id);
                false
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    mirror: Option<Arc<dyn ExpenseMirror>>,
    observer: Option<Arc<dyn EngineObserver>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Secondary expense store. Defaults to [`MemoryMirror`].
    pub fn mirror(mut self, mirror: Arc<dyn ExpenseMirror>) -> EngineBuilder {
        self.mirror = Some(mirror);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn EngineObserver>) -> EngineBuilder {
        self.observer = Some(observer);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            mirror: self
                .mirror
                .unwrap_or_else(|| Arc::new(MemoryMirror::new())),
            observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
            locks: ListLocks::default(),
        })
    }
}
