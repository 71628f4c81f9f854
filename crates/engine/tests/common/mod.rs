#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Engine, EngineError, EngineObserver, ExpenseMirror, ListKind, MemoryMirror, MirrorEntry,
    MoneyCents, NewItem, NewList, Quantity, ResultEngine,
};
use migration::MigratorTrait;

pub async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = database().await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn engine_with(
    mirror: Arc<dyn ExpenseMirror>,
    observer: Arc<dyn EngineObserver>,
) -> (Engine, DatabaseConnection) {
    let db = database().await;
    let engine = Engine::builder()
        .database(db.clone())
        .mirror(mirror)
        .observer(observer)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Grocery list with a budget in cents.
pub async fn grocery(engine: &Engine, name: &str, budget: Option<i64>) -> String {
    engine
        .new_list(NewList {
            name: name.to_string(),
            kind: ListKind::Grocery,
            ref_month: Some("2025-07".to_string()),
            budget: budget.map(MoneyCents::new),
        })
        .await
        .unwrap()
        .list
        .id
}

pub async fn add_item(engine: &Engine, list_id: &str, name: &str, price: i64, qty_milli: i64) -> String {
    engine
        .new_item(
            list_id,
            NewItem {
                name: name.to_string(),
                quantity: Quantity::from_milli(qty_milli),
                price: MoneyCents::new(price),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
}

pub async fn current(engine: &Engine, list_id: &str) -> i64 {
    engine
        .budget(list_id)
        .await
        .unwrap()
        .unwrap()
        .current
        .cents()
}

/// Memory mirror whose writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyMirror {
    inner: MemoryMirror,
    failing: AtomicBool,
}

impl FlakyMirror {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> ResultEngine<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Mirror("mirror unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseMirror for FlakyMirror {
    async fn record(&self, entry: MirrorEntry) -> ResultEngine<()> {
        self.check()?;
        self.inner.record(entry).await
    }

    async fn clear(&self, list_id: &str, item_id: &str) -> ResultEngine<()> {
        self.check()?;
        self.inner.clear(list_id, item_id).await
    }

    async fn sum_for(&self, list_id: &str) -> ResultEngine<MoneyCents> {
        self.inner.sum_for(list_id).await
    }

    async fn clear_all(&self, list_ids: &[String]) -> ResultEngine<()> {
        self.check()?;
        self.inner.clear_all(list_ids).await
    }

    async fn entries_for(&self, list_id: &str) -> ResultEngine<Vec<MirrorEntry>> {
        self.inner.entries_for(list_id).await
    }

    async fn replace_list(&self, list_id: &str, entries: Vec<MirrorEntry>) -> ResultEngine<()> {
        self.check()?;
        self.inner.replace_list(list_id, entries).await
    }
}

/// Observer that records every event as `"<event>:<id>"`.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_price_required(&self, item_id: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("price_required:{item_id}"));
    }

    fn on_reconciliation_needed(&self, list_id: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("reconcile:{list_id}"));
    }
}
