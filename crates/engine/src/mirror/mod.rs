//! The secondary expense store.
//!
//! The mirror keeps one entry per item currently counted as spent, so the
//! running expense of a list can be shown without scanning its items. It lives
//! outside the database transaction and is never authoritative: the engine
//! writes it after committing and rebuilds it from items on
//! [`Engine::reconcile`](crate::Engine::reconcile).

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{MoneyCents, ResultEngine};

mod json_file;
mod memory;

pub use json_file::JsonFileMirror;
pub use memory::MemoryMirror;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorEntry {
    pub list_id: String,
    pub item_id: String,
    pub item_name: String,
    pub expense: MoneyCents,
}

#[async_trait]
pub trait ExpenseMirror: Debug + Send + Sync {
    /// Inserts `entry` unless one already exists for its item.
    async fn record(&self, entry: MirrorEntry) -> ResultEngine<()>;

    /// Removes the entry of `item_id`, if any.
    async fn clear(&self, list_id: &str, item_id: &str) -> ResultEngine<()>;

    /// Total expense currently counted for the list.
    async fn sum_for(&self, list_id: &str) -> ResultEngine<MoneyCents>;

    /// Drops every entry of the given lists.
    async fn clear_all(&self, list_ids: &[String]) -> ResultEngine<()>;

    /// Entries of a list, ordered by item id.
    async fn entries_for(&self, list_id: &str) -> ResultEngine<Vec<MirrorEntry>>;

    /// Replaces every entry of a list.
    async fn replace_list(&self, list_id: &str, entries: Vec<MirrorEntry>) -> ResultEngine<()>;

    /// Overwrites the entry of an item whose expense changed.
    async fn refresh(&self, entry: MirrorEntry) -> ResultEngine<()> {
        self.clear(&entry.list_id, &entry.item_id).await?;
        self.record(entry).await
    }
}
