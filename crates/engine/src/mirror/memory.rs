use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{ExpenseMirror, MirrorEntry};
use crate::{MoneyCents, ResultEngine};

/// Process-local mirror: list id -> item id -> entry.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    lists: DashMap<String, BTreeMap<String, MirrorEntry>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseMirror for MemoryMirror {
    async fn record(&self, entry: MirrorEntry) -> ResultEngine<()> {
        self.lists
            .entry(entry.list_id.clone())
            .or_default()
            .entry(entry.item_id.clone())
            .or_insert(entry);
        Ok(())
    }

    async fn clear(&self, list_id: &str, item_id: &str) -> ResultEngine<()> {
        if let Some(mut entries) = self.lists.get_mut(list_id) {
            entries.remove(item_id);
        }
        Ok(())
    }

    async fn sum_for(&self, list_id: &str) -> ResultEngine<MoneyCents> {
        Ok(self
            .lists
            .get(list_id)
            .map(|entries| entries.values().map(|e| e.expense).sum())
            .unwrap_or(MoneyCents::ZERO))
    }

    async fn clear_all(&self, list_ids: &[String]) -> ResultEngine<()> {
        for list_id in list_ids {
            self.lists.remove(list_id);
        }
        Ok(())
    }

    async fn entries_for(&self, list_id: &str) -> ResultEngine<Vec<MirrorEntry>> {
        Ok(self
            .lists
            .get(list_id)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace_list(&self, list_id: &str, entries: Vec<MirrorEntry>) -> ResultEngine<()> {
        let entries: BTreeMap<String, MirrorEntry> = entries
            .into_iter()
            .map(|e| (e.item_id.clone(), e))
            .collect();
        if entries.is_empty() {
            self.lists.remove(list_id);
        } else {
            self.lists.insert(list_id.to_string(), entries);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(list: &str, item: &str, cents: i64) -> MirrorEntry {
        MirrorEntry {
            list_id: list.to_string(),
            item_id: item.to_string(),
            item_name: format!("item {item}"),
            expense: MoneyCents::new(cents),
        }
    }

    #[tokio::test]
    async fn record_is_idempotent() {
        let mirror = MemoryMirror::new();
        mirror.record(entry("L1", "a", 1700)).await.unwrap();
        mirror.record(entry("L1", "a", 9999)).await.unwrap();
        assert_eq!(mirror.sum_for("L1").await.unwrap(), MoneyCents::new(1700));
    }

    #[tokio::test]
    async fn clear_and_sum_are_scoped_to_the_list() {
        let mirror = MemoryMirror::new();
        mirror.record(entry("L1", "a", 1700)).await.unwrap();
        mirror.record(entry("L1", "b", 300)).await.unwrap();
        mirror.record(entry("L2", "c", 50)).await.unwrap();

        mirror.clear("L1", "a").await.unwrap();
        mirror.clear("L1", "missing").await.unwrap();

        assert_eq!(mirror.sum_for("L1").await.unwrap(), MoneyCents::new(300));
        assert_eq!(mirror.sum_for("L2").await.unwrap(), MoneyCents::new(50));
        assert_eq!(mirror.sum_for("L3").await.unwrap(), MoneyCents::ZERO);
    }

    #[tokio::test]
    async fn refresh_overwrites_the_expense() {
        let mirror = MemoryMirror::new();
        mirror.record(entry("L1", "a", 1700)).await.unwrap();
        mirror.refresh(entry("L1", "a", 2000)).await.unwrap();
        assert_eq!(mirror.sum_for("L1").await.unwrap(), MoneyCents::new(2000));
    }

    #[tokio::test]
    async fn clear_all_and_replace_list() {
        let mirror = MemoryMirror::new();
        mirror.record(entry("L1", "a", 1700)).await.unwrap();
        mirror.record(entry("L2", "b", 300)).await.unwrap();

        mirror.clear_all(&["L1".to_string()]).await.unwrap();
        assert!(mirror.entries_for("L1").await.unwrap().is_empty());

        mirror
            .replace_list("L2", vec![entry("L2", "x", 10), entry("L2", "y", 20)])
            .await
            .unwrap();
        let entries = mirror.entries_for("L2").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id, "x");
        assert_eq!(mirror.sum_for("L2").await.unwrap(), MoneyCents::new(30));
    }
}
