//! Per-list critical sections.
//!
//! Every operation that mutates a budget holds the lock of its list from the
//! first read to the last write, so two toggles on the same list never see the
//! same `current` value. Reads do not take locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct ListLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Guards held for the duration of one logical operation.
#[derive(Debug)]
pub(crate) struct ListGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ListLocks {
    fn handle(&self, list_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(list_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub(crate) async fn lock(&self, list_id: &str) -> ListGuards {
        let guard = self.handle(list_id).lock_owned().await;
        ListGuards {
            _guards: vec![guard],
        }
    }

    /// Locks several lists. Ids are sorted and deduplicated first so that two
    /// batches over overlapping lists cannot deadlock.
    pub(crate) async fn lock_many(&self, list_ids: &[String]) -> ListGuards {
        let mut ids: Vec<&String> = list_ids.iter().collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.handle(id).lock_owned().await);
        }
        ListGuards { _guards: guards }
    }

    /// Drops the lock of a deleted list. Callers must hold it.
    pub(crate) fn forget(&self, list_ids: &[String]) {
        for id in list_ids {
            self.locks.remove(id);
        }
    }
}
