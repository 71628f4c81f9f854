use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task};

use super::{ExpenseMirror, MirrorEntry};
use crate::{EngineError, MoneyCents, ResultEngine};

type Document = BTreeMap<String, BTreeMap<String, MirrorEntry>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct MirrorFile {
    #[serde(default)]
    lists: Document,
}

/// Mirror persisted as one JSON document.
///
/// Every write loads the document, changes it and replaces the file through a
/// temporary sibling and a rename, so a crash leaves either the old or the new
/// content on disk. File access runs on the blocking pool.
#[derive(Debug)]
pub struct JsonFileMirror {
    path: Arc<PathBuf>,
    guard: Mutex<()>,
}

fn load(path: &Path) -> ResultEngine<MirrorFile> {
    if !path.exists() {
        return Ok(MirrorFile::default());
    }
    let file = File::open(path)
        .map_err(|e| EngineError::Mirror(format!("failed to open {}: {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| EngineError::Mirror(format!("failed to parse {}: {e}", path.display())))
}

fn store(path: &Path, data: &MirrorFile) -> ResultEngine<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            EngineError::Mirror(format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path)
        .map_err(|e| EngineError::Mirror(format!("failed to create temp file: {e}")))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| EngineError::Mirror(format!("failed to serialize mirror: {e}")))?;
    writer
        .flush()
        .map_err(|e| EngineError::Mirror(format!("failed to flush mirror: {e}")))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| EngineError::Mirror(format!("failed to sync mirror: {e}")))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        EngineError::Mirror(format!("failed to replace {}: {e}", path.display()))
    })
}

impl JsonFileMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `job` against the file on the blocking pool, one job at a time.
    async fn with_file<T, F>(&self, job: F) -> ResultEngine<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> ResultEngine<T> + Send + 'static,
    {
        let _guard = self.guard.lock().await;
        let path = Arc::clone(&self.path);
        task::spawn_blocking(move || job(path.as_path()))
            .await
            .map_err(|e| EngineError::Mirror(format!("mirror task failed: {e}")))?
    }

    async fn update<F>(&self, change: F) -> ResultEngine<()>
    where
        F: FnOnce(&mut Document) + Send + 'static,
    {
        self.with_file(move |path| {
            let mut data = load(path)?;
            change(&mut data.lists);
            store(path, &data)
        })
        .await
    }

    async fn read<T, F>(&self, view: F) -> ResultEngine<T>
    where
        T: Send + 'static,
        F: FnOnce(&Document) -> T + Send + 'static,
    {
        self.with_file(move |path| Ok(view(&load(path)?.lists))).await
    }
}

#[async_trait]
impl ExpenseMirror for JsonFileMirror {
    async fn record(&self, entry: MirrorEntry) -> ResultEngine<()> {
        self.update(move |lists| {
            lists
                .entry(entry.list_id.clone())
                .or_default()
                .entry(entry.item_id.clone())
                .or_insert(entry);
        })
        .await
    }

    async fn clear(&self, list_id: &str, item_id: &str) -> ResultEngine<()> {
        let (list_id, item_id) = (list_id.to_string(), item_id.to_string());
        self.update(move |lists| {
            if let Some(entries) = lists.get_mut(&list_id) {
                entries.remove(&item_id);
                if entries.is_empty() {
                    lists.remove(&list_id);
                }
            }
        })
        .await
    }

    async fn sum_for(&self, list_id: &str) -> ResultEngine<MoneyCents> {
        let list_id = list_id.to_string();
        self.read(move |lists| {
            lists
                .get(&list_id)
                .map(|entries| entries.values().map(|e| e.expense).sum())
                .unwrap_or(MoneyCents::ZERO)
        })
        .await
    }

    async fn clear_all(&self, list_ids: &[String]) -> ResultEngine<()> {
        let list_ids = list_ids.to_vec();
        self.update(move |lists| {
            for list_id in &list_ids {
                lists.remove(list_id);
            }
        })
        .await
    }

    async fn entries_for(&self, list_id: &str) -> ResultEngine<Vec<MirrorEntry>> {
        let list_id = list_id.to_string();
        self.read(move |lists| {
            lists
                .get(&list_id)
                .map(|entries| entries.values().cloned().collect())
                .unwrap_or_default()
        })
        .await
    }

    async fn replace_list(&self, list_id: &str, entries: Vec<MirrorEntry>) -> ResultEngine<()> {
        let list_id = list_id.to_string();
        self.update(move |lists| {
            let entries: BTreeMap<String, MirrorEntry> = entries
                .into_iter()
                .map(|e| (e.item_id.clone(), e))
                .collect();
            if entries.is_empty() {
                lists.remove(&list_id);
            } else {
                lists.insert(list_id, entries);
            }
        })
        .await
    }
}
