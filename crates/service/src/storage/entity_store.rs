use std::{collections::BTreeMap, io, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "V: Serialize", deserialize = "V: DeserializeOwned"))]
struct Snapshot<V> {
    next_id: i64,
    items: BTreeMap<i64, V>,
}

impl<V> Default for Snapshot<V> {
    fn default() -> Self {
        Self { next_id: 1, items: BTreeMap::new() }
    }
}

/// Result of a guarded write.
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<V> {
    Applied(V),
    /// No entity with that id.
    Missing,
    /// Another entity matched the conflict predicate; nothing was written.
    Refused,
}

/// Id-keyed entity table with server-assigned, strictly increasing ids.
///
/// Entries are kept ordered by id, so listing is stable between mutations. When opened
/// with a path, every mutation rewrites the JSON file while the write lock is held, and the
/// change becomes visible only once that write succeeded.
pub struct EntityStore<V> {
    inner: RwLock<Snapshot<V>>,
    file_path: Option<PathBuf>,
}

impl<V> EntityStore<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self { inner: RwLock::new(Snapshot::default()), file_path: None })
    }

    /// Load the table from `path`, creating an empty file if missing.
    ///
    /// A file that exists but cannot be read or parsed is an error; it is never replaced.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        }

        let snapshot = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("corrupt entity file {}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let empty = Snapshot::<V>::default();
                write_snapshot(&file_path, &empty).await?;
                empty
            }
            Err(e) => {
                return Err(ServiceError::Storage(format!("read {}: {e}", file_path.display())));
            }
        };

        Ok(Arc::new(Self { inner: RwLock::new(snapshot), file_path: Some(file_path) }))
    }

    async fn save(&self, snapshot: &Snapshot<V>) -> Result<(), ServiceError> {
        match &self.file_path {
            Some(path) => write_snapshot(path, snapshot).await,
            None => Ok(()),
        }
    }

    /// All entities ordered by id.
    pub async fn list(&self) -> Vec<V> {
        let snap = self.inner.read().await;
        snap.items.values().cloned().collect()
    }

    pub async fn get(&self, id: i64) -> Option<V> {
        let snap = self.inner.read().await;
        snap.items.get(&id).cloned()
    }

    /// Persist `next`, then make it the current table.
    async fn commit(&self, current: &mut Snapshot<V>, next: Snapshot<V>) -> Result<(), ServiceError> {
        self.save(&next).await?;
        *current = next;
        Ok(())
    }

    /// Allocate the next id, build the entity from it and persist.
    pub async fn insert_with<F>(&self, build: F) -> Result<V, ServiceError>
    where
        F: FnOnce(i64) -> V,
    {
        let mut snap = self.inner.write().await;
        let (next, value) = with_inserted(&*snap, build);
        self.commit(&mut *snap, next).await?;
        Ok(value)
    }

    /// Insert unless a stored entity matches `conflicts`; check and insert share one write lock.
    pub async fn insert_unless<P, F>(&self, conflicts: P, build: F) -> Result<Guarded<V>, ServiceError>
    where
        P: Fn(&V) -> bool,
        F: FnOnce(i64) -> V,
    {
        let mut snap = self.inner.write().await;
        if snap.items.values().any(conflicts) {
            return Ok(Guarded::Refused);
        }
        let (next, value) = with_inserted(&*snap, build);
        self.commit(&mut *snap, next).await?;
        Ok(Guarded::Applied(value))
    }

    /// Mutate an existing entity; `None` when the id is unknown.
    pub async fn update_with<F>(&self, id: i64, apply: F) -> Result<Option<V>, ServiceError>
    where
        F: FnOnce(&mut V),
    {
        match self.update_unless(id, |_| false, apply).await? {
            Guarded::Applied(value) => Ok(Some(value)),
            Guarded::Missing | Guarded::Refused => Ok(None),
        }
    }

    /// Mutate entity `id` unless another entity matches `conflicts`.
    /// An unknown id is reported before any conflict.
    pub async fn update_unless<P, F>(&self, id: i64, conflicts: P, apply: F) -> Result<Guarded<V>, ServiceError>
    where
        P: Fn(&V) -> bool,
        F: FnOnce(&mut V),
    {
        let mut snap = self.inner.write().await;
        if !snap.items.contains_key(&id) {
            return Ok(Guarded::Missing);
        }
        if snap.items.iter().any(|(other, v)| *other != id && conflicts(v)) {
            return Ok(Guarded::Refused);
        }
        let mut next = snap.clone();
        let Some(existing) = next.items.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        apply(existing);
        let updated = existing.clone();
        self.commit(&mut *snap, next).await?;
        Ok(Guarded::Applied(updated))
    }

    /// Remove and return the entity; `None` when the id is unknown.
    pub async fn remove(&self, id: i64) -> Result<Option<V>, ServiceError> {
        let mut snap = self.inner.write().await;
        if !snap.items.contains_key(&id) {
            return Ok(None);
        }
        let mut next = snap.clone();
        let removed = next.items.remove(&id);
        self.commit(&mut *snap, next).await?;
        Ok(removed)
    }
}

fn with_inserted<V: Clone, F: FnOnce(i64) -> V>(snap: &Snapshot<V>, build: F) -> (Snapshot<V>, V) {
    let mut next = snap.clone();
    let id = next.next_id;
    let value = build(id);
    next.items.insert(id, value.clone());
    next.next_id = id + 1;
    (next, value)
}

async fn write_snapshot<V: Serialize>(path: &PathBuf, snapshot: &Snapshot<V>) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(snapshot).map_err(|e| ServiceError::Storage(e.to_string()))?;
    fs::write(path, data).await.map_err(|e| ServiceError::Storage(e.to_string()))
}
