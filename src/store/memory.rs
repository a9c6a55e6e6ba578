//! Implements the `DataStore` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a MongoDB cluster.

use crate::model::{MeterReading, StoredReading};
use crate::store::{DataStore, StoreSecrets};
use crate::Result;
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

type Collections = HashMap<String, Vec<StoredReading>>;

/// Every collection ever opened in this process, keyed by `database/collection`. Connections are
/// opened per operation, so the documents must outlive any single `MemoryStore`.
fn collections() -> &'static Mutex<Collections> {
    static COLLECTIONS: OnceLock<Mutex<Collections>> = OnceLock::new();
    COLLECTIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock() -> Result<MutexGuard<'static, Collections>> {
    collections()
        .lock()
        .map_err(|_| anyhow!("The in-memory store is poisoned"))
}

/// A handle onto one in-memory collection.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    key: String,
}

impl MemoryStore {
    /// Opens the collection named by `secrets`. Credentials are not checked.
    pub fn open(secrets: &StoreSecrets) -> Self {
        Self {
            key: format!("{}/{}", secrets.database_name, secrets.collection_name),
        }
    }

    /// Replaces the contents of the collection, bypassing validation. Useful for loading
    /// documents that the app itself would never write.
    pub fn seed(&self, documents: Vec<StoredReading>) -> Result<()> {
        lock()?.insert(self.key.clone(), documents);
        Ok(())
    }
}

#[async_trait::async_trait]
impl DataStore for MemoryStore {
    async fn write(&self, reading: &MeterReading) -> Result<()> {
        let id = Uuid::new_v4().simple().to_string();
        lock()?
            .entry(self.key.clone())
            .or_default()
            .push(StoredReading::new(Some(id), reading.clone()));
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<StoredReading>> {
        Ok(lock()?.get(&self.key).cloned().unwrap_or_default())
    }
}
