//! In-memory document store.
//!
//! Stands in for the managed database in the demo and in tests. Besides the
//! [`DocumentStore`] contract it counts writes and can be told to fail writes
//! to chosen collections, so callers can observe "no remote write happened"
//! and exercise persist-failure paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Document, DocumentStore, StoreError};

#[derive(Default)]
struct State {
    /// collection -> id -> (insertion sequence, document)
    collections: HashMap<String, BTreeMap<String, (u64, Document)>>,
    next_seq: u64,
    failing: HashSet<String>,
}

impl State {
    fn check_writable(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "writes to {collection} are failing"
            )));
        }
        Ok(())
    }

    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Process-local [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of acknowledged writes (set, update, add) so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write to `collection` fail with
    /// `StoreError::Unavailable` until [`Self::restore_writes`] is called.
    pub async fn fail_writes(&self, collection: &str) {
        self.state.lock().await.failing.insert(collection.to_owned());
    }

    /// Undo [`Self::fail_writes`] for `collection`.
    pub async fn restore_writes(&self, collection: &str) {
        self.state.lock().await.failing.remove(collection);
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(collection)?;

        let existing = state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|(seq, _)| *seq);
        let seq = match existing {
            Some(seq) => seq,
            None => state.seq(),
        };
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), (seq, data));

        self.record_write();
        Ok(())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(collection)?;

        let (_, doc) = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        doc.extend(partial);

        self.record_write();
        Ok(())
    }

    async fn add_document(&self, collection: &str, data: Document) -> Result<String, StoreError> {
        let mut state = self.state.lock().await;
        state.check_writable(collection)?;

        let id = Uuid::new_v4().simple().to_string();
        let seq = state.seq();
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), (seq, data));

        self.record_write();
        Ok(id)
    }

    async fn list_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let state = self.state.lock().await;
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(u64, String, Document)> = docs
            .iter()
            .map(|(id, (seq, doc))| (*seq, id.clone(), doc.clone()))
            .collect();
        entries.sort_by_key(|(seq, _, _)| *seq);

        Ok(entries.into_iter().map(|(_, id, doc)| (id, doc)).collect())
    }
}
