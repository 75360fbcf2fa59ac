//! Explicit service context shared by every client.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::Result;
use crate::models::{List, Note};
use crate::services::{ConnectivityProbe, HttpProbe, RecordStore, SyncJournal, TrashBin};
use crate::storage::{Collection, KeyValueStore, LISTS_KEY, NOTES_KEY};
use crate::transfer::Transfer;

/// Every service wired to one store.
///
/// Build one per process and hand it (or its fields) to whatever needs
/// them. The record store, trash and transfer share the same per-key
/// collections, so their writes to a key never interleave.
pub struct AppContext<S> {
    pub store: Arc<S>,
    pub config: CoreConfig,
    pub records: Arc<RecordStore<S>>,
    pub trash: Arc<TrashBin<S>>,
    pub journal: Arc<SyncJournal<S>>,
    pub transfer: Arc<Transfer<S>>,
}

impl<S: KeyValueStore> AppContext<S> {
    /// Wire services over `store`, probing connectivity over HTTP
    pub fn new(store: Arc<S>, config: CoreConfig) -> Result<Self> {
        let config = config.validate()?;
        let probe = Arc::new(HttpProbe::from_config(&config)?);
        Ok(Self::with_probe(store, config, probe))
    }

    /// Wire services with a caller-supplied connectivity probe
    pub fn with_probe(
        store: Arc<S>,
        config: CoreConfig,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        let lists = Arc::new(Collection::<S, List>::new(Arc::clone(&store), LISTS_KEY));
        let notes = Arc::new(Collection::<S, Note>::new(Arc::clone(&store), NOTES_KEY));
        let journal = Arc::new(SyncJournal::new(Arc::clone(&store), probe));
        let trash = Arc::new(TrashBin::new(
            Arc::clone(&store),
            Arc::clone(&lists),
            Arc::clone(&notes),
            Arc::clone(&journal),
        ));
        let records = Arc::new(RecordStore::new(
            lists,
            notes,
            Arc::clone(&trash),
            Arc::clone(&journal),
        ));
        let transfer = Arc::new(Transfer::new(
            Arc::clone(&records),
            Arc::clone(&journal),
            config.export_version.clone(),
        ));

        tracing::debug!("Service context ready");
        Self {
            store,
            config,
            records,
            trash,
            journal,
            transfer,
        }
    }
}
