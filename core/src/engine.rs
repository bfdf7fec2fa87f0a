//! Query engine façade.
//!
//! Owns the active [`Snapshot`] behind an `Arc`. Queries clone the pointer
//! under a read lock and then run lock-free; loads validate first and publish
//! with a single pointer swap, so a query never observes a mix of two
//! snapshots.

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::index::{Document, ObjectEntry, Snapshot};
use crate::raw::RawIndex;
use crate::scorer::Ranker;
use crate::tokenizer::Tokenizer;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
    /// API objects in this document that matched the query.
    pub objects: Vec<ObjectEntry>,
}

pub struct Engine {
    active: RwLock<Option<Arc<Snapshot>>>,
    loading: Mutex<()>,
    tokenizer: Tokenizer,
    ranker: Ranker,
    config: SearchConfig,
}

impl Engine {
    /// Create an engine with no snapshot loaded.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: SearchConfig) -> Self {
        Self {
            active: RwLock::new(None),
            loading: Mutex::new(()),
            tokenizer: Tokenizer::new(config.tokenizer),
            ranker: Ranker::new(config.weights, config.prefix_min_len),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Replace the active snapshot. On error the previous snapshot stays.
    pub fn load_index(&self, snapshot: Snapshot) -> Result<()> {
        let _guard = self.loading.lock();
        if let Err(err) = snapshot.validate() {
            warn!(%err, "rejected index snapshot");
            return Err(err);
        }
        let (num_docs, num_terms) = (snapshot.num_docs(), snapshot.num_terms());
        *self.active.write() = Some(Arc::new(snapshot));
        info!(num_docs, num_terms, "index snapshot loaded");
        Ok(())
    }

    /// Validate a raw index and make it the active snapshot.
    pub fn load_raw(&self, raw: RawIndex) -> Result<()> {
        let snapshot = Snapshot::load(raw).inspect_err(|err| warn!(%err, "rejected raw index"))?;
        self.load_index(snapshot)
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.active.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.active.read().is_some()
    }

    /// Ranked documents matching every term of `query`. An empty query, or
    /// one with no usable terms, yields no results.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.run(query, || false)
    }

    /// [`Engine::search`] that gives up with [`Error::Cancelled`] once
    /// `cancel` is set. The flag is checked between terms.
    pub fn search_cancellable(&self, query: &str, cancel: &AtomicBool) -> Result<Vec<SearchResult>> {
        self.run(query, || cancel.load(Ordering::Relaxed))
    }

    fn run(&self, query: &str, should_stop: impl FnMut() -> bool) -> Result<Vec<SearchResult>> {
        let snapshot = self.snapshot().ok_or(Error::IndexNotLoaded)?;
        let start = Instant::now();
        let parsed = self.tokenizer.parse(query);
        if parsed.is_empty() {
            debug!(query, "query has no searchable terms");
            return Ok(Vec::new());
        }

        let hits = self
            .ranker
            .rank_until(&parsed.required, &parsed.excluded, &snapshot, should_stop)
            .ok_or(Error::Cancelled)?;

        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|hit| {
                let document = snapshot.document(hit.doc_id)?.clone();
                let objects = hit.objects.into_iter().cloned().collect();
                Some(SearchResult { document, score: hit.score, objects })
            })
            .collect();

        debug!(
            query,
            terms = parsed.required.len(),
            excluded = parsed.excluded.len(),
            hits = results.len(),
            took_us = start.elapsed().as_micros() as u64,
            "search complete"
        );
        Ok(results)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(SearchConfig::default())
    }
}
