//! Per-collection bookmark aggregation and cross-collection dedup

use crate::api::RaindropApi;
use crate::client::{Sleeper, Transport};
use crate::error::{ExportError, Result};
use crate::models::bookmark::BookmarkRecord;
use crate::models::collection::CollectionId;
use crate::models::resolved::ResolvedCollection;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Where the bookmarks of a collection come from
pub trait BookmarkSource: Sync {
    /// Untagged bookmarks of one collection; an empty collection is `Ok(vec![])`
    fn fetch_bookmarks(&self, collection: &ResolvedCollection) -> Result<Vec<BookmarkRecord>>;
}

impl<T: Transport, S: Sleeper> BookmarkSource for RaindropApi<T, S> {
    fn fetch_bookmarks(&self, collection: &ResolvedCollection) -> Result<Vec<BookmarkRecord>> {
        self.bookmarks(&collection.id)
    }
}

/// Accumulated, deduplicated bookmarks
///
/// Keyed by the bookmark's own id; the first record seen for an id is kept.
/// Records without an id cannot be matched against anything and are always
/// kept.
#[derive(Debug, Default)]
pub struct DedupState {
    seen: HashSet<String>,
    records: Vec<BookmarkRecord>,
    duplicates: usize,
    without_id: usize,
}

impl DedupState {
    /// Fold step: absorb one record and hand the state back
    pub fn fold(mut self, record: BookmarkRecord) -> Self {
        self.push(record);
        self
    }

    /// Absorb one record, returning whether it was kept
    pub fn push(&mut self, record: BookmarkRecord) -> bool {
        match record.bookmark_id() {
            Some(id) => {
                if self.seen.contains(id) {
                    self.duplicates += 1;
                    return false;
                }
                self.seen.insert(id.to_string());
            }
            None => self.without_id += 1,
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dropped because their id was already seen
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn without_id(&self) -> usize {
        self.without_id
    }

    pub fn into_records(self) -> Vec<BookmarkRecord> {
        self.records
    }
}

/// A collection whose bookmarks could not be fetched
#[derive(Debug)]
pub struct CollectionFailure {
    pub collection_id: CollectionId,
    pub title: String,
    pub error: ExportError,
}

/// Progress notifications, emitted in collection order
#[derive(Debug)]
pub enum AggregateEvent<'a> {
    Processed {
        index: usize,
        total: usize,
        collection: &'a ResolvedCollection,
        /// Records in the collection's export
        fetched: usize,
        /// Records that survived dedup
        kept: usize,
    },
    Skipped {
        index: usize,
        total: usize,
        collection: &'a ResolvedCollection,
        error: &'a ExportError,
    },
}

/// Result of a full aggregation pass
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub bookmarks: Vec<BookmarkRecord>,
    pub failures: Vec<CollectionFailure>,
    pub duplicates: usize,
    pub without_id: usize,
    pub collections: usize,
}

pub struct Aggregator<'s, B: BookmarkSource> {
    source: &'s B,
    workers: usize,
}

impl<'s, B: BookmarkSource> Aggregator<'s, B> {
    pub fn new(source: &'s B) -> Self {
        Self { source, workers: 1 }
    }

    /// Fetch with up to `workers` requests in flight (minimum 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Fetch, tag and deduplicate the bookmarks of every collection
    ///
    /// Per-collection failures are logged, reported and skipped. Terminal
    /// errors (a rejected token) abort the whole pass.
    pub fn run<F>(&self, collections: &[ResolvedCollection], mut observer: F) -> Result<AggregateReport>
    where
        F: FnMut(AggregateEvent<'_>),
    {
        let total = collections.len();
        let mut state = DedupState::default();
        let mut failures = Vec::new();

        info!(
            "Aggregating bookmarks of {} collections ({} worker{})",
            total,
            self.workers,
            if self.workers == 1 { "" } else { "s" }
        );

        if self.workers <= 1 || total <= 1 {
            for (index, collection) in collections.iter().enumerate() {
                let fetched = self.source.fetch_bookmarks(collection);
                absorb(index, total, collection, fetched, &mut state, &mut failures, &mut observer)?;
            }
        } else {
            let slots = self.fetch_concurrently(collections);
            for (index, (collection, slot)) in collections.iter().zip(slots).enumerate() {
                // Unfetched slots only follow a terminal error, which returns first
                let Some(fetched) = slot else { break };
                absorb(index, total, collection, fetched, &mut state, &mut failures, &mut observer)?;
            }
        }

        let report = AggregateReport {
            duplicates: state.duplicates(),
            without_id: state.without_id(),
            collections: total,
            bookmarks: state.into_records(),
            failures,
        };
        info!(
            "Aggregated {} bookmarks ({} duplicates dropped, {} collections failed)",
            report.bookmarks.len(),
            report.duplicates,
            report.failures.len()
        );
        Ok(report)
    }

    /// Fetch every collection on a bounded pool of scoped threads
    ///
    /// Workers take collections in index order and stop picking new ones
    /// once a terminal error shows up.
    fn fetch_concurrently(
        &self,
        collections: &[ResolvedCollection],
    ) -> Vec<Option<Result<Vec<BookmarkRecord>>>> {
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let slots: Vec<Mutex<Option<Result<Vec<BookmarkRecord>>>>> =
            collections.iter().map(|_| Mutex::new(None)).collect();
        let workers = self.workers.min(collections.len());

        thread::scope(|scope| {
            for worker in 0..workers {
                let (next, stop, slots) = (&next, &stop, &slots);
                scope.spawn(move || loop {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(collection) = collections.get(index) else {
                        break;
                    };
                    debug!("Worker {} fetching collection {}", worker, collection.id);
                    let result = self.source.fetch_bookmarks(collection);
                    if matches!(&result, Err(e) if e.is_terminal()) {
                        stop.store(true, Ordering::SeqCst);
                    }
                    if let Ok(mut slot) = slots[index].lock() {
                        *slot = Some(result);
                    }
                });
            }
        });

        slots
            .into_iter()
            .map(|slot| slot.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
            .collect()
    }
}

fn absorb<F>(
    index: usize,
    total: usize,
    collection: &ResolvedCollection,
    fetched: Result<Vec<BookmarkRecord>>,
    state: &mut DedupState,
    failures: &mut Vec<CollectionFailure>,
    observer: &mut F,
) -> Result<()>
where
    F: FnMut(AggregateEvent<'_>),
{
    match fetched {
        Ok(records) => {
            let count = records.len();
            let before = state.len();
            *state = records
                .into_iter()
                .map(|mut record| {
                    record.tag(collection);
                    record
                })
                .fold(std::mem::take(state), DedupState::fold);
            let kept = state.len() - before;

            info!(
                "[{}/{}] {} - {} bookmarks ({} new)",
                index + 1,
                total,
                collection.full_path,
                count,
                kept
            );
            observer(AggregateEvent::Processed {
                index,
                total,
                collection,
                fetched: count,
                kept,
            });
            Ok(())
        }
        Err(e) if e.is_terminal() => {
            error!(
                "Aborting at collection {} ({}): {}",
                collection.id, collection.full_path, e
            );
            Err(e)
        }
        Err(e) => {
            match e.status() {
                Some(status) => error!(
                    "Skipping collection {} ({}) after HTTP {}: {}",
                    collection.id, collection.full_path, status, e
                ),
                None => error!(
                    "Skipping collection {} ({}): {}",
                    collection.id, collection.full_path, e
                ),
            }
            observer(AggregateEvent::Skipped {
                index,
                total,
                collection,
                error: &e,
            });
            failures.push(CollectionFailure {
                collection_id: collection.id.clone(),
                title: collection.title.clone(),
                error: e,
            });
            if failures.len() == total {
                warn!("Every collection failed to export");
            }
            Ok(())
        }
    }
}
