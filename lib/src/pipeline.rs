//! The full export run: discovery, resolution, aggregation, output

use crate::aggregate::{AggregateEvent, Aggregator, CollectionFailure};
use crate::api::RaindropApi;
use crate::client::{Sleeper, Transport};
use crate::error::{ExportError, Result};
use crate::export;
use crate::hierarchy::{self, CollectionGraph, GroupIndex, ResolvedSet};
use log::info;
use std::path::{Path, PathBuf};

/// Collection tree and group labels fetched at the start of a run
pub struct Discovery {
    pub graph: CollectionGraph,
    pub groups: GroupIndex,
}

/// Fetch root collections, child collections and groups
///
/// Any failure here is fatal: without the tree there is nothing to resolve.
pub fn discover<T: Transport, S: Sleeper>(api: &RaindropApi<T, S>) -> Result<Discovery> {
    let roots = api.root_collections()?;
    let children = api.child_collections()?;
    let groups = api.groups()?;

    Ok(Discovery {
        graph: CollectionGraph::build(&roots, &children),
        groups: GroupIndex::from_groups(&groups),
    })
}

/// What a run produced
#[derive(Debug)]
pub struct RunSummary {
    pub collections_path: PathBuf,
    pub collections_written: usize,
    pub bookmarks_path: Option<PathBuf>,
    pub bookmarks_written: usize,
    pub duplicates: usize,
    pub failures: Vec<CollectionFailure>,
    pub cycles: Vec<ExportError>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.cycles.is_empty()
    }
}

/// Options of [`run_export`]
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub workers: usize,
}

impl RunOptions {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            workers: 1,
        }
    }
}

/// Resolve the discovered tree and write the collections table
pub fn resolve_and_write(discovery: &Discovery, output_dir: &Path) -> Result<(ResolvedSet, PathBuf)> {
    let resolved = hierarchy::resolve_all(&discovery.graph, &discovery.groups);
    let path = export::write_collections(&resolved.collections, output_dir)?;
    Ok((resolved, path))
}

/// Run a complete export, reporting per-collection progress to `observer`
///
/// `on_resolved` is told how many collections will be fetched before the
/// first bookmark request goes out.
pub fn run_export<T, S, R, F>(
    api: &RaindropApi<T, S>,
    options: &RunOptions,
    on_resolved: R,
    observer: F,
) -> Result<RunSummary>
where
    T: Transport,
    S: Sleeper,
    R: FnOnce(usize),
    F: FnMut(AggregateEvent<'_>),
{
    let discovery = discover(api)?;
    let (resolved, collections_path) = resolve_and_write(&discovery, &options.output_dir)?;
    on_resolved(resolved.collections.len());

    let report = Aggregator::new(api)
        .with_workers(options.workers)
        .run(&resolved.collections, observer)?;
    let bookmarks_path = export::write_bookmarks(&report.bookmarks, &options.output_dir)?;

    info!(
        "Export finished: {} collections, {} bookmarks",
        resolved.collections.len(),
        report.bookmarks.len()
    );

    Ok(RunSummary {
        collections_path,
        collections_written: resolved.collections.len(),
        bookmarks_path,
        bookmarks_written: report.bookmarks.len(),
        duplicates: report.duplicates,
        failures: report.failures,
        cycles: resolved.cycles,
    })
}
