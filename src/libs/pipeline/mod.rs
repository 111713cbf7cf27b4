//! Concurrent query alignment: one loader thread feeds a bounded queue drained by
//! a pool of workers, each seeding and chaining whole queries against a shared index.

pub mod aligner;
pub mod progress;
pub mod queue;

pub use aligner::QueryAligner;
pub use progress::{tick_progress, PipelineSummary, Progress};
pub use queue::{QueryFeeder, ShutdownFlag};

use crate::libs::chaining::{AlignPath, ChainScoring};
use crate::libs::nt::AlignStrand;
use crate::libs::sfx::{NearExactParams, SfxError, SuffixIndex};
use anyhow::anyhow;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::Mutex;
use std::time::Duration;

pub const MAX_WORKER_THREADS: usize = 128;

/// Queries longer than this are truncated
pub const MAX_QUERY_LEN: usize = 0x0200000 * 8;

/// Everything that tunes one alignment run
#[derive(Debug, Clone)]
pub struct AlignConfig {
    pub seeds: NearExactParams,
    pub scoring: ChainScoring,
    pub strand: AlignStrand,
    pub threads: usize,
    pub queue_capacity: usize,
    /// Seed nodes kept per query
    pub max_nodes: usize,
    pub max_query_len: usize,
    /// How long blocked threads wait before re-checking for shutdown
    pub poll_interval: Duration,
    pub progress_interval: Duration,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            seeds: NearExactParams::default(),
            scoring: ChainScoring::default(),
            strand: AlignStrand::Both,
            threads: default_threads(),
            queue_capacity: 4000,
            max_nodes: 200_000,
            max_query_len: MAX_QUERY_LEN,
            poll_interval: Duration::from_millis(50),
            progress_interval: Duration::from_secs(60),
        }
    }
}

impl AlignConfig {
    pub fn worker_threads(&self) -> usize {
        self.threads.clamp(1, MAX_WORKER_THREADS)
    }
}

/// Available CPUs, at most [`MAX_WORKER_THREADS`]
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map_or(1, |n| n.get())
        .min(MAX_WORKER_THREADS)
}

/// A query as it travels through the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    /// Load order, starting at 0
    pub id: usize,
    pub name: String,
    /// Encoded bases
    pub seq: Vec<u8>,
}

/// Receives the paths of each finished query. Called concurrently from all workers.
pub trait Reporter<R>: Sync {
    fn report(
        &self,
        index: &SuffixIndex<R>,
        query: &QueryRecord,
        paths: &[AlignPath],
    ) -> anyhow::Result<()>;
}

/// Aligns every query pushed by `loader` and hands the results to `reporter`.
///
/// The loader runs on its own thread and should stop once [`QueryFeeder::push`]
/// returns `false`. Raising `shutdown` stops loading and processing; queued queries are
/// dropped. A query that fails to align is logged and counted with zero paths. A
/// reporter error stops the pipeline and is returned, as is a loader error.
pub fn run<R, L, P>(
    index: &SuffixIndex<R>,
    config: &AlignConfig,
    shutdown: &ShutdownFlag,
    loader: L,
    reporter: &P,
) -> anyhow::Result<PipelineSummary>
where
    R: Sync,
    L: FnOnce(&mut QueryFeeder) -> anyhow::Result<()> + Send,
    P: Reporter<R> + ?Sized,
{
    if !index.is_built() {
        return Err(SfxError::NotBuilt.into());
    }

    let threads = config.worker_threads();
    let (tx, rx) = bounded::<QueryRecord>(config.queue_capacity.max(1));
    let progress = Progress::new();
    let failure: Mutex<Option<anyhow::Error>> = Mutex::new(None);
    log::info!("Aligning with {} worker threads", threads);

    let (panicked, loaded) = crossbeam::scope(|s| {
        let progress = &progress;
        let failure = &failure;
        let (done_tx, done_rx) = bounded::<()>(0);

        //----------------------------
        // Loader thread
        //----------------------------
        let loader_handle = s.spawn(move |_| {
            let mut feeder = QueryFeeder::new(tx, shutdown, progress, config.poll_interval);
            loader(&mut feeder)
        });

        //----------------------------
        // Progress ticker
        //----------------------------
        s.spawn(move |_| tick_progress(progress, done_rx, config.progress_interval));

        //----------------------------
        // Worker threads
        //----------------------------
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let rx = rx.clone();
                s.spawn(move |_| work(index, config, rx, shutdown, progress, reporter, failure))
            })
            .collect();
        drop(rx);

        let panicked = workers
            .into_iter()
            .map(|h| h.join())
            .filter(Result::is_err)
            .count();
        if panicked > 0 {
            shutdown.raise();
        }
        drop(done_tx);

        (panicked, loader_handle.join())
    })
    .map_err(|_| anyhow!("query pipeline thread panicked"))?;

    if panicked > 0 {
        return Err(anyhow!("{} worker thread(s) panicked", panicked));
    }
    let loaded = loaded.map_err(|_| anyhow!("query loader panicked"))?;

    let failure = failure
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(err) = failure {
        return Err(err.context("could not report alignments"));
    }
    loaded.map_err(|err| err.context("could not load queries"))?;

    let summary = progress.snapshot();
    if summary.processed < summary.loaded {
        log::warn!(
            "Stopped early: {} of {} queries processed",
            summary.processed,
            summary.loaded
        );
    }
    log::info!(
        "Processed {} queries, {} with paths, {} paths reported",
        summary.processed,
        summary.queries_with_paths,
        summary.paths
    );
    Ok(summary)
}

// Worker loop: dequeue, align, report, until the queue closes or shutdown is raised
fn work<R, P>(
    index: &SuffixIndex<R>,
    config: &AlignConfig,
    rx: Receiver<QueryRecord>,
    shutdown: &ShutdownFlag,
    progress: &Progress,
    reporter: &P,
    failure: &Mutex<Option<anyhow::Error>>,
) where
    P: Reporter<R> + ?Sized,
{
    let mut aligner = QueryAligner::new(index, config);

    while !shutdown.is_raised() {
        let mut query = match rx.recv_timeout(config.poll_interval) {
            Ok(query) => query,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if query.seq.len() > config.max_query_len {
            log::warn!(
                "Query {} is {} bases long, truncating to {}",
                query.name,
                query.seq.len(),
                config.max_query_len
            );
            query.seq.truncate(config.max_query_len);
        }

        let paths = match aligner.align(&query.seq) {
            Ok(paths) => paths,
            Err(err) => {
                log::warn!("Unable to align query {}: {}", query.name, err);
                vec![]
            }
        };
        match paths.first() {
            Some(best) => log::debug!(
                "Query {}: {} paths, best score {} identity {:.3}",
                query.name,
                paths.len(),
                best.score,
                best.identity()
            ),
            None => log::debug!("Query {}: no paths", query.name),
        }

        if let Err(err) = reporter.report(index, &query, &paths) {
            let mut slot = failure
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.get_or_insert(err);
            shutdown.raise();
            break;
        }
        progress.add_processed(paths.len());
    }
}
