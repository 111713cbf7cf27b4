use crossbeam::channel::Receiver;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Counters shared by the loader and the workers
#[derive(Debug, Default)]
pub struct Progress {
    loaded: AtomicUsize,
    processed: AtomicUsize,
    paths: AtomicUsize,
    queries_with_paths: AtomicUsize,
}

/// Point-in-time copy of [`Progress`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub loaded: usize,
    pub processed: usize,
    pub paths: usize,
    pub queries_with_paths: usize,
}

impl Progress {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_loaded(&self) {
        self.loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// One query finished with `paths` reported paths
    pub fn add_processed(&self, paths: usize) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if paths > 0 {
            self.paths.fetch_add(paths, Ordering::Relaxed);
            self.queries_with_paths.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> PipelineSummary {
        PipelineSummary {
            loaded: self.loaded.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            paths: self.paths.load(Ordering::Relaxed),
            queries_with_paths: self.queries_with_paths.load(Ordering::Relaxed),
        }
    }
}

/// Logs the counters every `interval` until `done` is closed
pub fn tick_progress(progress: &Progress, done: Receiver<()>, interval: Duration) {
    let ticker = crossbeam::channel::tick(interval);
    loop {
        crossbeam::channel::select! {
            recv(ticker) -> _ => {
                let s = progress.snapshot();
                log::info!(
                    "Progress: {} queries loaded, {} processed, {} with paths, {} paths",
                    s.loaded,
                    s.processed,
                    s.queries_with_paths,
                    s.paths
                );
            }
            recv(done) -> _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters() {
        let progress = Progress::new();
        progress.add_loaded();
        progress.add_loaded();
        progress.add_processed(0);
        progress.add_processed(3);
        assert_eq!(
            progress.snapshot(),
            PipelineSummary {
                loaded: 2,
                processed: 2,
                paths: 3,
                queries_with_paths: 1,
            }
        );
    }

    #[test]
    fn ticker_stops_on_close() {
        let progress = Progress::new();
        let (tx, rx) = crossbeam::channel::bounded::<()>(0);
        let handle = std::thread::spawn(move || {
            tick_progress(&progress, rx, Duration::from_millis(1));
        });
        std::thread::sleep(Duration::from_millis(10));
        drop(tx);
        handle.join().unwrap();
    }
}
