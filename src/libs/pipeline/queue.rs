use crate::libs::pipeline::{Progress, QueryRecord};
use crossbeam::channel::{SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Raised once to make the loader and every worker return at their next poll
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handed to the loader to enqueue queries.
///
/// Blocks while the queue is full, waking every poll interval to check for shutdown.
pub struct QueryFeeder<'a> {
    tx: Sender<QueryRecord>,
    shutdown: &'a ShutdownFlag,
    progress: &'a Progress,
    poll: Duration,
    next_id: usize,
}

impl<'a> QueryFeeder<'a> {
    pub fn new(
        tx: Sender<QueryRecord>,
        shutdown: &'a ShutdownFlag,
        progress: &'a Progress,
        poll: Duration,
    ) -> Self {
        Self {
            tx,
            shutdown,
            progress,
            poll,
            next_id: 0,
        }
    }

    /// Enqueues one query of encoded bases.
    ///
    /// Returns `false` when the pipeline is shutting down or no worker is left;
    /// the loader should stop then.
    pub fn push(&mut self, name: impl Into<String>, seq: Vec<u8>) -> bool {
        let mut query = QueryRecord {
            id: self.next_id,
            name: name.into(),
            seq,
        };

        loop {
            if self.shutdown.is_raised() {
                return false;
            }
            match self.tx.send_timeout(query, self.poll) {
                Ok(()) => {
                    self.next_id += 1;
                    self.progress.add_loaded();
                    return true;
                }
                Err(SendTimeoutError::Timeout(q)) => query = q,
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }
}
