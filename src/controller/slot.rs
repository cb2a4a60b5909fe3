use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::core::{Admission, SlotKey};

/// Unit of work for a slot worker; carries its own reply channel.
pub(super) type Job = Box<dyn FnOnce(Arc<Admission>) -> BoxFuture<'static, ()> + Send>;

/// Job addressed to the slot of one featured set.
pub(super) struct Envelope {
    pub slot: SlotKey,
    pub job: Job,
}

/// State of a single featured-set slot.
///
/// The worker runs the slot's jobs one at a time in submission order, so
/// requests against one featured set never interleave.
pub(super) struct SlotState {
    /// Queue of pending jobs (FIFO order).
    pub queue: mpsc::Sender<Job>,

    /// Worker draining the queue.
    pub worker: JoinHandle<()>,
}

impl SlotState {
    /// Spawns the worker of `key`; it stops when `token` is cancelled or the queue closes.
    ///
    /// A job in flight when `token` fires runs to completion.
    pub fn spawn(
        key: SlotKey,
        engine: Arc<Admission>,
        capacity: usize,
        token: CancellationToken,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));

        let worker = tokio::spawn(async move {
            loop {
                let job = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    job = rx.recv() => match job {
                        Some(job) => job,
                        None => break,
                    },
                };
                job(Arc::clone(&engine)).await;
            }
            tracing::debug!(slot = %key, "slot worker stopped");
        });

        Self {
            queue: tx,
            worker,
        }
    }

    /// True while the worker accepts jobs.
    pub fn is_alive(&self) -> bool {
        !self.worker.is_finished() && !self.queue.is_closed()
    }
}
