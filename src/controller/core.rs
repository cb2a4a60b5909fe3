use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{Ack, Admission, AdmissionPlan, AdmissionResult, Config, Progress, SlotKey},
    documents::{DocumentType, FeaturedDoc, Member, Transition},
    error::AdmissionError,
    events::Bus,
    subscribers::SubscriberSet,
};

use super::{
    builder::ControllerBuilder,
    config::ControllerConfig,
    error::{ControllerError, SubmitError},
    request::{Outcome, Request},
    slot::{Envelope, Job, SlotState},
};
use crate::store::DocumentStore;

/// Handle for submitting requests to the controller.
///
/// Cheap to clone; every clone feeds the same submission queue.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Envelope>,
    cfg: Arc<Config>,
}

/// Pending reply of a request accepted by [`ControllerHandle::try_submit`].
pub struct Ticket<T> {
    rx: oneshot::Receiver<Result<T, AdmissionError>>,
}

impl<T> Ticket<T> {
    /// Waits for the slot worker to finish the request.
    pub async fn wait(self) -> Result<T, ControllerError> {
        let res = self.rx.await.map_err(|_| SubmitError::Closed)?;
        Ok(res?)
    }
}

impl ControllerHandle {
    /// Submit a request (async, waits if the queue is full) and await its outcome.
    pub async fn submit(&self, request: Request) -> Result<Outcome, ControllerError> {
        let slot = request.slot(&self.cfg);
        self.call(slot, move |engine| async move { request.run(&engine).await })
            .await
    }

    /// Try to submit without blocking (fails if queue full).
    pub fn try_submit(&self, request: Request) -> Result<Ticket<Outcome>, SubmitError> {
        let slot = request.slot(&self.cfg);
        let (job, ticket) = job(move |engine| async move { request.run(&engine).await });
        self.tx
            .try_send(Envelope { slot, job })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::Full,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            })?;
        Ok(ticket)
    }

    /// Features `raw_id`, evicting the oldest member(s) if its set is full.
    pub async fn request_feature(
        &self,
        raw_id: &str,
        doc_type: impl Into<DocumentType>,
    ) -> Result<AdmissionResult, ControllerError> {
        let id = raw_id.to_string();
        let doc_type = doc_type.into();
        let slot = self.cfg.slot_key(Some(&doc_type));
        self.call(slot, move |engine| async move {
            engine.request_feature(&id, &doc_type).await
        })
        .await
    }

    /// Un-features `raw_id`. Idempotent.
    pub async fn request_unfeature(&self, raw_id: &str) -> Result<Ack, ControllerError> {
        let id = raw_id.to_string();
        self.call(SlotKey::Global, move |engine| async move {
            engine.request_unfeature(&id).await
        })
        .await
    }

    /// Plans the admission of `raw_id` without writing.
    pub async fn preview(
        &self,
        raw_id: &str,
        doc_type: impl Into<DocumentType>,
    ) -> Result<AdmissionPlan, ControllerError> {
        let id = raw_id.to_string();
        let doc_type = doc_type.into();
        let slot = self.cfg.slot_key(Some(&doc_type));
        self.call(slot, move |engine| async move { engine.preview(&id, &doc_type).await })
            .await
    }

    /// Finishes a request whose evictions committed but whose admit step failed.
    ///
    /// The set is re-planned first, so requests served since then cannot push it
    /// over capacity.
    pub async fn resume(&self, progress: Progress) -> Result<AdmissionResult, ControllerError> {
        let slot = self.cfg.slot_key(progress.doc_type.as_ref());
        self.call(slot, move |engine| async move { engine.resume(progress).await })
            .await
    }

    /// Current members of `doc_type`'s featured set, oldest first.
    pub async fn featured(
        &self,
        doc_type: impl Into<DocumentType>,
    ) -> Result<Vec<Member>, ControllerError> {
        let doc_type = doc_type.into();
        let slot = self.cfg.slot_key(Some(&doc_type));
        self.call(slot, move |engine| async move { engine.featured(&doc_type).await })
            .await
    }

    /// Reacts to a saved record: a `featured` flip runs the matching request.
    ///
    /// Returns `Ok(None)` when the flag did not change or the type is not eligible.
    pub async fn on_document_saved(
        &self,
        before: Option<&FeaturedDoc>,
        after: &FeaturedDoc,
    ) -> Result<Option<Outcome>, ControllerError> {
        if !self.cfg.is_eligible(&after.doc_type) {
            return Ok(None);
        }

        let request = match Transition::between(before, after) {
            Some(Transition::Featured) => Request::feature(after.id.clone(), after.doc_type.clone()),
            Some(Transition::Unfeatured) => Request::Unfeature {
                id: after.id.clone(),
                doc_type: Some(after.doc_type.clone()),
            },
            None => return Ok(None),
        };
        self.submit(request).await.map(Some)
    }

    async fn call<T, F, Fut>(&self, slot: SlotKey, f: F) -> Result<T, ControllerError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Admission>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AdmissionError>> + Send + 'static,
    {
        let (job, ticket) = job(f);
        self.tx
            .send(Envelope { slot, job })
            .await
            .map_err(|_| SubmitError::Closed)?;
        ticket.wait().await
    }
}

/// Packs `f` into a slot job whose result lands in the returned ticket.
fn job<T, F, Fut>(f: F) -> (Job, Ticket<T>)
where
    T: Send + 'static,
    F: FnOnce(Arc<Admission>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, AdmissionError>> + Send + 'static,
{
    let (reply, rx) = oneshot::channel();
    let job: Job = Box::new(move |engine| {
        Box::pin(async move {
            if reply.send(f(engine).await).is_err() {
                tracing::debug!("requester went away before the reply");
            }
        })
    });
    (job, Ticket { rx })
}

/// Controller serializes requests per featured set.
///
/// Every request is routed to the slot of the set it touches
/// ([`SlotKey::Global`] or one slot per type). Each slot has one worker that
/// runs its requests one at a time, so two admissions into the same set never
/// interleave. Different slots run in parallel.
///
/// ```text
/// handle.request_feature() ─► [submission queue] ─► run loop
///                                                     │ slot_key(type)
///                                   ┌─────────────────┼─────────────────┐
///                                   ▼                 ▼                 ▼
///                            [slot "global"]   [slot "type:a"]   [slot "type:b"]
///                                   │                 │                 │
///                               worker (FIFO)     worker (FIFO)     worker (FIFO)
///                                   └────────► Admission ◄──────────────┘
/// ```
pub struct Controller {
    config: ControllerConfig,
    cfg: Arc<Config>,
    engine: Arc<Admission>,
    bus: Bus,
    subs: Arc<SubscriberSet>,

    slots: RwLock<HashMap<SlotKey, SlotState>>,

    tx: mpsc::Sender<Envelope>,
    token: CancellationToken,
}

impl Controller {
    /// Starts building a controller over `store`.
    pub fn builder(cfg: Config, store: Arc<dyn DocumentStore>) -> ControllerBuilder {
        ControllerBuilder::new(cfg, store)
    }

    /// Creates the controller and spawns its loops.
    ///
    /// Must be called inside a Tokio runtime.
    pub(super) fn start(
        config: ControllerConfig,
        engine: Arc<Admission>,
        bus: Bus,
        subs: Arc<SubscriberSet>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let cfg = Arc::new(engine.config().clone());

        let controller = Arc::new(Self {
            config,
            cfg,
            engine,
            bus,
            subs,
            slots: RwLock::new(HashMap::new()),
            tx,
            token: CancellationToken::new(),
        });

        controller.subscriber_listener();
        Arc::clone(&controller).run(rx);
        controller
    }

    /// Returns a handle for submitting requests.
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.tx.clone(),
            cfg: Arc::clone(&self.cfg),
        }
    }

    /// Featured-set configuration in use.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus; subscribe to observe requests as they run.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Slots that currently have a live worker.
    pub async fn active_slots(&self) -> Vec<SlotKey> {
        let slots = self.slots.read().await;
        let mut keys: Vec<SlotKey> = slots
            .iter()
            .filter(|(_, s)| s.is_alive())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort_by_key(|k| k.to_string());
        keys
    }

    /// Stops accepting requests. Requests already running finish; queued ones
    /// are dropped and their callers see [`SubmitError::Closed`].
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Starts the controller loop (spawns in background).
    fn run(self: Arc<Self>, mut rx: mpsc::Receiver<Envelope>) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => break,

                    env = rx.recv() => match env {
                        Some(env) => self.dispatch(env).await,
                        None => break,
                    },
                }
            }

            self.slots.write().await.clear();
            tracing::debug!("controller loop stopped");
        });
    }

    /// Hands a job to its slot worker, spawning the worker on first use.
    ///
    /// A full slot queue holds the loop until the worker catches up.
    async fn dispatch(&self, env: Envelope) {
        let Envelope { slot: key, job } = env;

        let queue = {
            let mut slots = self.slots.write().await;
            let slot = slots
                .entry(key.clone())
                .and_modify(|slot| {
                    if !slot.is_alive() {
                        *slot = self.spawn_slot(&key);
                    }
                })
                .or_insert_with(|| self.spawn_slot(&key));
            slot.queue.clone()
        };

        if queue.send(job).await.is_err() {
            tracing::warn!(slot = %key, "slot worker closed; request dropped");
        }
    }

    fn spawn_slot(&self, key: &SlotKey) -> SlotState {
        tracing::debug!(slot = %key, "starting slot worker");
        SlotState::spawn(
            key.clone(),
            Arc::clone(&self.engine),
            self.config.slot_queue_capacity,
            self.token.child_token(),
        )
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let token = self.token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,

                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged; events lost");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }
}
