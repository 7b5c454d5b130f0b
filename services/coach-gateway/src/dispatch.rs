//! Dispatch boundary between the UI-owning task and background gateway calls
//!
//! Calls run on tokio worker tasks. Each call hands exactly one `Completion`
//! back over a channel owned by the `UiContext`, and only the task holding the
//! `UiContext` applies completions to UI state. The set of disabled affordances
//! lives here, on the UI side. The gateway itself runs any number of distinct
//! calls in parallel.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::gateway::{Gateway, Operation, Reply};

/// The UI affordance a call was triggered from, e.g. `"assessment.submit"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Origin {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a call ended
#[derive(Debug)]
pub enum Delivery {
    Completed(crate::Result<Reply>),
    /// Cancelled through its ticket or by shutdown
    Cancelled,
    /// The worker panicked or was torn down before producing a result
    Aborted,
}

/// The single hand-off for one call
#[derive(Debug)]
pub struct Completion {
    pub id: u64,
    pub origin: Origin,
    pub operation: &'static str,
    pub delivery: Delivery,
}

/// Handle to an outstanding call
#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    origin: Origin,
    cancel: CancellationToken,
}

impl Ticket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Ask the worker to stop; the completion arrives as `Delivery::Cancelled`
    /// unless the call already finished
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("'{0}' already has a call in flight")]
    AlreadyPending(Origin),
}

/// Spawns gateway calls onto a bounded pool of worker tasks
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<Gateway>,
    workers: Arc<Semaphore>,
    completions: mpsc::UnboundedSender<Completion>,
    outstanding: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("idle_workers", &self.workers.available_permits())
            .field("outstanding", &self.outstanding.load(Ordering::SeqCst))
            .finish()
    }
}

impl Dispatcher {
    /// Run `operation` on a worker. Excess calls wait for a free worker.
    pub fn spawn(&self, origin: Origin, operation: Operation) -> Ticket {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = self.shutdown.child_token();
        let ticket = Ticket {
            id,
            origin: origin.clone(),
            cancel: cancel.clone(),
        };

        let guard = DeliveryGuard {
            tx: self.completions.clone(),
            id,
            origin: Some(origin),
            operation: operation.name(),
        };
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Dispatching {} #{} for '{}'", guard.operation, id, ticket.origin);

        let gateway = Arc::clone(&self.gateway);
        let workers = Arc::clone(&self.workers);
        tokio::spawn(async move {
            let delivery = tokio::select! {
                biased;
                _ = cancel.cancelled() => Delivery::Cancelled,
                delivery = work(gateway, workers, operation) => delivery,
            };
            guard.deliver(delivery);
        });

        ticket
    }

    /// Cancel every outstanding call
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn work(gateway: Arc<Gateway>, workers: Arc<Semaphore>, operation: Operation) -> Delivery {
    let _permit = match workers.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return Delivery::Aborted,
    };
    Delivery::Completed(gateway.call(operation).await)
}

/// Sends the completion exactly once, even if the worker unwinds or is dropped
struct DeliveryGuard {
    tx: mpsc::UnboundedSender<Completion>,
    id: u64,
    origin: Option<Origin>,
    operation: &'static str,
}

impl DeliveryGuard {
    fn deliver(mut self, delivery: Delivery) {
        self.send(delivery);
    }

    fn send(&mut self, delivery: Delivery) {
        if let Some(origin) = self.origin.take() {
            tracing::debug!("Delivering {} #{} to '{}'", self.operation, self.id, origin);
            // The UI side may already be gone during shutdown
            let _ = self.tx.send(Completion {
                id: self.id,
                origin,
                operation: self.operation,
                delivery,
            });
        }
    }
}

impl Drop for DeliveryGuard {
    fn drop(&mut self) {
        if self.origin.is_some() {
            tracing::error!("{} #{} worker ended without a result", self.operation, self.id);
            self.send(Delivery::Aborted);
        }
    }
}

/// UI-side end of the boundary. Owned by exactly one task.
pub struct UiContext {
    dispatcher: Dispatcher,
    completions: mpsc::UnboundedReceiver<Completion>,
    pending: HashMap<Origin, Ticket>,
}

impl fmt::Debug for UiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiContext")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl UiContext {
    pub fn new(gateway: Arc<Gateway>, config: &DispatchConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher {
            gateway,
            workers: Arc::new(Semaphore::new(config.max_workers)),
            completions: tx,
            outstanding: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
            shutdown: CancellationToken::new(),
        };
        Self {
            dispatcher,
            completions: rx,
            pending: HashMap::new(),
        }
    }

    /// Start a call for an affordance, disabling it until its completion is taken
    pub fn submit(
        &mut self,
        origin: impl Into<Origin>,
        operation: Operation,
    ) -> Result<Ticket, DispatchError> {
        let origin = origin.into();
        if self.pending.contains_key(&origin) {
            tracing::debug!("Ignoring duplicate submit from '{}'", origin);
            return Err(DispatchError::AlreadyPending(origin));
        }
        let ticket = self.dispatcher.spawn(origin.clone(), operation);
        self.pending.insert(origin, ticket.clone());
        Ok(ticket)
    }

    /// Dispatcher for background calls that do not disable an affordance
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    pub fn is_enabled(&self, origin: &Origin) -> bool {
        !self.pending.contains_key(origin)
    }

    /// Calls dispatched but not yet taken on the UI side
    pub fn outstanding(&self) -> usize {
        self.dispatcher.outstanding.load(Ordering::SeqCst)
    }

    /// Cancel the call pending for an affordance, if any
    pub fn cancel(&self, origin: &Origin) -> bool {
        match self.pending.get(origin) {
            Some(ticket) => {
                ticket.cancel();
                true
            }
            None => false,
        }
    }

    /// Wait for the next completion. `None` once nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.outstanding() == 0 {
            return None;
        }
        let completion = self.completions.recv().await?;
        Some(self.accept(completion))
    }

    /// Non-blocking variant for render loops that poll between frames
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        let completion = self.completions.try_recv().ok()?;
        Some(self.accept(completion))
    }

    /// Hand every outstanding completion to `render`, on this task, until idle
    pub async fn drain_with<F>(&mut self, mut render: F)
    where
        F: FnMut(Completion),
    {
        while let Some(completion) = self.next_completion().await {
            render(completion);
        }
    }

    fn accept(&mut self, completion: Completion) -> Completion {
        self.dispatcher.outstanding.fetch_sub(1, Ordering::SeqCst);
        if self
            .pending
            .get(&completion.origin)
            .is_some_and(|ticket| ticket.id == completion.id)
        {
            self.pending.remove(&completion.origin);
        }
        completion
    }
}

impl Drop for UiContext {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
    }
}
