use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, oneshot};

use super::clock::Clock;
use super::config::LimiterConfig;
use super::error::LimiterError;
use super::key::RateLimitKey;
use super::schedule::admit;
use super::store::LimiterStore;

enum Command {
    TimeToWait {
        reply: oneshot::Sender<Result<u64, LimiterError>>,
    },
}

/// Owner of one key's limiter state.
///
/// An actor runs as a single tokio task draining a FIFO mailbox, so the
/// read, decide and write steps of one call never interleave with another
/// call for the same key.
pub struct LimiterActor {
    key: RateLimitKey,
    storage_key: String,
    config: LimiterConfig,
    store: Arc<dyn LimiterStore>,
    clock: Arc<dyn Clock>,
    initialized: bool,
}

impl LimiterActor {
    pub fn new(key: RateLimitKey, store: Arc<dyn LimiterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage_key: key.storage_key(),
            config: LimiterConfig::for_route(key.route_class),
            key,
            store,
            clock,
            initialized: false,
        }
    }

    pub fn key(&self) -> &RateLimitKey {
        &self.key
    }

    pub fn config(&self) -> LimiterConfig {
        self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn ensure_initialized(&mut self) -> Result<(), LimiterError> {
        if self.initialized {
            return Ok(());
        }
        self.store.ensure_schema().await?;
        self.initialized = true;
        tracing::debug!(key = %self.key, config = ?self.config, "limiter actor initialized");
        Ok(())
    }

    /// Decides admission for one request and advances the key's schedule.
    ///
    /// Returns the number of milliseconds the caller has to wait, `0` when
    /// the request is admitted. Storage failures are returned as errors and
    /// leave the persisted state as it was before the call.
    pub async fn time_to_wait(&mut self) -> Result<u64, LimiterError> {
        self.ensure_initialized().await?;

        let now = self.clock.now_millis();
        let stored = self.store.load(&self.storage_key).await?.unwrap_or(0);
        let decision = admit(&self.config, now, stored);
        self.store
            .save(&self.storage_key, decision.next_allowed_time)
            .await?;

        tracing::debug!(
            key = %self.key,
            now,
            stored,
            next_allowed_time = decision.next_allowed_time,
            wait_ms = decision.wait_ms,
            "limiter decision"
        );

        Ok(decision.wait_ms)
    }

    /// Starts the actor task and returns the handle that feeds its mailbox.
    ///
    /// The task stops once every handle has been dropped and the mailbox
    /// is drained.
    pub fn spawn(self, mailbox: usize) -> ActorHandle {
        let (tx, rx) = mpsc::channel(mailbox.max(1));
        let pending = Arc::new(AtomicUsize::new(0));
        let handle = ActorHandle {
            inner: Arc::new(HandleInner {
                key: self.key.clone(),
                tx,
                pending: Arc::clone(&pending),
            }),
        };
        tokio::spawn(self.run(rx, pending));
        handle
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>, pending: Arc<AtomicUsize>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::TimeToWait { reply } => {
                    let result = self.time_to_wait().await;
                    if let Err(e) = &result {
                        tracing::error!(key = %self.key, "limiter call failed: {}", e);
                    }
                    pending.fetch_sub(1, Ordering::SeqCst);
                    // The caller may have gone away; the state is already written.
                    let _ = reply.send(result);
                }
            }
        }
        tracing::debug!(key = %self.key, "limiter actor stopped");
    }
}

struct HandleInner {
    key: RateLimitKey,
    tx: mpsc::Sender<Command>,
    pending: Arc<AtomicUsize>,
}

/// Addressable reference to a running [`LimiterActor`].
#[derive(Clone)]
pub struct ActorHandle {
    inner: Arc<HandleInner>,
}

impl ActorHandle {
    pub fn key(&self) -> &RateLimitKey {
        &self.inner.key
    }

    pub async fn time_to_wait(&self) -> Result<u64, LimiterError> {
        let permit = self
            .inner
            .tx
            .reserve()
            .await
            .map_err(|_| LimiterError::Unreachable(self.inner.key.to_string()))?;

        let (reply, response) = oneshot::channel();
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        permit.send(Command::TimeToWait { reply });

        response
            .await
            .map_err(|_| LimiterError::Unreachable(self.inner.key.to_string()))?
    }

    /// True when the actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.inner.tx.is_closed()
    }

    /// True when nobody besides the caller holds this handle and the
    /// mailbox has no queued or running call.
    pub(crate) fn is_idle(&self) -> bool {
        Arc::strong_count(&self.inner) == 1 && self.inner.pending.load(Ordering::SeqCst) == 0
    }

    pub fn same_actor(&self, other: &ActorHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
