//! Event stream listener.
//!
//! One background task per toolkit consumes `GET /api/sse/{id}` and fans each
//! event out to the general callback given at start, then to the callbacks
//! registered for the event's `type`, in registration order.
//!
//! ```text
//! Stopped ──start──▶ Starting ──handshake ok──▶ Running
//!    ▲                   │                        │
//!    │                   └──error──▶ Reconnecting ◀┘ error / server closed
//!    │                                   │
//!    └────────────stop───────────────────┤
//!                                        └──too many failures──▶ Failed
//! ```

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::transport::McpHttp;
use crate::types::Event;

/// Callback invoked for stream events. Runs on the listener task.
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Default wait before the first reconnect attempt.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(5);

/// Default ceiling for the reconnect wait.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Default number of consecutive failures before the listener gives up.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Default bound on how long `stop` waits for the task to exit.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// What to do when the stream endpoint answers the handshake with a
/// non-200 status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeFailurePolicy {
    /// Stop listening; the listener ends in [`ListenerState::Failed`].
    #[default]
    Abort,
    /// Treat it like any other connection error and back off.
    Retry,
}

/// Listener tuning.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Wait before the first reconnect; doubles per consecutive failure.
    pub initial_backoff: Duration,
    /// Upper bound for the reconnect wait.
    pub max_backoff: Duration,
    /// Give up after this many consecutive failures. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
    /// How long `stop` waits for the task.
    pub stop_timeout: Duration,
    /// Handshake rejection handling.
    pub handshake_failure: HandshakeFailurePolicy,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_consecutive_failures: Some(DEFAULT_MAX_CONSECUTIVE_FAILURES),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            handshake_failure: HandshakeFailurePolicy::default(),
        }
    }
}

impl ListenerConfig {
    /// Set the initial backoff.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the maximum backoff.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Set the consecutive failure cap.
    pub fn with_max_consecutive_failures(mut self, max: Option<u32>) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Set the stop timeout.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Set the handshake failure policy.
    pub fn with_handshake_failure(mut self, policy: HandshakeFailurePolicy) -> Self {
        self.handshake_failure = policy;
        self
    }

    /// Wait before the reconnect that follows the `failures`-th consecutive
    /// failure.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff.max(self.initial_backoff))
    }
}

/// Lifecycle state of the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    /// No task is running.
    Stopped,
    /// Task spawned, handshake pending.
    Starting,
    /// Stream established.
    Running,
    /// Waiting to reconnect after a failure.
    Reconnecting,
    /// Gave up; needs an explicit restart.
    Failed,
}

impl ListenerState {
    /// Lowercase name used in logs and status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerState::Stopped => "stopped",
            ListenerState::Starting => "starting",
            ListenerState::Running => "running",
            ListenerState::Reconnecting => "reconnecting",
            ListenerState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ListenerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the listener for health checks.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerStatus {
    /// Current state.
    pub state: ListenerState,
    /// Failures since the last successful handshake.
    pub consecutive_failures: u32,
    /// When the last well-formed event arrived.
    pub last_event_at: Option<DateTime<Utc>>,
}

/// State shared between the listener handle and its task.
struct Shared {
    state: RwLock<ListenerState>,
    consecutive_failures: AtomicU32,
    last_event_at: RwLock<Option<DateTime<Utc>>>,
    callbacks: RwLock<HashMap<String, Vec<EventCallback>>>,
}

impl Shared {
    /// Update the state unless the owning task has been told to stop.
    fn set_state(&self, cancel: &CancellationToken, state: ListenerState) {
        if !cancel.is_cancelled() {
            *self.state.write() = state;
        }
    }

    fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn dispatch(&self, data: &str, general: Option<&EventCallback>) {
        let event = match Event::parse(data) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, data, "error processing event, skipping");
                return;
            }
        };

        *self.last_event_at.write() = Some(Utc::now());
        debug!(event_type = ?event.event_type, "received event");

        if let Some(callback) = general {
            invoke(callback, &event);
        }

        // Clone the list so registration is never blocked by a slow callback.
        let typed = event
            .event_type
            .as_ref()
            .and_then(|t| self.callbacks.read().get(t).cloned());
        for callback in typed.iter().flatten() {
            invoke(callback, &event);
        }
    }
}

fn invoke(callback: &EventCallback, event: &Event) {
    if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
        error!(event_type = ?event.event_type, "event callback panicked");
    }
}

/// Handle to a spawned listener task.
struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background consumer of the session event stream.
pub struct EventListener {
    transport: McpHttp,
    config: ListenerConfig,
    shared: Arc<Shared>,
    general: parking_lot::Mutex<Option<EventCallback>>,
    worker: tokio::sync::Mutex<Option<Worker>>,
}

impl EventListener {
    /// Create a stopped listener.
    pub fn new(transport: McpHttp, config: ListenerConfig) -> Self {
        Self {
            transport,
            config,
            shared: Arc::new(Shared {
                state: RwLock::new(ListenerState::Stopped),
                consecutive_failures: AtomicU32::new(0),
                last_event_at: RwLock::new(None),
                callbacks: RwLock::new(HashMap::new()),
            }),
            general: parking_lot::Mutex::new(None),
            worker: tokio::sync::Mutex::new(None),
        }
    }

    /// Start listening on `session_id`'s stream, replacing any running task.
    pub async fn start(&self, session_id: &str, callback: Option<EventCallback>) {
        let mut worker = self.worker.lock().await;
        if let Some(previous) = worker.take() {
            self.shutdown(previous).await;
        }

        *self.general.lock() = callback.clone();
        let cancel = CancellationToken::new();
        self.shared.consecutive_failures.store(0, Ordering::SeqCst);
        *self.shared.state.write() = ListenerState::Starting;

        let handle = tokio::spawn(run(
            self.transport.clone(),
            session_id.to_string(),
            self.config.clone(),
            Arc::clone(&self.shared),
            callback,
            cancel.clone(),
        ));

        *worker = Some(Worker { cancel, handle });
        info!(session_id, "event listener started");
    }

    /// Start again on `session_id`, keeping the general callback of the last
    /// start.
    pub async fn restart(&self, session_id: &str) {
        let callback = self.general.lock().clone();
        self.start(session_id, callback).await;
    }

    /// Stop the task and wait (bounded) for it to exit. Safe to call when
    /// nothing is running.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        if let Some(previous) = worker.take() {
            self.shutdown(previous).await;
            info!("event listener stopped");
        }
    }

    async fn shutdown(&self, worker: Worker) {
        worker.cancel.cancel();
        if tokio::time::timeout(self.config.stop_timeout, worker.handle)
            .await
            .is_err()
        {
            warn!(
                timeout_ms = self.config.stop_timeout.as_millis() as u64,
                "event listener did not exit in time"
            );
        }
        *self.shared.state.write() = ListenerState::Stopped;
    }

    /// Append `callback` to the callbacks for `event_type`.
    pub fn register_callback<F>(&self, event_type: impl Into<String>, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared
            .callbacks
            .write()
            .entry(event_type.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Whether a task is live and has not given up.
    pub fn is_running(&self) -> bool {
        matches!(
            self.state(),
            ListenerState::Starting | ListenerState::Running | ListenerState::Reconnecting
        )
    }

    /// Current state.
    pub fn state(&self) -> ListenerState {
        *self.shared.state.read()
    }

    /// Snapshot for health checks.
    pub fn status(&self) -> ListenerStatus {
        ListenerStatus {
            state: self.state(),
            consecutive_failures: self.shared.consecutive_failures.load(Ordering::SeqCst),
            last_event_at: *self.shared.last_event_at.read(),
        }
    }
}

/// Listener task body: connect, consume, back off, repeat.
async fn run(
    transport: McpHttp,
    session_id: String,
    config: ListenerConfig,
    shared: Arc<Shared>,
    callback: Option<EventCallback>,
    cancel: CancellationToken,
) {
    loop {
        let err = match consume(&transport, &session_id, &shared, callback.as_ref(), &cancel).await
        {
            Ok(()) => break,
            Err(e) => e,
        };

        // A deliberate stop is not an error.
        if cancel.is_cancelled() {
            break;
        }

        if matches!(err, Error::Handshake { .. })
            && config.handshake_failure == HandshakeFailurePolicy::Abort
        {
            error!(error = %err, "event stream handshake rejected, not retrying");
            shared.set_state(&cancel, ListenerState::Failed);
            break;
        }

        let failures = shared.record_failure();
        error!(error = %err, failures, "event stream connection error");

        if config
            .max_consecutive_failures
            .is_some_and(|max| failures >= max)
        {
            error!(failures, "event stream keeps failing, giving up");
            shared.set_state(&cancel, ListenerState::Failed);
            break;
        }

        let delay = config.backoff_for(failures);
        info!(delay_ms = delay.as_millis() as u64, "attempting to reconnect");
        shared.set_state(&cancel, ListenerState::Reconnecting);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!(session_id = %session_id, "event listener task exiting");
}

/// Open the stream and dispatch events until cancelled (`Ok`) or the
/// connection fails (`Err`). A server-side close counts as a failure.
async fn consume(
    transport: &McpHttp,
    session_id: &str,
    shared: &Shared,
    callback: Option<&EventCallback>,
    cancel: &CancellationToken,
) -> Result<()> {
    let response = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        response = transport.open_event_stream(session_id) => response?,
    };

    shared.consecutive_failures.store(0, Ordering::SeqCst);
    shared.set_state(cancel, ListenerState::Running);
    info!(session_id, "event stream established");

    let mut events = response.bytes_stream().eventsource();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = events.next() => next,
        };

        match next {
            Some(Ok(message)) => {
                if message.data.is_empty() {
                    continue;
                }
                shared.dispatch(&message.data, callback);
            }
            Some(Err(e)) => return Err(Error::Stream(e.to_string())),
            None => return Err(Error::Stream("event stream closed by server".to_string())),
        }
    }
}
