//! Connection lifecycle state machine.
//!
//! Tracks the state of the single remote connection, driven by lifecycle
//! events from the connection channel and by the outcome of one
//! asynchronous authority resolution issued at startup.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::types::{AuthorityResolver, ConnectionContext, ConnectionState, LifecycleEvent};

/// State shared between the machine and its resolution task.
struct Shared {
    state_tx: watch::Sender<Option<ConnectionState>>,
    context_tx: watch::Sender<ConnectionContext>,
}

impl Shared {
    fn new(initial: Option<ConnectionState>) -> Self {
        let (state_tx, _) = watch::channel(initial);
        let (context_tx, _) = watch::channel(ConnectionContext::from(initial));
        Self {
            state_tx,
            context_tx,
        }
    }

    /// Moves to `next` when `accept(current)` holds and `next` differs from
    /// the current state. Returns whether the state changed.
    fn transition(
        &self,
        next: ConnectionState,
        cause: &'static str,
        accept: impl FnOnce(ConnectionState) -> bool,
    ) -> bool {
        let mut previous = None;
        let changed = self.state_tx.send_if_modified(|state| match *state {
            Some(current) if current != next && accept(current) => {
                previous = Some(current);
                *state = Some(next);
                true
            }
            _ => false,
        });

        if !changed {
            let current = *self.state_tx.borrow();
            debug!(state = ?current, requested = %next, cause, "state unchanged");
            return false;
        }

        debug!(from = ?previous, to = %next, cause, "connection state changed");
        let context = ConnectionContext::from(Some(next));
        self.context_tx.send_if_modified(|current| {
            let modified = *current != context;
            *current = context;
            modified
        });
        true
    }
}

/// Lifecycle state machine for the remote connection.
///
/// Without a configured authority the machine has no state at all and
/// ignores lifecycle events. With one, it starts in
/// [`ConnectionState::Initializing`] and issues exactly one resolution.
pub struct ConnectionStateMachine {
    authority: Option<String>,
    shared: Arc<Shared>,
    resolution: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionStateMachine {
    /// Creates a machine for a session with no remote authority.
    pub fn local() -> Self {
        Self {
            authority: None,
            shared: Arc::new(Shared::new(None)),
            resolution: Mutex::new(None),
        }
    }

    /// Creates the machine and, if `authority` is set, spawns the one-shot
    /// resolution on the current tokio runtime.
    ///
    /// The resolution outcome only applies while the machine is still
    /// initializing; any lifecycle event that arrived in the meantime wins.
    pub fn start<R: AuthorityResolver>(authority: Option<String>, resolver: Arc<R>) -> Self {
        let Some(authority) = authority else {
            return Self::local();
        };

        let shared = Arc::new(Shared::new(Some(ConnectionState::Initializing)));
        info!(authority = %authority, "resolving remote authority");

        let task_shared = Arc::clone(&shared);
        let task_authority = authority.clone();
        let handle = tokio::spawn(async move {
            let target = match resolver.resolve(&task_authority).await {
                Ok(()) => {
                    info!(authority = %task_authority, "authority resolved");
                    ConnectionState::Connected
                }
                Err(e) => {
                    info!(authority = %task_authority, error = %e, "authority resolution failed");
                    ConnectionState::Disconnected
                }
            };
            task_shared.transition(target, "resolution", |current| {
                current == ConnectionState::Initializing
            });
        });

        Self {
            authority: Some(authority),
            shared,
            resolution: Mutex::new(Some(handle)),
        }
    }

    /// The configured remote authority, if any.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Current state; `None` when no authority is configured.
    pub fn state(&self) -> Option<ConnectionState> {
        *self.shared.state_tx.borrow()
    }

    /// Coarse projection of the current state.
    pub fn context(&self) -> ConnectionContext {
        *self.shared.context_tx.borrow()
    }

    /// Applies a lifecycle event. Returns `true` if the state changed.
    pub fn handle_event(&self, event: LifecycleEvent) -> bool {
        if self.authority.is_none() {
            debug!(event = event.as_str(), "lifecycle event ignored without authority");
            return false;
        }
        self.shared
            .transition(event.target_state(), event.as_str(), |_| true)
    }

    /// Subscribes to state changes. No-op transitions are not published.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConnectionState>> {
        self.shared.state_tx.subscribe()
    }

    /// Subscribes to the coarse projection.
    pub fn subscribe_context(&self) -> watch::Receiver<ConnectionContext> {
        self.shared.context_tx.subscribe()
    }

    /// Waits until the resolution task has finished. Returns immediately if
    /// there is none or it was already awaited.
    pub async fn resolution_finished(&self) {
        let handle = match self.resolution.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for ConnectionStateMachine {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.resolution.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;
    use crate::types::ResolveError;

    /// Resolver that blocks until released, then reports a fixed outcome.
    struct GatedResolver {
        gate: Arc<Notify>,
        succeed: bool,
        calls: AtomicUsize,
    }

    impl GatedResolver {
        fn new(succeed: bool) -> (Arc<Self>, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let resolver = Arc::new(Self {
                gate: Arc::clone(&gate),
                succeed,
                calls: AtomicUsize::new(0),
            });
            (resolver, gate)
        }
    }

    impl AuthorityResolver for GatedResolver {
        async fn resolve(&self, authority: &str) -> Result<(), ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if self.succeed {
                Ok(())
            } else {
                Err(ResolveError {
                    authority: authority.to_string(),
                    message: "unreachable".into(),
                })
            }
        }
    }

    /// Resolver that succeeds after a fixed delay.
    struct SlowResolver {
        delay: Duration,
    }

    impl AuthorityResolver for SlowResolver {
        async fn resolve(&self, _authority: &str) -> Result<(), ResolveError> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    #[test]
    fn local_machine_has_no_state() {
        let machine = ConnectionStateMachine::local();
        assert_eq!(machine.state(), None);
        assert_eq!(machine.context(), ConnectionContext::None);
        assert!(!machine.handle_event(LifecycleEvent::ConnectionGain));
        assert_eq!(machine.state(), None);
    }

    #[tokio::test]
    async fn start_without_authority_never_resolves() {
        let (resolver, _gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(None, Arc::clone(&resolver));
        machine.resolution_finished().await;
        assert_eq!(machine.state(), None);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn starts_initializing_and_resolves_once() {
        let (resolver, gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), Arc::clone(&resolver));
        assert_eq!(machine.state(), Some(ConnectionState::Initializing));
        assert_eq!(machine.context(), ConnectionContext::Initializing);

        gate.notify_one();
        machine.resolution_finished().await;
        assert_eq!(machine.state(), Some(ConnectionState::Connected));
        assert_eq!(machine.context(), ConnectionContext::Connected);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolution_failure_disconnects() {
        let (resolver, gate) = GatedResolver::new(false);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);
        gate.notify_one();
        machine.resolution_finished().await;
        assert_eq!(machine.state(), Some(ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn late_resolution_failure_does_not_override_gain() {
        let (resolver, gate) = GatedResolver::new(false);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);

        assert!(machine.handle_event(LifecycleEvent::ConnectionGain));
        gate.notify_one();
        machine.resolution_finished().await;

        assert_eq!(machine.state(), Some(ConnectionState::Connected));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_resolution_keeps_initializing_until_done() {
        let machine = ConnectionStateMachine::start(
            Some("myhost".into()),
            Arc::new(SlowResolver {
                delay: Duration::from_secs(30),
            }),
        );
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(machine.state(), Some(ConnectionState::Initializing));

        machine.resolution_finished().await;
        assert_eq!(machine.state(), Some(ConnectionState::Connected));
    }

    #[tokio::test(start_paused = true)]
    async fn lost_connection_during_slow_resolution_wins() {
        let machine = ConnectionStateMachine::start(
            Some("myhost".into()),
            Arc::new(SlowResolver {
                delay: Duration::from_secs(30),
            }),
        );
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(machine.handle_event(LifecycleEvent::ConnectionLost));

        machine.resolution_finished().await;
        assert_eq!(machine.state(), Some(ConnectionState::Reconnecting));
    }

    #[tokio::test]
    async fn permanent_failure_after_resolution_disconnects() {
        let (resolver, gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);
        gate.notify_one();
        machine.resolution_finished().await;
        assert_eq!(machine.state(), Some(ConnectionState::Connected));

        assert!(machine.handle_event(LifecycleEvent::ReconnectionPermanentFailure));
        assert_eq!(machine.state(), Some(ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn reconnecting_projects_as_disconnected() {
        let (resolver, _gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);

        machine.handle_event(LifecycleEvent::ConnectionGain);
        machine.handle_event(LifecycleEvent::ConnectionLost);
        assert_eq!(machine.state(), Some(ConnectionState::Reconnecting));
        assert_eq!(machine.context(), ConnectionContext::Disconnected);

        machine.handle_event(LifecycleEvent::ConnectionGain);
        assert_eq!(machine.context(), ConnectionContext::Connected);
    }

    #[tokio::test]
    async fn repeated_event_is_a_noop() {
        let (resolver, _gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);
        let mut rx = machine.subscribe();

        assert!(machine.handle_event(LifecycleEvent::ConnectionLost));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        assert!(!machine.handle_event(LifecycleEvent::ReconnectionWait));
        assert!(!machine.handle_event(LifecycleEvent::ReconnectionRunning));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn context_not_republished_when_projection_is_equal() {
        let (resolver, _gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);
        machine.handle_event(LifecycleEvent::ReconnectionPermanentFailure);

        let ctx = machine.subscribe_context();
        machine.handle_event(LifecycleEvent::ConnectionLost);

        assert_eq!(machine.state(), Some(ConnectionState::Reconnecting));
        assert!(!ctx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn reconnect_events_apply_from_any_state() {
        let (resolver, _gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);

        assert!(machine.handle_event(LifecycleEvent::ReconnectionWait));
        assert_eq!(machine.state(), Some(ConnectionState::Reconnecting));
        assert!(machine.handle_event(LifecycleEvent::ReconnectionPermanentFailure));
        assert!(machine.handle_event(LifecycleEvent::ReconnectionRunning));
        assert_eq!(machine.state(), Some(ConnectionState::Reconnecting));
    }

    #[tokio::test]
    async fn resolution_finished_is_idempotent() {
        let (resolver, gate) = GatedResolver::new(true);
        let machine = ConnectionStateMachine::start(Some("myhost".into()), resolver);
        gate.notify_one();
        machine.resolution_finished().await;
        machine.resolution_finished().await;
        assert_eq!(machine.authority(), Some("myhost"));
    }
}
