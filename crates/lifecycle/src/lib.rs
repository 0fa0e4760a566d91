//! Observable state machine for one submission at a time.
//!
//! ```text
//! Idle -> AwaitingWalletConfirmation -> AwaitingChainConfirmation -> Succeeded | Failed
//! ```
//!
//! A wallet that silently dismisses its prompt produces no event. The only
//! way to notice is a stall, so a watchdog forces the machine back to
//! [`LifecycleState::Idle`] once it has waited on the wallet for too long.
//! `Succeeded` returns to `Idle` after a display window; `Failed` waits for
//! [`TransactionLifecycle::reset`] unless a failure display window is set.
//!
//! Each submission gets a [`Ticket`]. Events and timers carry the ticket they
//! belong to and are ignored once it has been retired, so a late receipt or
//! a stale timer can never move a newer submission.
//!
//! Timers are tokio tasks, so submissions can only start inside a tokio
//! runtime.

mod state;

pub use state::{LifecycleEvent, LifecycleState};

use alloy_primitives::TxHash;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, info, warn};

/// Default time the machine waits on the wallet before assuming cancellation.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(30);
/// Default time `Succeeded` is shown before returning to `Idle`.
pub const DEFAULT_SUCCESS_DISPLAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub watchdog: Duration,
    pub success_display: Duration,
    /// `None` keeps `Failed` until an explicit reset
    pub failure_display: Option<Duration>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            watchdog: DEFAULT_WATCHDOG,
            success_display: DEFAULT_SUCCESS_DISPLAY,
            failure_display: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("a submission is already in progress ({0})")]
    Busy(LifecycleState),

    #[error("no tokio runtime to run the lifecycle timers on")]
    NoRuntime,
}

/// Identifies one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct Inner {
    state: LifecycleState,
    /// Ticket of the submission in flight; `None` exactly when idle
    ticket: Option<Ticket>,
    issued: u64,
    started_at: Option<Instant>,
    tx_hash: Option<TxHash>,
    last_error: Option<String>,
    /// Watchdog or display timer guarding the current state
    timer: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    config: LifecycleConfig,
    inner: Mutex<Inner>,
    states: watch::Sender<LifecycleState>,
}

/// Handle to the state machine. Clones share the same machine.
#[derive(Debug, Clone)]
pub struct TransactionLifecycle {
    shared: Arc<Shared>,
}

impl Default for TransactionLifecycle {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}

impl TransactionLifecycle {
    pub fn new(config: LifecycleConfig) -> Self {
        let (states, _) = watch::channel(LifecycleState::Idle);
        Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(Inner::default()),
                states,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.shared.states.subscribe()
    }

    /// Cause of the last failure, cleared by the next submit or reset.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Hash of the most recently signed transaction of the current submission.
    pub fn tx_hash(&self) -> Option<TxHash> {
        self.lock().tx_hash
    }

    /// Time since the current submission started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.lock().started_at.map(|started| started.elapsed())
    }

    /// Start a submission. Only allowed while idle and inside a tokio
    /// runtime.
    pub fn submit(&self) -> Result<Tracker, LifecycleError> {
        let mut inner = self.lock();
        if !inner.state.is_idle() {
            return Err(LifecycleError::Busy(inner.state));
        }
        if Handle::try_current().is_err() {
            return Err(LifecycleError::NoRuntime);
        }

        inner.issued += 1;
        let ticket = Ticket(inner.issued);
        inner.ticket = Some(ticket);
        inner.started_at = Some(Instant::now());
        inner.tx_hash = None;
        inner.last_error = None;

        debug!(ticket = ticket.0, "Submission started");
        self.enter(&mut inner, LifecycleState::AwaitingWalletConfirmation);

        Ok(Tracker {
            lifecycle: self.clone(),
            ticket,
        })
    }

    /// Apply `event` for `ticket` and return the resulting state.
    ///
    /// Events for a retired ticket and events that do not apply to the
    /// current state are ignored, which makes duplicates harmless.
    pub fn handle(&self, ticket: Ticket, event: LifecycleEvent) -> LifecycleState {
        let mut inner = self.lock();
        if inner.ticket != Some(ticket) {
            debug!(ticket = ticket.0, ?event, "Ignoring event for retired submission");
            return inner.state;
        }

        let Some(next) = inner.state.on(&event) else {
            return inner.state;
        };

        match event {
            LifecycleEvent::Signed(tx_hash) => inner.tx_hash = Some(tx_hash),
            LifecycleEvent::ReceiptFailed(reason) => inner.last_error = Some(reason),
            LifecycleEvent::WalletDeclined => {
                info!(ticket = ticket.0, "Wallet prompt closed without signature")
            }
            _ => {}
        }

        self.enter(&mut inner, next);
        next
    }

    /// The wallet prompt of the current submission closed without a
    /// signature, for callers that do not hold its [`Tracker`].
    pub fn dismiss(&self) -> LifecycleState {
        let ticket = self.lock().ticket;
        match ticket {
            Some(ticket) => self.handle(ticket, LifecycleEvent::WalletDeclined),
            None => LifecycleState::Idle,
        }
    }

    /// Force `Idle` from any state, cancelling whatever timer is running.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.last_error = None;
        if !inner.state.is_idle() {
            self.enter(&mut inner, LifecycleState::Idle);
        }
    }

    fn enter(&self, inner: &mut Inner, next: LifecycleState) {
        let previous = std::mem::replace(&mut inner.state, next);
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }

        let elapsed = inner.started_at.map(|started| started.elapsed());
        match next {
            LifecycleState::Succeeded => {
                info!(tx_hash = ?inner.tx_hash, ?elapsed, "Submission succeeded")
            }
            LifecycleState::Failed => {
                warn!(error = ?inner.last_error, ?elapsed, "Submission failed")
            }
            _ => debug!(from = %previous, to = %next, "Lifecycle transition"),
        }

        let delay = match next {
            LifecycleState::Idle => {
                inner.ticket = None;
                None
            }
            LifecycleState::AwaitingWalletConfirmation => Some(self.shared.config.watchdog),
            LifecycleState::AwaitingChainConfirmation => None,
            LifecycleState::Succeeded => Some(self.shared.config.success_display),
            LifecycleState::Failed => self.shared.config.failure_display,
        };

        if let (Some(delay), Some(ticket)) = (delay, inner.ticket) {
            inner.timer = self.spawn_timer(ticket, next, delay);
        }

        self.shared.states.send_replace(next);
    }

    /// `None` when called outside a runtime; the state then stays until the
    /// next event or reset.
    fn spawn_timer(
        &self,
        ticket: Ticket,
        guarded: LifecycleState,
        delay: Duration,
    ) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(state = %guarded, "No tokio runtime, timer not armed");
            return None;
        };
        let deadline = Instant::now() + delay;
        let shared = Arc::downgrade(&self.shared);

        Some(runtime.spawn(async move {
            time::sleep_until(deadline).await;
            if let Some(lifecycle) = upgrade(&shared) {
                lifecycle.expire(ticket, guarded);
            }
        }))
    }

    /// Timer for `guarded` ran out. Only acts if nothing moved on meanwhile.
    fn expire(&self, ticket: Ticket, guarded: LifecycleState) {
        let mut inner = self.lock();
        if inner.ticket != Some(ticket) || inner.state != guarded {
            return;
        }
        // the running task is this one
        inner.timer = None;

        if guarded == LifecycleState::AwaitingWalletConfirmation {
            warn!(
                ticket = ticket.0,
                watchdog = ?self.shared.config.watchdog,
                "No wallet response, assuming the prompt was dismissed"
            );
        }

        self.enter(&mut inner, LifecycleState::Idle);
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().ticket == Some(ticket)
    }
}

fn upgrade(shared: &Weak<Shared>) -> Option<TransactionLifecycle> {
    shared.upgrade().map(|shared| TransactionLifecycle { shared })
}

/// Reports the events of one submission.
#[derive(Debug, Clone)]
pub struct Tracker {
    lifecycle: TransactionLifecycle,
    ticket: Ticket,
}

impl Tracker {
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Still the submission the machine is tracking.
    pub fn is_current(&self) -> bool {
        self.lifecycle.is_current(self.ticket)
    }

    pub fn prompt(&self) -> LifecycleState {
        self.lifecycle.handle(self.ticket, LifecycleEvent::WalletPrompt)
    }

    pub fn declined(&self) -> LifecycleState {
        self.lifecycle.handle(self.ticket, LifecycleEvent::WalletDeclined)
    }

    pub fn signed(&self, tx_hash: TxHash) -> LifecycleState {
        self.lifecycle.handle(self.ticket, LifecycleEvent::Signed(tx_hash))
    }

    pub fn confirmed(&self) -> LifecycleState {
        self.lifecycle.handle(self.ticket, LifecycleEvent::ReceiptSucceeded)
    }

    pub fn failed(&self, reason: impl Into<String>) -> LifecycleState {
        self.lifecycle
            .handle(self.ticket, LifecycleEvent::ReceiptFailed(reason.into()))
    }

    /// Resolves once the submission is retired without reaching a terminal
    /// state: watchdog, declined prompt or reset. Never resolves after
    /// `Succeeded` or `Failed`.
    pub async fn abandoned(&self) {
        let mut states = self.lifecycle.subscribe();
        loop {
            {
                let inner = self.lifecycle.lock();
                if inner.ticket != Some(self.ticket) {
                    return;
                }
                if inner.state.is_terminal() {
                    break;
                }
            }
            if states.changed().await.is_err() {
                break;
            }
        }
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_awaits_wallet() {
        let lifecycle = TransactionLifecycle::default();
        assert_eq!(lifecycle.state(), Idle);

        let tracker = lifecycle.submit().unwrap();
        assert_eq!(lifecycle.state(), AwaitingWalletConfirmation);
        assert!(tracker.is_current());
        assert_eq!(lifecycle.elapsed(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_busy_is_rejected() {
        let lifecycle = TransactionLifecycle::default();
        let _tracker = lifecycle.submit().unwrap();

        assert_eq!(
            lifecycle.submit().unwrap_err(),
            LifecycleError::Busy(AwaitingWalletConfirmation)
        );
    }

    #[test]
    fn test_submit_outside_runtime_is_refused() {
        let lifecycle = TransactionLifecycle::default();

        assert_eq!(lifecycle.submit().unwrap_err(), LifecycleError::NoRuntime);
        assert_eq!(lifecycle.state(), Idle);
        assert_eq!(lifecycle.dismiss(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_infers_cancellation() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();

        time::sleep(DEFAULT_WATCHDOG - ms(1)).await;
        assert_eq!(lifecycle.state(), AwaitingWalletConfirmation);

        time::sleep(ms(2)).await;
        assert_eq!(lifecycle.state(), Idle);
        assert_eq!(lifecycle.last_error(), None);
        assert!(!tracker.is_current());
        tracker.abandoned().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_is_configurable() {
        let lifecycle = TransactionLifecycle::new(LifecycleConfig {
            watchdog: Duration::from_secs(5),
            ..LifecycleConfig::default()
        });
        let _tracker = lifecycle.submit().unwrap();

        time::sleep(Duration::from_secs(5) + ms(1)).await;
        assert_eq!(lifecycle.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signature_stops_watchdog() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();

        tracker.signed(TxHash::with_last_byte(1));
        time::sleep(Duration::from_secs(120)).await;

        assert_eq!(lifecycle.state(), AwaitingChainConfirmation);
        assert_eq!(lifecycle.tx_hash(), Some(TxHash::with_last_byte(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_display_window() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();
        tracker.signed(TxHash::with_last_byte(1));
        tracker.confirmed();
        assert_eq!(lifecycle.state(), Succeeded);

        time::sleep(DEFAULT_SUCCESS_DISPLAY - ms(1)).await;
        assert_eq!(lifecycle.state(), Succeeded);

        time::sleep(ms(2)).await;
        assert_eq!(lifecycle.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_waits_for_reset() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();
        tracker.signed(TxHash::with_last_byte(1));
        tracker.failed("execution reverted");

        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(lifecycle.state(), Failed);
        assert_eq!(lifecycle.last_error().as_deref(), Some("execution reverted"));

        lifecycle.reset();
        assert_eq!(lifecycle.state(), Idle);
        assert_eq!(lifecycle.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_display_window() {
        let lifecycle = TransactionLifecycle::new(LifecycleConfig {
            failure_display: Some(Duration::from_secs(5)),
            ..LifecycleConfig::default()
        });
        let tracker = lifecycle.submit().unwrap();
        tracker.failed("rpc error");

        time::sleep(Duration::from_secs(5) - ms(1)).await;
        assert_eq!(lifecycle.state(), Failed);
        time::sleep(ms(2)).await;
        assert_eq!(lifecycle.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_display_timer_does_not_reset_next_submission() {
        let lifecycle = TransactionLifecycle::default();
        let first = lifecycle.submit().unwrap();
        first.confirmed();
        lifecycle.reset();

        let _second = lifecycle.submit().unwrap();
        time::sleep(DEFAULT_SUCCESS_DISPLAY + ms(500)).await;

        assert_eq!(lifecycle.state(), AwaitingWalletConfirmation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_for_retired_ticket_are_ignored() {
        let lifecycle = TransactionLifecycle::default();
        let first = lifecycle.submit().unwrap();
        lifecycle.reset();
        let second = lifecycle.submit().unwrap();

        assert_ne!(first.ticket(), second.ticket());
        assert_eq!(first.confirmed(), AwaitingWalletConfirmation);
        assert_eq!(first.failed("late"), AwaitingWalletConfirmation);
        assert_eq!(lifecycle.last_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_events_are_idempotent() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();

        assert_eq!(tracker.signed(TxHash::with_last_byte(1)), AwaitingChainConfirmation);
        assert_eq!(tracker.signed(TxHash::with_last_byte(1)), AwaitingChainConfirmation);
        assert_eq!(tracker.confirmed(), Succeeded);
        assert_eq!(tracker.confirmed(), Succeeded);
        assert_eq!(tracker.failed("late"), Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_before_signature_is_honoured() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();

        assert_eq!(tracker.confirmed(), Succeeded);
        assert_eq!(tracker.signed(TxHash::with_last_byte(1)), Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_prompt_is_fast_path() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();

        assert_eq!(tracker.declined(), Idle);
        assert_eq!(lifecycle.last_error(), None);
        tracker.abandoned().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_without_tracker() {
        let lifecycle = TransactionLifecycle::default();
        assert_eq!(lifecycle.dismiss(), Idle);

        let tracker = lifecycle.submit().unwrap();
        tracker.signed(TxHash::with_last_byte(1));
        assert_eq!(lifecycle.dismiss(), AwaitingChainConfirmation);

        tracker.prompt();
        assert_eq!(lifecycle.dismiss(), Idle);
        assert!(!tracker.is_current());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_prompt_rearms_watchdog() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();
        tracker.signed(TxHash::with_last_byte(1));

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(tracker.prompt(), AwaitingWalletConfirmation);

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(lifecycle.state(), AwaitingWalletConfirmation);

        time::sleep(Duration::from_secs(11)).await;
        assert_eq!(lifecycle.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_pends_after_terminal_state() {
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();
        tracker.confirmed();

        let abandoned = time::timeout(Duration::from_secs(10), tracker.abandoned()).await;
        assert!(abandoned.is_err());
        assert_eq!(lifecycle.state(), Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_transitions() {
        let lifecycle = TransactionLifecycle::default();
        let mut states = lifecycle.subscribe();

        let tracker = lifecycle.submit().unwrap();
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), AwaitingWalletConfirmation);

        tracker.signed(TxHash::with_last_byte(1));
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), AwaitingChainConfirmation);
    }
}
