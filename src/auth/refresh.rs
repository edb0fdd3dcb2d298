// Single-flight coordination of token refreshes
//
// At most one refresh call is in flight per process. Requests that hit a 401
// while a refresh is running queue up here and are all handed the outcome of
// that one refresh, in the order they queued.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

use crate::error::ApiError;

/// Outcome of a refresh attempt: the new access token or the failure
pub type RefreshOutcome = Result<String, ApiError>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Process-wide refresh state (`isRefreshing` plus the FIFO queue)
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Result of [`RefreshCoordinator::begin`]
pub enum RefreshTicket<'a> {
    /// Caller must perform the refresh and settle the lease
    Leader(RefreshLease<'a>),
    /// A refresh is already running; wait for its outcome
    Queued(PendingRequest),
}

/// Right (and duty) to settle the in-flight refresh
///
/// Dropping an unsettled lease settles it with [`ApiError::Cancelled`].
pub struct RefreshLease<'a> {
    coordinator: Option<&'a RefreshCoordinator>,
}

/// A caller parked behind an in-flight refresh
pub struct PendingRequest {
    receiver: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh, or queue behind the one already running
    ///
    /// The flag check and the enqueue/start happen under one lock, so exactly
    /// one concurrent caller becomes the leader.
    pub fn begin(&self) -> RefreshTicket<'_> {
        let mut state = self.lock();
        if state.refreshing {
            return RefreshTicket::Queued(Self::push_waiter(&mut state));
        }
        state.refreshing = true;
        tracing::debug!("Token refresh started");
        RefreshTicket::Leader(RefreshLease {
            coordinator: Some(self),
        })
    }

    /// Queue behind the in-flight refresh; `None` when nothing is running
    pub fn enqueue(&self) -> Option<PendingRequest> {
        let mut state = self.lock();
        if state.refreshing {
            Some(Self::push_waiter(&mut state))
        } else {
            None
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of callers waiting for the current refresh
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Forget any in-flight refresh. Queued callers resolve as cancelled.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.refreshing = false;
        state.waiters.clear();
    }

    fn push_waiter(state: &mut RefreshState) -> PendingRequest {
        let (sender, receiver) = oneshot::channel();
        state.waiters.push_back(sender);
        tracing::debug!(queued = state.waiters.len(), "Request queued behind token refresh");
        PendingRequest { receiver }
    }

    fn settle(&self, outcome: RefreshOutcome) {
        let mut state = self.lock();
        state.refreshing = false;
        let waiters = std::mem::take(&mut state.waiters);
        drop(state);

        tracing::debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Token refresh settled"
        );
        for waiter in waiters {
            // Receiver gone means the caller stopped waiting
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RefreshLease<'_> {
    /// Publish the refresh outcome to every queued caller and clear the flag
    pub fn settle(mut self, outcome: RefreshOutcome) {
        if let Some(coordinator) = self.coordinator.take() {
            coordinator.settle(outcome);
        }
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            tracing::warn!("Token refresh abandoned before completion");
            coordinator.settle(Err(ApiError::Cancelled));
        }
    }
}

impl PendingRequest {
    /// Wait for the in-flight refresh to settle
    pub async fn wait(self) -> RefreshOutcome {
        self.receiver.await.unwrap_or(Err(ApiError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn expect_leader(coordinator: &RefreshCoordinator) -> RefreshLease<'_> {
        match coordinator.begin() {
            RefreshTicket::Leader(lease) => lease,
            RefreshTicket::Queued(_) => panic!("expected to lead the refresh"),
        }
    }

    fn expect_queued(coordinator: &RefreshCoordinator) -> PendingRequest {
        match coordinator.begin() {
            RefreshTicket::Queued(pending) => pending,
            RefreshTicket::Leader(_) => panic!("expected to queue behind the refresh"),
        }
    }

    #[tokio::test]
    async fn test_single_leader_and_shared_success() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_leader(&coordinator);
        assert!(coordinator.is_refreshing());

        let first = expect_queued(&coordinator);
        let second = expect_queued(&coordinator);
        let third = expect_queued(&coordinator);
        assert_eq!(coordinator.pending(), 3);

        lease.settle(Ok("fresh-token".to_string()));
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 0);

        for pending in [first, second, third] {
            assert_eq!(pending.wait().await.unwrap(), "fresh-token");
        }
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_leader(&coordinator);
        let waiters: Vec<_> = (0..4).map(|_| expect_queued(&coordinator)).collect();

        lease.settle(Err(ApiError::Status {
            status: 401,
            message: "Token is invalid or expired".to_string(),
        }));

        for pending in waiters {
            let err = pending.wait().await.unwrap_err();
            assert_eq!(err.status(), Some(401));
        }
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_dropped_lease_cancels_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_leader(&coordinator);
        let pending = expect_queued(&coordinator);

        drop(lease);

        assert!(matches!(pending.wait().await, Err(ApiError::Cancelled)));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_reset_releases_queue() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_leader(&coordinator);
        let pending = expect_queued(&coordinator);

        coordinator.reset();
        assert!(!coordinator.is_refreshing());
        assert!(matches!(pending.wait().await, Err(ApiError::Cancelled)));

        drop(lease);
        let _next = expect_leader(&coordinator);
        assert!(coordinator.is_refreshing());
    }

    #[test]
    fn test_enqueue_without_refresh() {
        let coordinator = RefreshCoordinator::new();
        assert!(coordinator.enqueue().is_none());

        let _lease = expect_leader(&coordinator);
        assert!(coordinator.enqueue().is_some());
        assert_eq!(coordinator.pending(), 1);
    }

    #[test]
    fn test_next_refresh_after_settle() {
        let coordinator = RefreshCoordinator::new();
        expect_leader(&coordinator).settle(Ok("one".to_string()));
        expect_leader(&coordinator).settle(Ok("two".to_string()));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_begin_elects_one_leader() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = coordinator.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    match coordinator.begin() {
                        RefreshTicket::Leader(lease) => {
                            // Hold the lease so late arrivals still queue
                            std::mem::forget(lease);
                            true
                        }
                        RefreshTicket::Queued(_) => false,
                    }
                })
            })
            .collect();

        let mut leaders = 0;
        for handle in handles {
            if handle.await.unwrap() {
                leaders += 1;
            }
        }
        assert_eq!(leaders, 1);
        assert!(coordinator.is_refreshing());
    }
}
