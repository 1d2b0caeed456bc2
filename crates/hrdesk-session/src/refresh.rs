//! Single-flight coordination for token refresh.

use tokio::sync::{Mutex, oneshot};

use hrdesk_core::{AppError, AppResult};
use hrdesk_entity::Credential;

/// How a caller participates in the current refresh.
#[derive(Debug)]
pub enum RefreshRole {
    /// This caller performs the network refresh and must report back
    /// through [`RefreshCoordinator::complete`] with the same generation.
    Leader { generation: u64 },
    /// Another caller is already refreshing; await its shared outcome.
    Follower(oneshot::Receiver<AppResult<Credential>>),
}

#[derive(Debug, Default)]
struct Inflight {
    active: bool,
    generation: u64,
    waiters: Vec<oneshot::Sender<AppResult<Credential>>>,
}

/// Collapses concurrent refresh attempts into one network call.
///
/// The first caller becomes the leader; everyone who arrives while the
/// refresh is in flight parks on a channel and receives the leader's
/// outcome. The generation counter fences stale leaders: a logout or
/// revocation aborts the round and bumps the generation, so a leader
/// finishing late finds its `complete` rejected.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    inner: Mutex<Inflight>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the current refresh round, starting one if none is in flight.
    pub async fn begin(&self) -> RefreshRole {
        let mut inner = self.inner.lock().await;
        if inner.active {
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            return RefreshRole::Follower(rx);
        }
        inner.active = true;
        inner.generation += 1;
        RefreshRole::Leader {
            generation: inner.generation,
        }
    }

    /// Deliver the leader's outcome to every parked waiter, in arrival
    /// order. Returns false when the round was already aborted or
    /// superseded, in which case nothing is delivered and the leader must
    /// discard its result.
    pub async fn complete(&self, generation: u64, result: AppResult<Credential>) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.active || inner.generation != generation {
            return false;
        }
        inner.active = false;
        for waiter in inner.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
        true
    }

    /// Fail the in-flight round and everyone parked on it. Used by logout
    /// and revocation; the generation bump invalidates the current leader.
    pub async fn abort_all(&self, error: AppError) {
        let mut inner = self.inner.lock().await;
        if inner.active {
            inner.active = false;
            inner.generation += 1;
        }
        for waiter in inner.waiters.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
    }
}
