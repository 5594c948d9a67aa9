use dashmap::DashMap;
use session::{SessionState, Transition};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// The remote actions. Each one queues on its own lane per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Extract,
    Generate,
    Summarize,
}

/// One user's session.
///
/// The state lock is only held to read a snapshot or apply a result, never
/// across a remote call. Repeated clicks on the same action queue on that
/// action's lane. Clear bumps the epoch, and a result whose call started
/// before the bump is not applied.
pub struct Session {
    state: Mutex<SessionState>,
    epoch: AtomicU64,
    lanes: [Mutex<()>; 3],
    last_used: AtomicU64,
}

impl Session {
    fn new(tick: u64) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            epoch: AtomicU64::new(0),
            lanes: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
            last_used: AtomicU64::new(tick),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Wait for earlier calls of the same action on this session.
    pub async fn queue(&self, lane: Lane) -> MutexGuard<'_, ()> {
        let index = match lane {
            Lane::Extract => 0,
            Lane::Generate => 1,
            Lane::Summarize => 2,
        };
        self.lanes[index].lock().await
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Run `f` on the state and invalidate every call still in flight.
    pub async fn reset<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().await;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        f(&mut state)
    }

    /// Apply a finished call's transition unless the session was cleared
    /// since `epoch` was read. Returns whether it was applied.
    pub async fn apply_if_current(&self, epoch: u64, transition: Transition) -> bool {
        let mut state = self.state.lock().await;
        if self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        state.apply(transition);
        true
    }
}

pub type SessionHandle = Arc<Session>;

/// Per-session state, partitioned by session id.
///
/// Holds at most `max_sessions` sessions; creating one more evicts the
/// session that was used least recently. Different sessions never share a
/// lock.
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionHandle>,
    max_sessions: usize,
    clock: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn create(&self) -> Uuid {
        while self.sessions.len() >= self.max_sessions {
            if !self.evict_least_recent() {
                break;
            }
        }

        let id = Uuid::new_v4();
        self.sessions
            .insert(id, Arc::new(Session::new(self.tick())));
        id
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_used.load(Ordering::Relaxed))
            .map(|entry| *entry.key());

        match oldest {
            Some(id) => {
                let removed = self.sessions.remove(&id).is_some();
                if removed {
                    info!(session = %id, "Session evicted");
                }
                removed
            }
            None => false,
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        let handle = self.sessions.get(id).map(|entry| entry.value().clone())?;
        handle.last_used.store(self.tick(), Ordering::Relaxed);
        Some(handle)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}
