//! Concurrency-safe store of live game sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::games::types::{GameState, GameStatus};

type SessionMap = HashMap<Uuid, GameState>;

/// Keyed collection of live sessions behind a single reader/writer lock.
///
/// All mutating operations (create, update, delete, reaper sweep) take
/// the write lock and are therefore mutually exclusive engine-wide;
/// lookups share the read lock. One global mutation at a time is a
/// simplicity tradeoff suited to short, low-contention sessions; shard
/// the map by session-id hash if contention ever becomes measurable.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<SessionMap>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly created session. Session ids are generated
    /// uniquely at creation, so a displaced entry means the id
    /// invariant broke upstream.
    pub fn insert(&self, state: GameState) {
        let session_id = state.session_id;
        if self.write().insert(session_id, state).is_some() {
            tracing::error!(%session_id, "duplicate session id displaced an existing session");
            debug_assert!(false, "duplicate session id");
        }
    }

    /// Snapshot of a live session, if present.
    pub fn get(&self, session_id: &Uuid) -> Option<GameState> {
        self.read().get(session_id).cloned()
    }

    pub fn remove(&self, session_id: &Uuid) -> Option<GameState> {
        self.write().remove(session_id)
    }

    pub fn active_count(&self) -> usize {
        self.read().len()
    }

    /// Write-lock guard for compound read-modify operations that must be
    /// atomic with respect to other mutations (the lifecycle controller's
    /// action path).
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SessionMap> {
        self.sessions.write().expect("session store lock poisoned")
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionMap> {
        self.sessions.read().expect("session store lock poisoned")
    }

    /// Evicts every session whose last activity is older than the grace
    /// window, marking it abandoned. Returns the evicted sessions.
    pub fn sweep_inactive(&self, grace: Duration) -> Vec<GameState> {
        let mut sessions = self.write();
        let now = Utc::now();

        let expired: Vec<Uuid> = sessions
            .values()
            .filter(|state| {
                (now - state.last_activity).to_std().unwrap_or_default() > grace
            })
            .map(|state| state.session_id)
            .collect();

        expired
            .into_iter()
            .filter_map(|session_id| sessions.remove(&session_id))
            .map(|mut state| {
                state.status = GameStatus::Abandoned;
                state.end_time = Some(now);
                state
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::GameType;

    #[test]
    fn test_insert_get_remove() {
        let store = SessionStore::new();
        let state = GameState::new(GameType::ClickSpeed, "alice");
        let session_id = state.session_id;

        store.insert(state);
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.get(&session_id).unwrap().player, "alice");

        let removed = store.remove(&session_id).unwrap();
        assert_eq!(removed.session_id, session_id);
        assert!(store.get(&session_id).is_none());
        assert_eq!(store.active_count(), 0);
    }

    #[test]
    fn test_get_returns_snapshot() {
        let store = SessionStore::new();
        let state = GameState::new(GameType::ClickSpeed, "alice");
        let session_id = state.session_id;
        store.insert(state);

        let mut snapshot = store.get(&session_id).unwrap();
        snapshot.current_score = 999;
        assert_eq!(store.get(&session_id).unwrap().current_score, 0);
    }

    #[test]
    fn test_sweep_evicts_only_idle_sessions() {
        let store = SessionStore::new();

        let fresh = GameState::new(GameType::ClickSpeed, "alice");
        let fresh_id = fresh.session_id;
        store.insert(fresh);

        let mut idle = GameState::new(GameType::MemoryMatch, "bob");
        idle.last_activity = Utc::now() - chrono::Duration::minutes(15);
        let idle_id = idle.session_id;
        store.insert(idle);

        let reaped = store.sweep_inactive(Duration::from_secs(600));
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].session_id, idle_id);
        assert_eq!(reaped[0].status, GameStatus::Abandoned);
        assert!(reaped[0].end_time.is_some());

        assert!(store.get(&idle_id).is_none());
        assert!(store.get(&fresh_id).is_some());
    }

    #[test]
    fn test_sweep_with_no_idle_sessions() {
        let store = SessionStore::new();
        store.insert(GameState::new(GameType::Puzzle, "carol"));
        assert!(store.sweep_inactive(Duration::from_secs(600)).is_empty());
        assert_eq!(store.active_count(), 1);
    }
}
