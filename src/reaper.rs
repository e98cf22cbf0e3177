//! Abandonment reaper: periodic eviction of idle sessions.
//!
//! Time-based expiry is otherwise lazy (checked on the next action), so
//! sessions a client silently stopped polling would leak indefinitely.
//! The reaper wakes on a fixed interval and evicts every session with no
//! activity inside the grace window, marking it abandoned. Abandoned
//! sessions never reach the reward calculator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::games::store::SessionStore;

pub struct AbandonmentReaper {
    store: SessionStore,
    sweep_interval: Duration,
    grace: Duration,
    running: Arc<AtomicBool>,
}

impl AbandonmentReaper {
    /// Spawns the background sweep task and returns its handle.
    pub fn spawn(store: SessionStore, sweep_interval: Duration, grace: Duration) -> Arc<Self> {
        let reaper = Arc::new(Self {
            store,
            sweep_interval,
            grace,
            running: Arc::new(AtomicBool::new(true)),
        });

        reaper.clone().spawn_task();
        reaper
    }

    fn spawn_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.sweep_interval);
            // The first tick fires immediately; skip it so a freshly
            // started engine does not sweep at t=0.
            tick.tick().await;

            while self.running.load(Ordering::SeqCst) {
                tick.tick().await;
                if !self.running.load(Ordering::SeqCst) {
                    break;
                }
                self.sweep_once();
            }
        });
    }

    fn sweep_once(&self) {
        let reaped = self.store.sweep_inactive(self.grace);
        for state in &reaped {
            tracing::info!(
                session_id = %state.session_id,
                player = %state.player,
                game_type = %state.game_type,
                score = state.current_score,
                "abandoned session reaped"
            );
        }
        if !reaped.is_empty() {
            tracing::info!(
                count = reaped.len(),
                remaining = self.store.active_count(),
                "reaper sweep finished"
            );
        }
    }

    /// Stops the sweep loop. The task exits on its next wakeup.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::{GameState, GameType};
    use chrono::Utc;

    fn idle_session(player: &str) -> GameState {
        let mut state = GameState::new(GameType::ClickSpeed, player);
        state.last_activity = Utc::now() - chrono::Duration::minutes(30);
        state
    }

    #[tokio::test]
    async fn test_reaper_evicts_idle_sessions() {
        let store = SessionStore::new();
        let idle = idle_session("alice");
        let idle_id = idle.session_id;
        store.insert(idle);

        let active = GameState::new(GameType::MemoryMatch, "bob");
        let active_id = active.session_id;
        store.insert(active);

        let reaper = AbandonmentReaper::spawn(
            store.clone(),
            Duration::from_millis(10),
            Duration::from_secs(600),
        );

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get(&idle_id).is_none());
        assert!(store.get(&active_id).is_some());

        reaper.stop();
    }

    #[tokio::test]
    async fn test_stopped_reaper_sweeps_no_more() {
        let store = SessionStore::new();
        let reaper = AbandonmentReaper::spawn(
            store.clone(),
            Duration::from_millis(10),
            Duration::from_secs(600),
        );
        reaper.stop();

        // Give the task time to observe the stop flag, then add an idle
        // session that a live reaper would evict.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let idle = idle_session("alice");
        let idle_id = idle.session_id;
        store.insert(idle);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.get(&idle_id).is_some());
    }
}
