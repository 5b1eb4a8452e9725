use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::machine::Session;
use crate::session::view::SessionView;

/// Sessions untouched for this long are dropped.
pub const DEFAULT_IDLE_TTL_MINUTES: i64 = 120;

type SessionMap = RwLock<HashMap<Uuid, Session>>;

/// In-memory registry of quiz sessions. Nothing survives a restart.
///
/// Idle sessions are evicted on every `create` and by the optional sweeper task.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<SessionMap>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_IDLE_TTL_MINUTES))
    }
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl,
        }
    }

    pub async fn create(&self) -> SessionView {
        let session = Session::new();
        let view = SessionView::from(&session);
        let mut sessions = self.sessions.write().await;
        let evicted = evict_idle(&mut sessions, self.idle_ttl);
        sessions.insert(session.id, session);
        info!(
            "Created session {} ({} active, {evicted} evicted)",
            view.id,
            sessions.len()
        );
        view
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, AppError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(SessionView::from)
            .ok_or_else(|| not_found(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    /// Runs `f` against the session under the write lock and returns its output
    /// together with the resulting view. The lock is never held across provider calls.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<(T, SessionView), AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        let output = f(session);
        session.updated_at = Utc::now();
        Ok((output, SessionView::from(&*session)))
    }

    /// Drops every session idle for longer than the TTL. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        evict_idle(&mut sessions, self.idle_ttl)
    }

    /// Sweeps idle sessions every `period` until the store is dropped.
    pub fn spawn_sweeper(&self, period: StdDuration) -> JoinHandle<()> {
        let sessions = Arc::downgrade(&self.sessions);
        tokio::spawn(sweep_loop(sessions, self.idle_ttl, period))
    }
}

async fn sweep_loop(sessions: Weak<SessionMap>, idle_ttl: Duration, period: StdDuration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(map) = sessions.upgrade() else {
            break;
        };
        let evicted = evict_idle(&mut *map.write().await, idle_ttl);
        if evicted > 0 {
            info!("Evicted {evicted} idle sessions");
        }
    }
}

fn evict_idle(sessions: &mut HashMap<Uuid, Session>, idle_ttl: Duration) -> usize {
    let cutoff = Utc::now() - idle_ttl;
    let before = sessions.len();
    sessions.retain(|id, session| {
        let keep = session.updated_at >= cutoff;
        if !keep {
            debug!("Evicting idle session {id}");
        }
        keep
    });
    before - sessions.len()
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
