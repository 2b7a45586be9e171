//! SessionStore: concurrent per-session access via DashMap.
//!
//! The map is sharded, so unrelated sessions never wait on each other.
//! Each session sits behind its own async mutex; the mutex is only held for
//! snapshot reads and appends, never across an external call.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use grounded_domain::{Role, Session, Turn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_access: Instant,
}

impl SessionEntry {
    fn new(id: &str, now: Instant) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(id))),
            last_access: now,
        }
    }

    /// A new entry whose history starts with one exchange.
    fn with_exchange(id: &str, now: Instant, question: &str, answer: &str) -> Self {
        let mut session = Session::new(id);
        session.append_exchange(question, answer);
        Self {
            session: Arc::new(Mutex::new(session)),
            last_access: now,
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_access) > ttl
    }
}

/// Resolved session returned by [`SessionStore::get_or_create`].
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    session: Arc<Mutex<Session>>,
    created: bool,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when this call created the session (new id, unknown id or expired).
    pub fn was_created(&self) -> bool {
        self.created
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("created", &self.created)
            .finish()
    }
}

/// Maps session ids to ordered conversation histories with idle expiry.
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve a session, creating it when the id is absent, unknown or expired.
    ///
    /// An expired session is never handed back: it is replaced by an empty one
    /// under the same id.
    pub fn get_or_create(&self, session_id: Option<&str>) -> SessionHandle {
        let id = match session_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let now = Instant::now();

        let (session, created) = match self.sessions.entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now, self.ttl) {
                    debug!(session_id = %id, "Session expired, starting a fresh history");
                    occupied.insert(SessionEntry::new(&id, now));
                    (Arc::clone(&occupied.get().session), true)
                } else {
                    occupied.get_mut().last_access = now;
                    (Arc::clone(&occupied.get().session), false)
                }
            }
            Entry::Vacant(vacant) => {
                debug!(session_id = %id, "Creating session");
                let entry = vacant.insert(SessionEntry::new(&id, now));
                (Arc::clone(&entry.session), true)
            }
        };

        SessionHandle {
            id,
            session,
            created,
        }
    }

    /// Snapshot of the last `k` turns of the session. Also refreshes its idle timer.
    pub async fn recent_history(&self, handle: &SessionHandle, k: usize) -> Vec<Turn> {
        self.touch(handle);
        handle.session.lock().await.recent(k).to_vec()
    }

    /// Append one turn to a live session. Returns false if the id is unknown or expired.
    pub async fn append(&self, session_id: &str, role: Role, content: impl Into<String>) -> bool {
        let Some(session) = self.live_session(session_id) else {
            return false;
        };
        session.lock().await.push(Turn::new(role, content));
        true
    }

    /// Append a question and its answer under a single lock acquisition.
    ///
    /// Concurrent exchanges on the same session are serialized, so a user
    /// turn is always directly followed by its own assistant turn.
    ///
    /// The exchange always lands in the live session for the handle's id.
    /// If the session was replaced while the query was in flight, the
    /// replacement receives it. If it expired or was swept, a fresh session
    /// holding only this exchange takes its place; stale turns never return.
    pub async fn append_exchange(&self, handle: &SessionHandle, question: &str, answer: &str) {
        let now = Instant::now();
        let live = match self.sessions.entry(handle.id.clone()) {
            Entry::Occupied(mut occupied) if !occupied.get().is_expired(now, self.ttl) => {
                if !Arc::ptr_eq(&occupied.get().session, &handle.session) {
                    debug!(
                        session_id = %handle.id,
                        "Session was replaced during the query, appending to the live one"
                    );
                }
                let entry = occupied.get_mut();
                entry.last_access = now;
                Arc::clone(&entry.session)
            }
            Entry::Occupied(mut occupied) => {
                debug!(
                    session_id = %handle.id,
                    "Session expired during the query, starting a fresh history"
                );
                occupied.insert(SessionEntry::with_exchange(&handle.id, now, question, answer));
                return;
            }
            Entry::Vacant(vacant) => {
                debug!(
                    session_id = %handle.id,
                    "Session was swept during the query, starting a fresh history"
                );
                vacant.insert(SessionEntry::with_exchange(&handle.id, now, question, answer));
                return;
            }
        };

        live.lock().await.append_exchange(question, answer);
    }

    /// Full history of a live session, for audit and display.
    pub async fn history(&self, session_id: &str) -> Option<Vec<Turn>> {
        let session = self.live_session(session_id)?;
        let history = session.lock().await.history().to_vec();
        Some(history)
    }

    /// Drop every session idle for longer than the TTL. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let keep = !entry.is_expired(now, self.ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `interval` until `token` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = store.sweep_expired();
                        if removed > 0 {
                            debug!(removed, remaining = store.len(), "Swept expired sessions");
                        }
                    }
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn touch(&self, handle: &SessionHandle) {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(&handle.id) {
            if Arc::ptr_eq(&entry.session, &handle.session) && !entry.is_expired(now, self.ttl) {
                entry.last_access = now;
            }
        }
    }

    fn live_session(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        let now = Instant::now();
        let entry = self.sessions.get(session_id)?;
        if entry.is_expired(now, self.ttl) {
            return None;
        }
        Some(Arc::clone(&entry.session))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_get_or_create_without_id_generates_unique_ids() {
        let store = SessionStore::new(TTL);
        let a = store.get_or_create(None);
        let b = store.get_or_create(None);

        assert_ne!(a.id(), b.id());
        assert!(a.was_created());
        assert!(Uuid::parse_str(a.id()).is_ok());
        assert!(store.recent_history(&a, 3).await.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_created_empty() {
        let store = SessionStore::new(TTL);
        let handle = store.get_or_create(Some("customer-42"));
        assert_eq!(handle.id(), "customer-42");
        assert!(handle.was_created());
        assert_eq!(store.history("customer-42").await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_known_id_returns_same_history() {
        let store = SessionStore::new(TTL);
        let first = store.get_or_create(Some("s"));
        store.append_exchange(&first, "q", "a").await;

        let second = store.get_or_create(Some("s"));
        assert!(!second.was_created());
        assert_eq!(store.recent_history(&second, 3).await.len(), 2);
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_is_rejected() {
        let store = SessionStore::new(TTL);
        assert!(!store.append("missing", Role::User, "hi").await);

        store.get_or_create(Some("known"));
        assert!(store.append("known", Role::User, "hi").await);
        assert_eq!(store.history("known").await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_recreated_empty() {
        let store = SessionStore::new(Duration::from_secs(10));
        let handle = store.get_or_create(Some("s"));
        store.append_exchange(&handle, "q", "a").await;

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(store.history("s").await.is_none());
        let fresh = store.get_or_create(Some("s"));
        assert!(fresh.was_created());
        assert!(store.recent_history(&fresh, 3).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_refreshes_idle_timer() {
        let store = SessionStore::new(Duration::from_secs(10));
        let handle = store.get_or_create(Some("s"));
        store.append_exchange(&handle, "q", "a").await;

        tokio::time::advance(Duration::from_secs(8)).await;
        let again = store.get_or_create(Some("s"));
        assert!(!again.was_created());

        tokio::time::advance(Duration::from_secs(8)).await;
        let still = store.get_or_create(Some("s"));
        assert!(!still.was_created());
        assert_eq!(store.recent_history(&still, 3).await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(10));
        store.get_or_create(Some("old"));
        tokio::time::advance(Duration::from_secs(6)).await;
        store.get_or_create(Some("new"));
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.history("new").await.is_some());
    }

    fn contents(history: &[Turn]) -> Vec<&str> {
        history.iter().map(Turn::content).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_after_sweep_starts_fresh_history() {
        let store = SessionStore::new(Duration::from_secs(10));
        let handle = store.get_or_create(Some("s"));
        store.append_exchange(&handle, "q-old", "a-old").await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.sweep_expired(), 1);

        store.append_exchange(&handle, "q", "a").await;
        let history = store.history("s").await.unwrap();
        assert_eq!(contents(&history), vec!["q", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_after_lazy_recreate_lands_in_live_session() {
        let store = SessionStore::new(Duration::from_secs(10));
        let in_flight = store.get_or_create(Some("s"));
        store.append_exchange(&in_flight, "q-old", "a-old").await;

        tokio::time::advance(Duration::from_secs(11)).await;
        let recreated = store.get_or_create(Some("s"));
        assert!(recreated.was_created());

        store.append_exchange(&in_flight, "q", "a").await;
        let history = store.history("s").await.unwrap();
        assert_eq!(contents(&history), vec!["q", "a"]);
        assert_eq!(store.recent_history(&recreated, 3).await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_on_unnoticed_expiry_starts_fresh_history() {
        let store = SessionStore::new(Duration::from_secs(10));
        let handle = store.get_or_create(Some("s"));
        store.append_exchange(&handle, "q-old", "a-old").await;

        tokio::time::advance(Duration::from_secs(11)).await;

        store.append_exchange(&handle, "q", "a").await;
        let history = store.history("s").await.unwrap();
        assert_eq!(contents(&history), vec!["q", "a"]);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reading_history_keeps_in_flight_session_alive() {
        let store = SessionStore::new(Duration::from_secs(10));
        let handle = store.get_or_create(Some("s"));
        store.append_exchange(&handle, "q1", "a1").await;

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.recent_history(&handle, 3).await.len(), 2);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(store.sweep_expired(), 0);

        store.append_exchange(&handle, "q2", "a2").await;
        let history = store.history("s").await.unwrap();
        assert_eq!(contents(&history), vec!["q1", "a1", "q2", "a2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_stops_on_cancel() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(5)));
        store.get_or_create(Some("s"));

        let token = CancellationToken::new();
        let sweeper = store.spawn_sweeper(Duration::from_secs(1), token.clone());

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(store.is_empty());

        token.cancel();
        sweeper.await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_exchanges_never_interleave() {
        let store = Arc::new(SessionStore::new(TTL));
        let handle = store.get_or_create(Some("shared"));

        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .append_exchange(&handle, &format!("q{i}"), &format!("a{i}"))
                    .await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let history = store.history("shared").await.unwrap();
        assert_eq!(history.len(), 32);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[1].role(), Role::Assistant);
            assert_eq!(&pair[0].content()[1..], &pair[1].content()[1..]);
        }
    }
}
