//! SessionManager - per-user conversation state and inactivity timers.
//!
//! State is keyed by (chat, user) and created lazily. Each state sits behind
//! its own async mutex; a handler holds it for the whole inbound event, so
//! events of one user are serialized while different users run in parallel.
//!
//! There is at most one pending timer per key: [`SessionManager::touch`]
//! aborts the previous one before scheduling the next.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::foundation::SessionKey;
use crate::domain::session::ConversationState;
use crate::ports::{ChatSender, OutboundMessage};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(180);

type SharedState = Arc<Mutex<ConversationState>>;

struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct SessionManager {
    sessions: Mutex<HashMap<SessionKey, SharedState>>,
    timers: Arc<Mutex<HashMap<SessionKey, Timer>>>,
    generation: AtomicU64,
    chat: Arc<dyn ChatSender>,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(chat: Arc<dyn ChatSender>, timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timers: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            chat,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The state for `key`, created on first use.
    pub async fn session(&self, key: SessionKey) -> SharedState {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key)
            .or_insert_with(|| {
                debug!(chat_id = key.chat_id.value(), user_id = key.user_id.value(), "Created session");
                Arc::new(Mutex::new(ConversationState::new(key)))
            })
            .clone()
    }

    /// Records activity: cancels the pending timer and schedules a new one.
    pub async fn touch(&self, key: SessionKey) {
        let state = self.session(key).await;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let mut timers = self.timers.lock().await;
        if let Some(previous) = timers.remove(&key) {
            previous.handle.abort();
        }

        let handle = tokio::spawn(expire_after(
            self.timeout,
            key,
            generation,
            state,
            Arc::clone(&self.timers),
            Arc::clone(&self.chat),
        ));
        timers.insert(key, Timer { generation, handle });
    }

    /// Cancels the pending timer for `key`, if any.
    pub async fn cancel(&self, key: SessionKey) {
        if let Some(timer) = self.timers.lock().await.remove(&key) {
            timer.handle.abort();
        }
    }

    pub async fn pending_timers(&self) -> usize {
        self.timers.lock().await.len()
    }
}

async fn expire_after(
    timeout: Duration,
    key: SessionKey,
    generation: u64,
    state: SharedState,
    timers: Arc<Mutex<HashMap<SessionKey, Timer>>>,
    chat: Arc<dyn ChatSender>,
) {
    tokio::time::sleep(timeout).await;

    // A handler may hold the state past the deadline; it touches again when
    // done, so the generation is only checked once the state is ours.
    let mut state = state.lock().await;
    {
        let mut timers = timers.lock().await;
        match timers.get(&key) {
            Some(timer) if timer.generation == generation => {
                timers.remove(&key);
            }
            // Replaced while we were waiting
            _ => return,
        }
    }

    let expired = state.expire();
    drop(state);
    if !expired {
        return;
    }

    info!(
        chat_id = key.chat_id.value(),
        user_id = key.user_id.value(),
        "Session expired after inactivity"
    );
    let notice = OutboundMessage::text(expiry_notice(timeout));
    if let Err(e) = chat.send(key.chat_id, notice).await {
        warn!(error = %e, "Failed to send session expiry notice");
    }
}

fn expiry_notice(timeout: Duration) -> String {
    let secs = timeout.as_secs();
    let span = if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs} s")
    };
    format!(
        "Session closed after {span} of inactivity. Press a button on the last preview to continue, or send a new message."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::RecordingChat;
    use crate::domain::extraction::{ExtractionResult, NewTask};
    use crate::domain::foundation::{ChatId, UserId};
    use crate::domain::session::ConversationMode;

    fn key(user: i64) -> SessionKey {
        SessionKey::new(ChatId::new(100), UserId::new(user))
    }

    fn manager(chat: &RecordingChat) -> SessionManager {
        SessionManager::new(Arc::new(chat.clone()), DEFAULT_SESSION_TIMEOUT)
    }

    async fn previewing(manager: &SessionManager, key: SessionKey) {
        let state = manager.session(key).await;
        let result = ExtractionResult {
            tasks_new: vec![NewTask::titled("Buy milk")],
            ..Default::default()
        };
        state.lock().await.preview("buy milk".into(), result).unwrap();
    }

    #[tokio::test]
    async fn session_is_created_once_per_key() {
        let chat = RecordingChat::new();
        let manager = manager(&chat);
        let a = manager.session(key(1)).await;
        let b = manager.session(key(1)).await;
        let c = manager.session(key(2)).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expires_active_session_and_notifies() {
        let chat = RecordingChat::new();
        let manager = manager(&chat);
        previewing(&manager, key(1)).await;

        manager.touch(key(1)).await;
        tokio::time::sleep(Duration::from_secs(181)).await;

        let state = manager.session(key(1)).await;
        let state = state.lock().await;
        assert_eq!(state.mode(), ConversationMode::Expired);
        assert!(state.pending_result().is_some());
        assert_eq!(chat.sent().len(), 1);
        assert!(chat.texts()[0].contains("3 min"));
        assert_eq!(manager.pending_timers().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn touch_replaces_the_pending_timer() {
        let chat = RecordingChat::new();
        let manager = manager(&chat);
        previewing(&manager, key(1)).await;

        manager.touch(key(1)).await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        manager.touch(key(1)).await;
        assert_eq!(manager.pending_timers().await, 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(chat.sent().is_empty());
        let mode = manager.session(key(1)).await.lock().await.mode();
        assert_eq!(mode, ConversationMode::Previewing);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(chat.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_waiting_on_a_busy_session_yields_to_a_later_touch() {
        let chat = RecordingChat::new();
        let manager = manager(&chat);
        previewing(&manager, key(1)).await;
        manager.touch(key(1)).await;

        let state = manager.session(key(1)).await;
        let guard = state.lock().await;
        tokio::time::sleep(Duration::from_secs(200)).await;
        manager.touch(key(1)).await;
        drop(guard);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(chat.sent().is_empty());
        assert_eq!(state.lock().await.mode(), ConversationMode::Previewing);
        assert_eq!(manager.pending_timers().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_expires_silently() {
        let chat = RecordingChat::new();
        let manager = manager(&chat);

        manager.touch(key(1)).await;
        tokio::time::sleep(Duration::from_secs(200)).await;

        assert!(chat.sent().is_empty());
        let mode = manager.session(key(1)).await.lock().await.mode();
        assert_eq!(mode, ConversationMode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_timer() {
        let chat = RecordingChat::new();
        let manager = manager(&chat);
        previewing(&manager, key(1)).await;

        manager.touch(key(1)).await;
        manager.cancel(key(1)).await;
        tokio::time::sleep(Duration::from_secs(400)).await;

        assert!(chat.sent().is_empty());
        assert_eq!(manager.pending_timers().await, 0);
    }

    #[test]
    fn notice_formats_whole_minutes() {
        assert!(expiry_notice(Duration::from_secs(180)).contains("3 min"));
        assert!(expiry_notice(Duration::from_secs(45)).contains("45 s"));
    }
}
