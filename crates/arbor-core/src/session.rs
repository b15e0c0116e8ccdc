use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Handle to one in-flight generation attempt.
///
/// Cloneable; the token is shared, so cancelling any clone cancels the turn.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub cancel_token: CancellationToken,
}

impl SessionHandle {
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Tracks the single session that is allowed to mutate visible state.
///
/// Starting a new session cancels and supersedes any live one, so at most one
/// generation can ever write to the tree. Downstream writers must guard every
/// write with [`SessionRegistry::is_active`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<Option<SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh session as active, cancelling any previous one first.
    pub fn begin(&self) -> SessionHandle {
        let handle = SessionHandle {
            id: Uuid::new_v4(),
            cancel_token: CancellationToken::new(),
        };

        let mut active = self.active.lock().expect("session registry poisoned");
        if let Some(previous) = active.take() {
            tracing::debug!(
                superseded = %previous.id,
                new_session = %handle.id,
                "SessionRegistry: superseding active session"
            );
            previous.cancel_token.cancel();
        }
        *active = Some(handle.clone());
        handle
    }

    /// True only while `session_id` is the currently active session.
    pub fn is_active(&self, session_id: Uuid) -> bool {
        self.active
            .lock()
            .expect("session registry poisoned")
            .as_ref()
            .map(|handle| handle.id == session_id)
            .unwrap_or(false)
    }

    /// Clear the active pointer if `session_id` still owns it.
    ///
    /// Returns whether this call cleared the pointer. A late-finishing
    /// superseded turn gets `false` and must leave newer state alone.
    pub fn complete(&self, session_id: Uuid) -> bool {
        let mut active = self.active.lock().expect("session registry poisoned");
        match active.as_ref() {
            Some(handle) if handle.id == session_id => {
                *active = None;
                true
            }
            _ => false,
        }
    }

    /// Cooperatively cancel the active session, if any. The owning turn is
    /// responsible for calling [`SessionRegistry::complete`] as it unwinds.
    pub fn cancel_active(&self) {
        let active = self.active.lock().expect("session registry poisoned");
        if let Some(handle) = active.as_ref() {
            tracing::debug!(session = %handle.id, "SessionRegistry: cancelling active session");
            handle.cancel_token.cancel();
        }
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
            .lock()
            .expect("session registry poisoned")
            .as_ref()
            .map(|handle| handle.id)
    }
}
