//! Process-wide admin session flag.
//!
//! Created once at startup from the auth capability's change feed and
//! shut down explicitly; handlers reach it through `AppState`.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::store::auth::{AdminAuth, Session};

pub struct SessionGate {
    receiver: watch::Receiver<Option<Session>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl SessionGate {
    /// Subscribes to session changes. Must be called inside a tokio runtime.
    pub fn init(auth: &AdminAuth) -> Self {
        let receiver = auth.on_session_change();

        let mut changes = receiver.clone();
        let listener = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                match changes.borrow_and_update().as_ref() {
                    Some(session) => {
                        tracing::info!(session_id = %session.id, "admin session active")
                    }
                    None => tracing::info!("admin session ended"),
                }
            }
            tracing::debug!("session feed closed");
        });

        Self {
            receiver,
            listener: Mutex::new(Some(listener)),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.receiver.borrow().is_some()
    }

    pub fn current(&self) -> Option<Session> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        self.receiver.borrow().clone()
    }

    /// True when `session_id` is the live session.
    pub fn is_current(&self, session_id: &str) -> bool {
        self.current().is_some_and(|s| s.id == session_id)
    }

    /// Stops listening. Afterwards the gate reports no session.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(listener) = self.listener.lock().await.take() {
            listener.abort();
            let _ = listener.await;
            tracing::debug!("session listener stopped");
        }
    }
}
