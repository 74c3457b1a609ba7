use parking_lot::RwLock;
use std::sync::Arc;

use crate::mirror::MirrorDom;
use crate::widget::AddressWidget;

/// An attached widget together with the page mirror it writes to.
pub struct Session {
    pub widget: AddressWidget,
    pub dom: Arc<MirrorDom>,
}

pub struct AppState {
    session: RwLock<Option<Arc<Session>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: RwLock::new(None),
        }
    }
}

impl AppState {
    /// Clone out the current session so the lock is not held across an await.
    pub fn current(&self) -> Result<Arc<Session>, String> {
        self.session
            .read()
            .clone()
            .ok_or_else(|| "No address widget attached".to_string())
    }

    /// Install a new session, detaching the one it replaces.
    pub fn replace(&self, session: Option<Session>) -> Option<Arc<Session>> {
        let previous = std::mem::replace(&mut *self.session.write(), session.map(Arc::new));
        if let Some(old) = &previous {
            old.widget.detach();
        }
        previous
    }
}
