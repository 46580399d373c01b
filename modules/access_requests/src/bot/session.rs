use dashmap::DashMap;

use crate::contract::model::Identity;

/// What the next plain text message from a user means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationMode {
    #[default]
    Idle,
    /// The next text message is a media link, consumed once.
    AwaitingLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub mode: ConversationMode,
    /// Page of the pending list the admin is looking at (1-based).
    pub admin_page: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            mode: ConversationMode::Idle,
            admin_page: 1,
        }
    }
}

/// Per-identity conversation state.
#[derive(Default)]
pub struct SessionStore {
    inner: DashMap<Identity, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: Identity) -> Session {
        self.inner
            .get(&identity)
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// Mutate the session of `identity` in place and return what `f` returns.
    pub fn update<R>(&self, identity: Identity, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut entry = self.inner.entry(identity).or_default();
        f(entry.value_mut())
    }

    /// Reset the mode to idle, returning the mode that was active.
    pub fn take_mode(&self, identity: Identity) -> ConversationMode {
        self.update(identity, |s| std::mem::take(&mut s.mode))
    }
}
