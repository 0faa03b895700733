//! The signed-in identity and the context that publishes it.
//!
//! Hooks never own the identity. They are handed an [`AuthContext`] and read
//! the current value when they fetch, or subscribe to be told when it changes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Opaque user reference issued by the backend's auth service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publishes the current identity (or none) to every hook that holds a clone.
#[derive(Clone)]
pub struct AuthContext {
    tx: watch::Sender<Option<UserId>>,
}

impl AuthContext {
    pub fn new(user: Option<UserId>) -> Self {
        let (tx, _rx) = watch::channel(user);
        AuthContext { tx }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn current(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    pub fn sign_in(&self, user: UserId) {
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// Receiver that wakes on every sign-in or sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
