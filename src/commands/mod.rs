pub mod attend;
pub mod config;
pub mod event;
pub mod events;
pub mod roles;

use std::sync::Arc;

use aayojana_core::{AayojanaConfig, AuthContext, RestStore, UserId};
use anyhow::Result;

pub use crate::utils::tui::create_spinner;

/// A configured store plus the identity commands act as.
pub struct Session {
    pub store: Arc<RestStore>,
    pub auth: AuthContext,
}

impl Session {
    /// Connect using the config file. `user` overrides the configured
    /// identity.
    pub fn connect(user: Option<String>) -> Result<Self> {
        let config = AayojanaConfig::load()?;
        let store = RestStore::new(&config)?;
        let user = user.map(UserId::new).or(config.user_id);

        tracing::debug!(url = %store.base_url(), user = ?user, "Connected");

        Ok(Session {
            store: Arc::new(store),
            auth: AuthContext::new(user),
        })
    }

    pub fn require_user(&self) -> Result<UserId> {
        self.auth.current().ok_or_else(|| {
            anyhow::anyhow!(
                "No user configured.\n\n\
                Set user_id and access_token in {}\n\
                or pass --user <ID>",
                AayojanaConfig::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "your config file".into())
            )
        })
    }
}
