//! Client-side data hooks for the aayojana event platform.
//!
//! This crate provides:
//! - `model` types for the rows of the hosted backend's tables
//! - `remote` for the store contract, a REST client and an in-memory store
//! - `hooks` that keep view state for roles, attendance, events and their
//!   ratings and feedback

pub mod config;
pub mod error;
pub mod hooks;
pub mod identity;
pub mod model;
pub mod notify;
pub mod remote;

pub use config::AayojanaConfig;
pub use error::{AayojanaError, AayojanaResult};
pub use identity::{AuthContext, UserId};
pub use notify::{LogNotifier, Notification, Notifier, Severity};
pub use remote::{MemoryStore, RemoteError, RemoteStore, RestStore, Table};
