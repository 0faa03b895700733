//! View-state hooks over the remote store.
//!
//! Each hook owns a `watch` channel with its current state. Front-ends take
//! snapshots or subscribe to changes; mutators write to the store and then
//! refetch the affected collection before they return, so what a caller sees
//! after an `Ok` is what the store holds.
//!
//! Fetch failures never reach the caller. They are logged and the state
//! falls back to empty, which keeps every view renderable.

mod attendance;
mod catalog;
mod event_aggregate;
mod roles;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;

use crate::identity::AuthContext;

pub use attendance::{AttendanceState, AttendanceTracker};
pub use catalog::{CatalogState, EventCatalog};
pub use event_aggregate::{EventAggregate, EventAggregateState};
pub use roles::{RoleResolver, RolesState};

/// Request numbering for one kind of fetch.
///
/// Every fetch takes a ticket before it goes out and may only publish its
/// result if no newer fetch of the same kind has started since. A slow
/// response for an old identity or event therefore cannot overwrite the
/// answer to a newer request.
#[derive(Debug, Default)]
pub(crate) struct Generation(AtomicU64);

impl Generation {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

/// A hook whose data depends on the signed-in identity.
pub trait Refresh: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = ()> + Send;
}

/// Fetch once now and again after every sign-in or sign-out.
///
/// Changes that arrive while a fetch is running are coalesced into a single
/// follow-up fetch. The task ends when the auth context is dropped.
pub fn follow_identity<H: Refresh>(hook: Arc<H>, auth: &AuthContext) -> JoinHandle<()> {
    let mut changes = auth.subscribe();

    tokio::spawn(async move {
        changes.mark_unchanged();
        hook.refresh().await;

        while changes.changed().await.is_ok() {
            changes.mark_unchanged();
            hook.refresh().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_ticket_is_current() {
        let generation = Generation::default();
        let first = generation.next();
        let second = generation.next();

        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
