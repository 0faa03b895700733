//! Event registrations of the signed-in identity.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;

use crate::error::{AayojanaError, AayojanaResult};
use crate::hooks::{Generation, Refresh};
use crate::identity::{AuthContext, UserId};
use crate::model::{
    Attendance, AttendanceStats, AttendanceStatus, EventId, EventSummary, NewAttendance,
};
use crate::remote::{self, Direction, Query, RemoteStore, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceState {
    /// Newest registration first.
    pub attendances: Vec<Attendance>,
    pub loading: bool,
}

impl Default for AttendanceState {
    fn default() -> Self {
        AttendanceState {
            attendances: Vec::new(),
            loading: true,
        }
    }
}

/// Tracks which events the current identity registered for and how that
/// went.
///
/// Nothing stops two overlapping `register_for_event` calls for the same
/// event from both inserting. Duplicates are only prevented if the backend
/// has a unique constraint on (user_id, event_id).
pub struct AttendanceTracker<S: RemoteStore> {
    store: Arc<S>,
    auth: AuthContext,
    state: watch::Sender<AttendanceState>,
    generation: Generation,
}

impl<S: RemoteStore> AttendanceTracker<S> {
    pub fn new(store: Arc<S>, auth: AuthContext) -> Self {
        let (state, _) = watch::channel(AttendanceState::default());
        AttendanceTracker {
            store,
            auth,
            state,
            generation: Generation::default(),
        }
    }

    pub fn state(&self) -> AttendanceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AttendanceState> {
        self.state.subscribe()
    }

    pub fn attendances(&self) -> Vec<Attendance> {
        self.state.borrow().attendances.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn attendance_stats(&self) -> AttendanceStats {
        AttendanceStats::from_attendances(&self.state.borrow().attendances)
    }

    pub fn attendance_for(&self, event_id: &EventId) -> Option<Attendance> {
        self.state
            .borrow()
            .attendances
            .iter()
            .find(|a| &a.event_id == event_id)
            .cloned()
    }

    pub fn is_registered(&self, event_id: &EventId) -> bool {
        self.state
            .borrow()
            .attendances
            .iter()
            .any(|a| &a.event_id == event_id)
    }

    pub async fn refresh_attendances(&self) {
        self.reload().await;
    }

    /// Fetch and publish the list. Returns what this call fetched, which is
    /// not published if a newer fetch started in the meantime.
    async fn reload(&self) -> Vec<Attendance> {
        let ticket = self.generation.next();

        let Some(user) = self.auth.current() else {
            self.publish(ticket, Vec::new());
            return Vec::new();
        };

        self.state.send_modify(|s| s.loading = true);

        let attendances = match self.fetch_attendances(&user).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Failed to load attendances");
                Vec::new()
            }
        };

        self.publish(ticket, attendances.clone());
        attendances
    }

    /// Register the current identity for an event, then reload the list.
    ///
    /// Returns the list as fetched right after the insert.
    pub async fn register_for_event(&self, event_id: &EventId) -> AayojanaResult<Vec<Attendance>> {
        let user = self.auth.current().ok_or(AayojanaError::AuthRequired)?;

        let insert = Query::insert(
            Table::EventAttendances,
            NewAttendance {
                user_id: user.clone(),
                event_id: event_id.clone(),
                status: AttendanceStatus::Registered,
                registered_at: Utc::now(),
            },
        )?;
        remote::mutate(self.store.as_ref(), &insert).await?;
        tracing::debug!(user = %user, event = %event_id, "Registered for event");

        Ok(self.reload().await)
    }

    /// Move the current identity's registration for an event to `status`,
    /// then reload the list. Returns the list as fetched right after the
    /// update.
    pub async fn update_attendance_status(
        &self,
        event_id: &EventId,
        status: AttendanceStatus,
    ) -> AayojanaResult<Vec<Attendance>> {
        let user = self.auth.current().ok_or(AayojanaError::AuthRequired)?;

        let update = Query::update(Table::EventAttendances, json!({ "status": status }))?
            .eq("user_id", user.as_str())
            .eq("event_id", event_id.as_str());
        remote::mutate(self.store.as_ref(), &update).await?;
        tracing::debug!(user = %user, event = %event_id, status = %status, "Updated attendance");

        Ok(self.reload().await)
    }

    async fn fetch_attendances(&self, user: &UserId) -> AayojanaResult<Vec<Attendance>> {
        let query = Query::from(Table::EventAttendances)
            .embed(Table::Events, "event_id", &EventSummary::COLUMNS)
            .eq("user_id", user.as_str())
            .order("registered_at", Direction::Descending);

        remote::fetch(self.store.as_ref(), &query).await
    }

    fn publish(&self, ticket: u64, attendances: Vec<Attendance>) {
        if !self.generation.is_current(ticket) {
            tracing::debug!("Discarding stale attendance response");
            return;
        }

        self.state.send_replace(AttendanceState {
            attendances,
            loading: false,
        });
    }
}

impl<S: RemoteStore> Refresh for AttendanceTracker<S> {
    async fn refresh(&self) {
        self.refresh_attendances().await
    }
}
