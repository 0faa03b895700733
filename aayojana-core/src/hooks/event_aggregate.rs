//! One event with its ratings and feedback.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;

use crate::error::{AayojanaError, AayojanaResult};
use crate::hooks::{Generation, Refresh};
use crate::identity::{AuthContext, UserId};
use crate::model::{
    Event, EventId, Feedback, NewFeedback, NewRating, RECENT_FEEDBACK_LIMIT, Rating, RatingValue,
};
use crate::notify::{Notification, Notifier};
use crate::remote::{self, Direction, Query, RemoteStore, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct EventAggregateState {
    pub event_id: Option<EventId>,
    pub event: Option<Event>,
    pub ratings: Vec<Rating>,
    /// Newest first.
    pub feedbacks: Vec<Feedback>,
    /// The current identity's rating; 0 when unknown.
    pub user_rating: RatingValue,
    pub is_loading: bool,
}

impl Default for EventAggregateState {
    fn default() -> Self {
        EventAggregateState {
            event_id: None,
            event: None,
            ratings: Vec::new(),
            feedbacks: Vec::new(),
            user_rating: 0,
            is_loading: true,
        }
    }
}

/// Loads an event's detail, ratings and feedback as three independent
/// fetches.
///
/// `is_loading` only tracks the detail fetch. Ratings and feedback may still
/// be on their way when it turns false.
pub struct EventAggregate<S: RemoteStore> {
    store: Arc<S>,
    auth: AuthContext,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<EventAggregateState>,
    detail_generation: Generation,
    ratings_generation: Generation,
    feedback_generation: Generation,
}

impl<S: RemoteStore> EventAggregate<S> {
    pub fn new(store: Arc<S>, auth: AuthContext, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(EventAggregateState::default());
        EventAggregate {
            store,
            auth,
            notifier,
            state,
            detail_generation: Generation::default(),
            ratings_generation: Generation::default(),
            feedback_generation: Generation::default(),
        }
    }

    pub fn state(&self) -> EventAggregateState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EventAggregateState> {
        self.state.subscribe()
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.state.borrow().event_id.clone()
    }

    pub fn event(&self) -> Option<Event> {
        self.state.borrow().event.clone()
    }

    pub fn ratings(&self) -> Vec<Rating> {
        self.state.borrow().ratings.clone()
    }

    pub fn feedbacks(&self) -> Vec<Feedback> {
        self.state.borrow().feedbacks.clone()
    }

    /// The feedback an event page shows: the most recent few.
    pub fn recent_feedbacks(&self) -> Vec<Feedback> {
        self.state
            .borrow()
            .feedbacks
            .iter()
            .take(RECENT_FEEDBACK_LIMIT)
            .cloned()
            .collect()
    }

    pub fn user_rating(&self) -> RatingValue {
        self.state.borrow().user_rating
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn rating_count(&self) -> usize {
        self.state.borrow().ratings.len()
    }

    pub fn average_rating(&self) -> Option<f64> {
        let state = self.state.borrow();
        if state.ratings.is_empty() {
            return None;
        }
        let sum: u32 = state.ratings.iter().map(|r| u32::from(r.rating)).sum();
        Some(f64::from(sum) / state.ratings.len() as f64)
    }

    /// Local only: the star picker's selection before it is submitted.
    pub fn set_user_rating(&self, rating: RatingValue) {
        self.state.send_modify(|s| s.user_rating = rating);
    }

    /// Point the hook at an event. Loads everything when the id becomes
    /// set or differs from the current one; otherwise does nothing.
    pub async fn set_event_id(&self, event_id: Option<EventId>) {
        let changed = self.state.send_if_modified(|s| {
            if s.event_id == event_id {
                false
            } else {
                s.event_id = event_id.clone();
                true
            }
        });

        if changed && event_id.is_some() {
            self.reload().await;
        }
    }

    /// Run the detail, ratings and feedback fetches side by side.
    pub async fn reload(&self) {
        tokio::join!(self.fetch_event(), self.fetch_ratings(), self.fetch_feedbacks());
    }

    pub async fn fetch_event(&self) {
        let Some(event_id) = self.event_id() else {
            return;
        };
        let ticket = self.detail_generation.next();

        self.state.send_modify(|s| s.is_loading = true);

        let query = Query::from(Table::Events)
            .eq("id", event_id.as_str())
            .single();
        let event = match remote::fetch::<_, Event>(self.store.as_ref(), &query).await {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(event = %event_id, error = %e, "Failed to load event");
                self.notifier.notify(Notification::error(
                    "Error",
                    "Failed to load event details",
                ));
                None
            }
        };

        if !self.detail_generation.is_current(ticket) {
            tracing::debug!(event = %event_id, "Discarding stale event response");
            return;
        }

        self.state.send_modify(|s| {
            s.event = event;
            s.is_loading = false;
        });
    }

    /// Reload ratings and pick out the current identity's own rating.
    pub async fn fetch_ratings(&self) {
        self.load_ratings().await;
    }

    /// Returns what this call fetched, which is not published if a newer
    /// ratings fetch started in the meantime.
    async fn load_ratings(&self) -> Vec<Rating> {
        let Some(event_id) = self.event_id() else {
            return Vec::new();
        };
        let ticket = self.ratings_generation.next();

        let query = Query::from(Table::EventRatings).eq("event_id", event_id.as_str());
        let ratings = match remote::fetch::<_, Vec<Rating>>(self.store.as_ref(), &query).await {
            Ok(ratings) => ratings,
            Err(e) => {
                tracing::warn!(event = %event_id, error = %e, "Failed to load ratings");
                Vec::new()
            }
        };

        if !self.ratings_generation.is_current(ticket) {
            tracing::debug!(event = %event_id, "Discarding stale ratings response");
            return ratings;
        }

        let own = self
            .auth
            .current()
            .and_then(|user| own_rating(&ratings, &user));

        self.state.send_modify(|s| {
            if let Some(value) = own {
                s.user_rating = value;
            }
            s.ratings = ratings.clone();
        });
        ratings
    }

    pub async fn fetch_feedbacks(&self) {
        self.load_feedbacks().await;
    }

    async fn load_feedbacks(&self) -> Vec<Feedback> {
        let Some(event_id) = self.event_id() else {
            return Vec::new();
        };
        let ticket = self.feedback_generation.next();

        let query = Query::from(Table::EventFeedback)
            .eq("event_id", event_id.as_str())
            .order("created_at", Direction::Descending);
        let feedbacks = match remote::fetch::<_, Vec<Feedback>>(self.store.as_ref(), &query).await
        {
            Ok(feedbacks) => feedbacks,
            Err(e) => {
                tracing::warn!(event = %event_id, error = %e, "Failed to load feedback");
                Vec::new()
            }
        };

        if !self.feedback_generation.is_current(ticket) {
            tracing::debug!(event = %event_id, "Discarding stale feedback response");
            return feedbacks;
        }

        self.state.send_modify(|s| s.feedbacks = feedbacks.clone());
        feedbacks
    }

    /// Save the current identity's rating for the event.
    ///
    /// Looks the identity's rating row up first and updates it when there is
    /// one, so a user never ends up with two ratings for the same event
    /// through this path. Returns the ratings as fetched right after the write.
    pub async fn submit_rating(&self, rating: RatingValue) -> AayojanaResult<Vec<Rating>> {
        if !(1..=5).contains(&rating) {
            return Err(AayojanaError::InvalidRating(rating));
        }
        let user = self.auth.current().ok_or(AayojanaError::AuthRequired)?;
        let event_id = self.event_id().ok_or(AayojanaError::NoEventSelected)?;

        let result = self.write_rating(&event_id, &user, rating).await;
        if let Err(e) = &result {
            self.notifier
                .notify(Notification::error("Error", format!("Failed to submit rating: {e}")));
        }
        result?;

        self.state.send_modify(|s| s.user_rating = rating);
        self.notifier.notify(Notification::success(
            "Rating submitted",
            "Thank you for rating this event",
        ));

        Ok(self.load_ratings().await)
    }

    async fn write_rating(
        &self,
        event_id: &EventId,
        user: &UserId,
        rating: RatingValue,
    ) -> AayojanaResult<()> {
        let existing_query = Query::from(Table::EventRatings)
            .eq("event_id", event_id.as_str())
            .eq("user_id", user.as_str());
        let existing: Vec<Rating> = remote::fetch(self.store.as_ref(), &existing_query).await?;

        let write = match existing.first() {
            Some(row) => Query::update(Table::EventRatings, json!({ "rating": rating }))?
                .eq("id", row.id.as_str()),
            None => Query::insert(
                Table::EventRatings,
                NewRating {
                    event_id: event_id.clone(),
                    user_id: user.clone(),
                    rating,
                },
            )?,
        };

        remote::mutate(self.store.as_ref(), &write).await
    }

    /// Post a feedback entry for the event, then reload feedback. Returns the
    /// feedback as fetched right after the insert.
    pub async fn submit_feedback(&self, text: &str) -> AayojanaResult<Vec<Feedback>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AayojanaError::EmptyFeedback);
        }
        let user = self.auth.current().ok_or(AayojanaError::AuthRequired)?;
        let event_id = self.event_id().ok_or(AayojanaError::NoEventSelected)?;

        let insert = Query::insert(
            Table::EventFeedback,
            NewFeedback {
                event_id,
                user_id: user,
                feedback: text.to_string(),
            },
        )?;

        if let Err(e) = remote::mutate(self.store.as_ref(), &insert).await {
            self.notifier
                .notify(Notification::error("Error", format!("Failed to submit feedback: {e}")));
            return Err(e);
        }

        self.notifier.notify(Notification::success(
            "Feedback submitted",
            "Thank you for your feedback",
        ));

        Ok(self.load_feedbacks().await)
    }
}

impl<S: RemoteStore> Refresh for EventAggregate<S> {
    async fn refresh(&self) {
        self.reload().await
    }
}

fn own_rating(ratings: &[Rating], user: &UserId) -> Option<RatingValue> {
    ratings.iter().find(|r| &r.user_id == user).map(|r| r.rating)
}
