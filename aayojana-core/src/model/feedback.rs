use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::model::EventId;

/// How many feedback entries an event page shows.
pub const RECENT_FEEDBACK_LIMIT: usize = 5;

/// A row of the `event_feedback` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub event_id: EventId,
    pub user_id: UserId,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `event_feedback`.
#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback {
    pub event_id: EventId,
    pub user_id: UserId,
    pub feedback: String,
}
