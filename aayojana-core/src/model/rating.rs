use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::model::EventId;

/// Rating values are whole stars. 0 means "not rated" in view state.
pub type RatingValue = u8;

/// A row of the `event_ratings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: String,
    pub event_id: EventId,
    pub user_id: UserId,
    pub rating: RatingValue,
}

/// Insert payload for `event_ratings`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRating {
    pub event_id: EventId,
    pub user_id: UserId,
    pub rating: RatingValue,
}
