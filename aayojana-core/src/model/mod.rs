//! Row types for the remote tables.
//!
//! Field names follow the column names of the hosted backend so rows
//! deserialize straight out of query responses.

mod attendance;
mod event;
mod feedback;
mod rating;
mod role;

pub use attendance::{Attendance, AttendanceStats, AttendanceStatus, NewAttendance};
pub use event::{Event, EventId, EventSummary};
pub use feedback::{Feedback, NewFeedback, RECENT_FEEDBACK_LIMIT};
pub use rating::{NewRating, Rating, RatingValue};
pub use role::{NewUserRole, Role, UserRole};
