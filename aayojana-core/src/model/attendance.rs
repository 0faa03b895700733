use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::model::{EventId, EventSummary};

/// Stored as `registered`, `attended` or `no-show`. Rows written with
/// `no_show` are read too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Registered,
    Attended,
    #[serde(rename = "no-show", alias = "no_show")]
    NoShow,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Registered => "registered",
            AttendanceStatus::Attended => "attended",
            AttendanceStatus::NoShow => "no-show",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "registered" => Ok(AttendanceStatus::Registered),
            "attended" => Ok(AttendanceStatus::Attended),
            "no_show" => Ok(AttendanceStatus::NoShow),
            _ => Err(format!(
                "Unknown status '{}'. Expected one of: registered, attended, no-show",
                s
            )),
        }
    }
}

/// A row of the `event_attendances` table, with the event summary embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: String,
    pub user_id: UserId,
    pub event_id: EventId,
    pub registered_at: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    /// Embedded `events` resource; absent when the event row is gone.
    #[serde(rename = "events", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummary>,
}

/// Insert payload for `event_attendances`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAttendance {
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: AttendanceStatus,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub total_events: usize,
    pub attended_events: usize,
    pub upcoming_events: usize,
}

impl AttendanceStats {
    /// No-shows only count toward the total.
    pub fn from_attendances(attendances: &[Attendance]) -> Self {
        let count = |status| attendances.iter().filter(|a| a.status == status).count();

        AttendanceStats {
            total_events: attendances.len(),
            attended_events: count(AttendanceStatus::Attended),
            upcoming_events: count(AttendanceStatus::Registered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendance(event: &str, status: AttendanceStatus) -> Attendance {
        let now = Utc::now();
        Attendance {
            id: format!("a-{event}"),
            user_id: UserId::from("u1"),
            event_id: EventId::from(event),
            registered_at: now,
            status,
            created_at: now,
            event: None,
        }
    }

    #[test]
    fn stats_split_by_status() {
        use AttendanceStatus::*;
        let rows: Vec<_> = [Registered, Registered, Attended, Attended, Attended, NoShow]
            .into_iter()
            .enumerate()
            .map(|(i, s)| attendance(&i.to_string(), s))
            .collect();

        assert_eq!(
            AttendanceStats::from_attendances(&rows),
            AttendanceStats {
                total_events: 6,
                attended_events: 3,
                upcoming_events: 2,
            }
        );
    }

    #[test]
    fn stats_of_nothing_are_zero() {
        assert_eq!(AttendanceStats::from_attendances(&[]), AttendanceStats::default());
    }

    #[test]
    fn status_accepts_dashed_no_show() {
        assert_eq!("no-show".parse::<AttendanceStatus>(), Ok(AttendanceStatus::NoShow));
        assert_eq!("Attended".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Attended));
        assert!("maybe".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn embedded_event_is_read_from_events_key() {
        let row: Attendance = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "user_id": "u1",
            "event_id": "e1",
            "registered_at": "2025-03-01T10:00:00+00:00",
            "status": "no_show",
            "created_at": "2025-03-01T10:00:00+00:00",
            "events": {"id": "e1", "title": "Jazz Night", "date": "2025-03-20"}
        }))
        .unwrap();

        assert_eq!(row.status, AttendanceStatus::NoShow);
        assert_eq!(row.event.unwrap().title, "Jazz Night");
    }

    #[test]
    fn no_show_is_written_dashed_and_read_either_way() {
        assert_eq!(serde_json::json!(AttendanceStatus::NoShow), "no-show");
        assert_eq!(AttendanceStatus::NoShow.to_string(), "no-show");

        for spelling in ["no-show", "no_show"] {
            let status: AttendanceStatus = serde_json::from_value(spelling.into()).unwrap();
            assert_eq!(status, AttendanceStatus::NoShow);
        }
    }
}
