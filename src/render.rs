//! Terminal rendering for aayojana-core types.
//!
//! Extension traits that add colored output to the core types using
//! owo_colors.

use aayojana_core::model::{
    Attendance, AttendanceStats, AttendanceStatus, Event, Feedback, RatingValue, Role,
};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Role {
    fn render(&self) -> String {
        match self {
            Role::Admin => self.as_str().red().to_string(),
            Role::Organizer => self.as_str().yellow().to_string(),
            Role::Attendee => self.as_str().cyan().to_string(),
        }
    }
}

/// Colorize text according to the attendance status
fn colorize_status(status: AttendanceStatus, text: &str) -> String {
    match status {
        AttendanceStatus::Registered => text.blue().to_string(),
        AttendanceStatus::Attended => text.green().to_string(),
        AttendanceStatus::NoShow => text.red().to_string(),
    }
}

/// Status padded to a fixed width. Padding has to happen before colouring,
/// escape codes would count toward the width otherwise.
fn padded_status(status: AttendanceStatus) -> String {
    format!("{:<10}", status.as_str())
}

impl Render for AttendanceStatus {
    fn render(&self) -> String {
        colorize_status(*self, self.as_str())
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let when = match &self.time {
            Some(time) => format!("{} {}", self.date, time),
            None => self.date.to_string(),
        };
        let mut line = format!("{}  {}", when.dimmed(), self.title.bold());
        if let Some(category) = &self.category {
            line.push_str(&format!(" [{}]", category.cyan()));
        }
        line.push_str(&format!(" {}", render_price(self.price).dimmed()));
        line
    }
}

impl Render for Attendance {
    fn render(&self) -> String {
        let event = match &self.event {
            Some(summary) => format!("{}  {}", summary.date.to_string().dimmed(), summary.title),
            None => format!("{}", self.event_id.as_str().dimmed()),
        };
        format!("{} {}", colorize_status(self.status, &padded_status(self.status)), event)
    }
}

impl Render for AttendanceStats {
    fn render(&self) -> String {
        [
            format!("  Registered:  {}", self.total_events.bold()),
            format!("  Attended:    {}", self.attended_events.green()),
            format!("  Upcoming:    {}", self.upcoming_events.blue()),
        ]
        .join("\n")
    }
}

impl Render for Feedback {
    fn render(&self) -> String {
        format!(
            "{} {}",
            self.created_at.format("%Y-%m-%d").to_string().dimmed(),
            self.feedback
        )
    }
}

fn render_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p > 0.0 => format!("{p:.2}"),
        _ => "free".to_string(),
    }
}

/// Filled and empty stars, e.g. "★★★☆☆".
pub fn render_stars(rating: RatingValue) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled).yellow(), "☆".repeat(5 - filled).dimmed())
}
