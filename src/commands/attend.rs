use aayojana_core::hooks::AttendanceTracker;
use aayojana_core::model::{AttendanceStatus, EventId};
use aayojana_core::RestStore;
use anyhow::Result;
use owo_colors::OwoColorize;

use super::{Session, create_spinner};
use crate::render::Render;

async fn load(session: &Session) -> Result<AttendanceTracker<RestStore>> {
    session.require_user()?;
    let tracker = AttendanceTracker::new(session.store.clone(), session.auth.clone());

    let spinner = create_spinner("Loading registrations");
    tracker.refresh_attendances().await;
    spinner.finish_and_clear();

    Ok(tracker)
}

pub async fn list(session: &Session) -> Result<()> {
    let tracker = load(session).await?;
    let attendances = tracker.attendances();

    if attendances.is_empty() {
        println!("{}", "No registrations yet".dimmed());
    }
    for attendance in &attendances {
        println!("{}", attendance.render());
    }

    Ok(())
}

pub async fn stats(session: &Session) -> Result<()> {
    let tracker = load(session).await?;

    println!("{}", "Attendance".bold());
    println!("{}", tracker.attendance_stats().render());

    Ok(())
}

pub async fn register(session: &Session, event_id: String) -> Result<()> {
    let tracker = load(session).await?;
    let event_id = EventId::new(event_id);

    if tracker.is_registered(&event_id) {
        println!("Already registered for {}", event_id.as_str().bold());
        return Ok(());
    }

    tracker.register_for_event(&event_id).await?;
    println!("{} for {}", "Registered".green(), event_id.as_str().bold());

    Ok(())
}

pub async fn mark(session: &Session, event_id: String, status: AttendanceStatus) -> Result<()> {
    let tracker = load(session).await?;
    let event_id = EventId::new(event_id);

    if tracker.attendance_for(&event_id).is_none() {
        anyhow::bail!("You are not registered for '{}'", event_id);
    }

    tracker.update_attendance_status(&event_id, status).await?;
    println!("Marked {} as {}", event_id.as_str().bold(), status.render());

    Ok(())
}
