use std::sync::Arc;

use aayojana_core::hooks::EventAggregate;
use aayojana_core::model::EventId;
use anyhow::Result;
use owo_colors::OwoColorize;

use super::{Session, create_spinner};
use crate::render::{Render, render_stars};
use crate::utils::tui::TerminalNotifier;

pub async fn run(
    session: &Session,
    id: String,
    rate: Option<u8>,
    feedback: Option<String>,
) -> Result<()> {
    let aggregate = EventAggregate::new(
        session.store.clone(),
        session.auth.clone(),
        Arc::new(TerminalNotifier),
    );
    let event_id = EventId::new(id);

    let spinner = create_spinner(format!("Loading event {event_id}"));
    aggregate.set_event_id(Some(event_id.clone())).await;
    spinner.finish_and_clear();

    let Some(event) = aggregate.event() else {
        anyhow::bail!("Event '{}' could not be loaded", event_id);
    };

    if let Some(rating) = rate {
        session.require_user()?;
        aggregate.submit_rating(rating).await?;
    }
    if let Some(text) = feedback {
        session.require_user()?;
        aggregate.submit_feedback(&text).await?;
    }

    println!("{}", event.render());
    if let Some(location) = &event.location {
        println!("   {}", location);
    }
    if let Some(description) = &event.description {
        println!("\n{}", description);
    }

    println!();
    match aggregate.average_rating() {
        Some(average) => println!(
            "{} {:.1} ({} {})",
            "Rating".bold(),
            average,
            aggregate.rating_count(),
            if aggregate.rating_count() == 1 { "rating" } else { "ratings" }
        ),
        None => println!("{} {}", "Rating".bold(), "not rated yet".dimmed()),
    }
    if session.auth.current().is_some() && aggregate.user_rating() > 0 {
        println!("{} {}", "Yours ".bold(), render_stars(aggregate.user_rating()));
    }

    let recent = aggregate.recent_feedbacks();
    if !recent.is_empty() {
        println!("\n{}", "Recent feedback".bold());
        for entry in &recent {
            println!("   {}", entry.render());
        }
    }

    Ok(())
}
