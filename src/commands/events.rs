use aayojana_core::hooks::EventCatalog;
use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;

use super::{Session, create_spinner};
use crate::render::Render;

pub async fn run(session: &Session, category: Option<String>, upcoming: bool) -> Result<()> {
    let catalog = EventCatalog::new(session.store.clone());

    let spinner = create_spinner("Loading events");
    catalog.set_category(category).await;
    spinner.finish_and_clear();

    let events = if upcoming {
        catalog.upcoming(Local::now().date_naive())
    } else {
        catalog.events()
    };

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    for event in &events {
        println!("{}", event.render());
        println!("   {}", event.id.as_str().dimmed());
    }

    let categories = catalog.categories();
    if !categories.is_empty() {
        println!("\n{} {}", "Categories:".dimmed(), categories.join(", "));
    }

    Ok(())
}
