//! The public list of events.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::hooks::Generation;
use crate::model::Event;
use crate::remote::{self, Direction, Query, RemoteStore, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState {
    /// Soonest first.
    pub events: Vec<Event>,
    pub loading: bool,
    pub category: Option<String>,
}

impl Default for CatalogState {
    fn default() -> Self {
        CatalogState {
            events: Vec::new(),
            loading: true,
            category: None,
        }
    }
}

/// Browses events, optionally narrowed to one category. Works the same for
/// anonymous and signed-in users.
pub struct EventCatalog<S: RemoteStore> {
    store: Arc<S>,
    state: watch::Sender<CatalogState>,
    generation: Generation,
}

impl<S: RemoteStore> EventCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        EventCatalog {
            store,
            state,
            generation: Generation::default(),
        }
    }

    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn category(&self) -> Option<String> {
        self.state.borrow().category.clone()
    }

    /// Distinct categories among the loaded events.
    pub fn categories(&self) -> Vec<String> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Loaded events dated on or after `today`.
    pub fn upcoming(&self, today: NaiveDate) -> Vec<Event> {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|e| e.date >= today)
            .cloned()
            .collect()
    }

    /// Narrow the list to one category (or widen it again with `None`) and
    /// reload.
    pub async fn set_category(&self, category: Option<String>) {
        self.state.send_modify(|s| s.category = category);
        self.refresh_events().await;
    }

    pub async fn refresh_events(&self) {
        let ticket = self.generation.next();
        let category = self.category();

        self.state.send_modify(|s| s.loading = true);

        let mut query = Query::from(Table::Events).order("date", Direction::Ascending);
        if let Some(category) = &category {
            query = query.eq("category", category.as_str());
        }

        let events = match remote::fetch::<_, Vec<Event>>(self.store.as_ref(), &query).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(category = ?category, error = %e, "Failed to load events");
                Vec::new()
            }
        };

        if !self.generation.is_current(ticket) {
            tracing::debug!("Discarding stale events response");
            return;
        }

        self.state.send_modify(|s| {
            s.events = events;
            s.loading = false;
        });
    }
}
