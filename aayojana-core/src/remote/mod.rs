//! The remote store contract.
//!
//! Every table lives in the hosted backend. The hooks only build [`Query`]
//! values and hand them to a [`RemoteStore`]; how the query travels is up to
//! the implementation. [`RestStore`] speaks the backend's REST dialect,
//! [`MemoryStore`] keeps the tables in process.

pub mod memory;
pub mod query;
pub mod rest;

use std::fmt;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{AayojanaError, AayojanaResult};

pub use memory::MemoryStore;
pub use query::{Direction, Embed, Filter, Operation, Order, Query};
pub use rest::RestStore;

/// Tables the client reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Events,
    EventRatings,
    EventFeedback,
    EventAttendances,
    UserRoles,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Events => "events",
            Table::EventRatings => "event_ratings",
            Table::EventFeedback => "event_feedback",
            Table::EventAttendances => "event_attendances",
            Table::UserRoles => "user_roles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `error` half of a backend response.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        RemoteError {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    fn decode(err: serde_json::Error) -> Self {
        RemoteError::new(format!("Unexpected row shape: {err}")).with_code("decode")
    }
}

/// A query capability over the backend tables.
///
/// On success the returned value is the response `data`: an array of rows,
/// or a single object when the query asked for one row. On failure only the
/// error is returned, so callers never look at data that came with an error.
pub trait RemoteStore: Send + Sync + 'static {
    fn execute(&self, query: &Query) -> impl Future<Output = Result<Value, RemoteError>> + Send;
}

/// Run a select and decode the response data, either `Vec<Row>` or a
/// single `Row` for single-row queries.
pub(crate) async fn fetch<S, T>(store: &S, query: &Query) -> AayojanaResult<T>
where
    S: RemoteStore,
    T: DeserializeOwned,
{
    let data = store
        .execute(query)
        .await
        .map_err(|e| AayojanaError::fetch(query.table, e))?;

    serde_json::from_value(data)
        .map_err(|e| AayojanaError::fetch(query.table, RemoteError::decode(e)))
}

/// Run an insert or update. The written rows are not needed: callers refetch.
pub(crate) async fn mutate<S: RemoteStore>(store: &S, query: &Query) -> AayojanaResult<()> {
    store
        .execute(query)
        .await
        .map(|_| ())
        .map_err(|e| AayojanaError::mutation(query.table, e))
}
