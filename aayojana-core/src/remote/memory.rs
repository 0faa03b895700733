//! In-process implementation of the remote store.
//!
//! Rows are kept as JSON objects per table and queries are answered the way
//! the hosted backend answers them: equality filters, ordering with nulls
//! last on ascending sorts, single-row reads that fail unless exactly one row
//! matches, embedded resources joined through a foreign key, and generated
//! `id`/`created_at` columns on insert. Unique constraints, failures and
//! latency can be configured per table, which is what the hook tests rely on.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::remote::{Direction, Embed, Operation, Query, RemoteError, RemoteStore, Table};

type Row = Map<String, Value>;

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, Vec<Row>>,
    unique: HashMap<Table, Vec<Vec<String>>>,
    failures: HashMap<Table, RemoteError>,
    latency: HashMap<Table, Duration>,
    calls: HashMap<Table, usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add rows as-is. Non-object values are ignored.
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.lock();
        let entries = tables.rows.entry(table).or_default();
        entries.extend(rows.into_iter().filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock()
            .rows
            .get(&table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Reject inserts that repeat an existing combination of these columns.
    pub fn add_unique_constraint(&self, table: Table, columns: &[&str]) {
        self.lock()
            .unique
            .entry(table)
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
    }

    /// Every query against `table` fails with `error` until [`Self::recover`].
    pub fn fail(&self, table: Table, error: RemoteError) {
        self.lock().failures.insert(table, error);
    }

    pub fn recover(&self, table: Table) {
        self.lock().failures.remove(&table);
    }

    /// Delay every query against `table` before it is answered.
    pub fn set_latency(&self, table: Table, latency: Duration) {
        self.lock().latency.insert(table, latency);
    }

    /// Number of queries executed against `table`.
    pub fn calls(&self, table: Table) -> usize {
        self.lock().calls.get(&table).copied().unwrap_or(0)
    }

    fn answer(&self, query: &Query) -> Result<Value, RemoteError> {
        let mut tables = self.lock();
        *tables.calls.entry(query.table).or_default() += 1;

        if let Some(error) = tables.failures.get(&query.table) {
            return Err(error.clone());
        }

        match &query.operation {
            Operation::Select => tables.select(query),
            Operation::Insert(row) => tables.insert(query.table, row),
            Operation::Update(patch) => tables.update(query, patch),
        }
    }
}

impl RemoteStore for MemoryStore {
    async fn execute(&self, query: &Query) -> Result<Value, RemoteError> {
        let latency = self.lock().latency.get(&query.table).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.answer(query)
    }
}

impl Tables {
    fn matching(&self, query: &Query) -> Vec<Row> {
        self.rows
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filters(row, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn select(&self, query: &Query) -> Result<Value, RemoteError> {
        let mut rows = self.matching(query);

        if let Some(order) = &query.order {
            // Stable sort: ties keep insertion order.
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let rows: Vec<Value> = rows
            .iter()
            .map(|row| {
                let mut projected = project(row, &query.columns);
                for embed in &query.embeds {
                    projected.insert(embed.table.name().to_string(), self.embedded(row, embed));
                }
                Value::Object(projected)
            })
            .collect();

        if query.single {
            return match <[Value; 1]>::try_from(rows) {
                Ok([row]) => Ok(row),
                Err(rows) => Err(RemoteError::new(format!(
                    "JSON object requested, multiple (or no) rows returned ({} rows)",
                    rows.len()
                ))
                .with_code("PGRST116")),
            };
        }

        Ok(Value::Array(rows))
    }

    fn embedded(&self, row: &Row, embed: &Embed) -> Value {
        let Some(key) = row.get(&embed.foreign_key) else {
            return Value::Null;
        };

        self.rows
            .get(&embed.table)
            .and_then(|rows| rows.iter().find(|r| r.get("id") == Some(key)))
            .map(|r| Value::Object(project(r, &embed.columns)))
            .unwrap_or(Value::Null)
    }

    fn insert(&mut self, table: Table, row: &Value) -> Result<Value, RemoteError> {
        let Value::Object(row) = row else {
            return Err(RemoteError::new("Insert payload must be an object").with_code("PGRST102"));
        };

        let mut row = row.clone();
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let existing = self.rows.entry(table).or_default();
        for columns in self.unique.get(&table).into_iter().flatten() {
            let duplicate = existing
                .iter()
                .any(|other| columns.iter().all(|c| other.get(c) == row.get(c)));
            if duplicate {
                return Err(RemoteError::new(format!(
                    "duplicate key value violates unique constraint on {} ({})",
                    table,
                    columns.join(", ")
                ))
                .with_code("23505"));
            }
        }

        existing.push(row.clone());
        Ok(Value::Array(vec![Value::Object(row)]))
    }

    fn update(&mut self, query: &Query, patch: &Value) -> Result<Value, RemoteError> {
        let Value::Object(patch) = patch else {
            return Err(RemoteError::new("Update payload must be an object").with_code("PGRST102"));
        };

        let mut updated = Vec::new();
        for row in self.rows.entry(query.table).or_default().iter_mut() {
            if matches_filters(row, query) {
                for (column, value) in patch {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }

        Ok(Value::Array(updated))
    }
}

fn matches_filters(row: &Row, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|f| row.get(&f.column).is_some_and(|v| values_equal(v, &f.value)))
}

/// Numbers and their string spelling compare equal, as they do once the
/// backend casts a filter value to the column type.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }

    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

/// Nulls and missing values sort after everything else.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with_events() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(
            Table::Events,
            [
                json!({"id": "e1", "title": "Jazz Night", "date": "2025-03-20", "category": "music"}),
                json!({"id": "e2", "title": "Hackathon", "date": "2025-02-01", "category": "tech"}),
                json!({"id": "e3", "title": "Open Mic", "date": null, "category": "music"}),
            ],
        );
        store
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let store = store_with_events();
        let query = Query::from(Table::Events)
            .eq("category", "music")
            .order("date", Direction::Ascending);

        let rows = store.execute(&query).await.unwrap();
        let ids: Vec<_> = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["e1", "e3"]);
    }

    #[tokio::test]
    async fn descending_order_puts_nulls_first() {
        let store = store_with_events();
        let query = Query::from(Table::Events).order("date", Direction::Descending);

        let rows = store.execute(&query).await.unwrap();
        assert_eq!(rows[0]["id"], "e3");
        assert_eq!(rows[2]["id"], "e2");
    }

    #[tokio::test]
    async fn single_requires_exactly_one_row() {
        let store = store_with_events();

        let one = Query::from(Table::Events).eq("id", "e2").single();
        assert_eq!(store.execute(&one).await.unwrap()["title"], "Hackathon");

        let none = Query::from(Table::Events).eq("id", "missing").single();
        let err = store.execute(&none).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("PGRST116"));
    }

    #[tokio::test]
    async fn embeds_follow_the_foreign_key() {
        let store = store_with_events();
        store.seed(
            Table::EventAttendances,
            [json!({"id": "a1", "user_id": "u1", "event_id": "e1"})],
        );

        let query = Query::from(Table::EventAttendances)
            .embed(Table::Events, "event_id", &["id", "title"]);
        let rows = store.execute(&query).await.unwrap();

        assert_eq!(rows[0]["events"], json!({"id": "e1", "title": "Jazz Night"}));
    }

    #[tokio::test]
    async fn insert_fills_generated_columns_and_enforces_uniqueness() {
        let store = MemoryStore::new();
        store.add_unique_constraint(Table::UserRoles, &["user_id", "role"]);

        let insert =
            Query::insert(Table::UserRoles, json!({"user_id": "u1", "role": "admin"})).unwrap();
        let inserted = store.execute(&insert).await.unwrap();
        assert!(inserted[0]["id"].is_string());
        assert!(inserted[0]["created_at"].is_string());

        let err = store.execute(&insert).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("23505"));
        assert_eq!(store.rows(Table::UserRoles).len(), 1);
    }

    #[tokio::test]
    async fn update_patches_only_matching_rows() {
        let store = store_with_events();
        let update = Query::update(Table::Events, json!({"category": "jazz"}))
            .unwrap()
            .eq("id", "e1");

        let updated = store.execute(&update).await.unwrap();
        assert_eq!(updated.as_array().unwrap().len(), 1);

        let rows = store.rows(Table::Events);
        assert_eq!(rows[0]["category"], "jazz");
        assert_eq!(rows[2]["category"], "music");
    }

    #[tokio::test]
    async fn injected_failures_last_until_recovered() {
        let store = store_with_events();
        store.fail(Table::Events, RemoteError::new("boom"));

        let query = Query::from(Table::Events);
        assert_eq!(store.execute(&query).await.unwrap_err().message, "boom");

        store.recover(Table::Events);
        assert!(store.execute(&query).await.is_ok());
        assert_eq!(store.calls(Table::Events), 2);
    }

    #[test]
    fn timestamps_compare_as_instants() {
        let a = json!("2025-03-01T10:00:00Z");
        let b = json!("2025-03-01T10:00:00.500+00:00");
        assert_eq!(compare_values(Some(&a), Some(&b)), Ordering::Less);
    }
}
