//! Query builder for the remote tables.
//!
//! Mirrors the backend client's chained API: `from(table).select(..).eq(..)
//! .order(..).single()` for reads, `insert(table, row)` and
//! `update(table, patch).eq(..)` for writes.

use serde::Serialize;
use serde_json::Value;

use crate::error::{AayojanaError, AayojanaResult};
use crate::remote::Table;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select,
    Insert(Value),
    Update(Value),
}

/// Equality filter on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A related table pulled into each row through a foreign key column.
/// The embedded object appears under the related table's name.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: Table,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    /// Empty means every column.
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub single: bool,
    pub operation: Operation,
}

impl Query {
    #[allow(clippy::should_implement_trait)]
    pub fn from(table: Table) -> Self {
        Query {
            table,
            columns: Vec::new(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
            single: false,
            operation: Operation::Select,
        }
    }

    pub fn insert(table: Table, row: impl Serialize) -> AayojanaResult<Self> {
        let row = serde_json::to_value(row)
            .map_err(|e| AayojanaError::Serialization(e.to_string()))?;
        Ok(Query {
            operation: Operation::Insert(row),
            ..Query::from(table)
        })
    }

    pub fn update(table: Table, patch: impl Serialize) -> AayojanaResult<Self> {
        let patch = serde_json::to_value(patch)
            .map_err(|e| AayojanaError::Serialization(e.to_string()))?;
        Ok(Query {
            operation: Operation::Update(patch),
            ..Query::from(table)
        })
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns
            .iter()
            .filter(|c| **c != "*")
            .map(|c| c.to_string())
            .collect();
        self
    }

    pub fn embed(mut self, table: Table, foreign_key: &str, columns: &[&str]) -> Self {
        self.embeds.push(Embed {
            table,
            foreign_key: foreign_key.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self.operation, Operation::Select)
    }

    /// The `select` parameter in the backend's syntax, e.g.
    /// `*,events(id,title)`.
    pub fn select_clause(&self) -> String {
        let mut parts = if self.columns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.columns.clone()
        };

        for embed in &self.embeds {
            let columns = if embed.columns.is_empty() {
                "*".to_string()
            } else {
                embed.columns.join(",")
            };
            parts.push(format!("{}({})", embed.table.name(), columns));
        }

        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn select_clause_defaults_to_star() {
        assert_eq!(Query::from(Table::Events).select_clause(), "*");
    }

    #[test]
    fn select_clause_lists_embeds_after_columns() {
        let query = Query::from(Table::EventAttendances)
            .select(&["*"])
            .embed(Table::Events, "event_id", &["id", "title"]);
        assert_eq!(query.select_clause(), "*,events(id,title)");

        let query = Query::from(Table::UserRoles).select(&["role"]);
        assert_eq!(query.select_clause(), "role");
    }

    #[test]
    fn builder_collects_filters_in_order() {
        let query = Query::update(Table::EventAttendances, json!({"status": "attended"}))
            .unwrap()
            .eq("user_id", "u1")
            .eq("event_id", "e1");

        assert!(query.is_mutation());
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[1].column, "event_id");
        assert_eq!(query.filters[1].value, json!("e1"));
    }
}
