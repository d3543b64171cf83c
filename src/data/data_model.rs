use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::ordered::OrderedMap;

/// One row of a dataset.
pub type Record = Map<String, Value>;

/// Semantic type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    Float,
    Str,
    Bool,
    Date,
    Datetime,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime)
    }
}

/// A loaded tabular dataset plus the metadata banks need to build their
/// widgets: typed value columns and the key (categorical) columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    /// Rows, each a column -> value map
    #[serde(default, alias = "records")]
    pub table: Vec<Record>,

    /// Value column -> type, in declaration order
    #[serde(default, alias = "types")]
    pub column_types: OrderedMap<String, ColumnType>,

    /// Categorical key columns
    #[serde(default)]
    pub keys: Vec<String>,
}

impl Dataset {
    /// Value columns, in declaration order.
    pub fn columns(&self) -> Vec<String> {
        self.column_types.keys().cloned().collect()
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.column_types.get(column).copied()
    }

    /// Whether any row or the type map mentions `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_types.contains_key(column)
            || self.keys.iter().any(|k| k == column)
            || self.table.iter().any(|row| row.contains_key(column))
    }

    /// Distinct values of a column in first-seen order. Nulls are skipped.
    pub fn unique(&self, column: &str) -> Vec<Value> {
        let mut seen: Vec<Value> = Vec::new();
        for value in self.table.iter().filter_map(|row| row.get(column)) {
            if !value.is_null() && !seen.contains(value) {
                seen.push(value.clone());
            }
        }
        seen
    }

    /// Distinct values of a column, sorted (numbers numerically, everything
    /// else by its text form).
    pub fn sorted_unique(&self, column: &str) -> Vec<Value> {
        let mut values = self.unique(column);
        values.sort_by(compare_values);
        values
    }

    pub fn row_count(&self) -> usize {
        self.table.len()
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text_of(a).cmp(&text_of(b)),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
