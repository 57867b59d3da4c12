//! SQLite glue: schema introspection and execution of compiled searches.

use crate::builder::{BindValue, CompiledQuery};
use crate::config::ScoringConfig;
use crate::dialect::Dialect;
use crate::error::{Result, SearchError};
use crate::schema::TableSchema;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use serde::Serialize;
use serde_json::Map;
use tracing::debug;

impl ToSql for BindValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            BindValue::Null => ToSqlOutput::Owned(Value::Null),
            BindValue::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            BindValue::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            BindValue::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

impl TableSchema {
    /// Read columns and primary key of `table_prefix + table` from SQLite.
    ///
    /// Tables without a declared primary key group by `rowid`. For composite
    /// keys the first key column is used.
    pub fn from_sqlite(conn: &Connection, table_prefix: &str, table: &str) -> Result<Self> {
        let physical = format!("{}{}", table_prefix, table);
        let pragma = format!(
            "PRAGMA table_info({})",
            Dialect::Sqlite.quote_identifier(&physical)
        );

        let mut stmt = conn.prepare(&pragma)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, i64>(5)?))
        })?;

        let mut columns = Vec::new();
        let mut primary_key: Option<(i64, String)> = None;
        for row in rows {
            let (name, pk) = row?;
            if pk > 0 && primary_key.as_ref().map_or(true, |(order, _)| pk < *order) {
                primary_key = Some((pk, name.clone()));
            }
            columns.push(name);
        }

        if columns.is_empty() {
            return Err(SearchError::config(format!(
                "table {} does not exist or has no columns",
                physical
            )));
        }

        let primary_key = primary_key
            .map(|(_, name)| name)
            .unwrap_or_else(|| "rowid".to_string());
        debug!(
            "Introspected {}: {} columns, primary key {}",
            physical,
            columns.len(),
            primary_key
        );

        Ok(TableSchema::new(Dialect::Sqlite, table)
            .with_prefix(table_prefix)
            .with_primary_key(primary_key)
            .with_columns(columns))
    }
}

/// One result row of an executed search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub relevance: f64,
    pub fields: Map<String, serde_json::Value>,
}

impl RankedRow {
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.fields.get(column)
    }
}

/// Execute a compiled search and collect its rows in result order.
pub fn fetch_ranked(conn: &Connection, query: &CompiledQuery) -> Result<Vec<RankedRow>> {
    let mut stmt = conn.prepare(&query.sql).map_err(|e| SearchError::Database {
        message: format!("Failed to prepare search query: {}", e),
        source: Some(e),
    })?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params_from_iter(query.bindings.iter()))?;
    let mut ranked = Vec::new();
    while let Some(row) = rows.next()? {
        let mut relevance = 0.0;
        let mut fields = Map::new();
        for (index, name) in names.iter().enumerate() {
            let value = row.get_ref(index)?;
            if name == ScoringConfig::RELEVANCE_ALIAS {
                relevance = match value {
                    ValueRef::Integer(n) => n as f64,
                    ValueRef::Real(n) => n,
                    _ => 0.0,
                };
            } else {
                fields.insert(name.clone(), to_json(value));
            }
        }
        ranked.push(RankedRow { relevance, fields });
    }

    debug!("Search returned {} rows", ranked.len());
    Ok(ranked)
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(n) => n.into(),
        ValueRef::Real(n) => serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned().into(),
        ValueRef::Blob(bytes) => bytes.to_vec().into(),
    }
}
