//! Table metadata the compiler needs from its environment.

use crate::dialect::Dialect;
use crate::error::{Result, SearchError};

/// Source of dialect, naming and column information for the searched table.
pub trait SchemaSource: Send + Sync {
    /// Engine the query is compiled for.
    fn dialect(&self) -> Dialect;

    /// Prefix prepended to physical table names.
    fn table_prefix(&self) -> &str;

    /// Logical (unprefixed) name of the searched table.
    fn table_name(&self) -> &str;

    /// Primary key column of the searched table.
    fn primary_key(&self) -> &str;

    /// Unqualified column names of the searched table.
    ///
    /// Fails when the columns are not known and cannot be introspected.
    fn table_columns(&self) -> Result<Vec<String>>;

    /// Physical table name: prefix plus logical name.
    fn qualified_table(&self) -> String {
        format!("{}{}", self.table_prefix(), self.table_name())
    }
}

/// Schema information held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub dialect: Dialect,
    pub table_prefix: String,
    pub table: String,
    pub primary_key: String,
    pub columns: Option<Vec<String>>,
}

impl TableSchema {
    /// Default primary key column.
    pub const DEFAULT_PRIMARY_KEY: &'static str = "id";

    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table_prefix: String::new(),
            table: table.into(),
            primary_key: Self::DEFAULT_PRIMARY_KEY.to_string(),
            columns: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

impl SchemaSource for TableSchema {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn table_columns(&self) -> Result<Vec<String>> {
        match &self.columns {
            Some(columns) if !columns.is_empty() => Ok(columns.clone()),
            _ => Err(SearchError::config(format!(
                "column listing for table {} is not available",
                self.table
            ))),
        }
    }
}
