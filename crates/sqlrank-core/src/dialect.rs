//! Per-engine behavioral switches consulted by the compiler.
//!
//! Every dialect-dependent decision goes through [`Dialect`]; no other module
//! compares driver names.

use serde::{Deserialize, Serialize};

/// SQL engine the compiled query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Dialect {
    /// MySQL / MariaDB. Also the fallback for unknown drivers.
    #[default]
    MySql,
    PostgreSql,
    SqlServer,
    Sqlite,
}

impl Dialect {
    /// Resolve a driver identifier (`mysql`, `pgsql`, `sqlsrv`, `sqlite`, ...).
    ///
    /// Unrecognized drivers resolve to [`Dialect::MySql`]: only the engines
    /// with special cases get their own policy.
    pub fn from_driver(driver: &str) -> Self {
        match driver.trim().to_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Dialect::PostgreSql,
            "sqlsrv" | "mssql" | "sqlserver" => Dialect::SqlServer,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            _ => Dialect::MySql,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::PostgreSql => "pgsql",
            Dialect::SqlServer => "sqlsrv",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Case-insensitive LIKE operator.
    pub fn like_operator(&self) -> &'static str {
        match self {
            Dialect::PostgreSql => "ILIKE",
            _ => "LIKE",
        }
    }

    /// Quote a possibly qualified identifier (`users.name`, `users.*`).
    ///
    /// PostgreSQL identifiers are left bare so that unquoted names keep
    /// their case-folding behavior.
    pub fn quote_identifier(&self, identifier: &str) -> String {
        identifier
            .split('.')
            .map(|segment| self.quote_segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return segment.to_string();
        }
        match self {
            Dialect::MySql => format!("`{}`", segment.replace('`', "``")),
            Dialect::PostgreSql => segment.to_string(),
            Dialect::SqlServer => format!("[{}]", segment.replace(']', "]]")),
            Dialect::Sqlite => format!("\"{}\"", segment.replace('"', "\"\"")),
        }
    }

    /// Whether HAVING may reference a select alias (`relevance`).
    pub fn having_references_alias(&self) -> bool {
        matches!(self, Dialect::MySql | Dialect::Sqlite)
    }

    /// How many times the scoring bindings appear in the compiled query.
    ///
    /// Engines that cannot reference the alias re-express the score in
    /// HAVING and therefore consume the whole sequence a second time.
    pub fn binding_copies(&self) -> usize {
        if self.having_references_alias() {
            1
        } else {
            2
        }
    }

    /// Whether every non-aggregated column must appear in GROUP BY.
    pub fn groups_by_all_columns(&self) -> bool {
        matches!(self, Dialect::SqlServer)
    }

    /// Whether ORDER BY is allowed inside a derived table without TOP or
    /// OFFSET.
    pub fn orders_derived_tables(&self) -> bool {
        !matches!(self, Dialect::SqlServer)
    }

    /// Render the pagination tail for this engine.
    pub fn pagination(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (self, limit, offset) {
            (_, None, None) => None,
            (Dialect::SqlServer, limit, offset) => {
                let mut sql = format!("offset {} rows", offset.unwrap_or(0));
                if let Some(limit) = limit {
                    sql.push_str(&format!(" fetch next {} rows only", limit));
                }
                Some(sql)
            }
            (Dialect::PostgreSql, limit, offset) => {
                let mut parts = Vec::new();
                if let Some(limit) = limit {
                    parts.push(format!("limit {}", limit));
                }
                if let Some(offset) = offset {
                    parts.push(format!("offset {}", offset));
                }
                Some(parts.join(" "))
            }
            (Dialect::Sqlite, None, Some(offset)) => Some(format!("limit -1 offset {}", offset)),
            (Dialect::MySql, None, Some(offset)) => {
                Some(format!("limit {} offset {}", u64::MAX, offset))
            }
            (_, Some(limit), None) => Some(format!("limit {}", limit)),
            (_, Some(limit), Some(offset)) => Some(format!("limit {} offset {}", limit, offset)),
        }
    }
}

impl From<String> for Dialect {
    fn from(driver: String) -> Self {
        Dialect::from_driver(&driver)
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.as_str().to_string()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
