//! Minimal SQL select builder the compiler drives.
//!
//! [`QueryBuilder`] is the seam between the compiler and whatever query
//! object the host application uses; [`SelectQuery`] is the bundled
//! implementation that renders plain SQL with `?` placeholders.

use crate::dialect::Dialect;
use serde::Serialize;
use std::collections::BTreeMap;

/// A positional parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Integer(value)
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        BindValue::Real(value)
    }
}

impl From<bool> for BindValue {
    fn from(value: bool) -> Self {
        BindValue::Integer(i64::from(value))
    }
}

/// Clause a binding belongs to. Variants are declared in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClausePosition {
    Select,
    From,
    Join,
    Where,
    Having,
    Order,
}

/// Bindings grouped by clause, flattened in rendering order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    by_position: BTreeMap<ClausePosition, Vec<BindValue>>,
}

impl Bindings {
    pub fn push(&mut self, position: ClausePosition, values: impl IntoIterator<Item = BindValue>) {
        self.by_position.entry(position).or_default().extend(values);
    }

    pub fn replace(&mut self, position: ClausePosition, values: Vec<BindValue>) {
        self.by_position.insert(position, values);
    }

    pub fn get(&self, position: ClausePosition) -> &[BindValue] {
        self.by_position
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn flatten(&self) -> Vec<BindValue> {
        self.by_position.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_position.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A LEFT JOIN with an equality ON clause and an optional bound filter.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub first: String,
    pub second: String,
    pub filter: Option<(String, BindValue)>,
}

/// SQL text plus its positional bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<BindValue>,
}

impl CompiledQuery {
    /// Rewrite `?` placeholders as `$1`, `$2`, ... for drivers that use
    /// numbered parameters. Quoted literals and identifiers are left alone.
    pub fn with_numbered_placeholders(&self) -> CompiledQuery {
        let mut sql = String::with_capacity(self.sql.len() + self.bindings.len() * 2);
        let mut quote: Option<char> = None;
        let mut index = 0;

        for ch in self.sql.chars() {
            match quote {
                Some(open) => {
                    if ch == open {
                        quote = None;
                    }
                    sql.push(ch);
                }
                None => match ch {
                    '\'' | '"' | '`' => {
                        quote = Some(ch);
                        sql.push(ch);
                    }
                    '?' => {
                        index += 1;
                        sql.push('$');
                        sql.push_str(&index.to_string());
                    }
                    _ => sql.push(ch),
                },
            }
        }

        CompiledQuery {
            sql,
            bindings: self.bindings.clone(),
        }
    }
}

/// Operations the compiler needs from a query builder.
///
/// Methods consume and return the builder so restriction callbacks of shape
/// `FnOnce(Q) -> Q` compose naturally.
pub trait QueryBuilder: Clone + Sized {
    /// Dialect the builder renders for.
    fn dialect(&self) -> Dialect;

    /// Copy of this query suitable as a sub-query: same source and filters,
    /// no projection, ordering or pagination.
    fn fork(&self) -> Self;

    /// Select (quoted) column identifiers.
    fn select(self, columns: &[&str]) -> Self;

    /// Select a raw expression.
    fn select_raw(self, expression: &str) -> Self;

    fn left_join(self, join: JoinClause) -> Self;

    fn where_raw(self, expression: &str) -> Self;

    fn having_raw(self, expression: &str) -> Self;

    fn order_by(self, column: &str, direction: SortDirection) -> Self;

    fn group_by(self, column: &str) -> Self;

    /// Attach bindings to a clause position.
    fn add_bindings(self, values: Vec<BindValue>, position: ClausePosition) -> Self;

    /// Replace the FROM source with `(sql) as alias`; `bindings` become the
    /// FROM-position bindings.
    fn from_subquery(self, sql: &str, alias: &str, bindings: Vec<BindValue>) -> Self;

    /// Render the SQL text.
    fn to_sql(&self) -> String;

    /// All bindings in placeholder order.
    fn bindings(&self) -> Vec<BindValue>;

    fn compile(&self) -> CompiledQuery {
        CompiledQuery {
            sql: self.to_sql(),
            bindings: self.bindings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Table(String),
    Subquery { sql: String, alias: String },
}

/// Bundled [`QueryBuilder`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    dialect: Dialect,
    source: Source,
    columns: Vec<String>,
    joins: Vec<String>,
    wheres: Vec<String>,
    groups: Vec<String>,
    havings: Vec<String>,
    orders: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    bindings: Bindings,
}

impl SelectQuery {
    /// `select * from <table>`.
    pub fn from_table(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            source: Source::Table(table.into()),
            columns: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            bindings: Bindings::default(),
        }
    }

    /// `where <column> = ?`
    pub fn where_eq(mut self, column: &str, value: impl Into<BindValue>) -> Self {
        self.wheres
            .push(format!("{} = ?", self.dialect.quote_identifier(column)));
        self.bindings.push(ClausePosition::Where, [value.into()]);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn binding_set(&self) -> &Bindings {
        &self.bindings
    }
}

impl QueryBuilder for SelectQuery {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn fork(&self) -> Self {
        let mut fork = self.clone();
        fork.columns.clear();
        fork.orders.clear();
        fork.limit = None;
        fork.offset = None;
        fork.bindings.replace(ClausePosition::Order, Vec::new());
        fork
    }

    fn select(mut self, columns: &[&str]) -> Self {
        for column in columns {
            self.columns.push(self.dialect.quote_identifier(column));
        }
        self
    }

    fn select_raw(mut self, expression: &str) -> Self {
        self.columns.push(expression.to_string());
        self
    }

    fn left_join(mut self, join: JoinClause) -> Self {
        let dialect = self.dialect;
        let mut sql = format!(
            "left join {} on {} = {}",
            dialect.quote_identifier(&join.table),
            dialect.quote_identifier(&join.first),
            dialect.quote_identifier(&join.second)
        );
        if let Some((column, value)) = join.filter {
            sql.push_str(&format!(" and {} = ?", dialect.quote_identifier(&column)));
            self.bindings.push(ClausePosition::Join, [value]);
        }
        self.joins.push(sql);
        self
    }

    fn where_raw(mut self, expression: &str) -> Self {
        self.wheres.push(expression.to_string());
        self
    }

    fn having_raw(mut self, expression: &str) -> Self {
        self.havings.push(expression.to_string());
        self
    }

    fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.orders.push(format!(
            "{} {}",
            self.dialect.quote_identifier(column),
            direction.as_sql()
        ));
        self
    }

    fn group_by(mut self, column: &str) -> Self {
        let quoted = self.dialect.quote_identifier(column);
        if !self.groups.contains(&quoted) {
            self.groups.push(quoted);
        }
        self
    }

    fn add_bindings(mut self, values: Vec<BindValue>, position: ClausePosition) -> Self {
        self.bindings.push(position, values);
        self
    }

    fn from_subquery(mut self, sql: &str, alias: &str, bindings: Vec<BindValue>) -> Self {
        self.source = Source::Subquery {
            sql: sql.to_string(),
            alias: alias.to_string(),
        };
        self.bindings.replace(ClausePosition::From, bindings);
        self
    }

    fn to_sql(&self) -> String {
        let dialect = self.dialect;
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let source = match &self.source {
            Source::Table(table) => dialect.quote_identifier(table),
            Source::Subquery { sql, alias } => {
                format!("({}) as {}", sql, dialect.quote_identifier(alias))
            }
        };

        let mut sql = format!("select {} from {}", columns, source);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.wheres.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.wheres.join(" and "));
        }
        if !self.groups.is_empty() {
            sql.push_str(" group by ");
            sql.push_str(&self.groups.join(", "));
        }
        if !self.havings.is_empty() {
            sql.push_str(" having ");
            sql.push_str(&self.havings.join(" and "));
        }
        if !self.orders.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.orders.join(", "));
        }
        if let Some(pagination) = dialect.pagination(self.limit, self.offset) {
            sql.push(' ');
            sql.push_str(&pagination);
        }
        sql
    }

    fn bindings(&self) -> Vec<BindValue> {
        self.bindings.flatten()
    }
}
