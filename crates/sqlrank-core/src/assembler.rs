//! Builds the scored sub-query and merges it into the caller's query.
//!
//! Assembly is two-phase. [`Assembler::assemble`] works on a fork of the
//! caller's query and produces the private scored query; [`merge`] renders
//! that query and installs it as a derived table in the caller's FROM.

use crate::aggregator::{Relevance, ScoredRelevance};
use crate::builder::{BindValue, ClausePosition, JoinClause, QueryBuilder, SortDirection};
use crate::config::ScoringConfig;
use crate::error::Result;
use crate::schema::SchemaSource;
use crate::spec::{SearchSpec, WeightedColumn};
use tracing::debug;

/// Apply the table prefix to the table segment of a qualified identifier.
/// Unqualified identifiers are returned as is.
pub fn physical_identifier(prefix: &str, identifier: &str) -> String {
    if prefix.is_empty() || !identifier.contains('.') {
        return identifier.to_string();
    }
    format!("{}{}", prefix, identifier)
}

/// Threshold literal as it appears in the HAVING clause.
pub fn format_threshold(threshold: f64) -> String {
    format!("{:.*}", ScoringConfig::THRESHOLD_PRECISION, threshold)
}

/// Assembly context of one search call.
pub struct Assembler<'a, S: SchemaSource + ?Sized> {
    spec: &'a SearchSpec,
    schema: &'a S,
    columns: &'a [WeightedColumn],
}

impl<'a, S: SchemaSource + ?Sized> Assembler<'a, S> {
    /// `columns` are the searched columns with logical names.
    pub fn new(spec: &'a SearchSpec, schema: &'a S, columns: &'a [WeightedColumn]) -> Self {
        Self {
            spec,
            schema,
            columns,
        }
    }

    /// Physical name of the searched table; also the derived-table alias.
    pub fn table(&self) -> String {
        self.schema.qualified_table()
    }

    /// Configured LEFT JOINs with prefixed table names.
    pub fn join_clauses(&self) -> Vec<JoinClause> {
        let prefix = self.schema.table_prefix();
        self.spec
            .joins
            .iter()
            .map(|join| JoinClause {
                table: format!("{}{}", prefix, join.table),
                first: physical_identifier(prefix, &join.first),
                second: physical_identifier(prefix, &join.second),
                filter: join.filter.as_ref().map(|filter| {
                    (
                        physical_identifier(prefix, &filter.column),
                        BindValue::Text(filter.value.clone()),
                    )
                }),
            })
            .collect()
    }

    /// GROUP BY columns used to collapse join fan-out.
    ///
    /// A searched column is treated as belonging to a joined table when its
    /// identifier contains the joined table's name. This is a plain substring
    /// test and can match unrelated columns with similar names.
    pub fn group_by_columns(&self) -> Result<Vec<String>> {
        let prefix = self.schema.table_prefix();

        if let Some(explicit) = &self.spec.group_by {
            return Ok(explicit
                .iter()
                .map(|column| physical_identifier(prefix, column))
                .collect());
        }

        let table = self.table();
        let mut columns = if self.schema.dialect().groups_by_all_columns() {
            self.schema
                .table_columns()?
                .into_iter()
                .map(|column| format!("{}.{}", table, column))
                .collect()
        } else {
            vec![format!("{}.{}", table, self.schema.primary_key())]
        };

        for searched in self.columns {
            for join in &self.spec.joins {
                if searched.column.contains(join.table.as_str()) {
                    let physical = physical_identifier(prefix, &searched.column);
                    if !columns.contains(&physical) {
                        columns.push(physical);
                    }
                }
            }
        }

        Ok(columns)
    }

    /// Build the private scored query from a fork of `base`.
    pub fn assemble<Q: QueryBuilder>(
        &self,
        base: &Q,
        relevance: &Relevance,
        threshold: Option<f64>,
    ) -> Result<Q> {
        match relevance {
            Relevance::Scored(scored) => self.assemble_scored(base, scored, threshold),
            Relevance::NoOp => Ok(self.assemble_noop(base)),
        }
    }

    fn assemble_scored<Q: QueryBuilder>(
        &self,
        base: &Q,
        scored: &ScoredRelevance,
        threshold: Option<f64>,
    ) -> Result<Q> {
        let dialect = self.schema.dialect();
        let table = self.table();
        let alias = ScoringConfig::RELEVANCE_ALIAS;

        let all_columns = format!("{}.*", table);
        let mut query = base
            .fork()
            .select(&[all_columns.as_str()])
            .select_raw(&scored.projection());

        for join in self.join_clauses() {
            query = query.left_join(join);
        }

        let threshold = threshold.unwrap_or_else(|| scored.default_threshold());
        let comparator = if dialect.having_references_alias() {
            alias.to_string()
        } else {
            scored.aggregate_expression()
        };
        query = query.having_raw(&format!(
            "{} > {}",
            comparator,
            format_threshold(threshold)
        ));

        if dialect.orders_derived_tables() {
            query = query.order_by(alias, SortDirection::Desc);
        }

        for column in self.group_by_columns()? {
            query = query.group_by(&column);
        }

        query = query.add_bindings(scored.bindings.clone(), ClausePosition::Select);
        if dialect.binding_copies() > 1 {
            query = query.add_bindings(scored.bindings.clone(), ClausePosition::Having);
        }

        debug!(
            "Assembled search on {}: {} terms, weight {}, threshold {}",
            table,
            scored.term_count,
            scored.total_weight,
            format_threshold(threshold)
        );

        Ok(query)
    }

    fn assemble_noop<Q: QueryBuilder>(&self, base: &Q) -> Q {
        let table = self.table();
        debug!("No column admits any search word on {}; matching nothing", table);

        let all_columns = format!("{}.*", table);
        base.fork()
            .select(&[all_columns.as_str()])
            .select_raw(&format!("0 as {}", ScoringConfig::RELEVANCE_ALIAS))
            .where_raw("1 = 0")
    }
}

/// Install `private` as the derived table `alias` in `original`'s FROM.
///
/// The private query's bindings become the FROM bindings, ahead of the
/// original's own WHERE bindings. The original's filters, sorts and
/// pagination stay in place; relevance ordering is appended after them.
pub fn merge<Q: QueryBuilder>(private: Q, original: Q, alias: &str) -> Q {
    let compiled = private.compile();
    original
        .from_subquery(&compiled.sql, alias, compiled.bindings)
        .order_by(ScoringConfig::RELEVANCE_ALIAS, SortDirection::Desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::builder::SelectQuery;
    use crate::dialect::Dialect;
    use crate::schema::TableSchema;
    use crate::scorer::score_column;
    use crate::spec::JoinSpec;

    fn scored(dialect: Dialect) -> Relevance {
        aggregate(vec![score_column(
            dialect,
            "users.name",
            10.0,
            &["bob"],
            true,
            None,
        )])
    }

    #[test]
    fn test_physical_identifier() {
        assert_eq!(physical_identifier("", "users.name"), "users.name");
        assert_eq!(physical_identifier("app_", "users.name"), "app_users.name");
        assert_eq!(physical_identifier("app_", "name"), "name");
    }

    #[test]
    fn test_format_threshold() {
        assert_eq!(format_threshold(3.75), "3.75");
        assert_eq!(format_threshold(2.5), "2.50");
        assert_eq!(format_threshold(10.0 / 3.0), "3.33");
    }

    #[test]
    fn test_group_by_primary_key_and_joined_columns() {
        let spec = SearchSpec::new()
            .column("users.name", 10.0)
            .column("posts.title", 5.0)
            .join(JoinSpec::new("posts", "users.id", "posts.user_id"));
        let schema = TableSchema::new(Dialect::MySql, "users").with_prefix("app_");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        assert_eq!(
            assembler.group_by_columns().unwrap(),
            vec!["app_users.id", "app_posts.title"]
        );
    }

    #[test]
    fn test_group_by_all_columns_for_sql_server() {
        let spec = SearchSpec::new().column("users.name", 10.0);
        let schema = TableSchema::new(Dialect::SqlServer, "users").with_columns(["id", "name"]);
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        assert_eq!(
            assembler.group_by_columns().unwrap(),
            vec!["users.id", "users.name"]
        );
    }

    #[test]
    fn test_group_by_all_columns_requires_listing() {
        let spec = SearchSpec::new().column("users.name", 10.0);
        let schema = TableSchema::new(Dialect::SqlServer, "users");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        assert!(assembler.group_by_columns().unwrap_err().is_config_error());
    }

    #[test]
    fn test_explicit_group_by_wins() {
        let spec = SearchSpec::new()
            .column("users.name", 10.0)
            .join(JoinSpec::new("posts", "users.id", "posts.user_id"))
            .group_by(["users.email"]);
        let schema = TableSchema::new(Dialect::MySql, "users");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        assert_eq!(assembler.group_by_columns().unwrap(), vec!["users.email"]);
    }

    #[test]
    fn test_join_clauses_are_prefixed() {
        let spec = SearchSpec::new().join(
            JoinSpec::new("posts", "users.id", "posts.user_id").with_filter("posts.state", "live"),
        );
        let schema = TableSchema::new(Dialect::MySql, "users").with_prefix("app_");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        let joins = assembler.join_clauses();
        assert_eq!(joins[0].table, "app_posts");
        assert_eq!(joins[0].first, "app_users.id");
        assert_eq!(joins[0].second, "app_posts.user_id");
        assert_eq!(
            joins[0].filter,
            Some(("app_posts.state".to_string(), BindValue::from("live")))
        );
    }

    #[test]
    fn test_assemble_mysql_references_alias() {
        let spec = SearchSpec::new().column("users.name", 10.0);
        let schema = TableSchema::new(Dialect::MySql, "users");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        let base = SelectQuery::from_table(Dialect::MySql, "users");

        let query = assembler.assemble(&base, &scored(Dialect::MySql), None).unwrap();
        let sql = query.to_sql();
        assert!(sql.starts_with(
            "select `users`.*, max((case when LOWER(`users`.`name`) LIKE ? then 60 else 0 end)"
        ));
        assert!(sql.ends_with(
            "group by `users`.`id` having relevance > 2.50 order by `relevance` desc"
        ));
        assert_eq!(query.bindings().len(), 4);
    }

    #[test]
    fn test_assemble_postgres_duplicates_bindings() {
        let spec = SearchSpec::new().column("users.name", 10.0);
        let schema = TableSchema::new(Dialect::PostgreSql, "users");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        let base = SelectQuery::from_table(Dialect::PostgreSql, "users");

        let query = assembler
            .assemble(&base, &scored(Dialect::PostgreSql), Some(7.0))
            .unwrap();
        let sql = query.to_sql();
        assert!(
            sql.contains("having max((case when LOWER(users.name) ILIKE ? then 60 else 0 end)")
        );
        assert!(sql.contains(") > 7.00"));
        assert_eq!(sql.matches('?').count(), 8);

        let bindings = query.bindings();
        assert_eq!(bindings.len(), 8);
        assert_eq!(bindings[..4], bindings[4..]);
    }

    #[test]
    fn test_assemble_noop() {
        let spec = SearchSpec::new().column("users.name", 10.0);
        let schema = TableSchema::new(Dialect::Sqlite, "users");
        let assembler = Assembler::new(&spec, &schema, &spec.columns);
        let base = SelectQuery::from_table(Dialect::Sqlite, "users");

        let query = assembler.assemble(&base, &Relevance::NoOp, None).unwrap();
        assert_eq!(
            query.to_sql(),
            "select \"users\".*, 0 as relevance from \"users\" where 1 = 0"
        );
        assert!(query.bindings().is_empty());
    }

    #[test]
    fn test_merge_wraps_private_query() {
        let original = SelectQuery::from_table(Dialect::Sqlite, "users")
            .where_eq("users.active", true)
            .limit(10);
        let private = original.fork().select_raw("1 as relevance");
        let merged = merge(private, original, "users");
        assert_eq!(
            merged.to_sql(),
            "select * from (select 1 as relevance from \"users\" \
             where \"users\".\"active\" = ?) as \"users\" \
             where \"users\".\"active\" = ? order by \"relevance\" desc limit 10"
        );
        assert_eq!(merged.bindings(), vec![BindValue::Integer(1), BindValue::Integer(1)]);
    }
}
