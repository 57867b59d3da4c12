//! sqlrank - Relevance-ranked full-text search for SQL query builders.
//!
//! Given a free-text query and a declarative description of which columns
//! are searchable (with weights, per-column word admission rules and
//! optional joins), sqlrank rewrites a caller's select query so that it
//! returns only rows scoring above a threshold, ordered by descending
//! relevance. The score is computed by the database through a sum of
//! `case when ... like ? then n else 0 end` terms; every user-supplied
//! value travels as a bound parameter.
//!
//! The compiler is engine-agnostic. [`Dialect`] holds the per-engine
//! switches (MySQL, PostgreSQL, SQL Server, SQLite), and the [`sqlite`]
//! module can introspect and execute against a SQLite database.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlrank::{AdmissionRule, Dialect, QueryBuilder, SearchOptions, SearchSpec};
//! use sqlrank::{Searchable, SelectQuery, TableSchema};
//!
//! fn main() -> sqlrank::Result<()> {
//!     let spec = SearchSpec::new()
//!         .column("users.name", 10.0)
//!         .column("users.email", 5.0)
//!         .condition("users.name", AdmissionRule::pattern("[a-zA-Z]{3,}"));
//!     let users = Searchable::new(spec, TableSchema::new(Dialect::MySql, "users"))?;
//!
//!     let base = SelectQuery::from_table(Dialect::MySql, "users").limit(20);
//!     let query = users.search(base, "Al 1967 Bob", &SearchOptions::new())?;
//!
//!     let compiled = query.compile();
//!     println!("{}", compiled.sql);
//!     println!("{} bindings", compiled.bindings.len());
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod assembler;
pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
pub mod schema;
pub mod scorer;
pub mod searchable;
pub mod spec;
pub mod sqlite;
pub mod tokens;
pub mod word_filter;

// Re-export commonly used types
pub use aggregator::{aggregate, Relevance, ScoredRelevance};
pub use assembler::{merge, Assembler};
pub use builder::{
    BindValue, Bindings, ClausePosition, CompiledQuery, JoinClause, QueryBuilder, SelectQuery,
    SortDirection,
};
pub use config::{ScoringConfig, SearchConfig, SearchOptions};
pub use dialect::Dialect;
pub use error::{Result, SearchError};
pub use schema::{SchemaSource, TableSchema};
pub use scorer::{score, score_column, ColumnTerms, MatchTerm, MatchTier};
pub use searchable::Searchable;
pub use spec::{AdmissionRule, JoinFilter, JoinSpec, SearchSpec, WeightedColumn, WordPredicate};
pub use sqlite::{fetch_ranked, RankedRow};
pub use tokens::SearchTerms;
pub use word_filter::WordFilter;
