//! Public entry points: compile a free-text search into a caller's query.

use crate::aggregator::aggregate;
use crate::assembler::{merge, physical_identifier, Assembler};
use crate::builder::{CompiledQuery, QueryBuilder};
use crate::config::SearchOptions;
use crate::error::{Result, SearchError};
use crate::schema::SchemaSource;
use crate::scorer::{score_column, ColumnTerms};
use crate::spec::{SearchSpec, WeightedColumn};
use crate::tokens::SearchTerms;
use crate::word_filter::WordFilter;
use tracing::debug;

/// A table made searchable by a [`SearchSpec`].
///
/// Holds no per-call state: every search compiles its rules, terms and
/// bindings from scratch, so one instance can serve any number of calls.
#[derive(Debug, Clone)]
pub struct Searchable<S: SchemaSource> {
    spec: SearchSpec,
    schema: S,
}

impl<S: SchemaSource> Searchable<S> {
    pub fn new(spec: SearchSpec, schema: S) -> Result<Self> {
        spec.validate()?;
        Ok(Self { spec, schema })
    }

    pub fn spec(&self) -> &SearchSpec {
        &self.spec
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Scope `base` to rows matching `query`, ranked by relevance.
    ///
    /// A blank query returns `base` untouched. A non-finite threshold is a
    /// [`SearchError::Validation`].
    pub fn search<Q: QueryBuilder>(
        &self,
        base: Q,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Q> {
        self.search_restricted(base, query, None::<fn(Q) -> Q>, options)
    }

    /// Like [`search`](Self::search), with a hook that may rewrite the
    /// private scored query before it is merged into `base`.
    pub fn search_restricted<Q, F>(
        &self,
        base: Q,
        query: &str,
        restriction: Option<F>,
        options: &SearchOptions,
    ) -> Result<Q>
    where
        Q: QueryBuilder,
        F: FnOnce(Q) -> Q,
    {
        options.validate()?;

        let Some(terms) = SearchTerms::parse(query) else {
            debug!("Blank search on {}; query left unchanged", self.schema.table_name());
            return Ok(base);
        };

        if base.dialect() != self.schema.dialect() {
            return Err(SearchError::config(format!(
                "query builder renders {} but table {} is configured for {}",
                base.dialect(),
                self.schema.table_name(),
                self.schema.dialect()
            )));
        }

        let filter = WordFilter::compile(&self.spec)?;
        let columns = self.searched_columns()?;
        let scored = self.score_columns(&filter, &columns, &terms, options);
        let relevance = aggregate(scored);

        let assembler = Assembler::new(&self.spec, &self.schema, &columns);
        let private = assembler.assemble(&base, &relevance, options.threshold)?;
        let private = match restriction {
            Some(restrict) => restrict(private),
            None => private,
        };

        Ok(merge(private, base, &assembler.table()))
    }

    /// Compile a search straight to SQL text and bindings.
    pub fn compile<Q: QueryBuilder>(
        &self,
        base: Q,
        query: &str,
        options: &SearchOptions,
    ) -> Result<CompiledQuery> {
        Ok(self.search(base, query, options)?.compile())
    }

    /// Configured columns, or every table column with weight 1.
    pub fn searched_columns(&self) -> Result<Vec<WeightedColumn>> {
        if !self.spec.columns.is_empty() {
            return Ok(self.spec.columns.clone());
        }

        let table = self.schema.table_name();
        let columns = self.schema.table_columns().map_err(|err| {
            SearchError::config(format!(
                "no searchable columns configured for {} and none could be listed: {}",
                table, err
            ))
        })?;
        Ok(columns
            .into_iter()
            .map(|column| WeightedColumn::new(format!("{}.{}", table, column), 1.0))
            .collect())
    }

    fn score_columns(
        &self,
        filter: &WordFilter,
        columns: &[WeightedColumn],
        terms: &SearchTerms,
        options: &SearchOptions,
    ) -> Vec<ColumnTerms> {
        let dialect = self.schema.dialect();
        let prefix = self.schema.table_prefix();
        let whole_text = terms
            .wants_whole_text(options.match_whole_text, options.match_whole_text_only)
            .then_some(terms.text.as_str());

        columns
            .iter()
            .filter_map(|column| {
                let admitted = filter.admit(&column.column, &terms.words);
                if admitted.is_empty() {
                    debug!("No search words admitted for {}", column.column);
                    return None;
                }
                Some(score_column(
                    dialect,
                    &physical_identifier(prefix, &column.column),
                    column.weight,
                    &admitted,
                    !options.match_whole_text_only,
                    whole_text,
                ))
            })
            .collect()
    }
}
