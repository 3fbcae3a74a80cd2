//! Typed Query Composition
//!
//! Dynamic `WHERE` clauses are assembled from static column names and
//! bound parameters only. Caller-supplied values never reach the SQL text;
//! they always go through `push_bind`.

use std::time::Instant;

use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgPool, Postgres, QueryBuilder, Type};

use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

/// Binary comparison operators allowed in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::NotEq => " <> ",
            Self::Gt => " > ",
            Self::Gte => " >= ",
            Self::Lt => " < ",
            Self::Lte => " <= ",
        }
    }
}

/// Conjunction of predicates appended to a `QueryBuilder`.
///
/// The first predicate is introduced with `WHERE`, every later one with `AND`.
pub struct Predicates<'a, 'args> {
    builder: &'a mut QueryBuilder<'args, Postgres>,
    count: usize,
}

impl<'a, 'args> Predicates<'a, 'args> {
    pub fn new(builder: &'a mut QueryBuilder<'args, Postgres>) -> Self {
        Self { builder, count: 0 }
    }

    /// Number of predicates pushed so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn next_clause(&mut self) -> &mut QueryBuilder<'args, Postgres> {
        self.builder
            .push(if self.count == 0 { " WHERE " } else { " AND " });
        self.count += 1;
        &mut *self.builder
    }

    /// Append a fixed predicate with no parameters.
    pub fn push(&mut self, clause: &'static str) -> &mut Self {
        self.next_clause().push(clause);
        self
    }

    /// `column = value`
    pub fn eq<T>(&mut self, column: &'static str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.cmp(column, Comparison::Eq, value)
    }

    /// `column <op> value`
    pub fn cmp<T>(&mut self, column: &'static str, op: Comparison, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.next_clause()
            .push(column)
            .push(op.as_sql())
            .push_bind(value);
        self
    }

    /// `column = value` when a value is present, nothing otherwise.
    pub fn eq_opt<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.eq(column, value);
        }
        self
    }

    /// `column <op> value` when a value is present, nothing otherwise.
    pub fn cmp_opt<T>(&mut self, column: &'static str, op: Comparison, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.cmp(column, op, value);
        }
        self
    }

    /// Case-insensitive substring match. LIKE wildcards in `needle` match literally.
    pub fn contains_ci(&mut self, column: &'static str, needle: &str) -> &mut Self {
        let pattern = format!("%{}%", escape_like(needle));
        self.next_clause()
            .push(column)
            .push(" ILIKE ")
            .push_bind(pattern);
        self
    }

    /// Append a compound predicate written directly against the builder.
    ///
    /// The closure must only `push` static SQL and `push_bind` values.
    pub fn with<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut QueryBuilder<'args, Postgres>),
    {
        let builder = self.next_clause();
        builder.push("(");
        f(builder);
        builder.push(")");
        self
    }
}

/// Escape `\`, `%` and `_` so user input matches literally inside LIKE.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A count query and a page query sharing one predicate set.
///
/// The count runs first so the reported total always covers the whole
/// filtered set, whatever window the page query selects.
pub struct PagedQuery<'s> {
    /// Label used for query metrics
    pub table: &'static str,

    /// `SELECT COUNT(*) FROM ...` without a WHERE clause
    pub count_sql: &'s str,

    /// `SELECT ... FROM ...` without a WHERE clause
    pub select_sql: &'s str,

    /// Trusted ORDER BY expression (never caller text)
    pub order_by: &'static str,
}

impl<'s> PagedQuery<'s> {
    /// Run the count query, then the page query, applying the same predicates to both.
    pub async fn fetch<T, F>(
        &self,
        pool: &PgPool,
        window: PageRequest,
        apply: F,
    ) -> Result<Page<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        F: for<'a, 'args> Fn(&mut Predicates<'a, 'args>),
    {
        let started = Instant::now();

        let mut count_query = QueryBuilder::<Postgres>::new(self.count_sql);
        apply(&mut Predicates::new(&mut count_query));
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(pool)
            .await?;

        let mut page_query = self.page_builder(window, &apply);
        let items = page_query.build_query_as::<T>().fetch_all(pool).await?;

        metrics::record_db_query("list", self.table, started.elapsed().as_secs_f64());

        Ok(Page::new(items, total, window))
    }

    /// Build the page query without executing it.
    pub fn page_builder<F>(&self, window: PageRequest, apply: &F) -> QueryBuilder<'static, Postgres>
    where
        F: for<'a, 'args> Fn(&mut Predicates<'a, 'args>),
    {
        let mut builder = QueryBuilder::<Postgres>::new(self.select_sql);
        apply(&mut Predicates::new(&mut builder));
        builder
            .push(" ORDER BY ")
            .push(self.order_by)
            .push(" LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);
        builder
    }
}
