//! Aggregate statement assembly
//!
//! [`SelectStatement`] collects already-rendered SQL fragments and joins them
//! into `SELECT .. FROM .. WHERE .. GROUP BY .. ORDER BY .. LIMIT ..`.
//! Nothing here resolves paths or escapes values.

use std::fmt;

use crate::granularity::Granularity;

/// Sort direction of an ORDER BY key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
struct SortKey {
    expr: String,
    direction: Direction,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => f.write_str(&self.expr),
            Direction::Desc => write!(f, "{} DESC", self.expr),
        }
    }
}

/// A single aggregate `SELECT` over one table
#[derive(Debug, Clone)]
pub struct SelectStatement {
    table: String,
    projections: Vec<String>,
    predicates: Vec<String>,
    grouping: Vec<String>,
    ordering: Vec<SortKey>,
    limit: Option<u32>,
}

impl SelectStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projections: Vec::new(),
            predicates: Vec::new(),
            grouping: Vec::new(),
            ordering: Vec::new(),
            limit: None,
        }
    }

    /// Append a projection
    pub fn project(mut self, expr: impl Into<String>) -> Self {
        self.projections.push(expr.into());
        self
    }

    /// Append `expr AS alias`
    pub fn project_as(self, expr: impl AsRef<str>, alias: impl AsRef<str>) -> Self {
        let projection = format!("{} AS {}", expr.as_ref(), alias.as_ref());
        self.project(projection)
    }

    /// AND a predicate into the WHERE clause
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.predicates.push(predicate.into());
        self
    }

    /// Append a GROUP BY key
    pub fn group(mut self, expr: impl Into<String>) -> Self {
        self.grouping.push(expr.into());
        self
    }

    /// Append an ORDER BY key
    pub fn order(mut self, expr: impl Into<String>, direction: Direction) -> Self {
        self.ordering.push(SortKey {
            expr: expr.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Lead with the bucket label; group and sort by it before anything else
    pub fn bucketed(
        mut self,
        granularity: Granularity,
        timestamp_col: &str,
        alias: &str,
    ) -> Self {
        let label = granularity.label_expr(timestamp_col);
        self.projections.insert(0, format!("{} AS {}", label, alias));
        self.grouping.insert(0, alias.to_string());
        self.ordering.insert(
            0,
            SortKey {
                expr: alias.to_string(),
                direction: Direction::Asc,
            },
        );
        self
    }

    /// Project a dimension under `alias`, grouping by the expression itself
    pub fn dimension(self, expr: &str, alias: &str) -> Self {
        self.project_as(expr, alias).group(expr)
    }

    pub fn is_ordered(&self) -> bool {
        !self.ordering.is_empty()
    }

    /// Render the statement
    pub fn build(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.projections.is_empty() {
            write!(f, "SELECT * FROM {}", self.table)?;
        } else {
            write!(f, "SELECT {} FROM {}", self.projections.join(", "), self.table)?;
        }

        write_clause(f, "WHERE", &self.predicates, " AND ")?;
        write_clause(f, "GROUP BY", &self.grouping, ", ")?;
        write_clause(f, "ORDER BY", &self.ordering, ", ")?;

        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

fn write_clause<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i == 0 {
            write!(f, " {} {}", keyword, item)?;
        } else {
            write!(f, "{}{}", separator, item)?;
        }
    }
    Ok(())
}

/// Double-quote an identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
