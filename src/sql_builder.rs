//! Parameterized SQL construction.
//!
//! Every caller-supplied value is bound through a `?` placeholder and never
//! spliced into the statement text. Builder methods return `&mut Self` so
//! conditions can be added conditionally and chained.
//!
//! # Example
//!
//! ```rust
//! use chart_journal::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("charts")
//!     .where_eq("strategyType", "breakout")
//!     .where_contains("stockName", "aapl")
//!     .order_by(&["date DESC"])
//!     .build();
//! assert!(sql.contains("WHERE strategyType = ?"));
//! assert_eq!(params, vec!["breakout", "aapl"]);
//! ```

/// Builds SELECT, COUNT and DELETE statements against a single table.
/// Conditions are AND-ed in the order they were added.
pub struct SqlBuilder {
    table: String,
    columns: Vec<String>,
    distinct: bool,
    conditions: Vec<String>,
    params: Vec<String>,
    ordering: Vec<String>,
    limit: Option<usize>,
}

impl SqlBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: vec!["*".to_string()],
            distinct: false,
            conditions: Vec::new(),
            params: Vec::new(),
            ordering: Vec::new(),
            limit: None,
        }
    }

    /// Record a condition with a single bound value.
    fn bind(&mut self, condition: String, value: &str) -> &mut Self {
        self.conditions.push(condition);
        self.params.push(value.to_string());
        self
    }

    /// Replace the default `*` projection.
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.columns = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Raw condition using one `?` per entry in `params`.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.bind(format!("{column} = ?"), value)
    }

    pub fn where_eq_ignore_case(&mut self, column: &str, value: &str) -> &mut Self {
        self.bind(format!("LOWER({column}) = LOWER(?)"), value)
    }

    /// Case-insensitive substring match.
    ///
    /// Uses `contains()` rather than LIKE so `%` and `_` in the needle are
    /// matched literally.
    pub fn where_contains(&mut self, column: &str, needle: &str) -> &mut Self {
        self.bind(format!("contains(LOWER({column}), LOWER(?))"), needle)
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.where_clause(&format!("{column} IS NULL"), &[])
    }

    /// Inclusive lower bound.
    pub fn where_gte(&mut self, column: &str, value: &str) -> &mut Self {
        self.bind(format!("{column} >= ?"), value)
    }

    /// Inclusive upper bound.
    pub fn where_lte(&mut self, column: &str, value: &str) -> &mut Self {
        self.bind(format!("{column} <= ?"), value)
    }

    /// One parenthesized group of OR-ed `(fragment, param)` pairs, each
    /// fragment holding a single `?`. No-op when empty.
    ///
    /// ```rust
    /// use chart_journal::SqlBuilder;
    /// let mut builder = SqlBuilder::new("charts");
    /// builder.where_or(&[("strategyType = ?", "id-1"), ("LOWER(strategyType) = LOWER(?)", "Gap Trading")]);
    /// let (sql, _) = builder.build();
    /// assert!(sql.contains("(strategyType = ? OR LOWER(strategyType) = LOWER(?))"));
    /// ```
    pub fn where_or(&mut self, alternatives: &[(&str, &str)]) -> &mut Self {
        if alternatives.is_empty() {
            return self;
        }
        let (fragments, values): (Vec<&str>, Vec<&str>) = alternatives.iter().copied().unzip();
        self.where_clause(&format!("({})", fragments.join(" OR ")), &values)
    }

    /// Append ORDER BY terms such as `"date DESC"`.
    pub fn order_by(&mut self, terms: &[&str]) -> &mut Self {
        self.ordering.extend(terms.iter().map(|t| t.to_string()));
        self
    }

    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit = Some(n);
        self
    }

    fn from_where(&self) -> Vec<String> {
        let mut parts = vec![format!("FROM {}", self.table)];
        if !self.conditions.is_empty() {
            parts.push(format!("WHERE {}", self.conditions.join(" AND ")));
        }
        parts
    }

    /// The SELECT statement and its parameters, in placeholder order.
    pub fn build(&self) -> (String, Vec<String>) {
        let head = format!(
            "SELECT {}{}",
            if self.distinct { "DISTINCT " } else { "" },
            self.columns.join(", ")
        );
        let mut parts = vec![head];
        parts.extend(self.from_where());
        if !self.ordering.is_empty() {
            parts.push(format!("ORDER BY {}", self.ordering.join(", ")));
        }
        if let Some(n) = self.limit {
            parts.push(format!("LIMIT {n}"));
        }
        (parts.join("\n"), self.params.clone())
    }

    /// `SELECT COUNT(*)` over the current conditions. Projection, ordering
    /// and limit are ignored.
    pub fn build_count(&self) -> (String, Vec<String>) {
        let mut parts = vec!["SELECT COUNT(*)".to_string()];
        parts.extend(self.from_where());
        (parts.join("\n"), self.params.clone())
    }

    /// DELETE over the current conditions, or `None` when there are none.
    /// Clearing a table takes an explicit `where_clause("TRUE", &[])`.
    pub fn build_delete(&self) -> Option<(String, Vec<String>)> {
        if self.conditions.is_empty() {
            return None;
        }
        let sql = format!("DELETE {}", self.from_where().join("\n"));
        Some((sql, self.params.clone()))
    }
}
