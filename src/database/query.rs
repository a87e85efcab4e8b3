use super::SqlParam;

/// Assembles a parameterized WHERE predicate shared by a page query and its
/// count query. Conditions are equality matches, except `search` which does a
/// case-insensitive substring match across several columns.
#[derive(Debug, Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next positional parameter index ($1-based).
    pub fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    pub fn eq(&mut self, column: &str, value: impl Into<SqlParam>) -> &mut Self {
        let idx = self.next_index();
        self.conditions.push(format!("{} = ${}", column, idx));
        self.params.push(value.into());
        self
    }

    /// `(a ILIKE $n OR b ILIKE $n)` — one parameter reused across columns.
    pub fn search(&mut self, columns: &[&str], needle: &str) -> &mut Self {
        let idx = self.next_index();
        let clause = columns
            .iter()
            .map(|c| format!("{} ILIKE ${}", c, idx))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.conditions.push(format!("({})", clause));
        self.params.push(SqlParam::Text(format!("%{}%", needle)));
        self
    }

    /// The WHERE clause (with leading space) or an empty string.
    pub fn clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

/// Validated pagination window. Construction happens in the validation
/// layer; by this point page and limit are both >= 1 and limit is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// `LIMIT $n OFFSET $n+1` continuing the builder's parameter numbering.
    pub fn limit_offset_sql(&self, next_index: usize) -> String {
        format!(" LIMIT ${} OFFSET ${}", next_index, next_index + 1)
    }
}
