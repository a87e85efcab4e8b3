use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::SqlParam;

/// Tri-state field in a partial update payload: absent means "do not touch",
/// explicit null means "clear", a value means "set".
///
/// `Missing` comes from `#[serde(default)]`; the Deserialize impl only ever
/// sees present keys, so it maps null to `Null` and anything else to `Value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// Builds an UPDATE statement touching exactly the supplied columns, plus an
/// unconditional refresh of `updated_at`. Callers must check `is_empty()`
/// first: an update with zero assignments is a read-by-id, never a write.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<String>,
    params: Vec<SqlParam>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn set(&mut self, column: &str, value: impl Into<SqlParam>) -> &mut Self {
        let idx = self.params.len() + 1;
        self.assignments.push(format!("{} = ${}", column, idx));
        self.params.push(value.into());
        self
    }

    /// Assign only when the value is supplied.
    pub fn set_opt(&mut self, column: &str, value: Option<impl Into<SqlParam>>) -> &mut Self {
        if let Some(v) = value {
            self.set(column, v);
        }
        self
    }

    /// Assign from a tri-state patch field; `Null` clears the column.
    pub fn set_patch(&mut self, column: &str, value: Patch<impl Into<SqlParam>>) -> &mut Self {
        match value {
            Patch::Missing => {}
            Patch::Null => {
                self.set(column, SqlParam::Null);
            }
            Patch::Value(v) => {
                self.set(column, v);
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Final statement and parameters. The row id binds after all
    /// assignment parameters.
    pub fn build(self, id: Uuid, returning: &str) -> (String, Vec<SqlParam>) {
        let id_idx = self.params.len() + 1;
        let sql = format!(
            "UPDATE {} SET {}, updated_at = NOW() WHERE id = ${} RETURNING {}",
            self.table,
            self.assignments.join(", "),
            id_idx,
            returning,
        );

        let mut params = self.params;
        params.push(SqlParam::Uuid(id));
        (sql, params)
    }
}
