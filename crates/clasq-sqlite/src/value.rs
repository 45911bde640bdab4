//! Conversions between [`SqlValue`] and SQLite values.

use clasq_core::SqlValue;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

/// A [`SqlValue`] bound as a SQLite parameter.
pub(crate) struct Param<'a>(pub(crate) &'a SqlValue);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            SqlValue::Int(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Float(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            SqlValue::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            SqlValue::Date(v) => v.to_sql()?,
            SqlValue::Time(v) => v.to_sql()?,
            SqlValue::DateTime(v) => v.to_sql()?,
        })
    }
}

/// Reads a column value. Text is kept as text; SQLite stores dates that way.
pub(crate) fn from_sql(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Int(v),
        ValueRef::Real(v) => SqlValue::Float(v),
        ValueRef::Text(v) => SqlValue::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => SqlValue::Bytes(v.to_vec()),
    }
}

/// Parses a `dflt_value` reported by `pragma_table_info`. Expressions other
/// than plain literals yield `None`.
pub(crate) fn parse_default(text: &str) -> Option<SqlValue> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("NULL") {
        return None;
    }
    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Some(SqlValue::Text(inner.replace("''", "'")));
    }
    if let Ok(v) = text.parse::<i64>() {
        return Some(SqlValue::Int(v));
    }
    text.parse::<f64>().ok().map(SqlValue::Float)
}
