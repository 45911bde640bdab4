//! The connection boundary.
//!
//! The core never talks to a database itself. Everything it executes goes
//! through a [`Connection`], which runs a statement with bound parameters and
//! hands back the rows, if any.

use tracing::debug;

use crate::error::{Error, ObjectError, Result};
use crate::query::{ArgValues, QueryData};
use crate::schema::{ColumnBuilder, SqlType, TableBuilder};
use crate::table_data::TableData;
use crate::value::SqlValue;

/// A database connection.
pub trait Connection: Send {
    /// Runs one statement.
    ///
    /// Returns `Some` when the statement produced a result set, even an
    /// empty one, and `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] for driver failures.
    fn run(&mut self, stmt: &str, params: &[SqlValue]) -> Result<Option<TableData>>;

    /// Runs one statement for each parameter set, stopping at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    fn run_many(&mut self, stmt: &str, rows: &[Vec<SqlValue>]) -> Result<Vec<Option<TableData>>> {
        rows.iter().map(|params| self.run(stmt, params)).collect()
    }

    /// Commits the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] for driver failures.
    fn commit(&mut self) -> Result<()>;

    /// Returns the id of the last inserted row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] for driver failures.
    fn last_row_id(&mut self) -> Result<i64>;

    /// Reads the table definitions of the connected database.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`ObjectError::NotSpecified`].
    fn table_schemas(&mut self) -> Result<Vec<TableSchema>> {
        Err(ObjectError::NotSpecified(String::from(
            "This connection does not support schema introspection.",
        ))
        .into())
    }
}

impl dyn Connection + '_ {
    /// Runs a compiled statement, resolving its arguments from their defaults.
    ///
    /// # Errors
    ///
    /// Fails on unresolved arguments or driver errors.
    pub fn run_query(&mut self, qd: &QueryData) -> Result<Option<TableData>> {
        let params = qd.params()?;
        debug!(stmt = qd.stmt(), params = params.len(), "running statement");
        self.run(qd.stmt(), &params)
    }

    /// Runs a compiled statement once per set of argument values.
    ///
    /// # Errors
    ///
    /// Fails on unresolved arguments or driver errors.
    pub fn run_query_many(
        &mut self,
        qd: &QueryData,
        rows: &[ArgValues],
    ) -> Result<Vec<Option<TableData>>> {
        let params = qd.calc_params_many(rows, false)?;
        debug!(stmt = qd.stmt(), batch = params.len(), "running statement batch");
        self.run_many(qd.stmt(), &params)
    }

    /// Runs a statement that must produce rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] if the statement produced none.
    pub fn query(&mut self, qd: &QueryData) -> Result<TableData> {
        self.run_query(qd)?.ok_or(Error::NoResults)
    }

    /// Runs a statement that must not produce rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResultExists`] if the statement produced rows.
    pub fn execute(&mut self, qd: &QueryData) -> Result<()> {
        match self.run_query(qd)? {
            Some(_) => Err(Error::ResultExists),
            None => Ok(()),
        }
    }

    /// Batched [`query`](Self::query).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResults`] if any run produced no rows.
    pub fn query_many(&mut self, qd: &QueryData, rows: &[ArgValues]) -> Result<Vec<TableData>> {
        self.run_query_many(qd, rows)?
            .into_iter()
            .map(|res| res.ok_or(Error::NoResults))
            .collect()
    }

    /// Batched [`execute`](Self::execute).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResultExists`] if any run produced rows.
    pub fn execute_many(&mut self, qd: &QueryData, rows: &[ArgValues]) -> Result<()> {
        if self
            .run_query_many(qd, rows)?
            .iter()
            .any(Option::is_some)
        {
            return Err(Error::ResultExists);
        }
        Ok(())
    }
}

/// A column as reported by schema introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Parsed column type.
    pub sql_type: SqlType,
    /// Whether NULL is rejected.
    pub not_null: bool,
    /// Default value, when it is a plain literal.
    pub default: Option<SqlValue>,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
}

/// A table as reported by schema introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns in definition order.
    pub columns: Vec<ColumnSchema>,
}

impl From<&TableSchema> for TableBuilder {
    fn from(schema: &TableSchema) -> Self {
        let pk: Vec<&str> = schema
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect();
        let composite = pk.len() > 1;

        let mut builder = Self::new(schema.name.as_str());
        for col in &schema.columns {
            let mut column = ColumnBuilder::new(col.name.as_str(), col.sql_type);
            if col.not_null {
                column = column.not_null();
            }
            if let Some(default) = &col.default {
                column = column.default(default);
            }
            if col.primary_key && !composite {
                column = column.primary_key();
            }
            if col.auto_increment {
                column = column.auto_increment();
            }
            builder = builder.column(column);
        }
        if composite {
            builder = builder.primary_key(pk);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Keyword;

    #[derive(Default)]
    struct Scripted {
        statements: Vec<(String, Vec<SqlValue>)>,
        rows: Option<TableData>,
    }

    impl Connection for Scripted {
        fn run(&mut self, stmt: &str, params: &[SqlValue]) -> Result<Option<TableData>> {
            self.statements.push((stmt.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }

        fn commit(&mut self) -> Result<()> {
            Ok(())
        }

        fn last_row_id(&mut self) -> Result<i64> {
            Ok(0)
        }
    }

    #[test]
    fn test_result_shape_checks() {
        let qd = QueryData::build(Keyword("DELETE FROM t")).unwrap();
        let mut conn = Scripted::default();
        let dyn_conn: &mut dyn Connection = &mut conn;
        assert!(dyn_conn.execute(&qd).is_ok());
        assert!(matches!(dyn_conn.query(&qd), Err(Error::NoResults)));

        let mut conn = Scripted {
            rows: Some(TableData::default()),
            ..Scripted::default()
        };
        let dyn_conn: &mut dyn Connection = &mut conn;
        assert!(matches!(dyn_conn.execute(&qd), Err(Error::ResultExists)));
        assert!(dyn_conn.query(&qd).unwrap().is_empty());
    }

    #[test]
    fn test_run_many_resolves_each_row() {
        let qd = QueryData::build((
            Keyword("DELETE FROM t WHERE id ="),
            crate::query::Arg::new("id"),
        ))
        .unwrap();
        let mut conn = Scripted::default();
        let dyn_conn: &mut dyn Connection = &mut conn;
        let rows = [ArgValues::new().named("id", 1), ArgValues::new().named("id", 2)];
        dyn_conn.execute_many(&qd, &rows).unwrap();
        assert_eq!(
            conn.statements,
            vec![
                (String::from("DELETE FROM t WHERE id = ?"), vec![SqlValue::Int(1)]),
                (String::from("DELETE FROM t WHERE id = ?"), vec![SqlValue::Int(2)]),
            ]
        );
    }

    #[test]
    fn test_introspection_unsupported_by_default() {
        let mut conn = Scripted::default();
        let err = conn.table_schemas().unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotSpecified(_))));
    }

    #[test]
    fn test_schema_to_builder() {
        let schema = TableSchema {
            name: String::from("pairs"),
            columns: vec![
                ColumnSchema {
                    name: String::from("a"),
                    sql_type: SqlType::INT,
                    not_null: true,
                    default: None,
                    primary_key: true,
                    auto_increment: false,
                },
                ColumnSchema {
                    name: String::from("b"),
                    sql_type: SqlType::INT,
                    not_null: true,
                    default: Some(SqlValue::Int(0)),
                    primary_key: true,
                    auto_increment: false,
                },
            ],
        };
        let builder = TableBuilder::from(&schema);
        assert_eq!(builder.name(), "pairs");
        assert_eq!(builder.primary_key_names().len(), 2);
        assert!(builder.columns().iter().all(|c| !c.definition().primary_key));
    }
}
