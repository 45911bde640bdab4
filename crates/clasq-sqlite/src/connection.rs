//! [`Connection`] implementation over `rusqlite`.

use std::path::Path;
use std::time::Duration;

use clasq_core::connection::{ColumnSchema, Connection, TableSchema};
use clasq_core::{SqlType, SqlValue, TableData};
use rusqlite::Connection as RusqliteConnection;
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::error::Result;
use crate::value::{from_sql, parse_default, Param};

const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
                           WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid";

const TABLE_INFO: &str = "SELECT name, type, \"notnull\", dflt_value, pk \
                          FROM pragma_table_info(?) ORDER BY cid";

type RawRows = (Vec<String>, Vec<Vec<SqlValue>>);

/// A SQLite database connection.
#[derive(Debug)]
pub struct SqliteConnection {
    connection: RusqliteConnection,
}

impl SqliteConnection {
    /// Opens a database file, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Sqlite`](crate::SqliteError::Sqlite) when the
    /// file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&SqliteConfig::file(path.as_ref()))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Sqlite`](crate::SqliteError::Sqlite) when
    /// SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self> {
        Self::from_config(&SqliteConfig::in_memory())
    }

    /// Opens a database as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Sqlite`](crate::SqliteError::Sqlite) when
    /// opening fails or an init statement fails.
    pub fn from_config(config: &SqliteConfig) -> Result<Self> {
        let connection = match &config.path {
            Some(path) => RusqliteConnection::open(path)?,
            None => RusqliteConnection::open_in_memory()?,
        };
        if let Some(ms) = config.busy_timeout_ms {
            connection.busy_timeout(Duration::from_millis(ms))?;
        }
        connection.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        for sql in &config.init_sql {
            connection.execute_batch(sql)?;
        }
        info!(path = ?config.path, "sqlite connection opened");
        Ok(Self { connection })
    }

    /// Runs a semicolon-separated script without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Sqlite`](crate::SqliteError::Sqlite) at the
    /// first failing statement.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(len = sql.len(), "running script");
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    /// Opens a transaction, committed by [`Connection::commit`].
    ///
    /// # Errors
    ///
    /// Fails when a transaction is already open.
    pub fn begin(&self) -> Result<()> {
        self.connection.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Returns `true` unless a transaction is open.
    #[must_use]
    pub fn is_autocommit(&self) -> bool {
        self.connection.is_autocommit()
    }

    /// Returns the underlying `rusqlite` connection.
    #[must_use]
    pub const fn inner(&self) -> &RusqliteConnection {
        &self.connection
    }

    fn run_statement(&self, stmt: &str, params: &[SqlValue]) -> Result<Option<RawRows>> {
        let mut prepared = self.connection.prepare_cached(stmt)?;
        let params = rusqlite::params_from_iter(params.iter().map(Param));
        if prepared.column_count() == 0 {
            prepared.execute(params)?;
            return Ok(None);
        }

        let columns: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();
        let mut data = Vec::new();
        let mut rows = prepared.query(params)?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sql(row.get_ref(i)?));
            }
            data.push(values);
        }
        Ok(Some((columns, data)))
    }

    fn read_table_schemas(&self) -> Result<Vec<TableSchema>> {
        let names: Vec<String> = {
            let mut stmt = self.connection.prepare(LIST_TABLES)?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut stmt = self.connection.prepare(TABLE_INFO)?;
        let mut schemas = Vec::with_capacity(names.len());
        for name in names {
            let columns = stmt
                .query_map([&name], |row| {
                    let declared: String = row.get(1)?;
                    let default: Option<String> = row.get(3)?;
                    let pk: i64 = row.get(4)?;
                    Ok(ColumnSchema {
                        name: row.get(0)?,
                        sql_type: SqlType::parse(&declared).unwrap_or(SqlType::Any),
                        not_null: row.get::<_, i64>(2)? != 0 || pk > 0,
                        default: default.as_deref().and_then(parse_default),
                        primary_key: pk > 0,
                        auto_increment: false,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            debug!(table = %name, columns = columns.len(), "table introspected");
            schemas.push(TableSchema { name, columns });
        }
        Ok(schemas)
    }
}

impl Connection for SqliteConnection {
    fn run(&mut self, stmt: &str, params: &[SqlValue]) -> clasq_core::Result<Option<TableData>> {
        match self.run_statement(stmt, params)? {
            Some((columns, rows)) => TableData::new(columns, rows).map(Some),
            None => Ok(None),
        }
    }

    fn commit(&mut self) -> clasq_core::Result<()> {
        if !self.connection.is_autocommit() {
            self.connection
                .execute_batch("COMMIT")
                .map_err(clasq_core::Error::driver)?;
        }
        Ok(())
    }

    fn last_row_id(&mut self) -> clasq_core::Result<i64> {
        Ok(self.connection.last_insert_rowid())
    }

    fn table_schemas(&mut self) -> clasq_core::Result<Vec<TableSchema>> {
        let schemas = self.read_table_schemas()?;
        info!(tables = schemas.len(), "schema introspected");
        Ok(schemas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> SqliteConnection {
        let conn = SqliteConnection::in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name VARCHAR(16) NOT NULL, score INT DEFAULT 0);
             INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_query_returns_rows() {
        let mut conn = conn();
        let data = conn
            .run("SELECT `id`, `name` FROM `t` WHERE `id` > ?", &[SqlValue::Int(1)])
            .unwrap()
            .unwrap();
        assert_eq!(data.columns(), ["id", "name"]);
        assert_eq!(data.rows(), [vec![SqlValue::Int(2), SqlValue::from("b")]]);
    }

    #[test]
    fn test_empty_result_is_some() {
        let mut conn = conn();
        let data = conn
            .run("SELECT `id` FROM `t` WHERE `id` > ?", &[SqlValue::Int(10)])
            .unwrap();
        assert!(data.is_some_and(|d| d.is_empty()));
    }

    #[test]
    fn test_write_returns_none() {
        let mut conn = conn();
        let out = conn
            .run("INSERT INTO `t` (`name`) VALUES (?)", &[SqlValue::from("c")])
            .unwrap();
        assert!(out.is_none());
        assert_eq!(conn.last_row_id().unwrap(), 3);
    }

    #[test]
    fn test_driver_error() {
        let mut conn = conn();
        let err = conn.run("SELECT * FROM `missing`", &[]).unwrap_err();
        assert!(matches!(err, clasq_core::Error::Driver(_)));
    }

    #[test]
    fn test_commit() {
        let mut conn = conn();
        conn.commit().unwrap();
        conn.begin().unwrap();
        assert!(!conn.is_autocommit());
        conn.run("DELETE FROM `t`", &[]).unwrap();
        conn.commit().unwrap();
        assert!(conn.is_autocommit());
    }

    #[test]
    fn test_table_schemas() {
        let mut conn = conn();
        let schemas = conn.table_schemas().unwrap();
        assert_eq!(schemas.len(), 1);
        let t = &schemas[0];
        assert_eq!(t.name, "t");
        let names: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "score"]);
        assert_eq!(t.columns[0].sql_type, SqlType::INT);
        assert!(t.columns[0].primary_key);
        assert_eq!(t.columns[1].sql_type, SqlType::VarChar(16));
        assert!(t.columns[1].not_null);
        assert_eq!(t.columns[2].default, Some(SqlValue::Int(0)));
    }

    #[test]
    fn test_init_sql() {
        let config = SqliteConfig {
            init_sql: vec![String::from("CREATE TABLE x (id INT)")],
            ..SqliteConfig::in_memory()
        };
        let mut conn = SqliteConnection::from_config(&config).unwrap();
        assert_eq!(conn.table_schemas().unwrap()[0].name, "x");
    }
}
