//! Databases: table registry and connection owner.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{ObjectError, Result};
use crate::name::ObjectName;
use crate::query::{ArgValues, QueryData};
use crate::table_data::TableData;

use super::table::{CreateOptions, Table, TableBuilder};

pub(crate) struct DatabaseInner {
    name: Option<ObjectName>,
    charset: Option<String>,
    collate: Option<String>,
    tables: RwLock<IndexMap<ObjectName, Table>>,
    connection: Mutex<Option<Box<dyn Connection>>>,
}

/// Builder for [`Database`].
///
/// # Example
///
/// ```rust
/// use clasq_core::schema::{column::int, DatabaseBuilder, TableBuilder};
///
/// let db = DatabaseBuilder::new()
///     .name("shop")
///     .table(TableBuilder::new("users").column(int("id").primary_key()))
///     .build()
///     .unwrap();
///
/// assert!(db.contains("users"));
/// assert!(!db.is_connected());
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    name: Option<ObjectName>,
    charset: Option<String>,
    collate: Option<String>,
    tables: Vec<TableBuilder>,
    connection: Option<Box<dyn Connection>>,
    fetch_from_connection: bool,
}

impl DatabaseBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database name, used by `CREATE DATABASE`.
    #[must_use]
    pub fn name(mut self, name: impl Into<ObjectName>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the default character set.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the default collation.
    #[must_use]
    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    /// Adds a table definition.
    #[must_use]
    pub fn table(mut self, table: TableBuilder) -> Self {
        self.tables.push(table);
        self
    }

    /// Attaches a connection.
    #[must_use]
    pub fn connection(mut self, connection: Box<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Reads the table definitions from the connection instead of taking
    /// them from [`table`](Self::table).
    #[must_use]
    pub const fn fetch_from_connection(mut self, fetch: bool) -> Self {
        self.fetch_from_connection = fetch;
        self
    }

    /// Builds the database and registers its tables.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] when tables are both given and
    /// fetched, [`ObjectError::NotSet`] when fetching without a connection,
    /// and any table validation or introspection failure.
    pub fn build(self) -> Result<Database> {
        if self.fetch_from_connection {
            if !self.tables.is_empty() {
                return Err(ObjectError::ArgValue(String::from(
                    "Tables cannot be given when fetched from the connection.",
                ))
                .into());
            }
            if self.connection.is_none() {
                return Err(ObjectError::NotSet(String::from("Connection is not set.")).into());
            }
        }

        let db = Database(Arc::new(DatabaseInner {
            name: self.name,
            charset: self.charset,
            collate: self.collate,
            tables: RwLock::new(IndexMap::new()),
            connection: Mutex::new(self.connection),
        }));

        let tables = if self.fetch_from_connection {
            let schemas = db.with_connection(|conn| conn.table_schemas())?;
            schemas.iter().map(TableBuilder::from).collect()
        } else {
            self.tables
        };
        for table in tables {
            db.append_table(table)?;
        }
        info!(
            database = ?db.name(),
            tables = db.0.tables.read().len(),
            "database built"
        );
        Ok(db)
    }
}

/// A set of tables and the connection they are read and written through.
///
/// Cloning is cheap; clones share the registry and the connection.
#[derive(Clone)]
pub struct Database(Arc<DatabaseInner>);

impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Database {}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.0.name)
            .field("tables", &self.0.tables.read().keys().collect::<Vec<_>>())
            .field(
                "connected",
                &self.0.connection.try_lock().map(|conn| conn.is_some()),
            )
            .finish()
    }
}

impl Database {
    pub(crate) const fn from_inner(inner: Arc<DatabaseInner>) -> Self {
        Self(inner)
    }

    /// Shorthand for [`DatabaseBuilder::new`].
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> Option<&ObjectName> {
        self.0.name.as_ref()
    }

    // ---- tables ----

    /// Looks up a table.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] for an unknown name.
    pub fn table(&self, name: impl Into<ObjectName>) -> Result<Table> {
        let name = name.into();
        self.table_or_none(&name)
            .ok_or_else(|| ObjectError::not_found("Table not found.", &name).into())
    }

    /// Looks up a table, returning `None` for an unknown name.
    #[must_use]
    pub fn table_or_none(&self, name: &ObjectName) -> Option<Table> {
        self.0.tables.read().get(name).cloned()
    }

    /// Returns `table` if it is bound to this database.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSelf`] for a table of another database or a
    /// detached one.
    pub fn own_table(&self, table: &Table) -> Result<Table> {
        match table.database() {
            Ok(db) if db == *self => Ok(table.clone()),
            _ => Err(ObjectError::NotSelf(String::from("Not a table of this database.")).into()),
        }
    }

    /// Returns the registered tables in registration order.
    #[must_use]
    pub fn tables(&self) -> Vec<Table> {
        self.0.tables.read().values().cloned().collect()
    }

    /// Returns `true` if a table with this name is registered.
    #[must_use]
    pub fn contains(&self, name: impl Into<ObjectName>) -> bool {
        self.0.tables.read().contains_key(&name.into())
    }

    /// Builds a table bound to this database and registers it.
    ///
    /// Nothing is executed; see [`Table::create`].
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NameAlreadyExists`] for a taken name and any
    /// table validation failure.
    pub fn append_table(&self, table: TableBuilder) -> Result<Table> {
        let mut tables = self.0.tables.write();
        if tables.contains_key(table.name()) {
            return Err(ObjectError::name_exists("Table name already exists.", table.name()).into());
        }
        let table = table.build(Arc::downgrade(&self.0))?;
        info!(table = %table.name(), "table registered");
        tables.insert(table.name().clone(), table.clone());
        Ok(table)
    }

    /// Removes a table from the registry without dropping it.
    ///
    /// Views derived from the table keep working.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] for an unknown name.
    pub fn remove_table(&self, name: &ObjectName) -> Result<Table> {
        let removed = self.0.tables.write().shift_remove(name);
        let table = removed.ok_or_else(|| ObjectError::not_found("Table not found.", name))?;
        warn!(table = %name, "table removed from database");
        Ok(table)
    }

    // ---- connection ----

    /// Attaches a connection.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::AlreadySet`] if a connection is attached.
    pub fn connect(&self, connection: Box<dyn Connection>) -> Result<()> {
        let mut slot = self.0.connection.lock();
        if slot.is_some() {
            return Err(ObjectError::AlreadySet(String::from("Connection is already set.")).into());
        }
        *slot = Some(connection);
        debug!(database = ?self.name(), "connection attached");
        Ok(())
    }

    /// Detaches and returns the connection.
    pub fn disconnect(&self) -> Option<Box<dyn Connection>> {
        let connection = self.0.connection.lock().take();
        if connection.is_some() {
            debug!(database = ?self.name(), "connection detached");
        }
        connection
    }

    /// Returns `true` if a connection is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.0.connection.lock().is_some()
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`] without a connection, and whatever
    /// `f` returns.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Connection) -> Result<T>,
    {
        let mut slot = self.0.connection.lock();
        let conn = slot
            .as_deref_mut()
            .ok_or_else(|| ObjectError::NotSet(String::from("Connection is not set.")))?;
        f(conn)
    }

    /// Runs a statement that must produce rows.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection) and
    /// [`Connection::run`].
    pub fn query(&self, qd: &QueryData) -> Result<TableData> {
        self.with_connection(|conn| conn.query(qd))
    }

    /// Runs a statement that must not produce rows.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection) and
    /// [`Connection::run`].
    pub fn execute(&self, qd: &QueryData) -> Result<()> {
        self.with_connection(|conn| conn.execute(qd))
    }

    /// Runs a statement once per set of argument values, collecting rows.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection) and
    /// [`Connection::run_many`].
    pub fn query_many(&self, qd: &QueryData, rows: &[ArgValues]) -> Result<Vec<TableData>> {
        self.with_connection(|conn| conn.query_many(qd, rows))
    }

    /// Runs a statement once per set of argument values.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection) and
    /// [`Connection::run_many`].
    pub fn execute_many(&self, qd: &QueryData, rows: &[ArgValues]) -> Result<()> {
        self.with_connection(|conn| conn.execute_many(qd, rows))
    }

    /// Commits the current transaction.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection).
    pub fn commit(&self) -> Result<()> {
        self.with_connection(|conn| conn.commit())?;
        debug!(database = ?self.name(), "committed");
        Ok(())
    }

    /// Returns the id of the last inserted row.
    ///
    /// # Errors
    ///
    /// See [`with_connection`](Self::with_connection).
    pub fn last_row_id(&self) -> Result<i64> {
        self.with_connection(|conn| conn.last_row_id())
    }

    // ---- definition ----

    fn require_name(&self) -> Result<&ObjectName> {
        self.name()
            .ok_or_else(|| ObjectError::NotSet(String::from("Database name is not set.")).into())
    }

    /// Builds `CREATE DATABASE [IF NOT EXISTS] name [CHARACTER SET cs]
    /// [COLLATE co]`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`] for an unnamed database.
    pub fn create_database_query(&self, if_not_exists: bool) -> Result<QueryData> {
        let mut qd = QueryData::new();
        qd.append_keyword("CREATE DATABASE")?;
        if if_not_exists {
            qd.append_keyword("IF NOT EXISTS")?;
        }
        qd.append_object_name(self.require_name()?)?;
        if let Some(charset) = &self.0.charset {
            qd.append_keyword("CHARACTER SET")?;
            qd.append_keyword(charset)?;
        }
        if let Some(collate) = &self.0.collate {
            qd.append_keyword("COLLATE")?;
            qd.append_keyword(collate)?;
        }
        Ok(qd)
    }

    /// Builds `DROP DATABASE [IF EXISTS] name`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`] for an unnamed database.
    pub fn drop_database_query(&self, if_exists: bool) -> Result<QueryData> {
        let mut qd = QueryData::new();
        qd.append_keyword("DROP DATABASE")?;
        if if_exists {
            qd.append_keyword("IF EXISTS")?;
        }
        qd.append_object_name(self.require_name()?)?;
        Ok(qd)
    }

    /// Creates every registered table in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing table.
    pub fn create_tables(&self, options: CreateOptions) -> Result<()> {
        for table in self.tables() {
            table.create(options)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex as PlMutex;

    use super::*;
    use crate::schema::column::{int, varchar};
    use crate::value::SqlValue;

    type Log = Arc<PlMutex<Vec<(String, Vec<SqlValue>)>>>;

    struct Recording {
        log: Log,
        rows: Option<TableData>,
    }

    impl Connection for Recording {
        fn run(&mut self, stmt: &str, params: &[SqlValue]) -> Result<Option<TableData>> {
            self.log.lock().push((stmt.to_string(), params.to_vec()));
            if stmt.starts_with("SELECT") {
                return Ok(self.rows.clone());
            }
            Ok(None)
        }

        fn commit(&mut self) -> Result<()> {
            Ok(())
        }

        fn last_row_id(&mut self) -> Result<i64> {
            Ok(42)
        }
    }

    fn shop() -> (Database, Log) {
        let log = Log::default();
        let rows = TableData::new(["id"], vec![vec![SqlValue::Int(1)]]).unwrap();
        let db = DatabaseBuilder::new()
            .name("shop")
            .charset("utf8mb4")
            .table(
                TableBuilder::new("users")
                    .column(int("id").primary_key())
                    .column(varchar("name", 32)),
            )
            .connection(Box::new(Recording {
                log: Arc::clone(&log),
                rows: Some(rows),
            }))
            .build()
            .unwrap();
        (db, log)
    }

    #[test]
    fn test_registry() {
        let (db, _) = shop();
        let users = db.table("users").unwrap();
        assert_eq!(users.database().unwrap(), db);
        assert!(matches!(
            db.table("missing").unwrap_err().as_object(),
            Some(ObjectError::NotFound { .. })
        ));

        let err = db
            .append_table(TableBuilder::new("users").column(int("id")))
            .unwrap_err();
        assert!(matches!(
            err.as_object(),
            Some(ObjectError::NameAlreadyExists { .. })
        ));

        db.remove_table(&ObjectName::new("users")).unwrap();
        assert!(!db.contains("users"));
        assert!(users.get_column("id").is_ok());
    }

    #[test]
    fn test_own_table() {
        let (db, _) = shop();
        let (other, _) = shop();
        let users = db.table("users").unwrap();
        assert_eq!(db.own_table(&users).unwrap(), users);

        let err = other.own_table(&users).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotSelf(_))));
    }

    #[test]
    fn test_connection_handshake() {
        let (db, _) = shop();
        assert!(db.is_connected());
        let conn = db.disconnect().unwrap();
        assert!(!db.is_connected());
        assert!(matches!(
            db.commit().unwrap_err().as_object(),
            Some(ObjectError::NotSet(_))
        ));
        db.connect(conn).unwrap();
        let again = db.disconnect().unwrap();
        db.connect(again).unwrap();
        let (_, log) = shop();
        let err = db
            .connect(Box::new(Recording { log, rows: None }))
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::AlreadySet(_))));
    }

    #[test]
    fn test_insert_goes_through_connection() {
        let (db, log) = shop();
        let users = db.table("users").unwrap();
        let id = users.insert([("name", "alice")]).unwrap();
        assert_eq!(id, 42);
        assert_eq!(
            log.lock().as_slice(),
            [(
                String::from("INSERT INTO `users` (`name`) VALUES (?)"),
                vec![SqlValue::from("alice")]
            )]
        );
    }

    #[test]
    fn test_view_result_is_cached() {
        let (db, log) = shop();
        let view = db.table("users").unwrap().select_column(["id"]).unwrap();
        assert_eq!(view.result().unwrap().len(), 1);
        assert!(view.is_result_ready());
        view.result().unwrap();
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_database_ddl() {
        let (db, _) = shop();
        assert_eq!(
            db.create_database_query(true).unwrap().stmt(),
            "CREATE DATABASE IF NOT EXISTS `shop` CHARACTER SET utf8mb4"
        );
        assert_eq!(db.drop_database_query(false).unwrap().stmt(), "DROP DATABASE `shop`");

        let unnamed = DatabaseBuilder::new().build().unwrap();
        assert!(unnamed.create_database_query(false).is_err());
    }

    #[test]
    fn test_create_tables() {
        let (db, log) = shop();
        db.create_tables(CreateOptions {
            drop_if_exists: true,
            ..CreateOptions::default()
        })
        .unwrap();
        let stmts: Vec<String> = log.lock().iter().map(|(s, _)| s.clone()).collect();
        assert_eq!(
            stmts,
            [
                "DROP TABLE IF EXISTS `users`",
                "CREATE TABLE `users` (`id` INT NOT NULL PRIMARY KEY, `name` VARCHAR(32))",
            ]
        );
        assert!(db.contains("users"));
    }

    #[test]
    fn test_fetch_requires_connection() {
        let err = DatabaseBuilder::new()
            .fetch_from_connection(true)
            .build()
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotSet(_))));

        let err = DatabaseBuilder::new()
            .table(TableBuilder::new("t").column(int("id")))
            .connection(Box::new(Recording {
                log: Log::default(),
                rows: None,
            }))
            .fetch_from_connection(true)
            .build()
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));

        let err = DatabaseBuilder::new()
            .connection(Box::new(Recording {
                log: Log::default(),
                rows: None,
            }))
            .fetch_from_connection(true)
            .build()
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotSpecified(_))));
    }
}
