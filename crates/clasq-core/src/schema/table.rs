//! Physical tables.
//!
//! A [`Table`] is a [`View`] over a database table. It dereferences to
//! [`View`], so every view transformation starts directly from a table, and it
//! adds the statements that write to the table or change its definition.

use core::ops::Deref;
use std::sync::Weak;

use tracing::info;

use crate::error::{Error, ObjectError, Result};
use crate::expr::{and_all, Expr, ExprKind, IntoExpr};
use crate::name::ObjectName;
use crate::query::{Arg, QueryData};
use crate::table_data::TableData;
use crate::view::{ColumnLike, View};

use super::column::{Column, ColumnBuilder};
use super::database::DatabaseInner;

pub(crate) struct TableInfo {
    pub(crate) name: ObjectName,
    pub(crate) database: Weak<DatabaseInner>,
    pub(crate) primary_key: Vec<ObjectName>,
    pub(crate) unique: Vec<ObjectName>,
    pub(crate) temporary: bool,
}

#[cfg(test)]
impl TableInfo {
    /// A table bound to no database.
    pub(crate) fn detached(name: &str) -> Self {
        Self {
            name: name.into(),
            database: Weak::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
            temporary: false,
        }
    }
}

// =============================================================================
// TableBuilder
// =============================================================================

/// Definition of a table, registered with
/// [`Database::append_table`](super::Database::append_table).
///
/// # Example
///
/// ```rust
/// use clasq_core::schema::{TableBuilder, column::{int, varchar}};
///
/// let users = TableBuilder::new("users")
///     .column(int("id").primary_key())
///     .column(varchar("name", 64).not_null().unique());
///
/// assert_eq!(users.name(), "users");
/// assert_eq!(users.columns().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: ObjectName,
    columns: Vec<ColumnBuilder>,
    primary_key: Vec<ObjectName>,
    unique: Vec<ObjectName>,
    temporary: bool,
}

impl TableBuilder {
    /// Creates a table definition without columns.
    pub fn new(name: impl Into<ObjectName>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
            temporary: false,
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnBuilder) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets a table-level PRIMARY KEY over several columns.
    #[must_use]
    pub fn primary_key<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ObjectName>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a table-level UNIQUE constraint over several columns.
    #[must_use]
    pub fn unique<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ObjectName>,
    {
        self.unique = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the table as TEMPORARY.
    #[must_use]
    pub const fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// Returns the table name.
    #[must_use]
    pub const fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Returns the columns.
    #[must_use]
    pub fn columns(&self) -> &[ColumnBuilder] {
        &self.columns
    }

    /// Returns the table-level primary key columns.
    #[must_use]
    pub fn primary_key_names(&self) -> &[ObjectName] {
        &self.primary_key
    }

    /// Returns the table-level unique columns.
    #[must_use]
    pub fn unique_names(&self) -> &[ObjectName] {
        &self.unique
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ObjectError::NotSpecified(String::from("Table name is empty.")).into());
        }
        if self.columns.is_empty() {
            return Err(ObjectError::ArgValue(String::from("Columns cannot be empty.")).into());
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(
                    ObjectError::name_exists("Column name already exists.", column.name()).into(),
                );
            }
        }
        for key in self.primary_key.iter().chain(&self.unique) {
            if !self.columns.iter().any(|c| c.name() == key) {
                return Err(ObjectError::not_found("Column not found.", key).into());
            }
        }
        Ok(())
    }

    pub(crate) fn build(self, database: Weak<DatabaseInner>) -> Result<Table> {
        self.validate()?;
        let info = TableInfo {
            name: self.name,
            database,
            primary_key: self.primary_key,
            unique: self.unique,
            temporary: self.temporary,
        };
        Ok(Table(View::new_table(info, &self.columns)))
    }
}

// =============================================================================
// Statement options
// =============================================================================

/// WHERE, ORDER BY and LIMIT parts of UPDATE and DELETE.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Row filter.
    pub where_expr: Option<Expr>,
    /// ORDER BY items; unordered items sort ascending.
    pub orders: Vec<Expr>,
    /// LIMIT.
    pub limit: Option<Expr>,
}

/// Options of DELETE.
pub type DeleteOptions = UpdateOptions;

impl UpdateOptions {
    /// Empty options: every row is affected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ANDs a condition into the filter.
    #[must_use]
    pub fn where_clause(mut self, cond: impl IntoExpr) -> Self {
        self.where_expr = Some(and_all(self.where_expr.take().into_iter().chain([cond.into_expr()])));
        self
    }

    /// Appends an ORDER BY item.
    #[must_use]
    pub fn order_by(mut self, order: impl IntoExpr) -> Self {
        self.orders.push(order.into_expr());
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: impl IntoExpr) -> Self {
        self.limit = Some(limit.into_expr());
        self
    }

    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        if let Some(cond) = self.where_expr.as_ref().filter(|e| !e.is_none()) {
            qd.append_keyword("WHERE")?;
            qd.append(cond)?;
        }
        if !self.orders.is_empty() {
            qd.append_keyword("ORDER BY")?;
            for (i, order) in self.orders.iter().enumerate() {
                if i > 0 {
                    qd.append_keyword(",")?;
                }
                order.append_ordered(qd)?;
            }
        }
        if let Some(limit) = &self.limit {
            qd.append_keyword("LIMIT")?;
            qd.append(limit)?;
        }
        Ok(())
    }
}

/// Options of DROP TABLE.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropOptions {
    /// Renders `DROP TEMPORARY TABLE`.
    pub temporary: bool,
    /// Renders `IF EXISTS`.
    pub if_exists: bool,
}

/// Options of CREATE TABLE.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
    /// Renders `CREATE TEMPORARY TABLE` even for a non-temporary definition.
    pub temporary: bool,
    /// Renders `IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Runs `DROP TABLE IF EXISTS` first.
    pub drop_if_exists: bool,
}

// =============================================================================
// Table
// =============================================================================

/// A view over a physical table.
#[derive(Clone, PartialEq, Eq)]
pub struct Table(View);

impl Deref for Table {
    type Target = View;

    fn deref(&self) -> &View {
        &self.0
    }
}

impl core::fmt::Debug for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.0, f)
    }
}

impl TryFrom<View> for Table {
    type Error = Error;

    fn try_from(view: View) -> Result<Self> {
        if view.is_table() {
            Ok(Self(view))
        } else {
            Err(ObjectError::ArgType(format!("View is not a table: {view:?}")).into())
        }
    }
}

impl From<Table> for View {
    fn from(table: Table) -> Self {
        table.0
    }
}

impl Table {
    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &ObjectName {
        self.0.base_name()
    }

    /// Returns the view this table is.
    #[must_use]
    pub const fn as_view(&self) -> &View {
        &self.0
    }

    /// Returns `true` for a TEMPORARY table.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.table_info().is_some_and(|info| info.temporary)
    }

    /// Returns the columns in definition order.
    #[must_use]
    pub fn table_columns(&self) -> Vec<Column> {
        self.base_columns()
            .iter()
            .filter_map(|e| e.as_column().cloned())
            .collect()
    }

    /// Resolves a column of this table.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] for an unknown name or a column of
    /// another view, and [`ObjectError::ArgType`] for a non-column
    /// expression.
    pub fn get_table_column(&self, column: impl Into<ColumnLike>) -> Result<Expr> {
        match column.into() {
            ColumnLike::Name(name) => {
                let qualified = self.name() + &name;
                self.base_columns()
                    .get(&qualified)
                    .cloned()
                    .ok_or_else(|| ObjectError::not_found("Column not found.", &name).into())
            }
            ColumnLike::Expr(expr) => match expr.as_column() {
                Some(column) if column.is_owned_by(&self.0) => Ok(expr.unordered().clone()),
                Some(column) => Err(ObjectError::not_found(
                    "Column of the different table.",
                    column.qualified_name(),
                )
                .into()),
                None => Err(ObjectError::ArgType(format!("Not a table column: {expr:?}")).into()),
            },
        }
    }

    fn key_columns(
        &self,
        table_level: impl Fn(&TableInfo) -> &[ObjectName],
        column_level: impl Fn(&Column) -> bool,
    ) -> Vec<Expr> {
        let names = self.0.table_info().map_or(&[][..], table_level);
        self.base_columns()
            .iter()
            .filter(|e| {
                e.as_column()
                    .is_some_and(|c| names.contains(c.name()) || column_level(c))
            })
            .cloned()
            .collect()
    }

    /// Returns the primary key columns, from column and table definitions.
    #[must_use]
    pub fn primary_keys(&self) -> Vec<Expr> {
        self.key_columns(
            |info| info.primary_key.as_slice(),
            |c| c.def().is_some_and(|d| d.primary_key),
        )
    }

    /// Returns the unique columns, from column and table definitions.
    #[must_use]
    pub fn unique_columns(&self) -> Vec<Expr> {
        self.key_columns(|info| info.unique.as_slice(), |c| c.def().is_some_and(|d| d.unique))
    }

    // ---- writes ----

    /// Builds `INSERT INTO t (a, b) VALUES (?, ?)`.
    ///
    /// Literal values are checked against their column type.
    ///
    /// # Errors
    ///
    /// Fails for unknown columns, values out of range for their column and
    /// an empty value list.
    pub fn insert_query<I, K, V>(&self, values: I) -> Result<QueryData>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ColumnLike>,
        V: IntoExpr,
    {
        let mut names = Vec::new();
        let mut exprs = Vec::new();
        for (column, value) in values {
            let column = self.get_table_column(column)?;
            let value = value.into_expr();
            if let (Some(column), ExprKind::Value(v)) = (column.as_column(), value.kind()) {
                column.sql_type().check_value(v)?;
            }
            names.extend(column.name().cloned());
            exprs.push(value);
        }
        if names.is_empty() {
            return Err(ObjectError::ArgValue(String::from("Values cannot be empty.")).into());
        }

        let mut qd = QueryData::new();
        qd.append_keyword("INSERT INTO")?;
        qd.append_object_name(self.name())?;
        qd.append_keyword("(")?;
        qd.append_joined(&names, ",")?;
        qd.append_keyword(")")?;
        qd.append_keyword("VALUES")?;
        qd.append_keyword("(")?;
        qd.append_joined(&exprs, ",")?;
        qd.append_keyword(")")?;
        Ok(qd)
    }

    /// Inserts one row and returns its id.
    ///
    /// # Errors
    ///
    /// Fails like [`Table::insert_query`], without a database or connection,
    /// and on driver errors.
    pub fn insert<I, K, V>(&self, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ColumnLike>,
        V: IntoExpr,
    {
        let qd = self.insert_query(values)?;
        self.database()?.with_connection(|conn| {
            conn.execute(&qd)?;
            conn.last_row_id()
        })
    }

    /// Inserts every row of `data`, one statement per row.
    ///
    /// # Errors
    ///
    /// Fails for columns of `data` that are not columns of this table, and
    /// on execution errors.
    pub fn insert_data(&self, data: &TableData) -> Result<()> {
        let args = data
            .columns()
            .iter()
            .map(|name| (name.as_str(), Arg::new(name.as_str())));
        let qd = self.insert_query(args)?;
        self.database()?.execute_many(&qd, &data.arg_values())
    }

    /// Builds `UPDATE t SET a = ?, ... [WHERE] [ORDER BY] [LIMIT]`.
    ///
    /// # Errors
    ///
    /// Fails for unknown columns and an empty value list.
    pub fn update_query<I, K, V>(&self, values: I, options: &UpdateOptions) -> Result<QueryData>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ColumnLike>,
        V: IntoExpr,
    {
        let mut qd = QueryData::new();
        qd.append_keyword("UPDATE")?;
        qd.append_object_name(self.name())?;
        qd.append_keyword("SET")?;
        let mut count = 0;
        for (column, value) in values {
            let column = self.get_table_column(column)?;
            let value = value.into_expr();
            if let (Some(column), ExprKind::Value(v)) = (column.as_column(), value.kind()) {
                column.sql_type().check_value(v)?;
            }
            if count > 0 {
                qd.append_keyword(",")?;
            }
            if let Some(name) = column.name() {
                qd.append_object_name(name)?;
            }
            qd.append_keyword("=")?;
            qd.append(&value)?;
            count += 1;
        }
        if count == 0 {
            return Err(ObjectError::ArgValue(String::from("Values cannot be empty.")).into());
        }
        options.append_to(&mut qd)?;
        Ok(qd)
    }

    /// Updates the rows selected by `options`.
    ///
    /// # Errors
    ///
    /// Fails like [`Table::update_query`] and on execution errors.
    pub fn update<I, K, V>(&self, values: I, options: &UpdateOptions) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ColumnLike>,
        V: IntoExpr,
    {
        let qd = self.update_query(values, options)?;
        self.database()?.execute(&qd)
    }

    /// Updates one row per row of `data`, matching rows on the `keys`
    /// columns and setting every other column.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] for a key that is not a column of
    /// `data` or when no column is left to set.
    pub fn update_data<I>(&self, data: &TableData, keys: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        if let Some(missing) = keys.iter().find(|k| data.column_index(k).is_none()) {
            return Err(ObjectError::ArgValue(format!(
                "Key column `{missing}` is not in the data."
            ))
            .into());
        }
        let mut cond = Vec::with_capacity(keys.len());
        for key in &keys {
            cond.push(self.get_table_column(key.as_str())?.eq(Arg::new(key.as_str())));
        }
        let values = data
            .columns()
            .iter()
            .filter(|c| !keys.contains(c))
            .map(|name| (name.as_str(), Arg::new(name.as_str())));
        let options = UpdateOptions::new().where_clause(and_all(cond));
        let qd = self.update_query(values, &options)?;
        self.database()?.execute_many(&qd, &data.arg_values())
    }

    /// Builds `DELETE FROM t [WHERE] [ORDER BY] [LIMIT]`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn delete_query(&self, options: &DeleteOptions) -> Result<QueryData> {
        let mut qd = QueryData::new();
        qd.append_keyword("DELETE FROM")?;
        qd.append_object_name(self.name())?;
        options.append_to(&mut qd)?;
        Ok(qd)
    }

    /// Deletes the rows selected by `options`.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn delete(&self, options: &DeleteOptions) -> Result<()> {
        let qd = self.delete_query(options)?;
        self.database()?.execute(&qd)
    }

    /// Deletes one row per row of `data`, matching every column.
    ///
    /// # Errors
    ///
    /// Fails for columns that are not columns of this table and on execution
    /// errors.
    pub fn delete_data(&self, data: &TableData) -> Result<()> {
        let mut cond = Vec::with_capacity(data.columns().len());
        for name in data.columns() {
            cond.push(self.get_table_column(name.as_str())?.eq(Arg::new(name.as_str())));
        }
        let qd = self.delete_query(&DeleteOptions::new().where_clause(and_all(cond)))?;
        self.database()?.execute_many(&qd, &data.arg_values())
    }

    /// Builds `TRUNCATE TABLE t`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn truncate_query(&self) -> Result<QueryData> {
        let mut qd = QueryData::new();
        qd.append_keyword("TRUNCATE TABLE")?;
        qd.append_object_name(self.name())?;
        Ok(qd)
    }

    /// Removes every row.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn truncate(&self) -> Result<()> {
        let qd = self.truncate_query()?;
        self.database()?.execute(&qd)
    }

    // ---- definition ----

    /// Builds `DROP [TEMPORARY] TABLE [IF EXISTS] t`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn drop_query(&self, options: DropOptions) -> Result<QueryData> {
        let mut qd = QueryData::new();
        qd.append_keyword("DROP")?;
        if options.temporary {
            qd.append_keyword("TEMPORARY")?;
        }
        qd.append_keyword("TABLE")?;
        if options.if_exists {
            qd.append_keyword("IF EXISTS")?;
        }
        qd.append_object_name(self.name())?;
        Ok(qd)
    }

    /// Drops the table and removes it from its database.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn drop(&self, options: DropOptions) -> Result<()> {
        let db = self.database()?;
        db.execute(&self.drop_query(options)?)?;
        db.remove_table(self.name())?;
        Ok(())
    }

    /// Builds `CREATE [TEMPORARY] TABLE [IF NOT EXISTS] t (...)`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn create_table_query(&self, options: CreateOptions) -> Result<QueryData> {
        let mut qd = QueryData::new();
        qd.append_keyword("CREATE")?;
        if options.temporary || self.is_temporary() {
            qd.append_keyword("TEMPORARY")?;
        }
        qd.append_keyword("TABLE")?;
        if options.if_not_exists {
            qd.append_keyword("IF NOT EXISTS")?;
        }
        qd.append_object_name(self.name())?;
        qd.append_keyword("(")?;
        for (i, column) in self.table_columns().iter().enumerate() {
            if i > 0 {
                qd.append_keyword(",")?;
            }
            column.append_definition(&mut qd)?;
        }
        if let Some(info) = self.0.table_info() {
            for (keyword, names) in [("PRIMARY KEY", &info.primary_key), ("UNIQUE", &info.unique)] {
                if names.is_empty() {
                    continue;
                }
                qd.append_keyword(",")?;
                qd.append_keyword(keyword)?;
                qd.append_keyword("(")?;
                qd.append_joined(names, ",")?;
                qd.append_keyword(")")?;
            }
        }
        qd.append_keyword(")")?;
        Ok(qd)
    }

    /// Creates the table, dropping an existing one first when
    /// `drop_if_exists` is set. The table stays registered either way.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn create(&self, options: CreateOptions) -> Result<()> {
        let db = self.database()?;
        if options.drop_if_exists {
            db.execute(&self.drop_query(DropOptions {
                temporary: options.temporary || self.is_temporary(),
                if_exists: true,
            })?)?;
        }
        db.execute(&self.create_table_query(options)?)?;
        info!(table = %self.name(), "table created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::{bigint, int, varchar};
    use crate::value::SqlValue;

    fn users() -> Table {
        TableBuilder::new("users")
            .column(int("id").primary_key().auto_increment())
            .column(varchar("name", 64).not_null().unique())
            .column(bigint("score").default(0))
            .build(Weak::new())
            .unwrap()
    }

    #[test]
    fn test_builder_validation() {
        let err = TableBuilder::new("t").build(Weak::new()).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));

        let err = TableBuilder::new("t")
            .column(int("a"))
            .column(int("a"))
            .build(Weak::new())
            .unwrap_err();
        assert!(matches!(
            err.as_object(),
            Some(ObjectError::NameAlreadyExists { .. })
        ));

        let err = TableBuilder::new("t")
            .column(int("a"))
            .primary_key(["b"])
            .build(Weak::new())
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotFound { .. })));
    }

    #[test]
    fn test_create_table_query() {
        let qd = users().create_table_query(CreateOptions::default()).unwrap();
        assert_eq!(
            qd.stmt(),
            "CREATE TABLE `users` (`id` INT NOT NULL PRIMARY KEY AUTO_INCREMENT, \
             `name` VARCHAR(64) NOT NULL UNIQUE, `score` BIGINT DEFAULT ?)"
        );
        assert_eq!(qd.params().unwrap(), vec![SqlValue::Int(0)]);

        let pairs = TableBuilder::new("pairs")
            .column(int("a"))
            .column(int("b"))
            .primary_key(["a", "b"])
            .temporary(true)
            .build(Weak::new())
            .unwrap();
        let qd = pairs
            .create_table_query(CreateOptions {
                if_not_exists: true,
                ..CreateOptions::default()
            })
            .unwrap();
        assert_eq!(
            qd.stmt(),
            "CREATE TEMPORARY TABLE IF NOT EXISTS `pairs` (`a` INT, `b` INT, PRIMARY KEY (`a`, `b`))"
        );
    }

    #[test]
    fn test_insert_query() {
        let users = users();
        let qd = users
            .insert_query([("name", SqlValue::from("alice")), ("score", SqlValue::Int(5))])
            .unwrap();
        assert_eq!(qd.stmt(), "INSERT INTO `users` (`name`, `score`) VALUES (?, ?)");
        assert_eq!(
            qd.params().unwrap(),
            vec![SqlValue::from("alice"), SqlValue::Int(5)]
        );

        let err = users.insert_query([("missing", 1)]).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotFound { .. })));

        let err = users.insert_query([("id", i64::MAX)]).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));
    }

    #[test]
    fn test_update_and_delete_queries() {
        let users = users();
        let id = users.get_column("id").unwrap();
        let options = UpdateOptions::new()
            .where_clause(id.gt(10))
            .order_by(id.desc())
            .limit(2);
        let qd = users.update_query([("score", 1)], &options).unwrap();
        assert_eq!(
            qd.stmt(),
            "UPDATE `users` SET `score` = ? WHERE (`users`.`id` > ?) \
             ORDER BY `users`.`id` DESC LIMIT ?"
        );
        assert_eq!(
            qd.params().unwrap(),
            vec![SqlValue::Int(1), SqlValue::Int(10), SqlValue::Int(2)]
        );

        let qd = users.delete_query(&DeleteOptions::new()).unwrap();
        assert_eq!(qd.stmt(), "DELETE FROM `users`");
        assert_eq!(users.truncate_query().unwrap().stmt(), "TRUNCATE TABLE `users`");
    }

    #[test]
    fn test_drop_query() {
        let qd = users()
            .drop_query(DropOptions {
                temporary: true,
                if_exists: true,
            })
            .unwrap();
        assert_eq!(qd.stmt(), "DROP TEMPORARY TABLE IF EXISTS `users`");
    }

    #[test]
    fn test_keys() {
        let users = users();
        let pk: Vec<_> = users.primary_keys().iter().filter_map(|e| e.name().cloned()).collect();
        assert_eq!(pk, [ObjectName::new("id")]);
        let unique: Vec<_> = users
            .unique_columns()
            .iter()
            .filter_map(|e| e.name().cloned())
            .collect();
        assert_eq!(unique, [ObjectName::new("name")]);
    }

    #[test]
    fn test_get_table_column() {
        let users = users();
        let other = users.clone().where_eq("id", 1).unwrap();
        assert!(users.get_table_column(other.get_column("id").unwrap()).is_ok());

        let orders = TableBuilder::new("orders")
            .column(int("id"))
            .build(Weak::new())
            .unwrap();
        let err = users
            .get_table_column(orders.get_column("id").unwrap())
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotFound { .. })));

        let err = users
            .get_table_column(&users.get_column("id").unwrap() + 1)
            .unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgType(_))));
    }

    #[test]
    fn test_view_conversion() {
        let users = users();
        let view: View = users.clone().into();
        assert_eq!(Table::try_from(view).unwrap(), users);
        let filtered = users.where_eq("id", 1).unwrap();
        assert!(Table::try_from(filtered).is_err());
    }
}
