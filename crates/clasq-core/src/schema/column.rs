//! Columns of views and tables.
//!
//! A [`Column`] is a named leaf bound to the view that owns it. Table columns
//! also carry a [`ColumnDef`] with the attributes used by `CREATE TABLE`.

use core::fmt;
use std::sync::{Arc, Weak};

use crate::error::{ObjectError, Result};
use crate::name::ObjectName;
use crate::query::{QueryData, QueryLike};
use crate::value::{SqlValue, ToSqlValue};
use crate::view::{View, ViewInner};

use super::sqltypes::SqlType;
use super::table::Table;

/// Table attributes of a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnDef {
    /// Rendered as `NOT NULL`.
    pub not_null: bool,
    /// Rendered as `DEFAULT ?` with the value bound.
    pub default: Option<SqlValue>,
    /// Rendered as `UNIQUE` unless the column is a primary key.
    pub unique: bool,
    /// Rendered as `PRIMARY KEY`.
    pub primary_key: bool,
    /// Rendered as `AUTO_INCREMENT`.
    pub auto_increment: bool,
}

/// A column of a view.
#[derive(Clone)]
pub struct Column {
    name: ObjectName,
    view_name: ObjectName,
    view: Weak<ViewInner>,
    sql_type: SqlType,
    def: Option<Arc<ColumnDef>>,
}

impl Column {
    pub(crate) fn new(
        name: ObjectName,
        view_name: ObjectName,
        view: Weak<ViewInner>,
        sql_type: SqlType,
        def: Option<Arc<ColumnDef>>,
    ) -> Self {
        Self {
            name,
            view_name,
            view,
            sql_type,
            def,
        }
    }

    /// Returns the column name.
    #[must_use]
    pub const fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Returns the name of the owning view.
    #[must_use]
    pub const fn view_name(&self) -> &ObjectName {
        &self.view_name
    }

    /// Returns `<view>.<column>`.
    #[must_use]
    pub fn qualified_name(&self) -> ObjectName {
        &self.view_name + &self.name
    }

    /// Returns the column type.
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// Returns the table attributes, if this is a table column.
    #[must_use]
    pub fn def(&self) -> Option<&ColumnDef> {
        self.def.as_deref()
    }

    /// Returns `true` if both columns are the same column of the same view.
    #[must_use]
    pub fn same_column(&self, other: &Self) -> bool {
        self.name == other.name && Weak::ptr_eq(&self.view, &other.view)
    }

    /// Returns the owning view.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`] when the view no longer exists.
    pub fn view(&self) -> Result<View> {
        self.view
            .upgrade()
            .map(View::from_inner)
            .ok_or_else(|| ObjectError::NotSet(String::from("View is not set.")).into())
    }

    /// Returns the owning table.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`] when the owning view is not a table.
    pub fn table(&self) -> Result<Table> {
        Table::try_from(self.view()?)
            .map_err(|_| ObjectError::NotSet(String::from("Table is not set.")).into())
    }

    pub(crate) fn is_owned_by(&self, view: &View) -> bool {
        view.is_inner(&self.view)
    }

    /// Appends the `CREATE TABLE` fragment of this column:
    /// `name TYPE [NOT NULL] [DEFAULT ?] [UNIQUE] [PRIMARY KEY] [AUTO_INCREMENT]`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn append_definition(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_object_name(&self.name)?;
        qd.append_keyword(&self.sql_type.to_sql())?;
        let Some(def) = self.def() else {
            return Ok(());
        };
        if def.not_null {
            qd.append_keyword("NOT NULL")?;
        }
        if let Some(default) = &def.default {
            qd.append_keyword("DEFAULT")?;
            qd.append_value(default.clone());
        }
        if def.primary_key {
            qd.append_keyword("PRIMARY KEY")?;
        } else if def.unique {
            qd.append_keyword("UNIQUE")?;
        }
        if def.auto_increment {
            qd.append_keyword("AUTO_INCREMENT")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column({} {})", self.qualified_name(), self.sql_type)
    }
}

impl QueryLike for Column {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_object_name(&self.view_name)?;
        qd.append_keyword(".")?;
        qd.append_object_name(&self.name)?;
        Ok(())
    }
}

/// Builder for table columns.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: ObjectName,
    sql_type: SqlType,
    def: ColumnDef,
}

impl ColumnBuilder {
    /// Creates a nullable column of the given type.
    pub fn new(name: impl Into<ObjectName>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            def: ColumnDef::default(),
        }
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.def.not_null = true;
        self
    }

    /// Marks the column as nullable (default).
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.def.not_null = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl ToSqlValue) -> Self {
        self.def.default = Some(value.to_sql_value());
        self
    }

    /// Marks the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.def.unique = true;
        self
    }

    /// Marks the column as PRIMARY KEY.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.def.primary_key = true;
        self.def.not_null = true; // Primary keys are implicitly NOT NULL
        self
    }

    /// Marks the column as AUTO_INCREMENT.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.def.auto_increment = true;
        self
    }

    /// Returns the column name.
    #[must_use]
    pub const fn name(&self) -> &ObjectName {
        &self.name
    }

    /// Returns the column type.
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// Returns the attributes collected so far.
    #[must_use]
    pub const fn definition(&self) -> &ColumnDef {
        &self.def
    }

    pub(crate) fn build(&self, view_name: &ObjectName, view: Weak<ViewInner>) -> Column {
        Column::new(
            self.name.clone(),
            view_name.clone(),
            view,
            self.sql_type,
            Some(Arc::new(self.def.clone())),
        )
    }
}

// =============================================================================
// Shorthands
// =============================================================================

/// `INT` column.
pub fn int(name: impl Into<ObjectName>) -> ColumnBuilder {
    ColumnBuilder::new(name, SqlType::INT)
}

/// `BIGINT` column.
pub fn bigint(name: impl Into<ObjectName>) -> ColumnBuilder {
    ColumnBuilder::new(name, SqlType::BIGINT)
}

/// `VARCHAR(len)` column.
pub fn varchar(name: impl Into<ObjectName>, len: u32) -> ColumnBuilder {
    ColumnBuilder::new(name, SqlType::VarChar(len))
}

/// `TEXT` column.
pub fn text(name: impl Into<ObjectName>) -> ColumnBuilder {
    ColumnBuilder::new(name, SqlType::Text(None))
}

/// `DATETIME` column.
pub fn datetime(name: impl Into<ObjectName>) -> ColumnBuilder {
    ColumnBuilder::new(name, SqlType::DateTime)
}
