//! Tabular results.

use crate::error::{ObjectError, Result};
use crate::query::ArgValues;
use crate::value::SqlValue;

/// Rows returned by a query, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl TableData {
    /// Creates table data, checking that every row has one value per column.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] for a row of the wrong width.
    pub fn new<C, S>(columns: C, rows: Vec<Vec<SqlValue>>) -> Result<Self>
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ObjectError::ArgValue(format!(
                "row {i} has {} values for {} columns",
                row.len(),
                columns.len()
            ))
            .into());
        }
        Ok(Self { columns, rows })
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the raw rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    /// Returns the position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Returns every value of one column.
    #[must_use]
    pub fn column_values(&self, name: &str) -> Option<Vec<&SqlValue>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Returns one set of keyword argument values per row, keyed by column name.
    #[must_use]
    pub fn arg_values(&self) -> Vec<ArgValues> {
        self.iter().map(|row| row.arg_values()).collect()
    }
}

/// A borrowed row of [`TableData`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> Row<'a> {
    /// Returns the value of a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a SqlValue> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.values.get(index)
    }

    /// Returns the values in column order.
    #[must_use]
    pub const fn values(&self) -> &'a [SqlValue] {
        self.values
    }

    /// Returns the row as keyword argument values.
    #[must_use]
    pub fn arg_values(&self) -> ArgValues {
        self.columns
            .iter()
            .zip(self.values)
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect()
    }
}
