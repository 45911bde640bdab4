//! Argument types accepted by view transformations.

use crate::expr::{Expr, ExprSet};
use crate::keywords::OrderType;
use crate::name::ObjectName;

/// A column referenced by name or by expression.
#[derive(Debug, Clone)]
pub enum ColumnLike {
    /// Looked up with [`View::get_column`](super::View::get_column).
    Name(ObjectName),
    /// Checked for membership with [`View::to_column`](super::View::to_column).
    Expr(Expr),
}

impl From<&str> for ColumnLike {
    fn from(value: &str) -> Self {
        Self::Name(value.into())
    }
}

impl From<String> for ColumnLike {
    fn from(value: String) -> Self {
        Self::Name(value.into())
    }
}

impl From<ObjectName> for ColumnLike {
    fn from(value: ObjectName) -> Self {
        Self::Name(value)
    }
}

impl From<&ObjectName> for ColumnLike {
    fn from(value: &ObjectName) -> Self {
        Self::Name(value.clone())
    }
}

impl From<Expr> for ColumnLike {
    fn from(value: Expr) -> Self {
        Self::Expr(value)
    }
}

impl From<&Expr> for ColumnLike {
    fn from(value: &Expr) -> Self {
        Self::Expr(value.clone())
    }
}

/// An item of a SELECT list.
#[derive(Debug, Clone)]
pub enum Selection {
    /// A column of the source view, by name.
    Name(ObjectName),
    /// A named expression, used as is.
    Expr(Expr),
    /// A column of the source view under a new output name.
    Renamed {
        /// The column to select.
        column: ColumnLike,
        /// Its output name.
        alias: ObjectName,
    },
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Self::Name(value.into())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Self::Name(value.into())
    }
}

impl From<Expr> for Selection {
    fn from(value: Expr) -> Self {
        Self::Expr(value)
    }
}

impl From<&Expr> for Selection {
    fn from(value: &Expr) -> Self {
        Self::Expr(value.clone())
    }
}

/// `(column name, alias)`
impl From<(&str, &str)> for Selection {
    fn from((column, alias): (&str, &str)) -> Self {
        Self::Renamed {
            column: column.into(),
            alias: alias.into(),
        }
    }
}

/// `(expression, alias)`
impl From<(Expr, &str)> for Selection {
    fn from((expr, alias): (Expr, &str)) -> Self {
        Self::Expr(expr.aliased(alias))
    }
}

impl From<(&Expr, &str)> for Selection {
    fn from((expr, alias): (&Expr, &str)) -> Self {
        Self::Expr(expr.aliased(alias))
    }
}

pub(crate) enum SelectArg {
    Keep(ExprSet),
    Add(Selection),
}

/// An item of an ORDER BY list.
#[derive(Debug, Clone)]
pub enum OrderSpec {
    /// A column name, descending when prefixed with `-`, ascending otherwise.
    Name(ObjectName),
    /// An expression; ordered expressions keep their direction.
    Expr(Expr),
    /// A column with an explicit direction.
    Typed(ColumnLike, OrderType),
}

impl From<&str> for OrderSpec {
    fn from(value: &str) -> Self {
        Self::Name(value.into())
    }
}

impl From<String> for OrderSpec {
    fn from(value: String) -> Self {
        Self::Name(value.into())
    }
}

impl From<Expr> for OrderSpec {
    fn from(value: Expr) -> Self {
        Self::Expr(value)
    }
}

impl From<&Expr> for OrderSpec {
    fn from(value: &Expr) -> Self {
        Self::Expr(value.clone())
    }
}

impl From<(&str, OrderType)> for OrderSpec {
    fn from((name, order): (&str, OrderType)) -> Self {
        Self::Typed(name.into(), order)
    }
}

impl From<(Expr, OrderType)> for OrderSpec {
    fn from((expr, order): (Expr, OrderType)) -> Self {
        Self::Typed(expr.into(), order)
    }
}

impl From<(&Expr, OrderType)> for OrderSpec {
    fn from((expr, order): (&Expr, OrderType)) -> Self {
        Self::Typed(expr.into(), order)
    }
}

/// `(name, ascending)`
impl From<(&str, bool)> for OrderSpec {
    fn from((name, asc): (&str, bool)) -> Self {
        Self::Typed(name.into(), OrderType::from_bool(asc))
    }
}
