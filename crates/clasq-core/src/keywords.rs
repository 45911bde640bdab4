//! SQL keyword enums.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, ObjectError, Result};
use crate::query::{QueryData, QueryLike};

/// Sort direction of an ORDER BY item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderType {
    /// Ascending order (ASC).
    #[default]
    Asc,
    /// Descending order (DESC).
    Desc,
}

impl OrderType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// `true` maps to ASC and `false` to DESC.
    #[must_use]
    pub const fn from_bool(ascending: bool) -> Self {
        if ascending {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl From<bool> for OrderType {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl FromStr for OrderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(ObjectError::ArgValue(format!("Invalid order type: {s}")).into()),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl QueryLike for OrderType {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_keyword(self.as_sql()).map(|_| ())
    }
}

/// Kind of a JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// FULL OUTER JOIN.
    ///
    /// Parsed from `OUTER` and rendered as `FULL OUTER`; standard SQL has no
    /// bare `OUTER JOIN`.
    Outer,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the keyword placed before `JOIN`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Outer => "FULL OUTER",
            Self::Cross => "CROSS",
        }
    }
}

impl FromStr for JoinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INNER" => Ok(Self::Inner),
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            "OUTER" | "FULL" | "FULL OUTER" => Ok(Self::Outer),
            "CROSS" => Ok(Self::Cross),
            _ => Err(ObjectError::ArgValue(format!("Invalid join type: {s}")).into()),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl QueryLike for JoinType {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_keyword(self.as_sql()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_type_parse() {
        assert_eq!("desc".parse::<OrderType>().unwrap(), OrderType::Desc);
        assert_eq!(OrderType::from(true), OrderType::Asc);
        assert_eq!(OrderType::from(false), OrderType::Desc);
        assert!("sideways".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_join_type_parse() {
        assert_eq!("left".parse::<JoinType>().unwrap(), JoinType::Left);
        assert_eq!("OUTER".parse::<JoinType>().unwrap().as_sql(), "FULL OUTER");
        assert!("NATURAL".parse::<JoinType>().is_err());
    }
}
