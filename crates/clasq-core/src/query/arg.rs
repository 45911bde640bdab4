//! Deferred query arguments.
//!
//! An [`Arg`] is a placeholder whose value is supplied when a compiled
//! statement is called. Positional arguments are identified by index and
//! named arguments by name; either kind may carry a default value.

use core::fmt;

use crate::value::{SqlValue, ToSqlValue};

/// Identifier of a query argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgName {
    /// Positional argument.
    Index(usize),
    /// Keyword argument.
    Name(String),
}

impl fmt::Display for ArgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ArgName {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for ArgName {
    fn from(value: &str) -> Self {
        Self::Name(String::from(value))
    }
}

impl From<String> for ArgName {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

/// A query argument placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    name: ArgName,
    default: Option<SqlValue>,
}

impl Arg {
    /// Creates an argument without a default value.
    pub fn new(name: impl Into<ArgName>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Creates an argument with a default value.
    pub fn with_default(name: impl Into<ArgName>, default: impl ToSqlValue) -> Self {
        Self {
            name: name.into(),
            default: Some(default.to_sql_value()),
        }
    }

    /// Returns the argument name.
    #[must_use]
    pub const fn name(&self) -> &ArgName {
        &self.name
    }

    /// Returns the default value, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&SqlValue> {
        self.default.as_ref()
    }

    /// Returns `true` if the argument has a default value.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Two arguments are interchangeable when both name and default agree.
    #[must_use]
    pub fn is_same_arg(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "Arg({}, default={default})", self.name),
            None => write!(f, "Arg({})", self.name),
        }
    }
}

/// A statement parameter: a bound value or a deferred argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Value bound at build time.
    Value(SqlValue),
    /// Argument resolved at call time.
    Arg(Arg),
}

/// Values supplied for query arguments at call time.
///
/// ```rust
/// use clasq_core::query::ArgValues;
///
/// let values = ArgValues::new().arg(2).named("limit", 3);
/// assert_eq!(values.positional().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgValues {
    positional: Vec<SqlValue>,
    named: Vec<(String, SqlValue)>,
}

impl ArgValues {
    /// Creates an empty set of values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    /// Appends a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl ToSqlValue) -> Self {
        self.positional.push(value.to_sql_value());
        self
    }

    /// Sets a keyword value, replacing an earlier value with the same name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl ToSqlValue) -> Self {
        let name = name.into();
        let value = value.to_sql_value();
        match self.named.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.named.push((name, value)),
        }
        self
    }

    /// Returns the positional values.
    #[must_use]
    pub fn positional(&self) -> &[SqlValue] {
        &self.positional
    }

    /// Returns the keyword values.
    #[must_use]
    pub fn named_values(&self) -> &[(String, SqlValue)] {
        &self.named
    }

    /// Returns `true` if no value is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Iterates over all supplied values with their argument names.
    pub fn iter(&self) -> impl Iterator<Item = (ArgName, &SqlValue)> {
        self.positional
            .iter()
            .enumerate()
            .map(|(i, v)| (ArgName::Index(i), v))
            .chain(
                self.named
                    .iter()
                    .map(|(n, v)| (ArgName::Name(n.clone()), v)),
            )
    }

    /// Returns the value supplied for `name`.
    #[must_use]
    pub fn get(&self, name: &ArgName) -> Option<&SqlValue> {
        match name {
            ArgName::Index(i) => self.positional.get(*i),
            ArgName::Name(n) => self
                .named
                .iter()
                .find_map(|(key, v)| (key == n).then_some(v)),
        }
    }
}

impl From<Vec<SqlValue>> for ArgValues {
    fn from(positional: Vec<SqlValue>) -> Self {
        Self {
            positional,
            named: Vec::new(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for ArgValues {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |values, (k, v)| values.named(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_identity() {
        let a = Arg::new("name");
        let b = Arg::with_default("name", "Cables");
        assert!(!a.is_same_arg(&b));
        assert!(b.is_same_arg(&Arg::with_default("name", "Cables")));
        assert!(b.has_default());
        assert_eq!(Arg::new(0).name(), &ArgName::Index(0));
    }

    #[test]
    fn test_arg_values_lookup() {
        let values = ArgValues::new().arg(2).named("limit", 3).named("limit", 5);
        assert_eq!(values.get(&ArgName::Index(0)), Some(&SqlValue::Int(2)));
        assert_eq!(values.get(&ArgName::from("limit")), Some(&SqlValue::Int(5)));
        assert_eq!(values.get(&ArgName::Index(1)), None);
        assert_eq!(values.iter().count(), 2);
    }

    #[test]
    fn test_arg_values_from_pairs() {
        let values: ArgValues = vec![("a", SqlValue::Int(1)), ("b", SqlValue::Null)]
            .into_iter()
            .collect();
        assert_eq!(values.named_values().len(), 2);
        assert!(values.positional().is_empty());
    }
}
