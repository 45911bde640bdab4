//! Statement compiler.
//!
//! [`QueryData`] accumulates SQL text and its ordered parameter list. Anything
//! implementing [`QueryLike`] can be appended to it: keyword fragments, object
//! names, values, query arguments, expressions and nested `QueryData`.
//!
//! ```rust
//! use clasq_core::query::{Keyword, QueryData};
//! use clasq_core::value::SqlValue;
//!
//! let qd = QueryData::build((
//!     Keyword("hoge fugar("),
//!     SqlValue::Int(123),
//!     SqlValue::from("textval"),
//!     Keyword(")"),
//! ))
//! .unwrap();
//! assert_eq!(qd.stmt(), "hoge fugar(? ?)");
//! ```

mod arg;

use core::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

pub use arg::{Arg, ArgName, ArgValues, Param};

use crate::error::{QueryError, Result};
use crate::name::ObjectName;
use crate::value::SqlValue;

/// Placeholder emitted for every bound parameter.
pub const PLACEHOLDER: &str = "?";

/// Separator used when appending a list.
pub const DEFAULT_SEP: &str = ",";

/// Quote character for object names.
pub const OBJECT_QUOTE: char = '`';

static RE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\w()+\-*/%<>=!&|^~,.]*$").expect("keyword pattern is a valid regex")
});

// No space is inserted before a fragment starting with one of these.
const R_NOSP: &[char] = &[' ', ')', ',', '.'];
// No space is inserted after a statement ending with one of these.
const L_NOSP: &[char] = &[' ', '(', '.'];

/// Something that can render itself into a [`QueryData`].
pub trait QueryLike {
    /// Appends this object to `qd`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] when the object cannot be rendered.
    fn append_to(&self, qd: &mut QueryData) -> Result<()>;
}

/// A raw SQL keyword fragment, validated before it is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword<'a>(pub &'a str);

/// Items appended with a separator between them.
#[derive(Debug, Clone, Copy)]
pub struct Joined<'a, T> {
    items: &'a [T],
    sep: &'a str,
}

impl<'a, T> Joined<'a, T> {
    /// Joins `items` with the default separator (`,`).
    #[must_use]
    pub const fn new(items: &'a [T]) -> Self {
        Self {
            items,
            sep: DEFAULT_SEP,
        }
    }

    /// Joins `items` with a custom separator.
    #[must_use]
    pub const fn with_sep(items: &'a [T], sep: &'a str) -> Self {
        Self { items, sep }
    }
}

/// A SQL statement under construction together with its parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryData {
    stmt: String,
    params: Vec<Param>,
    args: IndexMap<ArgName, Arg>,
}

impl PartialEq for QueryData {
    fn eq(&self, other: &Self) -> bool {
        self.stmt == other.stmt && self.params == other.params
    }
}

impl QueryData {
    /// Creates an empty statement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a statement from a single appendable value.
    ///
    /// # Errors
    ///
    /// Fails if any part of `value` cannot be rendered.
    pub fn build(value: impl QueryLike) -> Result<Self> {
        let mut qd = Self::new();
        value.append_to(&mut qd)?;
        Ok(qd)
    }

    /// Creates a statement from raw text and bound values, without validation.
    ///
    /// Used for comparisons against expected statements.
    #[must_use]
    pub fn from_raw(stmt: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            stmt: stmt.into(),
            params: params.into_iter().map(Param::Value).collect(),
            args: IndexMap::new(),
        }
    }

    /// Returns the statement text.
    #[must_use]
    pub fn stmt(&self) -> &str {
        &self.stmt
    }

    /// Returns the parameters, including unresolved arguments.
    #[must_use]
    pub fn params_with_args(&self) -> &[Param] {
        &self.params
    }

    /// Returns the arguments registered in this statement.
    pub fn args(&self) -> impl Iterator<Item = &Arg> {
        self.args.values()
    }

    /// Returns `true` if the statement contains query arguments.
    #[must_use]
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Appends any [`QueryLike`] value.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures of `value`.
    pub fn append(&mut self, value: impl QueryLike) -> Result<&mut Self> {
        value.append_to(self)?;
        Ok(self)
    }

    /// Appends a validated keyword or raw SQL fragment.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Value`] if the fragment contains characters
    /// outside the keyword character class (quotes, semicolons, ...).
    pub fn append_keyword(&mut self, keyword: &str) -> Result<&mut Self> {
        if !RE_KEYWORD.is_match(keyword) {
            return Err(QueryError::Value(format!(
                "Keyword has invalid characters: {keyword:?}"
            ))
            .into());
        }
        self.push_fragment(keyword);
        Ok(self)
    }

    /// Appends a backtick-quoted object name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Value`] if the name contains a backtick or is not
    /// valid UTF-8.
    pub fn append_object_name(&mut self, name: &ObjectName) -> Result<&mut Self> {
        let Some(raw) = name.as_str() else {
            return Err(QueryError::Value(format!("Object name is not valid UTF-8: {name}")).into());
        };
        if raw.contains(OBJECT_QUOTE) {
            return Err(QueryError::Value(format!(
                "Object name cannot contain a quote character: {raw}"
            ))
            .into());
        }
        let quoted = format!("{OBJECT_QUOTE}{raw}{OBJECT_QUOTE}");
        self.push_fragment(&quoted);
        Ok(self)
    }

    /// Appends a bound value as a placeholder.
    pub fn append_value(&mut self, value: SqlValue) -> &mut Self {
        self.push_fragment(PLACEHOLDER);
        self.params.push(Param::Value(value));
        self
    }

    /// Appends a query argument as a placeholder and registers it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Argument`] if a different argument with the same
    /// name is already registered.
    pub fn append_arg(&mut self, arg: &Arg) -> Result<&mut Self> {
        self.register_arg(arg)?;
        self.push_fragment(PLACEHOLDER);
        self.params.push(Param::Arg(arg.clone()));
        Ok(self)
    }

    /// Appends another statement, merging its parameters and arguments.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Argument`] on conflicting argument definitions.
    pub fn append_query_data(&mut self, other: &Self) -> Result<&mut Self> {
        for arg in other.args.values() {
            self.register_arg(arg)?;
        }
        self.push_fragment(&other.stmt);
        self.params.extend(other.params.iter().cloned());
        Ok(self)
    }

    /// Appends items separated by `sep`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures of the items or the separator.
    pub fn append_joined<T: QueryLike>(&mut self, items: &[T], sep: &str) -> Result<&mut Self> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.append_keyword(sep)?;
            }
            item.append_to(self)?;
        }
        Ok(self)
    }

    /// Resolves the parameters using argument defaults only.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Argument`] if an argument has no default.
    pub fn params(&self) -> Result<Vec<SqlValue>> {
        self.calc_params(&ArgValues::new(), false)
    }

    /// Resolves the parameters against call-time values.
    ///
    /// Supplied values take precedence over defaults. Every argument must end
    /// up with a value, and unless `ignore_unused` is set every supplied value
    /// must be consumed by some argument.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Argument`] for unset or unused arguments.
    pub fn calc_params(&self, values: &ArgValues, ignore_unused: bool) -> Result<Vec<SqlValue>> {
        let mut unused: Vec<ArgName> = values.iter().map(|(name, _)| name).collect();
        let mut unset: Vec<&ArgName> = Vec::new();
        let mut resolved = Vec::with_capacity(self.params.len());

        for param in &self.params {
            match param {
                Param::Value(v) => resolved.push(v.clone()),
                Param::Arg(arg) => {
                    if let Some(v) = values.get(arg.name()) {
                        unused.retain(|name| name != arg.name());
                        resolved.push(v.clone());
                    } else if let Some(default) = arg.default_value() {
                        resolved.push(default.clone());
                    } else {
                        if !unset.contains(&arg.name()) {
                            unset.push(arg.name());
                        }
                        resolved.push(SqlValue::Null);
                    }
                }
            }
        }

        if !unset.is_empty() {
            return Err(QueryError::Argument(format!(
                "Argument value(s) are not set: {}",
                join_names(unset)
            ))
            .into());
        }
        if !ignore_unused && !unused.is_empty() {
            return Err(QueryError::Argument(format!(
                "Unused arguments exist: {}",
                join_names(unused.iter())
            ))
            .into());
        }
        Ok(resolved)
    }

    /// Resolves the parameters for each set of values in a batch.
    ///
    /// # Errors
    ///
    /// Fails on the first set that cannot be resolved.
    pub fn calc_params_many<'a, I>(&self, rows: I, ignore_unused: bool) -> Result<Vec<Vec<SqlValue>>>
    where
        I: IntoIterator<Item = &'a ArgValues>,
    {
        rows.into_iter()
            .map(|values| self.calc_params(values, ignore_unused))
            .collect()
    }

    /// Creates a new statement with every argument resolved.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Argument`] if a supplied positional index or
    /// keyword does not name a declared argument, or if resolution fails.
    pub fn call(&self, values: &ArgValues) -> Result<Self> {
        self.call_inner(values, false)
    }

    /// Like [`QueryData::call`], but ignores supplied values that no argument uses.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Argument`] if resolution fails.
    pub fn call_ignore_unused(&self, values: &ArgValues) -> Result<Self> {
        self.call_inner(values, true)
    }

    fn call_inner(&self, values: &ArgValues, ignore_unused: bool) -> Result<Self> {
        if !ignore_unused {
            for (name, _) in values.iter() {
                if self.args.contains_key(&name) {
                    continue;
                }
                let message = match name {
                    ArgName::Index(i) => format!("Positional argument {i} not found."),
                    ArgName::Name(n) => format!("Keyword argument `{n}` not found."),
                };
                return Err(QueryError::Argument(message).into());
            }
        }
        let params = self.calc_params(values, ignore_unused)?;
        Ok(Self::from_raw(self.stmt.clone(), params))
    }

    fn register_arg(&mut self, arg: &Arg) -> Result<()> {
        match self.args.get(arg.name()) {
            Some(existing) if !existing.is_same_arg(arg) => Err(QueryError::Argument(format!(
                "Cannot specify different arguments with same name. ({})",
                arg.name()
            ))
            .into()),
            Some(_) => Ok(()),
            None => {
                self.args.insert(arg.name().clone(), arg.clone());
                Ok(())
            }
        }
    }

    fn push_fragment(&mut self, fragment: &str) {
        let Some(first) = fragment.chars().next() else {
            return;
        };
        let needs_space = self
            .stmt
            .chars()
            .next_back()
            .is_some_and(|last| !R_NOSP.contains(&first) && !L_NOSP.contains(&last));
        if needs_space {
            self.stmt.push(' ');
        }
        self.stmt.push_str(fragment);
    }
}

fn join_names<'a>(names: impl IntoIterator<Item = &'a ArgName>) -> String {
    names
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stmt)
    }
}

impl QueryLike for QueryData {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_query_data(self).map(|_| ())
    }
}

impl QueryLike for Keyword<'_> {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_keyword(self.0).map(|_| ())
    }
}

impl QueryLike for str {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_keyword(self).map(|_| ())
    }
}

impl QueryLike for ObjectName {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_object_name(self).map(|_| ())
    }
}

impl QueryLike for SqlValue {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_value(self.clone());
        Ok(())
    }
}

impl QueryLike for Arg {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_arg(self).map(|_| ())
    }
}

impl QueryLike for Param {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        match self {
            Self::Value(v) => v.append_to(qd),
            Self::Arg(a) => a.append_to(qd),
        }
    }
}

impl<T: QueryLike + ?Sized> QueryLike for &T {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        (**self).append_to(qd)
    }
}

impl<T: QueryLike> QueryLike for Option<T> {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        match self {
            Some(v) => v.append_to(qd),
            None => Ok(()),
        }
    }
}

impl<T: QueryLike> QueryLike for [T] {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_joined(self, DEFAULT_SEP).map(|_| ())
    }
}

impl<T: QueryLike> QueryLike for Vec<T> {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        self.as_slice().append_to(qd)
    }
}

impl<T: QueryLike> QueryLike for Joined<'_, T> {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        qd.append_joined(self.items, self.sep).map(|_| ())
    }
}

impl QueryLike for () {
    fn append_to(&self, _qd: &mut QueryData) -> Result<()> {
        Ok(())
    }
}

macro_rules! impl_query_like_tuple {
    ($($idx:tt $name:ident),+) => {
        impl<$($name: QueryLike),+> QueryLike for ($($name,)+) {
            fn append_to(&self, qd: &mut QueryData) -> Result<()> {
                $(self.$idx.append_to(qd)?;)+
                Ok(())
            }
        }
    };
}

impl_query_like_tuple!(0 A);
impl_query_like_tuple!(0 A, 1 B);
impl_query_like_tuple!(0 A, 1 B, 2 C);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I);
impl_query_like_tuple!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J);
