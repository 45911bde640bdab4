//! Ordered, name-keyed sets of named expressions.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitXor, Sub};

use indexmap::IndexMap;

use crate::error::{ObjectError, Result};
use crate::name::ObjectName;

use super::{require_name, Expr};

/// How members of an [`ExprSet`] are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    /// By output name. Used for selected expressions.
    #[default]
    Name,
    /// Columns by `<view>.<column>`, other expressions by output name. Used
    /// for base columns, groups and orders, which may hold same-named
    /// columns of different views.
    Qualified,
}

/// An insertion-ordered set of named expressions.
#[derive(Clone, Default)]
pub struct ExprSet {
    kind: KeyKind,
    items: IndexMap<ObjectName, Expr>,
}

impl ExprSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(kind: KeyKind) -> Self {
        Self {
            kind,
            items: IndexMap::new(),
        }
    }

    /// Creates a set from expressions.
    ///
    /// # Errors
    ///
    /// Fails on unnamed expressions and duplicate keys.
    pub fn from_exprs<I>(kind: KeyKind, exprs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Expr>,
    {
        let mut set = Self::new(kind);
        for expr in exprs {
            set.insert(expr)?;
        }
        Ok(set)
    }

    /// Returns the keying mode.
    #[must_use]
    pub const fn key_kind(&self) -> KeyKind {
        self.kind
    }

    /// Computes the key `expr` would be stored under.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgType`] for an unnamed expression.
    pub fn key_of(&self, expr: &Expr) -> Result<ObjectName> {
        if self.kind == KeyKind::Qualified {
            if let Some(column) = expr.as_column() {
                return Ok(column.qualified_name());
            }
        }
        require_name(expr).cloned()
    }

    /// Adds an expression.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NameAlreadyExists`] if the key is taken.
    pub fn insert(&mut self, expr: Expr) -> Result<()> {
        let key = self.key_of(&expr)?;
        if self.items.contains_key(&key) {
            return Err(ObjectError::name_exists("Name already exists.", &key).into());
        }
        self.items.insert(key, expr);
        Ok(())
    }

    /// Adds an expression unless its key is already present.
    ///
    /// Returns `false` when the key existed.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgType`] for an unnamed expression.
    pub fn insert_if_absent(&mut self, expr: Expr) -> Result<bool> {
        let key = self.key_of(&expr)?;
        if self.items.contains_key(&key) {
            return Ok(false);
        }
        self.items.insert(key, expr);
        Ok(true)
    }

    /// Adds a column expression. An existing key keeps its member.
    pub(crate) fn push_column(&mut self, expr: Expr) {
        let key = match (self.kind, expr.as_column()) {
            (KeyKind::Qualified, Some(column)) => column.qualified_name(),
            (KeyKind::Name, Some(column)) => column.name().clone(),
            (_, None) => return,
        };
        self.items.entry(key).or_insert(expr);
    }

    /// Looks up a member by key.
    #[must_use]
    pub fn get(&self, key: &ObjectName) -> Option<&Expr> {
        self.items.get(key)
    }

    /// Returns `true` if a member is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &ObjectName) -> bool {
        self.items.contains_key(key)
    }

    /// Returns `true` if `expr` itself is a member.
    ///
    /// The key must match and the stored member must be the same node
    /// (looking through ordering) or the same column.
    #[must_use]
    pub fn contains(&self, expr: &Expr) -> bool {
        let Ok(key) = self.key_of(expr) else {
            return false;
        };
        self.items
            .get(&key)
            .is_some_and(|member| member.refers_to_same(expr))
    }

    /// Iterates over the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.items.values()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ObjectName> {
        self.items.keys()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the members as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Expr> {
        self.items.values().cloned().collect()
    }

    fn filtered(&self, keep: impl Fn(&ObjectName) -> bool) -> Self {
        Self {
            kind: self.kind,
            items: self
                .items
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Members of `self` whose key is also in `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.filtered(|k| other.contains_key(k))
    }

    /// Members of `self`, then members of `other` with new keys.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (k, v) in &other.items {
            out.items.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out
    }

    /// Members of `self` whose key is not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.filtered(|k| !other.contains_key(k))
    }

    /// Members whose key is in exactly one of the sets.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.difference(other).union(&other.difference(self))
    }
}

impl fmt::Debug for ExprSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.values()).finish()
    }
}

impl<'a> IntoIterator for &'a ExprSet {
    type Item = &'a Expr;
    type IntoIter = indexmap::map::Values<'a, ObjectName, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

impl BitAnd for &ExprSet {
    type Output = ExprSet;

    fn bitand(self, rhs: Self) -> ExprSet {
        self.intersection(rhs)
    }
}

impl BitOr for &ExprSet {
    type Output = ExprSet;

    fn bitor(self, rhs: Self) -> ExprSet {
        self.union(rhs)
    }
}

impl Sub for &ExprSet {
    type Output = ExprSet;

    fn sub(self, rhs: Self) -> ExprSet {
        self.difference(rhs)
    }
}

impl BitXor for &ExprSet {
    type Output = ExprSet;

    fn bitxor(self, rhs: Self) -> ExprSet {
        self.symmetric_difference(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::obj;

    fn names(set: &ExprSet) -> Vec<String> {
        set.keys().map(ToString::to_string).collect()
    }

    #[test]
    fn test_set_algebra_keeps_order() {
        let (a, b, c, d) = (obj("a"), obj("b"), obj("c"), obj("d"));
        let left = ExprSet::from_exprs(KeyKind::Name, [a, b.clone(), c.clone()]).unwrap();
        let right = ExprSet::from_exprs(KeyKind::Name, [d, c, b]).unwrap();

        assert_eq!(names(&(&left & &right)), ["b", "c"]);
        assert_eq!(names(&(&left | &right)), ["a", "b", "c", "d"]);
        assert_eq!(names(&(&left - &right)), ["a"]);
        assert_eq!(names(&(&left ^ &right)), ["a", "d"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut set = ExprSet::new(KeyKind::Name);
        set.insert(obj("a")).unwrap();
        let err = set.insert(obj("a")).unwrap_err();
        assert!(matches!(
            err.as_object(),
            Some(ObjectError::NameAlreadyExists { .. })
        ));
        assert!(!set.insert_if_absent(obj("a")).unwrap());
    }

    #[test]
    fn test_unnamed_rejected() {
        let mut set = ExprSet::new(KeyKind::Name);
        assert!(set.insert(&obj("a") + 1).is_err());
    }

    #[test]
    fn test_contains_checks_identity() {
        let a = obj("a");
        let set = ExprSet::from_exprs(KeyKind::Name, [a.clone()]).unwrap();
        assert!(set.contains(&a));
        assert!(set.contains(&a.desc()));
        assert!(set.contains_key(&ObjectName::new("a")));
        assert!(!set.contains(&obj("a")));
    }
}
