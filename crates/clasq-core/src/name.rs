//! Object names.
//!
//! An [`ObjectName`] is the raw identifier of a database, table, view, column
//! or alias. Names are compared byte-wise and are never validated here;
//! quoting and rejection of unsafe names happen when a name is appended to a
//! [`QueryData`](crate::query::QueryData).

use core::fmt;
use std::ops::{Add, Rem};

/// A case-sensitive identifier stored as raw bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectName(Vec<u8>);

impl ObjectName {
    /// Creates a name from anything convertible into one.
    pub fn new(name: impl Into<Self>) -> Self {
        name.into()
    }

    /// Returns the raw bytes of this name.
    #[must_use]
    pub fn raw_name(&self) -> &[u8] {
        &self.0
    }

    /// Returns the name as UTF-8, if it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Returns `true` if the name has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dot-joins two names into a qualified name (`a.b`).
    #[must_use]
    pub fn qualify(&self, other: &Self) -> Self {
        let mut raw = Vec::with_capacity(self.0.len() + other.0.len() + 1);
        raw.extend_from_slice(&self.0);
        raw.push(b'.');
        raw.extend_from_slice(&other.0);
        Self(raw)
    }

    /// Appends raw bytes without a separator.
    #[must_use]
    pub fn concat(&self, suffix: impl AsRef<[u8]>) -> Self {
        let mut raw = self.0.clone();
        raw.extend_from_slice(suffix.as_ref());
        Self(raw)
    }

    /// Substitutes each `%s` placeholder with the next name in `values`.
    ///
    /// Placeholders without a matching value are kept as they are; `%%`
    /// renders a single `%`.
    #[must_use]
    pub fn format_with(&self, values: &[&Self]) -> Self {
        let mut out = Vec::with_capacity(self.0.len());
        let mut values = values.iter();
        let mut bytes = self.0.iter().copied().peekable();
        while let Some(b) = bytes.next() {
            if b != b'%' {
                out.push(b);
                continue;
            }
            match bytes.peek() {
                Some(b's') => {
                    bytes.next();
                    match values.next() {
                        Some(v) => out.extend_from_slice(&v.0),
                        None => out.extend_from_slice(b"%s"),
                    }
                }
                Some(b'%') => {
                    bytes.next();
                    out.push(b'%');
                }
                _ => out.push(b),
            }
        }
        Self(out)
    }

    /// Returns a new name with the first byte removed, if it equals `prefix`.
    pub(crate) fn strip_prefix(&self, prefix: u8) -> Option<Self> {
        match self.0.split_first() {
            Some((first, rest)) if *first == prefix => Some(Self(rest.to_vec())),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjName({self})")
    }
}

impl From<&str> for ObjectName {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for ObjectName {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&String> for ObjectName {
    fn from(value: &String) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<&[u8]> for ObjectName {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for ObjectName {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&Self> for ObjectName {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

impl AsRef<[u8]> for ObjectName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for ObjectName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for ObjectName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<[u8]> for ObjectName {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<ObjectName> for &str {
    fn eq(&self, other: &ObjectName) -> bool {
        self.as_bytes() == other.0
    }
}

impl Add for &ObjectName {
    type Output = ObjectName;

    fn add(self, rhs: Self) -> ObjectName {
        self.qualify(rhs)
    }
}

impl Add<&str> for &ObjectName {
    type Output = ObjectName;

    fn add(self, rhs: &str) -> ObjectName {
        self.concat(rhs)
    }
}

impl Rem<&ObjectName> for &ObjectName {
    type Output = ObjectName;

    fn rem(self, rhs: &ObjectName) -> ObjectName {
        self.format_with(&[rhs])
    }
}
