//! SQL column types.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ObjectError, Result};
use crate::value::SqlValue;

static RE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<base>\w+)\s*(?:\((?P<args>[\w\s,]*)\))?\s*(?P<opt>\w+)?\s*$")
        .expect("type pattern is a valid regex")
});

// Multi-word aliases, replaced before the type text is matched.
const PHRASE_ALIASES: &[(&str, &str)] = &[
    ("DOUBLE PRECISION", "DOUBLE"),
    ("CHARACTER VARYING", "VARCHAR"),
    ("LONG VARBINARY", "MEDIUMBLOB"),
    ("LONG VARCHAR", "MEDIUMTEXT"),
];

/// Width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// 1 byte.
    Tiny,
    /// 2 bytes.
    Small,
    /// 3 bytes.
    Medium,
    /// 4 bytes.
    Int,
    /// 8 bytes.
    Big,
}

impl IntWidth {
    const fn bits(self) -> u32 {
        match self {
            Self::Tiny => 8,
            Self::Small => 16,
            Self::Medium => 24,
            Self::Int => 32,
            Self::Big => 64,
        }
    }

    const fn as_sql(self) -> &'static str {
        match self {
            Self::Tiny => "TINYINT",
            Self::Small => "SMALLINT",
            Self::Medium => "MEDIUMINT",
            Self::Int => "INT",
            Self::Big => "BIGINT",
        }
    }
}

/// SQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    // Integer types
    /// `TINYINT`..`BIGINT`, optionally `UNSIGNED`.
    Integer {
        /// Storage width.
        width: IntWidth,
        /// Whether the type is `UNSIGNED`.
        unsigned: bool,
    },

    // Floating point and fixed point
    /// `FLOAT`
    Float,
    /// `DOUBLE`
    Double,
    /// `DECIMAL(p,s)`
    Decimal {
        /// Total number of digits.
        precision: u32,
        /// Digits after the decimal point.
        scale: u32,
    },
    /// `BIT(n)`
    Bit(u32),

    // Date/time types
    /// `DATETIME`
    DateTime,
    /// `DATE`
    Date,
    /// `TIME`
    Time,

    // Fixed and variable length strings
    /// `CHAR(n)`
    Char(u32),
    /// `VARCHAR(n)`
    VarChar(u32),
    /// `BINARY(n)`
    Binary(u32),
    /// `VARBINARY(n)`
    VarBinary(u32),

    // Large objects
    /// `BLOB[(n)]`
    Blob(Option<u32>),
    /// `TINYBLOB`
    TinyBlob,
    /// `MEDIUMBLOB`
    MediumBlob,
    /// `LONGBLOB`
    LongBlob,
    /// `TEXT[(n)]`
    Text(Option<u32>),
    /// `TINYTEXT`
    TinyText,
    /// `MEDIUMTEXT`
    MediumText,
    /// `LONGTEXT`
    LongText,

    /// Untyped, for subquery columns.
    Any,
}

impl SqlType {
    /// `TINYINT`
    pub const TINYINT: Self = Self::int(IntWidth::Tiny);
    /// `SMALLINT`
    pub const SMALLINT: Self = Self::int(IntWidth::Small);
    /// `MEDIUMINT`
    pub const MEDIUMINT: Self = Self::int(IntWidth::Medium);
    /// `INT`
    pub const INT: Self = Self::int(IntWidth::Int);
    /// `BIGINT`
    pub const BIGINT: Self = Self::int(IntWidth::Big);
    /// `TINYINT`, the type behind `BOOL`.
    pub const BOOL: Self = Self::TINYINT;

    const fn int(width: IntWidth) -> Self {
        Self::Integer {
            width,
            unsigned: false,
        }
    }

    /// Returns the unsigned variant of an integer type; other types are
    /// returned unchanged.
    #[must_use]
    pub const fn unsigned(self) -> Self {
        match self {
            Self::Integer { width, .. } => Self::Integer {
                width,
                unsigned: true,
            },
            other => other,
        }
    }

    /// Returns the inclusive value range of an integer type.
    ///
    /// Unsigned ranges are derived from the signed range of the same width.
    #[must_use]
    pub const fn int_range(&self) -> Option<(i128, i128)> {
        let Self::Integer { width, unsigned } = *self else {
            return None;
        };
        let half = 1_i128 << (width.bits() - 1);
        let (min, max) = (-half, half - 1);
        if unsigned {
            Some((0, max - min))
        } else {
            Some((min, max))
        }
    }

    /// Returns the maximum length of string and binary types.
    #[must_use]
    pub const fn max_length(&self) -> Option<u64> {
        const fn bytes(bits: u32) -> u64 {
            (1_u64 << bits) - 1
        }
        match *self {
            Self::Char(n) | Self::VarChar(n) | Self::Binary(n) | Self::VarBinary(n) => {
                Some(n as u64)
            }
            Self::Blob(Some(n)) | Self::Text(Some(n)) => Some(n as u64),
            Self::Blob(None) | Self::Text(None) => Some(bytes(16)),
            Self::TinyBlob | Self::TinyText => Some(bytes(8)),
            Self::MediumBlob | Self::MediumText => Some(bytes(24)),
            Self::LongBlob | Self::LongText => Some(bytes(32)),
            _ => None,
        }
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Integer { width, unsigned } => {
                if *unsigned {
                    format!("{} UNSIGNED", width.as_sql())
                } else {
                    String::from(width.as_sql())
                }
            }
            Self::Float => String::from("FLOAT"),
            Self::Double => String::from("DOUBLE"),
            Self::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            Self::Bit(n) => format!("BIT({n})"),
            Self::DateTime => String::from("DATETIME"),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::Char(n) => format!("CHAR({n})"),
            Self::VarChar(n) => format!("VARCHAR({n})"),
            Self::Binary(n) => format!("BINARY({n})"),
            Self::VarBinary(n) => format!("VARBINARY({n})"),
            Self::Blob(Some(n)) => format!("BLOB({n})"),
            Self::Blob(None) => String::from("BLOB"),
            Self::TinyBlob => String::from("TINYBLOB"),
            Self::MediumBlob => String::from("MEDIUMBLOB"),
            Self::LongBlob => String::from("LONGBLOB"),
            Self::Text(Some(n)) => format!("TEXT({n})"),
            Self::Text(None) => String::from("TEXT"),
            Self::TinyText => String::from("TINYTEXT"),
            Self::MediumText => String::from("MEDIUMTEXT"),
            Self::LongText => String::from("LONGTEXT"),
            Self::Any => String::from("ANY"),
        }
    }

    /// Checks that `value` fits this type.
    ///
    /// Integers are range checked and strings and byte strings are length
    /// checked. NULL always fits; nullability is a column attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] for out-of-range values and
    /// [`ObjectError::ArgType`] for values of an unrelated kind.
    pub fn check_value(&self, value: &SqlValue) -> Result<()> {
        if value.is_null() || *self == Self::Any {
            return Ok(());
        }
        if let Some((min, max)) = self.int_range() {
            let Some(v) = value.as_i64() else {
                return Err(ObjectError::ArgType(format!(
                    "{} value expected for {self}, got {}",
                    "integer",
                    value.type_name()
                ))
                .into());
            };
            if !(min..=max).contains(&i128::from(v)) {
                return Err(
                    ObjectError::ArgValue(format!("{v} is out of range for {self}")).into(),
                );
            }
            return Ok(());
        }
        if let Some(max) = self.max_length() {
            let len = match value {
                SqlValue::Text(s) => s.chars().count(),
                SqlValue::Bytes(b) => b.len(),
                _ => return Ok(()),
            };
            if len as u64 > max {
                return Err(ObjectError::ArgValue(format!(
                    "length {len} exceeds the maximum of {max} for {self}"
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Parses a type as reported by a database, e.g. `int(11) unsigned`,
    /// `varchar(64)`, `decimal(10,2)` or `INTEGER`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] for unknown types or malformed
    /// arguments.
    pub fn parse(text: &str) -> Result<Self> {
        let mut upper = text.trim().to_ascii_uppercase();
        for (phrase, alias) in PHRASE_ALIASES {
            if let Some(rest) = upper.strip_prefix(phrase) {
                upper = format!("{alias}{rest}");
                break;
            }
        }
        let invalid = || ObjectError::ArgValue(format!("Unknown SQL type: {text}"));
        let caps = RE_TYPE.captures(&upper).ok_or_else(invalid)?;
        let base = caps.name("base").map_or("", |m| m.as_str());
        let args = caps
            .name("args")
            .map(|m| parse_args(m.as_str()))
            .transpose()?
            .unwrap_or_default();
        let unsigned = match caps.name("opt").map(|m| m.as_str()) {
            None | Some("SIGNED") => false,
            Some("UNSIGNED" | "ZEROFILL") => true,
            Some(_) => return Err(invalid().into()),
        };

        let length = |default: Option<u32>| -> Result<u32> {
            args.first().copied().or(default).ok_or_else(|| {
                ObjectError::ArgValue(format!("Length is required: {text}")).into()
            })
        };

        let ty = match base {
            "TINYINT" | "BOOL" | "BOOLEAN" | "INT1" => Self::TINYINT,
            "SMALLINT" | "INT2" => Self::SMALLINT,
            "MEDIUMINT" | "MIDDLEINT" | "INT3" => Self::MEDIUMINT,
            "INT" | "INTEGER" | "INT4" => Self::INT,
            "BIGINT" | "INT8" => Self::BIGINT,
            "FLOAT" | "FLOAT4" => Self::Float,
            "DOUBLE" | "REAL" | "FLOAT8" => Self::Double,
            "DECIMAL" | "NUMERIC" | "FIXED" | "DEC" => Self::Decimal {
                precision: args.first().copied().unwrap_or(10),
                scale: args.get(1).copied().unwrap_or(0),
            },
            "BIT" => Self::Bit(length(Some(1))?),
            "DATETIME" => Self::DateTime,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "CHAR" => Self::Char(length(Some(1))?),
            "VARCHAR" => Self::VarChar(length(None)?),
            "BINARY" => Self::Binary(length(Some(1))?),
            "VARBINARY" => Self::VarBinary(length(None)?),
            "BLOB" => Self::Blob(args.first().copied()),
            "TINYBLOB" => Self::TinyBlob,
            "MEDIUMBLOB" => Self::MediumBlob,
            "LONGBLOB" => Self::LongBlob,
            "TEXT" => Self::Text(args.first().copied()),
            "TINYTEXT" => Self::TinyText,
            "MEDIUMTEXT" | "LONG" => Self::MediumText,
            "LONGTEXT" => Self::LongText,
            _ => return Err(invalid().into()),
        };
        if unsigned && !matches!(ty, Self::Integer { .. }) {
            return Err(invalid().into());
        }
        Ok(if unsigned { ty.unsigned() } else { ty })
    }
}

fn parse_args(args: &str) -> Result<Vec<u32>> {
    args.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| {
            a.parse::<u32>().map_err(|_| {
                ObjectError::ArgValue(format!("Invalid type argument: {a}")).into()
            })
        })
        .collect()
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
