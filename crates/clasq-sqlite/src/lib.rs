//! # clasq-sqlite
//!
//! A [`clasq_core::Connection`] over SQLite.
//!
//! SQLite accepts backtick-quoted identifiers and `?` placeholders, so the
//! statements compiled by `clasq-core` run unchanged.
//!
//! ```rust
//! use clasq_core::schema::column::{int, varchar};
//! use clasq_core::{DatabaseBuilder, SqlValue, TableBuilder};
//! use clasq_sqlite::SqliteConnection;
//!
//! let db = DatabaseBuilder::new()
//!     .table(
//!         TableBuilder::new("users")
//!             .column(int("id").primary_key())
//!             .column(varchar("name", 32)),
//!     )
//!     .connection(Box::new(SqliteConnection::in_memory().unwrap()))
//!     .build()
//!     .unwrap();
//!
//! let users = db.table("users").unwrap();
//! users.create(Default::default()).unwrap();
//! users
//!     .insert([("id", SqlValue::Int(1)), ("name", SqlValue::from("alice"))])
//!     .unwrap();
//!
//! let rows = users.select_column(["name"]).unwrap().result().unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

pub mod config;
pub mod connection;
pub mod error;
mod value;

pub use config::SqliteConfig;
pub use connection::SqliteConnection;
pub use error::{Result, SqliteError};
