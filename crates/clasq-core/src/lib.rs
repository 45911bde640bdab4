//! # clasq-core
//!
//! Composable SQL views compiled to parameterized statements.
//!
//! This crate provides:
//! - An expression algebra over columns, literals and deferred arguments
//! - Immutable views that derive new views by selecting, filtering,
//!   grouping, ordering, joining and nesting
//! - A statement compiler that keeps every literal out of the SQL text
//! - Tables and databases with the write and definition statements they need
//!
//! Execution goes through the [`Connection`] trait; drivers live in their own
//! crates.
//!
//! ## Composing a view
//!
//! ```rust
//! use clasq_core::schema::{column::{int, varchar}, DatabaseBuilder, TableBuilder};
//! use clasq_core::SqlValue;
//!
//! let db = DatabaseBuilder::new()
//!     .table(
//!         TableBuilder::new("products")
//!             .column(int("id").primary_key())
//!             .column(varchar("name", 128))
//!             .column(int("price")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let products = db.table("products").unwrap();
//! let cheap = products
//!     .where_clause(products.get_column("price").unwrap().lt(1000))
//!     .unwrap()
//!     .order_by(["-price"])
//!     .unwrap()
//!     .select_column(["name"])
//!     .unwrap();
//!
//! let qd = cheap.select_query().unwrap();
//! assert_eq!(
//!     qd.stmt(),
//!     "SELECT `products`.`name` FROM `products` \
//!      WHERE (`products`.`price` < ?) ORDER BY `products`.`price` DESC"
//! );
//! assert_eq!(qd.params().unwrap(), vec![SqlValue::Int(1000)]);
//! ```

pub mod connection;
pub mod error;
pub mod expr;
pub mod keywords;
pub mod name;
pub mod query;
pub mod schema;
pub mod table_data;
pub mod value;
pub mod view;

pub use connection::{ColumnSchema, Connection, TableSchema};
pub use error::{Error, ObjectError, QueryError, Result};
pub use expr::{and_all, arg, arg_named, arg_with_default, obj, or_all, value, Expr, IntoExpr};
pub use keywords::{JoinType, OrderType};
pub use name::ObjectName;
pub use query::{Arg, ArgName, ArgValues, QueryData, QueryLike};
pub use schema::{Column, ColumnBuilder, Database, DatabaseBuilder, SqlType, Table, TableBuilder};
pub use table_data::{Row, TableData};
pub use value::{SqlValue, ToSqlValue};
pub use view::{ColumnLike, OrderSpec, Selection, View};
