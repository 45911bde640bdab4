//! Schema objects: column types, columns, tables and databases.

pub mod column;
pub mod database;
pub mod sqltypes;
pub mod table;

pub use column::{Column, ColumnBuilder, ColumnDef};
pub use database::{Database, DatabaseBuilder};
pub use sqltypes::{IntWidth, SqlType};
pub use table::{CreateOptions, DeleteOptions, DropOptions, Table, TableBuilder, UpdateOptions};
