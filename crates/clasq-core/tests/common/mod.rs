#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use clasq_core::schema::column::{int, varchar};
use clasq_core::{Connection, Database, DatabaseBuilder, Result, SqlValue, TableBuilder, TableData};

/// Statements seen by a [`Recording`] connection.
pub type Log = Arc<Mutex<Vec<(String, Vec<SqlValue>)>>>;

/// A connection that records every statement and answers SELECTs with a
/// fixed result.
pub struct Recording {
    pub log: Log,
    pub rows: TableData,
    pub next_id: i64,
}

impl Connection for Recording {
    fn run(&mut self, stmt: &str, params: &[SqlValue]) -> Result<Option<TableData>> {
        self.log.lock().push((stmt.to_string(), params.to_vec()));
        if stmt.starts_with("SELECT") {
            return Ok(Some(self.rows.clone()));
        }
        if stmt.starts_with("INSERT") {
            self.next_id += 1;
        }
        Ok(None)
    }

    fn commit(&mut self) -> Result<()> {
        self.log.lock().push((String::from("COMMIT"), Vec::new()));
        Ok(())
    }

    fn last_row_id(&mut self) -> Result<i64> {
        Ok(self.next_id)
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn shop_tables() -> Vec<TableBuilder> {
    vec![
        TableBuilder::new("categories")
            .column(int("id").primary_key())
            .column(varchar("name", 64).not_null()),
        TableBuilder::new("products")
            .column(int("id").primary_key())
            .column(int("category_id").not_null())
            .column(varchar("name", 128).not_null())
            .column(int("price").not_null()),
    ]
}

/// A database over [`shop_tables`] with a recording connection.
pub fn shop() -> (Database, Log) {
    init_tracing();
    let log = Log::default();
    let rows = TableData::new(["id"], vec![vec![SqlValue::Int(1)]]).unwrap();
    let mut builder = DatabaseBuilder::new().name("shop").connection(Box::new(Recording {
        log: Arc::clone(&log),
        rows,
        next_id: 0,
    }));
    for table in shop_tables() {
        builder = builder.table(table);
    }
    (builder.build().unwrap(), log)
}

pub fn statements(log: &Log) -> Vec<String> {
    log.lock().iter().map(|(stmt, _)| stmt.clone()).collect()
}
