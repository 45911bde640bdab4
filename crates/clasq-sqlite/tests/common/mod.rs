#![allow(dead_code)]

use chrono::NaiveDate;

use clasq_core::schema::column::{datetime, int, varchar};
use clasq_core::schema::CreateOptions;
use clasq_core::{Database, DatabaseBuilder, SqlValue, TableBuilder, TableData};
use clasq_sqlite::SqliteConnection;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn tables() -> Vec<TableBuilder> {
    vec![
        TableBuilder::new("categories")
            .column(int("id").primary_key())
            .column(varchar("name", 64).not_null()),
        TableBuilder::new("products")
            .column(int("id").primary_key())
            .column(int("category_id").not_null())
            .column(varchar("name", 128).not_null())
            .column(int("price").not_null()),
        TableBuilder::new("users")
            .column(int("id").primary_key())
            .column(varchar("name", 64).not_null()),
        TableBuilder::new("user_sales")
            .column(int("id").primary_key())
            .column(int("user_id").not_null())
            .column(datetime("sale_at").not_null()),
        TableBuilder::new("user_sale_products")
            .column(int("id").primary_key())
            .column(int("user_sale_id").not_null())
            .column(int("product_id").not_null())
            .column(int("price").not_null())
            .column(int("count").not_null()),
    ]
}

fn data<const N: usize>(columns: [&str; N], rows: Vec<[SqlValue; N]>) -> TableData {
    TableData::new(columns, rows.into_iter().map(Vec::from).collect()).unwrap()
}

fn int_rows<const N: usize>(rows: &[[i64; N]]) -> Vec<[SqlValue; N]> {
    rows.iter().map(|row| row.map(SqlValue::Int)).collect()
}

pub fn categories() -> TableData {
    let names = [
        "Desktop Computer",
        "Laptop Computer",
        "Display",
        "Keyboard",
        "Mouse",
        "Cables",
    ];
    data(
        ["id", "name"],
        (1..)
            .zip(names)
            .map(|(id, name)| [SqlValue::Int(id), SqlValue::from(name)])
            .collect(),
    )
}

pub fn products() -> TableData {
    let products: [(i64, &str, i64); 30] = [
        (1, "Basic Desktop", 60000),
        (1, "Office Desktop", 80000),
        (1, "Gaming Desktop", 100000),
        (1, "Workstation", 140000),
        (1, "Compact Desktop", 90000),
        (1, "Creator Desktop", 120000),
        (2, "Notebook", 79000),
        (2, "Ultrabook", 110000),
        (2, "Netbook", 65000),
        (3, "19 inch Display", 20000),
        (3, "21 inch Display", 25000),
        (3, "24 inch Display", 30000),
        (3, "27 inch Display", 32000),
        (3, "Wide Display", 30000),
        (3, "4K Display", 40000),
        (3, "Curved Display", 50000),
        (4, "Lowcost Keyboard", 2000),
        (4, "Silver Keyboard", 9000),
        (4, "Red Keyboard", 7000),
        (4, "Blue Keyboard", 8000),
        (4, "Wireless Keyboard", 5000),
        (5, "Optical Mouse", 1500),
        (5, "Wireless Mouse", 3000),
        (5, "Gaming Mouse", 4500),
        (5, "Trackball", 6000),
        (5, "Travel Mouse", 2500),
        (6, "USB Cable", 500),
        (6, "HDMI Cable", 800),
        (6, "DisplayPort Cable", 1200),
        (6, "LAN Cable", 1000),
    ];
    data(
        ["id", "category_id", "name", "price"],
        (1..)
            .zip(products)
            .map(|(id, (category_id, name, price))| {
                [
                    SqlValue::Int(id),
                    SqlValue::Int(category_id),
                    SqlValue::from(name),
                    SqlValue::Int(price),
                ]
            })
            .collect(),
    )
}

pub fn users() -> TableData {
    data(
        ["id", "name"],
        (1..)
            .zip(["Alice", "Bob", "Carol"])
            .map(|(id, name)| [SqlValue::Int(id), SqlValue::from(name)])
            .collect(),
    )
}

pub fn user_sales() -> TableData {
    let day = |d| {
        NaiveDate::from_ymd_opt(2024, 4, d)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap()
    };
    data(
        ["id", "user_id", "sale_at"],
        [(1, 1, 1), (2, 2, 2), (3, 3, 3), (4, 1, 5)]
            .into_iter()
            .map(|(id, user, d)| [SqlValue::Int(id), SqlValue::Int(user), SqlValue::DateTime(day(d))])
            .collect(),
    )
}

pub fn user_sale_products() -> TableData {
    data(
        ["id", "user_sale_id", "product_id", "price", "count"],
        int_rows(&[
            [1, 1, 15, 40000, 1],
            [2, 2, 15, 30000, 1],
            [3, 2, 11, 25000, 1],
            [4, 3, 17, 2000, 3],
            [5, 4, 20, 8000, 1],
            [6, 4, 4, 140000, 1],
        ]),
    )
}

/// Creates the sample tables in a fresh in-memory database and fills them.
pub fn sample_db() -> Database {
    init_tracing();
    let mut builder =
        DatabaseBuilder::new().connection(Box::new(SqliteConnection::in_memory().unwrap()));
    for table in tables() {
        builder = builder.table(table);
    }
    let db = builder.build().unwrap();
    db.create_tables(CreateOptions::default()).unwrap();
    for (name, rows) in [
        ("categories", categories()),
        ("products", products()),
        ("users", users()),
        ("user_sales", user_sales()),
        ("user_sale_products", user_sale_products()),
    ] {
        db.table(name).unwrap().insert_data(&rows).unwrap();
    }
    db.commit().unwrap();
    db
}
