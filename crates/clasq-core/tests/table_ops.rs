//! Write and definition statements issued through a database connection.

mod common;

use pretty_assertions::assert_eq;

use clasq_core::schema::column::int;
use clasq_core::schema::{CreateOptions, DeleteOptions, DropOptions, UpdateOptions};
use clasq_core::{ObjectError, SqlValue, TableBuilder, TableData};

fn categories() -> TableData {
    TableData::new(
        ["id", "name"],
        vec![
            vec![SqlValue::Int(1), SqlValue::from("Desktop Computer")],
            vec![SqlValue::Int(2), SqlValue::from("Laptop Computer")],
        ],
    )
    .unwrap()
}

#[test]
fn test_create_tables_in_order() {
    let (db, log) = common::shop();
    db.create_tables(CreateOptions {
        if_not_exists: true,
        ..CreateOptions::default()
    })
    .unwrap();
    assert_eq!(
        common::statements(&log),
        [
            "CREATE TABLE IF NOT EXISTS `categories` (`id` INT NOT NULL PRIMARY KEY, \
             `name` VARCHAR(64) NOT NULL)",
            "CREATE TABLE IF NOT EXISTS `products` (`id` INT NOT NULL PRIMARY KEY, \
             `category_id` INT NOT NULL, `name` VARCHAR(128) NOT NULL, `price` INT NOT NULL)",
        ]
    );
}

#[test]
fn test_insert_returns_row_id() {
    let (db, log) = common::shop();
    let categories = db.table("categories").unwrap();
    assert_eq!(categories.insert([("name", "Display")]).unwrap(), 1);
    assert_eq!(categories.insert([("name", "Keyboard")]).unwrap(), 2);
    let log = log.lock();
    assert_eq!(log[0].0, "INSERT INTO `categories` (`name`) VALUES (?)");
    assert_eq!(log[1].1, vec![SqlValue::from("Keyboard")]);
}

#[test]
fn test_insert_data_runs_once_per_row() {
    let (db, log) = common::shop();
    db.table("categories")
        .unwrap()
        .insert_data(&categories())
        .unwrap();
    let log = log.lock();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, "INSERT INTO `categories` (`id`, `name`) VALUES (?, ?)");
    assert_eq!(
        log[1].1,
        vec![SqlValue::Int(2), SqlValue::from("Laptop Computer")]
    );
}

#[test]
fn test_update_data_matches_on_keys() {
    let (db, log) = common::shop();
    db.table("categories")
        .unwrap()
        .update_data(&categories(), ["id"])
        .unwrap();
    let log = log.lock();
    assert_eq!(
        log[0],
        (
            String::from("UPDATE `categories` SET `name` = ? WHERE (`categories`.`id` = ?)"),
            vec![SqlValue::from("Desktop Computer"), SqlValue::Int(1)]
        )
    );

    let err = db
        .table("categories")
        .unwrap()
        .update_data(&categories(), ["missing"])
        .unwrap_err();
    assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));
}

#[test]
fn test_update_and_delete() {
    let (db, log) = common::shop();
    let products = db.table("products").unwrap();
    let price = products.get_column("price").unwrap();
    products
        .update(
            [("price", &price * 2)],
            &UpdateOptions::new().where_clause(products.get_column("category_id").unwrap().eq(6)),
        )
        .unwrap();
    products
        .delete(&DeleteOptions::new().where_clause(price.lt(100)).limit(10))
        .unwrap();
    products.truncate().unwrap();
    assert_eq!(
        common::statements(&log),
        [
            "UPDATE `products` SET `price` = (`products`.`price` * ?) \
             WHERE (`products`.`category_id` = ?)",
            "DELETE FROM `products` WHERE (`products`.`price` < ?) LIMIT ?",
            "TRUNCATE TABLE `products`",
        ]
    );
}

#[test]
fn test_delete_data_matches_every_column() {
    let (db, log) = common::shop();
    db.table("categories")
        .unwrap()
        .delete_data(&categories())
        .unwrap();
    assert_eq!(
        common::statements(&log)[0],
        "DELETE FROM `categories` WHERE ((`categories`.`id` = ?) AND (`categories`.`name` = ?))"
    );
}

#[test]
fn test_drop_deregisters() {
    let (db, log) = common::shop();
    let products = db.table("products").unwrap();
    products
        .drop(DropOptions {
            if_exists: true,
            ..DropOptions::default()
        })
        .unwrap();
    assert_eq!(common::statements(&log), ["DROP TABLE IF EXISTS `products`"]);
    assert!(!db.contains("products"));
    assert!(products.select_query().is_ok());
}

#[test]
fn test_append_then_create() {
    let (db, log) = common::shop();
    let tags = db
        .append_table(TableBuilder::new("tags").column(int("id").primary_key().auto_increment()))
        .unwrap();
    tags.create(CreateOptions {
        drop_if_exists: true,
        ..CreateOptions::default()
    })
    .unwrap();
    assert_eq!(
        common::statements(&log),
        [
            "DROP TABLE IF EXISTS `tags`",
            "CREATE TABLE `tags` (`id` INT NOT NULL PRIMARY KEY AUTO_INCREMENT)",
        ]
    );
    assert_eq!(db.tables().len(), 3);
}

#[test]
fn test_view_result_goes_through_connection() {
    let (db, log) = common::shop();
    let products = db.table("products").unwrap();
    let view = products.where_eq("category_id", 3).unwrap();
    let result = view.result().unwrap();
    assert_eq!(result.columns(), ["id"]);
    view.prepare_result().unwrap();
    assert_eq!(log.lock().len(), 1);
    db.commit().unwrap();
    assert_eq!(common::statements(&log)[1], "COMMIT");
}

#[test]
fn test_without_connection() {
    let (db, _) = common::shop();
    let conn = db.disconnect();
    assert!(conn.is_some());
    let err = db.table("products").unwrap().result().unwrap_err();
    assert!(matches!(err.as_object(), Some(ObjectError::NotSet(_))));
}
