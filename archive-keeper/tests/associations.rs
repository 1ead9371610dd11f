//! Cascaded archive links, archive reads and file-based configuration.

mod common;

use archive_keeper::database::Predicate;
use archive_keeper::{
    ArchiveContext, ArchiveError, ArchiveKeeper, ArchiveOptions, Association, Dependent, Entity,
    EntityRef, KeeperConfig, LiveRecord, NoCallbacks,
};
use common::{count, fixed_clock};
use rusqlite::Connection;
use serde_json::json;

fn shop_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, status TEXT);
         CREATE TABLE line_items (id INTEGER PRIMARY KEY, order_id INTEGER, sku TEXT);
         INSERT INTO customers (name) VALUES ('ada');
         INSERT INTO orders (customer_id, status) VALUES (1, 'cancelled'), (1, 'open');
         INSERT INTO line_items (order_id, sku) VALUES (1, 'A-1'), (1, 'B-2'), (2, 'C-3');",
    )
    .unwrap();
    conn
}

struct Shop {
    keeper: ArchiveKeeper,
    customer: EntityRef,
    order: EntityRef,
    item: EntityRef,
}

fn shop(conn: &Connection) -> Shop {
    let customer = Entity::new("Customer", "customers").into_ref();
    let item = Entity::new("LineItem", "line_items").into_ref();
    let order = Entity::new("Order", "orders")
        .with_association(
            Association::has_many("items", "line_items", "order_id").dependent(Dependent::Destroy),
        )
        .with_association(
            Association::belongs_to("customer", "customers", "customer_id")
                .dependent(Dependent::Delete),
        )
        .into_ref();

    let mut builder = ArchiveContext::builder().with_clock(fixed_clock);
    builder
        .register(conn, &customer, &[], ArchiveOptions::default())
        .unwrap()
        .register(conn, &item, &[], ArchiveOptions::default())
        .unwrap()
        .register(conn, &order, &[], ArchiveOptions::default())
        .unwrap();

    Shop {
        keeper: ArchiveKeeper::new(builder.build()),
        customer,
        order,
        item,
    }
}

#[test]
fn test_registration_links_archived_children() {
    let conn = shop_db();
    let shop = shop(&conn);

    let configs = shop.keeper.context().registry().find(&shop.order);
    let destination = &configs[0].to[0];
    let items = destination.association("items").unwrap();
    assert_eq!(items.target_table, "archived_line_items");
    assert_eq!(items.foreign_key, "order_id");
    assert_eq!(destination.associations().len(), 2);

    // Nothing moved yet.
    assert_eq!(count(&conn, "archived_line_items"), 0);
}

#[test]
fn test_reader_follows_archived_associations() {
    let conn = shop_db();
    let shop = shop(&conn);

    shop.keeper
        .delete_all(&conn, &shop.item, Some(Predicate::eq("order_id", 1)))
        .unwrap();
    shop.keeper
        .delete_all(&conn, &shop.customer, None)
        .unwrap();
    let mut order = LiveRecord::persisted(shop.order.clone(), 1);
    assert!(shop.keeper.destroy(&conn, &mut order, &NoCallbacks).unwrap());

    let reader = shop.keeper.reader();
    let archived = reader.archived(&conn, &shop.order, 1).unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0]["status"], json!("cancelled"));
    assert_eq!(archived[0]["deleted_at"], json!(common::STAMP));

    let items = reader.related(&conn, &shop.order, "items", 1).unwrap();
    let skus: Vec<_> = items.iter().map(|row| row["sku"].clone()).collect();
    assert_eq!(skus, [json!("A-1"), json!("B-2")]);

    let owner = reader.related(&conn, &shop.order, "customer", 1).unwrap();
    assert_eq!(owner.len(), 1);
    assert_eq!(owner[0]["name"], json!("ada"));

    assert!(matches!(
        reader.related(&conn, &shop.order, "refunds", 1),
        Err(ArchiveError::Configuration(_))
    ));
}

#[test]
fn test_destroy_all_respects_veto() {
    struct KeepOpen;

    impl archive_keeper::DestroyCallbacks for KeepOpen {
        fn before_destroy(&self, record: &LiveRecord) -> bool {
            record.id() != Some(2)
        }
    }

    let conn = shop_db();
    let shop = shop(&conn);

    let destroyed = shop
        .keeper
        .destroy_all(&conn, &shop.order, None, &KeepOpen)
        .unwrap();

    assert_eq!(destroyed, 1);
    assert_eq!(count(&conn, "orders"), 1);
    assert_eq!(count(&conn, "archived_orders"), 1);

    let forced = shop
        .keeper
        .force_destroy_all(&conn, &shop.order, None, &archive_keeper::NoCallbacks)
        .unwrap();
    assert_eq!(forced, 1);
    assert_eq!(count(&conn, "orders"), 0);
    assert_eq!(count(&conn, "archived_orders"), 1);
}

#[test]
fn test_context_from_config_file() {
    let conn = shop_db();
    let config = KeeperConfig::from_toml_str(
        r#"
        [database]
        path = "shop.db"

        [[entities]]
        name = "LineItem"
        table = "line_items"

        [[entities]]
        name = "Order"
        table = "orders"
        destinations = ["order_history"]

        [entities.options]
        timestamps = true

        [[entities.associations]]
        name = "items"
        kind = "has_many"
        target_table = "line_items"
        foreign_key = "order_id"
        dependent = "destroy"
        "#,
    )
    .unwrap();

    let context = config.build_context(&conn).unwrap();
    let registry = context.registry();

    assert_eq!(registry.len(), 2);
    let order = registry.entity("Order").unwrap().clone();
    let configs = registry.find(&order);
    assert_eq!(configs[0].to[0].table(), "order_history");
    assert!(configs[0].options.timestamps);
    assert_eq!(
        configs[0].to[0].association("items").unwrap().target_table,
        "archived_line_items"
    );

    let keeper = ArchiveKeeper::new(context);
    keeper
        .delete_all(&conn, &order, Some(Predicate::raw("status = 'cancelled'")))
        .unwrap();
    assert_eq!(count(&conn, "order_history"), 1);
}
