pub mod favorite;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

use chrono::Utc;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Schema, Set,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{
    favorite::Entity as Favorite, order::Entity as Order, order_item::Entity as OrderItem,
    product::Entity as Product, user::Entity as User,
};

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
        schema.create_table_from_entity(Favorite),
    ];
    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    let indexes = [
        schema.create_index_from_entity(Product),
        schema.create_index_from_entity(Order),
        schema.create_index_from_entity(OrderItem),
        schema.create_index_from_entity(Favorite),
    ];
    for mut index in indexes.into_iter().flatten() {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}

/// Fills an empty database with a small demo catalog, three users and two
/// orders. Does nothing when any user already exists.
pub async fn seed_sample_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    if User::find().count(db).await? > 0 {
        info!("Database already populated, skipping seed");
        return Ok(());
    }

    let now = Utc::now();
    let password = user::hash_password("password123").map_err(DbErr::Custom)?;

    let users = [
        ("John Doe", "john.doe@example.com"),
        ("Jane Smith", "jane.smith@example.com"),
        ("Bob Johnson", "bob.johnson@example.com"),
    ]
    .into_iter()
    .map(|(name, email)| user::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email.to_owned()),
        password: Set(password.clone()),
        created_at: Set(now),
        ..Default::default()
    });

    let products = SAMPLE_PRODUCTS
        .iter()
        .map(|(name, price, category, description)| product::ActiveModel {
            name: Set((*name).to_owned()),
            price: Set(*price),
            category: Set((*category).to_owned()),
            image: Set(None),
            description: Set(Some((*description).to_owned())),
            created_at: Set(now),
            ..Default::default()
        });

    let orders = [(1, 63.98, order::Status::Pending), (2, 91.97, order::Status::Completed)]
        .into_iter()
        .map(|(user_id, total, status)| order::ActiveModel {
            user_id: Set(user_id),
            total: Set(total),
            status: Set(status),
            created_at: Set(now),
            ..Default::default()
        });

    let order_items = [
        (1, 7, 59.99),
        (1, 1, 3.99),
        (2, 14, 39.99),
        (2, 15, 49.99),
        (2, 2, 2.49),
    ]
    .into_iter()
    .map(|(order_id, product_id, price)| order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(product_id),
        quantity: Set(1),
        price: Set(price),
        created_at: Set(now),
        ..Default::default()
    });

    let txn = db.begin().await?;
    User::insert_many(users).exec(&txn).await?;
    Product::insert_many(products).exec(&txn).await?;
    Order::insert_many(orders).exec(&txn).await?;
    OrderItem::insert_many(order_items).exec(&txn).await?;
    txn.commit().await?;

    info!(products = SAMPLE_PRODUCTS.len(), "Seeded sample data");
    Ok(())
}

const SAMPLE_PRODUCTS: [(&str, f64, &str, &str); 18] = [
    ("Fresh Apples", 3.99, "groceries", "Fresh red apples"),
    ("Whole Milk", 2.49, "groceries", "Fresh whole milk"),
    ("White Bread", 1.99, "groceries", "Soft white bread"),
    ("Orange Juice", 4.29, "groceries", "Fresh orange juice"),
    ("Pasta", 1.79, "groceries", "Italian pasta"),
    ("Rice", 5.99, "groceries", "Long grain rice"),
    ("Wireless Headphones", 59.99, "electronics", "Bluetooth headphones"),
    ("Smart Watch", 199.99, "electronics", "Fitness smart watch"),
    ("Laptop Mouse", 15.99, "electronics", "Wireless mouse"),
    ("USB Cable", 9.99, "electronics", "Type-C USB cable"),
    ("Phone Case", 12.99, "electronics", "Protective phone case"),
    ("Power Bank", 24.99, "electronics", "10000mAh power bank"),
    ("Blue T-Shirt", 19.99, "dress", "Cotton blue t-shirt"),
    ("Black Jeans", 39.99, "dress", "Slim fit black jeans"),
    ("White Sneakers", 49.99, "dress", "Casual white sneakers"),
    ("Summer Dress", 34.99, "dress", "Floral summer dress"),
    ("Leather Jacket", 89.99, "dress", "Black leather jacket"),
    ("Winter Coat", 79.99, "dress", "Warm winter coat"),
];
