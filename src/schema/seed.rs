use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait,
    DbBackend, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryTrait, Statement,
};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::entities::{customer, order, order_item, product, review, supplier};

const SEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rows written by one seed pass for a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SeededTable {
    pub table: String,
    pub inserted: u64,
}

fn at(value: &str) -> Result<NaiveDateTime, DbErr> {
    NaiveDateTime::parse_from_str(value, SEED_TIMESTAMP_FORMAT)
        .map_err(|e| DbErr::Custom(format!("invalid seed timestamp {value}: {e}")))
}

pub fn sample_customers() -> Result<Vec<customer::Model>, DbErr> {
    Ok(vec![
        customer::Model {
            id: 1,
            name: "Ivan Petrov".to_string(),
            email: "ivan.petrov@example.com".to_string(),
            phone: Some("+7-900-123-45-67".to_string()),
            is_active: true,
            registered_at: at("2024-01-15 10:00:00")?,
        },
        customer::Model {
            id: 2,
            name: "Maria Sidorova".to_string(),
            email: "maria.sidorova@example.com".to_string(),
            phone: Some("+7-900-234-56-78".to_string()),
            is_active: true,
            registered_at: at("2024-02-20 14:30:00")?,
        },
        customer::Model {
            id: 3,
            name: "Alexey Smirnov".to_string(),
            email: "alexey.smirnov@example.com".to_string(),
            phone: Some("+7-900-345-67-89".to_string()),
            is_active: false,
            registered_at: at("2024-03-05 09:15:00")?,
        },
    ])
}

pub fn sample_products() -> Vec<product::Model> {
    vec![
        product::Model {
            id: 1,
            name: "Laptop".to_string(),
            description: Some("15-inch laptop, 16 GB RAM".to_string()),
            price: dec!(74999.99),
            weight: Some(dec!(2.100)),
            stock_quantity: 10,
            is_available: true,
        },
        product::Model {
            id: 2,
            name: "Wireless Mouse".to_string(),
            description: Some("Compact optical mouse with USB receiver".to_string()),
            price: dec!(1499.50),
            weight: Some(dec!(0.085)),
            stock_quantity: 150,
            is_available: true,
        },
        product::Model {
            id: 3,
            name: "Mechanical Keyboard".to_string(),
            description: Some("Full-size keyboard with brown switches".to_string()),
            price: dec!(5990.00),
            weight: Some(dec!(0.950)),
            stock_quantity: 40,
            is_available: true,
        },
        product::Model {
            id: 4,
            name: "27-inch Monitor".to_string(),
            description: Some("IPS panel, 2560x1440".to_string()),
            price: dec!(23990.00),
            weight: Some(dec!(5.400)),
            stock_quantity: 0,
            is_available: false,
        },
    ]
}

pub fn sample_orders() -> Result<Vec<order::Model>, DbErr> {
    let moscow = "Moscow, Tverskaya st. 1";
    Ok(vec![
        order::Model {
            id: 1,
            customer_id: 1,
            order_date: at("2024-04-01 12:00:00")?,
            total_amount: dec!(76499.49),
            is_paid: true,
            is_delivered: true,
            delivery_address: Some(moscow.to_string()),
        },
        order::Model {
            id: 2,
            customer_id: 2,
            order_date: at("2024-04-03 16:45:00")?,
            total_amount: dec!(11980.00),
            is_paid: true,
            is_delivered: false,
            delivery_address: Some("Saint Petersburg, Nevsky pr. 10".to_string()),
        },
        order::Model {
            id: 3,
            customer_id: 1,
            order_date: at("2024-04-10 09:30:00")?,
            total_amount: dec!(1499.50),
            is_paid: false,
            is_delivered: false,
            delivery_address: Some(moscow.to_string()),
        },
    ])
}

/// `line_total` is left as `None`; the database computes it.
pub fn sample_order_items() -> Vec<order_item::Model> {
    let item = |id, order_id, product_id, quantity, unit_price: Decimal| order_item::Model {
        id,
        order_id,
        product_id,
        quantity,
        unit_price,
        line_total: None,
    };
    vec![
        item(1, 1, 1, 1, dec!(74999.99)),
        item(2, 1, 2, 1, dec!(1499.50)),
        item(3, 2, 3, 2, dec!(5990.00)),
        item(4, 3, 2, 1, dec!(1499.50)),
    ]
}

pub fn sample_reviews() -> Result<Vec<review::Model>, DbErr> {
    Ok(vec![
        review::Model {
            id: 1,
            product_id: 1,
            customer_id: 1,
            rating: 5,
            comment: Some("Fast and quiet, great screen.".to_string()),
            reviewed_at: at("2024-04-05 18:20:00")?,
            is_approved: true,
        },
        review::Model {
            id: 2,
            product_id: 3,
            customer_id: 2,
            rating: 4,
            comment: Some("Pleasant keys, a bit loud.".to_string()),
            reviewed_at: at("2024-04-08 11:05:00")?,
            is_approved: true,
        },
        review::Model {
            id: 3,
            product_id: 2,
            customer_id: 1,
            rating: 3,
            comment: Some("Works, but the scroll wheel squeaks.".to_string()),
            reviewed_at: at("2024-04-12 20:40:00")?,
            is_approved: false,
        },
    ])
}

pub fn sample_suppliers() -> Vec<supplier::Model> {
    vec![
        supplier::Model {
            id: 1,
            company_name: "TechSupply LLC".to_string(),
            contact_person: Some("Oleg Ivanov".to_string()),
            phone: Some("+7-495-111-22-33".to_string()),
            email: Some("sales@techsupply.example".to_string()),
            is_active: true,
        },
        supplier::Model {
            id: 2,
            company_name: "Periphery Trade".to_string(),
            contact_person: Some("Anna Kuznetsova".to_string()),
            phone: Some("+7-495-444-55-66".to_string()),
            email: Some("info@periphery.example".to_string()),
            is_active: true,
        },
    ]
}

/// Inserts `models` with `ON CONFLICT (id) DO NOTHING` and returns how many
/// rows were actually written.
async fn insert_missing<C, A>(
    db: &C,
    table: &str,
    id_column: <A::Entity as EntityTrait>::Column,
    models: Vec<A>,
) -> Result<SeededTable, DbErr>
where
    C: ConnectionTrait,
    A: ActiveModelTrait,
{
    let stmt = <A::Entity as EntityTrait>::insert_many(models)
        .on_conflict(OnConflict::column(id_column).do_nothing().to_owned())
        .build(db.get_database_backend());
    let inserted = db.execute(stmt).await?.rows_affected();
    debug!(table, inserted, "Seeded table");
    Ok(SeededTable {
        table: table.to_string(),
        inserted,
    })
}

/// Moves each serial sequence past the highest id so that inserts without an
/// explicit id do not collide with seeded rows. PostgreSQL only.
async fn sync_sequences<C: ConnectionTrait>(db: &C, tables: &[&str]) -> Result<(), DbErr> {
    if db.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    for table in tables {
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
             COALESCE((SELECT MAX(id) FROM \"{table}\"), 0) + 1, false)"
        );
        db.execute(Statement::from_string(DbBackend::Postgres, sql))
            .await?;
    }
    Ok(())
}

/// Inserts the fixed sample rows. Rows whose id is already present are left
/// untouched, so this is safe to run any number of times.
pub async fn seed_sample_data<C: ConnectionTrait>(db: &C) -> Result<Vec<SeededTable>, DbErr> {
    let customers: Vec<customer::ActiveModel> = sample_customers()?
        .into_iter()
        .map(Into::into)
        .collect();
    let products: Vec<product::ActiveModel> =
        sample_products().into_iter().map(Into::into).collect();
    let suppliers: Vec<supplier::ActiveModel> =
        sample_suppliers().into_iter().map(Into::into).collect();
    let orders: Vec<order::ActiveModel> = sample_orders()?.into_iter().map(Into::into).collect();
    let order_items: Vec<order_item::ActiveModel> = sample_order_items()
        .into_iter()
        .map(|model| {
            let mut active = model.into_active_model();
            active.line_total = NotSet;
            active
        })
        .collect();
    let reviews: Vec<review::ActiveModel> =
        sample_reviews()?.into_iter().map(Into::into).collect();

    let report = vec![
        insert_missing(db, "customers", customer::Column::Id, customers).await?,
        insert_missing(db, "products", product::Column::Id, products).await?,
        insert_missing(db, "suppliers", supplier::Column::Id, suppliers).await?,
        insert_missing(db, "orders", order::Column::Id, orders).await?,
        insert_missing(db, "order_items", order_item::Column::Id, order_items).await?,
        insert_missing(db, "reviews", review::Column::Id, reviews).await?,
    ];

    let tables: Vec<&str> = report.iter().map(|t| t.table.as_str()).collect();
    sync_sequences(db, &tables).await?;

    let total: u64 = report.iter().map(|t| t.inserted).sum();
    info!(inserted = total, "Sample data seeded");
    Ok(report)
}

/// Deletes the sample rows by id, dependents first.
pub async fn remove_sample_data<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let ids = |n: i32| (1..=n).collect::<Vec<_>>();
    review::Entity::delete_many()
        .filter(review::Column::Id.is_in(ids(3)))
        .exec(db)
        .await?;
    order_item::Entity::delete_many()
        .filter(order_item::Column::Id.is_in(ids(4)))
        .exec(db)
        .await?;
    order::Entity::delete_many()
        .filter(order::Column::Id.is_in(ids(3)))
        .exec(db)
        .await?;
    supplier::Entity::delete_many()
        .filter(supplier::Column::Id.is_in(ids(2)))
        .exec(db)
        .await?;
    product::Entity::delete_many()
        .filter(product::Column::Id.is_in(ids(4)))
        .exec(db)
        .await?;
    customer::Entity::delete_many()
        .filter(customer::Column::Id.is_in(ids(3)))
        .exec(db)
        .await?;
    Ok(())
}
