//! Store schema bootstrap.
//!
//! Creates the six store tables when they are missing and seeds the fixed
//! sample rows. Both steps are idempotent and run in one transaction.

mod seed;
mod tables;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

pub use seed::{
    remove_sample_data, sample_customers, sample_order_items, sample_orders, sample_products,
    sample_reviews, sample_suppliers, seed_sample_data, SeededTable,
};
pub use tables::{
    create_table_statements, drop_table_statements, Customers, OrderItems, Orders, Products,
    Reviews, Suppliers, STORE_TABLES,
};

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BootstrapReport {
    /// Tables ensured, in creation order
    pub tables: Vec<String>,
    /// Rows written per table; zero when the row was already present
    pub seeded: Vec<SeededTable>,
}

impl BootstrapReport {
    pub fn total_inserted(&self) -> u64 {
        self.seeded.iter().map(|t| t.inserted).sum()
    }
}

/// Creates missing tables and inserts missing sample rows.
///
/// Safe against an empty, partially seeded or fully seeded database.
pub async fn bootstrap(db: &DatabaseConnection) -> Result<BootstrapReport, DbErr> {
    let txn = db.begin().await?;
    let backend = txn.get_database_backend();

    for stmt in create_table_statements() {
        txn.execute(backend.build(&stmt)).await?;
    }
    let seeded = seed_sample_data(&txn).await?;

    txn.commit().await?;

    let report = BootstrapReport {
        tables: STORE_TABLES.iter().map(|t| t.to_string()).collect(),
        seeded,
    };
    info!(
        tables = report.tables.len(),
        inserted = report.total_inserted(),
        "Store schema bootstrapped"
    );
    Ok(report)
}
