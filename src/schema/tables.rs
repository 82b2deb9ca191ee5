use sea_orm_migration::prelude::*;

use crate::entities::review::{MAX_RATING, MIN_RATING};

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    IsActive,
    RegisteredAt,
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Name,
    Description,
    Price,
    Weight,
    StockQuantity,
    IsAvailable,
}

#[derive(DeriveIden)]
pub enum Suppliers {
    Table,
    Id,
    CompanyName,
    ContactPerson,
    Phone,
    Email,
    IsActive,
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    CustomerId,
    OrderDate,
    TotalAmount,
    IsPaid,
    IsDelivered,
    DeliveryAddress,
}

#[derive(DeriveIden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    Quantity,
    UnitPrice,
    LineTotal,
}

#[derive(DeriveIden)]
pub enum Reviews {
    Table,
    Id,
    ProductId,
    CustomerId,
    Rating,
    Comment,
    ReviewedAt,
    IsApproved,
}

/// Store tables in creation order. Every table only references tables that
/// appear before it.
pub const STORE_TABLES: [&str; 6] = [
    "customers",
    "products",
    "suppliers",
    "orders",
    "order_items",
    "reviews",
];

fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn customers() -> TableCreateStatement {
    Table::create()
        .table(Customers::Table)
        .if_not_exists()
        .col(id_column(Customers::Id))
        .col(ColumnDef::new(Customers::Name).string_len(100).not_null())
        .col(
            ColumnDef::new(Customers::Email)
                .string_len(150)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Customers::Phone).string_len(20))
        .col(
            ColumnDef::new(Customers::IsActive)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(Customers::RegisteredAt)
                .timestamp()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned()
}

fn products() -> TableCreateStatement {
    Table::create()
        .table(Products::Table)
        .if_not_exists()
        .col(id_column(Products::Id))
        .col(ColumnDef::new(Products::Name).string_len(200).not_null())
        .col(ColumnDef::new(Products::Description).text())
        .col(ColumnDef::new(Products::Price).decimal_len(10, 2).not_null())
        .col(ColumnDef::new(Products::Weight).decimal_len(8, 3))
        .col(
            ColumnDef::new(Products::StockQuantity)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Products::IsAvailable)
                .boolean()
                .not_null()
                .default(true),
        )
        .to_owned()
}

fn suppliers() -> TableCreateStatement {
    Table::create()
        .table(Suppliers::Table)
        .if_not_exists()
        .col(id_column(Suppliers::Id))
        .col(
            ColumnDef::new(Suppliers::CompanyName)
                .string_len(200)
                .not_null(),
        )
        .col(ColumnDef::new(Suppliers::ContactPerson).string_len(100))
        .col(ColumnDef::new(Suppliers::Phone).string_len(20))
        .col(ColumnDef::new(Suppliers::Email).string_len(150))
        .col(
            ColumnDef::new(Suppliers::IsActive)
                .boolean()
                .not_null()
                .default(true),
        )
        .to_owned()
}

fn orders() -> TableCreateStatement {
    Table::create()
        .table(Orders::Table)
        .if_not_exists()
        .col(id_column(Orders::Id))
        .col(ColumnDef::new(Orders::CustomerId).integer().not_null())
        .col(
            ColumnDef::new(Orders::OrderDate)
                .timestamp()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Orders::TotalAmount)
                .decimal_len(12, 2)
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Orders::IsPaid)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(Orders::IsDelivered)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(Orders::DeliveryAddress).text())
        .foreign_key(
            ForeignKey::create()
                .name("fk_orders_customer")
                .from(Orders::Table, Orders::CustomerId)
                .to(Customers::Table, Customers::Id),
        )
        .to_owned()
}

fn order_items() -> TableCreateStatement {
    Table::create()
        .table(OrderItems::Table)
        .if_not_exists()
        .col(id_column(OrderItems::Id))
        .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
        .col(ColumnDef::new(OrderItems::ProductId).integer().not_null())
        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
        .col(
            ColumnDef::new(OrderItems::UnitPrice)
                .decimal_len(10, 2)
                .not_null(),
        )
        .col(
            ColumnDef::new(OrderItems::LineTotal)
                .decimal_len(12, 2)
                .extra("GENERATED ALWAYS AS (quantity * unit_price) STORED"),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_order_items_order")
                .from(OrderItems::Table, OrderItems::OrderId)
                .to(Orders::Table, Orders::Id),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_order_items_product")
                .from(OrderItems::Table, OrderItems::ProductId)
                .to(Products::Table, Products::Id),
        )
        .to_owned()
}

fn reviews() -> TableCreateStatement {
    Table::create()
        .table(Reviews::Table)
        .if_not_exists()
        .col(id_column(Reviews::Id))
        .col(ColumnDef::new(Reviews::ProductId).integer().not_null())
        .col(ColumnDef::new(Reviews::CustomerId).integer().not_null())
        .col(
            ColumnDef::new(Reviews::Rating)
                .integer()
                .not_null()
                .check(Expr::col(Reviews::Rating).between(MIN_RATING, MAX_RATING)),
        )
        .col(ColumnDef::new(Reviews::Comment).text())
        .col(
            ColumnDef::new(Reviews::ReviewedAt)
                .timestamp()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Reviews::IsApproved)
                .boolean()
                .not_null()
                .default(false),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_reviews_product")
                .from(Reviews::Table, Reviews::ProductId)
                .to(Products::Table, Products::Id),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_reviews_customer")
                .from(Reviews::Table, Reviews::CustomerId)
                .to(Customers::Table, Customers::Id),
        )
        .to_owned()
}

/// `CREATE TABLE IF NOT EXISTS` for every store table, in dependency order.
pub fn create_table_statements() -> Vec<TableCreateStatement> {
    vec![
        customers(),
        products(),
        suppliers(),
        orders(),
        order_items(),
        reviews(),
    ]
}

/// `DROP TABLE IF EXISTS` for every store table, dependents first.
pub fn drop_table_statements() -> Vec<TableDropStatement> {
    STORE_TABLES
        .iter()
        .rev()
        .map(|name| Table::drop().table(Alias::new(*name)).if_exists().to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{DbBackend, Statement};

    fn render(backend: DbBackend, stmt: &TableCreateStatement) -> String {
        let Statement { sql, .. } = backend.build(stmt);
        sql
    }

    #[test]
    fn statements_follow_dependency_order() {
        let statements = create_table_statements();
        assert_eq!(statements.len(), STORE_TABLES.len());
        for (stmt, name) in statements.iter().zip(STORE_TABLES) {
            let sql = render(DbBackend::Postgres, stmt);
            let quoted = format!("CREATE TABLE IF NOT EXISTS \"{name}\"");
            assert!(sql.starts_with(&quoted), "{sql}");
        }
    }

    #[test]
    fn every_statement_is_guarded() {
        for stmt in create_table_statements() {
            let sql = render(DbBackend::Postgres, &stmt);
            assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"), "{sql}");
        }
    }

    #[test]
    fn reviews_carry_rating_check() {
        let sql = render(DbBackend::Postgres, &reviews());
        assert!(sql.contains("CHECK"), "{sql}");
        assert!(sql.contains("BETWEEN 1 AND 5"), "{sql}");
    }

    #[test]
    fn line_total_is_generated() {
        let sql = render(DbBackend::Postgres, &order_items());
        assert!(
            sql.contains("GENERATED ALWAYS AS (quantity * unit_price) STORED"),
            "{sql}"
        );
    }

    #[test]
    fn drops_run_dependents_first() {
        let drops = drop_table_statements();
        let sql = DbBackend::Postgres.build(&drops[0]).sql;
        assert!(sql.contains("\"reviews\""), "{sql}");
        let sql = DbBackend::Postgres.build(&drops[5]).sql;
        assert!(sql.contains("\"customers\""), "{sql}");
    }
}
