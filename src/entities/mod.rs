//! Typed SeaORM entities for the store schema.
//!
//! The admin API works on any table through the catalog, but the store
//! tables themselves are modelled here so the seed data and tests can use
//! typed models.

pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod supplier;

pub mod prelude {
    pub use super::customer::Entity as Customer;
    pub use super::order::Entity as Order;
    pub use super::order_item::Entity as OrderItem;
    pub use super::product::Entity as Product;
    pub use super::review::Entity as Review;
    pub use super::supplier::Entity as Supplier;
}
