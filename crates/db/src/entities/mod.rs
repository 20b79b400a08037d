//! `SeaORM` entities, one module per table.
//!
//! Enumerated columns (`payment_status`, `movement_type`, ...) are stored as
//! VARCHAR with a CHECK constraint and mapped to the domain enums in
//! `localfish_core` by the repositories.

pub mod prelude;

pub mod contacts;
pub mod deposits;
pub mod expense_categories;
pub mod expenses;
pub mod product_categories;
pub mod products;
pub mod sales;
pub mod stock_additions;
pub mod stock_corrections;
pub mod stock_movements;
pub mod transactions;
pub mod users;
pub mod workers;
