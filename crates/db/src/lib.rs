//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - A time-boxed cache of the database handle

pub mod entities;
pub mod migration;
pub mod pool;
pub mod repositories;

pub use pool::ConnectionCache;
pub use repositories::{
    AddStockInput, CategoryInput, ContactFilter, ContactInput, ContactRepository,
    CorrectStockInput, CreateDepositInput, CreateProductInput, CreateSaleInput, CreateUserInput,
    CreateWorkerInput, DepositFilter, DepositRepository, ExpenseCategoryRepository, ExpenseFilter,
    ExpenseInput, ExpenseRepository, MovementFilter, NewTransaction, ProductCategoryRepository,
    ProductFilter, ProductRepository, RecordPaymentInput, RepoResult, RepositoryError,
    ReportRepository, SaleFilter, SaleRepository, StockRepository, TransactionFilter,
    TransactionRepository, UpdateProductInput, UpdateWorkerInput, UserRepository,
    WorkerRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
