//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every query is scoped to one business (`user_id` of the owning account).

pub mod contact;
pub mod deposit;
pub mod error;
pub mod expense;
pub mod expense_category;
pub mod product;
pub mod product_category;
pub mod report;
pub mod sale;
pub mod stock;
pub mod transaction;
pub mod user;
pub mod worker;

pub use contact::{ContactFilter, ContactInput, ContactRepository};
pub use deposit::{CreateDepositInput, DepositFilter, DepositRepository};
pub use error::{RepoResult, RepositoryError, db_error, is_connection_error};
pub use expense::{ExpenseFilter, ExpenseInput, ExpenseRepository};
pub use expense_category::ExpenseCategoryRepository;
pub use product::{CreateProductInput, ProductFilter, ProductRepository, UpdateProductInput};
pub use product_category::{CategoryInput, ProductCategoryRepository};
pub use report::ReportRepository;
pub use sale::{CreateSaleInput, RecordPaymentInput, SaleFilter, SaleRepository};
pub use stock::{AddStockInput, CorrectStockInput, MovementFilter, StockRepository};
pub use transaction::{NewTransaction, TransactionFilter, TransactionRepository};
pub use user::{CreateUserInput, UserRepository};
pub use worker::{CreateWorkerInput, UpdateWorkerInput, WorkerRepository};

use localfish_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, QuerySelect, Select,
};

/// Runs a list query one page at a time.
pub(crate) async fn paginate<E>(
    db: &DatabaseConnection,
    query: Select<E>,
    page: PageRequest,
) -> RepoResult<PageResponse<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let total = query.clone().count(db).await?;
    let items = query
        .offset(page.offset())
        .limit(page.limit())
        .all(db)
        .await?;
    Ok(PageResponse::new(items, page, total))
}

/// Parses an enumerated column into its domain type.
pub(crate) fn decode<T>(
    column: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value).ok_or_else(|| RepositoryError::corrupt(column, value))
}

/// Pattern for a case-insensitive substring match.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
