//! Entity re-exports.

pub use super::contacts::Entity as Contacts;
pub use super::deposits::Entity as Deposits;
pub use super::expense_categories::Entity as ExpenseCategories;
pub use super::expenses::Entity as Expenses;
pub use super::product_categories::Entity as ProductCategories;
pub use super::products::Entity as Products;
pub use super::sales::Entity as Sales;
pub use super::stock_additions::Entity as StockAdditions;
pub use super::stock_corrections::Entity as StockCorrections;
pub use super::stock_movements::Entity as StockMovements;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
pub use super::workers::Entity as Workers;
