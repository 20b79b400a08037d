//! Indexes for the report queries.
//!
//! Every report filters one business's rows by a date range, so each table
//! the reports read gets a `(user_id, <date column>)` index.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INDEXES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_INDEXES_SQL).await?;
        Ok(())
    }
}

const INDEXES_SQL: &str = r"
CREATE INDEX idx_sales_user_date ON sales(user_id, sale_date DESC);
CREATE INDEX idx_sales_product ON sales(product_id);
CREATE INDEX idx_sales_outstanding ON sales(user_id) WHERE payment_status <> 'paid';
CREATE INDEX idx_expenses_user_date ON expenses(user_id, expense_date DESC);
CREATE INDEX idx_expenses_category ON expenses(category_id);
CREATE INDEX idx_deposits_user_date ON deposits(user_id, deposit_date DESC);
CREATE INDEX idx_transactions_user_date ON transactions(user_id, transaction_date DESC);
CREATE INDEX idx_stock_movements_user_date ON stock_movements(user_id, created_at DESC);
";

const DROP_INDEXES_SQL: &str = r"
DROP INDEX IF EXISTS idx_sales_user_date;
DROP INDEX IF EXISTS idx_sales_product;
DROP INDEX IF EXISTS idx_sales_outstanding;
DROP INDEX IF EXISTS idx_expenses_user_date;
DROP INDEX IF EXISTS idx_expenses_category;
DROP INDEX IF EXISTS idx_deposits_user_date;
DROP INDEX IF EXISTS idx_transactions_user_date;
DROP INDEX IF EXISTS idx_stock_movements_user_date;
";
