//! Expense repository.
//!
//! A paid expense has exactly one matching entry in the cash log. Updates
//! drop and re-record that entry so amount, date and status stay in step.

use chrono::{NaiveDate, Utc};
use localfish_core::finance::{ExpenseStatus, TransactionType};
use localfish_core::sales::PaymentMethod;
use localfish_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::paginate;
use super::transaction::{NewTransaction, delete_for_reference, record};
use crate::entities::{expense_categories, expenses};

/// Expense fields, for both create and update.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    /// Category.
    pub category_id: Option<Uuid>,
    /// Short description.
    pub title: String,
    /// Amount, positive.
    pub amount: Decimal,
    /// Paid or still owed.
    pub payment_status: ExpenseStatus,
    /// How it was paid.
    pub payment_method: Option<PaymentMethod>,
    /// Business date.
    pub expense_date: NaiveDate,
    /// Free text.
    pub notes: Option<String>,
}

/// Filter for listing expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only this category.
    pub category_id: Option<Uuid>,
    /// Only paid or only pending expenses.
    pub status: Option<ExpenseStatus>,
    /// Only expenses on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Only expenses on or before this date.
    pub date_to: Option<NaiveDate>,
}

impl ExpenseInput {
    fn validate(&self) -> RepoResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(RepositoryError::validation(
                "Expense amount must be greater than zero",
            ));
        }
        Ok(())
    }
}

async fn ensure_category<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    category_id: Uuid,
) -> RepoResult<()> {
    let exists = expense_categories::Entity::find_by_id(category_id)
        .filter(expense_categories::Column::UserId.eq(business_id))
        .count(conn)
        .await?;
    if exists == 0 {
        return Err(RepositoryError::NotFound("Expense category"));
    }
    Ok(())
}

async fn record_if_paid<C: ConnectionTrait>(
    conn: &C,
    expense: &expenses::Model,
    recorded_by: Uuid,
) -> RepoResult<()> {
    if expense.payment_status != ExpenseStatus::Paid.as_str() {
        return Ok(());
    }
    record(
        conn,
        NewTransaction {
            business_id: expense.user_id,
            transaction_type: TransactionType::Expense,
            amount: expense.amount,
            description: Some(expense.title.clone()),
            reference_id: Some(expense.id),
            transaction_date: expense.expense_date,
            recorded_by,
        },
    )
    .await?;
    Ok(())
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        filter: ExpenseFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<expenses::Model>> {
        let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(business_id));

        if let Some(category_id) = filter.category_id {
            query = query.filter(expenses::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(expenses::Column::PaymentStatus.eq(status.as_str()));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(expenses::Column::ExpenseDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(expenses::Column::ExpenseDate.lte(date_to));
        }

        let query = query
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }

    /// Finds an expense of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such expense.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<expenses::Model> {
        expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Expense"))
    }

    /// Creates an expense and logs it when paid.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount and
    /// `RepositoryError::NotFound` for an unknown category.
    pub async fn create(
        &self,
        business_id: Uuid,
        recorded_by: Uuid,
        input: ExpenseInput,
    ) -> RepoResult<expenses::Model> {
        input.validate()?;

        let txn = self.db.begin().await?;
        if let Some(category_id) = input.category_id {
            ensure_category(&txn, business_id, category_id).await?;
        }

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            category_id: Set(input.category_id),
            title: Set(input.title.trim().to_string()),
            amount: Set(input.amount),
            payment_status: Set(input.payment_status.as_str().to_string()),
            payment_method: Set(input.payment_method.map(|m| m.as_str().to_string())),
            expense_date: Set(input.expense_date),
            receipt_url: Set(None),
            receipt_public_id: Set(None),
            notes: Set(input.notes),
            recorded_by: Set(recorded_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        record_if_paid(&txn, &expense, recorded_by).await?;
        txn.commit().await?;

        tracing::info!(expense_id = %expense.id, amount = %expense.amount, "Expense recorded");
        Ok(expense)
    }

    /// Replaces an expense's fields and re-records its cash log entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown expense or
    /// category.
    pub async fn update(
        &self,
        business_id: Uuid,
        id: Uuid,
        recorded_by: Uuid,
        input: ExpenseInput,
    ) -> RepoResult<expenses::Model> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let expense = expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(business_id))
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound("Expense"))?;
        if let Some(category_id) = input.category_id {
            ensure_category(&txn, business_id, category_id).await?;
        }

        let mut active: expenses::ActiveModel = expense.into();
        active.category_id = Set(input.category_id);
        active.title = Set(input.title.trim().to_string());
        active.amount = Set(input.amount);
        active.payment_status = Set(input.payment_status.as_str().to_string());
        active.payment_method = Set(input.payment_method.map(|m| m.as_str().to_string()));
        active.expense_date = Set(input.expense_date);
        active.notes = Set(input.notes);
        active.updated_at = Set(Utc::now().into());
        let expense = active.update(&txn).await?;

        delete_for_reference(&txn, business_id, expense.id).await?;
        record_if_paid(&txn, &expense, recorded_by).await?;
        txn.commit().await?;

        Ok(expense)
    }

    /// Stores the receipt and returns the public ID of the replaced one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such expense.
    pub async fn set_receipt(
        &self,
        business_id: Uuid,
        id: Uuid,
        url: String,
        public_id: String,
    ) -> RepoResult<(expenses::Model, Option<String>)> {
        let expense = self.find(business_id, id).await?;
        let previous = expense.receipt_public_id.clone();

        let mut active: expenses::ActiveModel = expense.into();
        active.receipt_url = Set(Some(url));
        active.receipt_public_id = Set(Some(public_id));
        active.updated_at = Set(Utc::now().into());

        Ok((active.update(&self.db).await?, previous))
    }

    /// Deletes an expense with its cash log entry. Returns the receipt's
    /// public ID so the caller can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such expense.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<Option<String>> {
        let txn = self.db.begin().await?;
        let expense = expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(business_id))
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound("Expense"))?;

        let receipt = expense.receipt_public_id.clone();
        delete_for_reference(&txn, business_id, expense.id).await?;
        expense.delete(&txn).await?;
        txn.commit().await?;

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn input(amount: Decimal, status: ExpenseStatus) -> ExpenseInput {
        ExpenseInput {
            category_id: None,
            title: "Ice blocks".to_string(),
            amount,
            payment_status: status,
            payment_method: Some(PaymentMethod::Cash),
            expense_date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            notes: None,
        }
    }

    fn model(business_id: Uuid, input: &ExpenseInput) -> expenses::Model {
        let now = Utc::now().into();
        expenses::Model {
            id: Uuid::new_v4(),
            user_id: business_id,
            category_id: input.category_id,
            title: input.title.clone(),
            amount: input.amount,
            payment_status: input.payment_status.as_str().to_string(),
            payment_method: input.payment_method.map(|m| m.as_str().to_string()),
            expense_date: input.expense_date,
            receipt_url: None,
            receipt_public_id: None,
            notes: None,
            recorded_by: business_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let business = Uuid::new_v4();

        let err = ExpenseRepository::new(db)
            .create(business, business, input(dec!(0), ExpenseStatus::Paid))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_pending_expense_skips_cash_log() {
        let business = Uuid::new_v4();
        let pending = input(dec!(40), ExpenseStatus::Pending);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(business, &pending)]])
            .into_connection();

        let expense = ExpenseRepository::new(db)
            .create(business, business, pending)
            .await
            .unwrap();
        assert_eq!(expense.payment_status, "pending");
    }
}
