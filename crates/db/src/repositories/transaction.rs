//! Transaction repository: the business's cash log.
//!
//! Rows are written by the other repositories, inside the same database
//! transaction as the sale, expense, deposit or stock addition they
//! describe. The log itself is read-only from the API.

use chrono::{NaiveDate, Utc};
use localfish_core::finance::TransactionType;
use localfish_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::paginate;
use crate::entities::transactions;

/// Filter for listing the cash log.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only entries of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only entries on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Only entries on or before this date.
    pub date_to: Option<NaiveDate>,
}

/// A cash log entry to record.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owning business.
    pub business_id: Uuid,
    /// Entry type.
    pub transaction_type: TransactionType,
    /// Amount, must be positive.
    pub amount: Decimal,
    /// Free text shown in the log.
    pub description: Option<String>,
    /// Row the entry belongs to (sale, expense, deposit, stock addition).
    pub reference_id: Option<Uuid>,
    /// Business date.
    pub transaction_date: NaiveDate,
    /// Account that caused the entry.
    pub recorded_by: Uuid,
}

/// Inserts a cash log entry on the given connection or transaction.
pub(crate) async fn record<C: ConnectionTrait>(
    conn: &C,
    entry: NewTransaction,
) -> RepoResult<transactions::Model> {
    if entry.amount <= Decimal::ZERO {
        return Err(RepositoryError::validation(
            "Transaction amount must be greater than zero",
        ));
    }

    let row = transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(entry.business_id),
        transaction_type: Set(entry.transaction_type.as_str().to_string()),
        amount: Set(entry.amount),
        description: Set(entry.description),
        reference_id: Set(entry.reference_id),
        transaction_date: Set(entry.transaction_date),
        recorded_by: Set(entry.recorded_by),
        created_at: Set(Utc::now().into()),
    };
    Ok(row.insert(conn).await?)
}

/// Deletes every cash log entry that points at the given row.
pub(crate) async fn delete_for_reference<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    reference_id: Uuid,
) -> RepoResult<u64> {
    let result = transactions::Entity::delete_many()
        .filter(transactions::Column::UserId.eq(business_id))
        .filter(transactions::Column::ReferenceId.eq(reference_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the cash log, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<transactions::Model>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(business_id));

        if let Some(kind) = filter.transaction_type {
            query = query.filter(transactions::Column::TransactionType.eq(kind.as_str()));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(transactions::Column::TransactionDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(transactions::Column::TransactionDate.lte(date_to));
        }

        let query = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }

    /// Records an entry outside of any other write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a non-positive amount.
    pub async fn record(&self, entry: NewTransaction) -> RepoResult<transactions::Model> {
        record(&self.db, entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn entry(amount: Decimal) -> NewTransaction {
        let business = Uuid::new_v4();
        NewTransaction {
            business_id: business,
            transaction_type: TransactionType::Expense,
            amount,
            description: Some("Ice".to_string()),
            reference_id: Some(Uuid::new_v4()),
            transaction_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            recorded_by: business,
        }
    }

    fn model_for(entry: &NewTransaction) -> transactions::Model {
        transactions::Model {
            id: Uuid::new_v4(),
            user_id: entry.business_id,
            transaction_type: entry.transaction_type.as_str().to_string(),
            amount: entry.amount,
            description: entry.description.clone(),
            reference_id: entry.reference_id,
            transaction_date: entry.transaction_date,
            recorded_by: entry.recorded_by,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_record_rejects_non_positive_amount() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = record(&db, entry(dec!(0))).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let err = record(&db, entry(dec!(-5))).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_record_inserts_entry() {
        let new = entry(dec!(12.50));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model_for(&new)]])
            .into_connection();

        let row = TransactionRepository::new(db).record(new).await.unwrap();
        assert_eq!(row.amount, dec!(12.50));
        assert_eq!(row.transaction_type, "expense");
    }

    #[tokio::test]
    async fn test_delete_for_reference_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let deleted = delete_for_reference(&db, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(deleted, 2);
    }
}
