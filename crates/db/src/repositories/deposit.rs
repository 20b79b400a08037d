//! Deposit repository: cash moved to a bank or mobile money account.

use chrono::{NaiveDate, Utc};
use localfish_core::finance::{DepositType, TransactionType};
use localfish_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::paginate;
use super::transaction::{NewTransaction, delete_for_reference, record};
use crate::entities::deposits;

/// Input for recording a deposit.
#[derive(Debug, Clone)]
pub struct CreateDepositInput {
    /// Where the cash went.
    pub deposit_type: DepositType,
    /// Amount, positive.
    pub amount: Decimal,
    /// Account or wallet name.
    pub account_name: Option<String>,
    /// Bank slip or transfer reference.
    pub reference: Option<String>,
    /// Business date.
    pub deposit_date: NaiveDate,
    /// Free text.
    pub notes: Option<String>,
}

/// Filter for listing deposits.
#[derive(Debug, Clone, Default)]
pub struct DepositFilter {
    /// Only this deposit type.
    pub deposit_type: Option<DepositType>,
    /// Only deposits on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Only deposits on or before this date.
    pub date_to: Option<NaiveDate>,
}

/// Deposit repository.
#[derive(Debug, Clone)]
pub struct DepositRepository {
    db: DatabaseConnection,
}

impl DepositRepository {
    /// Creates a new deposit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists deposits, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        filter: DepositFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<deposits::Model>> {
        let mut query = deposits::Entity::find().filter(deposits::Column::UserId.eq(business_id));

        if let Some(kind) = filter.deposit_type {
            query = query.filter(deposits::Column::DepositType.eq(kind.as_str()));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(deposits::Column::DepositDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(deposits::Column::DepositDate.lte(date_to));
        }

        let query = query
            .order_by_desc(deposits::Column::DepositDate)
            .order_by_desc(deposits::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }

    /// Finds a deposit of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such deposit.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<deposits::Model> {
        deposits::Entity::find_by_id(id)
            .filter(deposits::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Deposit"))
    }

    /// Records a deposit and its cash log entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount.
    pub async fn create(
        &self,
        business_id: Uuid,
        recorded_by: Uuid,
        input: CreateDepositInput,
    ) -> RepoResult<deposits::Model> {
        if input.amount <= Decimal::ZERO {
            return Err(RepositoryError::validation(
                "Deposit amount must be greater than zero",
            ));
        }

        let txn = self.db.begin().await?;

        let deposit = deposits::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            deposit_type: Set(input.deposit_type.as_str().to_string()),
            amount: Set(input.amount),
            account_name: Set(input.account_name),
            reference: Set(input.reference),
            deposit_date: Set(input.deposit_date),
            proof_url: Set(None),
            proof_public_id: Set(None),
            notes: Set(input.notes),
            recorded_by: Set(recorded_by),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        record(
            &txn,
            NewTransaction {
                business_id,
                transaction_type: TransactionType::Deposit,
                amount: deposit.amount,
                description: Some(format!("Deposit to {}", input.deposit_type.label())),
                reference_id: Some(deposit.id),
                transaction_date: deposit.deposit_date,
                recorded_by,
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(deposit_id = %deposit.id, amount = %deposit.amount, "Deposit recorded");
        Ok(deposit)
    }

    /// Stores the proof document and returns the public ID of the replaced
    /// one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such deposit.
    pub async fn set_proof(
        &self,
        business_id: Uuid,
        id: Uuid,
        url: String,
        public_id: String,
    ) -> RepoResult<(deposits::Model, Option<String>)> {
        let deposit = self.find(business_id, id).await?;
        let previous = deposit.proof_public_id.clone();

        let mut active: deposits::ActiveModel = deposit.into();
        active.proof_url = Set(Some(url));
        active.proof_public_id = Set(Some(public_id));

        Ok((active.update(&self.db).await?, previous))
    }

    /// Deletes a deposit with its cash log entry. Returns the proof's
    /// public ID so the caller can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such deposit.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<Option<String>> {
        let txn = self.db.begin().await?;
        let deposit = deposits::Entity::find_by_id(id)
            .filter(deposits::Column::UserId.eq(business_id))
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound("Deposit"))?;

        let proof = deposit.proof_public_id.clone();
        delete_for_reference(&txn, business_id, deposit.id).await?;
        deposit.delete(&txn).await?;
        txn.commit().await?;

        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_negative_deposit_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let business = Uuid::new_v4();

        let err = DepositRepository::new(db)
            .create(
                business,
                business,
                CreateDepositInput {
                    deposit_type: DepositType::Bank,
                    amount: dec!(-10),
                    account_name: None,
                    reference: None,
                    deposit_date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_missing_deposit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<deposits::Model>::new()])
            .into_connection();

        let err = DepositRepository::new(db)
            .find(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound("Deposit")));
    }
}
