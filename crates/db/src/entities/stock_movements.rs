//! `SeaORM` Entity for stock_movements table.
//!
//! Append-only log of every quantity change with the before/after values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    #[sea_orm(column_type = "Decimal(Some((14, 3)))")]
    pub quantity_change: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 3)))")]
    pub quantity_before: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 3)))")]
    pub quantity_after: Decimal,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
