//! Stock entries.
//!
//! A [`StockEntry`] is the running quantity on hand for one supply. Amounts
//! are unsigned in meaning but stored as `i64`; the ledger guarantees
//! `amount >= 0` at every committed and intermediate state.
//!
//! In the engine, *every* change to an amount happens through the ledger
//! operations in `ops::stock`; entries are created lazily (at zero) the
//! first time a movement references their supply and are never deleted.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub supply_id: Uuid,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub supply_id: String,
    pub amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplies::Entity",
        from = "Column::SupplyId",
        to = "super::supplies::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Supplies,
}

impl Related<super::supplies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&StockEntry> for ActiveModel {
    fn from(entry: &StockEntry) -> Self {
        Self {
            supply_id: ActiveValue::Set(entry.supply_id.to_string()),
            amount: ActiveValue::Set(entry.amount),
        }
    }
}

impl TryFrom<Model> for StockEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            supply_id: Uuid::parse_str(&model.supply_id)
                .map_err(|_| EngineError::InvalidId("invalid supply id".to_string()))?,
            amount: model.amount,
        })
    }
}
