//! The module contains the `Supply` struct and its entity.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A supply.
///
/// A supply is one kind of physical good the stock ledger tracks: seed bags,
/// fertilizer, fuel, produce. The catalog row only names the good; the
/// quantity on hand lives in its [`StockEntry`](crate::StockEntry).
///
/// Supplies are soft-deleted (`deleted_at`) so historical movement details
/// keep resolving after the catalog drops them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    /// Stable identifier, generated once and persisted so the supply can be
    /// renamed without breaking references.
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Supply {
    pub fn new(name: String, unit: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            unit,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "supplies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub unit: String,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::details::Entity")]
    Details,
    #[sea_orm(has_one = "super::stock_entries::Entity")]
    StockEntries,
}

impl Related<super::details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl Related<super::stock_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Supply> for ActiveModel {
    fn from(supply: &Supply) -> Self {
        Self {
            id: ActiveValue::Set(supply.id.to_string()),
            name: ActiveValue::Set(supply.name.clone()),
            unit: ActiveValue::Set(supply.unit.clone()),
            deleted_at: ActiveValue::Set(supply.deleted_at),
        }
    }
}

impl TryFrom<Model> for Supply {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid supply id".to_string()))?,
            name: model.name,
            unit: model.unit,
            deleted_at: model.deleted_at,
        })
    }
}
