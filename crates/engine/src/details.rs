//! Movement details.
//!
//! A [`Detail`] is a single supply/quantity pair inside a
//! [`Movement`](crate::Movement). Quantities are stored as positive `i64`
//! base units; the sign of the stock effect comes from the owning movement's
//! direction, never from the line itself.
//!
//! Two flags make a line immutable (see [`lock`](crate::lock)):
//! - `settled`: a payment (or similar dependent record) references the line
//! - `deleted_at`: a cascading delete tombstoned the line but must keep the
//!   row addressable

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, lock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub supply_id: Uuid,
    pub quantity: i64,
    pub note: Option<String>,
    pub settled: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Detail {
    pub fn new(movement_id: Uuid, supply_id: Uuid, quantity: i64, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            movement_id,
            supply_id,
            quantity,
            note,
            settled: false,
            deleted_at: None,
        }
    }

    pub fn with_id(
        id: Uuid,
        movement_id: Uuid,
        supply_id: Uuid,
        quantity: i64,
        note: Option<String>,
    ) -> Self {
        Self {
            id,
            movement_id,
            supply_id,
            quantity,
            note,
            settled: false,
            deleted_at: None,
        }
    }

    /// Whether a dependent record forbids structural changes to this line.
    pub fn is_locked(&self) -> bool {
        lock::lock_reason(self).is_some()
    }

    pub fn is_tombstoned(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movement_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub movement_id: String,
    pub supply_id: String,
    pub quantity: i64,
    pub note: Option<String>,
    pub settled: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movements::Entity",
        from = "Column::MovementId",
        to = "super::movements::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Movements,
    #[sea_orm(
        belongs_to = "super::supplies::Entity",
        from = "Column::SupplyId",
        to = "super::supplies::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Supplies,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::supplies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Detail> for ActiveModel {
    fn from(detail: &Detail) -> Self {
        Self {
            id: ActiveValue::Set(detail.id.to_string()),
            movement_id: ActiveValue::Set(detail.movement_id.to_string()),
            supply_id: ActiveValue::Set(detail.supply_id.to_string()),
            quantity: ActiveValue::Set(detail.quantity),
            note: ActiveValue::Set(detail.note.clone()),
            settled: ActiveValue::Set(detail.settled),
            deleted_at: ActiveValue::Set(detail.deleted_at),
        }
    }
}

impl TryFrom<Model> for Detail {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid detail id".to_string()))?,
            movement_id: Uuid::parse_str(&model.movement_id)
                .map_err(|_| EngineError::InvalidId("invalid movement id".to_string()))?,
            supply_id: Uuid::parse_str(&model.supply_id)
                .map_err(|_| EngineError::InvalidId("invalid supply id".to_string()))?,
            quantity: model.quantity,
            note: model.note,
            settled: model.settled,
            deleted_at: model.deleted_at,
        })
    }
}
