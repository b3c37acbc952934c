//! Movement primitives.
//!
//! A `Movement` is a dated document recording one stock-changing event (a
//! purchase delivery, a field consumption) through one or more
//! [`Detail`](crate::Detail) lines.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

use super::details;

/// The effect a movement has on the stock of every supply it references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    IncreasesStock,
    DecreasesStock,
}

impl Direction {
    /// The direction that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Self::IncreasesStock => Self::DecreasesStock,
            Self::DecreasesStock => Self::IncreasesStock,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Purchase,
    Consumption,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Consumption => "consumption",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::Purchase => Direction::IncreasesStock,
            Self::Consumption => Direction::DecreasesStock,
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "consumption" => Ok(Self::Consumption),
            other => Err(EngineError::InvalidId(format!(
                "invalid movement kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub details: Vec<details::Detail>,
}

impl Movement {
    pub fn new(kind: MovementKind, occurred_at: DateTime<Utc>, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            occurred_at,
            note,
            details: Vec::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.kind.direction()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub occurred_at: DateTimeUtc,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::details::Entity")]
    Details,
}

impl Related<super::details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Movement> for ActiveModel {
    fn from(movement: &Movement) -> Self {
        Self {
            id: ActiveValue::Set(movement.id.to_string()),
            kind: ActiveValue::Set(movement.kind.as_str().to_string()),
            occurred_at: ActiveValue::Set(movement.occurred_at),
            note: ActiveValue::Set(movement.note.clone()),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid movement id".to_string()))?,
            kind: MovementKind::try_from(model.kind.as_str())?,
            occurred_at: model.occurred_at,
            note: model.note,
            details: Vec::new(),
        })
    }
}
