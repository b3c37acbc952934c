//! Supply catalog operations.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Supply, stock_entries, supplies,
    ops::{Engine, normalize_required_name, with_tx},
};

impl Engine {
    /// Register a new supply. Names are unique among non-deleted supplies.
    pub async fn new_supply(&self, name: &str, unit: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "supply")?;
        let unit = normalize_required_name(unit, "unit")?;

        with_tx!(self, |db_tx| {
            let existing = supplies::Entity::find()
                .filter(supplies::Column::Name.eq(name.clone()))
                .filter(supplies::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "supply \"{name}\" already exists"
                )));
            }

            let supply = Supply::new(name, unit);
            supplies::ActiveModel::from(&supply).insert(&db_tx).await?;
            Ok(supply.id)
        })
    }

    pub async fn supply(&self, supply_id: Uuid) -> ResultEngine<Supply> {
        let model = supplies::Entity::find_by_id(supply_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("supply not exists".to_string()))?;
        Supply::try_from(model)
    }

    /// All non-deleted supplies, ordered by name.
    pub async fn list_supplies(&self) -> ResultEngine<Vec<Supply>> {
        let models = supplies::Entity::find()
            .filter(supplies::Column::DeletedAt.is_null())
            .order_by_asc(supplies::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Supply::try_from).collect()
    }

    /// Rename a supply or change its unit of measure.
    pub async fn update_supply(
        &self,
        supply_id: Uuid,
        name: Option<&str>,
        unit: Option<&str>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_supply(&db_tx, supply_id).await?;

            let name = match name {
                Some(value) => normalize_required_name(value, "supply")?,
                None => model.name.clone(),
            };
            let unit = match unit {
                Some(value) => normalize_required_name(value, "unit")?,
                None => model.unit.clone(),
            };

            if name != model.name {
                let clash = supplies::Entity::find()
                    .filter(supplies::Column::Name.eq(name.clone()))
                    .filter(supplies::Column::DeletedAt.is_null())
                    .filter(supplies::Column::Id.ne(supply_id.to_string()))
                    .one(&db_tx)
                    .await?;
                if clash.is_some() {
                    return Err(EngineError::ExistingKey(format!(
                        "supply \"{name}\" already exists"
                    )));
                }
            }

            let update = supplies::ActiveModel {
                id: ActiveValue::Set(supply_id.to_string()),
                name: ActiveValue::Set(name),
                unit: ActiveValue::Set(unit),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Soft-delete a supply. The row stays so old movement lines keep their
    /// reference; the supply just stops appearing in listings and refuses new
    /// lines. Requires the amount on hand to be zero.
    pub async fn delete_supply(
        &self,
        supply_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_supply(&db_tx, supply_id).await?;

            let amount = stock_entries::Entity::find_by_id(supply_id.to_string())
                .one(&db_tx)
                .await?
                .map(|model| model.amount)
                .unwrap_or(0);
            if amount != 0 {
                return Err(EngineError::InvalidQuantity(format!(
                    "supply still has {amount} on hand"
                )));
            }

            let update = supplies::ActiveModel {
                id: ActiveValue::Set(supply_id.to_string()),
                deleted_at: ActiveValue::Set(Some(deleted_at)),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Fetch a supply that must exist and not be soft-deleted.
    pub(crate) async fn require_supply(
        &self,
        db_tx: &DatabaseTransaction,
        supply_id: Uuid,
    ) -> ResultEngine<supplies::Model> {
        supplies::Entity::find_by_id(supply_id.to_string())
            .filter(supplies::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("supply not exists".to_string()))
    }

    /// Whether the supply row still exists and is not soft-deleted.
    pub(crate) async fn supply_is_live(
        &self,
        db_tx: &DatabaseTransaction,
        supply_id: Uuid,
    ) -> ResultEngine<bool> {
        let model = supplies::Entity::find_by_id(supply_id.to_string())
            .filter(supplies::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?;
        Ok(model.is_some())
    }
}
