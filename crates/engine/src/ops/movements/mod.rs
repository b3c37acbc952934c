//! Movement document operations.
//!
//! Writes follow one shape: load the persisted document, decide what changes,
//! then mutate detail rows and the stock ledger inside a single transaction.
//! Stock effects are applied through [`Engine::apply_stock_effect`] and
//! undone through [`Engine::reverse_stock_effect`], so a line's effect is
//! always reversed with the exact quantity and supply it was applied with.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Detail, Direction, EngineError, LockReason, Movement, MovementKind, ResultEngine, details,
    lock, movements,
    ops::{Engine, with_tx},
};

mod create;
mod remove;
mod update;

/// Fail when a dependent record owns the line.
fn require_unlocked(detail: &Detail) -> ResultEngine<()> {
    match lock::lock_reason(detail) {
        None => Ok(()),
        Some(reason) => Err(EngineError::LinkedDetail {
            detail_id: detail.id,
            reason,
        }),
    }
}

impl Engine {
    /// Load a movement row and all of its detail rows (tombstoned included),
    /// ordered by detail id.
    pub(super) async fn load_movement_tx(
        &self,
        db_tx: &DatabaseTransaction,
        movement_id: Uuid,
    ) -> ResultEngine<(movements::Model, Vec<(details::Model, Detail)>)> {
        let movement = movements::Entity::find_by_id(movement_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;

        let models = details::Entity::find()
            .filter(details::Column::MovementId.eq(movement_id.to_string()))
            .order_by_asc(details::Column::Id)
            .all(db_tx)
            .await?;

        let mut pairs = Vec::with_capacity(models.len());
        for model in models {
            let detail = Detail::try_from(model.clone())?;
            pairs.push((model, detail));
        }
        Ok((movement, pairs))
    }

    pub(super) async fn apply_stock_effect(
        &self,
        db_tx: &DatabaseTransaction,
        direction: Direction,
        supply_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<()> {
        match direction {
            Direction::IncreasesStock => self.increase_stock(db_tx, supply_id, quantity).await,
            Direction::DecreasesStock => self.decrease_stock(db_tx, supply_id, quantity).await,
        }
    }

    pub(super) async fn reverse_stock_effect(
        &self,
        db_tx: &DatabaseTransaction,
        direction: Direction,
        supply_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<()> {
        self.apply_stock_effect(db_tx, direction.inverse(), supply_id, quantity)
            .await
    }

    /// Fetch one movement with all of its detail lines, ordered by line id.
    pub async fn movement(&self, movement_id: Uuid) -> ResultEngine<Movement> {
        let model = movements::Entity::find_by_id(movement_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
        let mut movement = Movement::try_from(model)?;

        let lines = details::Entity::find()
            .filter(details::Column::MovementId.eq(movement_id.to_string()))
            .order_by_asc(details::Column::Id)
            .all(&self.database)
            .await?;
        movement.details = lines
            .into_iter()
            .map(Detail::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(movement)
    }

    /// Most recent movements first. Headers only; lines are loaded per
    /// movement through [`Engine::movement`].
    pub async fn list_movements(&self, limit: Option<u64>) -> ResultEngine<Vec<Movement>> {
        let mut query = movements::Entity::find()
            .order_by_desc(movements::Column::OccurredAt);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let models = query.all(&self.database).await?;
        models.into_iter().map(Movement::try_from).collect()
    }

    /// Movements that touched one supply, most recent first, each paired
    /// with the signed quantity that movement contributed to the supply's
    /// stock. Tombstoned lines are skipped.
    pub async fn movements_for_supply(
        &self,
        supply_id: Uuid,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<(Movement, i64)>> {
        let mut query = details::Entity::find()
            .filter(details::Column::SupplyId.eq(supply_id.to_string()))
            .filter(details::Column::DeletedAt.is_null())
            .find_also_related(movements::Entity)
            .order_by_desc(movements::Column::OccurredAt);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query.all(&self.database).await?;

        let mut out = Vec::with_capacity(rows.len());
        for (line, movement) in rows {
            let movement = movement
                .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
            let movement = Movement::try_from(movement)?;
            let signed = match movement.direction() {
                Direction::IncreasesStock => line.quantity,
                Direction::DecreasesStock => -line.quantity,
            };
            out.push((movement, signed));
        }
        Ok(out)
    }

    /// Mark a line as settled by a dependent record. Idempotent: settling a
    /// settled line is a no-op. Tombstoned lines cannot be settled.
    pub async fn settle_detail(&self, detail_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let detail = self.require_detail(&db_tx, detail_id).await?;
            if detail.is_tombstoned() {
                return Err(EngineError::LinkedDetail {
                    detail_id,
                    reason: LockReason::Tombstoned,
                });
            }
            if detail.settled {
                return Ok(());
            }

            let update = details::ActiveModel {
                id: ActiveValue::Set(detail_id.to_string()),
                settled: ActiveValue::Set(true),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Tombstone a line: undo its stock effect and mark it deleted while
    /// keeping the row addressable for dependent records. Fails when the
    /// line is already tombstoned. The stock reversal is skipped when the
    /// supply itself was removed in the meantime.
    pub async fn tombstone_detail(
        &self,
        detail_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let detail = self.require_detail(&db_tx, detail_id).await?;
            if detail.is_tombstoned() {
                return Err(EngineError::LinkedDetail {
                    detail_id,
                    reason: LockReason::Tombstoned,
                });
            }

            let movement = movements::Entity::find_by_id(detail.movement_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;
            let kind = MovementKind::try_from(movement.kind.as_str())?;

            if self.supply_is_live(&db_tx, detail.supply_id).await? {
                self.reverse_stock_effect(&db_tx, kind.direction(), detail.supply_id, detail.quantity)
                    .await?;
            }

            let update = details::ActiveModel {
                id: ActiveValue::Set(detail_id.to_string()),
                deleted_at: ActiveValue::Set(Some(deleted_at)),
                ..Default::default()
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    async fn require_detail(
        &self,
        db_tx: &DatabaseTransaction,
        detail_id: Uuid,
    ) -> ResultEngine<Detail> {
        let model = details::Entity::find_by_id(detail_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("detail not exists".to_string()))?;
        Detail::try_from(model)
    }
}
