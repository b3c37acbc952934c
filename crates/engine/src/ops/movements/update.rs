use std::collections::HashMap;

use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Detail, EngineError, Movement, MovementKind, ResultEngine, UpdateMovementCmd, details,
    movements, reconcile,
    ops::{Engine, apply_optional_text_patch, normalize_optional_text, validate_quantity, with_tx},
};

use super::require_unlocked;

impl Engine {
    /// Edit a movement: rewrite its header fields and replace its detail set
    /// with the desired list in `cmd.details`.
    ///
    /// Lines are classified by id against the persisted set, then mutations
    /// run in a fixed order: deletes, updates, creates, header. Every
    /// removed or rewritten line has its old stock effect reversed before
    /// the new one is applied, so stock amounts stay consistent no matter
    /// how the set changed. Locked lines reject deletion and rewriting.
    pub async fn update_movement(&self, cmd: UpdateMovementCmd) -> ResultEngine<Movement> {
        if cmd.details.is_empty() {
            return Err(EngineError::InvalidQuantity(
                "movement must have at least one detail".to_string(),
            ));
        }
        for patch in &cmd.details {
            validate_quantity(patch.quantity)?;
        }

        // Existence check outside the transaction keeps the common error
        // path cheap; the transactional load below re-checks.
        movements::Entity::find_by_id(cmd.movement_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;

        with_tx!(self, |db_tx| {
            let (movement_model, line_pairs) =
                self.load_movement_tx(&db_tx, cmd.movement_id).await?;
            let kind = MovementKind::try_from(movement_model.kind.as_str())?;
            let direction = kind.direction();

            let old_ids: Vec<Uuid> = line_pairs.iter().map(|(_, line)| line.id).collect();
            let new_ids: Vec<Option<Uuid>> = cmd.details.iter().map(|patch| patch.id).collect();
            let plan = reconcile::reconcile(&old_ids, &new_ids);

            let by_id: HashMap<Uuid, &Detail> =
                line_pairs.iter().map(|(_, line)| (line.id, line)).collect();
            // First occurrence wins for duplicated patch ids, mirroring the plan.
            let mut patch_by_id = HashMap::new();
            for patch in &cmd.details {
                if let Some(id) = patch.id {
                    patch_by_id.entry(id).or_insert(patch);
                }
            }

            for detail_id in &plan.to_delete {
                let line = by_id.get(detail_id).ok_or_else(|| {
                    EngineError::KeyNotFound("detail not exists".to_string())
                })?;
                require_unlocked(line)?;

                self.reverse_stock_effect(&db_tx, direction, line.supply_id, line.quantity)
                    .await?;
                details::Entity::delete_by_id(detail_id.to_string())
                    .exec(&db_tx)
                    .await?;
            }

            for detail_id in &plan.to_update {
                let line = by_id.get(detail_id).ok_or_else(|| {
                    EngineError::KeyNotFound("detail not exists".to_string())
                })?;
                let patch = patch_by_id.get(detail_id).ok_or_else(|| {
                    EngineError::KeyNotFound("detail not exists".to_string())
                })?;
                require_unlocked(line)?;
                self.require_supply(&db_tx, patch.supply_id).await?;

                self.reverse_stock_effect(&db_tx, direction, line.supply_id, line.quantity)
                    .await?;
                self.apply_stock_effect(&db_tx, direction, patch.supply_id, patch.quantity)
                    .await?;

                let update = details::ActiveModel {
                    id: ActiveValue::Set(detail_id.to_string()),
                    supply_id: ActiveValue::Set(patch.supply_id.to_string()),
                    quantity: ActiveValue::Set(patch.quantity),
                    note: ActiveValue::Set(normalize_optional_text(patch.note.as_deref())),
                    ..Default::default()
                };
                update.update(&db_tx).await?;
            }

            for index in &plan.to_create {
                let patch = &cmd.details[*index];
                self.require_supply(&db_tx, patch.supply_id).await?;

                let detail = Detail::with_id(
                    patch.id.unwrap_or_else(Uuid::new_v4),
                    cmd.movement_id,
                    patch.supply_id,
                    patch.quantity,
                    normalize_optional_text(patch.note.as_deref()),
                );
                details::ActiveModel::from(&detail).insert(&db_tx).await?;

                self.apply_stock_effect(&db_tx, direction, patch.supply_id, patch.quantity)
                    .await?;
            }

            let occurred_at = cmd.occurred_at.unwrap_or(movement_model.occurred_at);
            let note =
                apply_optional_text_patch(movement_model.note.clone(), cmd.note.as_deref());
            let header = movements::ActiveModel {
                id: ActiveValue::Set(cmd.movement_id.to_string()),
                occurred_at: ActiveValue::Set(occurred_at),
                note: ActiveValue::Set(note),
                ..Default::default()
            };
            header.update(&db_tx).await?;

            Ok::<(), EngineError>(())
        })?;

        self.movement(cmd.movement_id).await
    }
}
