use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MovementKind, ResultEngine, details, movements,
    ops::{Engine, with_tx},
};

use super::require_unlocked;

impl Engine {
    /// Delete a movement, reversing the stock effect of every live line.
    ///
    /// Lock checks run over the whole document before anything is touched,
    /// so a locked line anywhere leaves the document fully intact. Lines
    /// whose supply was removed in the meantime are skipped during the
    /// reversal; their effect was already taken out of circulation when the
    /// supply went away.
    pub async fn remove_movement(&self, movement_id: Uuid) -> ResultEngine<()> {
        movements::Entity::find_by_id(movement_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))?;

        with_tx!(self, |db_tx| {
            let (movement_model, line_pairs) =
                self.load_movement_tx(&db_tx, movement_id).await?;
            let kind = MovementKind::try_from(movement_model.kind.as_str())?;
            let direction = kind.direction();

            for (_, line) in &line_pairs {
                require_unlocked(line)?;
            }

            for (_, line) in &line_pairs {
                if self.supply_is_live(&db_tx, line.supply_id).await? {
                    self.reverse_stock_effect(&db_tx, direction, line.supply_id, line.quantity)
                        .await?;
                }
            }

            details::Entity::delete_many()
                .filter(details::Column::MovementId.eq(movement_id.to_string()))
                .exec(&db_tx)
                .await?;
            movements::Entity::delete_by_id(movement_id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(())
        })
    }
}
