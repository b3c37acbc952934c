use sea_orm::{TransactionTrait, prelude::*};

use crate::{
    CreateMovementCmd, Detail, EngineError, Movement, ResultEngine, details, movements,
    ops::{Engine, normalize_optional_text, validate_quantity, with_tx},
};

impl Engine {
    /// Record a new movement and apply every line's stock effect.
    ///
    /// All-or-nothing: if any line references a missing supply, or a
    /// consumption line would drive a stock amount below zero, nothing is
    /// persisted.
    pub async fn create_movement(&self, cmd: CreateMovementCmd) -> ResultEngine<Movement> {
        if cmd.details.is_empty() {
            return Err(EngineError::InvalidQuantity(
                "movement must have at least one detail".to_string(),
            ));
        }
        for input in &cmd.details {
            validate_quantity(input.quantity)?;
        }

        let movement = Movement::new(
            cmd.kind,
            cmd.occurred_at,
            normalize_optional_text(cmd.note.as_deref()),
        );
        let direction = movement.direction();

        with_tx!(self, |db_tx| {
            movements::ActiveModel::from(&movement).insert(&db_tx).await?;

            for input in &cmd.details {
                self.require_supply(&db_tx, input.supply_id).await?;

                let detail = Detail::new(
                    movement.id,
                    input.supply_id,
                    input.quantity,
                    normalize_optional_text(input.note.as_deref()),
                );
                details::ActiveModel::from(&detail).insert(&db_tx).await?;

                self.apply_stock_effect(&db_tx, direction, input.supply_id, input.quantity)
                    .await?;
            }

            Ok::<(), EngineError>(())
        })?;

        self.movement(movement.id).await
    }
}
