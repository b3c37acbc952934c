//! Stock ledger operations.
//!
//! Every amount change goes through [`Engine::increase_stock`] or
//! [`Engine::decrease_stock`], always inside the caller's transaction.
//! Decreases are a single conditional UPDATE so the non-negativity check and
//! the write are one statement; a concurrent writer can never sneak a
//! balance below zero between a read and a write.

use std::collections::HashMap;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, StockEntry, details, movements, stock_entries,
    ops::{Engine, validate_quantity, with_tx},
};

impl Engine {
    /// Fetch the entry for `supply_id`, creating it at zero when absent.
    /// Returns the amount before any pending change.
    pub(crate) async fn ensure_stock_entry(
        &self,
        db_tx: &DatabaseTransaction,
        supply_id: Uuid,
    ) -> ResultEngine<i64> {
        let existing = stock_entries::Entity::find_by_id(supply_id.to_string())
            .one(db_tx)
            .await?;
        if let Some(model) = existing {
            return Ok(model.amount);
        }

        let entry = StockEntry {
            supply_id,
            amount: 0,
        };
        stock_entries::ActiveModel::from(&entry).insert(db_tx).await?;
        Ok(0)
    }

    pub(crate) async fn increase_stock(
        &self,
        db_tx: &DatabaseTransaction,
        supply_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<()> {
        validate_quantity(quantity)?;
        self.ensure_stock_entry(db_tx, supply_id).await?;

        db_tx
            .execute(Statement::from_sql_and_values(
                self.database.get_database_backend(),
                "UPDATE stock_entries SET amount = amount + ? WHERE supply_id = ?",
                [quantity.into(), supply_id.to_string().into()],
            ))
            .await?;
        Ok(())
    }

    /// Subtract `quantity` from the entry, failing with
    /// [`EngineError::InsufficientStock`] when the amount on hand does not
    /// cover it. The guard lives in the UPDATE's WHERE clause, so the check
    /// and the write cannot be separated by a concurrent transaction.
    pub(crate) async fn decrease_stock(
        &self,
        db_tx: &DatabaseTransaction,
        supply_id: Uuid,
        quantity: i64,
    ) -> ResultEngine<()> {
        validate_quantity(quantity)?;
        self.ensure_stock_entry(db_tx, supply_id).await?;

        let result = db_tx
            .execute(Statement::from_sql_and_values(
                self.database.get_database_backend(),
                "UPDATE stock_entries SET amount = amount - ? \
                 WHERE supply_id = ? AND amount >= ?",
                [
                    quantity.into(),
                    supply_id.to_string().into(),
                    quantity.into(),
                ],
            ))
            .await?;

        if result.rows_affected() == 0 {
            let available = stock_entries::Entity::find_by_id(supply_id.to_string())
                .one(db_tx)
                .await?
                .map(|model| model.amount)
                .unwrap_or(0);
            return Err(EngineError::InsufficientStock {
                supply_id,
                available,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// The amount on hand for one supply. Supplies never moved report zero.
    pub async fn stock_amount(&self, supply_id: Uuid) -> ResultEngine<i64> {
        let entry = stock_entries::Entity::find_by_id(supply_id.to_string())
            .one(&self.database)
            .await?;
        Ok(entry.map(|model| model.amount).unwrap_or(0))
    }

    /// All stock entries, ordered by supply id.
    pub async fn stock_levels(&self) -> ResultEngine<Vec<StockEntry>> {
        let models = stock_entries::Entity::find()
            .order_by_asc(stock_entries::Column::SupplyId)
            .all(&self.database)
            .await?;
        models.into_iter().map(StockEntry::try_from).collect()
    }

    /// Rebuild every stock entry from the live detail lines.
    ///
    /// An audit tool: sums the signed quantities of all non-tombstoned lines
    /// per supply and overwrites the entries with the result. Fails without
    /// writing anything when a recomputed amount would be negative, since
    /// that means the history itself is inconsistent.
    pub async fn recompute_stock(&self) -> ResultEngine<Vec<StockEntry>> {
        with_tx!(self, |db_tx| {
            let lines = details::Entity::find()
                .filter(details::Column::DeletedAt.is_null())
                .find_also_related(movements::Entity)
                .all(&db_tx)
                .await?;

            let mut amounts: HashMap<String, i64> = HashMap::new();
            for (line, movement) in lines {
                let movement = movement.ok_or_else(|| {
                    EngineError::KeyNotFound("movement not exists".to_string())
                })?;
                let kind = movements::MovementKind::try_from(movement.kind.as_str())?;
                let signed = match kind.direction() {
                    movements::Direction::IncreasesStock => line.quantity,
                    movements::Direction::DecreasesStock => -line.quantity,
                };
                *amounts.entry(line.supply_id).or_insert(0) += signed;
            }

            for (supply_id, amount) in &amounts {
                if *amount < 0 {
                    return Err(EngineError::InvalidQuantity(format!(
                        "recomputed stock for supply {supply_id} is negative ({amount})"
                    )));
                }
            }

            let existing = stock_entries::Entity::find().all(&db_tx).await?;
            for model in &existing {
                let amount = amounts.remove(&model.supply_id).unwrap_or(0);
                if amount != model.amount {
                    let update = stock_entries::ActiveModel {
                        supply_id: ActiveValue::Set(model.supply_id.clone()),
                        amount: ActiveValue::Set(amount),
                    };
                    update.update(&db_tx).await?;
                }
            }
            for (supply_id, amount) in amounts {
                let insert = stock_entries::ActiveModel {
                    supply_id: ActiveValue::Set(supply_id),
                    amount: ActiveValue::Set(amount),
                };
                insert.insert(&db_tx).await?;
            }

            Ok::<(), EngineError>(())
        })?;

        self.stock_levels().await
    }
}
