use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateMovementCmd, DetailInput, DetailPatch, Engine, EngineError, LockReason, MovementKind,
    UpdateMovementCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn seed_supply(engine: &Engine, name: &str) -> Uuid {
    engine.new_supply(name, "kg").await.unwrap()
}

async fn record(
    engine: &Engine,
    kind: MovementKind,
    lines: &[(Uuid, i64)],
) -> engine::Movement {
    let details = lines
        .iter()
        .map(|(supply_id, quantity)| DetailInput::new(*supply_id, *quantity))
        .collect();
    engine
        .create_movement(CreateMovementCmd::new(kind, Utc::now()).details(details))
        .await
        .unwrap()
}

#[tokio::test]
async fn purchase_increases_stock() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let movement = record(&engine, MovementKind::Purchase, &[(seed, 4500)]).await;

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 4500);
    assert_eq!(movement.details.len(), 1);
    assert_eq!(movement.details[0].quantity, 4500);
}

#[tokio::test]
async fn consumption_decreases_stock_and_rejects_overdraw() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    record(&engine, MovementKind::Purchase, &[(seed, 4500)]).await;

    record(&engine, MovementKind::Consumption, &[(seed, 4000)]).await;
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 500);

    let err = engine
        .create_movement(
            CreateMovementCmd::new(MovementKind::Consumption, Utc::now())
                .detail(DetailInput::new(seed, 600)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            supply_id: seed,
            available: 500,
            requested: 600,
        }
    );
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 500);
}

#[tokio::test]
async fn updating_a_line_reapplies_its_effect() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    record(&engine, MovementKind::Purchase, &[(seed, 4500)]).await;

    let consumption = record(&engine, MovementKind::Consumption, &[(seed, 2000)]).await;
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 2500);
    let line_id = consumption.details[0].id;

    let updated = engine
        .update_movement(UpdateMovementCmd::new(
            consumption.id,
            vec![DetailPatch::new(seed, 2500).id(line_id)],
        ))
        .await
        .unwrap();

    // The old effect is reversed before the new one is applied, so the net
    // change is the delta, not a double subtraction.
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 2000);
    assert_eq!(updated.details.len(), 1);
    assert_eq!(updated.details[0].id, line_id);
    assert_eq!(updated.details[0].quantity, 2500);
}

#[tokio::test]
async fn settled_line_blocks_update_and_delete() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let purchase = record(&engine, MovementKind::Purchase, &[(seed, 1000)]).await;
    let line_id = purchase.details[0].id;
    engine.settle_detail(line_id).await.unwrap();

    let err = engine
        .update_movement(UpdateMovementCmd::new(
            purchase.id,
            vec![DetailPatch::new(seed, 900).id(line_id)],
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::LinkedDetail {
            detail_id: line_id,
            reason: LockReason::Settled,
        }
    );

    let err = engine.remove_movement(purchase.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::LinkedDetail {
            detail_id: line_id,
            reason: LockReason::Settled,
        }
    );

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 1000);
    assert_eq!(engine.movement(purchase.id).await.unwrap().details.len(), 1);
}

#[tokio::test]
async fn removing_a_movement_reverses_its_effect() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    record(&engine, MovementKind::Purchase, &[(seed, 3000)]).await;

    let consumption = record(&engine, MovementKind::Consumption, &[(seed, 1000)]).await;
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 2000);

    engine.remove_movement(consumption.id).await.unwrap();

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 3000);
    assert_eq!(
        engine.movement(consumption.id).await.unwrap_err(),
        EngineError::KeyNotFound("movement not exists".to_string())
    );
}

#[tokio::test]
async fn failed_create_persists_nothing() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    record(&engine, MovementKind::Purchase, &[(seed, 100)]).await;

    // The first line fits, the second overdraws; both must be discarded.
    let err = engine
        .create_movement(
            CreateMovementCmd::new(MovementKind::Consumption, Utc::now())
                .detail(DetailInput::new(seed, 60))
                .detail(DetailInput::new(seed, 60)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientStock {
            supply_id: seed,
            available: 40,
            requested: 60,
        }
    );

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 100);
    assert_eq!(engine.list_movements(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_update_rolls_back_earlier_steps() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    let fuel = seed_supply(&engine, "Fuel").await;
    record(&engine, MovementKind::Purchase, &[(seed, 100)]).await;
    record(&engine, MovementKind::Purchase, &[(fuel, 100)]).await;

    let consumption =
        record(&engine, MovementKind::Consumption, &[(seed, 50), (fuel, 50)]).await;
    let seed_line = consumption.details.iter().find(|d| d.supply_id == seed).unwrap();
    let fuel_line = consumption.details.iter().find(|d| d.supply_id == fuel).unwrap();

    // The fuel line overdraws mid-plan. The whole edit must vanish,
    // including any line change already applied before the failure.
    let err = engine
        .update_movement(UpdateMovementCmd::new(
            consumption.id,
            vec![
                DetailPatch::new(seed, 60).id(seed_line.id),
                DetailPatch::new(fuel, 200).id(fuel_line.id),
            ],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock { .. }));

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 50);
    assert_eq!(engine.stock_amount(fuel).await.unwrap(), 50);
    let reloaded = engine.movement(consumption.id).await.unwrap();
    assert!(reloaded.details.iter().all(|d| d.quantity == 50));
}

#[tokio::test]
async fn update_handles_create_update_and_delete_together() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    let fuel = seed_supply(&engine, "Fuel").await;
    let twine = seed_supply(&engine, "Twine").await;

    let purchase =
        record(&engine, MovementKind::Purchase, &[(seed, 10), (fuel, 20)]).await;
    let seed_line = purchase.details.iter().find(|d| d.supply_id == seed).unwrap();

    // Keep the seed line (requantified), drop the fuel line, add a twine line.
    let updated = engine
        .update_movement(UpdateMovementCmd::new(
            purchase.id,
            vec![
                DetailPatch::new(seed, 15).id(seed_line.id),
                DetailPatch::new(twine, 5),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 15);
    assert_eq!(engine.stock_amount(fuel).await.unwrap(), 0);
    assert_eq!(engine.stock_amount(twine).await.unwrap(), 5);

    assert_eq!(updated.details.len(), 2);
    assert!(updated.details.iter().any(|d| d.id == seed_line.id));
    assert!(updated.details.iter().all(|d| d.supply_id != fuel));
}

#[tokio::test]
async fn update_patches_header_fields() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    let purchase = record(&engine, MovementKind::Purchase, &[(seed, 10)]).await;
    let line_id = purchase.details[0].id;

    let later = Utc::now() + Duration::days(1);
    let updated = engine
        .update_movement(
            UpdateMovementCmd::new(purchase.id, vec![DetailPatch::new(seed, 10).id(line_id)])
                .occurred_at(later)
                .note("delivery batch 2"),
        )
        .await
        .unwrap();

    assert_eq!(updated.occurred_at, later);
    assert_eq!(updated.note.as_deref(), Some("delivery batch 2"));
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 10);
}

#[tokio::test]
async fn remove_skips_lines_of_deleted_supplies() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let purchase = record(&engine, MovementKind::Purchase, &[(seed, 100)]).await;
    record(&engine, MovementKind::Consumption, &[(seed, 100)]).await;
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 0);

    engine.delete_supply(seed, Utc::now()).await.unwrap();

    // Reversing the purchase would drive the amount negative, but the supply
    // is gone: its lines are skipped and the removal still succeeds.
    engine.remove_movement(purchase.id).await.unwrap();
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 0);
}

#[tokio::test]
async fn tombstoned_line_is_reversed_and_locked() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    let purchase = record(&engine, MovementKind::Purchase, &[(seed, 100)]).await;
    let line_id = purchase.details[0].id;

    engine.tombstone_detail(line_id, Utc::now()).await.unwrap();
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 0);

    let err = engine
        .update_movement(UpdateMovementCmd::new(
            purchase.id,
            vec![DetailPatch::new(seed, 50).id(line_id)],
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::LinkedDetail {
            detail_id: line_id,
            reason: LockReason::Tombstoned,
        }
    );

    let err = engine.tombstone_detail(line_id, Utc::now()).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::LinkedDetail {
            detail_id: line_id,
            reason: LockReason::Tombstoned,
        }
    );
}

#[tokio::test]
async fn settle_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    let purchase = record(&engine, MovementKind::Purchase, &[(seed, 100)]).await;
    let line_id = purchase.details[0].id;

    engine.settle_detail(line_id).await.unwrap();
    engine.settle_detail(line_id).await.unwrap();

    assert!(engine.movement(purchase.id).await.unwrap().details[0].settled);
}

#[tokio::test]
async fn recompute_stock_rebuilds_amounts_from_lines() {
    let (engine, db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;
    record(&engine, MovementKind::Purchase, &[(seed, 100)]).await;
    record(&engine, MovementKind::Consumption, &[(seed, 30)]).await;

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE stock_entries SET amount = ? WHERE supply_id = ?",
        vec![999_i64.into(), seed.to_string().into()],
    ))
    .await
    .unwrap();
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 999);

    let entries = engine.recompute_stock().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, 70);
    assert_eq!(engine.stock_amount(seed).await.unwrap(), 70);
}

#[tokio::test]
async fn movements_for_supply_reports_signed_quantities() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let earlier = Utc::now() - Duration::hours(1);
    engine
        .create_movement(
            CreateMovementCmd::new(MovementKind::Purchase, earlier)
                .detail(DetailInput::new(seed, 100)),
        )
        .await
        .unwrap();
    record(&engine, MovementKind::Consumption, &[(seed, 30)]).await;

    let history = engine.movements_for_supply(seed, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].0.kind, MovementKind::Consumption);
    assert_eq!(history[0].1, -30);
    assert_eq!(history[1].0.kind, MovementKind::Purchase);
    assert_eq!(history[1].1, 100);
}

#[tokio::test]
async fn unknown_ids_report_key_not_found() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let missing = Uuid::new_v4();
    assert_eq!(
        engine
            .update_movement(UpdateMovementCmd::new(
                missing,
                vec![DetailPatch::new(seed, 10)],
            ))
            .await
            .unwrap_err(),
        EngineError::KeyNotFound("movement not exists".to_string())
    );
    assert_eq!(
        engine.remove_movement(missing).await.unwrap_err(),
        EngineError::KeyNotFound("movement not exists".to_string())
    );
    assert_eq!(
        engine.settle_detail(missing).await.unwrap_err(),
        EngineError::KeyNotFound("detail not exists".to_string())
    );
}

#[tokio::test]
async fn rejects_empty_and_non_positive_lines() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let err = engine
        .create_movement(CreateMovementCmd::new(MovementKind::Purchase, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuantity(_)));

    let err = engine
        .create_movement(
            CreateMovementCmd::new(MovementKind::Purchase, Utc::now())
                .detail(DetailInput::new(seed, 0)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuantity(_)));

    let err = engine
        .create_movement(
            CreateMovementCmd::new(MovementKind::Purchase, Utc::now())
                .detail(DetailInput::new(seed, -5)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuantity(_)));
}

#[tokio::test]
async fn create_rejects_unknown_supply_without_side_effects() {
    let (engine, _db) = engine_with_db().await;
    let seed = seed_supply(&engine, "Seed bags").await;

    let err = engine
        .create_movement(
            CreateMovementCmd::new(MovementKind::Purchase, Utc::now())
                .detail(DetailInput::new(seed, 10))
                .detail(DetailInput::new(Uuid::new_v4(), 10)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("supply not exists".to_string())
    );

    assert_eq!(engine.stock_amount(seed).await.unwrap(), 0);
    assert!(engine.list_movements(None).await.unwrap().is_empty());
}
