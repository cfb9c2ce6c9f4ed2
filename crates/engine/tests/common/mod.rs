#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{BudgetTracking, Engine, MemoryNotifier, NewWallet, WalletType};
use migration::MigratorTrait;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let (engine, db, _) = engine_with_notifier(BudgetTracking::Enabled).await;
    (engine, db)
}

pub async fn engine_with_notifier(
    tracking: BudgetTracking,
) -> (Engine, DatabaseConnection, Arc<MemoryNotifier>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier.clone())
        .budget_tracking(tracking)
        .build()
        .await
        .unwrap();
    (engine, db, notifier)
}

pub async fn cash_wallet(engine: &Engine, user_id: &str, initial: Decimal) -> Uuid {
    engine
        .create_wallet(
            user_id,
            NewWallet::new("Cash", WalletType::Cash, "USD").initial_balance(initial),
        )
        .await
        .unwrap()
        .id
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
