mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use engine::{
    Frequency, NewRecurring, RecurringStatus, TransactionListFilter, TransactionType, codes,
};

use common::{ALICE, BOB, cash_wallet, day, engine_with_db};

fn daily_rent(wallet_id: Uuid) -> NewRecurring {
    NewRecurring::new(
        wallet_id,
        "Rent",
        TransactionType::Expense,
        dec!(10),
        Frequency::Daily,
        day(2024, 1, 1),
    )
}

fn from_template(template_id: Uuid) -> TransactionListFilter {
    TransactionListFilter {
        recurring_template_id: Some(template_id),
        ..TransactionListFilter::default()
    }
}

#[tokio::test]
async fn sweep_materializes_one_occurrence_and_advances() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let template = engine
        .create_recurring(ALICE, daily_rent(wallet_id))
        .await
        .unwrap();

    let report = engine.run_recurring(day(2024, 1, 1)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.created, 1);
    assert!(report.failed.is_empty());

    let template = engine.recurring(ALICE, template.id).await.unwrap();
    assert_eq!(template.last_occurrence_date, Some(day(2024, 1, 1)));
    assert_eq!(template.next_occurrence_date, Some(day(2024, 1, 2)));
    assert_eq!(template.occurrence_count, 1);
    assert_eq!(template.status, RecurringStatus::Active);

    let created = engine
        .transactions(ALICE, &from_template(template.id))
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].transaction_date, day(2024, 1, 1));
    assert!(created[0].is_recurring);
    assert_eq!(created[0].description.as_deref(), Some("Rent"));
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(90));

    // same day again: nothing is due any more
    let report = engine.run_recurring(day(2024, 1, 1)).await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(90));
}

#[tokio::test]
async fn template_completes_after_max_occurrences() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let template = engine
        .create_recurring(ALICE, daily_rent(wallet_id).max_occurrences(3))
        .await
        .unwrap();

    for d in 1..=3 {
        let report = engine.run_recurring(day(2024, 1, d)).await.unwrap();
        assert_eq!(report.created, 1);
    }
    let template = engine.recurring(ALICE, template.id).await.unwrap();
    assert_eq!(template.status, RecurringStatus::Completed);
    assert_eq!(template.occurrence_count, 3);

    let report = engine.run_recurring(day(2024, 1, 4)).await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(70));

    let err = engine.resume_recurring(ALICE, template.id).await.unwrap_err();
    assert_eq!(err.code(), codes::RECURRING_TERMINATED);
}

#[tokio::test]
async fn end_date_completes_template() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(0)).await;
    let template = engine
        .create_recurring(
            ALICE,
            NewRecurring::new(
                wallet_id,
                "Salary",
                TransactionType::Income,
                dec!(1000),
                Frequency::Monthly,
                day(2024, 1, 31),
            )
            .end_date(day(2024, 3, 15)),
        )
        .await
        .unwrap();

    engine.run_recurring(day(2024, 1, 31)).await.unwrap();
    let after_first = engine.recurring(ALICE, template.id).await.unwrap();
    assert_eq!(after_first.next_occurrence_date, Some(day(2024, 2, 29)));

    engine.run_recurring(day(2024, 2, 29)).await.unwrap();
    let after_second = engine.recurring(ALICE, template.id).await.unwrap();
    assert_eq!(after_second.status, RecurringStatus::Completed);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(2000));
}

#[tokio::test]
async fn failing_template_does_not_stop_the_sweep() {
    let (engine, _db) = engine_with_db().await;
    let good_wallet = cash_wallet(&engine, ALICE, dec!(100)).await;
    let bad_wallet = cash_wallet(&engine, BOB, dec!(100)).await;

    let good = engine
        .create_recurring(ALICE, daily_rent(good_wallet))
        .await
        .unwrap();
    let bad = engine
        .create_recurring(BOB, daily_rent(bad_wallet))
        .await
        .unwrap();
    engine.archive_wallet(BOB, bad_wallet).await.unwrap();

    let report = engine.run_recurring(day(2024, 1, 1)).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.created, 1);
    assert_eq!(report.failed, vec![bad.id]);

    let bad = engine.recurring(BOB, bad.id).await.unwrap();
    assert_eq!(bad.occurrence_count, 0);
    assert_eq!(bad.next_occurrence_date, Some(day(2024, 1, 1)));
    assert_eq!(engine.wallet(BOB, bad_wallet).await.unwrap().balance, dec!(100));

    let good = engine.recurring(ALICE, good.id).await.unwrap();
    assert_eq!(good.occurrence_count, 1);
}

#[tokio::test]
async fn paused_templates_are_skipped() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let template = engine
        .create_recurring(ALICE, daily_rent(wallet_id))
        .await
        .unwrap();

    engine.pause_recurring(ALICE, template.id).await.unwrap();
    let report = engine.run_recurring(day(2024, 1, 1)).await.unwrap();
    assert_eq!(report.processed, 0);

    engine.resume_recurring(ALICE, template.id).await.unwrap();
    let report = engine.run_recurring(day(2024, 1, 5)).await.unwrap();
    assert_eq!(report.created, 1);
    // overdue templates catch up one occurrence per sweep
    let template = engine.recurring(ALICE, template.id).await.unwrap();
    assert_eq!(template.next_occurrence_date, Some(day(2024, 1, 2)));

    engine.cancel_recurring(ALICE, template.id).await.unwrap();
    let err = engine.pause_recurring(ALICE, template.id).await.unwrap_err();
    assert_eq!(err.code(), codes::RECURRING_TERMINATED);
}

#[tokio::test]
async fn manual_templates_are_never_swept() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    engine
        .create_recurring(ALICE, daily_rent(wallet_id).auto_create(false))
        .await
        .unwrap();

    let report = engine.run_recurring(day(2024, 1, 1)).await.unwrap();
    assert_eq!(report.processed, 0);
}

#[tokio::test]
async fn invalid_template_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;

    let err = engine
        .create_recurring(
            ALICE,
            daily_rent(wallet_id)
                .interval_count(0)
                .end_date(day(2023, 12, 1)),
        )
        .await
        .unwrap_err();
    let engine::EngineError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let fields: Vec<&str> = errors.fields().keys().map(String::as_str).collect();
    assert_eq!(fields, vec!["end_date", "interval_count"]);
}

#[tokio::test]
async fn deleted_templates_disappear() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let template = engine
        .create_recurring(ALICE, daily_rent(wallet_id))
        .await
        .unwrap();

    engine.delete_recurring(ALICE, template.id).await.unwrap();
    assert!(engine.recurring_for_user(ALICE).await.unwrap().is_empty());
    assert_eq!(engine.run_recurring(day(2024, 1, 1)).await.unwrap().processed, 0);
}

#[tokio::test]
async fn oversized_interval_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;

    let yearly = NewRecurring::new(
        wallet_id,
        "Insurance",
        TransactionType::Expense,
        dec!(300),
        Frequency::Yearly,
        day(2024, 1, 1),
    )
    .interval_count(400_000_000);
    let err = engine.create_recurring(ALICE, yearly).await.unwrap_err();
    let engine::EngineError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.fields().contains_key("interval_count"));

    let report = engine.run_recurring(day(2024, 1, 1)).await.unwrap();
    assert_eq!(report.processed, 0);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn template_past_end_date_is_completed_by_the_sweep() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let template = engine
        .create_recurring(ALICE, daily_rent(wallet_id).end_date(day(2024, 1, 3)))
        .await
        .unwrap();

    engine.pause_recurring(ALICE, template.id).await.unwrap();
    engine.resume_recurring(ALICE, template.id).await.unwrap();

    let report = engine.run_recurring(day(2024, 1, 10)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.created, 0);
    assert!(report.failed.is_empty());

    let template = engine.recurring(ALICE, template.id).await.unwrap();
    assert_eq!(template.status, RecurringStatus::Completed);
    assert_eq!(template.occurrence_count, 0);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(100));

    let report = engine.run_recurring(day(2024, 1, 11)).await.unwrap();
    assert_eq!(report.processed, 0);
}
