mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use engine::{
    ConditionKind, CreateTransactionCmd, EngineError, NewCategoryRule, NewWallet, RuleField,
    TransactionListFilter, TransactionPatch, TransactionType, TransferCmd, WalletType, codes,
};

use common::{ALICE, BOB, cash_wallet, day, engine_with_db};

fn expense(wallet_id: Uuid, amount: Decimal) -> CreateTransactionCmd {
    CreateTransactionCmd::new(wallet_id, TransactionType::Expense, amount, day(2024, 1, 10))
}

fn income(wallet_id: Uuid, amount: Decimal) -> CreateTransactionCmd {
    CreateTransactionCmd::new(wallet_id, TransactionType::Income, amount, day(2024, 1, 10))
}

#[tokio::test]
async fn expense_update_delete_scenario() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(1000)).await;

    let tx = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(200)))
        .await
        .unwrap();
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(800));

    engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                amount: Some(dec!(150)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(850));

    engine.delete_transaction(ALICE, tx.id).await.unwrap();
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(1000));
}

#[tokio::test]
async fn create_then_delete_leaves_balance_unchanged() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(42.50)).await;

    for kind in [
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::Fee,
        TransactionType::Transfer,
    ] {
        let cmd = CreateTransactionCmd::new(wallet_id, kind, dec!(17.25), day(2024, 2, 1));
        let tx = engine.create_transaction(ALICE, cmd).await.unwrap();
        engine.delete_transaction(ALICE, tx.id).await.unwrap();
        assert_eq!(
            engine.wallet(ALICE, wallet_id).await.unwrap().balance,
            dec!(42.50),
            "{kind}"
        );
    }
}

#[tokio::test]
async fn amount_update_moves_balance_by_the_difference() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(0)).await;

    let tx = engine
        .create_transaction(ALICE, income(wallet_id, dec!(100)))
        .await
        .unwrap();
    let before = engine.wallet(ALICE, wallet_id).await.unwrap().balance;

    engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                amount: Some(dec!(40)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();
    let after = engine.wallet(ALICE, wallet_id).await.unwrap().balance;
    assert_eq!(after - before, dec!(-60));
}

#[tokio::test]
async fn type_change_flips_the_sign() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(1000)).await;

    let tx = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(50)))
        .await
        .unwrap();
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(950));

    let updated = engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                transaction_type: Some(TransactionType::Income),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.transaction_type, TransactionType::Income);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(1050));
}

#[tokio::test]
async fn metadata_patch_keeps_balance_and_absent_fields() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;

    let tx = engine
        .create_transaction(
            ALICE,
            expense(wallet_id, dec!(10))
                .description("Lunch")
                .merchant_name("Deli"),
        )
        .await
        .unwrap();

    let updated = engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                notes: Some("with Bob".to_string()),
                merchant_name: Some(String::new()),
                transaction_date: Some(day(2024, 1, 11)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description.as_deref(), Some("Lunch"));
    assert_eq!(updated.notes.as_deref(), Some("with Bob"));
    assert_eq!(updated.merchant_name, None);
    assert_eq!(updated.transaction_date, day(2024, 1, 11));
    assert_eq!(updated.version, tx.version + 1);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(90));
}

#[tokio::test]
async fn balance_matches_ledger_after_mixed_operations() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(250)).await;

    let a = engine
        .create_transaction(ALICE, income(wallet_id, dec!(1200)))
        .await
        .unwrap();
    let b = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(75.40)))
        .await
        .unwrap();
    let c = engine
        .create_transaction(
            ALICE,
            CreateTransactionCmd::new(wallet_id, TransactionType::Dividend, dec!(12), day(2024, 1, 3)),
        )
        .await
        .unwrap();
    engine
        .update_transaction(
            ALICE,
            b.id,
            TransactionPatch {
                amount: Some(dec!(80)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();
    engine.delete_transaction(ALICE, c.id).await.unwrap();
    engine
        .update_transaction(
            ALICE,
            a.id,
            TransactionPatch {
                exchange_rate: Some(dec!(0.5)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    let stored = engine.wallet(ALICE, wallet_id).await.unwrap();
    let live = engine
        .transactions(ALICE, &TransactionListFilter::default())
        .await
        .unwrap();
    let ledger: Decimal = stored.initial_balance + live.iter().map(|tx| tx.signed_delta()).sum::<Decimal>();
    assert_eq!(stored.balance, ledger);
    assert_eq!(stored.balance, dec!(250) + dec!(600) - dec!(80));

    let recomputed = engine.recompute_wallet_balance(ALICE, wallet_id).await.unwrap();
    assert_eq!(recomputed.balance, stored.balance);
}

#[tokio::test]
async fn exchange_rate_scales_the_wallet_effect() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(1000)).await;

    let tx = engine
        .create_transaction(
            ALICE,
            expense(wallet_id, dec!(100))
                .currency("eur")
                .exchange_rate(dec!(1.5)),
        )
        .await
        .unwrap();

    assert_eq!(tx.currency.code(), "EUR");
    assert_eq!(tx.amount_in_wallet_currency, dec!(150));
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(850));
}

#[tokio::test]
async fn invalid_create_reports_every_field() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(10)).await;

    let err = engine
        .create_transaction(
            ALICE,
            expense(wallet_id, dec!(-5))
                .currency("XX")
                .exchange_rate(dec!(0)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VALIDATION_ERROR");
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    let fields: Vec<&str> = errors.fields().keys().map(String::as_str).collect();
    assert_eq!(fields, vec!["amount", "currency", "exchange_rate"]);
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(10));
}

#[tokio::test]
async fn foreign_wallets_and_transactions_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let alice_wallet = cash_wallet(&engine, ALICE, dec!(10)).await;
    let tx = engine
        .create_transaction(ALICE, income(alice_wallet, dec!(5)))
        .await
        .unwrap();

    let err = engine
        .create_transaction(BOB, expense(alice_wallet, dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::UNAUTHORIZED);

    let err = engine.delete_transaction(BOB, tx.id).await.unwrap_err();
    assert_eq!(err.code(), codes::UNAUTHORIZED);
    assert_eq!(engine.wallet(ALICE, alice_wallet).await.unwrap().balance, dec!(15));
}

#[tokio::test]
async fn missing_rows_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let missing = Uuid::new_v4();

    let err = engine.delete_transaction(ALICE, missing).await.unwrap_err();
    assert_eq!(err.code(), "RESOURCE_NOT_FOUND");
    assert_eq!(
        err.to_string(),
        format!("Transaction not found with id: '{missing}'")
    );
}

#[tokio::test]
async fn deleted_transactions_disappear() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(0)).await;
    let tx = engine
        .create_transaction(ALICE, income(wallet_id, dec!(5)))
        .await
        .unwrap();
    engine.delete_transaction(ALICE, tx.id).await.unwrap();

    let listed = engine
        .transactions(ALICE, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    let err = engine.delete_transaction(ALICE, tx.id).await.unwrap_err();
    assert_eq!(err.code(), "RESOURCE_NOT_FOUND");
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(0));
}

#[tokio::test]
async fn archived_wallet_rejects_new_transactions() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(10)).await;
    engine.archive_wallet(ALICE, wallet_id).await.unwrap();

    let err = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::WALLET_ARCHIVED);

    engine.unarchive_wallet(ALICE, wallet_id).await.unwrap();
    engine
        .create_transaction(ALICE, expense(wallet_id, dec!(1)))
        .await
        .unwrap();
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(9));
}

#[tokio::test]
async fn transfer_moves_money_between_wallets() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_wallet(&engine, ALICE, dec!(500)).await;
    let bank = engine
        .create_wallet(
            ALICE,
            NewWallet::new("Bank", WalletType::Checking, "USD").initial_balance(dec!(100)),
        )
        .await
        .unwrap()
        .id;

    let (outgoing, incoming) = engine
        .transfer(ALICE, TransferCmd::new(cash, bank, dec!(200), day(2024, 3, 1)))
        .await
        .unwrap();

    assert_eq!(outgoing.linked_transaction_id, Some(incoming.id));
    assert_eq!(incoming.linked_transaction_id, Some(outgoing.id));
    assert_eq!(incoming.from_wallet_id, Some(cash));
    assert_eq!(incoming.to_wallet_id, Some(bank));
    assert_eq!(engine.wallet(ALICE, cash).await.unwrap().balance, dec!(300));
    assert_eq!(engine.wallet(ALICE, bank).await.unwrap().balance, dec!(300));

    let err = engine
        .update_transaction(
            ALICE,
            incoming.id,
            TransactionPatch {
                amount: Some(dec!(1)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::TRANSFER_LINKED);

    engine.delete_transaction(ALICE, incoming.id).await.unwrap();
    assert_eq!(engine.wallet(ALICE, cash).await.unwrap().balance, dec!(500));
    assert_eq!(engine.wallet(ALICE, bank).await.unwrap().balance, dec!(100));
    let err = engine.transaction(ALICE, outgoing.id).await.unwrap_err();
    assert_eq!(err.code(), "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn transfer_applies_rate_to_destination() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_wallet(&engine, ALICE, dec!(500)).await;
    let euro = engine
        .create_wallet(ALICE, NewWallet::new("Euro", WalletType::Savings, "EUR"))
        .await
        .unwrap()
        .id;

    engine
        .transfer(
            ALICE,
            TransferCmd::new(cash, euro, dec!(200), day(2024, 3, 1)).exchange_rate(dec!(0.5)),
        )
        .await
        .unwrap();

    assert_eq!(engine.wallet(ALICE, cash).await.unwrap().balance, dec!(300));
    assert_eq!(engine.wallet(ALICE, euro).await.unwrap().balance, dec!(100));
}

#[tokio::test]
async fn transfer_to_same_wallet_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let cash = cash_wallet(&engine, ALICE, dec!(500)).await;

    let err = engine
        .transfer(ALICE, TransferCmd::new(cash, cash, dec!(1), day(2024, 3, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::SAME_WALLET_TRANSFER);
}

#[tokio::test]
async fn rules_categorize_uncategorized_transactions() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let coffee = Uuid::new_v4();
    let groceries = Uuid::new_v4();

    engine
        .create_rule(
            ALICE,
            NewCategoryRule::new(coffee, "Coffee", RuleField::Description, ConditionKind::Contains, "coffee")
                .priority(10),
        )
        .await
        .unwrap();
    engine
        .create_rule(
            ALICE,
            NewCategoryRule::new(groceries, "Shops", RuleField::Description, ConditionKind::Regex, ".*shop.*"),
        )
        .await
        .unwrap();

    let tx = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(4)).description("Coffee shop"))
        .await
        .unwrap();
    assert_eq!(tx.category_id, Some(coffee));
    assert!(tx.auto_categorized);

    let explicit = Uuid::new_v4();
    let tx = engine
        .create_transaction(
            ALICE,
            expense(wallet_id, dec!(4))
                .description("Coffee beans")
                .category_id(explicit),
        )
        .await
        .unwrap();
    assert_eq!(tx.category_id, Some(explicit));
    assert!(!tx.auto_categorized);

    let rules = engine.rules(ALICE).await.unwrap();
    assert_eq!(rules[0].category_id, coffee);
    assert_eq!(rules[0].apply_count, 1);
    assert_eq!(rules[1].apply_count, 0);
}

#[tokio::test]
async fn invalid_rule_regex_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_rule(
            ALICE,
            NewCategoryRule::new(Uuid::new_v4(), "Broken", RuleField::Merchant, ConditionKind::Regex, "(unclosed"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_filters_by_type_and_range() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    for (kind, date) in [
        (TransactionType::Income, day(2024, 1, 5)),
        (TransactionType::Expense, day(2024, 1, 20)),
        (TransactionType::Expense, day(2024, 2, 2)),
    ] {
        engine
            .create_transaction(ALICE, CreateTransactionCmd::new(wallet_id, kind, dec!(1), date))
            .await
            .unwrap();
    }

    let january_expenses = engine
        .transactions(
            ALICE,
            &TransactionListFilter {
                from: Some(day(2024, 1, 1)),
                to: Some(day(2024, 1, 31)),
                types: Some(vec![TransactionType::Expense]),
                ..TransactionListFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(january_expenses.len(), 1);
    assert_eq!(january_expenses[0].transaction_date, day(2024, 1, 20));

    let all = engine
        .transactions(ALICE, &TransactionListFilter::default())
        .await
        .unwrap();
    let dates: Vec<_> = all.iter().map(|tx| tx.transaction_date).collect();
    assert_eq!(dates, vec![day(2024, 2, 2), day(2024, 1, 20), day(2024, 1, 5)]);

    assert!(
        engine
            .transactions(BOB, &TransactionListFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn reconcile_has_no_balance_effect() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;
    let tx = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(30)))
        .await
        .unwrap();

    let reconciled = engine.reconcile_transaction(ALICE, tx.id).await.unwrap();
    assert!(reconciled.is_reconciled);
    assert!(reconciled.reconciled_at.is_some());
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(70));
}

#[tokio::test]
async fn split_requires_an_existing_parent() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = cash_wallet(&engine, ALICE, dec!(100)).await;

    let err = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(5)).parent(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RESOURCE_NOT_FOUND");

    let parent = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(20)))
        .await
        .unwrap();
    let split = engine
        .create_transaction(ALICE, expense(wallet_id, dec!(5)).parent(parent.id))
        .await
        .unwrap();
    assert_eq!(split.parent_transaction_id, Some(parent.id));
    assert_eq!(engine.wallet(ALICE, wallet_id).await.unwrap().balance, dec!(75));
}
