//! Initial ledger schema.
//!
//! - `wallets`: balance-holding accounts
//! - `transactions`: money movements, one wallet each
//! - `budgets`: spending caps over a date range
//! - `recurring_transactions`: templates materialized by the daily sweep
//! - `subscriptions`: bills charged on a fixed cycle
//! - `savings_goals`: target amounts
//! - `category_rules`: auto-categorisation rules
//!
//! Money is stored as decimal text. Every table carries the same audit
//! columns: `created_at`, `updated_at`, `version`, `deleted`, `deleted_at`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Audit {
    CreatedAt,
    UpdatedAt,
    Version,
    Deleted,
    DeletedAt,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Name,
    Description,
    WalletType,
    Currency,
    Balance,
    InitialBalance,
    CreditLimit,
    AvailableCredit,
    IsDefault,
    IsArchived,
    ExcludeFromTotals,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    WalletId,
    CategoryId,
    TransactionType,
    Amount,
    Currency,
    ExchangeRate,
    AmountInWalletCurrency,
    TransactionDate,
    Description,
    Notes,
    MerchantName,
    Location,
    Status,
    IsRecurring,
    RecurringTemplateId,
    SubscriptionId,
    IsReconciled,
    ReconciledAt,
    FromWalletId,
    ToWalletId,
    LinkedTransactionId,
    ParentTransactionId,
    AutoCategorized,
}

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
    UserId,
    Name,
    Description,
    CategoryId,
    WalletId,
    Amount,
    Spent,
    Currency,
    Period,
    StartDate,
    EndDate,
    Status,
    AlertThreshold,
    AlertEnabled,
    AlertSent,
    RolloverEnabled,
    RolloverAmount,
}

#[derive(Iden)]
enum RecurringTransactions {
    Table,
    Id,
    UserId,
    WalletId,
    CategoryId,
    Name,
    Description,
    TransactionType,
    Amount,
    Currency,
    Frequency,
    IntervalCount,
    StartDate,
    EndDate,
    NextOccurrenceDate,
    LastOccurrenceDate,
    Status,
    AutoCreate,
    OccurrenceCount,
    MaxOccurrences,
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    UserId,
    WalletId,
    CategoryId,
    Name,
    Description,
    ProviderName,
    Amount,
    Currency,
    BillingFrequency,
    StartDate,
    NextBillingDate,
    LastBillingDate,
    EndDate,
    Status,
    ReminderEnabled,
    ReminderDaysBefore,
    AutoCreateTransaction,
    FreeTrial,
    FreeTrialEndDate,
    WebsiteUrl,
    Notes,
}

#[derive(Iden)]
enum SavingsGoals {
    Table,
    Id,
    UserId,
    WalletId,
    Name,
    Description,
    TargetAmount,
    CurrentAmount,
    Currency,
    TargetDate,
    Status,
    Priority,
    CompletedAt,
}

#[derive(Iden)]
enum CategoryRules {
    Table,
    Id,
    UserId,
    CategoryId,
    Name,
    Description,
    FieldName,
    Condition,
    FieldValue,
    Priority,
    IsActive,
    ApplyCount,
}

fn id<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string().not_null().primary_key().to_owned()
}

fn text<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string().not_null().to_owned()
}

fn optional_text<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).string().null().to_owned()
}

fn flag<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .boolean()
        .not_null()
        .default(false)
        .to_owned()
}

fn date<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).date().not_null().to_owned()
}

fn optional_date<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).date().null().to_owned()
}

/// Appends the audit columns shared by every table.
fn audited(table: &mut TableCreateStatement) -> TableCreateStatement {
    table
        .col(
            ColumnDef::new(Audit::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Audit::UpdatedAt)
                .timestamp_with_time_zone()
                .null(),
        )
        .col(
            ColumnDef::new(Audit::Version)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(&mut flag(Audit::Deleted))
        .col(
            ColumnDef::new(Audit::DeletedAt)
                .timestamp_with_time_zone()
                .null(),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(&mut id(Wallets::Id))
                    .col(&mut text(Wallets::UserId))
                    .col(&mut text(Wallets::Name))
                    .col(&mut optional_text(Wallets::Description))
                    .col(&mut text(Wallets::WalletType))
                    .col(
                        ColumnDef::new(Wallets::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(&mut text(Wallets::Balance))
                    .col(&mut text(Wallets::InitialBalance))
                    .col(&mut optional_text(Wallets::CreditLimit))
                    .col(&mut optional_text(Wallets::AvailableCredit))
                    .col(&mut flag(Wallets::IsDefault))
                    .col(&mut flag(Wallets::IsArchived))
                    .col(&mut flag(Wallets::ExcludeFromTotals)),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-user_id")
                    .table(Wallets::Table)
                    .col(Wallets::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(&mut id(Transactions::Id))
                    .col(&mut text(Transactions::UserId))
                    .col(&mut text(Transactions::WalletId))
                    .col(&mut optional_text(Transactions::CategoryId))
                    .col(&mut text(Transactions::TransactionType))
                    .col(&mut text(Transactions::Amount))
                    .col(&mut text(Transactions::Currency))
                    .col(
                        ColumnDef::new(Transactions::ExchangeRate)
                            .string()
                            .not_null()
                            .default("1"),
                    )
                    .col(&mut text(Transactions::AmountInWalletCurrency))
                    .col(&mut date(Transactions::TransactionDate))
                    .col(&mut optional_text(Transactions::Description))
                    .col(&mut optional_text(Transactions::Notes))
                    .col(&mut optional_text(Transactions::MerchantName))
                    .col(&mut optional_text(Transactions::Location))
                    .col(&mut text(Transactions::Status))
                    .col(&mut flag(Transactions::IsRecurring))
                    .col(&mut optional_text(Transactions::RecurringTemplateId))
                    .col(&mut optional_text(Transactions::SubscriptionId))
                    .col(&mut flag(Transactions::IsReconciled))
                    .col(
                        ColumnDef::new(Transactions::ReconciledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut optional_text(Transactions::FromWalletId))
                    .col(&mut optional_text(Transactions::ToWalletId))
                    .col(&mut optional_text(Transactions::LinkedTransactionId))
                    .col(&mut optional_text(Transactions::ParentTransactionId))
                    .col(&mut flag(Transactions::AutoCategorized))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-wallet_id")
                            .from(Transactions::Table, Transactions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    ),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-transaction_date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-wallet_id")
                    .table(Transactions::Table)
                    .col(Transactions::WalletId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(&mut id(Budgets::Id))
                    .col(&mut text(Budgets::UserId))
                    .col(&mut text(Budgets::Name))
                    .col(&mut optional_text(Budgets::Description))
                    .col(&mut optional_text(Budgets::CategoryId))
                    .col(&mut optional_text(Budgets::WalletId))
                    .col(&mut text(Budgets::Amount))
                    .col(
                        ColumnDef::new(Budgets::Spent)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(&mut text(Budgets::Currency))
                    .col(&mut text(Budgets::Period))
                    .col(&mut date(Budgets::StartDate))
                    .col(&mut date(Budgets::EndDate))
                    .col(&mut text(Budgets::Status))
                    .col(
                        ColumnDef::new(Budgets::AlertThreshold)
                            .string()
                            .not_null()
                            .default("80.00"),
                    )
                    .col(
                        ColumnDef::new(Budgets::AlertEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(&mut flag(Budgets::AlertSent))
                    .col(&mut flag(Budgets::RolloverEnabled))
                    .col(&mut optional_text(Budgets::RolloverAmount)),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id-status")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Recurring transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(RecurringTransactions::Table)
                    .if_not_exists()
                    .col(&mut id(RecurringTransactions::Id))
                    .col(&mut text(RecurringTransactions::UserId))
                    .col(&mut text(RecurringTransactions::WalletId))
                    .col(&mut optional_text(RecurringTransactions::CategoryId))
                    .col(&mut text(RecurringTransactions::Name))
                    .col(&mut optional_text(RecurringTransactions::Description))
                    .col(&mut text(RecurringTransactions::TransactionType))
                    .col(&mut text(RecurringTransactions::Amount))
                    .col(&mut text(RecurringTransactions::Currency))
                    .col(&mut text(RecurringTransactions::Frequency))
                    .col(
                        ColumnDef::new(RecurringTransactions::IntervalCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(&mut date(RecurringTransactions::StartDate))
                    .col(&mut optional_date(RecurringTransactions::EndDate))
                    .col(&mut optional_date(RecurringTransactions::NextOccurrenceDate))
                    .col(&mut optional_date(RecurringTransactions::LastOccurrenceDate))
                    .col(&mut text(RecurringTransactions::Status))
                    .col(
                        ColumnDef::new(RecurringTransactions::AutoCreate)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::OccurrenceCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RecurringTransactions::MaxOccurrences)
                            .integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_transactions-wallet_id")
                            .from(RecurringTransactions::Table, RecurringTransactions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    ),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_transactions-status-next_occurrence_date")
                    .table(RecurringTransactions::Table)
                    .col(RecurringTransactions::Status)
                    .col(RecurringTransactions::NextOccurrenceDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Subscriptions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(&mut id(Subscriptions::Id))
                    .col(&mut text(Subscriptions::UserId))
                    .col(&mut text(Subscriptions::WalletId))
                    .col(&mut optional_text(Subscriptions::CategoryId))
                    .col(&mut text(Subscriptions::Name))
                    .col(&mut optional_text(Subscriptions::Description))
                    .col(&mut optional_text(Subscriptions::ProviderName))
                    .col(&mut text(Subscriptions::Amount))
                    .col(&mut text(Subscriptions::Currency))
                    .col(&mut text(Subscriptions::BillingFrequency))
                    .col(&mut date(Subscriptions::StartDate))
                    .col(&mut optional_date(Subscriptions::NextBillingDate))
                    .col(&mut optional_date(Subscriptions::LastBillingDate))
                    .col(&mut optional_date(Subscriptions::EndDate))
                    .col(&mut text(Subscriptions::Status))
                    .col(
                        ColumnDef::new(Subscriptions::ReminderEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::ReminderDaysBefore)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::AutoCreateTransaction)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(&mut flag(Subscriptions::FreeTrial))
                    .col(&mut optional_date(Subscriptions::FreeTrialEndDate))
                    .col(&mut optional_text(Subscriptions::WebsiteUrl))
                    .col(&mut optional_text(Subscriptions::Notes))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscriptions-wallet_id")
                            .from(Subscriptions::Table, Subscriptions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    ),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-subscriptions-user_id-next_billing_date")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .col(Subscriptions::NextBillingDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Savings goals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(SavingsGoals::Table)
                    .if_not_exists()
                    .col(&mut id(SavingsGoals::Id))
                    .col(&mut text(SavingsGoals::UserId))
                    .col(&mut optional_text(SavingsGoals::WalletId))
                    .col(&mut text(SavingsGoals::Name))
                    .col(&mut optional_text(SavingsGoals::Description))
                    .col(&mut text(SavingsGoals::TargetAmount))
                    .col(
                        ColumnDef::new(SavingsGoals::CurrentAmount)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(&mut text(SavingsGoals::Currency))
                    .col(&mut optional_date(SavingsGoals::TargetDate))
                    .col(&mut text(SavingsGoals::Status))
                    .col(ColumnDef::new(SavingsGoals::Priority).integer().null())
                    .col(
                        ColumnDef::new(SavingsGoals::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    ),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-savings_goals-user_id")
                    .table(SavingsGoals::Table)
                    .col(SavingsGoals::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Category rules
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(audited(
                Table::create()
                    .table(CategoryRules::Table)
                    .if_not_exists()
                    .col(&mut id(CategoryRules::Id))
                    .col(&mut text(CategoryRules::UserId))
                    .col(&mut text(CategoryRules::CategoryId))
                    .col(&mut text(CategoryRules::Name))
                    .col(&mut optional_text(CategoryRules::Description))
                    .col(&mut text(CategoryRules::FieldName))
                    .col(&mut text(CategoryRules::Condition))
                    .col(&mut text(CategoryRules::FieldValue))
                    .col(
                        ColumnDef::new(CategoryRules::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CategoryRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CategoryRules::ApplyCount)
                            .integer()
                            .not_null()
                            .default(0),
                    ),
            ))
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-category_rules-user_id-priority")
                    .table(CategoryRules::Table)
                    .col(CategoryRules::UserId)
                    .col(CategoryRules::Priority)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation
        manager
            .drop_table(Table::drop().table(CategoryRules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingsGoals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        Ok(())
    }
}
