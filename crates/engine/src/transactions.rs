//! Transaction primitives.
//!
//! A `Transaction` is a single money movement on one wallet. Its effect on
//! the wallet balance is derived from its type: income adds, expense and
//! outgoing transfers subtract. The wallet is mutated by the engine, never by
//! the transaction itself.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine,
    util::{
        decimal_text, labeled_enum, optional_uuid_text, parse_decimal, parse_optional_uuid,
        parse_uuid,
    },
};

labeled_enum! {
    pub enum TransactionType {
        Income => "INCOME",
        Expense => "EXPENSE",
        Transfer => "TRANSFER",
        Investment => "INVESTMENT",
        Dividend => "DIVIDEND",
        Interest => "INTEREST",
        Fee => "FEE",
        Refund => "REFUND",
        Adjustment => "ADJUSTMENT",
        LoanPayment => "LOAN_PAYMENT",
        LoanDisbursement => "LOAN_DISBURSEMENT",
    }
}

impl TransactionType {
    /// Only expense and transfer rows are negated; every other type adds its
    /// amount to the wallet. The receiving side of a paired transfer is a
    /// credit too.
    #[must_use]
    pub fn is_debit(self) -> bool {
        matches!(self, Self::Expense | Self::Transfer)
    }
}

labeled_enum! {
    pub enum TransactionStatus {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Failed => "FAILED",
        Scheduled => "SCHEDULED",
        Processing => "PROCESSING",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub wallet_id: Uuid,
    pub category_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    /// Always positive; the sign comes from `transaction_type`.
    pub amount: Decimal,
    pub currency: Currency,
    pub exchange_rate: Decimal,
    /// `amount * exchange_rate`, the value applied to the wallet.
    pub amount_in_wallet_currency: Decimal,
    pub transaction_date: NaiveDate,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub merchant_name: Option<String>,
    pub location: Option<String>,
    pub status: TransactionStatus,
    pub is_recurring: bool,
    pub recurring_template_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub is_reconciled: bool,
    pub reconciled_at: Option<DateTime<Utc>>,
    pub from_wallet_id: Option<Uuid>,
    pub to_wallet_id: Option<Uuid>,
    /// Counterpart row of a paired transfer.
    pub linked_transaction_id: Option<Uuid>,
    pub parent_transaction_id: Option<Uuid>,
    pub auto_categorized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        user_id: String,
        wallet_id: Uuid,
        transaction_type: TransactionType,
        amount: Decimal,
        currency: Currency,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            wallet_id,
            category_id: None,
            transaction_type,
            amount,
            currency,
            exchange_rate: Decimal::ONE,
            amount_in_wallet_currency: amount,
            transaction_date,
            description: None,
            notes: None,
            merchant_name: None,
            location: None,
            status: TransactionStatus::Completed,
            is_recurring: false,
            recurring_template_id: None,
            subscription_id: None,
            is_reconciled: false,
            reconciled_at: None,
            from_wallet_id: None,
            to_wallet_id: None,
            linked_transaction_id: None,
            parent_transaction_id: None,
            auto_categorized: false,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        }
    }

    pub fn calculate_amount_in_wallet_currency(&mut self) {
        self.amount_in_wallet_currency = (self.amount * self.exchange_rate).round_dp(4);
    }

    /// Receiving side of a paired transfer.
    pub fn is_incoming_transfer(&self) -> bool {
        self.transaction_type == TransactionType::Transfer
            && self.to_wallet_id == Some(self.wallet_id)
    }

    /// Signed effect of this transaction on its wallet balance.
    pub fn signed_delta(&self) -> Decimal {
        if self.transaction_type.is_debit() && !self.is_incoming_transfer() {
            -self.amount_in_wallet_currency
        } else {
            self.amount_in_wallet_currency
        }
    }

    pub fn reconcile(&mut self, at: DateTime<Utc>) {
        self.is_reconciled = true;
        self.reconciled_at = Some(at);
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub category_id: Option<String>,
    pub transaction_type: String,
    pub amount: String,
    pub currency: String,
    pub exchange_rate: String,
    pub amount_in_wallet_currency: String,
    pub transaction_date: Date,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub merchant_name: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub is_recurring: bool,
    pub recurring_template_id: Option<String>,
    pub subscription_id: Option<String>,
    pub is_reconciled: bool,
    pub reconciled_at: Option<DateTimeUtc>,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub linked_transaction_id: Option<String>,
    pub parent_transaction_id: Option<String>,
    pub auto_categorized: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            category_id: ActiveValue::Set(optional_uuid_text(tx.category_id)),
            transaction_type: ActiveValue::Set(tx.transaction_type.as_str().to_string()),
            amount: ActiveValue::Set(decimal_text(tx.amount)),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            exchange_rate: ActiveValue::Set(decimal_text(tx.exchange_rate)),
            amount_in_wallet_currency: ActiveValue::Set(decimal_text(
                tx.amount_in_wallet_currency,
            )),
            transaction_date: ActiveValue::Set(tx.transaction_date),
            description: ActiveValue::Set(tx.description.clone()),
            notes: ActiveValue::Set(tx.notes.clone()),
            merchant_name: ActiveValue::Set(tx.merchant_name.clone()),
            location: ActiveValue::Set(tx.location.clone()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            is_recurring: ActiveValue::Set(tx.is_recurring),
            recurring_template_id: ActiveValue::Set(optional_uuid_text(tx.recurring_template_id)),
            subscription_id: ActiveValue::Set(optional_uuid_text(tx.subscription_id)),
            is_reconciled: ActiveValue::Set(tx.is_reconciled),
            reconciled_at: ActiveValue::Set(tx.reconciled_at),
            from_wallet_id: ActiveValue::Set(optional_uuid_text(tx.from_wallet_id)),
            to_wallet_id: ActiveValue::Set(optional_uuid_text(tx.to_wallet_id)),
            linked_transaction_id: ActiveValue::Set(optional_uuid_text(tx.linked_transaction_id)),
            parent_transaction_id: ActiveValue::Set(optional_uuid_text(tx.parent_transaction_id)),
            auto_categorized: ActiveValue::Set(tx.auto_categorized),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
            version: ActiveValue::Set(tx.version),
            deleted: ActiveValue::Set(tx.deleted),
            deleted_at: ActiveValue::Set(tx.deleted_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction_id")?,
            user_id: model.user_id,
            wallet_id: parse_uuid(&model.wallet_id, "wallet_id")?,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category_id")?,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            amount: parse_decimal(&model.amount, "amount")?,
            currency: Currency::try_from(model.currency.as_str())?,
            exchange_rate: parse_decimal(&model.exchange_rate, "exchange_rate")?,
            amount_in_wallet_currency: parse_decimal(
                &model.amount_in_wallet_currency,
                "amount_in_wallet_currency",
            )?,
            transaction_date: model.transaction_date,
            description: model.description,
            notes: model.notes,
            merchant_name: model.merchant_name,
            location: model.location,
            status: TransactionStatus::try_from(model.status.as_str())?,
            is_recurring: model.is_recurring,
            recurring_template_id: parse_optional_uuid(
                model.recurring_template_id.as_deref(),
                "recurring_template_id",
            )?,
            subscription_id: parse_optional_uuid(
                model.subscription_id.as_deref(),
                "subscription_id",
            )?,
            is_reconciled: model.is_reconciled,
            reconciled_at: model.reconciled_at,
            from_wallet_id: parse_optional_uuid(model.from_wallet_id.as_deref(), "from_wallet_id")?,
            to_wallet_id: parse_optional_uuid(model.to_wallet_id.as_deref(), "to_wallet_id")?,
            linked_transaction_id: parse_optional_uuid(
                model.linked_transaction_id.as_deref(),
                "linked_transaction_id",
            )?,
            parent_transaction_id: parse_optional_uuid(
                model.parent_transaction_id.as_deref(),
                "parent_transaction_id",
            )?,
            auto_categorized: model.auto_categorized,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
            deleted: model.deleted,
            deleted_at: model.deleted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn tx(transaction_type: TransactionType, amount: Decimal) -> Transaction {
        Transaction::new(
            "alice".to_string(),
            Uuid::new_v4(),
            transaction_type,
            amount,
            Currency::try_from("USD").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    #[test]
    fn sign_follows_type() {
        assert_eq!(tx(TransactionType::Income, dec!(10)).signed_delta(), dec!(10));
        assert_eq!(tx(TransactionType::Expense, dec!(10)).signed_delta(), dec!(-10));
        assert_eq!(tx(TransactionType::Transfer, dec!(10)).signed_delta(), dec!(-10));
        assert_eq!(tx(TransactionType::Dividend, dec!(10)).signed_delta(), dec!(10));
        assert_eq!(tx(TransactionType::Fee, dec!(10)).signed_delta(), dec!(10));
        assert_eq!(tx(TransactionType::LoanPayment, dec!(10)).signed_delta(), dec!(10));
    }

    #[test]
    fn incoming_transfer_credits_the_wallet() {
        let mut incoming = tx(TransactionType::Transfer, dec!(25));
        incoming.from_wallet_id = Some(Uuid::new_v4());
        incoming.to_wallet_id = Some(incoming.wallet_id);

        assert!(incoming.is_incoming_transfer());
        assert_eq!(incoming.signed_delta(), dec!(25));
    }

    #[test]
    fn exchange_rate_scales_wallet_amount() {
        let mut expense = tx(TransactionType::Expense, dec!(100));
        expense.exchange_rate = dec!(1.0850);
        expense.calculate_amount_in_wallet_currency();

        assert_eq!(expense.amount_in_wallet_currency, dec!(108.50));
        assert_eq!(expense.signed_delta(), dec!(-108.50));
    }

    #[test]
    fn reconcile_stamps_time() {
        let mut income = tx(TransactionType::Income, dec!(1));
        let at = Utc::now();
        income.reconcile(at);
        assert!(income.is_reconciled);
        assert_eq!(income.reconciled_at, Some(at));
    }
}
