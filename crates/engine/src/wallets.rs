//! The module contains `Wallet` struct and its implementation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine,
    util::{
        decimal_text, labeled_enum, optional_decimal_text, parse_decimal, parse_optional_decimal,
        parse_uuid,
    },
};

labeled_enum! {
    /// Kind of account a wallet represents.
    pub enum WalletType {
        Cash => "CASH",
        Checking => "CHECKING",
        Savings => "SAVINGS",
        CreditCard => "CREDIT_CARD",
        DebitCard => "DEBIT_CARD",
        Investment => "INVESTMENT",
        Loan => "LOAN",
        Mortgage => "MORTGAGE",
        Crypto => "CRYPTO",
        EWallet => "E_WALLET",
        Prepaid => "PREPAID",
        Other => "OTHER",
    }
}

/// A wallet.
///
/// A wallet is a container of money owned by one user: a bank account, a
/// credit card, some cash. Its balance is only ever changed through the
/// balance mutation operations of the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub wallet_type: WalletType,
    pub currency: Currency,
    pub balance: Decimal,
    pub initial_balance: Decimal,
    /// Only set for credit wallets.
    pub credit_limit: Option<Decimal>,
    /// `credit_limit - |balance|`, kept in sync by [`Wallet::update_balance`].
    pub available_credit: Option<Decimal>,
    pub is_default: bool,
    pub is_archived: bool,
    pub exclude_from_totals: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Wallet {
    pub fn new(
        user_id: String,
        name: String,
        wallet_type: WalletType,
        currency: Currency,
        initial_balance: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: None,
            wallet_type,
            currency,
            balance: initial_balance,
            initial_balance,
            credit_limit: None,
            available_credit: None,
            is_default: false,
            is_archived: false,
            exclude_from_totals: false,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
            deleted: false,
            deleted_at: None,
        }
    }

    /// Sets the credit limit and derives the available credit from the
    /// current balance.
    #[must_use]
    pub fn with_credit_limit(mut self, credit_limit: Option<Decimal>) -> Self {
        self.credit_limit = credit_limit;
        self.refresh_available_credit();
        self
    }

    /// Adds a signed amount to the balance.
    pub fn update_balance(&mut self, delta: Decimal) {
        self.balance += delta;
        self.refresh_available_credit();
    }

    fn refresh_available_credit(&mut self) {
        self.available_credit = self
            .credit_limit
            .map(|limit| limit - self.balance.abs());
    }

    /// Whether `amount` can be spent from this wallet.
    ///
    /// Credit cards check the available credit, everything else the balance.
    pub fn has_sufficient_balance(&self, amount: Decimal) -> bool {
        match (self.wallet_type, self.available_credit) {
            (WalletType::CreditCard, Some(available)) => available >= amount,
            _ => self.balance >= amount,
        }
    }

    pub fn archive(&mut self) {
        self.is_archived = true;
        self.is_default = false;
    }

    pub fn unarchive(&mut self) {
        self.is_archived = false;
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
        self.is_default = false;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub wallet_type: String,
    pub currency: String,
    pub balance: String,
    pub initial_balance: String,
    pub credit_limit: Option<String>,
    pub available_credit: Option<String>,
    pub is_default: bool,
    pub is_archived: bool,
    pub exclude_from_totals: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i64,
    pub deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            wallet_type: ActiveValue::Set(value.wallet_type.as_str().to_string()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            balance: ActiveValue::Set(decimal_text(value.balance)),
            initial_balance: ActiveValue::Set(decimal_text(value.initial_balance)),
            credit_limit: ActiveValue::Set(optional_decimal_text(value.credit_limit)),
            available_credit: ActiveValue::Set(optional_decimal_text(value.available_credit)),
            is_default: ActiveValue::Set(value.is_default),
            is_archived: ActiveValue::Set(value.is_archived),
            exclude_from_totals: ActiveValue::Set(value.exclude_from_totals),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            version: ActiveValue::Set(value.version),
            deleted: ActiveValue::Set(value.deleted),
            deleted_at: ActiveValue::Set(value.deleted_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet_id")?,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            wallet_type: WalletType::try_from(model.wallet_type.as_str())?,
            currency: Currency::try_from(model.currency.as_str())?,
            balance: parse_decimal(&model.balance, "balance")?,
            initial_balance: parse_decimal(&model.initial_balance, "initial_balance")?,
            credit_limit: parse_optional_decimal(model.credit_limit.as_deref(), "credit_limit")?,
            available_credit: parse_optional_decimal(
                model.available_credit.as_deref(),
                "available_credit",
            )?,
            is_default: model.is_default,
            is_archived: model.is_archived,
            exclude_from_totals: model.exclude_from_totals,
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

    fn wallet(wallet_type: WalletType, balance: Decimal) -> Wallet {
        Wallet::new(
            "alice".to_string(),
            "Main".to_string(),
            wallet_type,
            Currency::try_from("USD").unwrap(),
            balance,
        )
    }

    #[test]
    fn update_balance_adds_signed_amount() {
        let mut wallet = wallet(WalletType::Checking, dec!(1000.00));
        wallet.update_balance(dec!(-200.00));
        wallet.update_balance(dec!(50.25));

        assert_eq!(wallet.balance, dec!(850.25));
        assert_eq!(wallet.available_credit, None);
    }

    #[test]
    fn credit_wallet_tracks_available_credit() {
        let mut wallet =
            wallet(WalletType::CreditCard, Decimal::ZERO).with_credit_limit(Some(dec!(1000)));
        assert_eq!(wallet.available_credit, Some(dec!(1000)));

        wallet.update_balance(dec!(-300));
        assert_eq!(wallet.balance, dec!(-300));
        assert_eq!(wallet.available_credit, Some(dec!(700)));
        assert!(wallet.has_sufficient_balance(dec!(700)));
        assert!(!wallet.has_sufficient_balance(dec!(700.01)));
    }

    #[test]
    fn plain_wallet_checks_balance() {
        let wallet = wallet(WalletType::Cash, dec!(10));
        assert!(wallet.has_sufficient_balance(dec!(10)));
        assert!(!wallet.has_sufficient_balance(dec!(10.01)));
    }

    #[test]
    fn archive_clears_default_flag() {
        let mut wallet = wallet(WalletType::Cash, Decimal::ZERO);
        wallet.is_default = true;
        wallet.archive();
        assert!(wallet.is_archived);
        assert!(!wallet.is_default);
    }
}
