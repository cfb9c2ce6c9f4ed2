use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Uniform response envelope.
///
/// Successful calls carry `data`, failed calls carry `error`; `success`
/// tells them apart.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable machine-readable code, e.g. `RESOURCE_NOT_FOUND`.
    pub code: String,
    pub message: String,
    /// Field → message map for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

/// Inclusive date range used by list and report endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
        /// `CASH`, `CHECKING`, `CREDIT_CARD`, ...
        pub wallet_type: String,
        pub currency: String,
        #[serde(default)]
        pub initial_balance: Option<Decimal>,
        #[serde(default)]
        pub credit_limit: Option<Decimal>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub exclude_from_totals: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub credit_limit: Option<Decimal>,
        pub exclude_from_totals: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletList {
        #[serde(default)]
        pub include_archived: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TotalBalanceQuery {
        pub currency: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalBalance {
        pub currency: Option<String>,
        pub total: Decimal,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub wallet_id: Uuid,
        /// `INCOME`, `EXPENSE`, `TRANSFER`, ...
        pub transaction_type: String,
        pub amount: Decimal,
        pub transaction_date: NaiveDate,
        #[serde(default)]
        pub currency_code: Option<String>,
        #[serde(default)]
        pub exchange_rate: Option<Decimal>,
        #[serde(default)]
        pub category_id: Option<Uuid>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub notes: Option<String>,
        #[serde(default)]
        pub merchant_name: Option<String>,
        #[serde(default)]
        pub location: Option<String>,
        #[serde(default)]
        pub parent_transaction_id: Option<Uuid>,
    }

    /// Partial update; absent fields stay unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount: Option<Decimal>,
        pub transaction_type: Option<String>,
        pub exchange_rate: Option<Decimal>,
        pub transaction_date: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
        pub description: Option<String>,
        pub notes: Option<String>,
        pub merchant_name: Option<String>,
        pub location: Option<String>,
    }

    /// Query string of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub wallet_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        /// Comma separated list of transaction types.
        pub types: Option<String>,
        pub recurring_template_id: Option<Uuid>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_wallet_id: Uuid,
        pub to_wallet_id: Uuid,
        pub amount: Decimal,
        pub transaction_date: NaiveDate,
        #[serde(default)]
        pub exchange_rate: Option<Decimal>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub notes: Option<String>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub name: String,
        pub amount: Decimal,
        pub currency: String,
        /// `DAILY`, `WEEKLY`, `MONTHLY`, ..., `CUSTOM`.
        pub period: String,
        pub start_date: NaiveDate,
        #[serde(default)]
        pub end_date: Option<NaiveDate>,
        #[serde(default)]
        pub category_id: Option<Uuid>,
        #[serde(default)]
        pub wallet_id: Option<Uuid>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub alert_threshold: Option<Decimal>,
        #[serde(default)]
        pub alert_enabled: Option<bool>,
        #[serde(default)]
        pub rollover_enabled: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub amount: Option<Decimal>,
        pub end_date: Option<NaiveDate>,
        pub alert_threshold: Option<Decimal>,
        pub alert_enabled: Option<bool>,
        pub rollover_enabled: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSpend {
        pub amount: Decimal,
    }

    /// Both dates optional: the next range is derived from the period.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetReset {
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetQuery {
        /// Only budgets active on this date.
        pub active_on: Option<NaiveDate>,
    }
}

pub mod recurring {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecurringNew {
        pub wallet_id: Uuid,
        pub name: String,
        pub transaction_type: String,
        pub amount: Decimal,
        pub frequency: String,
        pub start_date: NaiveDate,
        #[serde(default)]
        pub currency: Option<String>,
        #[serde(default)]
        pub interval_count: Option<u32>,
        #[serde(default)]
        pub end_date: Option<NaiveDate>,
        #[serde(default)]
        pub max_occurrences: Option<u32>,
        #[serde(default)]
        pub auto_create: Option<bool>,
        #[serde(default)]
        pub category_id: Option<Uuid>,
        #[serde(default)]
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecurringRun {
        /// Defaults to today in the server's configured timezone.
        pub date: Option<NaiveDate>,
    }
}

pub mod subscription {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubscriptionNew {
        pub wallet_id: Uuid,
        pub name: String,
        pub amount: Decimal,
        pub billing_frequency: String,
        pub start_date: NaiveDate,
        #[serde(default)]
        pub currency: Option<String>,
        #[serde(default)]
        pub next_billing_date: Option<NaiveDate>,
        #[serde(default)]
        pub end_date: Option<NaiveDate>,
        #[serde(default)]
        pub category_id: Option<Uuid>,
        #[serde(default)]
        pub provider_name: Option<String>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub reminder_enabled: Option<bool>,
        #[serde(default)]
        pub reminder_days_before: Option<u32>,
        #[serde(default)]
        pub auto_create_transaction: Option<bool>,
        #[serde(default)]
        pub free_trial_end_date: Option<NaiveDate>,
        #[serde(default)]
        pub website_url: Option<String>,
        #[serde(default)]
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SubscriptionBilling {
        /// Also book the bill as an expense. Defaults to the subscription's
        /// own setting.
        pub post_transaction: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SubscriptionDateQuery {
        pub date: Option<NaiveDate>,
    }
}

pub mod goal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        pub name: String,
        pub target_amount: Decimal,
        pub currency: String,
        #[serde(default)]
        pub wallet_id: Option<Uuid>,
        #[serde(default)]
        pub target_date: Option<NaiveDate>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub priority: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub target_amount: Option<Decimal>,
        pub target_date: Option<NaiveDate>,
        pub priority: Option<i32>,
        pub status: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalContribution {
        pub amount: Decimal,
    }
}

pub mod rule {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RuleNew {
        pub category_id: Uuid,
        pub name: String,
        /// `DESCRIPTION`, `MERCHANT`, `AMOUNT` or `LOCATION`.
        pub field: String,
        /// `CONTAINS`, `EQUALS`, `STARTS_WITH`, `ENDS_WITH`, `REGEX`,
        /// `GREATER_THAN` or `LESS_THAN`.
        pub condition: String,
        pub value: String,
        #[serde(default)]
        pub priority: i32,
        #[serde(default)]
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RuleView {
        pub id: Uuid,
        pub category_id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub field: String,
        pub condition: String,
        pub value: String,
        pub priority: i32,
        pub is_active: bool,
        pub apply_count: u32,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TrendQuery {
        pub months: Option<u32>,
        /// Defaults to today.
        pub today: Option<NaiveDate>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_omits_data() {
        let body = ApiResponse::failure(ApiError {
            code: "VALIDATION_ERROR".to_string(),
            message: "validation failed".to_string(),
            details: Some(BTreeMap::from([(
                "amount".to_string(),
                "must be greater than 0".to_string(),
            )])),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["details"]["amount"], "must be greater than 0");
    }

    #[test]
    fn optional_request_fields_default() {
        let body: transaction::TransactionNew = serde_json::from_str(
            r#"{"wallet_id":"7b0e8c7e-3c36-4a39-9a37-7f5fbbf9d2a1","transaction_type":"EXPENSE","amount":"12.50","transaction_date":"2024-01-01"}"#,
        )
        .unwrap();
        assert_eq!(body.amount, Decimal::new(1250, 2));
        assert!(body.exchange_rate.is_none());
        assert!(body.category_id.is_none());
    }
}
