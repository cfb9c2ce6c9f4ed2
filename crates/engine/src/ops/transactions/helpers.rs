use rust_decimal::Decimal;

use crate::{
    Currency, ResultEngine, TransactionPatch, ValidationErrors,
    util::require_positive,
};

const MAX_DESCRIPTION: usize = 500;
const MAX_SHORT_TEXT: usize = 100;

/// Where a new transaction comes from; decides its back-references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::ops) enum Origin {
    Manual,
    Recurring(uuid::Uuid),
    Subscription(uuid::Uuid),
}

fn check_len(errors: &mut ValidationErrors, field: &str, value: Option<&str>, max: usize) {
    if value.is_some_and(|text| text.chars().count() > max) {
        errors.add(field, format!("must be at most {max} characters"));
    }
}

pub(super) fn check_texts(
    errors: &mut ValidationErrors,
    description: Option<&str>,
    merchant_name: Option<&str>,
    location: Option<&str>,
) {
    check_len(errors, "description", description, MAX_DESCRIPTION);
    check_len(errors, "merchant_name", merchant_name, MAX_SHORT_TEXT);
    check_len(errors, "location", location, MAX_DESCRIPTION);
}

/// Collects amount, rate and currency violations of a new transaction.
///
/// Returns the parsed currency when one was given.
pub(super) fn validate_new(
    errors: &mut ValidationErrors,
    amount: Decimal,
    exchange_rate: Option<Decimal>,
    currency: Option<&str>,
) -> Option<Currency> {
    require_positive(errors, "amount", amount);
    if let Some(rate) = exchange_rate {
        require_positive(errors, "exchange_rate", rate);
    }
    match currency.map(Currency::try_from) {
        Some(Ok(currency)) => Some(currency),
        Some(Err(_)) => {
            errors.add("currency", "must be a 3-letter currency code");
            None
        }
        None => None,
    }
}

pub(super) fn validate_patch(patch: &TransactionPatch) -> ResultEngine<()> {
    let mut errors = ValidationErrors::new();
    if let Some(amount) = patch.amount {
        require_positive(&mut errors, "amount", amount);
    }
    if let Some(rate) = patch.exchange_rate {
        require_positive(&mut errors, "exchange_rate", rate);
    }
    check_texts(
        &mut errors,
        patch.description.as_deref(),
        patch.merchant_name.as_deref(),
        patch.location.as_deref(),
    );
    errors.finish()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::EngineError;

    #[test]
    fn new_transaction_errors_are_aggregated() {
        let mut errors = ValidationErrors::new();
        let currency = validate_new(&mut errors, dec!(-1), Some(dec!(0)), Some("dollars"));
        assert_eq!(currency, None);

        let Err(EngineError::Validation(errors)) = errors.finish() else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.fields().keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["amount", "currency", "exchange_rate"]);
    }

    #[test]
    fn patch_without_changes_is_valid() {
        assert!(validate_patch(&TransactionPatch::default()).is_ok());
    }

    #[test]
    fn long_description_is_rejected() {
        let patch = TransactionPatch {
            description: Some("x".repeat(501)),
            ..TransactionPatch::default()
        };
        assert!(validate_patch(&patch).is_err());
    }
}
