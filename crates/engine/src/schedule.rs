//! Calendar arithmetic shared by budgets, recurring templates and
//! subscriptions.

use chrono::{Days, Months, NaiveDate};

use crate::util::labeled_enum;

labeled_enum! {
    /// How often something repeats.
    ///
    /// `Custom` has no calendar step: templates using it wait for the user to
    /// set the next date explicitly.
    pub enum Frequency {
        Daily => "DAILY",
        Weekly => "WEEKLY",
        Biweekly => "BIWEEKLY",
        Monthly => "MONTHLY",
        Quarterly => "QUARTERLY",
        Yearly => "YEARLY",
        Custom => "CUSTOM",
    }
}

/// Largest step multiplier accepted for recurring templates.
pub(crate) const MAX_INTERVAL_COUNT: u32 = 1_000;

/// Budget periods use the same calendar units as recurring schedules.
pub type BudgetPeriod = Frequency;

impl Frequency {
    /// Moves `date` forward by `count` steps.
    ///
    /// Month based steps clamp to the last day of the target month
    /// (Jan 31 + 1 month = Feb 28/29). Returns `None` for `Custom` and on
    /// calendar overflow.
    #[must_use]
    pub fn advance(self, date: NaiveDate, count: u32) -> Option<NaiveDate> {
        let count = count.max(1);
        match self {
            Self::Daily => date.checked_add_days(Days::new(u64::from(count))),
            Self::Weekly => date.checked_add_days(Days::new(7 * u64::from(count))),
            Self::Biweekly => date.checked_add_days(Days::new(14 * u64::from(count))),
            Self::Monthly => date.checked_add_months(Months::new(count)),
            Self::Quarterly => date.checked_add_months(Months::new(count.checked_mul(3)?)),
            Self::Yearly => date.checked_add_months(Months::new(count.checked_mul(12)?)),
            Self::Custom => None,
        }
    }

    /// Last day of a single period starting at `start`.
    #[must_use]
    pub fn period_end(self, start: NaiveDate) -> Option<NaiveDate> {
        self.advance(start, 1)?.pred_opt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn steps_by_frequency() {
        let start = d(2024, 1, 1);
        assert_eq!(Frequency::Daily.advance(start, 3), Some(d(2024, 1, 4)));
        assert_eq!(Frequency::Weekly.advance(start, 1), Some(d(2024, 1, 8)));
        assert_eq!(Frequency::Biweekly.advance(start, 1), Some(d(2024, 1, 15)));
        assert_eq!(Frequency::Monthly.advance(start, 1), Some(d(2024, 2, 1)));
        assert_eq!(Frequency::Quarterly.advance(start, 1), Some(d(2024, 4, 1)));
        assert_eq!(Frequency::Yearly.advance(start, 2), Some(d(2026, 1, 1)));
        assert_eq!(Frequency::Custom.advance(start, 1), None);
    }

    #[test]
    fn month_steps_clamp_to_month_end() {
        assert_eq!(
            Frequency::Monthly.advance(d(2024, 1, 31), 1),
            Some(d(2024, 2, 29))
        );
        assert_eq!(
            Frequency::Yearly.advance(d(2024, 2, 29), 1),
            Some(d(2025, 2, 28))
        );
    }

    #[test]
    fn period_end_is_inclusive() {
        assert_eq!(
            Frequency::Monthly.period_end(d(2024, 2, 1)),
            Some(d(2024, 2, 29))
        );
        assert_eq!(Frequency::Daily.period_end(d(2024, 2, 1)), Some(d(2024, 2, 1)));
    }

    #[test]
    fn huge_counts_overflow_to_none() {
        let start = d(2024, 1, 1);
        assert_eq!(Frequency::Yearly.advance(start, 400_000_000), None);
        assert_eq!(Frequency::Quarterly.advance(start, u32::MAX), None);
        assert_eq!(Frequency::Monthly.advance(start, u32::MAX), None);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Frequency::try_from("biweekly").unwrap(), Frequency::Biweekly);
        assert!(Frequency::try_from("fortnightly").is_err());
    }
}
