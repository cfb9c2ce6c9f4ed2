//! Daily recurring-transaction job.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use engine::{Engine, RecurringRunReport};

/// Used when no run time can be resolved in the next days.
const FALLBACK_WAIT: Duration = Duration::from_secs(60 * 60);

/// Runs the recurring sweep once per local calendar day at `hour`.
pub async fn run(engine: Arc<Engine>, timezone: Tz, hour: u32) {
    tracing::info!(%timezone, hour, "recurring scheduler started");
    loop {
        let now = Utc::now().with_timezone(&timezone);
        let wait = until_next_run(now, hour).unwrap_or(FALLBACK_WAIT);
        tracing::debug!(seconds = wait.as_secs(), "waiting for next recurring sweep");
        tokio::time::sleep(wait).await;

        let today = Utc::now().with_timezone(&timezone).date_naive();
        sweep(&engine, today).await;
    }
}

/// Runs one sweep. The engine logs the summary and each failed template, so
/// only an aborted sweep is reported here.
pub async fn sweep(engine: &Engine, today: NaiveDate) -> Option<RecurringRunReport> {
    match engine.run_recurring(today).await {
        Ok(report) => Some(report),
        Err(err) => {
            tracing::error!(%today, "recurring sweep failed: {err}");
            None
        }
    }
}

/// Time left until the next `hour:00` local time strictly after `now`.
///
/// Days where that hour does not exist (DST gap) are skipped.
fn until_next_run(now: DateTime<Tz>, hour: u32) -> Option<Duration> {
    let timezone = now.timezone();
    let today = now.date_naive();
    (0..3)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|date| date.and_hms_opt(hour, 0, 0))
        .filter_map(|naive| timezone.from_local_datetime(&naive).earliest())
        .find(|candidate| *candidate > now)
        .and_then(|next| (next - now).to_std().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_hands_back_the_engine_report() {
        use migration::MigratorTrait;

        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();

        let today = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let report = sweep(&engine, today).await;
        assert_eq!(report, Some(RecurringRunReport::default()));
    }

    #[test]
    fn waits_for_later_today() {
        let now = chrono_tz::UTC.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
        assert_eq!(until_next_run(now, 2), Some(Duration::from_secs(30 * 60)));
    }

    #[test]
    fn rolls_to_tomorrow_once_the_hour_passed() {
        let now = chrono_tz::UTC.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
        assert_eq!(until_next_run(now, 2), Some(Duration::from_secs(24 * 3600)));
    }

    #[test]
    fn skips_a_missing_local_hour() {
        // 02:00 does not exist in Rome on 2025-03-30.
        let now = chrono_tz::Europe::Rome
            .with_ymd_and_hms(2025, 3, 30, 0, 0, 0)
            .unwrap();
        assert_eq!(until_next_run(now, 2), Some(Duration::from_secs(25 * 3600)));
    }
}
