//! Recurring templates and the daily sweep that materializes them.

use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, NewRecurring, Notification, RecurringStatus, RecurringTransaction,
    ResultEngine, ValidationErrors, codes, recurring,
    schedule::MAX_INTERVAL_COUNT,
    util::{normalize_optional_text, require_name, require_positive},
};

use super::{Engine, access, transactions::Origin, with_tx};

const AUTO_CREATED_NOTE: &str = "Auto-created from recurring template";

/// Outcome of one scheduler sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecurringRunReport {
    /// Templates that were due when the sweep started.
    pub processed: usize,
    pub created: usize,
    /// Templates whose occurrence could not be created; retried on the next
    /// sweep.
    pub failed: Vec<Uuid>,
}

impl Engine {
    pub async fn create_recurring(
        &self,
        user_id: &str,
        cmd: NewRecurring,
    ) -> ResultEngine<RecurringTransaction> {
        let mut errors = ValidationErrors::new();
        let name = require_name(&mut errors, "name", &cmd.name);
        require_positive(&mut errors, "amount", cmd.amount);
        if cmd.interval_count == 0 || cmd.interval_count > MAX_INTERVAL_COUNT {
            errors.add(
                "interval_count",
                format!("must be between 1 and {MAX_INTERVAL_COUNT}"),
            );
        }
        if cmd
            .max_occurrences
            .is_some_and(|max| max == 0 || i32::try_from(max).is_err())
        {
            errors.add("max_occurrences", "must be a positive count");
        }
        if cmd.end_date.is_some_and(|end| end < cmd.start_date) {
            errors.add("end_date", "must not be before start_date");
        }
        let currency = match cmd.currency.as_deref().map(crate::Currency::try_from) {
            Some(Ok(currency)) => Some(currency),
            Some(Err(_)) => {
                errors.add("currency", "must be a 3-letter currency code");
                None
            }
            None => None,
        };
        errors.finish()?;

        with_tx!(self, |db_tx| {
            let wallet = access::load_wallet(&db_tx, cmd.wallet_id, user_id).await?;
            access::ensure_wallet_open(&wallet)?;

            let mut template = RecurringTransaction::new(
                user_id.to_string(),
                wallet.id,
                name,
                cmd.transaction_type,
                cmd.amount,
                currency.unwrap_or_else(|| wallet.currency.clone()),
                cmd.frequency,
                cmd.start_date,
            );
            template.category_id = cmd.category_id;
            template.description = normalize_optional_text(cmd.description.as_deref());
            template.interval_count = cmd.interval_count;
            template.end_date = cmd.end_date;
            template.max_occurrences = cmd.max_occurrences;
            template.auto_create = cmd.auto_create;
            access::insert_recurring(&db_tx, &template).await?;
            tracing::info!(template_id = %template.id, user_id, "recurring template created");
            Ok(template)
        })
    }

    pub async fn recurring(
        &self,
        user_id: &str,
        template_id: Uuid,
    ) -> ResultEngine<RecurringTransaction> {
        with_tx!(self, |db_tx| {
            access::load_recurring(&db_tx, template_id, user_id).await
        })
    }

    pub async fn recurring_for_user(&self, user_id: &str) -> ResultEngine<Vec<RecurringTransaction>> {
        with_tx!(self, |db_tx| {
            let models = recurring::Entity::find()
                .filter(recurring::Column::UserId.eq(user_id))
                .filter(recurring::Column::Deleted.eq(false))
                .order_by_asc(recurring::Column::NextOccurrenceDate)
                .order_by_asc(recurring::Column::Name)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(RecurringTransaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn pause_recurring(
        &self,
        user_id: &str,
        template_id: Uuid,
    ) -> ResultEngine<RecurringTransaction> {
        self.change_recurring(user_id, template_id, RecurringTransaction::pause)
            .await
    }

    /// Reactivates a paused template. Completed and cancelled templates stay
    /// terminal.
    pub async fn resume_recurring(
        &self,
        user_id: &str,
        template_id: Uuid,
    ) -> ResultEngine<RecurringTransaction> {
        self.change_recurring(user_id, template_id, RecurringTransaction::resume)
            .await
    }

    pub async fn cancel_recurring(
        &self,
        user_id: &str,
        template_id: Uuid,
    ) -> ResultEngine<RecurringTransaction> {
        self.change_recurring(user_id, template_id, RecurringTransaction::cancel)
            .await
    }

    async fn change_recurring(
        &self,
        user_id: &str,
        template_id: Uuid,
        change: fn(&mut RecurringTransaction),
    ) -> ResultEngine<RecurringTransaction> {
        with_tx!(self, |db_tx| {
            let mut template = access::load_recurring(&db_tx, template_id, user_id).await?;
            if template.status.is_terminal() {
                return Err(EngineError::rule(
                    codes::RECURRING_TERMINATED,
                    format!("recurring template is {}", template.status),
                ));
            }
            change(&mut template);
            access::save_recurring(&db_tx, &mut template).await?;
            tracing::info!(%template_id, status = %template.status, "recurring template changed");
            Ok(template)
        })
    }

    pub async fn delete_recurring(&self, user_id: &str, template_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut template = access::load_recurring(&db_tx, template_id, user_id).await?;
            template.soft_delete(Utc::now());
            access::save_recurring(&db_tx, &mut template).await?;
            Ok(())
        })
    }

    /// Materializes every template due on `today`, one occurrence each.
    ///
    /// Each template is its own unit of work: a failure is logged, reported
    /// in [`RecurringRunReport::failed`] and does not stop the sweep.
    pub async fn run_recurring(&self, today: NaiveDate) -> ResultEngine<RecurringRunReport> {
        let due: Vec<Uuid> = with_tx!(self, |db_tx| {
            let models = recurring::Entity::find()
                .filter(recurring::Column::Deleted.eq(false))
                .filter(recurring::Column::Status.eq(RecurringStatus::Active.as_str()))
                .filter(recurring::Column::AutoCreate.eq(true))
                .filter(recurring::Column::NextOccurrenceDate.lte(today))
                .order_by_asc(recurring::Column::NextOccurrenceDate)
                .order_by_asc(recurring::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(|model| crate::util::parse_uuid(&model.id, "template_id"))
                .collect::<ResultEngine<Vec<_>>>()
        })?;

        let mut report = RecurringRunReport {
            processed: due.len(),
            ..RecurringRunReport::default()
        };
        for template_id in due {
            match self.materialize_occurrence(template_id, today).await {
                Ok(true) => report.created += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(%template_id, error = %err, "recurring occurrence failed");
                    report.failed.push(template_id);
                }
            }
        }
        tracing::info!(
            %today,
            processed = report.processed,
            created = report.created,
            failed = report.failed.len(),
            "recurring sweep finished"
        );
        Ok(report)
    }

    /// Creates the pending occurrence of one template and advances it.
    async fn materialize_occurrence(&self, template_id: Uuid, today: NaiveDate) -> ResultEngine<bool> {
        let outcome = with_tx!(self, |db_tx| {
            self.occurrence_in(&db_tx, template_id, today).await
        })?;
        let Some(notifications) = outcome else {
            return Ok(false);
        };
        self.dispatch(notifications);
        Ok(true)
    }

    /// `None` when nothing was created. Templates already past their end
    /// date are completed instead.
    async fn occurrence_in(
        &self,
        db_tx: &DatabaseTransaction,
        template_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Option<Vec<Notification>>> {
        let mut template = access::find_recurring(db_tx, template_id).await?;
        if template.expire(today) {
            access::save_recurring(db_tx, &mut template).await?;
            tracing::info!(%template_id, "recurring template past its end date completed");
            return Ok(None);
        }
        let Some(date) = template.next_occurrence_date else {
            return Ok(None);
        };
        if !template.should_create_next_occurrence(today) {
            return Ok(None);
        }

        let mut cmd = CreateTransactionCmd::new(
            template.wallet_id,
            template.transaction_type,
            template.amount,
            date,
        )
        .currency(template.currency.code())
        .description(template.name.clone())
        .notes(AUTO_CREATED_NOTE);
        cmd.category_id = template.category_id;

        let (tx, notifications) = self
            .create_transaction_in(
                db_tx,
                &template.user_id,
                cmd,
                Origin::Recurring(template.id),
            )
            .await?;
        template.mark_occurrence_created();
        access::save_recurring(db_tx, &mut template).await?;
        tracing::info!(
            %template_id,
            transaction_id = %tx.id,
            occurrence = template.occurrence_count,
            status = %template.status,
            "recurring occurrence created"
        );
        Ok(Some(notifications))
    }
}
