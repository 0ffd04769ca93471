//! Loan service: borrowed listings and due date renewal

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        renewal::{validate_renewal_date, RenewalContext},
        BookInstance, BorrowedCopy,
    },
    repository::{Paged, Repository},
};

/// Result of a renewal submission
#[derive(Debug, Clone)]
pub enum RenewalOutcome {
    /// The due date was changed
    Renewed(BookInstance),
    /// The date was refused; nothing was written
    Rejected(RenewalContext),
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan to one borrower, soonest due first
    pub async fn borrowed_by(
        &self,
        user_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Paged<BorrowedCopy>> {
        self.repository
            .instances
            .on_loan(Some(user_id), offset, limit)
            .await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, offset: i64, limit: i64) -> AppResult<Paged<BorrowedCopy>> {
        self.repository.instances.on_loan(None, offset, limit).await
    }

    /// Renewal form for a copy, proposing the default date
    pub async fn renewal_form(&self, instance_id: Uuid, today: NaiveDate) -> AppResult<RenewalContext> {
        let instance = self.repository.instances.get(instance_id).await?;
        Ok(RenewalContext::initial(instance, today))
    }

    /// Move the due date of a copy to `proposed` when it falls within the
    /// renewal window starting at `today`. Only `due_back` changes.
    pub async fn renew(
        &self,
        instance_id: Uuid,
        proposed: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let instance = self.repository.instances.get(instance_id).await?;

        match validate_renewal_date(proposed, today) {
            Ok(date) => {
                let renewed = self
                    .repository
                    .instances
                    .set_due_back(instance.id, date)
                    .await?;
                tracing::info!("Renewed copy {} until {}", renewed.id, date);
                Ok(RenewalOutcome::Renewed(renewed))
            }
            Err(error) => {
                tracing::debug!("Refused renewal of copy {} to {}: {}", instance.id, proposed, error);
                Ok(RenewalOutcome::Rejected(RenewalContext::rejected(
                    instance, proposed, error,
                )))
            }
        }
    }
}
