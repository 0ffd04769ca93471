//! Loan renewal rule and form types
//!
//! A librarian may move a copy's due date to any day from today up to four
//! weeks ahead. The form proposes three weeks by default.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::book_instance::BookInstance;

/// Latest acceptable renewal, in days after today
pub const MAX_RENEWAL_DAYS: i64 = 28;

/// Renewal proposed when the form is first shown, in days after today
pub const DEFAULT_RENEWAL_DAYS: i64 = 21;

/// Why a proposed renewal date was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal in past")]
    InPast,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead,
}

/// Accept `proposed` iff `today <= proposed <= today + 28 days`
pub fn validate_renewal_date(
    proposed: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if proposed < today {
        return Err(RenewalDateError::InPast);
    }
    if proposed > today + Duration::days(MAX_RENEWAL_DAYS) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(proposed)
}

pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(DEFAULT_RENEWAL_DAYS)
}

/// Renewal form submission
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// Enter a date between now and 4 weeks (default 3)
    pub renewal_date: NaiveDate,
}

/// Form state presented to the client
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalFormState {
    pub renewal_date: NaiveDate,
    /// Field name to messages; empty when the form is valid
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Context of the renewal page: the copy and the form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalContext {
    pub book_instance: BookInstance,
    pub form: RenewalFormState,
}

impl RenewalContext {
    /// Fresh form proposing the default date
    pub fn initial(book_instance: BookInstance, today: NaiveDate) -> Self {
        Self {
            book_instance,
            form: RenewalFormState {
                renewal_date: default_renewal_date(today),
                errors: BTreeMap::new(),
            },
        }
    }

    /// Form re-presented with the rejected date and a field-level message
    pub fn rejected(
        book_instance: BookInstance,
        proposed: NaiveDate,
        error: RenewalDateError,
    ) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert("renewal_date".to_string(), vec![error.to_string()]);
        Self {
            book_instance,
            form: RenewalFormState {
                renewal_date: proposed,
                errors,
            },
        }
    }
}
