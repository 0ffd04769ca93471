//! Book instance (loanable copy) model and related types

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::UserShort;

/// Availability of a copy.
///
/// Any status may be set from any other; nothing checks consistency with
/// `due_back` or `borrower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    /// Single-character storage code
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "d",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "d" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(format!("Invalid loan status code: {}", other)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// A physical copy of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl BookInstance {
    /// True when the copy was due strictly before `today`
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.due_back.map(|due| due < today).unwrap_or(false)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Utc::now().date_naive())
    }

    /// Listing order: by due date ascending, copies without one last
    pub fn due_back_order(a: &BookInstance, b: &BookInstance) -> std::cmp::Ordering {
        match (a.due_back, b.due_back) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    }
}

/// Copy on loan, as shown on the borrowed listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowedCopy {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower: Option<UserShort>,
    pub is_overdue: bool,
}

/// Create or update book instance request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInstanceForm {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: String,
    #[serde(default)]
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

impl BookInstanceForm {
    pub fn into_instance(self, id: Uuid) -> BookInstance {
        BookInstance {
            id,
            book_id: self.book_id,
            imprint: self.imprint,
            due_back: self.due_back,
            borrower_id: self.borrower_id,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: 1,
            imprint: "Ace, 1974".into(),
            due_back,
            borrower_id: None,
            status: LoanStatus::OnLoan,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overdue_only_strictly_before_today() {
        let today = date(2024, 1, 10);
        assert!(copy(Some(date(2024, 1, 9))).is_overdue_on(today));
        assert!(!copy(Some(today)).is_overdue_on(today));
        assert!(!copy(Some(date(2024, 1, 11))).is_overdue_on(today));
        assert!(!copy(None).is_overdue_on(today));
    }

    #[test]
    fn status_codes_parse_back() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.code().parse::<LoanStatus>(), Ok(status));
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn new_copies_default_to_maintenance() {
        let form: BookInstanceForm =
            serde_json::from_str(r#"{"book_id": 1, "imprint": "Gollancz"}"#).unwrap();
        assert_eq!(form.status, LoanStatus::Maintenance);
    }

    #[test]
    fn undated_copies_sort_last() {
        let mut copies = vec![
            copy(None),
            copy(Some(date(2024, 3, 1))),
            copy(Some(date(2024, 2, 1))),
        ];
        copies.sort_by(BookInstance::due_back_order);
        let dates: Vec<_> = copies.iter().map(|c| c.due_back).collect();
        assert_eq!(
            dates,
            vec![Some(date(2024, 2, 1)), Some(date(2024, 3, 1)), None]
        );
    }
}
