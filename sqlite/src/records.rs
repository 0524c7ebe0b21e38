//! Typed identifiers and result records for catalog queries.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

row_id!(
    /// `Members.MemberID`.
    MemberId
);
row_id!(
    /// `BookCopies.CopyID`.
    CopyId
);
row_id!(
    /// `Loans.LoanID`.
    LoanId
);

/// `BookCopies.Status`.
///
/// # Examples
///
/// ```
/// use library_erd_sqlite::CopyStatus;
///
/// let status: CopyStatus = "on_loan".parse().unwrap();
/// assert_eq!(status, CopyStatus::OnLoan);
/// assert_eq!(CopyStatus::Available.as_str(), "available");
/// assert!("borrowed".parse::<CopyStatus>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    Available,
    OnLoan,
    Maintenance,
    Lost,
}

impl CopyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CopyStatus::Available => "available",
            CopyStatus::OnLoan => "on_loan",
            CopyStatus::Maintenance => "maintenance",
            CopyStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CopyStatus::Available),
            "on_loan" => Ok(CopyStatus::OnLoan),
            "maintenance" => Ok(CopyStatus::Maintenance),
            "lost" => Ok(CopyStatus::Lost),
            other => Err(format!("unknown copy status '{other}'")),
        }
    }
}

impl ToSql for CopyStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CopyStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Outcome of a successful [`Catalog::loan_copy`](crate::Catalog::loan_copy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanReceipt {
    pub loan_id: LoanId,
    pub copy_id: CopyId,
    pub member_id: MemberId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// One row of [`Catalog::list_active_loans`](crate::Catalog::list_active_loans).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveLoan {
    pub loan_id: LoanId,
    pub copy_id: CopyId,
    /// `FirstName LastName`.
    pub member_name: String,
    pub title: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Always `None` for active loans; kept so the record mirrors the row.
    pub actual_return_date: Option<NaiveDate>,
}

impl ActiveLoan {
    /// True when the due date is before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today
    }
}
