//! Catalog operations over the library tables.
//!
//! [`Catalog`] borrows an open connection and exposes the member, copy and
//! loan operations. Every mutation runs in its own transaction and is rolled
//! back on any failure inside it.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use library_erd_sqlite::Catalog;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("library.db").unwrap();
//! let catalog = Catalog::new(&conn).unwrap();
//!
//! let expiry = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
//! if let Some(member) = catalog.add_member("Alice", "Future", "alice@x.com", expiry).unwrap() {
//!     if let Some(copy) = catalog.find_available_copy("1984").unwrap() {
//!         let receipt = catalog.loan_copy(copy, member).unwrap();
//!         println!("due back {}", receipt.due_date);
//!     }
//! }
//!
//! for loan in catalog.list_active_loans().unwrap() {
//!     println!("{}: '{}' due {}", loan.member_name, loan.title, loan.due_date);
//! }
//! ```

use chrono::{Days, Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::error::{
    Result, StoreError, failure_reason, is_unique_violation, store_err, store_err_for,
};
use crate::records::{ActiveLoan, CopyId, CopyStatus, LoanId, LoanReceipt, MemberId};

/// Loan period between issue and due date.
pub const LOAN_PERIOD_DAYS: u64 = 14;

/// Catalog operations bound to one connection.
pub struct Catalog<'a> {
    conn: &'a Connection,
}

impl<'a> Catalog<'a> {
    /// Wraps a connection and enables foreign-key enforcement on it.
    pub fn new(conn: &'a Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(store_err("enable foreign keys"))?;
        Ok(Self { conn })
    }

    /// Registers a member.
    ///
    /// Returns `Ok(None)` when the email is already taken; no row is added in
    /// that case.
    pub fn add_member(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        membership_expiry: NaiveDate,
    ) -> Result<Option<MemberId>> {
        match self.try_add_member(first_name, last_name, email, membership_expiry) {
            Ok(id) => Ok(Some(id)),
            Err(StoreError::DuplicateEmail { email }) => {
                warn!(email = %email, "member not added: email already registered");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Registers a member, reporting a taken email as
    /// [`StoreError::DuplicateEmail`].
    pub fn try_add_member(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        membership_expiry: NaiveDate,
    ) -> Result<MemberId> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(store_err("add member"))?;
        tx.execute(
            "INSERT INTO Members (FirstName, LastName, Email, MembershipExpiryDate)
             VALUES (?1, ?2, ?3, ?4)",
            params![first_name, last_name, email, membership_expiry],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::DuplicateEmail {
                    email: email.to_string(),
                }
            } else {
                store_err("add member")(err)
            }
        })?;
        let id = MemberId(tx.last_insert_rowid());
        tx.commit().map_err(store_err("add member"))?;

        info!(member_id = %id, "added member {first_name} {last_name}");
        Ok(id)
    }

    /// Finds one available copy of the book with this exact title.
    ///
    /// When several copies are available the lowest `CopyID` is returned.
    /// `Ok(None)` means no copy is available (or the title is unknown).
    pub fn find_available_copy(&self, title: &str) -> Result<Option<CopyId>> {
        let copy = self
            .conn
            .query_row(
                "SELECT bc.CopyID
                 FROM BookCopies bc
                 JOIN Books b ON bc.BookID = b.BookID
                 WHERE b.Title = ?1 AND bc.Status = ?2
                 ORDER BY bc.CopyID
                 LIMIT 1",
                params![title, CopyStatus::Available],
                |row| row.get::<_, CopyId>(0),
            )
            .optional()
            .map_err(store_err_for("find available copy", format!("title '{title}'")))?;

        match copy {
            Some(id) => debug!(copy_id = %id, title, "found available copy"),
            None => debug!(title, "no available copy"),
        }
        Ok(copy)
    }

    /// Issues a copy to a member today, due back in [`LOAN_PERIOD_DAYS`].
    pub fn loan_copy(&self, copy_id: CopyId, member_id: MemberId) -> Result<LoanReceipt> {
        self.loan_copy_on(copy_id, member_id, Local::now().date_naive())
    }

    /// Issues a copy to a member on the given date.
    ///
    /// The copy's status moves from `available` to `on_loan` and a loan row is
    /// inserted in the same transaction. The status change only applies to a
    /// copy that is currently available, so a copy cannot be loaned twice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LoanFailed`] if the copy is not available, the
    /// copy or member does not exist, or either statement fails. Nothing is
    /// changed in that case.
    pub fn loan_copy_on(
        &self,
        copy_id: CopyId,
        member_id: MemberId,
        issue_date: NaiveDate,
    ) -> Result<LoanReceipt> {
        let failed = |reason: &str| StoreError::LoanFailed {
            copy_id,
            member_id,
            reason: reason.to_string(),
        };
        let due_date = issue_date
            .checked_add_days(Days::new(LOAN_PERIOD_DAYS))
            .ok_or_else(|| failed("due date out of range"))?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| failed(failure_reason(&e)))?;

        let updated = tx
            .execute(
                "UPDATE BookCopies SET Status = ?1 WHERE CopyID = ?2 AND Status = ?3",
                params![CopyStatus::OnLoan, copy_id, CopyStatus::Available],
            )
            .map_err(|e| failed(failure_reason(&e)))?;
        if updated == 0 {
            return Err(failed("copy is not available"));
        }

        tx.execute(
            "INSERT INTO Loans (CopyID, MemberID, IssueDate, DueDate) VALUES (?1, ?2, ?3, ?4)",
            params![copy_id, member_id, issue_date, due_date],
        )
        .map_err(|e| failed(failure_reason(&e)))?;
        let loan_id = LoanId(tx.last_insert_rowid());

        tx.commit().map_err(|e| failed(failure_reason(&e)))?;

        info!(
            loan_id = %loan_id,
            copy_id = %copy_id,
            member_id = %member_id,
            due = %due_date,
            "copy loaned"
        );
        Ok(LoanReceipt {
            loan_id,
            copy_id,
            member_id,
            issue_date,
            due_date,
        })
    }

    /// Records the return of a loan today.
    pub fn return_copy(&self, loan_id: LoanId) -> Result<()> {
        self.return_copy_on(loan_id, Local::now().date_naive())
    }

    /// Records the return of a loan on the given date and makes its copy
    /// available again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the loan does not exist or was
    /// already returned.
    pub fn return_copy_on(&self, loan_id: LoanId, return_date: NaiveDate) -> Result<()> {
        let key = format!("loan {loan_id}");
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(store_err_for("return copy", &key))?;

        let copy_id: CopyId = tx
            .query_row(
                "SELECT CopyID FROM Loans WHERE LoanID = ?1 AND ActualReturnDate IS NULL",
                params![loan_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err_for("return copy", &key))?
            .ok_or_else(|| StoreError::NotFound {
                what: format!("active loan {loan_id}"),
            })?;

        tx.execute(
            "UPDATE Loans SET ActualReturnDate = ?1 WHERE LoanID = ?2",
            params![return_date, loan_id],
        )
        .map_err(store_err_for("return copy", &key))?;
        tx.execute(
            "UPDATE BookCopies SET Status = ?1 WHERE CopyID = ?2",
            params![CopyStatus::Available, copy_id],
        )
        .map_err(store_err_for("return copy", &key))?;
        tx.commit().map_err(store_err_for("return copy", &key))?;

        info!(loan_id = %loan_id, copy_id = %copy_id, "copy returned");
        Ok(())
    }

    /// Lists loans without an actual return date, oldest first.
    pub fn list_active_loans(&self) -> Result<Vec<ActiveLoan>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT l.LoanID,
                        l.CopyID,
                        m.FirstName || ' ' || m.LastName AS MemberName,
                        b.Title,
                        l.IssueDate,
                        l.DueDate,
                        l.ActualReturnDate
                 FROM Loans l
                 JOIN Members m ON l.MemberID = m.MemberID
                 JOIN BookCopies bc ON l.CopyID = bc.CopyID
                 JOIN Books b ON bc.BookID = b.BookID
                 WHERE l.ActualReturnDate IS NULL
                 ORDER BY l.LoanID",
            )
            .map_err(store_err("list active loans"))?;

        let loans = stmt
            .query_map([], |row| {
                Ok(ActiveLoan {
                    loan_id: row.get(0)?,
                    copy_id: row.get(1)?,
                    member_name: row.get(2)?,
                    title: row.get(3)?,
                    issue_date: row.get(4)?,
                    due_date: row.get(5)?,
                    actual_return_date: row.get(6)?,
                })
            })
            .map_err(store_err("list active loans"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err("list active loans"))?;
        Ok(loans)
    }

    /// Current status of a copy, or `None` if it does not exist.
    pub fn copy_status(&self, copy_id: CopyId) -> Result<Option<CopyStatus>> {
        self.conn
            .query_row(
                "SELECT Status FROM BookCopies WHERE CopyID = ?1",
                params![copy_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err_for("read copy status", format!("copy {copy_id}")))
    }

    /// Number of registered members.
    pub fn member_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Members", [], |row| row.get(0))
            .map_err(store_err("count members"))?;
        Ok(count as usize)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}
