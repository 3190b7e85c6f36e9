use crate::domain::{
    Book, BookId, Borrower, BorrowerId, Email, Loan, LoanId, LoanStatus, PublicationYear,
    loan::{LoanCore, restore_loan},
};
use crate::ports::{ActiveLoanEntry, Result, StoreError};
use sqlx::{Row, postgres::PgRow};
use std::str::FromStr;

/// PostgreSQLの行データをBorrowerに変換する
pub(super) fn map_row_to_borrower(row: &PgRow) -> Result<Borrower> {
    let email: String = row.try_get("email")?;
    let email = Email::try_from(email).map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(Borrower {
        borrower_id: BorrowerId::from_uuid(row.try_get("borrower_id")?),
        name: row.try_get("name")?,
        email,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQLの行データをBookに変換する
///
/// 出版年はCHECK制約で正の値が保証されているが、念のため値オブジェクトで検証する。
pub(super) fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let year: i32 = row.try_get("publication_year")?;
    let publication_year =
        PublicationYear::try_from(year).map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(Book {
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        publication_year,
        genre: row.try_get("genre")?,
        available: row.try_get("available")?,
    })
}

/// PostgreSQLの行データをLoanに変換する
///
/// ステータス文字列と返却日の組み合わせから型安全な状態を復元する。
pub(super) fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let loan_id = LoanId::from_uuid(row.try_get("loan_id")?);
    let status_str: &str = row.try_get("status")?;
    let status = LoanStatus::from_str(status_str).map_err(StoreError::InvalidData)?;

    let core = LoanCore {
        loan_id,
        borrower_id: BorrowerId::from_uuid(row.try_get("borrower_id")?),
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        loaned_at: row.try_get("loaned_at")?,
    };

    restore_loan(core, status, row.try_get("returned_at")?).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "Loan {} has inconsistent status and returned_at",
            loan_id
        ))
    })
}

/// active_loansビューの行データを変換する
pub(super) fn map_row_to_active_loan(row: &PgRow) -> Result<ActiveLoanEntry> {
    Ok(ActiveLoanEntry {
        loan_id: LoanId::from_uuid(row.try_get("loan_id")?),
        borrower_name: row.try_get("borrower_name")?,
        book_title: row.try_get("book_title")?,
        loaned_at: row.try_get("loaned_at")?,
    })
}

/// ILIKE用の部分一致パターンを作る（`%` `_` `\` はエスケープ）
pub(super) fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("machado"), "%machado%");
        assert_eq!(contains_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
