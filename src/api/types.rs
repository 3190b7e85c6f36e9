use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Book, Borrower, Loan, book::BookChanges, borrower::BorrowerChanges, loan::ReturnOutcome,
};
use crate::ports::{ActiveLoanEntry, BookFilter};

// ============================================================================
// Requests
// ============================================================================

/// 利用者登録リクエスト
#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterBorrowerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// 利用者情報変更リクエスト
///
/// 指定された項目のみ変更する。`phone` に空文字を指定すると削除。
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateBorrowerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UpdateBorrowerRequest {
    pub fn to_changes(self) -> BorrowerChanges {
        BorrowerChanges {
            name: self.name,
            phone: self.phone.map(Some),
        }
    }
}

/// 書籍登録リクエスト
#[derive(Debug, Deserialize, Serialize)]
pub struct AddBookRequest {
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    #[serde(default)]
    pub genre: Option<String>,
}

/// 書籍情報修正リクエスト
///
/// `genre` に空文字を指定すると削除。
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReviseBookRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl ReviseBookRequest {
    pub fn to_changes(self) -> BookChanges {
        BookChanges {
            title: self.title,
            author: self.author,
            publication_year: self.publication_year,
            genre: self.genre.map(Some),
        }
    }
}

/// 貸出リクエスト
#[derive(Debug, Deserialize, Serialize)]
pub struct BorrowBookRequest {
    pub borrower_id: Uuid,
    pub book_id: Uuid,
}

/// 蔵書一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub available: Option<bool>,
}

impl From<ListBooksQuery> for BookFilter {
    fn from(query: ListBooksQuery) -> Self {
        Self {
            title: query.title,
            author: query.author,
            available: query.available,
        }
    }
}

/// 貸出一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// 利用者IDでフィルタリング（必須）
    pub borrower_id: Option<Uuid>,
}

// ============================================================================
// Responses
// ============================================================================

/// 利用者レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowerResponse {
    pub borrower_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Borrower> for BorrowerResponse {
    fn from(borrower: Borrower) -> Self {
        Self {
            borrower_id: borrower.borrower_id.value(),
            name: borrower.name,
            email: borrower.email.into(),
            phone: borrower.phone,
            created_at: borrower.created_at,
        }
    }
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub genre: Option<String>,
    pub available: bool,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id.value(),
            title: book.title,
            author: book.author,
            publication_year: book.publication_year.value(),
            genre: book.genre,
            available: book.available,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub borrower_id: Uuid,
    pub book_id: Uuid,
    pub loaned_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        let core = loan.core();
        Self {
            loan_id: core.loan_id.value(),
            borrower_id: core.borrower_id.value(),
            book_id: core.book_id.value(),
            loaned_at: core.loaned_at,
            returned_at: loan.returned_at(),
            status: loan.status().as_str().to_string(),
        }
    }
}

/// 返却レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookReturnedResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub returned_at: DateTime<Utc>,
    /// 呼び出し前から返却済みだった場合はtrue
    pub already_returned: bool,
}

impl From<ReturnOutcome> for BookReturnedResponse {
    fn from(outcome: ReturnOutcome) -> Self {
        let already_returned = outcome.was_already_returned();
        let loan = outcome.loan();
        Self {
            loan_id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            returned_at: loan.returned_at,
            already_returned,
        }
    }
}

/// 貸出中一覧レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveLoanResponse {
    pub loan_id: Uuid,
    pub borrower_name: String,
    pub book_title: String,
    pub loaned_at: DateTime<Utc>,
}

impl From<ActiveLoanEntry> for ActiveLoanResponse {
    fn from(entry: ActiveLoanEntry) -> Self {
        Self {
            loan_id: entry.loan_id.value(),
            borrower_name: entry.borrower_name,
            book_title: entry.book_title,
            loaned_at: entry.loaned_at,
        }
    }
}

/// 削除レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    /// 連鎖削除された貸出の件数
    pub removed_loans: usize,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
