use crate::ports::StoreError;
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 利用者が存在しない
    #[error("Borrower not found")]
    BorrowerNotFound,

    /// 貸出が存在しない
    #[error("Loan not found")]
    LoanNotFound,

    /// 書籍は既に貸出中
    #[error("Book is already borrowed")]
    AlreadyBorrowed,

    /// ストアのエラー
    #[error("Store error")]
    StoreError(#[from] StoreError),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
