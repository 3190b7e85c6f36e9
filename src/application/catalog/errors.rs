use crate::domain::ValidationError;
use crate::ports::StoreError;
use thiserror::Error;

/// カタログ管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum CatalogApplicationError {
    /// 利用者が存在しない
    #[error("Borrower not found")]
    BorrowerNotFound,

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 入力値が不正
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// ストアのエラー
    #[error("Store error")]
    StoreError(#[from] StoreError),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, CatalogApplicationError>;
