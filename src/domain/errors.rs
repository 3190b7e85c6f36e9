use thiserror::Error;

/// 入力値の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必須項目が空
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// 項目が上限文字数を超えている
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// メールアドレスの形式が不正
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    /// 出版年が0以下
    #[error("Publication year must be positive, got {0}")]
    InvalidPublicationYear(i32),

    /// メールアドレスが登録済み（ストアの一意制約違反から変換される）
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
}

/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowBookError {
    /// 書籍は既に貸出中
    AlreadyBorrowed,
}
