use thiserror::Error;

/// ストアポート共通のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// 一意制約違反（制約名を保持する）
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// 外部キー制約違反（制約名を保持する）
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// 保存済みデータが不正
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// バックエンドの障害
    #[error("Storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, StoreError>;
