use crate::domain::LoanId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Result;

/// 貸出中一覧の1行
///
/// 利用者・書籍・貸出を結合した読み取り専用の射影。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLoanEntry {
    pub loan_id: LoanId,
    pub borrower_name: String,
    pub book_title: String,
    pub loaned_at: DateTime<Utc>,
}

/// 貸出中一覧ポート
///
/// キャッシュは持たず、呼び出しごとに再計算する。
#[async_trait]
pub trait ActiveLoansView: Send + Sync {
    /// 貸出中の貸出を貸出日の古い順に返す
    async fn list(&self) -> Result<Vec<ActiveLoanEntry>>;
}
