use crate::ports::active_loans_view::{ActiveLoanEntry, ActiveLoansView as ActiveLoansViewTrait};
use crate::ports::{Result, StoreError};
use async_trait::async_trait;
use futures::stream::{StreamExt, TryStreamExt};
use sqlx::PgPool;

use super::rows::map_row_to_active_loan;

/// ActiveLoansViewのPostgreSQL実装
///
/// マイグレーションで定義した`active_loans`ビューを読む。
pub struct ActiveLoansView {
    pool: PgPool,
}

impl ActiveLoansView {
    /// PostgreSQLコネクションプールから新しいActiveLoansViewを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActiveLoansViewTrait for ActiveLoansView {
    async fn list(&self) -> Result<Vec<ActiveLoanEntry>> {
        sqlx::query(
            r#"
            SELECT loan_id, borrower_name, book_title, loaned_at
            FROM active_loans
            ORDER BY loaned_at ASC, loan_id ASC
            "#,
        )
        .fetch(&self.pool)
        .map(|row_result| {
            let row = row_result.map_err(StoreError::from)?;
            map_row_to_active_loan(&row)
        })
        .try_collect()
        .await
    }
}
