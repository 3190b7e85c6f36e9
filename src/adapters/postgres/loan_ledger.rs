use crate::domain::{Book, BookId, BorrowerId, Loan, LoanId};
use crate::ports::loan_ledger::{LedgerTransaction, LoanLedger as LoanLedgerTrait};
use crate::ports::{Result, StoreError};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::rows::{map_row_to_book, map_row_to_loan};

/// LoanLedgerのPostgreSQL実装
pub struct LoanLedger {
    pool: PgPool,
}

impl LoanLedger {
    /// PostgreSQLコネクションプールから新しいLoanLedgerを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanLedgerTrait for LoanLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, borrower_id, book_id, loaned_at, returned_at, status
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_by_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT loan_id, borrower_id, book_id, loaned_at, returned_at, status
            FROM loans
            WHERE borrower_id = $1
            ORDER BY loaned_at DESC
            "#,
        )
        .bind(borrower_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }
}

/// PostgreSQLトランザクション上の貸出台帳操作
///
/// `lock_book`/`lock_loan`は`SELECT ... FOR UPDATE`、
/// `lock_borrower`は`SELECT ... FOR KEY SHARE`で行ロックを取る。
/// ドロップ時にsqlxがロールバックする。
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    /// `FOR KEY SHARE`で利用者行をロックする
    ///
    /// 利用者削除の`FOR UPDATE`と競合するため、削除中なら完了を待ち、
    /// 削除済みの行は返らない。
    async fn lock_borrower(&mut self, borrower_id: BorrowerId) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT borrower_id
            FROM borrowers
            WHERE borrower_id = $1
            FOR KEY SHARE
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.is_some())
    }

    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, author, publication_year, genre, available
            FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn lock_loan(&mut self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, borrower_id, book_id, loaned_at, returned_at, status
            FROM loans
            WHERE loan_id = $1
            FOR UPDATE
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        let core = loan.core();
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                borrower_id,
                book_id,
                loaned_at,
                returned_at,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(core.loan_id.value())
        .bind(core.borrower_id.value())
        .bind(core.book_id.value())
        .bind(core.loaned_at)
        .bind(loan.returned_at())
        .bind(loan.status().as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET status = $2, returned_at = $3
            WHERE loan_id = $1
            "#,
        )
        .bind(loan.loan_id().value())
        .bind(loan.status().as_str())
        .bind(loan.returned_at())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvalidData(format!(
                "Loan {} does not exist",
                loan.loan_id()
            )));
        }
        Ok(())
    }

    async fn set_book_availability(&mut self, book_id: BookId, available: bool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET available = $2
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .bind(available)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// 利用者を削除する
    ///
    /// 外部キーのON DELETE CASCADEに任せず、先に貸出を削除して
    /// 削除した貸出を呼び出し側に返す。
    async fn delete_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Vec<Loan>>> {
        let locked = sqlx::query(
            r#"
            SELECT borrower_id FROM borrowers WHERE borrower_id = $1 FOR UPDATE
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        if locked.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query(
            r#"
            DELETE FROM loans
            WHERE borrower_id = $1
            RETURNING loan_id, borrower_id, book_id, loaned_at, returned_at, status
            "#,
        )
        .bind(borrower_id.value())
        .fetch_all(&mut *self.tx)
        .await?;

        let removed = rows
            .iter()
            .map(map_row_to_loan)
            .collect::<Result<Vec<_>>>()?;

        sqlx::query("DELETE FROM borrowers WHERE borrower_id = $1")
            .bind(borrower_id.value())
            .execute(&mut *self.tx)
            .await?;

        Ok(Some(removed))
    }

    async fn delete_book(&mut self, book_id: BookId) -> Result<Option<Vec<Loan>>> {
        let locked = sqlx::query(
            r#"
            SELECT book_id FROM books WHERE book_id = $1 FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        if locked.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query(
            r#"
            DELETE FROM loans
            WHERE book_id = $1
            RETURNING loan_id, borrower_id, book_id, loaned_at, returned_at, status
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&mut *self.tx)
        .await?;

        let removed = rows
            .iter()
            .map(map_row_to_loan)
            .collect::<Result<Vec<_>>>()?;

        sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .execute(&mut *self.tx)
            .await?;

        Ok(Some(removed))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
