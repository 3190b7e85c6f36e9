use crate::domain::{Book, BookId, BorrowerId, Loan, LoanId};
use async_trait::async_trait;

use super::Result;

/// 貸出台帳ポート
///
/// 貸出の参照と、貸出を変更するトランザクションの開始を提供する。
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// トランザクションを開始する
    ///
    /// 貸出・書籍の貸出可否・連鎖削除の変更はすべてこのトランザクション内で行う。
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 利用者の全貸出（新しい順）
    ///
    /// 利用者の貸出履歴表示に使用される。
    async fn find_by_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<Loan>>;
}

/// 貸出台帳のトランザクション
///
/// `commit`せずにドロップした場合、すべての変更は破棄される。
/// `lock_*`で読んだ行はトランザクション終了まで他のトランザクションから変更されない。
#[async_trait]
pub trait LedgerTransaction: Send {
    /// 利用者をキー共有ロックして存在を確認する
    ///
    /// ロック中は利用者の削除が待たされる。削除と競合した場合は
    /// 削除の完了を待ってから`false`を返す。
    async fn lock_borrower(&mut self, borrower_id: BorrowerId) -> Result<bool>;

    /// 書籍を排他ロックして読み込む
    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>>;

    /// 貸出を排他ロックして読み込む
    async fn lock_loan(&mut self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 貸出を追加する
    ///
    /// 同じ書籍に貸出中の貸出が既にある場合は`StoreError::UniqueViolation`、
    /// 利用者または書籍が存在しない場合は`StoreError::ForeignKeyViolation`。
    async fn insert_loan(&mut self, loan: &Loan) -> Result<()>;

    /// 貸出のステータスと返却日を更新する
    async fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    /// 書籍の貸出可否を書き込む
    async fn set_book_availability(&mut self, book_id: BookId, available: bool) -> Result<()>;

    /// 利用者とその全貸出を削除する
    ///
    /// 利用者が存在しない場合は`None`、存在する場合は削除された貸出を返す。
    async fn delete_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Vec<Loan>>>;

    /// 書籍とその全貸出を削除する
    ///
    /// 書籍が存在しない場合は`None`、存在する場合は削除された貸出を返す。
    async fn delete_book(&mut self, book_id: BookId) -> Result<Option<Vec<Loan>>>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
