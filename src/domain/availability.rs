use super::BookId;
use super::loan::{BorrowedLoan, Loan, ReturnedLoan};

/// 貸出の状態変化
#[derive(Debug, Clone, Copy)]
pub enum LoanChange<'a> {
    /// 貸出が作成された
    Opened(&'a BorrowedLoan),
    /// 貸出が返却された
    Closed(&'a ReturnedLoan),
    /// 利用者・書籍の削除に伴って貸出が削除された
    Removed(&'a Loan),
}

/// 書籍の貸出可否の更新内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityUpdate {
    pub book_id: BookId,
    pub available: bool,
}

/// 純粋関数：貸出の状態変化から書籍の貸出可否を導出する
///
/// 不変条件：貸出中の貸出が存在する書籍だけが貸出不可。
/// 返却済みの貸出が削除されても書籍の状態は変わらないため`None`を返す。
pub fn availability_after(change: LoanChange<'_>) -> Option<AvailabilityUpdate> {
    match change {
        LoanChange::Opened(loan) => Some(AvailabilityUpdate {
            book_id: loan.book_id,
            available: false,
        }),
        LoanChange::Closed(loan) => Some(AvailabilityUpdate {
            book_id: loan.book_id,
            available: true,
        }),
        LoanChange::Removed(loan) if loan.is_open() => Some(AvailabilityUpdate {
            book_id: loan.book_id(),
            available: true,
        }),
        LoanChange::Removed(_) => None,
    }
}
