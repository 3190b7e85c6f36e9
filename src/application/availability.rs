use crate::domain::availability::{LoanChange, availability_after};
use crate::ports::{LedgerTransaction, Result};

/// 書籍の貸出可否を貸出の状態変化に同期する
///
/// 貸出を変更するすべての操作の最後に、同じトランザクション内で呼び出す。
/// `Book.available` を書き込むのはこの関数だけ。
pub(crate) async fn synchronize_availability(
    tx: &mut dyn LedgerTransaction,
    change: LoanChange<'_>,
) -> Result<()> {
    if let Some(update) = availability_after(change) {
        tracing::debug!(
            book_id = %update.book_id,
            available = update.available,
            "Synchronizing book availability"
        );
        tx.set_book_availability(update.book_id, update.available)
            .await?;
    }
    Ok(())
}
