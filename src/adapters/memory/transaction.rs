use crate::domain::{Book, BookId, BorrowerId, Loan, LoanId};
use crate::ports::{LedgerTransaction, Result, StoreError};
use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::store::LibraryState;

/// インメモリの貸出台帳トランザクション
///
/// 状態全体のロックを保持したまま、変更を作業コピーに適用する。
/// `commit`で作業コピーを反映し、ドロップ時は作業コピーを捨てる。
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<LibraryState>,
    staged: LibraryState,
}

impl MemoryTransaction {
    pub(super) fn new(guard: OwnedMutexGuard<LibraryState>) -> Self {
        let staged = (*guard).clone();
        Self { guard, staged }
    }

    /// 貸出中の貸出が同じ書籍に既にあるか
    fn has_open_loan(&self, loan: &Loan) -> bool {
        self.staged.loans.values().any(|existing| {
            existing.is_open()
                && existing.book_id() == loan.book_id()
                && existing.loan_id() != loan.loan_id()
        })
    }

    fn remove_loans_where(&mut self, predicate: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        let ids: Vec<LoanId> = self
            .staged
            .loans
            .values()
            .filter(|&loan| predicate(loan))
            .map(Loan::loan_id)
            .collect();

        ids.iter()
            .filter_map(|id| self.staged.loans.remove(id))
            .collect()
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn lock_borrower(&mut self, borrower_id: BorrowerId) -> Result<bool> {
        Ok(self.staged.borrowers.contains_key(&borrower_id))
    }

    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.staged.books.get(&book_id).cloned())
    }

    async fn lock_loan(&mut self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.staged.loans.get(&loan_id).cloned())
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        if self.staged.loans.contains_key(&loan.loan_id()) {
            return Err(StoreError::UniqueViolation("loans_pkey".to_string()));
        }
        if loan.is_open() && self.has_open_loan(loan) {
            return Err(StoreError::UniqueViolation(
                "loans_one_open_loan_per_book".to_string(),
            ));
        }
        if !self.staged.borrowers.contains_key(&loan.borrower_id()) {
            return Err(StoreError::ForeignKeyViolation(
                "loans_borrower_id_fkey".to_string(),
            ));
        }
        if !self.staged.books.contains_key(&loan.book_id()) {
            return Err(StoreError::ForeignKeyViolation(
                "loans_book_id_fkey".to_string(),
            ));
        }

        self.staged.loans.insert(loan.loan_id(), loan.clone());
        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        if loan.is_open() && self.has_open_loan(loan) {
            return Err(StoreError::UniqueViolation(
                "loans_one_open_loan_per_book".to_string(),
            ));
        }
        match self.staged.loans.get_mut(&loan.loan_id()) {
            Some(stored) => {
                *stored = loan.clone();
                Ok(())
            }
            None => Err(StoreError::InvalidData(format!(
                "Loan {} does not exist",
                loan.loan_id()
            ))),
        }
    }

    async fn set_book_availability(&mut self, book_id: BookId, available: bool) -> Result<()> {
        if let Some(book) = self.staged.books.get_mut(&book_id) {
            book.available = available;
        }
        Ok(())
    }

    async fn delete_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Vec<Loan>>> {
        if self.staged.borrowers.remove(&borrower_id).is_none() {
            return Ok(None);
        }
        Ok(Some(
            self.remove_loans_where(|loan| loan.borrower_id() == borrower_id),
        ))
    }

    async fn delete_book(&mut self, book_id: BookId) -> Result<Option<Vec<Loan>>> {
        if self.staged.books.remove(&book_id).is_none() {
            return Ok(None);
        }
        Ok(Some(self.remove_loans_where(|loan| loan.book_id() == book_id)))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::book::catalog_book;
    use crate::domain::borrower::register_borrower;
    use crate::domain::loan::borrow_book;
    use crate::ports::{CatalogStore, LoanLedger};
    use chrono::Utc;

    async fn seeded_store() -> (MemoryStore, BorrowerId, Book) {
        let store = MemoryStore::new();
        let borrower = register_borrower("Ana", "ana@example.com", None, Utc::now()).unwrap();
        let book = catalog_book("Title", "Author", 1999, None).unwrap();
        store.insert_borrower(&borrower).await.unwrap();
        store.insert_book(&book).await.unwrap();
        (store, borrower.borrower_id, book)
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_changes() {
        let (store, borrower_id, book) = seeded_store().await;
        let loan = Loan::Borrowed(borrow_book(borrower_id, &book, Utc::now()).unwrap());

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_loan(&loan).await.unwrap();
            tx.set_book_availability(book.book_id, false).await.unwrap();
        }

        assert!(store.get_loan(loan.loan_id()).await.unwrap().is_none());
        assert!(store.get_book(book.book_id).await.unwrap().unwrap().available);
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let (store, borrower_id, book) = seeded_store().await;
        let loan = Loan::Borrowed(borrow_book(borrower_id, &book, Utc::now()).unwrap());

        let mut tx = store.begin().await.unwrap();
        tx.insert_loan(&loan).await.unwrap();
        tx.set_book_availability(book.book_id, false).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.get_loan(loan.loan_id()).await.unwrap(), Some(loan));
        assert!(!store.get_book(book.book_id).await.unwrap().unwrap().available);
    }

    #[tokio::test]
    async fn test_insert_loan_rejects_second_open_loan_for_book() {
        let (store, borrower_id, book) = seeded_store().await;
        let first = Loan::Borrowed(borrow_book(borrower_id, &book, Utc::now()).unwrap());
        let second = Loan::Borrowed(borrow_book(borrower_id, &book, Utc::now()).unwrap());

        let mut tx = store.begin().await.unwrap();
        tx.insert_loan(&first).await.unwrap();
        let result = tx.insert_loan(&second).await;

        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_insert_loan_for_missing_borrower_is_foreign_key_violation() {
        let (store, _, book) = seeded_store().await;
        let loan = Loan::Borrowed(borrow_book(BorrowerId::new(), &book, Utc::now()).unwrap());

        let mut tx = store.begin().await.unwrap();
        let result = tx.insert_loan(&loan).await;

        match result {
            Err(StoreError::ForeignKeyViolation(constraint)) => {
                assert_eq!(constraint, "loans_borrower_id_fkey");
            }
            other => panic!("Expected ForeignKeyViolation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lock_borrower_reports_existence() {
        let (store, borrower_id, _) = seeded_store().await;
        let mut tx = store.begin().await.unwrap();

        assert!(tx.lock_borrower(borrower_id).await.unwrap());
        assert!(!tx.lock_borrower(BorrowerId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_borrower_cascades_loans() {
        let (store, borrower_id, book) = seeded_store().await;
        let loan = Loan::Borrowed(borrow_book(borrower_id, &book, Utc::now()).unwrap());

        let mut tx = store.begin().await.unwrap();
        tx.insert_loan(&loan).await.unwrap();
        let removed = tx.delete_borrower(borrower_id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(removed, Some(vec![loan.clone()]));
        assert!(store.get_loan(loan.loan_id()).await.unwrap().is_none());
        assert!(store.get_borrower(borrower_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_book_returns_none() {
        let (store, _, _) = seeded_store().await;
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.delete_book(BookId::new()).await.unwrap(), None);
    }
}
