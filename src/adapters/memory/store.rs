use crate::domain::{Book, BookId, Borrower, BorrowerId, Loan, LoanId};
use crate::ports::{
    ActiveLoanEntry, ActiveLoansView, BookFilter, CatalogStore, LedgerTransaction, LoanLedger,
    Result, StoreError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::transaction::MemoryTransaction;

/// ストア全体の状態
#[derive(Debug, Clone, Default)]
pub(super) struct LibraryState {
    pub(super) borrowers: HashMap<BorrowerId, Borrower>,
    pub(super) books: HashMap<BookId, Book>,
    pub(super) loans: HashMap<LoanId, Loan>,
}

impl LibraryState {
    pub(super) fn email_taken(&self, borrower: &Borrower) -> bool {
        self.borrowers
            .values()
            .any(|b| b.email == borrower.email && b.borrower_id != borrower.borrower_id)
    }
}

/// 全ポートのインメモリ実装
///
/// データベースなしでの起動とテストに使用する。
/// トランザクションは状態全体のロックを保持するため、
/// トランザクション同士は完全に直列化される。
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<LibraryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_borrower(&self, borrower: &Borrower) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.borrowers.contains_key(&borrower.borrower_id) {
            return Err(StoreError::UniqueViolation("borrowers_pkey".to_string()));
        }
        if state.email_taken(borrower) {
            return Err(StoreError::UniqueViolation("borrowers_email_key".to_string()));
        }
        state
            .borrowers
            .insert(borrower.borrower_id, borrower.clone());
        Ok(())
    }

    async fn get_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let state = self.state.lock().await;
        Ok(state.borrowers.get(&borrower_id).cloned())
    }

    async fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        let state = self.state.lock().await;
        let mut borrowers: Vec<Borrower> = state.borrowers.values().cloned().collect();
        borrowers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(borrowers)
    }

    async fn update_borrower_contact(&self, borrower: &Borrower) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.borrowers.get_mut(&borrower.borrower_id) {
            Some(stored) => {
                stored.name = borrower.name.clone();
                stored.phone = borrower.phone.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_book(&self, book: &Book) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.books.contains_key(&book.book_id) {
            return Err(StoreError::UniqueViolation("books_pkey".to_string()));
        }
        state.books.insert(book.book_id, book.clone());
        Ok(())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.get(&book_id).cloned())
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let state = self.state.lock().await;
        let mut books: Vec<Book> = state
            .books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn update_book_details(&self, book: &Book) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.books.get_mut(&book.book_id) {
            Some(stored) => {
                stored.title = book.title.clone();
                stored.author = book.author.clone();
                stored.publication_year = book.publication_year;
                stored.genre = book.genre.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LoanLedger for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction::new(guard)))
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let state = self.state.lock().await;
        Ok(state.loans.get(&loan_id).cloned())
    }

    async fn find_by_borrower(&self, borrower_id: BorrowerId) -> Result<Vec<Loan>> {
        let state = self.state.lock().await;
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|loan| loan.borrower_id() == borrower_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.core().loaned_at.cmp(&a.core().loaned_at));
        Ok(loans)
    }
}

#[async_trait]
impl ActiveLoansView for MemoryStore {
    async fn list(&self) -> Result<Vec<ActiveLoanEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<ActiveLoanEntry> = state
            .loans
            .values()
            .filter(|loan| loan.is_open())
            .filter_map(|loan| {
                let borrower = state.borrowers.get(&loan.borrower_id())?;
                let book = state.books.get(&loan.book_id())?;
                Some(ActiveLoanEntry {
                    loan_id: loan.loan_id(),
                    borrower_name: borrower.name.clone(),
                    book_title: book.title.clone(),
                    loaned_at: loan.core().loaned_at,
                })
            })
            .collect();
        entries.sort_by_key(|entry| (entry.loaned_at, entry.loan_id.value()));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::catalog_book;
    use crate::domain::borrower::register_borrower;
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_borrower_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let first = register_borrower("Ana", "ana@example.com", None, Utc::now()).unwrap();
        let second = register_borrower("Ana B", "ana@example.com", None, Utc::now()).unwrap();

        store.insert_borrower(&first).await.unwrap();
        let result = store.insert_borrower(&second).await;

        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
        assert_eq!(store.list_borrowers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_book_details_ignores_availability() {
        let store = MemoryStore::new();
        let book = catalog_book("Title", "Author", 1950, None).unwrap();
        store.insert_book(&book).await.unwrap();

        let mut changed = book.clone();
        changed.title = "Another Title".to_string();
        changed.available = false;
        assert!(store.update_book_details(&changed).await.unwrap());

        let stored = store.get_book(book.book_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Another Title");
        assert!(stored.available);
    }

    #[tokio::test]
    async fn test_list_books_applies_filter_and_sorts_by_title() {
        let store = MemoryStore::new();
        for (title, author) in [
            ("Quincas Borba", "Machado de Assis"),
            ("Iracema", "José de Alencar"),
            ("Dom Casmurro", "Machado de Assis"),
        ] {
            let book = catalog_book(title, author, 1880, None).unwrap();
            store.insert_book(&book).await.unwrap();
        }

        let filter = BookFilter {
            author: Some("MACHADO".to_string()),
            ..Default::default()
        };
        let titles: Vec<String> = store
            .list_books(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();

        assert_eq!(titles, vec!["Dom Casmurro", "Quincas Borba"]);
    }
}
