use crate::domain::{
    self, Book, BookId, Borrower, BorrowerId, ValidationError,
    availability::LoanChange,
    book::BookChanges,
    borrower::BorrowerChanges,
    commands::{AddBook, RegisterBorrower},
};
use crate::ports::StoreError;

use super::errors::{CatalogApplicationError, Result};
use crate::application::{ServiceDependencies, availability::synchronize_availability};

/// 利用者を登録する
///
/// ビジネスルール：
/// - 氏名・メールアドレスは必須
/// - メールアドレスは一意（ストアの一意制約違反は`DuplicateEmail`に変換）
pub async fn register_borrower(
    deps: &ServiceDependencies,
    cmd: RegisterBorrower,
) -> Result<Borrower> {
    let borrower =
        domain::borrower::register_borrower(&cmd.name, &cmd.email, cmd.phone, cmd.registered_at)?;

    deps.catalog_store
        .insert_borrower(&borrower)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => CatalogApplicationError::Validation(
                ValidationError::DuplicateEmail(borrower.email.to_string()),
            ),
            other => CatalogApplicationError::StoreError(other),
        })?;

    tracing::info!(borrower_id = %borrower.borrower_id, "Borrower registered");
    Ok(borrower)
}

/// 利用者の氏名・電話番号を変更する
pub async fn update_borrower(
    deps: &ServiceDependencies,
    borrower_id: BorrowerId,
    changes: BorrowerChanges,
) -> Result<Borrower> {
    let borrower = deps
        .catalog_store
        .get_borrower(borrower_id)
        .await?
        .ok_or(CatalogApplicationError::BorrowerNotFound)?;

    let updated = domain::borrower::update_contact(&borrower, changes)?;

    if !deps.catalog_store.update_borrower_contact(&updated).await? {
        return Err(CatalogApplicationError::BorrowerNotFound);
    }

    Ok(updated)
}

/// 利用者を削除する
///
/// 利用者の貸出も連鎖削除される。貸出中だった書籍は同じトランザクション内で
/// 貸出可能に戻す。
///
/// # 戻り値
/// 削除された貸出の件数
pub async fn remove_borrower(deps: &ServiceDependencies, borrower_id: BorrowerId) -> Result<usize> {
    let mut tx = deps.loan_ledger.begin().await?;

    let removed_loans = tx
        .delete_borrower(borrower_id)
        .await?
        .ok_or(CatalogApplicationError::BorrowerNotFound)?;

    for loan in &removed_loans {
        synchronize_availability(&mut *tx, LoanChange::Removed(loan)).await?;
    }

    tx.commit().await?;

    tracing::info!(
        borrower_id = %borrower_id,
        removed_loans = removed_loans.len(),
        "Borrower removed"
    );
    Ok(removed_loans.len())
}

/// 書籍を蔵書に加える
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    let book = domain::book::catalog_book(
        &cmd.title,
        &cmd.author,
        cmd.publication_year,
        cmd.genre,
    )?;

    deps.catalog_store.insert_book(&book).await?;

    tracing::info!(book_id = %book.book_id, "Book added to catalog");
    Ok(book)
}

/// 書籍の書誌情報を修正する
///
/// 貸出可否は変更できない。
pub async fn revise_book(
    deps: &ServiceDependencies,
    book_id: BookId,
    changes: BookChanges,
) -> Result<Book> {
    let book = deps
        .catalog_store
        .get_book(book_id)
        .await?
        .ok_or(CatalogApplicationError::BookNotFound)?;

    let revised = domain::book::revise_book(&book, changes)?;

    if !deps.catalog_store.update_book_details(&revised).await? {
        return Err(CatalogApplicationError::BookNotFound);
    }

    Ok(revised)
}

/// 書籍を削除する
///
/// 書籍の貸出も連鎖削除される。
///
/// # 戻り値
/// 削除された貸出の件数
pub async fn remove_book(deps: &ServiceDependencies, book_id: BookId) -> Result<usize> {
    let mut tx = deps.loan_ledger.begin().await?;

    let removed_loans = tx
        .delete_book(book_id)
        .await?
        .ok_or(CatalogApplicationError::BookNotFound)?;

    tx.commit().await?;

    tracing::info!(
        book_id = %book_id,
        removed_loans = removed_loans.len(),
        "Book removed"
    );
    Ok(removed_loans.len())
}
