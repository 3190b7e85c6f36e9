use crate::domain::{
    self, BorrowBookError, Loan,
    availability::LoanChange,
    commands::{BorrowBook, ReturnBook},
    loan::{BorrowedLoan, ReturnOutcome},
};
use crate::ports::StoreError;

use super::errors::{LoanApplicationError, Result};
use crate::application::{ServiceDependencies, availability::synchronize_availability};

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 利用者が存在すること
/// - 書籍が存在すること
/// - 書籍が貸出可能であること（1冊につき貸出中は1件まで）
///
/// # 一貫性保証
///
/// 利用者と書籍の行ロック・貸出の追加・貸出可否の同期を1つのトランザクションで行う。
/// ロック順は利用者→書籍で、利用者削除（利用者→書籍）と同じ順序になる。
/// 同じ書籍への同時貸出は直列化され、1件だけが成功し残りは
/// `AlreadyBorrowed` になる。失敗時は何も変更されない。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 貸出コマンド
///
/// # 戻り値
/// 成功時は作成された貸出
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<BorrowedLoan> {
    let mut tx = deps.loan_ledger.begin().await?;

    // 1. 利用者をロックして存在確認（利用者削除と直列化される）
    if !tx.lock_borrower(cmd.borrower_id).await? {
        return Err(LoanApplicationError::BorrowerNotFound);
    }

    // 2. 書籍をロックして読み込む
    let book = tx
        .lock_book(cmd.book_id)
        .await?
        .ok_or(LoanApplicationError::BookNotFound)?;

    // 3. ドメイン層の純粋関数を呼び出し
    let loan = domain::loan::borrow_book(cmd.borrower_id, &book, cmd.borrowed_at).map_err(
        |e| match e {
            BorrowBookError::AlreadyBorrowed => {
                tracing::warn!(book_id = %cmd.book_id, "Book is already borrowed");
                LoanApplicationError::AlreadyBorrowed
            }
        },
    )?;

    // 4. 貸出を追加（部分一意インデックスが最後の砦）
    tx.insert_loan(&Loan::Borrowed(loan.clone()))
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(constraint) => {
                tracing::warn!(book_id = %cmd.book_id, %constraint, "Open loan already exists");
                LoanApplicationError::AlreadyBorrowed
            }
            StoreError::ForeignKeyViolation(constraint) if constraint.contains("borrower") => {
                LoanApplicationError::BorrowerNotFound
            }
            StoreError::ForeignKeyViolation(_) => LoanApplicationError::BookNotFound,
            other => LoanApplicationError::StoreError(other),
        })?;

    // 5. 書籍の貸出可否を同期
    synchronize_availability(&mut *tx, LoanChange::Opened(&loan)).await?;

    tx.commit().await?;

    tracing::info!(
        loan_id = %loan.loan_id,
        borrower_id = %loan.borrower_id,
        book_id = %loan.book_id,
        "Book borrowed"
    );

    Ok(loan)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 既に返却済みの貸出は何も変更せず成功する（`ReturnOutcome::AlreadyReturned`）
///
/// # 一貫性保証
///
/// 貸出の更新と貸出可否の同期を1つのトランザクションで行う。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 返却コマンド
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<ReturnOutcome> {
    let mut tx = deps.loan_ledger.begin().await?;

    // 1. 貸出をロックして読み込む
    let loan = tx
        .lock_loan(cmd.loan_id)
        .await?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    // 2. ドメイン層の純粋関数を呼び出し
    let outcome = domain::loan::return_book(loan, cmd.returned_at);

    match &outcome {
        ReturnOutcome::Returned(returned) => {
            // 3. 貸出を更新し、貸出可否を同期
            tx.update_loan(&Loan::Returned(returned.clone())).await?;
            synchronize_availability(&mut *tx, LoanChange::Closed(returned)).await?;
            tx.commit().await?;

            tracing::info!(
                loan_id = %returned.loan_id,
                book_id = %returned.book_id,
                "Book returned"
            );
        }
        ReturnOutcome::AlreadyReturned(returned) => {
            tracing::debug!(loan_id = %returned.loan_id, "Loan was already returned");
        }
    }

    Ok(outcome)
}
