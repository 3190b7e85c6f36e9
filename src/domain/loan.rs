use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Book, BookId, BorrowBookError, BorrowerId, LoanId, LoanStatus};

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// Loan集約の共通フィールド
///
/// すべての貸出状態（Borrowed, Returned）で共有されるコアデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCore {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub borrower_id: BorrowerId,
    pub book_id: BookId,

    // 貸出日
    pub loaned_at: DateTime<Utc>,
}

/// 貸出中状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedLoan {
    #[serde(flatten)]
    pub core: LoanCore,
}

impl std::ops::Deref for BorrowedLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 返却済み状態
///
/// ビジネスルール：
/// - returned_atが必須（型で保証）
/// - これ以上の状態遷移はない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedLoan {
    #[serde(flatten)]
    pub core: LoanCore,
    pub returned_at: DateTime<Utc>,
}

impl std::ops::Deref for ReturnedLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Loan {
    Borrowed(BorrowedLoan),
    Returned(ReturnedLoan),
}

impl Loan {
    pub fn core(&self) -> &LoanCore {
        match self {
            Loan::Borrowed(loan) => &loan.core,
            Loan::Returned(loan) => &loan.core,
        }
    }

    pub fn loan_id(&self) -> LoanId {
        self.core().loan_id
    }

    pub fn book_id(&self) -> BookId {
        self.core().book_id
    }

    pub fn borrower_id(&self) -> BorrowerId {
        self.core().borrower_id
    }

    pub fn status(&self) -> LoanStatus {
        match self {
            Loan::Borrowed(_) => LoanStatus::Borrowed,
            Loan::Returned(_) => LoanStatus::Returned,
        }
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Loan::Borrowed(_) => None,
            Loan::Returned(loan) => Some(loan.returned_at),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Loan::Borrowed(_))
    }
}

/// 返却処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// 今回の呼び出しで返却された
    Returned(ReturnedLoan),
    /// 既に返却済みだった（何も変更していない）
    AlreadyReturned(ReturnedLoan),
}

impl ReturnOutcome {
    pub fn loan(&self) -> &ReturnedLoan {
        match self {
            ReturnOutcome::Returned(loan) | ReturnOutcome::AlreadyReturned(loan) => loan,
        }
    }

    pub fn was_already_returned(&self) -> bool {
        matches!(self, ReturnOutcome::AlreadyReturned(_))
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出可能な書籍のみ貸し出せる（1冊につき貸出中は1件まで）
/// - 状態はBorrowed
///
/// 副作用なし。書籍の貸出可否の更新は呼び出し側の同期処理が行う。
pub fn borrow_book(
    borrower_id: BorrowerId,
    book: &Book,
    loaned_at: DateTime<Utc>,
) -> Result<BorrowedLoan, BorrowBookError> {
    if !book.available {
        return Err(BorrowBookError::AlreadyBorrowed);
    }

    Ok(BorrowedLoan {
        core: LoanCore {
            loan_id: LoanId::new(),
            borrower_id,
            book_id: book.book_id,
            loaned_at,
        },
    })
}

/// 純粋関数：書籍を返却する
///
/// 既に返却済みの貸出は変更せずそのまま返す（返却日も更新しない）。
pub fn return_book(loan: Loan, returned_at: DateTime<Utc>) -> ReturnOutcome {
    match loan {
        Loan::Borrowed(borrowed) => ReturnOutcome::Returned(ReturnedLoan {
            core: borrowed.core,
            returned_at,
        }),
        Loan::Returned(returned) => ReturnOutcome::AlreadyReturned(returned),
    }
}

/// 永続化された列から貸出を復元する
///
/// ステータスと返却日の組み合わせが矛盾する場合は`None`。
pub fn restore_loan(
    core: LoanCore,
    status: LoanStatus,
    returned_at: Option<DateTime<Utc>>,
) -> Option<Loan> {
    match (status, returned_at) {
        (LoanStatus::Borrowed, None) => Some(Loan::Borrowed(BorrowedLoan { core })),
        (LoanStatus::Returned, Some(returned_at)) => {
            Some(Loan::Returned(ReturnedLoan { core, returned_at }))
        }
        _ => None,
    }
}
