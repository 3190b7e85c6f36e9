pub mod active_loans_view;
pub mod catalog_store;
pub mod loan_ledger;
mod rows;

use crate::ports::StoreError;

// パブリックに型を再エクスポート
pub use active_loans_view::ActiveLoansView as PostgresActiveLoansView;
pub use catalog_store::CatalogStore as PostgresCatalogStore;
pub use loan_ledger::LoanLedger as PostgresLoanLedger;

/// sqlxのエラーをストアポートのエラーに変換する
///
/// 一意制約違反（SQLSTATE 23505）は制約名付きの`UniqueViolation`、
/// 外部キー制約違反（SQLSTATE 23503）は`ForeignKeyViolation`になる。
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::ForeignKeyViolation(constraint);
            }
        }
        StoreError::Backend(Box::new(err))
    }
}
