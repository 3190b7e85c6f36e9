use crate::ports::{ActiveLoansView, CatalogStore, LoanLedger};
use std::sync::Arc;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、各サービス関数に引数として渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog_store: Arc<dyn CatalogStore>,
    pub loan_ledger: Arc<dyn LoanLedger>,
    pub active_loans_view: Arc<dyn ActiveLoansView>,
}
