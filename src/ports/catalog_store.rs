use crate::domain::{Book, BookId, Borrower, BorrowerId};
use async_trait::async_trait;

use super::Result;

/// 蔵書一覧の絞り込み条件
///
/// タイトル・著者は大文字小文字を区別しない部分一致。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub available: Option<bool>,
}

impl BookFilter {
    /// 条件に一致するか判定する（インメモリ実装用）
    pub fn matches(&self, book: &Book) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }

        contains(&book.title, &self.title)
            && contains(&book.author, &self.author)
            && self.available.is_none_or(|a| book.available == a)
    }
}

/// カタログストアポート
///
/// 利用者と書籍の作成・参照・更新を扱う。
/// 削除は貸出の連鎖削除を伴うため`LedgerTransaction`が担当する。
/// 書籍の貸出可否はこのポートからは書き換えられない。
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// 利用者を保存する
    ///
    /// メールアドレスが登録済みの場合は`StoreError::UniqueViolation`。
    async fn insert_borrower(&self, borrower: &Borrower) -> Result<()>;

    async fn get_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>>;

    /// 氏名順の利用者一覧
    async fn list_borrowers(&self) -> Result<Vec<Borrower>>;

    /// 氏名と電話番号を更新する。存在しない場合は`false`。
    async fn update_borrower_contact(&self, borrower: &Borrower) -> Result<bool>;

    async fn insert_book(&self, book: &Book) -> Result<()>;

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// タイトル順の蔵書一覧
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// 書誌情報（タイトル・著者・出版年・ジャンル）を更新する
    ///
    /// `available`は無視される。存在しない場合は`false`。
    async fn update_book_details(&self, book: &Book) -> Result<bool>;
}
