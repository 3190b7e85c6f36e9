use crate::domain::{Book, BookId, Borrower, BorrowerId};
use crate::ports::catalog_store::{BookFilter, CatalogStore as CatalogStoreTrait};
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{contains_pattern, map_row_to_book, map_row_to_borrower};

/// CatalogStoreのPostgreSQL実装
///
/// メールアドレスの一意性は`borrowers_email_key`制約、
/// 出版年の検証は`books_publication_year_check`制約でも保証される。
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    /// PostgreSQLコネクションプールから新しいCatalogStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStoreTrait for CatalogStore {
    async fn insert_borrower(&self, borrower: &Borrower) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO borrowers (
                borrower_id,
                name,
                email,
                phone,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(borrower.borrower_id.value())
        .bind(&borrower.name)
        .bind(borrower.email.as_str())
        .bind(&borrower.phone)
        .bind(borrower.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let row = sqlx::query(
            r#"
            SELECT borrower_id, name, email, phone, created_at
            FROM borrowers
            WHERE borrower_id = $1
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrower).transpose()
    }

    async fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        let rows = sqlx::query(
            r#"
            SELECT borrower_id, name, email, phone, created_at
            FROM borrowers
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_borrower).collect()
    }

    async fn update_borrower_contact(&self, borrower: &Borrower) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE borrowers
            SET name = $2, phone = $3
            WHERE borrower_id = $1
            "#,
        )
        .bind(borrower.borrower_id.value())
        .bind(&borrower.name)
        .bind(&borrower.phone)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                book_id,
                title,
                author,
                publication_year,
                genre,
                available
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publication_year.value())
        .bind(&book.genre)
        .bind(book.available)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, author, publication_year, genre, available
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 蔵書一覧（タイトル・著者の部分一致、貸出可否で絞り込み）
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, title, author, publication_year, genre, available
            FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR author ILIKE $2)
              AND ($3::boolean IS NULL OR available = $3)
            ORDER BY title ASC
            "#,
        )
        .bind(filter.title.as_deref().map(contains_pattern))
        .bind(filter.author.as_deref().map(contains_pattern))
        .bind(filter.available)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    /// 書誌情報を更新する（availableは更新しない）
    async fn update_book_details(&self, book: &Book) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, publication_year = $4, genre = $5
            WHERE book_id = $1
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publication_year.value())
        .bind(&book.genre)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
