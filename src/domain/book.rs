use serde::{Deserialize, Serialize};

use super::value_objects::{optional_text, required_text};
use super::{BookId, PublicationYear, ValidationError};

/// タイトルの上限文字数
pub const TITLE_MAX_LEN: usize = 200;
/// 著者の上限文字数
pub const AUTHOR_MAX_LEN: usize = 100;
/// ジャンルの上限文字数
pub const GENRE_MAX_LEN: usize = 50;

/// 蔵書
///
/// `available` は導出状態。貸出の状態変化に合わせて
/// 貸出サービスの同期処理だけが書き換える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub publication_year: PublicationYear,
    pub genre: Option<String>,
    pub available: bool,
}

/// 純粋関数：書籍を蔵書に加える
///
/// ビジネスルール：
/// - タイトル（200文字以内）と著者（100文字以内）は必須
/// - ジャンルは任意（50文字以内）
/// - 出版年は正の値
/// - 登録直後は貸出可能
pub fn catalog_book(
    title: &str,
    author: &str,
    publication_year: i32,
    genre: Option<String>,
) -> Result<Book, ValidationError> {
    Ok(Book {
        book_id: BookId::new(),
        title: required_text("title", title, TITLE_MAX_LEN)?,
        author: required_text("author", author, AUTHOR_MAX_LEN)?,
        publication_year: PublicationYear::try_from(publication_year)?,
        genre: optional_text("genre", genre, GENRE_MAX_LEN)?,
        available: true,
    })
}

/// 書籍情報の変更内容
///
/// 貸出可否は含まない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<Option<String>>,
}

/// 純粋関数：書籍の書誌情報を修正する
pub fn revise_book(book: &Book, changes: BookChanges) -> Result<Book, ValidationError> {
    let title = match changes.title {
        Some(title) => required_text("title", &title, TITLE_MAX_LEN)?,
        None => book.title.clone(),
    };
    let author = match changes.author {
        Some(author) => required_text("author", &author, AUTHOR_MAX_LEN)?,
        None => book.author.clone(),
    };
    let publication_year = match changes.publication_year {
        Some(year) => PublicationYear::try_from(year)?,
        None => book.publication_year,
    };
    let genre = match changes.genre {
        Some(genre) => optional_text("genre", genre, GENRE_MAX_LEN)?,
        None => book.genre.clone(),
    };

    Ok(Book {
        title,
        author,
        publication_year,
        genre,
        ..book.clone()
    })
}
