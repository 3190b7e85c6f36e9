use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{optional_text, required_text};
use super::{BorrowerId, Email, ValidationError};

/// 氏名の上限文字数
pub const NAME_MAX_LEN: usize = 100;
/// 電話番号の上限文字数
pub const PHONE_MAX_LEN: usize = 20;

/// 利用者
///
/// 登録後に変更できるのは氏名と電話番号のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub borrower_id: BorrowerId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 純粋関数：利用者を登録する
///
/// ビジネスルール：
/// - 氏名は必須（100文字以内）
/// - メールアドレスは必須かつ `local@domain` 形式（100文字以内）
/// - 電話番号は任意（空文字は未設定扱い、20文字以内）
pub fn register_borrower(
    name: &str,
    email: &str,
    phone: Option<String>,
    registered_at: DateTime<Utc>,
) -> Result<Borrower, ValidationError> {
    Ok(Borrower {
        borrower_id: BorrowerId::new(),
        name: required_text("name", name, NAME_MAX_LEN)?,
        email: Email::try_from(email.to_string())?,
        phone: optional_text("phone", phone, PHONE_MAX_LEN)?,
        created_at: registered_at,
    })
}

/// 利用者情報の変更内容
///
/// `phone` は `Some(None)` で電話番号を削除する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowerChanges {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
}

/// 純粋関数：利用者の連絡先を変更する
pub fn update_contact(
    borrower: &Borrower,
    changes: BorrowerChanges,
) -> Result<Borrower, ValidationError> {
    let name = match changes.name {
        Some(name) => required_text("name", &name, NAME_MAX_LEN)?,
        None => borrower.name.clone(),
    };
    let phone = match changes.phone {
        Some(phone) => optional_text("phone", phone, PHONE_MAX_LEN)?,
        None => borrower.phone.clone(),
    };

    Ok(Borrower {
        name,
        phone,
        ..borrower.clone()
    })
}
