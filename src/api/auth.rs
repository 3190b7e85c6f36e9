use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// ロールを運ぶリクエストヘッダー
pub const ROLE_HEADER: &str = "x-library-role";

/// 利用者ロール
///
/// - Reader: 参照のみ
/// - Librarian: 蔵書・利用者・貸出の管理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reader,
    Librarian,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" => Ok(Role::Reader),
            "librarian" => Ok(Role::Librarian),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// 管理操作の認可チェック
///
/// 書き込み系ハンドラーの引数に置くと、`librarian` ロール以外のリクエストを
/// 403で拒否する。ロールヘッダーがない場合はReaderとして扱う。
#[derive(Debug, Clone, Copy)]
pub struct Librarian;

/// 認可エラー
#[derive(Debug)]
pub struct Forbidden(String);

impl IntoResponse for Forbidden {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new("FORBIDDEN", self.0));
        (StatusCode::FORBIDDEN, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Librarian
where
    S: Send + Sync,
{
    type Rejection = Forbidden;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = match parts.headers.get(ROLE_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| Forbidden("Invalid role header".to_string()))?
                .parse::<Role>()
                .map_err(Forbidden)?,
            None => Role::Reader,
        };

        match role {
            Role::Librarian => Ok(Librarian),
            Role::Reader => Err(Forbidden(
                "Librarian role is required for this operation".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("librarian".parse::<Role>(), Ok(Role::Librarian));
        assert_eq!(" Reader ".parse::<Role>(), Ok(Role::Reader));
        assert!("admin".parse::<Role>().is_err());
    }
}
