use crate::application::{catalog::CatalogApplicationError, loan::LoanApplicationError};
use crate::domain::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Loan(LoanApplicationError),
    Catalog(CatalogApplicationError),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

impl From<CatalogApplicationError> for ApiError {
    fn from(err: CatalogApplicationError) -> Self {
        ApiError::Catalog(err)
    }
}

fn validation_response(err: &ValidationError) -> (StatusCode, &'static str, String) {
    let error_type = match err {
        ValidationError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
        _ => "VALIDATION_ERROR",
    };
    (StatusCode::UNPROCESSABLE_ENTITY, error_type, err.to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // 404 Not Found - リクエストされたリソースが存在しない
            ApiError::Loan(LoanApplicationError::LoanNotFound) => (
                StatusCode::NOT_FOUND,
                "LOAN_NOT_FOUND",
                "Loan not found".to_string(),
            ),
            ApiError::Loan(LoanApplicationError::BookNotFound)
            | ApiError::Catalog(CatalogApplicationError::BookNotFound) => (
                StatusCode::NOT_FOUND,
                "BOOK_NOT_FOUND",
                "Book not found".to_string(),
            ),
            ApiError::Loan(LoanApplicationError::BorrowerNotFound)
            | ApiError::Catalog(CatalogApplicationError::BorrowerNotFound) => (
                StatusCode::NOT_FOUND,
                "BORROWER_NOT_FOUND",
                "Borrower not found".to_string(),
            ),

            // 409 Conflict - 書籍は貸出中
            ApiError::Loan(LoanApplicationError::AlreadyBorrowed) => (
                StatusCode::CONFLICT,
                "ALREADY_BORROWED",
                "Book is already borrowed".to_string(),
            ),

            // 422 Unprocessable Entity - 入力値の検証エラー
            ApiError::Catalog(CatalogApplicationError::Validation(ref err)) => {
                validation_response(err)
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Loan(LoanApplicationError::StoreError(ref e))
            | ApiError::Catalog(CatalogApplicationError::StoreError(ref e)) => {
                tracing::error!(error = ?e, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Failed to access the library store".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
