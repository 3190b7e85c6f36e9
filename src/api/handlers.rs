use crate::application::{ServiceDependencies, catalog, loan};
use crate::domain::{
    BookId, BorrowerId, Loan, LoanId,
    commands::{AddBook, BorrowBook, RegisterBorrower, ReturnBook},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    auth::Librarian,
    error::ApiError,
    types::{
        ActiveLoanResponse, AddBookRequest, BookResponse, BookReturnedResponse,
        BorrowBookRequest, BorrowerResponse, ListBooksQuery, ListLoansQuery, LoanResponse,
        RegisterBorrowerRequest, RemovedResponse, ReviseBookRequest, UpdateBorrowerRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Borrowers
// ============================================================================

/// POST /borrowers - 利用者を登録
pub async fn register_borrower(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterBorrowerRequest>,
) -> Result<(StatusCode, Json<BorrowerResponse>), ApiError> {
    let cmd = RegisterBorrower {
        name: req.name,
        email: req.email,
        phone: req.phone,
        registered_at: chrono::Utc::now(),
    };

    let borrower = catalog::register_borrower(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(borrower.into())))
}

/// GET /borrowers - 利用者一覧（氏名順）
pub async fn list_borrowers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BorrowerResponse>>, QueryError> {
    let borrowers = state
        .service_deps
        .catalog_store
        .list_borrowers()
        .await
        .map_err(|e| QueryError::InternalError(e.to_string()))?;

    Ok(Json(borrowers.into_iter().map(Into::into).collect()))
}

/// GET /borrowers/:id - 利用者詳細
pub async fn get_borrower(
    State(state): State<Arc<AppState>>,
    Path(borrower_id): Path<Uuid>,
) -> Result<Json<BorrowerResponse>, QueryError> {
    match state
        .service_deps
        .catalog_store
        .get_borrower(BorrowerId::from_uuid(borrower_id))
        .await
    {
        Ok(Some(borrower)) => Ok(Json(borrower.into())),
        Ok(None) => Err(QueryError::NotFound(format!(
            "Borrower {} not found",
            borrower_id
        ))),
        Err(e) => Err(QueryError::InternalError(e.to_string())),
    }
}

/// PATCH /borrowers/:id - 氏名・電話番号を変更
pub async fn update_borrower(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Path(borrower_id): Path<Uuid>,
    Json(req): Json<UpdateBorrowerRequest>,
) -> Result<Json<BorrowerResponse>, ApiError> {
    let borrower = catalog::update_borrower(
        &state.service_deps,
        BorrowerId::from_uuid(borrower_id),
        req.to_changes(),
    )
    .await?;

    Ok(Json(borrower.into()))
}

/// DELETE /borrowers/:id - 利用者を削除（貸出も連鎖削除）
pub async fn remove_borrower(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Path(borrower_id): Path<Uuid>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed_loans =
        catalog::remove_borrower(&state.service_deps, BorrowerId::from_uuid(borrower_id)).await?;

    Ok(Json(RemovedResponse { removed_loans }))
}

// ============================================================================
// Books
// ============================================================================

/// POST /books - 書籍を登録
///
/// 出版年は正の値であること。登録直後は貸出可能。
pub async fn add_book(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let cmd = AddBook {
        title: req.title,
        author: req.author,
        publication_year: req.publication_year,
        genre: req.genre,
    };

    let book = catalog::add_book(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// GET /books - 蔵書一覧
///
/// クエリパラメータ:
/// - title: タイトルの部分一致（オプション）
/// - author: 著者の部分一致（オプション）
/// - available: 貸出可否（オプション）
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookResponse>>, QueryError> {
    let books = state
        .service_deps
        .catalog_store
        .list_books(&query.into())
        .await
        .map_err(|e| QueryError::InternalError(e.to_string()))?;

    Ok(Json(books.into_iter().map(Into::into).collect()))
}

/// GET /books/:id - 書籍詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, QueryError> {
    match state
        .service_deps
        .catalog_store
        .get_book(BookId::from_uuid(book_id))
        .await
    {
        Ok(Some(book)) => Ok(Json(book.into())),
        Ok(None) => Err(QueryError::NotFound(format!("Book {} not found", book_id))),
        Err(e) => Err(QueryError::InternalError(e.to_string())),
    }
}

/// PATCH /books/:id - 書誌情報を修正（貸出可否は変更不可）
pub async fn revise_book(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ReviseBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = catalog::revise_book(
        &state.service_deps,
        BookId::from_uuid(book_id),
        req.to_changes(),
    )
    .await?;

    Ok(Json(book.into()))
}

/// DELETE /books/:id - 書籍を削除（貸出も連鎖削除）
pub async fn remove_book(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed_loans =
        catalog::remove_book(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(Json(RemovedResponse { removed_loans }))
}

// ============================================================================
// Loans
// ============================================================================

/// POST /loans - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - 書籍と利用者が存在すること
/// - 書籍が貸出中でないこと（貸出中なら409）
pub async fn borrow_book(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BorrowBookRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = BorrowBook {
        borrower_id: BorrowerId::from_uuid(req.borrower_id),
        book_id: BookId::from_uuid(req.book_id),
        borrowed_at: chrono::Utc::now(),
    };

    let borrowed = loan::borrow_book(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(Loan::Borrowed(borrowed).into())))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 既に返却済みの貸出は変更せず `already_returned: true` を返す。
pub async fn return_book(
    _role: Librarian,
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<BookReturnedResponse>, ApiError> {
    let cmd = ReturnBook {
        loan_id: LoanId::from_uuid(loan_id),
        returned_at: chrono::Utc::now(),
    };

    let outcome = loan::return_book(&state.service_deps, cmd).await?;
    Ok(Json(outcome.into()))
}

/// GET /loans/:id - 貸出詳細
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, QueryError> {
    match state
        .service_deps
        .loan_ledger
        .get_loan(LoanId::from_uuid(loan_id))
        .await
    {
        Ok(Some(loan)) => Ok(Json(loan.into())),
        Ok(None) => Err(QueryError::NotFound(format!("Loan {} not found", loan_id))),
        Err(e) => Err(QueryError::InternalError(e.to_string())),
    }
}

/// GET /loans - 利用者の貸出履歴
///
/// クエリパラメータ:
/// - borrower_id: 利用者IDでフィルタリング（必須）
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<Vec<LoanResponse>>, QueryError> {
    let borrower_id = query.borrower_id.ok_or_else(|| {
        QueryError::BadRequest("borrower_id query parameter is required".to_string())
    })?;

    let loans = state
        .service_deps
        .loan_ledger
        .find_by_borrower(BorrowerId::from_uuid(borrower_id))
        .await
        .map_err(|e| QueryError::InternalError(e.to_string()))?;

    Ok(Json(loans.into_iter().map(Into::into).collect()))
}

/// GET /loans/active - 貸出中一覧
pub async fn list_active_loans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ActiveLoanResponse>>, QueryError> {
    let entries = state
        .service_deps
        .active_loans_view
        .list()
        .await
        .map_err(|e| QueryError::InternalError(e.to_string()))?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

// ============================================================================
// Error types
// ============================================================================

/// クエリハンドラー用のエラー型
#[derive(Debug)]
pub enum QueryError {
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            QueryError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            QueryError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            QueryError::InternalError(msg) => {
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                tracing::error!("Internal error in query handler: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(super::types::ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
