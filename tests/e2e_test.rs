use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use library_loans::api::auth::ROLE_HEADER;
use library_loans::api::handlers::AppState;
use library_loans::api::router::create_router;
use library_loans::api::types::*;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// インメモリストアの上に実際のAPIルーターを組み立てる
fn setup_e2e_app() -> axum::Router {
    let (_store, service_deps) = common::memory_dependencies();
    let app_state = Arc::new(AppState { service_deps });
    create_router(app_state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    role: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header(ROLE_HEADER, role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_borrower(app: &axum::Router, name: &str, email: &str) -> BorrowerResponse {
    let response = send(
        app,
        "POST",
        "/borrowers",
        Some("librarian"),
        Some(json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn create_book(app: &axum::Router, title: &str, year: i32) -> BookResponse {
    let response = send(
        app,
        "POST",
        "/books",
        Some("librarian"),
        Some(json!({ "title": title, "author": "Frank Herbert", "publication_year": year })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn borrow(app: &axum::Router, borrower_id: Uuid, book_id: Uuid) -> Response {
    send(
        app,
        "POST",
        "/loans",
        Some("librarian"),
        Some(json!({ "borrower_id": borrower_id, "book_id": book_id })),
    )
    .await
}

// ============================================================================
// E2Eテスト: 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let app = setup_e2e_app();
    let ana = create_borrower(&app, "Ana", "ana@example.com").await;
    let book = create_book(&app, "Dune", 1965).await;
    assert!(book.available);

    // Step 1: 貸出（POST /loans）
    let response = borrow(&app, ana.borrower_id, book.book_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: LoanResponse = read_json(response).await;
    assert_eq!(loan.status, "borrowed");
    assert_eq!(loan.returned_at, None);

    // Step 2: 書籍は貸出不可になる
    let response = send(&app, "GET", &format!("/books/{}", book.book_id), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored: BookResponse = read_json(response).await;
    assert!(!stored.available);

    // Step 3: 貸出中一覧（GET /loans/active）
    let response = send(&app, "GET", "/loans/active", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let active: Vec<ActiveLoanResponse> = read_json(response).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].loan_id, loan.loan_id);
    assert_eq!(active[0].borrower_name, "Ana");
    assert_eq!(active[0].book_title, "Dune");

    // Step 4: 返却（POST /loans/:id/return）
    let uri = format!("/loans/{}/return", loan.loan_id);
    let response = send(&app, "POST", &uri, Some("librarian"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let returned: BookReturnedResponse = read_json(response).await;
    assert_eq!(returned.book_id, book.book_id);
    assert!(!returned.already_returned);

    // Step 5: 再返却は変更なしで成功
    let response = send(&app, "POST", &uri, Some("librarian"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let again: BookReturnedResponse = read_json(response).await;
    assert!(again.already_returned);
    assert_eq!(again.returned_at, returned.returned_at);

    // Step 6: 貸出詳細と履歴
    let response = send(&app, "GET", &format!("/loans/{}", loan.loan_id), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail: LoanResponse = read_json(response).await;
    assert_eq!(detail.status, "returned");
    assert_eq!(detail.returned_at, Some(returned.returned_at));

    let uri = format!("/loans?borrower_id={}", ana.borrower_id);
    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let history: Vec<LoanResponse> = read_json(response).await;
    assert_eq!(history.len(), 1);

    let response = send(&app, "GET", &format!("/books/{}", book.book_id), None, None).await;
    let stored: BookResponse = read_json(response).await;
    assert!(stored.available);
}

// ============================================================================
// E2Eテスト: 異常系
// ============================================================================

#[tokio::test]
async fn test_e2e_write_without_librarian_role_is_forbidden() {
    let app = setup_e2e_app();

    for role in [None, Some("reader")] {
        let response = send(
            &app,
            "POST",
            "/books",
            role,
            Some(json!({ "title": "Dune", "author": "Frank Herbert", "publication_year": 1965 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.error, "FORBIDDEN");
    }

    // 参照はロールなしで可能
    let response = send(&app, "GET", "/books", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let books: Vec<BookResponse> = read_json(response).await;
    assert!(books.is_empty());
}

#[tokio::test]
async fn test_e2e_borrowing_borrowed_book_is_conflict() {
    let app = setup_e2e_app();
    let ana = create_borrower(&app, "Ana", "ana@example.com").await;
    let ben = create_borrower(&app, "Ben", "ben@example.com").await;
    let book = create_book(&app, "Dune", 1965).await;

    let response = borrow(&app, ana.borrower_id, book.book_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = borrow(&app, ben.borrower_id, book.book_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "ALREADY_BORROWED");
}

#[tokio::test]
async fn test_e2e_validation_errors_are_unprocessable() {
    let app = setup_e2e_app();
    create_borrower(&app, "Ana", "ana@example.com").await;

    let response = send(
        &app,
        "POST",
        "/books",
        Some("librarian"),
        Some(json!({ "title": "Dune", "author": "Frank Herbert", "publication_year": 0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "VALIDATION_ERROR");

    let response = send(
        &app,
        "POST",
        "/borrowers",
        Some("librarian"),
        Some(json!({ "name": "Ana Again", "email": "ana@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "DUPLICATE_EMAIL");

    let response = send(
        &app,
        "POST",
        "/books",
        Some("librarian"),
        Some(json!({ "title": "t".repeat(250), "author": "Frank Herbert", "publication_year": 1965 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_e2e_unknown_resources_are_not_found() {
    let app = setup_e2e_app();
    let ana = create_borrower(&app, "Ana", "ana@example.com").await;

    let response = borrow(&app, ana.borrower_id, Uuid::new_v4()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_NOT_FOUND");

    let uri = format!("/loans/{}/return", Uuid::new_v4());
    let response = send(&app, "POST", &uri, Some("librarian"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "LOAN_NOT_FOUND");

    let response = send(&app, "GET", &format!("/borrowers/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_e2e_list_loans_requires_borrower_id() {
    let app = setup_e2e_app();

    let response = send(&app, "GET", "/loans", None, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_e2e_removing_borrower_frees_book() {
    let app = setup_e2e_app();
    let ana = create_borrower(&app, "Ana", "ana@example.com").await;
    let book = create_book(&app, "Dune", 1965).await;

    let response = borrow(&app, ana.borrower_id, book.book_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let uri = format!("/borrowers/{}", ana.borrower_id);
    let response = send(&app, "DELETE", &uri, Some("librarian"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let removed: RemovedResponse = read_json(response).await;
    assert_eq!(removed.removed_loans, 1);

    let response = send(&app, "GET", &format!("/books/{}", book.book_id), None, None).await;
    let stored: BookResponse = read_json(response).await;
    assert!(stored.available);

    let response = send(&app, "GET", "/loans/active", None, None).await;
    let active: Vec<ActiveLoanResponse> = read_json(response).await;
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_e2e_health_check() {
    let app = setup_e2e_app();

    let response = send(&app, "GET", "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
}
