use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, add_book, borrow_book, get_book, get_borrower, get_loan, list_active_loans,
    list_books, list_borrowers, list_loans, register_borrower, remove_book, remove_borrower,
    return_book, revise_book, update_borrower,
};

/// Creates the API router with all library endpoints
///
/// Catalog endpoints:
/// - POST/GET /borrowers, GET/PATCH/DELETE /borrowers/:id
/// - POST/GET /books, GET/PATCH/DELETE /books/:id
///
/// Loan endpoints:
/// - POST /loans - Borrow a book
/// - POST /loans/:id/return - Return a book
/// - GET /loans?borrower_id= - Loan history of a borrower
/// - GET /loans/active - Currently borrowed books
/// - GET /loans/:id - Loan details
///
/// Write endpoints require the `librarian` role (`x-library-role` header).
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Borrowers
        .route("/borrowers", post(register_borrower).get(list_borrowers))
        .route(
            "/borrowers/:id",
            get(get_borrower)
                .patch(update_borrower)
                .delete(remove_borrower),
        )
        // Books
        .route("/books", post(add_book).get(list_books))
        .route(
            "/books/:id",
            get(get_book).patch(revise_book).delete(remove_book),
        )
        // Loans
        .route("/loans", post(borrow_book).get(list_loans))
        .route("/loans/active", get(list_active_loans))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/return", post(return_book))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
