mod catalog_service;
mod errors;

pub use catalog_service::{
    add_book, register_borrower, remove_book, remove_borrower, revise_book, update_borrower,
};
pub use errors::{CatalogApplicationError, Result};
