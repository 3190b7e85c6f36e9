pub mod active_loans_view;
pub mod catalog_store;
pub mod errors;
pub mod loan_ledger;

pub use active_loans_view::*;
pub use catalog_store::*;
pub use errors::{Result, StoreError};
pub use loan_ledger::*;
