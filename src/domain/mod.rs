pub mod availability;
pub mod book;
pub mod borrower;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod value_objects;

pub use book::Book;
pub use borrower::Borrower;
pub use errors::*;
pub use loan::Loan;
pub use value_objects::*;
