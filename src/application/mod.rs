mod availability;
pub mod catalog;
mod dependencies;
pub mod loan;

pub use dependencies::ServiceDependencies;
