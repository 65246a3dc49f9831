//! Account state, its persistence contract, and the repository binding the two.

mod account_model;
mod account_repository;
mod store;

pub use account_model::*;
pub use account_repository::*;
pub use store::*;
