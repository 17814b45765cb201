#![doc = include_str!("../README.md")]

pub mod db;
pub mod env;
pub mod error;

// Re-exports for convenience
pub use db::adapter::{Adapter, TransactionAdapter};
pub use error::{BetterAuthError, HttpStatus};
