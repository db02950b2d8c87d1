//! Domain model for the book catalog.
//!
//! # Responsibility
//! - Define the Rust shapes of `Books` rows and their money values.
//! - Normalize storefront listing text into column values.
//!
//! # Invariants
//! - Every stored book is identified by a store-assigned `BookId`.
//! - Model types never add constraints the schema does not declare.

pub mod book;
pub mod listing;
