//! Domain types and pure validation logic for the bookshelf service.
//!
//! Nothing in this crate touches the database or the network. Both the
//! PostgreSQL store and the in-memory test store in `bookshelf-db` call into
//! these helpers so they apply identical rules.

pub mod error;
pub mod input;
pub mod stats;
pub mod status;
pub mod types;
