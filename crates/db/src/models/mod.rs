//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO and its validated counterpart
//! - A `Deserialize` update DTO whose nullable fields are `Option<Option<T>>`
//!   so that "omitted" and "cleared" stay distinct

pub mod book;
pub mod genre;
