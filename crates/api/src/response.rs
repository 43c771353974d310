//! Response payloads shared across handler modules.

use bookshelf_core::types::DbId;
use serde::Serialize;

/// Body returned by a successful delete: `{ "id": 3, "message": "Book deleted" }`.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: DbId,
    pub message: String,
}

impl DeletedResponse {
    pub fn new(entity: &str, id: DbId) -> Self {
        Self {
            id,
            message: format!("{entity} deleted"),
        }
    }
}
