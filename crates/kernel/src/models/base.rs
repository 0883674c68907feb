//! Columns shared by every entity table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sift_sdk::Searchable;
use uuid::Uuid;

/// Identity and audit columns, flattened into each entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
pub struct BaseEntity {
    pub id: Uuid,

    #[searchable(
        display_name = "Created At",
        field_type = "date_string",
        searchable = false,
        synonyms = ["created"]
    )]
    pub created_at: Option<NaiveDateTime>,

    pub updated_at: Option<NaiveDateTime>,

    #[searchable(display_name = "Created By", searchable = false)]
    pub created_by: Option<String>,

    pub updated_by: Option<String>,
}

impl BaseEntity {
    /// A fresh identity with no audit data.
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: None,
            updated_at: None,
            created_by: None,
            updated_by: None,
        }
    }
}

impl Default for BaseEntity {
    fn default() -> Self {
        Self::new()
    }
}
