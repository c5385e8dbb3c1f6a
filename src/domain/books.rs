use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{BookId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub cover_image_url: Option<String>,
    pub recommend: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub cover_image_url: Option<String>,
}

/// Field changes for an update. `cover_image_url` is only written when a new
/// cover was resolved for the request; `None` leaves the stored cover alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
}

impl UpdateBook {
    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.content.is_some() || self.cover_image_url.is_some()
    }
}
