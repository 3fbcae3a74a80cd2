//! Public user identity.
//!
//! The `users` table belongs to the account service; repositories here only
//! read the columns needed to decorate moderation listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The public face of a user as joined into listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub karma_points: i32,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

impl UserSummary {
    /// Name to show: display name if set, username otherwise.
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}
