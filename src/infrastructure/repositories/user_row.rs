//! Joined user columns shared by listings that decorate rows with their author.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::UserSummary;

/// Aliased `users` columns matching `UserSummaryRow`. Expects the table aliased as `u`.
macro_rules! user_summary_columns {
    () => {
        "u.id AS u_id, u.username AS u_username, u.display_name AS u_display_name, \
         u.avatar_url AS u_avatar_url, u.karma_points AS u_karma_points, \
         u.is_banned AS u_is_banned, u.created_at AS u_created_at"
    };
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserSummaryRow {
    u_id: Uuid,
    u_username: String,
    u_display_name: Option<String>,
    u_avatar_url: Option<String>,
    u_karma_points: i32,
    u_is_banned: bool,
    u_created_at: DateTime<Utc>,
}

impl UserSummaryRow {
    pub(crate) fn into_summary(self) -> UserSummary {
        UserSummary {
            id: self.u_id,
            username: self.u_username,
            display_name: self.u_display_name,
            avatar_url: self.u_avatar_url,
            karma_points: self.u_karma_points,
            is_banned: self.u_is_banned,
            created_at: self.u_created_at,
        }
    }
}
