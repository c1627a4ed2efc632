use chrono::{DateTime, Utc};
use tankgame_types::models::User;

/// Database row types that carry columns callers must never see.
/// Everything else is read straight into the `tankgame-types` models.

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub level: i64,
    pub xp: i64,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Drops the password hash.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            level: self.level,
            xp: self.xp,
            points: self.points,
            wins: self.wins,
            losses: self.losses,
            created_at: self.created_at,
        }
    }
}
