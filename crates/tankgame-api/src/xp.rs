use tankgame_db::Database;
use tankgame_types::Envelope;
use tankgame_types::api::AddXp;
use tankgame_types::models::Total;

use crate::error::{ServiceError, respond, respond_empty};

/// Appends one XP ledger row. Negative amounts are accepted.
pub fn add_xp(db: &Database, entry: &AddXp) -> Envelope<()> {
    respond_empty("add_xp", db.add_xp(entry).map_err(ServiceError::from), "success")
}

/// Ledger total for the user. Meant to be called seldom and cached on the
/// user row via `update_user_stats`.
pub fn get_total_xp(db: &Database, user_id: i64) -> Envelope<Total> {
    let result = db
        .total_xp(user_id)
        .map(|total| Total { total })
        .map_err(ServiceError::from);
    respond("get_total_xp", result, "success")
}
