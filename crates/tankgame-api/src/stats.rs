use tankgame_db::Database;
use tankgame_types::Envelope;
use tankgame_types::api::UserStatsUpdate;
use tankgame_types::models::AggregatedStats;

use crate::error::{ServiceError, respond, respond_empty};

pub fn get_aggregated_stats(db: &Database, user_id: i64) -> Envelope<AggregatedStats> {
    let result = db
        .aggregated_stats(user_id)
        .map_err(ServiceError::from)
        .and_then(|stats| stats.ok_or(ServiceError::NotFound("user")));
    respond("get_aggregated_stats", result, "success")
}

pub fn update_user_stats(db: &Database, stats: &UserStatsUpdate) -> Envelope<()> {
    let result = match db.update_user_stats(stats) {
        Ok(0) => Err(ServiceError::NotFound("user")),
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    };
    respond_empty("update_user_stats", result, "success")
}
