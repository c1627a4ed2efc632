use tankgame_db::Database;
use tankgame_types::Envelope;
use tankgame_types::api::ChangePoints;
use tankgame_types::models::{PointsTransaction, Total};

use crate::auth::system_account;
use crate::error::{ServiceError, respond, respond_empty};

/// Moves points between a user and a counterparty, defaulting to the
/// system account when `dest` is absent or not a valid id.
///
/// Both ledger rows are written in one transaction.
pub fn change_points(db: &Database, req: &ChangePoints) -> Envelope<()> {
    respond_empty("change_points", try_change_points(db, req), "success")
}

fn try_change_points(db: &Database, req: &ChangePoints) -> Result<(), ServiceError> {
    // The counterparty row carries `-change`
    if req.change.checked_neg().is_none() {
        return Err(ServiceError::Invalid("Points change out of range"));
    }

    let dest = match req.dest.filter(|id| *id > 0) {
        Some(id) => id,
        None => system_account(db)?.id,
    };

    db.record_transfer(req.user_id, req.change, dest, &req.kind, &req.memo)?;
    Ok(())
}

pub fn get_total_points(db: &Database, user_id: i64) -> Envelope<Total> {
    let result = db
        .total_points(user_id)
        .map(|total| Total { total })
        .map_err(ServiceError::from);
    respond("get_total_points", result, "success")
}

pub fn get_points_history(db: &Database, user_id: i64) -> Envelope<Vec<PointsTransaction>> {
    respond(
        "get_points_history",
        db.points_history(user_id).map_err(ServiceError::from),
        "success",
    )
}
