use tankgame_db::Database;
use tankgame_types::Envelope;
use tankgame_types::api::TankUpdate;
use tankgame_types::models::{CreatedTank, Tank};

use crate::error::{ServiceError, respond, respond_empty};

/// Creates a tank with default stats. The name is optional and may be empty.
pub fn create_tank(db: &Database, user_id: i64, name: &str) -> Envelope<CreatedTank> {
    let result = db
        .create_tank(user_id, name)
        .map(|id| CreatedTank { id })
        .map_err(ServiceError::from);
    respond("create_tank", result, "success")
}

/// Usually one tank per user, but nothing limits it.
pub fn get_tanks(db: &Database, user_id: i64) -> Envelope<Vec<Tank>> {
    respond(
        "get_tanks",
        db.get_tanks(user_id).map_err(ServiceError::from),
        "success",
    )
}

/// Only the owner's tank is touched; any other id reports not found.
pub fn update_tank(db: &Database, user_id: i64, tank: &TankUpdate) -> Envelope<()> {
    let result = match db.update_tank(user_id, tank) {
        Ok(0) => Err(ServiceError::NotFound("tank")),
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    };
    respond_empty("update_tank", result, "success")
}
