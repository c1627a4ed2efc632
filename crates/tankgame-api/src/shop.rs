use tankgame_db::Database;
use tankgame_types::Envelope;
use tankgame_types::api::{OrderLine, order_total};
use tankgame_types::models::{Item, OrderReceipt};

use crate::error::{ServiceError, respond};

pub fn get_shop_items(db: &Database) -> Envelope<Vec<Item>> {
    respond(
        "get_shop_items",
        db.shop_items().map_err(ServiceError::from),
        "success",
    )
}

/// Looks up catalog items by `stat` key. An empty key set yields an empty
/// list without running a query.
pub fn get_item_info(db: &Database, stats: &[String]) -> Envelope<Vec<Item>> {
    respond(
        "get_item_info",
        db.items_by_stat(stats).map_err(ServiceError::from),
        "success",
    )
}

/// Saves all lines under one newly allocated order id.
pub fn save_order(db: &Database, user_id: i64, lines: &[OrderLine]) -> Envelope<OrderReceipt> {
    respond("save_order", try_save_order(db, user_id, lines), "success")
}

fn try_save_order(
    db: &Database,
    user_id: i64,
    lines: &[OrderLine],
) -> Result<OrderReceipt, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::Invalid("Order has no items"));
    }
    if order_total(lines).is_none() {
        return Err(ServiceError::Invalid("Order total out of range"));
    }

    Ok(db.save_order(user_id, lines)?)
}
