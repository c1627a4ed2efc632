use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::TankStats;

/// A user as returned to callers. The password hash never leaves the db crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub level: i64,
    pub xp: i64,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Successful login payload: the user fields with `roles` alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemAccount {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Total {
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: i64,
    pub user_id_src: i64,
    pub user_id_dest: i64,
    pub change: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
}

/// Cached counters on the user row next to the ledger-derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub user_id: i64,
    pub level: i64,
    pub xp: i64,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
    pub total_xp: i64,
    pub total_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(flatten)]
    pub stats: TankStats,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTank {
    pub id: i64,
}

/// Catalog entry. `stat` names the tank stat the item modifies and doubles
/// as its lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub stat: String,
    pub modifier: f64,
    pub cost: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub lines: usize,
    pub total_cost: i64,
}
