use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Points --

/// A points transfer between a user and a counterparty.
///
/// `dest = None` means the system account. A positive `change` credits the
/// user and debits the counterparty.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePoints {
    pub user_id: i64,
    pub change: i64,
    #[serde(default)]
    pub dest: Option<i64>,
    #[serde(default = "default_points_kind")]
    pub kind: String,
    #[serde(default = "default_points_memo")]
    pub memo: String,
}

impl ChangePoints {
    /// Points earned from (or paid to) the system account.
    pub fn earned(user_id: i64, change: i64) -> Self {
        Self {
            user_id,
            change,
            dest: None,
            kind: default_points_kind(),
            memo: default_points_memo(),
        }
    }
}

fn default_points_kind() -> String {
    "earned".into()
}

fn default_points_memo() -> String {
    "system".into()
}

// -- XP --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddXp {
    pub user_id: i64,
    pub amount: i64,
    #[serde(default = "default_xp_kind")]
    pub kind: String,
    #[serde(default)]
    pub note: String,
}

impl AddXp {
    pub fn system(user_id: i64, amount: i64) -> Self {
        Self {
            user_id,
            amount,
            kind: default_xp_kind(),
            note: String::new(),
        }
    }
}

fn default_xp_kind() -> String {
    "system".into()
}

// -- Stats --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserStatsUpdate {
    pub user_id: i64,
    pub level: i64,
    pub xp: i64,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

// -- Tanks --

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankStats {
    pub speed: f64,
    pub range: f64,
    pub turn_speed: f64,
    pub fire_rate: f64,
    pub health: f64,
    pub damage: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankUpdate {
    pub id: i64,
    #[serde(flatten)]
    pub stats: TankStats,
}

// -- Shop --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderLine {
    #[serde(rename = "id")]
    pub item_id: i64,
    pub quantity: i64,
    pub cost: i64,
}

impl OrderLine {
    /// `cost * quantity`, or `None` if it overflows.
    pub fn line_total(&self) -> Option<i64> {
        self.cost.checked_mul(self.quantity)
    }
}

/// Sum of every line total, or `None` if any step overflows.
pub fn order_total(lines: &[OrderLine]) -> Option<i64> {
    lines
        .iter()
        .try_fold(0i64, |acc, line| acc.checked_add(line.line_total()?))
}
