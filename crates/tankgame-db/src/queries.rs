use crate::models::UserRow;
use crate::sql::expand_in_list;
use crate::{Database, SYSTEM_ACCOUNT_EMAIL};
use anyhow::{Context, Result};
use rusqlite::{Connection, Row, named_params};
use tankgame_types::api::{AddXp, OrderLine, TankUpdate, UserStatsUpdate, order_total};
use tankgame_types::models::{
    AggregatedStats, Item, OrderReceipt, PointsTransaction, Role, SystemAccount, Tank,
};
use tracing::debug;

impl Database {
    /// Loads the named statement and runs `f` with it under the connection lock.
    fn run<F, T>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &str) -> Result<T>,
    {
        let sql = self.query(name)?;
        debug!(query = name, "executing");
        self.with_conn(|conn| f(conn, sql.as_ref()))
            .with_context(|| format!("query {} failed", name))
    }

    // -- Users --

    /// Inserts a user with an already hashed password. Returns the new id.
    pub fn register_user(&self, email: &str, password_hash: &str) -> Result<i64> {
        self.run("register", |conn, sql| {
            conn.execute(sql, named_params! { ":email": email, ":password": password_hash })?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.run("login", |conn, sql| {
            let row = conn
                .query_row(sql, named_params! { ":email": email }, |row| {
                    Ok(UserRow {
                        id: row.get("id")?,
                        email: row.get("email")?,
                        password: row.get("password")?,
                        level: row.get("level")?,
                        xp: row.get("xp")?,
                        points: row.get("points")?,
                        wins: row.get("wins")?,
                        losses: row.get("losses")?,
                        created_at: row.get("created_at")?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_roles(&self, user_id: i64) -> Result<Vec<Role>> {
        self.run("get_roles", |conn, sql| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(named_params! { ":user_id": user_id }, |row| {
                    Ok(Role {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Links a user to a role by name. Returns false if the role is unknown or
    /// already held.
    pub fn grant_role(&self, user_id: i64, role: &str) -> Result<bool> {
        self.run("grant_role", |conn, sql| {
            let changed = conn.execute(sql, named_params! { ":user_id": user_id, ":role": role })?;
            Ok(changed > 0)
        })
    }

    pub fn get_system_account(&self) -> Result<Option<SystemAccount>> {
        self.run("get_system_user", |conn, sql| {
            let row = conn
                .query_row(sql, named_params! { ":email": SYSTEM_ACCOUNT_EMAIL }, |row| {
                    Ok(SystemAccount {
                        id: row.get("id")?,
                        email: row.get("email")?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    // -- XP --

    pub fn add_xp(&self, entry: &AddXp) -> Result<()> {
        self.run("add_xp", |conn, sql| {
            conn.execute(
                sql,
                named_params! {
                    ":uid": entry.user_id,
                    ":amount": entry.amount,
                    ":type": entry.kind,
                    ":note": entry.note,
                },
            )?;
            Ok(())
        })
    }

    /// Sum of the XP ledger; a user with no entries has 0.
    pub fn total_xp(&self, user_id: i64) -> Result<i64> {
        self.run("get_total_xp", |conn, sql| query_total(conn, sql, user_id))
    }

    // -- Points --

    /// Records both sides of a transfer in one transaction.
    ///
    /// The first row moves `-change` from `dest` to `user_id`, the second
    /// moves `+change` from `user_id` to `dest`, so the pair sums to zero.
    pub fn record_transfer(
        &self,
        user_id: i64,
        change: i64,
        dest: i64,
        kind: &str,
        memo: &str,
    ) -> Result<()> {
        // Checked before locking; a panic under the lock poisons it
        let debit = change.checked_neg().context("points change out of range")?;
        let sql = self.query("change_points")?;
        debug!(user_id, dest, change, "recording points transfer");

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&sql)?;
                stmt.execute(named_params! {
                    ":src": dest,
                    ":dest": user_id,
                    ":change": debit,
                    ":type": kind,
                    ":memo": memo,
                })?;
                stmt.execute(named_params! {
                    ":src": user_id,
                    ":dest": dest,
                    ":change": change,
                    ":type": kind,
                    ":memo": memo,
                })?;
            }
            tx.commit()?;
            Ok(())
        })
        .context("query change_points failed")
    }

    /// Balance derived from the ledger: every row the user is the source of.
    pub fn total_points(&self, user_id: i64) -> Result<i64> {
        self.run("get_total_points", |conn, sql| query_total(conn, sql, user_id))
    }

    pub fn points_history(&self, user_id: i64) -> Result<Vec<PointsTransaction>> {
        self.run("get_points_history", |conn, sql| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(named_params! { ":uid": user_id }, |row| {
                    Ok(PointsTransaction {
                        id: row.get("id")?,
                        user_id_src: row.get("user_id_src")?,
                        user_id_dest: row.get("user_id_dest")?,
                        change: row.get("change")?,
                        kind: row.get("type")?,
                        memo: row.get("memo")?,
                        created_at: row.get("created_at")?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Stats --

    pub fn aggregated_stats(&self, user_id: i64) -> Result<Option<AggregatedStats>> {
        self.run("get_aggregated_stats", |conn, sql| {
            let row = conn
                .query_row(sql, named_params! { ":uid": user_id }, |row| {
                    Ok(AggregatedStats {
                        user_id: row.get("user_id")?,
                        level: row.get("level")?,
                        xp: row.get("xp")?,
                        points: row.get("points")?,
                        wins: row.get("wins")?,
                        losses: row.get("losses")?,
                        total_xp: row.get("total_xp")?,
                        total_points: row.get("total_points")?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Returns the number of user rows updated (0 or 1).
    pub fn update_user_stats(&self, stats: &UserStatsUpdate) -> Result<usize> {
        self.run("update_user_stats", |conn, sql| {
            let changed = conn.execute(
                sql,
                named_params! {
                    ":uid": stats.user_id,
                    ":level": stats.level,
                    ":xp": stats.xp,
                    ":points": stats.points,
                    ":wins": stats.wins,
                    ":losses": stats.losses,
                },
            )?;
            Ok(changed)
        })
    }

    // -- Tanks --

    pub fn create_tank(&self, user_id: i64, name: &str) -> Result<i64> {
        self.run("create_tank", |conn, sql| {
            conn.execute(sql, named_params! { ":name": name, ":user_id": user_id })?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_tanks(&self, user_id: i64) -> Result<Vec<Tank>> {
        self.run("get_tanks", |conn, sql| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(named_params! { ":user_id": user_id }, tank_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Updates stats on a tank the user owns. Returns rows updated (0 or 1).
    pub fn update_tank(&self, user_id: i64, tank: &TankUpdate) -> Result<usize> {
        self.run("update_tank", |conn, sql| {
            let changed = conn.execute(
                sql,
                named_params! {
                    ":id": tank.id,
                    ":user_id": user_id,
                    ":speed": tank.stats.speed,
                    ":range": tank.stats.range,
                    ":turn_speed": tank.stats.turn_speed,
                    ":fire_rate": tank.stats.fire_rate,
                    ":health": tank.stats.health,
                    ":damage": tank.stats.damage,
                },
            )?;
            Ok(changed)
        })
    }

    // -- Shop --

    pub fn shop_items(&self) -> Result<Vec<Item>> {
        self.run("get_shop_items", |conn, sql| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch catalog items by their `stat` key.
    pub fn items_by_stat(&self, stats: &[String]) -> Result<Vec<Item>> {
        if stats.is_empty() {
            return Ok(vec![]);
        }

        self.run("get_item_info", |conn, sql| {
            let sql = expand_in_list(sql, "stats", stats.len());
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(stats.iter()), item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Creates an order and its line items atomically.
    ///
    /// The order id is allocated by the `orders` table inside the same
    /// transaction, so concurrent callers never share one.
    pub fn save_order(&self, user_id: i64, lines: &[OrderLine]) -> Result<OrderReceipt> {
        let total_cost = order_total(lines).context("order total out of range")?;
        let create_sql = self.query("create_order")?;
        let item_sql = self.query("insert_order_item")?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(&create_sql, named_params! { ":user_id": user_id })?;
            let order_id = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare(&item_sql)?;
                for line in lines {
                    stmt.execute(named_params! {
                        ":order_id": order_id,
                        ":item_id": line.item_id,
                        ":user_id": user_id,
                        ":quantity": line.quantity,
                        ":price": line.cost,
                    })?;
                }
            }
            tx.commit()?;

            debug!(order_id, user_id, lines = lines.len(), "order saved");
            Ok(OrderReceipt {
                order_id,
                lines: lines.len(),
                total_cost,
            })
        })
        .context("query save_order failed")
    }
}

fn query_total(conn: &Connection, sql: &str, user_id: i64) -> Result<i64> {
    let total: Option<i64> = conn
        .query_row(sql, named_params! { ":uid": user_id }, |row| row.get("total"))
        .optional()?;
    Ok(total.unwrap_or(0))
}

fn tank_from_row(row: &Row<'_>) -> rusqlite::Result<Tank> {
    Ok(Tank {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        stats: tankgame_types::api::TankStats {
            speed: row.get("speed")?,
            range: row.get("range")?,
            turn_speed: row.get("turn_speed")?,
            fire_rate: row.get("fire_rate")?,
            health: row.get("health")?,
            damage: row.get("damage")?,
        },
        created_at: row.get("created_at")?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        stat: row.get("stat")?,
        modifier: row.get("modifier")?,
        cost: row.get("cost")?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankgame_types::api::TankStats;

    fn db_with_user(email: &str) -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let id = db.register_user(email, "hash").unwrap();
        (db, id)
    }

    fn system_id(db: &Database) -> i64 {
        db.get_system_account().unwrap().unwrap().id
    }

    #[test]
    fn user_lookup_by_email() {
        let (db, id) = db_with_user("a@b.com");
        let row = db.get_user_by_email("a@b.com").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.password, "hash");
        assert_eq!(row.level, 1);

        assert!(db.get_user_by_email("nobody@b.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_a_driver_error() {
        let (db, _) = db_with_user("a@b.com");
        let err = db.register_user("a@b.com", "other").unwrap_err();
        assert!(format!("{:#}", err).contains("UNIQUE"));
    }

    #[test]
    fn roles_are_listed_after_grant() {
        let (db, id) = db_with_user("a@b.com");
        assert!(db.get_roles(id).unwrap().is_empty());

        assert!(db.grant_role(id, "admin").unwrap());
        assert!(!db.grant_role(id, "emperor").unwrap());

        let roles = db.get_roles(id).unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "admin");
    }

    #[test]
    fn xp_total_defaults_to_zero_then_sums() {
        let (db, id) = db_with_user("a@b.com");
        assert_eq!(db.total_xp(id).unwrap(), 0);

        db.add_xp(&AddXp::system(id, 10)).unwrap();
        db.add_xp(&AddXp::system(id, 25)).unwrap();
        db.add_xp(&AddXp::system(id, -5)).unwrap();
        assert_eq!(db.total_xp(id).unwrap(), 30);
    }

    #[test]
    fn transfer_rows_cancel_out() {
        let (db, id) = db_with_user("a@b.com");
        let system = system_id(&db);

        db.record_transfer(id, 100, system, "earned", "system").unwrap();

        let history = db.points_history(id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().map(|t| t.change).sum::<i64>(), 0);
        assert_eq!(history[0].user_id_src, system);
        assert_eq!(history[0].change, -100);
        assert_eq!(history[1].user_id_src, id);
        assert_eq!(history[1].change, 100);

        assert_eq!(db.total_points(id).unwrap(), 100);
        assert_eq!(db.total_points(system).unwrap(), -100);
    }

    #[test]
    fn out_of_range_change_leaves_the_connection_usable() {
        let (db, id) = db_with_user("a@b.com");
        let system = system_id(&db);

        let err = db
            .record_transfer(id, i64::MIN, system, "earned", "system")
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));

        db.record_transfer(id, 5, system, "earned", "system").unwrap();
        assert_eq!(db.total_points(id).unwrap(), 5);
    }

    #[test]
    fn failed_second_insert_rolls_back_the_first() {
        let (db, id) = db_with_user("a@b.com");
        let system = system_id(&db);

        // Reject the credit side only; the debit side is written first
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_credit BEFORE INSERT ON points_transactions
                 WHEN NEW.change > 0
                 BEGIN SELECT RAISE(ABORT, 'credit rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let err = db.record_transfer(id, 50, system, "earned", "system").unwrap_err();
        assert!(format!("{:#}", err).contains("credit rejected"));
        assert!(db.points_history(id).unwrap().is_empty());
        assert!(db.points_history(system).unwrap().is_empty());
    }

    #[test]
    fn aggregated_stats_combine_cache_and_ledgers() {
        let (db, id) = db_with_user("a@b.com");
        let system = system_id(&db);
        db.add_xp(&AddXp::system(id, 40)).unwrap();
        db.record_transfer(id, 15, system, "earned", "match").unwrap();
        db.update_user_stats(&UserStatsUpdate {
            user_id: id,
            level: 3,
            xp: 40,
            points: 15,
            wins: 2,
            losses: 1,
        })
        .unwrap();

        let stats = db.aggregated_stats(id).unwrap().unwrap();
        assert_eq!(stats.level, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.total_xp, 40);
        assert_eq!(stats.total_points, 15);

        assert!(db.aggregated_stats(id + 1000).unwrap().is_none());
    }

    #[test]
    fn tank_update_requires_ownership() {
        let (db, owner) = db_with_user("owner@b.com");
        let other = db.register_user("other@b.com", "hash").unwrap();
        let tank_id = db.create_tank(owner, "").unwrap();

        let update = TankUpdate {
            id: tank_id,
            stats: TankStats {
                speed: 350.0,
                range: 550.0,
                turn_speed: 130.0,
                fire_rate: 1.5,
                health: 120.0,
                damage: 12.0,
            },
        };

        assert_eq!(db.update_tank(other, &update).unwrap(), 0);
        assert_eq!(db.get_tanks(owner).unwrap()[0].stats.speed, 300.0);

        assert_eq!(db.update_tank(owner, &update).unwrap(), 1);
        let tanks = db.get_tanks(owner).unwrap();
        assert_eq!(tanks.len(), 1);
        assert_eq!(tanks[0].stats, update.stats);
        assert!(db.get_tanks(other).unwrap().is_empty());
    }

    #[test]
    fn items_by_stat_skips_empty_input() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.items_by_stat(&[]).unwrap().is_empty());

        let items = db
            .items_by_stat(&["health".to_string(), "speed".to_string(), "nope".to_string()])
            .unwrap();
        let stats: Vec<&str> = items.iter().map(|i| i.stat.as_str()).collect();
        assert_eq!(stats, vec!["speed", "health"]);
    }

    #[test]
    fn order_ids_are_allocated_per_order() {
        let (db, id) = db_with_user("a@b.com");
        let items = db.shop_items().unwrap();
        let lines = vec![
            OrderLine {
                item_id: items[0].id,
                quantity: 2,
                cost: items[0].cost,
            },
            OrderLine {
                item_id: items[1].id,
                quantity: 1,
                cost: items[1].cost,
            },
        ];

        let first = db.save_order(id, &lines).unwrap();
        let second = db.save_order(id, &lines[..1]).unwrap();

        assert_ne!(first.order_id, second.order_id);
        assert_eq!(first.lines, 2);
        assert_eq!(first.total_cost, items[0].cost * 2 + items[1].cost);

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM order_items WHERE order_id = ?1",
                    [first.order_id],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn overflowing_order_total_saves_nothing() {
        let (db, id) = db_with_user("a@b.com");
        let huge = vec![OrderLine {
            item_id: 1,
            quantity: i64::MAX,
            cost: 2,
        }];

        let err = db.save_order(id, &huge).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let lines = vec![OrderLine {
            item_id: 1,
            quantity: 2,
            cost: 50,
        }];
        let receipt = db.save_order(id, &lines).unwrap();
        assert_eq!(receipt.total_cost, 100);
    }

    #[test]
    fn bad_line_rolls_back_the_whole_order() {
        let (db, id) = db_with_user("a@b.com");
        let lines = vec![
            OrderLine {
                item_id: 1,
                quantity: 1,
                cost: 50,
            },
            OrderLine {
                item_id: 9999,
                quantity: 1,
                cost: 1,
            },
        ];

        assert!(db.save_order(id, &lines).is_err());

        let orders: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(orders, 0);
    }
}
