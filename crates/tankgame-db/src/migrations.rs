use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                level       INTEGER NOT NULL DEFAULT 1,
                xp          INTEGER NOT NULL DEFAULT 0,
                points      INTEGER NOT NULL DEFAULT 0,
                wins        INTEGER NOT NULL DEFAULT 0,
                losses      INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE roles (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE user_roles (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                role_id     INTEGER NOT NULL REFERENCES roles(id),
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, role_id)
            );

            CREATE TABLE points_transactions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id_src     INTEGER NOT NULL REFERENCES users(id),
                user_id_dest    INTEGER NOT NULL REFERENCES users(id),
                change          INTEGER NOT NULL,
                type            TEXT NOT NULL,
                memo            TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_points_src ON points_transactions(user_id_src);
            CREATE INDEX idx_points_dest ON points_transactions(user_id_dest);

            CREATE TABLE user_xp (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                amount      INTEGER NOT NULL,
                type        TEXT NOT NULL,
                note        TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_user_xp_user ON user_xp(user_id);

            CREATE TABLE tanks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL DEFAULT '',
                speed       REAL NOT NULL DEFAULT 300,
                \"range\"     REAL NOT NULL DEFAULT 500,
                turn_speed  REAL NOT NULL DEFAULT 120,
                fire_rate   REAL NOT NULL DEFAULT 1,
                health      REAL NOT NULL DEFAULT 100,
                damage      REAL NOT NULL DEFAULT 10,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                modified    TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_tanks_user ON tanks(user_id);

            CREATE TABLE items (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                stat        TEXT NOT NULL UNIQUE,
                modifier    REAL NOT NULL DEFAULT 0,
                cost        INTEGER NOT NULL
            );

            -- Seed the system account; its password can never verify
            INSERT INTO users (email, password) VALUES ('localhost', '!');

            INSERT INTO roles (name, description) VALUES ('admin', 'Full access');

            INSERT INTO items (name, description, stat, modifier, cost) VALUES
                ('Engine Upgrade',   'Move faster',              'speed',     25,  50),
                ('Scope',            'Shoot further',            'range',     50,  40),
                ('Treads',           'Turn faster',              'turnSpeed', 15,  30),
                ('Autoloader',       'Fire more often',          'fireRate',  0.2, 75),
                ('Armor Plating',    'Take more hits',           'health',    20,  60),
                ('High-Explosive',   'Hit harder',               'damage',    5,   80);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        // Order ids come from the orders table rather than MAX(order_id) + 1
        info!("Running migration v2 (orders)");
        conn.execute_batch(
            "
            CREATE TABLE orders (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE order_items (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id    INTEGER NOT NULL REFERENCES orders(id),
                item_id     INTEGER NOT NULL REFERENCES items(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                quantity    INTEGER NOT NULL,
                price       INTEGER NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_order_items_order ON order_items(order_id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
