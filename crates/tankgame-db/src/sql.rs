use anyhow::{Context, Result, anyhow};
use std::borrow::Cow;
use std::path::PathBuf;

macro_rules! builtin {
    ($($name:literal),+ $(,)?) => {
        &[$(($name, include_str!(concat!("../sql/queries/", $name, ".sql")))),+]
    };
}

/// Every statement the data layer runs, keyed by file stem.
const BUILTIN: &[(&str, &str)] = builtin![
    "login",
    "get_system_user",
    "get_roles",
    "grant_role",
    "register",
    "get_total_xp",
    "add_xp",
    "change_points",
    "get_total_points",
    "get_points_history",
    "get_aggregated_stats",
    "update_user_stats",
    "create_tank",
    "get_tanks",
    "update_tank",
    "get_shop_items",
    "get_item_info",
    "create_order",
    "insert_order_item",
];

enum QuerySource {
    Embedded,
    Directory(PathBuf),
}

/// Resolves SQL statements by name.
///
/// A directory-backed store re-reads `<dir>/<name>.sql` on every call, so
/// statements can be edited without a rebuild.
pub struct QueryStore {
    source: QuerySource,
}

impl QueryStore {
    pub fn embedded() -> Self {
        Self {
            source: QuerySource::Embedded,
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: QuerySource::Directory(dir.into()),
        }
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(name, _)| *name)
    }

    pub fn load(&self, name: &str) -> Result<Cow<'static, str>> {
        match &self.source {
            QuerySource::Embedded => BUILTIN
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, sql)| Cow::Borrowed(*sql))
                .ok_or_else(|| anyhow!("Unknown query: {}", name)),
            QuerySource::Directory(dir) => {
                let path = dir.join(format!("{}.sql", name));
                let sql = std::fs::read_to_string(&path).with_context(|| {
                    format!("Failed to load query {} from {}", name, path.display())
                })?;
                Ok(Cow::Owned(sql))
            }
        }
    }

    /// Loads every known statement; fails on the first one missing.
    pub fn verify(&self) -> Result<usize> {
        let mut count = 0;
        for name in Self::names() {
            self.load(name)?;
            count += 1;
        }
        Ok(count)
    }
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Expands the `{stats}` token of an `IN (...)` query into `?1, ?2, ...`.
pub fn expand_in_list(sql: &str, token: &str, count: usize) -> String {
    let placeholders: Vec<String> = (1..=count).map(|i| format!("?{}", i)).collect();
    sql.replace(&format!("{{{}}}", token), &placeholders.join(", "))
}
