//! SQLite storage: users, item records, and category subscriptions.
//!
//! Four single-table entity sets, no cross-table transactions:
//!   users              - everyone who has pressed /start (broadcast targets)
//!   found_items        - reports submitted via /found
//!   lost_items         - reports submitted via the /lost report flow
//!   user_subscriptions - (user_id, category) pairs; existence = subscribed

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Which item table a record lives in. Claim/unclaim and search need to
/// address the right table, so the kind travels with every item operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Found,
    Lost,
}

impl ItemKind {
    fn table(self) -> &'static str {
        match self {
            ItemKind::Found => "found_items",
            ItemKind::Lost => "lost_items",
        }
    }

    /// Short tag used in callback payloads.
    pub fn tag(self) -> &'static str {
        match self {
            ItemKind::Found => "found",
            ItemKind::Lost => "lost",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ItemKind> {
        match tag {
            "found" => Some(ItemKind::Found),
            "lost" => Some(ItemKind::Lost),
            _ => None,
        }
    }
}

/// A persisted item record, keyed in practice by its feed message id.
///
/// The feed caption is stored alongside the record: the claim banner is
/// stamped over the channel post, so the post itself cannot be trusted to
/// still carry the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: i64,
    pub category: String,
    pub message_id: i64,
    pub caption: String,
    pub date: String,
}

/// Create a new database connection pool and ensure the schema exists.
///
/// Schema creation is idempotent (`CREATE TABLE IF NOT EXISTS`), so calling
/// this against an existing database is safe.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = init_schema(&conn) {
        log::warn!("Failed to initialize schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool. Returned to the pool on drop.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

fn init_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id    INTEGER PRIMARY KEY,
            first_seen DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS found_items (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            category   TEXT     NOT NULL,
            message_id INTEGER  NOT NULL,
            caption    TEXT     NOT NULL DEFAULT '',
            date       DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS lost_items (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            category   TEXT     NOT NULL,
            message_id INTEGER  NOT NULL,
            caption    TEXT     NOT NULL DEFAULT '',
            date       DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS user_subscriptions (
            user_id  INTEGER NOT NULL,
            category TEXT    NOT NULL,
            PRIMARY KEY (user_id, category)
        );",
    )
}

// ── Users ───────────────────────────────────────────────

/// Register a user (no-op if they already exist).
pub fn register_user(conn: &DbConnection, user_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO users (user_id) VALUES (?1)",
        &[&user_id as &dyn rusqlite::ToSql],
    )?;
    Ok(())
}

/// Every registered user ID, for broadcast fan-out.
pub fn get_all_user_ids(conn: &DbConnection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT user_id FROM users")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

// ── Items ───────────────────────────────────────────────

/// Insert a new item record referencing its feed post.
pub fn add_item(
    conn: &DbConnection,
    kind: ItemKind,
    category: &str,
    message_id: i64,
    caption: &str,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (category, message_id, caption) VALUES (?1, ?2, ?3)",
            kind.table()
        ),
        &[
            &category as &dyn rusqlite::ToSql,
            &message_id as &dyn rusqlite::ToSql,
            &caption as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}

/// Every stored item of the given kind, newest first.
pub fn get_all_items(conn: &DbConnection, kind: ItemKind) -> Result<Vec<ItemRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, category, message_id, caption, date FROM {} ORDER BY date DESC, id DESC",
        kind.table()
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(ItemRecord {
            id: row.get(0)?,
            category: row.get(1)?,
            message_id: row.get(2)?,
            caption: row.get(3)?,
            date: row.get(4)?,
        })
    })?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// Feed message ids matching `category` within the last `max_days_back` days,
/// newest first.
pub fn get_items_by_category_and_days(
    conn: &DbConnection,
    kind: ItemKind,
    category: &str,
    max_days_back: i64,
) -> Result<Vec<i64>> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(max_days_back))
        .date_naive()
        .to_string();
    let mut stmt = conn.prepare(&format!(
        "SELECT message_id FROM {} WHERE category = ?1 AND DATE(date) >= DATE(?2) ORDER BY date DESC",
        kind.table()
    ))?;
    let rows = stmt.query_map(
        &[&category as &dyn rusqlite::ToSql, &cutoff as &dyn rusqlite::ToSql],
        |row| row.get(0),
    )?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Feed message ids of items recorded on exactly `date`, newest first.
pub fn get_items_on_date(conn: &DbConnection, kind: ItemKind, date: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT message_id FROM {} WHERE DATE(date) = DATE(?1) ORDER BY date DESC",
        kind.table()
    ))?;
    let rows = stmt.query_map(&[&date as &dyn rusqlite::ToSql], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// The item referencing `message_id`, if any.
pub fn get_item(conn: &DbConnection, kind: ItemKind, message_id: i64) -> Result<Option<ItemRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, category, message_id, caption, date FROM {} WHERE message_id = ?1",
        kind.table()
    ))?;
    let mut rows = stmt.query(&[&message_id as &dyn rusqlite::ToSql])?;

    if let Some(row) = rows.next()? {
        Ok(Some(ItemRecord {
            id: row.get(0)?,
            category: row.get(1)?,
            message_id: row.get(2)?,
            caption: row.get(3)?,
            date: row.get(4)?,
        }))
    } else {
        Ok(None)
    }
}

/// Delete the item referencing `message_id`. Deleting an absent record is a
/// no-op; returns whether a row was actually removed.
pub fn delete_item(conn: &DbConnection, kind: ItemKind, message_id: i64) -> Result<bool> {
    let rows_affected = conn.execute(
        &format!("DELETE FROM {} WHERE message_id = ?1", kind.table()),
        &[&message_id as &dyn rusqlite::ToSql],
    )?;
    Ok(rows_affected > 0)
}

/// Delete every item of the given kind older than `max_age_days`. Returns the
/// number of rows removed.
pub fn delete_items_older_than(conn: &DbConnection, kind: ItemKind, max_age_days: i64) -> Result<usize> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(max_age_days))
        .date_naive()
        .to_string();
    conn.execute(
        &format!("DELETE FROM {} WHERE DATE(date) < DATE(?1)", kind.table()),
        &[&cutoff as &dyn rusqlite::ToSql],
    )
}

// ── Subscriptions ───────────────────────────────────────

/// Subscribe a user to a category (no-op if already subscribed).
pub fn subscribe(conn: &DbConnection, user_id: i64, category: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_subscriptions (user_id, category) VALUES (?1, ?2)",
        &[&user_id as &dyn rusqlite::ToSql, &category as &dyn rusqlite::ToSql],
    )?;
    Ok(())
}

/// Remove a subscription.
pub fn unsubscribe(conn: &DbConnection, user_id: i64, category: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM user_subscriptions WHERE user_id = ?1 AND category = ?2",
        &[&user_id as &dyn rusqlite::ToSql, &category as &dyn rusqlite::ToSql],
    )?;
    Ok(())
}

/// Category slugs the user is subscribed to.
pub fn get_subscriptions(conn: &DbConnection, user_id: i64) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT category FROM user_subscriptions WHERE user_id = ?1")?;
    let rows = stmt.query_map(&[&user_id as &dyn rusqlite::ToSql], |row| row.get(0))?;

    let mut categories = Vec::new();
    for row in rows {
        categories.push(row?);
    }
    Ok(categories)
}

/// User IDs subscribed to a category.
pub fn get_subscribers(conn: &DbConnection, category: &str) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT user_id FROM user_subscriptions WHERE category = ?1")?;
    let rows = stmt.query_map(&[&category as &dyn rusqlite::ToSql], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    #[test]
    fn register_user_is_idempotent() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        register_user(&conn, 42).unwrap();
        register_user(&conn, 42).unwrap();
        register_user(&conn, 7).unwrap();

        let mut ids = get_all_user_ids(&conn).unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![7, 42]);
    }

    #[test]
    fn item_crud_round_trip() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        add_item(&conn, ItemKind::Found, "bags", 100, "Location: Gym").unwrap();
        add_item(&conn, ItemKind::Found, "shoes", 101, "Location: Hall").unwrap();
        add_item(&conn, ItemKind::Lost, "bags", 200, "").unwrap();

        let found = get_all_items(&conn, ItemKind::Found).unwrap();
        assert_eq!(found.len(), 2);
        // Newest first
        assert_eq!(found[0].message_id, 101);

        let item = get_item(&conn, ItemKind::Found, 100).unwrap().unwrap();
        assert_eq!(item.category, "bags");
        assert_eq!(item.caption, "Location: Gym");
        assert_eq!(get_item(&conn, ItemKind::Lost, 100).unwrap(), None);

        assert!(delete_item(&conn, ItemKind::Found, 100).unwrap());
        // Re-deleting an absent record is a no-op
        assert!(!delete_item(&conn, ItemKind::Found, 100).unwrap());
        assert_eq!(get_all_items(&conn, ItemKind::Found).unwrap().len(), 1);
    }

    #[test]
    fn category_and_days_filter() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        add_item(&conn, ItemKind::Found, "bags", 1, "").unwrap();
        add_item(&conn, ItemKind::Found, "shoes", 2, "").unwrap();

        let hits = get_items_by_category_and_days(&conn, ItemKind::Found, "bags", 7).unwrap();
        assert_eq!(hits, vec![1]);

        // A row well outside the window is filtered out
        conn.execute(
            "UPDATE found_items SET date = DATETIME('now', '-30 days') WHERE message_id = 1",
            [],
        )
        .unwrap();
        let hits = get_items_by_category_and_days(&conn, ItemKind::Found, "bags", 7).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn items_on_date_match_exactly() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        add_item(&conn, ItemKind::Found, "bags", 1, "").unwrap();
        add_item(&conn, ItemKind::Found, "bags", 2, "").unwrap();
        conn.execute(
            "UPDATE found_items SET date = DATETIME('now', '-1 day') WHERE message_id = 2",
            [],
        )
        .unwrap();

        let today = chrono::Utc::now().date_naive().to_string();
        assert_eq!(get_items_on_date(&conn, ItemKind::Found, &today).unwrap(), vec![1]);
    }

    #[test]
    fn cleanup_removes_only_old_rows() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        add_item(&conn, ItemKind::Found, "bags", 1, "").unwrap();
        add_item(&conn, ItemKind::Found, "shoes", 2, "").unwrap();
        conn.execute(
            "UPDATE found_items SET date = DATETIME('now', '-90 days') WHERE message_id = 1",
            [],
        )
        .unwrap();

        let removed = delete_items_older_than(&conn, ItemKind::Found, 30).unwrap();
        assert_eq!(removed, 1);
        let remaining = get_all_items(&conn, ItemKind::Found).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message_id, 2);
    }

    #[test]
    fn subscriptions_round_trip() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        subscribe(&conn, 1, "bags").unwrap();
        subscribe(&conn, 1, "bags").unwrap();
        subscribe(&conn, 1, "shoes").unwrap();
        subscribe(&conn, 2, "bags").unwrap();

        let mut subs = get_subscriptions(&conn, 1).unwrap();
        subs.sort();
        assert_eq!(subs, vec!["bags".to_string(), "shoes".to_string()]);

        let mut subscribers = get_subscribers(&conn, "bags").unwrap();
        subscribers.sort_unstable();
        assert_eq!(subscribers, vec![1, 2]);

        unsubscribe(&conn, 1, "bags").unwrap();
        assert_eq!(get_subscribers(&conn, "bags").unwrap(), vec![2]);
    }
}
