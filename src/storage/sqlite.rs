//! SQLite storage implementation
//!
//! Reads never fail outward: a broken query is logged and comes back as an
//! empty row list, and a row that cannot be decoded comes back as a
//! row-level error so the remaining rows still load.

use std::path::Path;
use rusqlite::{Connection, params, params_from_iter};
use crate::Result;
use crate::pref::Pref;
use crate::scope::Scope;
use super::schema;

/// A queryable column of the prefs table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    User,
    Channel,
    Broker,
    Plugin,
    Key,
}

impl Column {
    /// SQL column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::User => "user",
            Column::Channel => "channel",
            Column::Broker => "broker",
            Column::Plugin => "plugin",
            Column::Key => "pkey",
        }
    }
}

/// Equality predicate over prefs columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every clause must hold (AND)
    All(Vec<(Column, String)>),
    /// At least one clause must hold (OR). No clauses matches every row.
    Any(Vec<(Column, String)>),
}

impl Predicate {
    /// Equality on all four scope columns, plus the key when it is non-empty.
    /// Empty scope values are matched literally.
    pub fn exact(scope: &Scope, key: &str) -> Self {
        let mut clauses = vec![
            (Column::User, scope.user.clone()),
            (Column::Channel, scope.channel.clone()),
            (Column::Broker, scope.broker.clone()),
            (Column::Plugin, scope.plugin.clone()),
        ];
        if !key.is_empty() {
            clauses.push((Column::Key, key.to_string()));
        }
        Predicate::All(clauses)
    }

    /// Disjunction of the non-empty fields among scope and key
    pub fn any_of(scope: &Scope, key: &str) -> Self {
        let clauses = [
            (Column::User, scope.user.as_str()),
            (Column::Channel, scope.channel.as_str()),
            (Column::Broker, scope.broker.as_str()),
            (Column::Plugin, scope.plugin.as_str()),
            (Column::Key, key),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(column, value)| (column, value.to_string()))
        .collect();
        Predicate::Any(clauses)
    }

    fn clauses(&self) -> &[(Column, String)] {
        match self {
            Predicate::All(clauses) | Predicate::Any(clauses) => clauses,
        }
    }

    /// WHERE clause (empty when there is nothing to filter on) and its bound values
    pub fn to_sql(&self) -> (String, Vec<&str>) {
        let clauses = self.clauses();
        if clauses.is_empty() {
            return (String::new(), Vec::new());
        }

        let joiner = match self {
            Predicate::All(_) => " AND ",
            Predicate::Any(_) => " OR ",
        };
        let terms: Vec<String> = clauses
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column.as_str(), i + 1))
            .collect();
        let values = clauses.iter().map(|(_, value)| value.as_str()).collect();

        (format!("WHERE {}", terms.join(joiner)), values)
    }
}

/// One decoded row, or the error that prevented decoding it
pub type RowResult = rusqlite::Result<Pref>;

/// SQLite-backed storage for preferences
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::info!("Opened prefs database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Adopt an existing connection. Tables that already exist are left as they are.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the prefs table and indexes if absent. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Reads ==========

    /// Run a predicate query over the prefs table.
    ///
    /// Rows come back ordered by (user, channel, broker, plugin, pkey) and
    /// marked `found`. Backend failures are logged and yield no rows.
    pub fn query(&self, predicate: &Predicate) -> Vec<RowResult> {
        if let Err(e) = self.ensure_schema() {
            tracing::error!("Returning no prefs, schema init failed: {}", e);
            return Vec::new();
        }

        match self.try_query(predicate) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(predicate = ?predicate, "Returning no prefs due to query failure: {}", e);
                Vec::new()
            }
        }
    }

    fn try_query(&self, predicate: &Predicate) -> rusqlite::Result<Vec<RowResult>> {
        let (clause, values) = predicate.to_sql();
        let sql = format!(
            "SELECT {} FROM prefs {} {}",
            schema::SELECT_COLUMNS,
            clause,
            schema::ORDER_BY
        );
        tracing::debug!(sql = %sql, params = values.len(), "Querying prefs");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| self.row_to_pref(row))?
            .collect();

        Ok(rows)
    }

    /// Helper to convert a row to a Pref
    fn row_to_pref(&self, row: &rusqlite::Row) -> rusqlite::Result<Pref> {
        Ok(Pref {
            user: row.get(0)?,
            channel: row.get(1)?,
            broker: row.get(2)?,
            plugin: row.get(3)?,
            key: row.get(4)?,
            value: row.get(5)?,
            found: true,
            ..Default::default()
        })
    }

    // ========== Writes ==========

    /// Insert the record, or overwrite the value of the row with the same
    /// (user, channel, broker, plugin, key)
    pub fn upsert(&self, pref: &Pref) -> Result<()> {
        self.ensure_schema()?;
        self.conn.execute(
            r#"
            INSERT INTO prefs (user, channel, broker, plugin, pkey, value)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user, channel, broker, plugin, pkey) DO UPDATE SET value = excluded.value
            "#,
            params![
                pref.user,
                pref.channel,
                pref.broker,
                pref.plugin,
                pref.key,
                pref.value,
            ],
        )?;
        Ok(())
    }

    // ========== Stats ==========

    /// Count all stored preferences
    pub fn count_prefs(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM prefs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_distinct(&self, column: Column) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(DISTINCT {col}) FROM prefs WHERE {col} != ''",
            col = column.as_str()
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            prefs: self.count_prefs()?,
            users: self.count_distinct(Column::User)?,
            channels: self.count_distinct(Column::Channel)?,
            brokers: self.count_distinct(Column::Broker)?,
            plugins: self.count_distinct(Column::Plugin)?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub prefs: usize,
    pub users: usize,
    pub channels: usize,
    pub brokers: usize,
    pub plugins: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pref(user: &str, plugin: &str, key: &str, value: &str) -> Pref {
        Pref::new(&Scope::global().with_user(user).with_plugin(plugin), key).with_value(value)
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.count_prefs().unwrap(), 0);
    }

    #[test]
    fn test_upsert_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.upsert(&sample_pref("alice", "", "tz", "UTC")).unwrap();
        store.upsert(&sample_pref("alice", "", "tz", "UTC")).unwrap();
        assert_eq!(store.count_prefs().unwrap(), 1);

        store.upsert(&sample_pref("alice", "", "tz", "PST8PDT")).unwrap();
        let rows = store.query(&Predicate::exact(&Scope::global().with_user("alice"), "tz"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().value, "PST8PDT");
    }

    #[test]
    fn test_exact_predicate_matches_empty_literally() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&sample_pref("", "uptime", "interval", "60")).unwrap();
        store.upsert(&sample_pref("pford", "uptime", "interval", "30")).unwrap();

        let rows = store.query(&Predicate::exact(&Scope::global().with_plugin("uptime"), ""));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().value, "60");
    }

    #[test]
    fn test_any_predicate_sql() {
        let scope = Scope::global().with_user("alice").with_plugin("uptime");
        let pred = Predicate::any_of(&scope, "");
        let (clause, values) = pred.to_sql();
        assert_eq!(clause, "WHERE user = ?1 OR plugin = ?2");
        assert_eq!(values, vec!["alice", "uptime"]);

        let global = Scope::global();
        let pred = Predicate::any_of(&global, "");
        let (clause, values) = pred.to_sql();
        assert!(clause.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_exact_predicate_sql() {
        let global = Scope::global();
        let pred = Predicate::exact(&global, "tz");
        let (clause, values) = pred.to_sql();
        assert_eq!(
            clause,
            "WHERE user = ?1 AND channel = ?2 AND broker = ?3 AND plugin = ?4 AND pkey = ?5"
        );
        assert_eq!(values, vec!["", "", "", "", "tz"]);
    }

    #[test]
    fn test_query_orders_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&sample_pref("carol", "", "b", "2")).unwrap();
        store.upsert(&sample_pref("alice", "", "a", "1")).unwrap();

        let users: Vec<String> = store
            .query(&Predicate::Any(Vec::new()))
            .into_iter()
            .map(|r| r.unwrap().user)
            .collect();
        assert_eq!(users, vec!["alice", "carol"]);
    }

    #[test]
    fn test_null_value_is_a_row_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema::CREATE_PREFS_TABLE).unwrap();
        conn.execute(
            "INSERT INTO prefs (user, pkey, value) VALUES ('alice', 'tz', NULL)",
            [],
        )
        .unwrap();
        let store = SqliteStore::from_connection(conn).unwrap();

        let rows = store.query(&Predicate::Any(Vec::new()));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_err());
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&sample_pref("alice", "uptime", "a", "1")).unwrap();
        store.upsert(&sample_pref("alice", "weather", "b", "2")).unwrap();
        store.upsert(&sample_pref("", "weather", "c", "3")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.prefs, 3);
        assert_eq!(stats.users, 1);
        assert_eq!(stats.plugins, 2);
        assert_eq!(stats.channels, 0);
    }
}
