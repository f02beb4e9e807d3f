//! Database schema definitions

/// SQL to create the prefs table.
///
/// The setting name column is `pkey` because `key` is a reserved word in
/// several SQL dialects.
pub const CREATE_PREFS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS prefs (
    user    VARCHAR(32) NOT NULL DEFAULT '',
    channel VARCHAR(32) NOT NULL DEFAULT '',
    broker  VARCHAR(32) NOT NULL DEFAULT '',
    plugin  VARCHAR(32) NOT NULL DEFAULT '',
    pkey    VARCHAR(32) NOT NULL,
    value   TEXT,
    PRIMARY KEY(user, channel, broker, plugin, pkey)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_prefs_channel ON prefs(channel)",
    "CREATE INDEX IF NOT EXISTS idx_prefs_broker ON prefs(broker)",
    "CREATE INDEX IF NOT EXISTS idx_prefs_plugin ON prefs(plugin)",
    "CREATE INDEX IF NOT EXISTS idx_prefs_pkey ON prefs(pkey)",
];

/// Columns selected by every prefs query, in row-decoding order
pub const SELECT_COLUMNS: &str = "user, channel, broker, plugin, pkey, value";

/// Deterministic row order for every prefs query
pub const ORDER_BY: &str = "ORDER BY user, channel, broker, plugin, pkey";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_PREFS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
