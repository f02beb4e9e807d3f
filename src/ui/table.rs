use crate::pref::PrefSet;
use crate::storage::DbStats;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Render store statistics as a Metric/Count table
pub fn stats_table(stats: &DbStats) -> String {
    let rows = [
        StatRow { metric: "Prefs", count: stats.prefs },
        StatRow { metric: "Users", count: stats.users },
        StatRow { metric: "Channels", count: stats.channels },
        StatRow { metric: "Brokers", count: stats.brokers },
        StatRow { metric: "Plugins", count: stats.plugins },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render a result set as a User/Channel/Broker/Plugin/Key/Value table.
/// Empty sets render as an empty string.
pub fn prefs_table(prefs: &PrefSet) -> String {
    if prefs.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    for row in prefs.table() {
        // empty dimensions are shown as "-" so global scopes stay readable
        builder.push_record(row.into_iter().map(|cell| if cell.is_empty() { "-".to_string() } else { cell }));
    }
    builder.build().with(Style::rounded()).to_string()
}
