//! hal-prefs CLI - inspect and edit scoped bot preferences

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use hal_prefs::config::{self, PrefsConfig};
use hal_prefs::storage::SqliteStore;
use hal_prefs::ui;
use hal_prefs::{Pref, PrefEngine, PrefSet, Resolver, Scope};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hal-prefs")]
#[command(version)]
#[command(about = "Scoped preference store - user/channel/broker/plugin settings")]
#[command(long_about = r#"
hal-prefs stores bot settings scoped by user, channel, broker and plugin,
and resolves the most specific one:
  user -> channel -> broker -> plugin -> global -> default

Example usage:
  hal-prefs set --plugin uptime --key interval --value 60
  hal-prefs get --user tobert --plugin uptime --key interval --default 300 --cascade
  hal-prefs list --plugin uptime
  hal-prefs find --user tobert --plugin uptime
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Scope dimensions shared by every command. Omitted means empty (global).
#[derive(Args, Debug, Clone, Default)]
struct ScopeArgs {
    #[arg(short, long, default_value = "")]
    user: String,

    #[arg(short, long, default_value = "")]
    channel: String,

    /// Defaults to `default_broker` from the config file
    #[arg(short, long)]
    broker: Option<String>,

    #[arg(short, long, default_value = "")]
    plugin: String,
}

impl ScopeArgs {
    fn to_scope(&self, config: Option<&PrefsConfig>) -> Scope {
        let broker = self
            .broker
            .clone()
            .or_else(|| config.and_then(|c| c.default_broker.clone()))
            .unwrap_or_default();
        Scope::new(&self.user, &self.channel, broker, &self.plugin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Store a preference
    Set {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(short, long)]
        key: String,

        #[arg(long)]
        value: String,
    },

    /// Resolve a preference
    Get {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(short, long)]
        key: String,

        /// Value returned when nothing is stored
        #[arg(short, long, default_value = "")]
        default: String,

        /// Walk user -> channel -> broker -> plugin -> global instead of one exact lookup
        #[arg(long)]
        cascade: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List preferences stored for exactly this scope
    List {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Find preferences matching any of the given fields
    Find {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(short, long, default_value = "")]
        key: String,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show statistics about stored preferences
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let loaded = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let starter = PrefsConfig {
                database: Some(config::default_database_path_in(Path::new(".")).display().to_string()),
                default_broker: None,
            };
            config::write_config(&path, &starter, force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Set { scope, key, value } => {
            let (store, _) = open_store(cli.database.as_deref(), loaded.as_ref())?;
            let scope = scope.to_scope(loaded.as_ref());
            let engine = PrefEngine::new(&store);
            let stored = engine.set(&Pref::new(&scope, key).with_value(value))?;

            match stored.error {
                Some(err) => {
                    ui::error(&format!("Failed to store {}: {}", stored.key, err));
                    anyhow::bail!("write failed");
                }
                None => ui::success(&format!("{} = {}", stored.key, stored.value)),
            }
        }

        Commands::Get { scope, key, default, cascade, format } => {
            let (store, _) = open_store(cli.database.as_deref(), loaded.as_ref())?;
            let scope = scope.to_scope(loaded.as_ref());
            let resolver = Resolver::new(&store);

            let (pref, level) = if cascade {
                let res = resolver.cascade(&scope, &key, &default)?;
                (res.pref, res.level.map_or("default", |l| l.as_str()))
            } else {
                let pref = resolver.resolve(&scope, &key, &default)?;
                let level = if pref.found { "exact" } else { "default" };
                (pref, level)
            };

            match format {
                OutputFormat::Json => {
                    let data = serde_json::json!({ "pref": pref, "level": level });
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
                OutputFormat::Text => {
                    if !pref.found {
                        ui::warn(&format!("{} not set, using default", pref.key));
                    }
                    ui::info(&pref.key, &pref.value);
                    ui::summary_row("level:", &ui::level(level, pref.found));
                    ui::summary_row("scope:", &ui::dim(&pref.scope().to_string()));
                }
            }
        }

        Commands::List { scope, format } => {
            let (store, _) = open_store(cli.database.as_deref(), loaded.as_ref())?;
            let scope = scope.to_scope(loaded.as_ref());
            let prefs = PrefEngine::new(&store).get_many(&scope);
            print_prefs(&prefs, format)?;
        }

        Commands::Find { scope, key, format } => {
            let (store, _) = open_store(cli.database.as_deref(), loaded.as_ref())?;
            let scope = scope.to_scope(loaded.as_ref());
            if scope.is_global() && key.is_empty() {
                tracing::info!("No fields given, listing every stored pref");
            }
            let prefs = PrefEngine::new(&store).find(&Pref::new(&scope, key));
            print_prefs(&prefs, format)?;
        }

        Commands::Stats => {
            let (store, database) = open_store(cli.database.as_deref(), loaded.as_ref())?;
            let stats = store.stats()?;

            ui::header(&format!("hal-prefs Statistics ({})", database.display()));
            println!("{}", ui::stats_table(&stats));
        }
    }

    Ok(())
}

/// Open the store at the flag/config/default database path
fn open_store(flag: Option<&Path>, loaded: Option<&PrefsConfig>) -> anyhow::Result<(SqliteStore, PathBuf)> {
    let database = config::resolve_database_path(flag, loaded, Path::new("."));
    config::ensure_db_dir(&database)?;
    let store = SqliteStore::open(&database)?;
    Ok((store, database))
}

fn print_prefs(prefs: &PrefSet, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(prefs)?),
        OutputFormat::Text => {
            if prefs.is_empty() {
                println!("{} {}", ui::Icons::CROSS, ui::muted("No prefs found."));
                return Ok(());
            }
            ui::section(&format!("{} prefs", prefs.len()));
            println!("{}", ui::prefs_table(prefs));

            let failed = prefs.len() - prefs.found().len();
            if failed > 0 {
                ui::warn(&format!("{} rows could not be read and show their default", failed));
            }
        }
    }
    Ok(())
}
