use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PrefsConfig {
    /// Path to the SQLite database
    pub database: Option<String>,
    /// Broker dimension used by CLI commands that don't pass `--broker`
    pub default_broker: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("hal-prefs.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".hal").join("prefs.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<PrefsConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PrefsConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PrefsConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Database path: explicit flag, then config, then `.hal/prefs.db` under `base`
pub fn resolve_database_path(
    flag: Option<&Path>,
    config: Option<&PrefsConfig>,
    base: &Path,
) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    config
        .and_then(|c| c.database.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_database_path_in(base))
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(dir.path().join("nope.toml").as_path())).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hal-prefs.toml");
        let config = PrefsConfig {
            database: Some("prefs.db".to_string()),
            default_broker: Some("slack".to_string()),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        assert_eq!(load_config(Some(path.as_path())).unwrap(), Some(config));
    }

    #[test]
    fn test_database_path_precedence() {
        let base = Path::new("/srv/bot");
        let config = PrefsConfig {
            database: Some("/var/lib/prefs.db".to_string()),
            default_broker: None,
        };

        assert_eq!(
            resolve_database_path(Some(Path::new("x.db")), Some(&config), base),
            PathBuf::from("x.db")
        );
        assert_eq!(
            resolve_database_path(None, Some(&config), base),
            PathBuf::from("/var/lib/prefs.db")
        );
        assert_eq!(
            resolve_database_path(None, None, base),
            PathBuf::from("/srv/bot/.hal/prefs.db")
        );
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("prefs.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
