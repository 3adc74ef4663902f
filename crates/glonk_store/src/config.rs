use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use glonk_core::{GlonkError, GlonkResult};

const DEFAULT_CONFIG_NAME: &str = "glonk.json";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlonkConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub server: Option<ServerConfig>,
}

impl GlonkConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            server: Some(ServerConfig {
                listen_addr: Some(DEFAULT_LISTEN_ADDR.to_string()),
            }),
        }
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Postgres { url: url.into() },
            pool: None,
            server: None,
        }
    }

    /// Reads `glonk.json` from `base_dir`, writing a SQLite default first if it
    /// does not exist yet.
    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> GlonkResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| GlonkError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| GlonkError::storage(format!("read config: {err}")))?;
            let config: GlonkConfig =
                serde_json::from_str(&raw).map_err(|err| GlonkError::invalid(err.to_string()))?;
            return Ok(config);
        }
        let default = GlonkConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| GlonkError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| GlonkError::storage(format!("write config: {err}")))?;
        log::info!("wrote default config to {}", config_path.display());
        Ok(default)
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> GlonkResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path.clone().unwrap_or_else(|| "glonk.sqlite".to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(GlonkError::invalid("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } => Some(url.as_str()),
        }
    }

    pub fn listen_addr(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|server| server.listen_addr.as_deref())
            .unwrap_or(DEFAULT_LISTEN_ADDR)
    }

    /// Full driver URL; relative SQLite paths resolve against `base_dir`.
    pub fn database_url(&self, base_dir: &Path) -> GlonkResult<String> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => {
                let path = self.sqlite_path(base_dir)?;
                Ok(format!("sqlite://{}?mode=rwc", path.display()))
            }
            DatabaseConfig::Postgres { url } => Ok(url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_default_config_once() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let default_db = base.join("glonk.sqlite");
        let first = GlonkConfig::load_or_init(base, &default_db).expect("init");
        assert!(base.join(DEFAULT_CONFIG_NAME).exists());
        assert_eq!(first.backend_name(), "sqlite");
        assert_eq!(first.listen_addr(), DEFAULT_LISTEN_ADDR);

        let edited = GlonkConfig::postgres("postgres://localhost/glonk");
        fs::write(
            base.join(DEFAULT_CONFIG_NAME),
            serde_json::to_string(&edited).expect("encode"),
        )
        .expect("write");
        let second = GlonkConfig::load_or_init(base, &default_db).expect("load");
        assert_eq!(second, edited);
        assert_eq!(second.connection_url(), Some("postgres://localhost/glonk"));
    }

    #[test]
    fn relative_sqlite_paths_resolve_against_base() {
        let config = GlonkConfig::default_sqlite("data/app.sqlite");
        let url = config.database_url(Path::new("/srv/glonk")).expect("url");
        assert_eq!(url, "sqlite:///srv/glonk/data/app.sqlite?mode=rwc");
        assert!(GlonkConfig::postgres("postgres://x").sqlite_path(Path::new("/")).is_err());
    }
}
