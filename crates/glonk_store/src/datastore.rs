use std::path::{Path, PathBuf};
use std::sync::Arc;

use glonk_core::Registry;

use crate::{GlonkConfig, GlonkResult, GlonkStore};

const DEFAULT_DB_NAME: &str = "glonk.sqlite";

pub fn load_or_init_config(base: &Path) -> GlonkResult<GlonkConfig> {
    let default_sqlite = base.join(DEFAULT_DB_NAME);
    GlonkConfig::load_or_init(base, &default_sqlite)
}

pub async fn open_store(base: &Path, registry: Arc<Registry>) -> GlonkResult<GlonkStore> {
    let config = load_or_init_config(base)?;
    GlonkStore::connect(&config, base, registry).await
}

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_DB_NAME)
}
