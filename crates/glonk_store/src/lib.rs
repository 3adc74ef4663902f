//! Relational persistence for glonk records: configuration, migrations, the
//! per-dialect statement compiler and the [`GlonkStore`] façade.

pub mod compiler;
pub mod config;
pub mod datastore;
mod db;
pub mod migration;
pub mod store;

pub use glonk_core::*;

pub use compiler::{CompiledStatement, Dialect, Postgres, SqlCompiler, Sqlite, Translator};
pub use config::{DatabaseConfig, GlonkConfig, PoolConfig, ServerConfig};
pub use datastore::{default_sqlite_path, load_or_init_config, open_store};
pub use store::{Backend, GlonkStore, SqlBackend};
