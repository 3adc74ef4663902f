use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
};
use sea_orm_migration::MigratorTrait;

use glonk_core::{
    AnyRecord, FieldMeta, Filter, GlonkError, GlonkResult, KindMeta, RecordStore, Registry, Row,
    Value, ValueType,
};

use crate::compiler::{CompiledStatement, Dialect, Postgres, SqlCompiler, Sqlite};
use crate::migration::Migrator;
use crate::GlonkConfig;

/// One backend's execution of the compiled CRUD statements.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord>;

    async fn get_by_filters(
        &self,
        meta: &KindMeta,
        filters: &[Filter],
        owner_id: i64,
    ) -> GlonkResult<Vec<AnyRecord>>;

    async fn get_by_external_key(&self, meta: &KindMeta, key: &str) -> GlonkResult<AnyRecord>;

    async fn create(&self, meta: &KindMeta, record: &AnyRecord) -> GlonkResult<AnyRecord>;

    async fn update(&self, meta: &KindMeta, record: &AnyRecord) -> GlonkResult<AnyRecord>;

    async fn delete(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord>;
}

/// Runs the statements of [`SqlCompiler`] over a shared connection pool.
#[derive(Clone, Debug)]
pub struct SqlBackend<D> {
    conn: DatabaseConnection,
    compiler: SqlCompiler<D>,
}

impl<D: Dialect> SqlBackend<D> {
    pub fn new(conn: DatabaseConnection, dialect: D) -> Self {
        Self {
            conn,
            compiler: SqlCompiler::new(dialect),
        }
    }

    async fn fetch(
        &self,
        meta: &KindMeta,
        statement: CompiledStatement,
    ) -> GlonkResult<Vec<AnyRecord>> {
        let backend = self.compiler.dialect().backend();
        let rows = self
            .conn
            .query_all(statement.into_statement(backend))
            .await
            .map_err(|err| {
                log::error!("{} query on {} failed: {err}", self.name(), meta.table());
                GlonkError::from(err)
            })?;
        rows.iter().map(|row| scan_row(meta, row)).collect()
    }

    async fn fetch_one(
        &self,
        meta: &KindMeta,
        statement: CompiledStatement,
        action: &str,
    ) -> GlonkResult<AnyRecord> {
        let records = self.fetch(meta, statement).await?;
        single_row(meta, records, action)
    }
}

/// Zero rows is `NotFound`; more than one breaks the identity invariant.
fn single_row(meta: &KindMeta, mut records: Vec<AnyRecord>, action: &str) -> GlonkResult<AnyRecord> {
    match records.len() {
        0 => Err(GlonkError::not_found(format!("{}: no row to {action}", meta.kind()))),
        1 => Ok(records.remove(0)),
        count => {
            log::error!("{}: {action} matched {count} rows", meta.kind());
            Err(GlonkError::integrity(format!(
                "{}: {action} matched {count} rows",
                meta.kind()
            )))
        }
    }
}

/// An insert must hand back exactly the row it wrote.
fn inserted_row(meta: &KindMeta, mut records: Vec<AnyRecord>) -> GlonkResult<AnyRecord> {
    if records.len() != 1 {
        log::error!("{}: insert returned {} rows", meta.kind(), records.len());
        return Err(GlonkError::integrity(format!(
            "{}: insert returned {} rows",
            meta.kind(),
            records.len()
        )));
    }
    Ok(records.remove(0))
}

#[async_trait]
impl<D: Dialect> Backend for SqlBackend<D> {
    fn name(&self) -> &'static str {
        self.compiler.dialect().name()
    }

    async fn get(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord> {
        let statement = self.compiler.select_by_identity(meta, id, owner_id)?;
        self.fetch_one(meta, statement, "get").await
    }

    async fn get_by_filters(
        &self,
        meta: &KindMeta,
        filters: &[Filter],
        owner_id: i64,
    ) -> GlonkResult<Vec<AnyRecord>> {
        let statement = self.compiler.select_by_filters(meta, filters, owner_id)?;
        self.fetch(meta, statement).await
    }

    async fn get_by_external_key(&self, meta: &KindMeta, key: &str) -> GlonkResult<AnyRecord> {
        let statement = self.compiler.select_by_external_key(meta, key)?;
        self.fetch_one(meta, statement, "get").await
    }

    async fn create(&self, meta: &KindMeta, record: &AnyRecord) -> GlonkResult<AnyRecord> {
        let statement = self.compiler.insert(meta, record)?;
        let records = self.fetch(meta, statement).await?;
        inserted_row(meta, records)
    }

    async fn update(&self, meta: &KindMeta, record: &AnyRecord) -> GlonkResult<AnyRecord> {
        let statement = self.compiler.update(meta, record)?;
        self.fetch_one(meta, statement, "update").await
    }

    async fn delete(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord> {
        let statement = self.compiler.delete(meta, id, owner_id)?;
        self.fetch_one(meta, statement, "delete").await
    }
}

fn scan_row(meta: &KindMeta, row: &QueryResult) -> GlonkResult<AnyRecord> {
    let columns = meta.columns();
    let values: Row = meta
        .fields()
        .iter()
        .map(|field| scan_cell(meta, row, field))
        .collect();
    meta.from_row(&columns, values)
}

/// Reads one cell as its declared type, falling back to the other supported
/// types so a mismatch surfaces as a decode error. Anything else is logged
/// and left empty.
fn scan_cell(meta: &KindMeta, row: &QueryResult, field: &FieldMeta) -> Value {
    let column = field.column;
    let declared = match field.value_type {
        ValueType::Integer => row
            .try_get::<Option<i64>>("", column)
            .map(|value| value.map(Value::Integer)),
        ValueType::Float => row
            .try_get::<Option<f64>>("", column)
            .map(|value| value.map(Value::Float)),
        ValueType::Text => row
            .try_get::<Option<String>>("", column)
            .map(|value| value.map(Value::Text)),
    };
    if let Ok(value) = declared {
        return value.unwrap_or(Value::Null);
    }
    if let Ok(Some(value)) = row.try_get::<Option<i64>>("", column) {
        return Value::Integer(value);
    }
    if let Ok(Some(value)) = row.try_get::<Option<f64>>("", column) {
        return Value::Float(value);
    }
    if let Ok(Some(value)) = row.try_get::<Option<String>>("", column) {
        return Value::Text(value);
    }
    log::warn!(
        "{}: column '{column}' has an unsupported type, leaving it empty",
        meta.kind()
    );
    Value::Null
}

/// The store façade: one pooled connection and the backend chosen for it.
#[derive(Clone)]
pub struct GlonkStore {
    conn: DatabaseConnection,
    registry: Arc<Registry>,
    backend: Arc<dyn Backend>,
}

impl GlonkStore {
    /// Opens the configured database, runs pending migrations and picks the
    /// dialect matching the connection.
    pub async fn connect(
        config: &GlonkConfig,
        base_dir: &Path,
        registry: Arc<Registry>,
    ) -> GlonkResult<Self> {
        let url = config.database_url(base_dir)?;
        let mut options = ConnectOptions::new(url);
        options.sqlx_logging(false);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(GlonkError::from)?;
        Migrator::up(&conn, None).await.map_err(GlonkError::from)?;
        Self::from_connection(conn, registry)
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: DatabaseConnection, registry: Arc<Registry>) -> GlonkResult<Self> {
        let backend: Arc<dyn Backend> = match conn.get_database_backend() {
            DatabaseBackend::Postgres => Arc::new(SqlBackend::new(conn.clone(), Postgres)),
            DatabaseBackend::Sqlite => Arc::new(SqlBackend::new(conn.clone(), Sqlite)),
            other => {
                return Err(GlonkError::schema(format!(
                    "unsupported database backend {other:?}"
                )));
            }
        };
        log::info!("glonk store using {} backend", backend.name());
        Ok(Self {
            conn,
            registry,
            backend,
        })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[async_trait]
impl RecordStore for GlonkStore {
    async fn get(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord> {
        self.backend.get(meta, id, owner_id).await
    }

    async fn get_by_filters(
        &self,
        meta: &KindMeta,
        filters: &[Filter],
        owner_id: i64,
    ) -> GlonkResult<Vec<AnyRecord>> {
        self.backend.get_by_filters(meta, filters, owner_id).await
    }

    async fn get_by_external_key(&self, meta: &KindMeta, key: &str) -> GlonkResult<AnyRecord> {
        self.backend.get_by_external_key(meta, key).await
    }

    async fn create(&self, record: AnyRecord) -> GlonkResult<AnyRecord> {
        let meta = self.registry.meta(record.kind());
        self.backend.create(meta, &record).await
    }

    async fn update(&self, record: AnyRecord) -> GlonkResult<AnyRecord> {
        let meta = self.registry.meta(record.kind());
        self.backend.update(meta, &record).await
    }

    async fn delete(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord> {
        self.backend.delete(meta, id, owner_id).await
    }
}
