//! Statement compilation for the relational backends.
//!
//! Every statement is first assembled from [`Clause`]s carrying `@name`
//! placeholders. The [`Translator`] then rewrites each placeholder occurrence,
//! left to right, into the dialect's native marker and appends the bound value
//! to the positional argument list. Identifiers in the statement text only ever
//! come from validated kind metadata; caller input is always bound.

use std::collections::{HashMap, HashSet};
use std::fmt;

use sea_orm::{DatabaseBackend, Statement};

use glonk_core::{AnyRecord, Clause, Filter, GlonkError, GlonkResult, KindMeta, Value};

/// Native parameter syntax of one backend.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn backend(&self) -> DatabaseBackend;

    /// Marker for the 1-based parameter `position`.
    fn marker(&self, position: usize) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    fn marker(&self, position: usize) -> String {
        format!("${position}")
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    fn marker(&self, _position: usize) -> String {
        "?".to_string()
    }
}

/// Final statement text with its positional arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl CompiledStatement {
    pub fn into_statement(self, backend: DatabaseBackend) -> Statement {
        Statement::from_sql_and_values(
            backend,
            self.sql,
            self.values.into_iter().map(sea_orm::Value::from),
        )
    }
}

/// Rewrites `@name` placeholders into native markers across one statement.
pub struct Translator<'d> {
    dialect: &'d dyn Dialect,
    values: Vec<Value>,
}

impl<'d> Translator<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    /// Translates `clause`, continuing the marker numbering of earlier clauses.
    ///
    /// An occurrence without a bound value, or a bound value that never occurs,
    /// means the statement was assembled wrongly and is a schema error.
    pub fn push(&mut self, clause: &Clause) -> GlonkResult<String> {
        let mut sql = String::with_capacity(clause.sql.len());
        let mut used = HashSet::new();
        let mut rest = clause.sql.as_str();
        while let Some(at) = rest.find('@') {
            sql.push_str(&rest[..at]);
            let tail = &rest[at + 1..];
            let len = tail
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(tail.len());
            if len == 0 {
                return Err(GlonkError::schema(format!(
                    "dangling '@' in clause '{}'",
                    clause.sql
                )));
            }
            let name = &tail[..len];
            let value = clause.args.get(name).ok_or_else(|| {
                GlonkError::schema(format!("placeholder @{name} has no bound value"))
            })?;
            self.values.push(value.clone());
            sql.push_str(&self.dialect.marker(self.values.len()));
            used.insert(name);
            rest = &tail[len..];
        }
        sql.push_str(rest);
        if let Some(unused) = clause.args.keys().find(|name| !used.contains(name.as_str())) {
            return Err(GlonkError::schema(format!(
                "argument '{unused}' is bound but never referenced"
            )));
        }
        Ok(sql)
    }

    pub fn finish(self, sql: String) -> CompiledStatement {
        log::debug!("{} statement: {sql} ({} args)", self.dialect.name(), self.values.len());
        CompiledStatement {
            sql,
            values: self.values,
        }
    }
}

fn clause<'a>(sql: String, args: impl IntoIterator<Item = (&'a str, Value)>) -> Clause {
    Clause {
        sql,
        args: args
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect::<HashMap<_, _>>(),
    }
}

/// Compiles the CRUD statements of every kind for one dialect.
#[derive(Clone, Debug, Default)]
pub struct SqlCompiler<D> {
    dialect: D,
}

impl<D: Dialect> SqlCompiler<D> {
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// `SELECT … WHERE identity = ? [AND ownership = ?]`.
    pub fn select_by_identity(
        &self,
        meta: &KindMeta,
        id: i64,
        owner_id: i64,
    ) -> GlonkResult<CompiledStatement> {
        let mut translator = Translator::new(&self.dialect);
        let mut condition = clause(
            format!("{} = @identity", meta.identity_column()),
            [("identity", Value::Integer(id))],
        );
        if let Some(ownership) = meta.ownership() {
            condition
                .sql
                .push_str(&format!(" AND {} = @owner", ownership.column));
            condition
                .args
                .insert("owner".to_string(), Value::Integer(owner_id));
        }
        let condition = translator.push(&condition)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {condition}",
            column_list(meta),
            meta.table()
        );
        Ok(translator.finish(sql))
    }

    /// Lookup by external key. Not scoped to an owner.
    pub fn select_by_external_key(
        &self,
        meta: &KindMeta,
        key: &str,
    ) -> GlonkResult<CompiledStatement> {
        let column = meta.external_key_column()?;
        let mut translator = Translator::new(&self.dialect);
        let condition = translator.push(&clause(
            format!("{column} = @externalKey"),
            [("externalKey", Value::from(key))],
        ))?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {condition}",
            column_list(meta),
            meta.table()
        );
        Ok(translator.finish(sql))
    }

    /// Conjunction of every filter, each parenthesised, with the scope clause last.
    pub fn select_by_filters(
        &self,
        meta: &KindMeta,
        filters: &[Filter],
        owner_id: i64,
    ) -> GlonkResult<CompiledStatement> {
        let mut translator = Translator::new(&self.dialect);
        let mut conditions = Vec::with_capacity(filters.len() + 1);
        for filter in filters {
            let rendered = filter.render();
            if rendered.sql.is_empty() {
                continue;
            }
            conditions.push(format!("({})", translator.push(&rendered)?));
        }
        conditions.push(translator.push(&clause(
            format!("{} = @scope", meta.scope_column()),
            [("scope", Value::Integer(owner_id))],
        ))?);
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            column_list(meta),
            meta.table(),
            conditions.join(" AND ")
        );
        Ok(translator.finish(sql))
    }

    /// Binds every column but the identity and returns the stored row.
    pub fn insert(&self, meta: &KindMeta, record: &AnyRecord) -> GlonkResult<CompiledStatement> {
        let row = meta.to_row(record)?;
        let identity = meta.identity_column();
        let mut columns = Vec::with_capacity(row.len());
        let mut names = Vec::with_capacity(row.len());
        let mut args = HashMap::with_capacity(row.len());
        for (column, value) in meta.columns().into_iter().zip(row) {
            if column == identity {
                continue;
            }
            columns.push(column);
            names.push(format!("@{column}"));
            args.insert(column.to_string(), value);
        }
        if columns.is_empty() {
            return Err(GlonkError::invalid(format!(
                "{}: nothing to insert",
                meta.kind()
            )));
        }
        let mut translator = Translator::new(&self.dialect);
        let values = translator.push(&Clause {
            sql: names.join(", "),
            args,
        })?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({values}) RETURNING {}",
            meta.table(),
            columns.join(", "),
            column_list(meta)
        );
        Ok(translator.finish(sql))
    }

    /// Sparse update scoped to the record's identity and owner.
    ///
    /// Only non-empty fields are written. Identity and ownership never appear
    /// in the SET list.
    pub fn update(&self, meta: &KindMeta, record: &AnyRecord) -> GlonkResult<CompiledStatement> {
        let id = meta.identity_of(record)?;
        let owner_id = meta.owner_of(record)?;
        let sparse = meta
            .sparse_fields(record)?
            .without(&[meta.identity_column(), meta.scope_column()]);
        if sparse.is_empty() {
            return Err(GlonkError::invalid(format!(
                "{}: update carries no fields to change",
                meta.kind()
            )));
        }
        let mut translator = Translator::new(&self.dialect);
        let mut assignments = Vec::with_capacity(sparse.len());
        let mut args = HashMap::with_capacity(sparse.len());
        for (column, value) in sparse.iter() {
            assignments.push(format!("{column} = @set_{column}"));
            args.insert(format!("set_{column}"), value.clone());
        }
        let set = translator.push(&Clause {
            sql: assignments.join(", "),
            args,
        })?;
        let condition = translator.push(&scope_clause(meta, id, owner_id))?;
        let sql = format!(
            "UPDATE {} SET {set} WHERE {condition} RETURNING {}",
            meta.table(),
            column_list(meta)
        );
        Ok(translator.finish(sql))
    }

    pub fn delete(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<CompiledStatement> {
        let mut translator = Translator::new(&self.dialect);
        let condition = translator.push(&scope_clause(meta, id, owner_id))?;
        let sql = format!(
            "DELETE FROM {} WHERE {condition} RETURNING {}",
            meta.table(),
            column_list(meta)
        );
        Ok(translator.finish(sql))
    }
}

fn column_list(meta: &KindMeta) -> String {
    meta.columns().join(", ")
}

fn scope_clause(meta: &KindMeta, id: i64, owner_id: i64) -> Clause {
    clause(
        format!(
            "{} = @identity AND {} = @scope",
            meta.identity_column(),
            meta.scope_column()
        ),
        [
            ("identity", Value::Integer(id)),
            ("scope", Value::Integer(owner_id)),
        ],
    )
}
