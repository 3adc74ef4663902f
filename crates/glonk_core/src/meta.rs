use std::collections::HashMap;

use serde::Serialize;

use crate::row::{self, Row, SparseUpdate};
use crate::schema::{self, is_identifier};
use crate::{
    AnyRecord, FieldMeta, FieldRole, Filter, FilterSpec, GlonkError, GlonkResult, Ownership,
    Record, RecordKind, Value,
};

/// Type-erased metadata of one record kind, built once at startup.
#[derive(Clone, Debug, Serialize)]
pub struct KindMeta {
    kind: RecordKind,
    table: &'static str,
    fields: Vec<FieldMeta>,
    ownership: Option<Ownership>,
    external_key: Option<&'static str>,
    filters: &'static [FilterSpec],
    #[serde(skip)]
    ops: KindOps,
}

#[derive(Clone, Copy)]
struct KindOps {
    to_row: fn(&KindMeta, &AnyRecord) -> GlonkResult<Row>,
    from_row: fn(&KindMeta, &[&str], Row) -> GlonkResult<AnyRecord>,
    decode: fn(&[u8]) -> GlonkResult<AnyRecord>,
    sparse: fn(&KindMeta, &AnyRecord) -> GlonkResult<SparseUpdate>,
    claim: fn(&KindMeta, &mut AnyRecord, i64) -> GlonkResult<()>,
}

impl std::fmt::Debug for KindOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KindOps")
    }
}

impl KindMeta {
    pub fn describe<R: Record>() -> GlonkResult<Self> {
        let kind = R::KIND.as_str();
        if !is_identifier(R::TABLE) {
            return Err(GlonkError::schema(format!(
                "{kind}: '{}' is not a valid table name",
                R::TABLE
            )));
        }
        let descriptors = R::fields();
        let fields = schema::describe(kind, descriptors)?;
        let ownership = match schema::ownership_column(kind, descriptors) {
            Ok(ownership) => Some(ownership),
            Err(GlonkError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        let external_key = fields
            .iter()
            .find(|field| field.has_role(FieldRole::ExternalKey))
            .map(|field| field.column);
        for spec in R::filters() {
            if !fields.iter().any(|field| field.column == spec.column) {
                return Err(GlonkError::schema(format!(
                    "{kind}: filter '{}' targets unknown column '{}'",
                    spec.name, spec.column
                )));
            }
        }
        Ok(Self {
            kind: R::KIND,
            table: R::TABLE,
            fields,
            ownership,
            external_key,
            filters: R::filters(),
            ops: KindOps {
                to_row: erased_to_row::<R>,
                from_row: erased_from_row::<R>,
                decode: decode_json::<R>,
                sparse: erased_sparse::<R>,
                claim: erased_claim::<R>,
            },
        })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn field(&self, column: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|field| field.column == column)
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.column).collect()
    }

    pub fn identity_column(&self) -> &'static str {
        self.fields[0].column
    }

    pub fn ownership(&self) -> Option<Ownership> {
        self.ownership
    }

    pub fn ownership_column(&self) -> GlonkResult<&'static str> {
        self.ownership
            .map(|ownership| ownership.column)
            .ok_or_else(|| GlonkError::not_found(format!("{}: no ownership field", self.kind)))
    }

    /// Ownership column, or the identity column for kinds that own themselves.
    pub fn scope_column(&self) -> &'static str {
        self.ownership
            .map(|ownership| ownership.column)
            .unwrap_or_else(|| self.identity_column())
    }

    pub fn is_self_owned(&self) -> bool {
        self.scope_column() == self.identity_column()
    }

    pub fn external_key_column(&self) -> GlonkResult<&'static str> {
        self.external_key
            .ok_or_else(|| GlonkError::schema(format!("{}: no external key field", self.kind)))
    }

    pub fn filters(&self) -> &'static [FilterSpec] {
        self.filters
    }

    pub fn parse_filters(&self, raw: &HashMap<String, Vec<String>>) -> Vec<Filter> {
        crate::filter::build_filters(self.filters, raw)
    }

    pub fn to_row(&self, record: &AnyRecord) -> GlonkResult<Row> {
        (self.ops.to_row)(self, record)
    }

    pub fn from_row(&self, columns: &[&str], values: Row) -> GlonkResult<AnyRecord> {
        (self.ops.from_row)(self, columns, values)
    }

    pub fn decode(&self, payload: &[u8]) -> GlonkResult<AnyRecord> {
        (self.ops.decode)(payload)
    }

    pub fn sparse_fields(&self, record: &AnyRecord) -> GlonkResult<SparseUpdate> {
        (self.ops.sparse)(self, record)
    }

    /// Stamps `owner_id` into the scope field of `record`.
    pub fn claim(&self, record: &mut AnyRecord, owner_id: i64) -> GlonkResult<()> {
        (self.ops.claim)(self, record, owner_id)
    }

    pub fn identity_of(&self, record: &AnyRecord) -> GlonkResult<i64> {
        self.integer_at(record, self.identity_column())
    }

    pub fn owner_of(&self, record: &AnyRecord) -> GlonkResult<i64> {
        self.integer_at(record, self.scope_column())
    }

    fn integer_at(&self, record: &AnyRecord, column: &str) -> GlonkResult<i64> {
        let index = self
            .fields
            .iter()
            .position(|field| field.column == column)
            .ok_or_else(|| GlonkError::schema(format!("{}: unknown column '{column}'", self.kind)))?;
        match self.to_row(record)?.swap_remove(index) {
            Value::Integer(value) => Ok(value),
            other => Err(GlonkError::schema(format!(
                "{}: column '{column}' holds {other:?}",
                self.kind
            ))),
        }
    }
}

fn peel<'a, R: Record>(meta: &KindMeta, record: &'a AnyRecord) -> GlonkResult<&'a R> {
    R::peel(record).ok_or_else(|| {
        GlonkError::invalid(format!("expected {} record, got {}", meta.kind, record.kind()))
    })
}

fn erased_to_row<R: Record>(meta: &KindMeta, record: &AnyRecord) -> GlonkResult<Row> {
    Ok(row::to_row(meta, peel::<R>(meta, record)?))
}

fn erased_from_row<R: Record>(meta: &KindMeta, columns: &[&str], values: Row) -> GlonkResult<AnyRecord> {
    Ok(row::from_row::<R>(meta, columns, values)?.into())
}

fn erased_sparse<R: Record>(meta: &KindMeta, record: &AnyRecord) -> GlonkResult<SparseUpdate> {
    Ok(row::sparse_fields(meta, peel::<R>(meta, record)?))
}

fn erased_claim<R: Record>(meta: &KindMeta, record: &mut AnyRecord, owner_id: i64) -> GlonkResult<()> {
    let kind = record.kind();
    let target = R::peel_mut(record).ok_or_else(|| {
        GlonkError::invalid(format!("expected {} record, got {kind}", meta.kind))
    })?;
    let field = meta
        .field(meta.scope_column())
        .ok_or_else(|| GlonkError::schema(format!("{}: scope column missing", meta.kind)))?;
    R::fields()[field.source].write(target, Value::Integer(owner_id))
}

fn decode_json<R: Record>(payload: &[u8]) -> GlonkResult<AnyRecord> {
    let record: R = serde_json::from_slice(payload)?;
    Ok(record.into())
}

/// Catalog of every record kind's metadata.
#[derive(Clone, Debug)]
pub struct Registry {
    kinds: Vec<KindMeta>,
}

impl Registry {
    /// Describes every kind. Any schema problem is fatal here, at startup.
    pub fn new() -> GlonkResult<Self> {
        let kinds = RecordKind::ALL
            .iter()
            .map(|kind| kind.describe())
            .collect::<GlonkResult<Vec<_>>>()?;
        Ok(Self { kinds })
    }

    pub fn meta(&self, kind: RecordKind) -> &KindMeta {
        let index = RecordKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or_default();
        &self.kinds[index]
    }

    pub fn lookup(&self, name: &str) -> GlonkResult<&KindMeta> {
        let kind: RecordKind = name.parse()?;
        Ok(self.meta(kind))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindMeta> {
        self.kinds.iter()
    }
}
