//! Record kinds, field metadata and the query algebra shared by every backend.

pub mod api;
pub mod error;
pub mod filter;
pub mod meta;
pub mod record;
pub mod records;
pub mod row;
pub mod schema;
pub mod value;

pub use api::RecordStore;
pub use error::{GlonkError, GlonkResult};
pub use filter::{build_filters, Clause, Filter, FilterKind, FilterSpec};
pub use meta::{KindMeta, Registry};
pub use record::{AnyRecord, Record, RecordKind, RecordVariant};
pub use records::{Note, Post, User};
pub use row::{from_row, sparse_fields, to_row, Row, SparseUpdate};
pub use schema::{
    describe, identity_column, ownership_column, Accessor, FieldDescriptor, FieldMeta, FieldRole,
    Ownership, OwnershipRole,
};
pub use value::{Value, ValueType};
