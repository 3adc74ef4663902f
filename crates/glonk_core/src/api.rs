use async_trait::async_trait;

use crate::{AnyRecord, Filter, GlonkResult, KindMeta};

/// The store façade the HTTP layer talks to.
///
/// Every operation is a single statement. Ownership values are always bound
/// as parameters; `update` and `delete` only ever touch rows whose scope
/// column matches, so "missing" and "not yours" are the same `NotFound`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord>;

    async fn get_by_filters(
        &self,
        meta: &KindMeta,
        filters: &[Filter],
        owner_id: i64,
    ) -> GlonkResult<Vec<AnyRecord>>;

    /// Login path only: no ownership scoping.
    async fn get_by_external_key(&self, meta: &KindMeta, key: &str) -> GlonkResult<AnyRecord>;

    async fn create(&self, record: AnyRecord) -> GlonkResult<AnyRecord>;

    async fn update(&self, record: AnyRecord) -> GlonkResult<AnyRecord>;

    async fn delete(&self, meta: &KindMeta, id: i64, owner_id: i64) -> GlonkResult<AnyRecord>;
}
