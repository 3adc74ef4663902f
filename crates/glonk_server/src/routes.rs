//! Route table.
//!
//! ```text
//! GET    /meta/{kind}   kind description, no store access
//! GET    /{kind}?f=a|b  filtered list, scoped to the caller
//! POST   /{kind}        create, owner stamped from the caller
//! PUT    /{kind}        sparse update, scoped to the caller
//! GET    /{kind}/{id}   fetch one, scoped to the caller
//! DELETE /{kind}/{id}   delete one, returns the removed record
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::{
    create_record, delete_record, describe_kind, get_record, list_records, update_record,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/meta/{kind}", get(describe_kind))
        .route(
            "/{kind}",
            get(list_records).post(create_record).put(update_record),
        )
        .route("/{kind}/{id}", get(get_record).delete(delete_record))
        .with_state(state)
}
