//! HTTP surface of glonk: a thin axum layer over the [`RecordStore`] façade.
//!
//! [`RecordStore`]: glonk_core::RecordStore

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{external_key, federate_user, OwnerId, Profile, OWNER_HEADER};
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
