//! Caller identity.
//!
//! Sessions are validated upstream; by the time a request reaches these
//! routes the authorization layer has set the `OwnerId` header. The login
//! flow resolves an external account to a local user with [`federate_user`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Deserialize;

use glonk_core::{
    GlonkError, GlonkResult, Record, RecordKind, RecordStore, RecordVariant, Registry, User,
};

use crate::error::ApiError;

pub const OWNER_HEADER: &str = "OwnerId";

/// Identity of the authenticated caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OwnerId(pub i64);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(OWNER_HEADER) else {
            tracing::debug!("no {OWNER_HEADER} header on {}", parts.uri.path());
            return Err(ApiError::unauthorized());
        };
        raw.to_str()
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(OwnerId)
            .ok_or_else(|| {
                tracing::warn!("malformed {OWNER_HEADER} header on {}", parts.uri.path());
                ApiError::unauthorized()
            })
    }
}

/// Profile returned by the identity provider.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub picture: String,
}

/// External key under which a provider account is stored, e.g. `google/1234`.
pub fn external_key(provider: &str, subject: &str) -> String {
    format!("{provider}/{subject}")
}

/// Returns the local user for `external_key`, creating it from `profile` on
/// first login.
pub async fn federate_user(
    store: &dyn RecordStore,
    registry: &Registry,
    external_key: &str,
    profile: Profile,
) -> GlonkResult<User> {
    let meta = registry.meta(RecordKind::User);
    let record = match store.get_by_external_key(meta, external_key).await {
        Ok(record) => record,
        Err(GlonkError::NotFound { .. }) => {
            let user = User {
                guid: external_key.to_string(),
                name: profile.name,
                email: profile.email,
                picture: profile.picture,
                ..User::default()
            };
            if !user.validate() {
                return Err(GlonkError::invalid(format!(
                    "cannot create user '{external_key}' from an incomplete profile"
                )));
            }
            tracing::info!("creating user for {external_key}");
            store.create(user.into()).await?
        }
        Err(err) => return Err(err),
    };
    User::from_any(record).ok_or_else(|| GlonkError::decode("external key lookup returned a non-user"))
}
