//! Custom Axum extractors.
//!
//! Every state-changing call carries the caller's address in the
//! `x-caller-address` header. Signature checks belong to whatever gateway
//! sits in front of this service; here the header is taken at face value.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::Address;
use crate::error::LootpotError;

/// Header carrying the caller's address.
pub const CALLER_HEADER: &str = "x-caller-address";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub Address);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = LootpotError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| LootpotError::InvalidRequest(format!("missing {CALLER_HEADER} header")))?
            .to_str()
            .map_err(|_| LootpotError::InvalidRequest(format!("{CALLER_HEADER} is not ASCII")))?;
        Address::new(raw).map(Self)
    }
}
