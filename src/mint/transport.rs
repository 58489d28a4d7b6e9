//! Mint transport seam
//!
//! Operations only ever see JSON in and JSON out. The HTTP implementation
//! lives in [`crate::utils::HttpTransport`]; tests plug in an in-process mint.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{CashuError, CashuResult, MintErrorKind};

/// JSON request/response exchange with one mint
///
/// Paths are relative to the mint URL, e.g. `/v1/keysets`. Implementations
/// must not retry.
pub trait MintTransport: Send + Sync {
    fn get(&self, path: &str, timeout: Duration) -> CashuResult<Value>;

    fn post(&self, path: &str, body: &Value, timeout: Duration) -> CashuResult<Value>;
}

impl<T: MintTransport + ?Sized> MintTransport for Box<T> {
    fn get(&self, path: &str, timeout: Duration) -> CashuResult<Value> {
        (**self).get(path, timeout)
    }

    fn post(&self, path: &str, body: &Value, timeout: Duration) -> CashuResult<Value> {
        (**self).post(path, body, timeout)
    }
}

impl<T: MintTransport + ?Sized> MintTransport for std::sync::Arc<T> {
    fn get(&self, path: &str, timeout: Duration) -> CashuResult<Value> {
        (**self).get(path, timeout)
    }

    fn post(&self, path: &str, body: &Value, timeout: Duration) -> CashuResult<Value> {
        (**self).post(path, body, timeout)
    }
}

pub(crate) fn get_json<T, R>(transport: &T, path: &str, timeout: Duration) -> CashuResult<R>
where
    T: MintTransport + ?Sized,
    R: DeserializeOwned,
{
    let value = transport.get(path, timeout)?;
    parse_response(path, value)
}

pub(crate) fn post_json<T, B, R>(transport: &T, path: &str, body: &B, timeout: Duration) -> CashuResult<R>
where
    T: MintTransport + ?Sized,
    B: Serialize,
    R: DeserializeOwned,
{
    let body = serde_json::to_value(body)?;
    let value = transport.post(path, &body, timeout)?;
    parse_response(path, value)
}

fn parse_response<R: DeserializeOwned>(path: &str, value: Value) -> CashuResult<R> {
    if let Some(err) = mint_error_from_body(&value) {
        return Err(err);
    }
    serde_json::from_value(value).map_err(|e| {
        CashuError::new(crate::error::ErrorCode::JsonError, format!("Unexpected response from {}", path))
            .with_details(e.to_string())
    })
}

/// Decode a `{"detail": ..., "code": ...}` error body
///
/// Returns `None` for anything that is not shaped like a mint error.
pub fn mint_error_from_body(body: &Value) -> Option<CashuError> {
    let code = body.get("code")?.as_i64()?;
    let detail = body
        .get("detail")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let kind = MintErrorKind::from_code(code, &detail);
    Some(CashuError::mint(kind, detail).with_details(format!("code {}", code)))
}
