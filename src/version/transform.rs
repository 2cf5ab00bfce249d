//! Response payload transformation between envelope formats.
//!
//! The current format wraps every payload in a `{success, data|error,
//! timestamp}` envelope; the legacy format is the bare payload (or a flat
//! `{error, code}` object on failure). Both directions are idempotent:
//! a payload already in the target shape passes through unchanged, so the
//! transform can sit in middleware without caring what handlers emit.

use serde_json::{json, Value};

use crate::clock;
use crate::version::negotiator::ApiVersion;

/// Whether a value already carries the `{success, ...}` envelope.
fn is_enveloped(payload: &Value) -> bool {
    payload
        .as_object()
        .and_then(|o| o.get("success"))
        .map(Value::is_boolean)
        .unwrap_or(false)
}

/// Transform a payload to the shape a version expects.
pub fn transform(payload: Value, version: &ApiVersion) -> Value {
    transform_at(payload, version, clock::now_ms())
}

pub(crate) fn transform_at(payload: Value, version: &ApiVersion, now_ms: u64) -> Value {
    if version.as_str() == "v1" {
        to_legacy(payload)
    } else {
        to_current(payload, now_ms)
    }
}

/// Legacy shape: unwrap the envelope. Success yields the bare data; failure
/// yields a flat `{error, code}` object. Unenveloped payloads pass through.
fn to_legacy(payload: Value) -> Value {
    if !is_enveloped(&payload) {
        return payload;
    }
    let Value::Object(mut envelope) = payload else {
        return payload;
    };
    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if success {
        envelope.remove("data").unwrap_or(Value::Null)
    } else {
        json!({
            "error": envelope.remove("error").unwrap_or(Value::Null),
            "code": envelope.remove("code").unwrap_or(Value::Null),
        })
    }
}

/// Current shape: ensure the envelope. Already-wrapped payloads pass through
/// unchanged (including their timestamp).
fn to_current(payload: Value, now_ms: u64) -> Value {
    if is_enveloped(&payload) {
        return payload;
    }
    json!({
        "success": true,
        "data": payload,
        "timestamp": now_ms,
    })
}
