//! # Response Envelope Adapter
//!
//! Backend list endpoints wrap their payloads inconsistently. This module
//! is the single place that knows the shapes:
//!
//! | Shape | Example |
//! |-------|---------|
//! | paged, wrapped | `{"code":"SUCCESS","data":{"content":[..],"totalElements":3}}` |
//! | paged, bare | `{"content":[..],"totalElements":3}` |
//! | list, wrapped | `{"data":[..]}` |
//! | list, bare | `[..]` |
//!
//! Anything else unwraps to an explicit empty result with a reason; this
//! adapter never fails and never panics on a malformed body. Callers decide
//! how to surface the reason.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an unwrap produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmptyReason {
    #[error("response body is not a recognised list envelope")]
    UnrecognizedShape,
    #[error("list item {index} could not be decoded: {message}")]
    MalformedItem { index: usize, message: String },
}

/// Result of unwrapping a list response.
#[derive(Debug, Clone, PartialEq)]
pub enum Unwrapped<T> {
    Ok { items: Vec<T>, total: u64 },
    Empty(EmptyReason),
}

impl<T> Unwrapped<T> {
    /// Items and total, empty when the body was not usable.
    pub fn into_parts(self) -> (Vec<T>, u64) {
        match self {
            Self::Ok { items, total } => (items, total),
            Self::Empty(_) => (Vec::new(), 0),
        }
    }

    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            Self::Ok { .. } => None,
            Self::Empty(reason) => Some(reason),
        }
    }
}

/// Extract a list (and its total) from any recognised envelope.
pub fn unwrap_list<T: DeserializeOwned>(body: Value) -> Unwrapped<T> {
    let (items, total) = match body {
        Value::Array(items) => (items, None),
        Value::Object(mut outer) => match outer.remove("data") {
            Some(Value::Array(items)) => (items, None),
            Some(Value::Object(inner)) => match paged(inner) {
                Some(found) => found,
                None => return Unwrapped::Empty(EmptyReason::UnrecognizedShape),
            },
            Some(_) => return Unwrapped::Empty(EmptyReason::UnrecognizedShape),
            None => match paged(outer) {
                Some(found) => found,
                None => return Unwrapped::Empty(EmptyReason::UnrecognizedShape),
            },
        },
        _ => return Unwrapped::Empty(EmptyReason::UnrecognizedShape),
    };

    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                tracing::warn!(index, error = %e, "dropping list response with malformed item");
                return Unwrapped::Empty(EmptyReason::MalformedItem {
                    index,
                    message: e.to_string(),
                });
            }
        }
    }
    let total = total.unwrap_or(decoded.len() as u64);
    Unwrapped::Ok {
        items: decoded,
        total,
    }
}

/// `{content: [..], totalElements | total}`.
fn paged(mut map: Map<String, Value>) -> Option<(Vec<Value>, Option<u64>)> {
    let items = match map.remove("content")? {
        Value::Array(items) => items,
        _ => return None,
    };
    let total = map
        .get("totalElements")
        .or_else(|| map.get("total"))
        .and_then(Value::as_u64);
    Some((items, total))
}

/// Extract a single object, bare or under `data`.
pub fn unwrap_one<T: DeserializeOwned>(body: Value) -> Option<T> {
    let inner = match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data")?,
        other => other,
    };
    serde_json::from_value(inner).ok()
}
