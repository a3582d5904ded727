//! Key Builder
//!
//! Deterministic cache/dedup keys for `(endpoint, params)` pairs.

use std::collections::BTreeMap;

use serde_json::{json, Value};

/// Request parameters. Sorted by name, so insertion order never matters.
pub type Params = BTreeMap<String, Value>;

/// Serializes `{endpoint, params}` into a single key.
///
/// Parameter names are emitted in lexicographic order, and nested objects
/// are emitted sorted as well, so two parameter sets that differ only in
/// key order collapse to the same key.
pub fn build_key(endpoint: &str, params: &Params) -> String {
    json!({
        "endpoint": endpoint,
        "params": params,
    })
    .to_string()
}

/// [`build_key`] with no parameters.
pub fn endpoint_key(endpoint: &str) -> String {
    build_key(endpoint, &Params::new())
}
