//! Collection path resolution
//!
//! Locates a Relay connection inside a response's `data` object. Paths are
//! dot-separated; numeric segments index into arrays.

use super::types::{Connection, PageInfo};
use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Resolve a dot path. An empty path resolves to the value itself.
pub fn resolve_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.trim();
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Read the connection at `collection_path`.
///
/// Items come from `edges[].node`. Servers that flatten the connection may
/// send a `nodes` or `items` array instead; both are accepted.
pub fn extract_connection(data: &JsonValue, collection_path: &str) -> Result<Connection> {
    let connection = resolve_path(data, collection_path)
        .filter(|v| v.is_object())
        .ok_or_else(|| Error::shape(collection_path, "path does not resolve to an object"))?;

    let items = if let Some(edges) = connection.get("edges") {
        let edges = edges
            .as_array()
            .ok_or_else(|| Error::shape(format!("{collection_path}.edges"), "not an array"))?;
        edges
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                edge.get("node").cloned().ok_or_else(|| {
                    Error::shape(format!("{collection_path}.edges.{i}"), "edge has no node")
                })
            })
            .collect::<Result<Vec<_>>>()?
    } else if let Some((key, list)) = ["nodes", "items"]
        .into_iter()
        .find_map(|key| connection.get(key).map(|list| (key, list)))
    {
        list.as_array()
            .cloned()
            .ok_or_else(|| Error::shape(format!("{collection_path}.{key}"), "not an array"))?
    } else {
        return Err(Error::shape(
            collection_path,
            "connection has none of 'edges', 'nodes' or 'items'",
        ));
    };

    let page_info = match connection.get("pageInfo") {
        None | Some(JsonValue::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<PageInfo>(raw.clone()).map_err(|e| {
                Error::shape(format!("{collection_path}.pageInfo"), e.to_string())
            })?,
        ),
    };

    Ok(Connection { items, page_info })
}
