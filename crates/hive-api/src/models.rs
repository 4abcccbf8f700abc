// Hive API request/response envelopes
//
// Shapes of the JSON documents exchanged with the `/omnia` endpoints.
// Nodes are always wrapped in a `{ nodes: [...] }` list, including single
// node fetches and mutation responses.

use serde::{Deserialize, Deserializer, Serialize};

use crate::node::Node;

/// Decode `null` the same as a missing key: as `T::default()`.
///
/// Pair with `#[serde(default)]` so the key may also be absent.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `{ nodes: [...] }` -- list shape for node reads and mutations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodesEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
}

impl NodesEnvelope {
    pub fn single(node: Node) -> Self {
        Self { nodes: vec![node] }
    }
}

/// Body of `POST /omnia/auth/sessions`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub sessions: [LoginCredentials<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub caller: &'a str,
}

/// Response of `POST /omnia/auth/sessions`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<SessionInfo>,
}

/// A session object. `session_id` is the token sent back on every request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ext_customer_level: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub latest_supported_api_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,
}

/// Vendor error envelope: `{ errors: [{ code, title }] }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}
