// Node repository
//
// Reads of the flat node collection and of single nodes by reference,
// plus the partial-node PUT used to mutate device state. Every call goes
// through the session's re-authenticating retry path.

use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::NodesEnvelope;
use crate::node::Node;
use crate::session::Session;

/// Path of the node collection.
pub const NODES_PATH: &str = "/omnia/nodes";

/// Reduce a node reference to a request path.
///
/// References are usually absolute hrefs on the production host
/// (`https://api-prod.bgchprod.info/omnia/nodes/{id}`); only their path and
/// query are kept so that requests go to the session's own base URL.
/// Relative references are used as-is.
pub fn resource_path(reference: &str) -> Result<String, Error> {
    match Url::parse(reference) {
        Ok(url) => Ok(match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) if !reference.is_empty() => {
            Ok(reference.to_owned())
        }
        Err(e) => Err(Error::InvalidUrl(e)),
    }
}

/// Exactly one node, or `NodeNotFound`.
fn single_node(envelope: NodesEnvelope) -> Result<Node, Error> {
    <[Node; 1]>::try_from(envelope.nodes)
        .map(|[node]| node)
        .map_err(|nodes| Error::NodeNotFound { count: nodes.len() })
}

impl Session {
    /// Fetch every node visible to the account. An empty list is valid.
    pub async fn list_nodes(&self) -> Result<Vec<Node>, Error> {
        let envelope: NodesEnvelope = self
            .get_json(NODES_PATH)
            .await
            .map_err(|e| e.with_op("nodes"))?;

        debug!(count = envelope.nodes.len(), "listed nodes");
        Ok(envelope.nodes)
    }

    /// Fetch a single node by its reference.
    pub async fn fetch_node(&self, reference: &str) -> Result<Node, Error> {
        let path = resource_path(reference).map_err(|e| e.with_op("node: request"))?;

        let envelope: NodesEnvelope = self
            .get_json(&path)
            .await
            .map_err(|e| e.with_op("node"))?;

        single_node(envelope).map_err(|e| e.with_op("node"))
    }

    /// PUT a partial node to `reference` and return the server's
    /// post-mutation copy of the node.
    pub async fn put_node(&self, reference: &str, partial: Node) -> Result<Node, Error> {
        let path = resource_path(reference).map_err(|e| e.with_op("node: put"))?;

        let envelope: NodesEnvelope = self
            .send_json(Method::PUT, &path, &NodesEnvelope::single(partial))
            .await
            .map_err(|e| e.with_op("node: put"))?;

        single_node(envelope).map_err(|e| e.with_op("node: put"))
    }
}
