// hive-api: Async Rust client for the Hive (v6 "omnia") home-automation API

pub mod error;
pub mod models;
pub mod node;
pub mod nodes;
pub mod session;
pub mod transport;
pub mod value;

pub use error::{Error, ErrorCode};
pub use models::{NodesEnvelope, SessionInfo};
pub use node::{Attribute, NODE_TYPE_ATTRIBUTE, Node, Slot};
pub use nodes::{NODES_PATH, resource_path};
pub use session::{DEFAULT_URL, MEDIA_TYPE, Session};
pub use transport::{TlsMode, TransportConfig};
pub use value::{FromValue, Typed, Value, ValueKind};
