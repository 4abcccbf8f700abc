// hive-core: Typed device views over the Hive node graph.
//
// `Home` lists nodes through a `hive_api::Session` and classifies them into
// thermostats, wall controllers and radiator valves. Each view wraps its
// node behind an atomic pointer so a background `Poller` can refresh it
// while consumers keep reading.

pub mod config;
pub mod device;
pub mod home;
pub mod poller;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_POLL_INTERVAL, HomeConfig};
pub use device::{
    ActiveMode, Controller, Device, DeviceKind, Radiator, ReadError, Thermostat, classify,
};
pub use home::Home;
pub use poller::{PollSummary, Poller, poll_once};

// The API error type is shared across the workspace.
pub use hive_api::{DEFAULT_URL, Error, ErrorCode, Node, Session, TlsMode};
