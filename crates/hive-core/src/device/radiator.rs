// ── Radiator view ──
//
// A thermostatic radiator valve. Reports a measured temperature clamped to
// fixed bounds; target control happens through its heating zone.

use std::sync::Arc;

use hive_api::{Error, Node, Session, Slot};

use super::{NodeCell, ReadError, TEMPERATURE, read_clamped};

/// A Hive managed thermostatic radiator valve.
#[derive(Debug)]
pub struct Radiator {
    pub(super) cell: NodeCell,
}

impl Radiator {
    pub const DEFAULT_MINIMUM: f64 = 5.0;
    pub const DEFAULT_MAXIMUM: f64 = 35.0;

    pub(crate) fn new(session: Arc<Session>, node: Node) -> Self {
        Self {
            cell: NodeCell::new(session, node),
        }
    }

    pub fn id(&self) -> &str {
        self.cell.id()
    }

    pub fn name(&self) -> &str {
        self.cell.name()
    }

    pub fn href(&self) -> &str {
        self.cell.href()
    }

    pub fn node(&self) -> Arc<Node> {
        self.cell.snapshot()
    }

    // Valves advertise no bounds of their own.
    #[allow(clippy::unused_self)]
    pub fn minimum(&self) -> f64 {
        Self::DEFAULT_MINIMUM
    }

    #[allow(clippy::unused_self)]
    pub fn maximum(&self) -> f64 {
        Self::DEFAULT_MAXIMUM
    }

    /// Measured temperature, clamped to the fixed bounds.
    pub fn temperature(&self) -> Result<f64, ReadError<f64>> {
        read_clamped(
            &self.cell.snapshot(),
            TEMPERATURE,
            Slot::Reported,
            (self.minimum(), self.maximum()),
            "radiator: temperature",
        )
    }

    /// Re-fetch the node. On failure the cached node is left as it was.
    pub async fn update(&self) -> Result<(), Error> {
        self.cell.refresh("radiator: update").await
    }
}
