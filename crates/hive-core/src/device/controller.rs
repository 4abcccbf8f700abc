// ── Controller view ──
//
// The battery-powered wall unit ("thermostat UI") paired with a heating
// zone. Only its battery level is of interest.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hive_api::{Error, Node, Session};
use tracing::warn;

use super::{NodeCell, ReadError};

const BATTERY_LEVEL: &str = "batteryLevel";

/// A Hive thermostat UI control unit.
#[derive(Debug)]
pub struct Controller {
    pub(super) cell: NodeCell,
    last_battery_level: Mutex<u8>,
}

impl Controller {
    pub(crate) fn new(session: Arc<Session>, node: Node) -> Self {
        let cell = NodeCell::new(session, node);
        let level = read_battery_level(&cell.snapshot()).unwrap_or_else(ReadError::into_fallback);

        Self {
            cell,
            last_battery_level: Mutex::new(level),
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

    /// Battery charge as a percentage in `0..=100`.
    pub fn battery_level(&self) -> Result<u8, ReadError<u8>> {
        read_battery_level(&self.cell.snapshot())
    }

    /// Battery charge, or the last level read successfully.
    pub fn battery_level_or_last_known(&self) -> u8 {
        match self.battery_level() {
            Ok(level) => {
                *self.last_battery_level() = level;
                level
            }
            Err(e) => {
                warn!(controller = %self.id(), error = %e, "failed to read battery level");
                *self.last_battery_level()
            }
        }
    }

    /// Re-fetch the node. On failure the cached node is left as it was.
    pub async fn update(&self) -> Result<(), Error> {
        self.cell.refresh("controller: update").await?;
        if let Ok(level) = self.battery_level() {
            *self.last_battery_level() = level;
        }
        Ok(())
    }

    fn last_battery_level(&self) -> MutexGuard<'_, u8> {
        self.last_battery_level
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_battery_level(node: &Node) -> Result<u8, ReadError<u8>> {
    node.attr(BATTERY_LEVEL)
        .reported_as::<f64>()
        .require(BATTERY_LEVEL)
        .map(percentage)
        .map_err(|source| ReadError {
            fallback: 0,
            source: source.with_op("controller: battery level"),
        })
}

/// Truncate to a whole percentage within `0..=100`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn percentage(level: f64) -> u8 {
    level.trunc().clamp(0.0, 100.0) as u8
}
