// ── Thermostat view ──
//
// A heating zone: current temperature, target temperature and the active
// heat/cool mode, with bounds advertised by the node itself.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hive_api::{Error, Node, Session, Slot};
use serde::Serialize;
use strum::Display;
use tracing::{debug, warn};

use super::{NodeCell, ReadError, TARGET_HEAT_TEMPERATURE, TEMPERATURE, read_clamped};

const ACTIVE_MODE: &str = "activeHeatCoolMode";
const MIN_HEAT_TEMPERATURE: &str = "minHeatTemperature";
const MAX_HEAT_TEMPERATURE: &str = "maxHeatTemperature";

/// The heating/cooling mode a thermostat is currently in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActiveMode {
    #[default]
    Off,
    Heating,
    Cooling,
}

impl ActiveMode {
    fn from_reported(mode: &str) -> Self {
        match mode {
            "HEAT" => Self::Heating,
            "COOL" => Self::Cooling,
            _ => Self::Off,
        }
    }
}

/// Last successfully read values, served when a fresh read fails.
#[derive(Debug, Clone, Copy)]
struct LastKnown {
    temperature: f64,
    target: f64,
}

/// A Hive managed thermostat.
#[derive(Debug)]
pub struct Thermostat {
    pub(super) cell: NodeCell,
    last_known: Mutex<LastKnown>,
}

impl Thermostat {
    /// Minimum heating temperature when the node does not advertise one.
    pub const DEFAULT_MINIMUM: f64 = 5.0;
    /// Maximum heating temperature when the node does not advertise one.
    pub const DEFAULT_MAXIMUM: f64 = 35.0;

    pub(crate) fn new(session: Arc<Session>, node: Node) -> Self {
        let cell = NodeCell::new(session, node);
        let snapshot = cell.snapshot();
        let last_known = LastKnown {
            temperature: read_temperature(&snapshot).unwrap_or_else(ReadError::into_fallback),
            target: read_target(&snapshot).unwrap_or_else(ReadError::into_fallback),
        };

        Self {
            cell,
            last_known: Mutex::new(last_known),
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

    /// Snapshot of the wrapped node.
    pub fn node(&self) -> Arc<Node> {
        self.cell.snapshot()
    }

    // ── Readings ─────────────────────────────────────────────────────

    /// Lowest settable temperature; advisory, never fails.
    pub fn minimum(&self) -> f64 {
        minimum(&self.cell.snapshot())
    }

    /// Highest settable temperature; advisory, never fails.
    pub fn maximum(&self) -> f64 {
        maximum(&self.cell.snapshot())
    }

    /// Measured temperature, clamped to the advertised bounds.
    pub fn temperature(&self) -> Result<f64, ReadError<f64>> {
        read_temperature(&self.cell.snapshot())
    }

    /// Requested temperature, clamped to the advertised bounds.
    pub fn target(&self) -> Result<f64, ReadError<f64>> {
        read_target(&self.cell.snapshot())
    }

    /// Current heat/cool mode. Only a non-string mode is an error.
    pub fn active_mode(&self) -> Result<ActiveMode, ReadError<ActiveMode>> {
        let mode = self.cell.snapshot().attr(ACTIVE_MODE).reported_as::<String>();
        if mode.is_absent() {
            return Ok(ActiveMode::Off);
        }

        mode.require(ACTIVE_MODE)
            .map(|m| ActiveMode::from_reported(&m))
            .map_err(|source| ReadError {
                fallback: ActiveMode::Off,
                source: source.with_op("thermostat: active mode"),
            })
    }

    /// Measured temperature, or the last one read successfully.
    pub fn temperature_or_last_known(&self) -> f64 {
        match self.temperature() {
            Ok(temperature) => {
                self.last_known().temperature = temperature;
                temperature
            }
            Err(e) => {
                warn!(thermostat = %self.id(), error = %e, "failed to read temperature");
                self.last_known().temperature
            }
        }
    }

    /// Requested temperature, or the last one read successfully.
    pub fn target_or_last_known(&self) -> f64 {
        match self.target() {
            Ok(target) => {
                self.last_known().target = target;
                target
            }
            Err(e) => {
                warn!(thermostat = %self.id(), error = %e, "failed to read target temperature");
                self.last_known().target
            }
        }
    }

    // ── Network ──────────────────────────────────────────────────────

    /// Re-fetch the node. On failure the cached node is left as it was.
    pub async fn update(&self) -> Result<(), Error> {
        self.cell.refresh("thermostat: update").await?;
        self.remember();
        Ok(())
    }

    /// Request a new target temperature and adopt the server's copy of
    /// the node, which is authoritative for what [`target`](Self::target)
    /// reports afterwards.
    pub async fn set_target(&self, temperature: f64) -> Result<(), Error> {
        if !temperature.is_finite() {
            return Err(Error::InvalidDataType {
                attribute: TARGET_HEAT_TEMPERATURE.to_owned(),
                expected: "finite number",
                found: temperature.to_string(),
            }
            .with_op("thermostat: set target"));
        }

        debug!(thermostat = %self.id(), temperature, "setting target temperature");
        self.cell
            .push_target(TARGET_HEAT_TEMPERATURE, temperature, "thermostat: set target")
            .await?;
        self.remember();
        Ok(())
    }

    fn last_known(&self) -> MutexGuard<'_, LastKnown> {
        self.last_known.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record whatever the current node reads cleanly.
    fn remember(&self) {
        let node = self.cell.snapshot();
        let mut last_known = self.last_known();
        if let Ok(temperature) = read_temperature(&node) {
            last_known.temperature = temperature;
        }
        if let Ok(target) = read_target(&node) {
            last_known.target = target;
        }
    }
}

fn minimum(node: &Node) -> f64 {
    node.attr(MIN_HEAT_TEMPERATURE)
        .reported_as::<f64>()
        .ok()
        .unwrap_or(Thermostat::DEFAULT_MINIMUM)
}

fn maximum(node: &Node) -> f64 {
    node.attr(MAX_HEAT_TEMPERATURE)
        .reported_as::<f64>()
        .ok()
        .unwrap_or(Thermostat::DEFAULT_MAXIMUM)
}

fn read_temperature(node: &Node) -> Result<f64, ReadError<f64>> {
    read_clamped(
        node,
        TEMPERATURE,
        Slot::Reported,
        (minimum(node), maximum(node)),
        "thermostat: temperature",
    )
}

fn read_target(node: &Node) -> Result<f64, ReadError<f64>> {
    read_clamped(
        node,
        TARGET_HEAT_TEMPERATURE,
        Slot::Target,
        (minimum(node), maximum(node)),
        "thermostat: target temperature",
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hive_api::{Attribute, ErrorCode, Value};

    use super::super::tests::{node, session};
    use super::*;

    fn thermostat(attributes: &[(&str, Attribute)]) -> Thermostat {
        Thermostat::new(session(), node("zone", attributes))
    }

    fn with_temperature(value: impl Into<Value>) -> Thermostat {
        thermostat(&[(TEMPERATURE, Attribute::reported(value))])
    }

    #[test]
    fn temperature_clamps_to_default_bounds() {
        assert_eq!(with_temperature(2.0).temperature().unwrap(), Thermostat::DEFAULT_MINIMUM);
        assert_eq!(with_temperature(40.0).temperature().unwrap(), Thermostat::DEFAULT_MAXIMUM);
        assert_eq!(with_temperature(19.5).temperature().unwrap(), 19.5);
        assert_eq!(with_temperature(20).temperature().unwrap(), 20.0);
    }

    #[test]
    fn temperature_non_numeric_returns_minimum_and_error() {
        let err = with_temperature("19.5").temperature().unwrap_err();
        assert_eq!(err.fallback, Thermostat::DEFAULT_MINIMUM);
        assert_eq!(err.source.code(), ErrorCode::InvalidDataType);

        let err = thermostat(&[]).temperature().unwrap_err();
        assert_eq!(err.fallback, Thermostat::DEFAULT_MINIMUM);
    }

    #[test]
    fn bounds_come_from_node_attributes() {
        let t = thermostat(&[
            (TEMPERATURE, Attribute::reported(8.0)),
            (MIN_HEAT_TEMPERATURE, Attribute::reported(10.0)),
            (MAX_HEAT_TEMPERATURE, Attribute::reported(25.0)),
            (TARGET_HEAT_TEMPERATURE, Attribute::target(30.0)),
        ]);

        assert_eq!(t.minimum(), 10.0);
        assert_eq!(t.maximum(), 25.0);
        assert_eq!(t.temperature().unwrap(), 10.0);
        assert_eq!(t.target().unwrap(), 25.0);
    }

    #[test]
    fn malformed_bounds_fall_back_silently() {
        let t = thermostat(&[
            (MIN_HEAT_TEMPERATURE, Attribute::reported("low")),
            (MAX_HEAT_TEMPERATURE, Attribute::reported(true)),
        ]);

        assert_eq!(t.minimum(), Thermostat::DEFAULT_MINIMUM);
        assert_eq!(t.maximum(), Thermostat::DEFAULT_MAXIMUM);
    }

    #[test]
    fn inverted_bounds_do_not_panic() {
        let t = thermostat(&[
            (TEMPERATURE, Attribute::reported(20.0)),
            (MIN_HEAT_TEMPERATURE, Attribute::reported(30.0)),
            (MAX_HEAT_TEMPERATURE, Attribute::reported(10.0)),
        ]);

        assert_eq!(t.temperature().unwrap(), 30.0);
    }

    #[test]
    fn target_reads_target_slot() {
        let t = thermostat(&[(
            TARGET_HEAT_TEMPERATURE,
            Attribute {
                reported_value: Some(Value::from(18.0)),
                target_value: Some(Value::from(21.5)),
                ..Attribute::default()
            },
        )]);

        assert_eq!(t.target().unwrap(), 21.5);
    }

    #[test]
    fn active_mode_mapping() {
        let mode = |value: Option<Value>| {
            let attrs: Vec<_> = value
                .map(|v| (ACTIVE_MODE, Attribute { reported_value: Some(v), ..Attribute::default() }))
                .into_iter()
                .collect();
            thermostat(&attrs).active_mode()
        };

        assert_eq!(mode(Some("HEAT".into())).unwrap(), ActiveMode::Heating);
        assert_eq!(mode(Some("COOL".into())).unwrap(), ActiveMode::Cooling);
        assert_eq!(mode(Some("".into())).unwrap(), ActiveMode::Off);
        assert_eq!(mode(Some("OFF".into())).unwrap(), ActiveMode::Off);
        assert_eq!(mode(None).unwrap(), ActiveMode::Off);

        let err = mode(Some(1.into())).unwrap_err();
        assert_eq!(err.fallback, ActiveMode::Off);
        assert_eq!(err.source.code(), ErrorCode::InvalidDataType);
    }

    #[test]
    fn last_known_survives_bad_reading() {
        let t = with_temperature(19.5);
        assert_eq!(t.temperature_or_last_known(), 19.5);

        t.cell.node.store(Arc::new(node("zone", &[(TEMPERATURE, Attribute::reported("x"))])));

        assert!(t.temperature().is_err());
        assert_eq!(t.temperature_or_last_known(), 19.5);
    }

    #[test]
    fn target_last_known_starts_at_fallback() {
        let t = thermostat(&[]);
        assert_eq!(t.target_or_last_known(), Thermostat::DEFAULT_MINIMUM);
    }

    #[tokio::test]
    async fn set_target_rejects_non_finite() {
        let t = thermostat(&[]);
        let err = t.set_target(f64::NAN).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDataType);
    }
}
