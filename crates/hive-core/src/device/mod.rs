// ── Device views ──
//
// Hive exposes one flat list of nodes. Device views are typed projections
// over single nodes, selected by attribute signature or node type URI.
// `classify` is the single place where that selection happens.

mod controller;
mod radiator;
mod thermostat;

use std::sync::Arc;

use arc_swap::ArcSwap;
use hive_api::{Attribute, Error, Node, Session, Slot, Value};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;
use tracing::debug;

pub use controller::Controller;
pub use radiator::Radiator;
pub use thermostat::{ActiveMode, Thermostat};

/// Node type URI of the wall-mounted thermostat UI.
pub const CONTROLLER_NODE_TYPE: &str =
    "http://alertme.com/schema/json/node.class.thermostatui.json#";

/// Node type URI of a thermostatic radiator valve.
pub const RADIATOR_NODE_TYPE: &str = "http://alertme.com/schema/json/node.class.trv.json#";

pub(crate) const TEMPERATURE: &str = "temperature";
pub(crate) const TARGET_HEAT_TEMPERATURE: &str = "targetHeatTemperature";

// ── ReadError ───────────────────────────────────────────────────────

/// A failed reading that still carries a safe value to fall back on.
///
/// Returned by clamped getters when the attribute is missing or holds the
/// wrong type. The caller decides whether `fallback` is good enough.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ReadError<T> {
    pub fallback: T,
    #[source]
    pub source: Error,
}

impl<T> ReadError<T> {
    pub fn into_fallback(self) -> T {
        self.fallback
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this does not panic when the advertised bounds are
/// inverted: values below `min` become `min`, everything else above `max`
/// becomes `max`.
pub(crate) fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Extract a float from `attribute` and clamp it. A missing or mistyped
/// value yields `min` as the fallback alongside the error.
pub(crate) fn read_clamped(
    node: &Node,
    attribute: &str,
    slot: Slot,
    (min, max): (f64, f64),
    op: &'static str,
) -> Result<f64, ReadError<f64>> {
    node.attr(attribute)
        .get::<f64>(slot)
        .require(attribute)
        .map(|v| clamp(v, min, max))
        .map_err(|source| ReadError {
            fallback: min,
            source: source.with_op(op),
        })
}

// ── NodeCell ────────────────────────────────────────────────────────

/// The state shared by every device view: the owning session, the wrapped
/// node, and the identity captured when the view was built.
///
/// The node is only ever replaced wholesale, by an atomic pointer swap,
/// and only after the replacement's id has been checked.
#[derive(Debug)]
pub(crate) struct NodeCell {
    session: Arc<Session>,
    node: ArcSwap<Node>,
    id: String,
    name: String,
    href: String,
}

impl NodeCell {
    pub(crate) fn new(session: Arc<Session>, node: Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            href: node.href.clone(),
            node: ArcSwap::from_pointee(node),
            session,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn href(&self) -> &str {
        &self.href
    }

    /// A consistent snapshot of the current node.
    pub(crate) fn snapshot(&self) -> Arc<Node> {
        self.node.load_full()
    }

    /// Re-fetch the node from its reference.
    pub(crate) async fn refresh(&self, op: &'static str) -> Result<(), Error> {
        let node = self
            .session
            .fetch_node(&self.href)
            .await
            .map_err(|e| e.with_op(op))?;

        self.adopt(node, op)?;
        debug!(id = %self.id, op, "node refreshed");
        Ok(())
    }

    /// PUT a new target value for `attribute` and adopt the server's copy.
    pub(crate) async fn push_target(
        &self,
        attribute: &str,
        value: impl Into<Value>,
        op: &'static str,
    ) -> Result<(), Error> {
        let partial = Node::partial(attribute, Attribute::target(value));

        let node = self
            .session
            .put_node(&self.href, partial)
            .await
            .map_err(|e| e.with_op(op))?;

        self.adopt(node, op)?;
        debug!(id = %self.id, op, attribute, "target accepted");
        Ok(())
    }

    fn adopt(&self, node: Node, op: &'static str) -> Result<(), Error> {
        if node.id != self.id {
            return Err(Error::InvalidUpdate {
                expected: self.id.clone(),
                got: node.id,
            }
            .with_op(op));
        }

        self.node.store(Arc::new(node));
        Ok(())
    }
}

// ── Classification ──────────────────────────────────────────────────

/// The kinds of device view a node can be projected into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Thermostat,
    Controller,
    Radiator,
}

impl DeviceKind {
    /// Whether `node` can be viewed as this kind.
    ///
    /// Thermostats are recognised by the `targetHeatTemperature` attribute,
    /// which only heating zones carry; plain `temperature` also appears on
    /// valves and sensors. Nodes whose type cannot be read never match a
    /// type-based predicate.
    pub fn matches(self, node: &Node) -> bool {
        match self {
            Self::Thermostat => node.has_attr(TARGET_HEAT_TEMPERATURE),
            Self::Controller => node.node_type().is_ok_and(|t| t == CONTROLLER_NODE_TYPE),
            Self::Radiator => {
                node.node_type().is_ok_and(|t| t == RADIATOR_NODE_TYPE)
                    && node.has_attr(TEMPERATURE)
            }
        }
    }
}

/// A classified device view.
#[derive(Debug, Clone)]
pub enum Device {
    Thermostat(Arc<Thermostat>),
    Controller(Arc<Controller>),
    Radiator(Arc<Radiator>),
}

impl Device {
    fn build(kind: DeviceKind, session: Arc<Session>, node: Node) -> Self {
        match kind {
            DeviceKind::Thermostat => Self::Thermostat(Arc::new(Thermostat::new(session, node))),
            DeviceKind::Controller => Self::Controller(Arc::new(Controller::new(session, node))),
            DeviceKind::Radiator => Self::Radiator(Arc::new(Radiator::new(session, node))),
        }
    }

    fn cell(&self) -> &NodeCell {
        match self {
            Self::Thermostat(t) => &t.cell,
            Self::Controller(c) => &c.cell,
            Self::Radiator(r) => &r.cell,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Thermostat(_) => DeviceKind::Thermostat,
            Self::Controller(_) => DeviceKind::Controller,
            Self::Radiator(_) => DeviceKind::Radiator,
        }
    }

    pub fn id(&self) -> &str {
        self.cell().id()
    }

    pub fn name(&self) -> &str {
        self.cell().name()
    }

    pub fn href(&self) -> &str {
        self.cell().href()
    }

    pub fn node(&self) -> Arc<Node> {
        self.cell().snapshot()
    }

    /// Refresh the wrapped node from the API.
    pub async fn update(&self) -> Result<(), Error> {
        match self {
            Self::Thermostat(t) => t.update().await,
            Self::Controller(c) => c.update().await,
            Self::Radiator(r) => r.update().await,
        }
    }

    pub fn as_thermostat(&self) -> Option<&Arc<Thermostat>> {
        match self {
            Self::Thermostat(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_controller(&self) -> Option<&Arc<Controller>> {
        match self {
            Self::Controller(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_radiator(&self) -> Option<&Arc<Radiator>> {
        match self {
            Self::Radiator(r) => Some(r),
            _ => None,
        }
    }
}

/// Project a node list into device views, in server order.
///
/// A node matching several kinds yields one view per kind; a node matching
/// none is skipped. Nodes without an id are skipped too: a refresh could
/// never be matched back to them.
pub fn classify(session: &Arc<Session>, nodes: Vec<Node>) -> Vec<Device> {
    let mut devices = Vec::new();

    for node in nodes {
        if node.id.is_empty() {
            debug!(name = %node.name, "skipping node without id");
            continue;
        }
        for kind in DeviceKind::iter().filter(|kind| kind.matches(&node)) {
            devices.push(Device::build(kind, Arc::clone(session), node.clone()));
        }
    }

    debug!(count = devices.len(), "classified devices");
    devices
}
