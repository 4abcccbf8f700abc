// ── Home ──
//
// Entry point for consumers: logs in once, then lists nodes and projects
// them into device views on demand. Every listing is a fresh round trip;
// views keep themselves current through `update()`.

use std::sync::Arc;

use hive_api::{Error, Session};
use tracing::info;

use crate::config::HomeConfig;
use crate::device::{Controller, Device, Radiator, Thermostat, classify};

/// An authenticated Hive account.
///
/// Cheaply cloneable; clones share the session.
#[derive(Debug, Clone)]
pub struct Home {
    session: Arc<Session>,
}

impl Home {
    /// Build a session from `config` and log in.
    pub async fn connect(config: &HomeConfig) -> Result<Self, Error> {
        let session = Session::new(
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
            &config.transport(),
        )?;

        let info = session.login().await?;
        info!(
            url = %config.url,
            api_version = %info.latest_supported_api_version,
            "connected to Hive"
        );

        Ok(Self::from_session(Arc::new(session)))
    }

    /// Wrap an existing session. No login is performed; the first request
    /// logs in on demand.
    pub fn from_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Every node that classifies as a device view, in server order.
    pub async fn devices(&self) -> Result<Vec<Device>, Error> {
        let nodes = self.session.list_nodes().await?;
        Ok(classify(&self.session, nodes))
    }

    pub async fn thermostats(&self) -> Result<Vec<Arc<Thermostat>>, Error> {
        Ok(self
            .devices()
            .await?
            .iter()
            .filter_map(Device::as_thermostat)
            .cloned()
            .collect())
    }

    pub async fn controllers(&self) -> Result<Vec<Arc<Controller>>, Error> {
        Ok(self
            .devices()
            .await?
            .iter()
            .filter_map(Device::as_controller)
            .cloned()
            .collect())
    }

    pub async fn radiators(&self) -> Result<Vec<Arc<Radiator>>, Error> {
        Ok(self
            .devices()
            .await?
            .iter()
            .filter_map(Device::as_radiator)
            .cloned()
            .collect())
    }
}
