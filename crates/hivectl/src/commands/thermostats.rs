//! Thermostat listing.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use hive_core::{ActiveMode, Home, Thermostat};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, celsius};

// ── Table row ───────────────────────────────────────────────────────

/// One thermostat's readings, as printed and serialized.
#[derive(Debug, Serialize)]
pub struct Reading {
    pub id: String,
    pub name: String,
    pub temperature: f64,
    pub target: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub mode: ActiveMode,
}

impl Reading {
    pub fn of(thermostat: &Thermostat) -> Self {
        Self {
            id: thermostat.id().to_owned(),
            name: thermostat.name().to_owned(),
            temperature: thermostat.temperature_or_last_known(),
            target: thermostat.target_or_last_known(),
            minimum: thermostat.minimum(),
            maximum: thermostat.maximum(),
            mode: thermostat
                .active_mode()
                .unwrap_or_else(hive_core::ReadError::into_fallback),
        }
    }

    /// `ID\tName\tcurrent\ttarget`
    pub fn line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id, self.name, self.temperature, self.target
        )
    }
}

#[derive(Tabled)]
pub struct ReadingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Current")]
    temperature: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Mode")]
    mode: String,
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            temperature: celsius(r.temperature),
            target: celsius(r.target),
            range: format!("{}-{}", celsius(r.minimum), celsius(r.maximum)),
            mode: r.mode.to_string(),
        }
    }
}

pub fn readings(thermostats: &[Arc<Thermostat>]) -> Vec<Reading> {
    thermostats.iter().map(|t| Reading::of(t)).collect()
}

pub fn render(global: &GlobalOpts, readings: &[Reading]) -> Result<String, CliError> {
    output::render_list(&global.output, readings, |r| ReadingRow::from(r), Reading::line)
}

pub async fn handle(home: &Home, global: &GlobalOpts) -> Result<(), CliError> {
    let thermostats = home.thermostats().await?;
    let out = render(global, &readings(&thermostats))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
