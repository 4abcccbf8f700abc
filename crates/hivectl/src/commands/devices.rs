//! Device listing across every recognised kind.

use serde::Serialize;
use tabled::Tabled;

use hive_core::{Device, DeviceKind, Home, ReadError};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, celsius};

#[derive(Debug, Serialize)]
struct DeviceSummary {
    kind: DeviceKind,
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    battery: Option<u8>,
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        let mut summary = Self {
            kind: device.kind(),
            id: device.id().to_owned(),
            name: device.name().to_owned(),
            temperature: None,
            target: None,
            battery: None,
        };
        match device {
            Device::Thermostat(t) => {
                summary.temperature = Some(t.temperature().unwrap_or_else(ReadError::into_fallback));
                summary.target = Some(t.target().unwrap_or_else(ReadError::into_fallback));
            }
            Device::Controller(c) => {
                summary.battery = Some(c.battery_level().unwrap_or_else(ReadError::into_fallback));
            }
            Device::Radiator(r) => {
                summary.temperature = Some(r.temperature().unwrap_or_else(ReadError::into_fallback));
            }
        }
        summary
    }
}

impl DeviceSummary {
    fn reading(&self) -> String {
        match (self.temperature, self.target, self.battery) {
            (Some(current), Some(target), _) => {
                format!("{} -> {}", celsius(current), celsius(target))
            }
            (Some(current), None, _) => celsius(current),
            (None, _, Some(battery)) => format!("battery {battery}%"),
            _ => String::new(),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reading")]
    reading: String,
}

impl From<&DeviceSummary> for DeviceRow {
    fn from(d: &DeviceSummary) -> Self {
        Self {
            kind: d.kind.to_string(),
            id: d.id.clone(),
            name: d.name.clone(),
            reading: d.reading(),
        }
    }
}

pub async fn handle(home: &Home, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = home.devices().await?;
    let summaries: Vec<DeviceSummary> = devices.iter().map(DeviceSummary::from).collect();

    let out = output::render_list(
        &global.output,
        &summaries,
        |d| DeviceRow::from(d),
        |d| format!("{}\t{}\t{}\t{}", d.kind, d.id, d.name, d.reading()),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
