//! Continuous polling of thermostat readings.

use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use hive_core::{Device, Home, HomeConfig, PollSummary, Poller, Thermostat};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::thermostats;

fn banner(summary: &PollSummary, color: bool) -> String {
    let text = format!(
        "poll #{}: {} updated, {} failed",
        summary.tick, summary.updated, summary.failed
    );
    match (color, summary.failed) {
        (false, _) => text,
        (true, 0) => text.dimmed().to_string(),
        (true, _) => text.yellow().to_string(),
    }
}

fn print_readings(list: &[Arc<Thermostat>], global: &GlobalOpts) -> Result<(), CliError> {
    let out = thermostats::render(global, &thermostats::readings(list))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    home: &Home,
    config: &HomeConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let interval = args.interval.map_or(config.poll_interval, Duration::from_secs);
    if interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let devices: Vec<Device> = home
        .devices()
        .await?
        .into_iter()
        .filter(|d| d.as_thermostat().is_some())
        .collect();
    let list: Vec<Arc<Thermostat>> = devices
        .iter()
        .filter_map(Device::as_thermostat)
        .cloned()
        .collect();
    if list.is_empty() {
        return Err(CliError::NotFound {
            resource_type: "thermostat".into(),
            identifier: "(any)".into(),
            list_command: "devices".into(),
        });
    }

    print_readings(&list, global)?;

    let poller = Poller::spawn(devices, interval, CancellationToken::new());
    let mut summaries = poller.subscribe();
    let color = output::should_color(&global.color);
    let human = matches!(global.output, OutputFormat::Table);
    tracing::info!(interval = ?interval, thermostats = list.len(), "watching");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            changed = summaries.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = *summaries.borrow_and_update();
                if human && !global.quiet {
                    eprintln!("{}", banner(&summary, color));
                }
                print_readings(&list, global)?;
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}
