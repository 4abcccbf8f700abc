//! Target temperature mutation.

use owo_colors::OwoColorize;

use hive_core::Home;

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output::{self, celsius};

use super::thermostats::Reading;

fn detail(r: &Reading, color: bool) -> String {
    let target = if color {
        celsius(r.target).green().bold().to_string()
    } else {
        celsius(r.target)
    };
    [
        format!("ID:      {}", r.id),
        format!("Name:    {}", r.name),
        format!("Current: {}", celsius(r.temperature)),
        format!("Target:  {target}"),
        format!("Mode:    {}", r.mode),
    ]
    .join("\n")
}

/// Accept `temperature` when it lies between the advertised bounds,
/// whichever order the device reports them in.
fn check_range(temperature: f64, min: f64, max: f64, name: &str) -> Result<(), CliError> {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    if (low..=high).contains(&temperature) {
        return Ok(());
    }
    Err(CliError::Validation {
        field: "temperature".into(),
        reason: format!(
            "{temperature} is outside the range {}-{} of '{name}'",
            celsius(low),
            celsius(high)
        ),
    })
}

pub async fn handle(home: &Home, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let thermostats = home.thermostats().await?;
    let thermostat = match args.id {
        Some(ref id) => thermostats.iter().find(|t| t.id() == id),
        None => thermostats.first(),
    }
    .ok_or_else(|| CliError::NotFound {
        resource_type: "thermostat".into(),
        identifier: args.id.clone().unwrap_or_else(|| "(any)".into()),
        list_command: "thermostats".into(),
    })?;

    check_range(
        args.temperature,
        thermostat.minimum(),
        thermostat.maximum(),
        thermostat.name(),
    )?;

    thermostat.set_target(args.temperature).await?;
    tracing::info!(thermostat = thermostat.id(), target = args.temperature, "target set");

    // The node now holds the server's copy; print what it reports.
    let reading = Reading::of(thermostat);
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &reading,
        |r| detail(r, color),
        Reading::line,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
