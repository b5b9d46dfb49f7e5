//! `read`: one refresh per device, then print every reading.

use tabled::Tabled;
use tuyasense_core::{ReadingState, SensorHub};

use crate::cli::{GlobalOpts, ReadArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
pub(super) struct ReadingRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl ReadingRow {
    pub(super) fn new(state: &ReadingState, color: bool) -> Self {
        Self {
            name: state.name.clone(),
            value: format_value(state),
            unit: state.unit.clone().unwrap_or_default(),
            status: output::availability(state.available, color),
        }
    }
}

pub(super) fn format_value(state: &ReadingState) -> String {
    state
        .value
        .as_ref()
        .map_or_else(|| "-".into(), ToString::to_string)
}

/// `unique_id=value`, for plain output.
pub(super) fn plain_line(state: &ReadingState) -> String {
    format!("{}={}", state.unique_id, format_value(state))
}

fn matches(state: &ReadingState, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    state.name.to_lowercase().contains(&needle) || state.code.to_lowercase().contains(&needle)
}

pub async fn handle(hub: &SensorHub, args: &ReadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    hub.refresh_all().await;

    let states: Vec<ReadingState> = hub
        .readings()
        .iter()
        .map(tuyasense_core::SensorReading::state)
        .filter(|s| args.filter.as_deref().is_none_or(|f| matches(s, f)))
        .collect();

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &states,
        |s| ReadingRow::new(s, color),
        plain_line,
    );
    output::print_output(&out, global.quiet);

    let failed: Vec<&str> = hub
        .coordinators()
        .filter(|c| !c.last_update_success())
        .map(tuyasense_core::Coordinator::device_id)
        .collect();
    if !failed.is_empty() {
        tracing::warn!(devices = ?failed, "some devices could not be refreshed");
    }
    Ok(())
}
