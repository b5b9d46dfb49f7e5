//! `discover`: list every classified sensor without polling.

use serde::Serialize;
use tabled::Tabled;
use tuyasense_core::{SensorHub, SensorReading};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SensorInfo {
    unique_id: String,
    device_id: String,
    device_name: String,
    code: String,
    name: String,
    class: Option<String>,
    unit: Option<String>,
    state_class: Option<String>,
}

impl From<&SensorReading> for SensorInfo {
    fn from(r: &SensorReading) -> Self {
        let d = r.descriptor();
        Self {
            unique_id: r.unique_id().into(),
            device_id: r.device_id().into(),
            device_name: r.device().name.clone(),
            code: d.code.clone(),
            name: r.name().into(),
            class: d.class.as_ref().map(ToString::to_string),
            unit: d.unit.clone(),
            state_class: d.state_class.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "State class")]
    state_class: String,
}

impl From<&SensorInfo> for SensorRow {
    fn from(s: &SensorInfo) -> Self {
        Self {
            device: format!("{} ({})", s.device_name, s.device_id),
            code: s.code.clone(),
            name: s.name.clone(),
            class: s.class.clone().unwrap_or_else(|| "-".into()),
            unit: s.unit.clone().unwrap_or_default(),
            state_class: s.state_class.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

pub fn handle(hub: &SensorHub, global: &GlobalOpts) -> Result<(), CliError> {
    let sensors: Vec<SensorInfo> = hub.readings().iter().map(SensorInfo::from).collect();
    if sensors.is_empty() && !global.quiet {
        eprintln!("No compatible sensors found.");
        return Ok(());
    }

    let out = output::render_list(global.output, &sensors, |s| SensorRow::from(s), |s| {
        s.unique_id.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
