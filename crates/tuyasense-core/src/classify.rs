// ── Sensor classification ──
//
// Maps a data-point code (plus its current value and declared spec) to a
// typed `SensorDescriptor`. Pure and deterministic: a static table of known
// Tuya codes, then substring heuristics, then the spec range, then a
// generic fallback. Every code yields some descriptor.

use crate::model::{
    DataPointSpec, DataPointValue, SensorClass, SensorDescriptor, StateClass,
};

/// Value above which a power-family reading is treated as an energy counter.
const ENERGY_THRESHOLD: f64 = 1000.0;

const CELSIUS: &str = "°C";
const PERCENT: &str = "%";
const WATT: &str = "W";
const KILOWATT_HOUR: &str = "kWh";
const VOLT: &str = "V";
const AMPERE: &str = "A";
const PPM: &str = "ppm";
const MICROGRAMS_PER_CUBIC_METER: &str = "\u{3bc}g/m\u{b3}";

#[derive(Debug, Clone, Copy)]
struct Preset {
    name: &'static str,
    class: Option<SensorClass>,
    unit: Option<&'static str>,
    state_class: Option<StateClass>,
}

impl Preset {
    const fn measurement(name: &'static str, class: SensorClass, unit: &'static str) -> Self {
        Self {
            name,
            class: Some(class),
            unit: Some(unit),
            state_class: Some(StateClass::Measurement),
        }
    }

    fn describe(self, code: &str) -> SensorDescriptor {
        SensorDescriptor {
            code: code.to_owned(),
            name: self.name.to_owned(),
            class: self.class,
            unit: self.unit.map(str::to_owned),
            state_class: self.state_class,
        }
    }
}

// ── Known codes ─────────────────────────────────────────────────────

const TEMPERATURE: Preset = Preset::measurement("Temperature", SensorClass::Temperature, CELSIUS);
const INDOOR_TEMPERATURE: Preset =
    Preset::measurement("Indoor Temperature", SensorClass::Temperature, CELSIUS);
const OUTDOOR_TEMPERATURE: Preset =
    Preset::measurement("Outdoor Temperature", SensorClass::Temperature, CELSIUS);
const HUMIDITY: Preset = Preset::measurement("Humidity", SensorClass::Humidity, PERCENT);
const INDOOR_HUMIDITY: Preset =
    Preset::measurement("Indoor Humidity", SensorClass::Humidity, PERCENT);
const OUTDOOR_HUMIDITY: Preset =
    Preset::measurement("Outdoor Humidity", SensorClass::Humidity, PERCENT);
const VOLTAGE: Preset = Preset::measurement("Voltage", SensorClass::Voltage, VOLT);
const CURRENT: Preset = Preset::measurement("Current", SensorClass::Current, AMPERE);
const BATTERY: Preset = Preset::measurement("Battery", SensorClass::Battery, PERCENT);
const CO2: Preset = Preset::measurement("CO2", SensorClass::Co2, PPM);
const PM25: Preset = Preset::measurement("PM2.5", SensorClass::Pm25, MICROGRAMS_PER_CUBIC_METER);
const POWER: Preset = Preset::measurement("Power", SensorClass::Power, WATT);
const ENERGY: Preset = Preset {
    name: "Energy",
    class: Some(SensorClass::Energy),
    unit: Some(KILOWATT_HOUR),
    state_class: Some(StateClass::TotalIncreasing),
};

static KNOWN: &[(&str, Preset)] = &[
    ("temp_current", TEMPERATURE),
    ("temperature", TEMPERATURE),
    ("temp_indoor", INDOOR_TEMPERATURE),
    ("Tin", INDOOR_TEMPERATURE),
    ("ToutCh1", OUTDOOR_TEMPERATURE),
    ("temp_outdoor", OUTDOOR_TEMPERATURE),
    ("humidity", HUMIDITY),
    ("humidity_indoor", INDOOR_HUMIDITY),
    ("Hin", INDOOR_HUMIDITY),
    ("HoutCh1", OUTDOOR_HUMIDITY),
    ("humidity_outdoor", OUTDOOR_HUMIDITY),
    (
        "cur_power",
        Preset::measurement("Current Power", SensorClass::Power, WATT),
    ),
    (
        "add_ele",
        Preset {
            name: "Power Consumption",
            ..ENERGY
        },
    ),
    ("cur_voltage", VOLTAGE),
    ("cur_current", CURRENT),
    ("battery_percentage", BATTERY),
    (
        "battery_state",
        Preset {
            name: "Battery State",
            class: None,
            unit: None,
            state_class: None,
        },
    ),
    ("co2_value", CO2),
    ("pm25_value", PM25),
    (
        "voc_value",
        Preset::measurement("VOC", SensorClass::Voc, "ppb"),
    ),
    (
        "bright_value",
        Preset::measurement("Brightness", SensorClass::Illuminance, "lx"),
    ),
    (
        "pressure",
        Preset::measurement("Pressure", SensorClass::Pressure, "hPa"),
    ),
    (
        "countdown",
        Preset::measurement("Countdown", SensorClass::Duration, "s"),
    ),
    (
        "filter_life",
        Preset {
            name: "Filter Life",
            class: None,
            unit: Some(PERCENT),
            state_class: Some(StateClass::Measurement),
        },
    ),
];

/// Codes with a fixed descriptor, in table order.
pub fn known_codes() -> impl Iterator<Item = &'static str> {
    KNOWN.iter().map(|(code, _)| *code)
}

fn lookup(code: &str) -> Option<Preset> {
    KNOWN
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, preset)| *preset)
}

// ── Heuristics ──────────────────────────────────────────────────────

fn guess_from_code(code: &str, value: &DataPointValue) -> Option<Preset> {
    let has = |needle: &str| code.contains(needle);

    if has("temp") {
        Some(TEMPERATURE)
    } else if has("humidity") {
        Some(HUMIDITY)
    } else if has("voltage") {
        // Ahead of the power family so `power_voltage` stays a voltage.
        Some(VOLTAGE)
    } else if has("power") || has("energy") || has("electricity") {
        let counter = value.is_number() && value.as_f64().is_some_and(|v| v > ENERGY_THRESHOLD);
        Some(if counter { ENERGY } else { POWER })
    } else if has("current") && !has("power") {
        Some(CURRENT)
    } else if has("battery") {
        Some(BATTERY)
    } else if has("co2") {
        Some(CO2)
    } else if has("pm25") || has("pm2_5") {
        Some(PM25)
    } else {
        None
    }
}

#[allow(clippy::float_cmp)]
fn is_percent_range(spec: &DataPointSpec) -> bool {
    spec.kind.is_numeric() && spec.min == Some(0.0) && spec.max == Some(100.0)
}

/// `"foo_level"` → `"Foo Level"`.
///
/// Underscores become spaces, then every cased character is upper-cased if
/// it follows an uncased one and lower-cased otherwise.
pub fn humanize(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut after_cased = false;
    for ch in code.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if after_cased {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            after_cased = true;
        } else {
            out.push(ch);
            after_cased = false;
        }
    }
    out
}

// ── Entry point ─────────────────────────────────────────────────────

/// Classify one data point.
///
/// First match wins: the known-code table, then substring heuristics on the
/// code, then a declared numeric `0..=100` range (generic percentage), then
/// a generic sensor named after the code.
pub fn classify(
    code: &str,
    value: &DataPointValue,
    spec: Option<&DataPointSpec>,
) -> SensorDescriptor {
    if let Some(preset) = lookup(code).or_else(|| guess_from_code(code, value)) {
        return preset.describe(code);
    }

    let name = humanize(code);
    if spec.is_some_and(is_percent_range) {
        return SensorDescriptor {
            class: Some(SensorClass::Percentage),
            unit: Some(PERCENT.to_owned()),
            state_class: Some(StateClass::Measurement),
            ..SensorDescriptor::generic(code, name)
        };
    }

    SensorDescriptor::generic(code, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataPointType;
    use pretty_assertions::assert_eq;

    fn int(v: i64) -> DataPointValue {
        DataPointValue::Integer(v)
    }

    fn percent_spec() -> DataPointSpec {
        DataPointSpec::new(DataPointType::Integer).with_range(0.0, 100.0)
    }

    // ── Table ──

    #[test]
    fn known_codes_ignore_value_and_spec() {
        let values = [
            int(0),
            int(5000),
            DataPointValue::Text("x".into()),
            DataPointValue::Bool(false),
        ];
        let spec = percent_spec();
        for code in known_codes() {
            let expected = lookup(code).map(|p| p.describe(code));
            for value in &values {
                assert_eq!(Some(classify(code, value, None)), expected, "{code}");
                assert_eq!(Some(classify(code, value, Some(&spec))), expected, "{code}");
            }
        }
    }

    #[test]
    fn table_entries() {
        let d = classify("add_ele", &int(12), None);
        assert_eq!(d.name, "Power Consumption");
        assert_eq!(d.class, Some(SensorClass::Energy));
        assert_eq!(d.unit.as_deref(), Some("kWh"));
        assert_eq!(d.state_class, Some(StateClass::TotalIncreasing));

        let d = classify("Tin", &int(200), None);
        assert_eq!(d.name, "Indoor Temperature");
        assert_eq!(d.class, Some(SensorClass::Temperature));

        let d = classify("battery_state", &DataPointValue::Text("low".into()), None);
        assert_eq!(d, SensorDescriptor::generic("battery_state", "Battery State"));

        let d = classify("filter_life", &int(80), None);
        assert_eq!(d.class, None);
        assert_eq!(d.unit.as_deref(), Some("%"));
        assert_eq!(d.state_class, Some(StateClass::Measurement));

        let d = classify("pm25_value", &int(8), None);
        assert_eq!(d.unit.as_deref(), Some("\u{3bc}g/m\u{b3}"));
        assert_ne!(d.unit.as_deref(), Some("\u{b5}g/m\u{b3}"));
    }

    #[test]
    fn add_ele_is_energy_and_cur_power_is_power() {
        let energy = classify("add_ele", &int(1500), None);
        assert_eq!(energy.class, Some(SensorClass::Energy));
        assert_eq!(energy.state_class, Some(StateClass::TotalIncreasing));

        let power = classify("cur_power", &int(400), None);
        assert_eq!(power.class, Some(SensorClass::Power));
        assert_eq!(power.state_class, Some(StateClass::Measurement));
    }

    // ── Heuristics ──

    #[test]
    fn power_voltage_is_voltage() {
        let d = classify("power_voltage", &int(2300), None);
        assert_eq!(d.class, Some(SensorClass::Voltage));
        assert_eq!(d.name, "Voltage");
    }

    #[test]
    fn power_family_switches_to_energy_above_threshold() {
        let d = classify("total_energy", &int(1001), None);
        assert_eq!(d.class, Some(SensorClass::Energy));
        assert_eq!(d.name, "Energy");

        let d = classify("total_energy", &int(1000), None);
        assert_eq!(d.class, Some(SensorClass::Power));

        let d = classify("electricity_today", &DataPointValue::Float(1200.5), None);
        assert_eq!(d.class, Some(SensorClass::Energy));
    }

    #[test]
    fn numeric_text_does_not_trigger_energy() {
        let d = classify("phase_power", &DataPointValue::Text("5000".into()), None);
        assert_eq!(d.class, Some(SensorClass::Power));
    }

    #[test]
    fn current_excludes_power_codes() {
        assert_eq!(
            classify("phase_current", &int(3), None).class,
            Some(SensorClass::Current)
        );
        // "power" wins first via the power family.
        assert_eq!(
            classify("power_current", &int(3), None).class,
            Some(SensorClass::Power)
        );
    }

    #[test]
    fn heuristic_order() {
        assert_eq!(
            classify("temp_humidity", &int(1), None).class,
            Some(SensorClass::Temperature)
        );
        assert_eq!(
            classify("humidity_value", &int(1), None).class,
            Some(SensorClass::Humidity)
        );
        assert_eq!(
            classify("battery_value", &int(1), None).class,
            Some(SensorClass::Battery)
        );
        assert_eq!(
            classify("co2_state", &int(1), None).class,
            Some(SensorClass::Co2)
        );
        assert_eq!(
            classify("pm2_5", &int(1), None).class,
            Some(SensorClass::Pm25)
        );
        assert_eq!(
            classify("pm2_5", &int(1), None).unit.as_deref(),
            Some("\u{3bc}g/m\u{b3}")
        );
    }

    #[test]
    fn heuristics_are_case_sensitive() {
        let d = classify("TEMP_X", &int(1), None);
        assert_eq!(d.class, None);
    }

    // ── Spec and default fallbacks ──

    #[test]
    fn percent_range_spec_yields_percentage() {
        let d = classify("foo_level", &int(42), Some(&percent_spec()));
        assert_eq!(d.name, "Foo Level");
        assert_eq!(d.class, Some(SensorClass::Percentage));
        assert_eq!(d.unit.as_deref(), Some("%"));
        assert_eq!(d.state_class, Some(StateClass::Measurement));
    }

    #[test]
    fn non_percent_specs_fall_through() {
        let wide = DataPointSpec::new(DataPointType::Integer).with_range(0.0, 1000.0);
        assert_eq!(classify("foo_level", &int(1), Some(&wide)).class, None);

        let enum_spec = DataPointSpec::new(DataPointType::Enum).with_range(0.0, 100.0);
        assert_eq!(classify("foo_level", &int(1), Some(&enum_spec)).class, None);

        let float = DataPointSpec::new(DataPointType::Float).with_range(0.0, 100.0);
        assert_eq!(
            classify("foo_level", &int(1), Some(&float)).class,
            Some(SensorClass::Percentage)
        );
    }

    #[test]
    fn unknown_code_is_generic() {
        let d = classify("switch_led", &DataPointValue::Bool(true), None);
        assert_eq!(d, SensorDescriptor::generic("switch_led", "Switch Led"));
    }

    #[test]
    fn humanize_title_cases_words() {
        assert_eq!(humanize("foo_level"), "Foo Level");
        assert_eq!(humanize("FAN_SPEED"), "Fan Speed");
        assert_eq!(humanize("co2value"), "Co2Value");
        assert_eq!(humanize("pm2_5"), "Pm2 5");
        assert_eq!(humanize(""), "");
    }
}
