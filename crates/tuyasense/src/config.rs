//! CLI configuration: merges `GlobalOpts` flags over the active profile.

use secrecy::SecretString;

use tuyasense_config::{
    Config, Profile, load_config, profile_to_poller_config, profile_to_poller_config_with_secret,
};
use tuyasense_core::PollerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A poller configuration plus the profile it came from.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub poller: PollerConfig,
}

/// Load the config file and resolve it against the global flags.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    resolve_with(global, &cfg)
}

/// Flags win over the profile, the profile over `[defaults]`.
pub fn resolve_with(global: &GlobalOpts, cfg: &Config) -> Result<Resolved, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        None => Profile::default(),
    };
    let profile = apply_flags(global, profile);

    let poller = match global.api_secret {
        Some(ref secret) => profile_to_poller_config_with_secret(
            &profile,
            &profile_name,
            &cfg.defaults,
            SecretString::from(secret.clone()),
        )?,
        None => profile_to_poller_config(&profile, &profile_name, &cfg.defaults)?,
    };

    Ok(Resolved {
        profile_name,
        poller,
    })
}

/// Layer the non-secret flags over a profile.
fn apply_flags(global: &GlobalOpts, mut profile: Profile) -> Profile {
    if let Some(ref key) = global.api_key {
        profile.api_key = Some(key.clone());
    }
    if let Some(ref region) = global.region {
        profile.region.clone_from(region);
    }
    profile.device_ids = prefer_flag(&global.devices, &profile.device_ids);
    profile.include_sensors = prefer_flag(&global.include, &profile.include_sensors);
    profile.exclude_sensors = prefer_flag(&global.exclude, &profile.exclude_sensors);
    profile.scan_interval = global.scan_interval.or(profile.scan_interval);
    profile.timeout = global.timeout.or(profile.timeout);
    profile
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn prefer_flag(flag: &[String], profile: &[String]) -> Vec<String> {
    if flag.is_empty() {
        profile.to_vec()
    } else {
        flag.to_vec()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use secrecy::ExposeSecret;
    use tuyasense_api::Region;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["tuyasense"];
        argv.extend_from_slice(args);
        argv.push("discover");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.defaults.scan_interval = 90;
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_key: Some("profile-id".into()),
                api_secret: Some("profile-secret".into()),
                region: "eu".into(),
                device_ids: vec!["bf01".into()],
                exclude_sensors: vec!["va_battery".into()],
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let resolved = resolve_with(&global(&[]), &config()).unwrap();
        let poller = resolved.poller;

        assert_eq!(resolved.profile_name, "default");
        assert_eq!(poller.credentials.access_id, "profile-id");
        assert_eq!(poller.region, Region::Eu);
        assert_eq!(poller.device_ids, ["bf01"]);
        assert!(!poller.filter.allows("va_battery"));
        assert_eq!(poller.scan_interval, Duration::from_secs(90));
        assert_eq!(poller.timeout, Duration::from_secs(30));
    }

    #[test]
    fn flags_override_profile() {
        let args = [
            "--api-key",
            "flag-id",
            "--api-secret",
            "flag-secret",
            "--region",
            "IN",
            "--device",
            "a1,a2",
            "--include",
            "humidity",
            "--scan-interval",
            "10",
            "--timeout",
            "7",
        ];
        let poller = resolve_with(&global(&args), &config()).unwrap().poller;

        assert_eq!(poller.credentials.access_id, "flag-id");
        assert_eq!(poller.credentials.access_secret.expose_secret(), "flag-secret");
        assert_eq!(poller.region, Region::In);
        assert_eq!(poller.device_ids, ["a1", "a2"]);
        assert!(poller.filter.allows("humidity"));
        assert!(!poller.filter.allows("temp_current"));
        assert_eq!(poller.scan_interval(), Duration::from_secs(30));
        assert_eq!(poller.timeout, Duration::from_secs(7));
    }

    #[test]
    fn missing_access_id_is_reported() {
        let err = resolve_with(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoCredentials { ref profile } if profile == "default"));
    }

    #[test]
    fn unknown_explicit_profile_is_reported() {
        let err = resolve_with(&global(&["--profile", "office"]), &config()).unwrap_err();
        assert!(
            matches!(err, CliError::ProfileNotFound { ref name, ref available } if name == "office" && available == "default")
        );
    }

    #[test]
    fn bad_region_is_a_validation_error() {
        let err = resolve_with(&global(&["--region", "mars"]), &config()).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "region"));
    }
}
