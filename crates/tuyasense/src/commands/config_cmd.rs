//! Config subcommand handlers.

use dialoguer::{Input, Select};
use tuyasense_api::Region;
use tuyasense_config::{
    Config, Profile, config_path, load_config, save_config, store_api_secret,
};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::available_profiles;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_secret.is_some() {
            profile.api_secret = Some(REDACTED.into());
        }
    }
    cfg
}

/// TOML view for table output.
fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret() -> Result<String, CliError> {
    let secret = rpassword::prompt_password("Access Secret: ").map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "api_secret".into(),
            reason: "Access Secret cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Split a comma-separated answer into trimmed, non-empty items.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&load_config()?);
            let out = output::render_single(global.output, &cfg, format_config, format_config);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(),

        ConfigCommand::SetSecret { profile } => {
            let cfg = load_config()?;
            let profile_name = profile
                .or_else(|| global.profile.clone())
                .unwrap_or_else(|| cfg.active_profile_name(None));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: available_profiles(&cfg),
                });
            }

            let secret = prompt_secret()?;
            store_api_secret(&profile_name, &secret)?;
            eprintln!("✓ Access Secret stored in system keyring for '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let path = config_path();
    eprintln!("tuyasense configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_key: String = Input::new()
        .with_prompt("Access ID")
        .interact_text()
        .map_err(prompt_err)?;
    let secret = prompt_secret()?;

    let storage = Select::new()
        .with_prompt("Where to store the Access Secret?")
        .items(&[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ])
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let api_secret = if storage == 0 {
        store_api_secret(&profile_name, &secret)?;
        eprintln!("   ✓ Access Secret stored in system keyring");
        None
    } else {
        Some(secret)
    };

    let regions: Vec<String> = Region::ALL
        .iter()
        .map(|r| format!("{r} ({})", r.endpoint()))
        .collect();
    let region_index = Select::new()
        .with_prompt("Data center")
        .items(&regions)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let region = Region::ALL
        .get(region_index)
        .copied()
        .unwrap_or_default();

    let devices: String = Input::new()
        .with_prompt("Device ids, comma-separated (empty for all)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let mut cfg = load_config()?;
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            api_key: Some(api_key),
            api_secret,
            region: region.to_string(),
            device_ids: split_list(&devices),
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: tuyasense discover");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                api_key: Some("id".into()),
                api_secret: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        cfg.profiles.insert("office".into(), Profile::default());

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["home"].api_secret.as_deref(), Some(REDACTED));
        assert_eq!(shown.profiles["office"].api_secret, None);
        assert!(!format_config(&shown).contains("hunter2"));
    }

    #[test]
    fn device_list_is_split_and_trimmed() {
        assert_eq!(split_list(" bf01, ,bf02 "), ["bf01", "bf02"]);
        assert!(split_list("").is_empty());
    }
}
