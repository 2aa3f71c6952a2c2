use fintrack_core::config::RemoteConfig;
use fintrack_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            remote_url,
            remote_auth_token,
            user_id,
            no_activate,
        } => {
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let updates = CliProfile {
                remote_url,
                remote_auth_token,
                user_id,
            };
            merge_profile(&mut config, &profile_name, updates, !no_activate)?;

            let path = config.save().map_err(CliError::Config)?;
            println!("Profile '{}' initialized at {}", profile_name, path.display());
            print_missing_fields(&config, &profile_name);
            Ok(())
        }
    }
}

/// Apply the given fields onto a profile, keeping existing values for the
/// ones left unset, then validate the remote settings.
pub fn merge_profile(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    updates: CliProfile,
    activate: bool,
) -> Result<(), CliError> {
    let profile = config.profile_mut_or_default(profile_name);
    if let Some(value) = normalize_text_option(updates.remote_url) {
        profile.remote_url = Some(value);
    }
    if let Some(value) = normalize_text_option(updates.remote_auth_token) {
        profile.remote_auth_token = Some(value);
    }
    if let Some(value) = normalize_text_option(updates.user_id) {
        profile.user_id = Some(value);
    }

    validate_profile(profile)?;

    if activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(remote) = profile.remote_config() {
        remote
            .target()
            .map_err(|error| CliError::Config(error.to_string()))?;
    }
    Ok(())
}

fn print_missing_fields(config: &CliProfilesConfig, profile_name: &str) {
    let Some(profile) = config.profile(profile_name) else {
        return;
    };

    let mut missing_fields = Vec::new();
    if !profile
        .remote_config()
        .as_ref()
        .is_some_and(RemoteConfig::is_configured)
    {
        missing_fields.push("remote_url");
    }
    if profile.user_id().is_none() {
        missing_fields.push("user_id");
    }

    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' is ready. Run `fintrack sync`.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }
}
