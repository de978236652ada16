//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::commands::confirm_action;
use crate::connection::ConnectionManager;
use crate::error::{RdsXferError, Result as CliResult};
use crate::output::{self, print_output};
use anyhow::Context;
use rdsxfer_core::AccountCredentials;
use rdsxfer_core::config::{Config, CredentialStore, Profile, ProfileRole};
use serde::Serialize;
use tracing::{debug, info};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            access_key_id,
            secret_access_key,
            region,
            description,
            force,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => handle_set(
            conn_mgr,
            SetProfile {
                name,
                access_key_id,
                secret_access_key: secret_access_key.as_deref(),
                region,
                description: description.as_deref(),
                force: *force,
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
            },
        ),
        Remove { name, force } => handle_remove(conn_mgr, name, *force),
        DefaultSource { name } => handle_default(conn_mgr, ProfileRole::Source, name),
        DefaultDest { name } => handle_default(conn_mgr, ProfileRole::Destination, name),
    }
}

/// A profile as shown to the user; the secret is never included
#[derive(Debug, Serialize)]
struct ProfileSummary<'a> {
    name: &'a str,
    region: &'a str,
    access_key_id: &'a str,
    secret_access_key: String,
    storage: &'static str,
    default_for: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> ProfileSummary<'a> {
    fn new(config: &Config, name: &'a str, profile: &'a Profile) -> Self {
        let mut default_for = Vec::new();
        if config.default_for(ProfileRole::Source) == Some(name) {
            default_for.push("source");
        }
        if config.default_for(ProfileRole::Destination) == Some(name) {
            default_for.push("destination");
        }

        Self {
            name,
            region: &profile.region,
            access_key_id: &profile.access_key_id,
            secret_access_key: mask_secret(&profile.secret_access_key),
            storage: if profile.uses_keyring() {
                "keyring"
            } else {
                "plaintext"
            },
            default_for,
            description: profile.description.as_deref(),
        }
    }
}

/// Keyring references are shown as-is; plaintext secrets only by their tail
fn mask_secret(secret: &str) -> String {
    if CredentialStore::is_keyring_reference(secret) {
        return secret.to_string();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let config = &conn_mgr.config;
    let profiles: Vec<ProfileSummary> = config
        .list_profiles()
        .into_iter()
        .map(|(name, profile)| ProfileSummary::new(config, name, profile))
        .collect();

    if output_format.is_structured() {
        let output_data = serde_json::json!({
            "config_path": conn_mgr.display_path(),
            "profiles": profiles,
            "count": profiles.len(),
        });
        print_output(
            &output_data,
            output::OutputFormat::resolve(output_format, output::OutputFormat::Json),
        )?;
        return Ok(());
    }

    if let Some(path) = conn_mgr.display_path() {
        println!("Configuration file: {}", path);
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'rdsxfer profile set' to create a profile.");
        return Ok(());
    }

    let rows: Vec<serde_json::Value> = profiles
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "region": p.region,
                "access_key_id": p.access_key_id,
                "default_for": p.default_for.join(", "),
            })
        })
        .collect();
    print_output(&rows, output::OutputFormat::Table)?;
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if output_format.is_structured() {
        let output_data = serde_json::json!({ "config_path": config_path.to_str() });
        print_output(
            &output_data,
            output::OutputFormat::resolve(output_format, output::OutputFormat::Json),
        )?;
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr.config.profile(name)?;
    let summary = ProfileSummary::new(&conn_mgr.config, name, profile);
    print_output(
        &summary,
        output::OutputFormat::resolve(output_format, output::OutputFormat::Table),
    )?;
    Ok(())
}

struct SetProfile<'a> {
    name: &'a str,
    access_key_id: &'a str,
    secret_access_key: Option<&'a str>,
    region: &'a str,
    description: Option<&'a str>,
    force: bool,
    #[cfg(feature = "secure-storage")]
    use_keyring: bool,
}

fn handle_set(conn_mgr: &ConnectionManager, args: SetProfile<'_>) -> CliResult<()> {
    debug!("Setting profile: {}", args.name);

    let mut config = conn_mgr.load_for_edit()?;
    if config.profiles.contains_key(args.name) && !args.force {
        let overwrite = confirm_action(
            &format!("Profile '{}' already exists. Overwrite it?", args.name),
            "--force",
        )?;
        if !overwrite {
            println!("Profile update cancelled.");
            return Ok(());
        }
    }

    let secret = match args.secret_access_key {
        Some(secret) => secret.to_string(),
        None => rpassword::prompt_password("Secret access key: ")
            .context("Failed to read secret access key")?,
    };

    // `${VAR}` references are expanded at load time, so only literal values
    // can be checked here
    if !args.access_key_id.contains("${") && !secret.contains("${") {
        AccountCredentials::new(args.access_key_id, &secret, args.region)
            .validate()
            .map_err(|e| RdsXferError::InvalidInput {
                message: e.to_string(),
            })?;
    }

    #[cfg(feature = "secure-storage")]
    let store = if args.use_keyring {
        CredentialStore::keyring()
    } else {
        CredentialStore::plaintext()
    };
    #[cfg(not(feature = "secure-storage"))]
    let store = CredentialStore::plaintext();

    let stored_secret = store
        .store_credential(&format!("{}-secret-access-key", args.name), &secret)
        .context("Failed to store secret access key")?;
    info!(profile = args.name, backend = store.storage_backend(), "Stored secret access key");

    let mut profile = Profile::new(args.access_key_id, stored_secret, args.region);
    profile.description = args.description.map(str::to_string);

    config.set_profile(args.name.to_string(), profile);
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' saved successfully.", args.name);
    if let Some(path) = conn_mgr.display_path() {
        println!("  {}", path);
    }
    if store.storage_backend() == "keyring" {
        println!("Secret access key stored in the OS keyring.");
    }

    let missing_defaults: Vec<&str> = [
        (ProfileRole::Source, "default-source"),
        (ProfileRole::Destination, "default-dest"),
    ]
    .into_iter()
    .filter(|(role, _)| config.default_for(*role).is_none())
    .map(|(_, cmd)| cmd)
    .collect();
    if !missing_defaults.is_empty() {
        println!();
        println!("Tip: Use it by default with:");
        for cmd in missing_defaults {
            println!("  rdsxfer profile {} {}", cmd, args.name);
        }
    }

    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str, force: bool) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let mut config = conn_mgr.load_for_edit()?;
    let secret_access_key = config.profile(name)?.secret_access_key.clone();

    if !force {
        let confirmed = confirm_action(
            &format!("Are you sure you want to remove profile '{}'?", name),
            "--force",
        )?;
        if !confirmed {
            println!("Profile removal cancelled.");
            return Ok(());
        }
    }

    CredentialStore::default()
        .delete_credential(&secret_access_key)
        .context("Failed to remove secret access key from keyring")?;

    for role in [ProfileRole::Source, ProfileRole::Destination] {
        if config.default_for(role) == Some(name) {
            println!("Default {} profile cleared.", role);
        }
    }
    config.remove_profile(name);
    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, role: ProfileRole, name: &str) -> CliResult<()> {
    debug!(%role, "Setting default profile: {}", name);

    let mut config = conn_mgr.load_for_edit()?;
    config.set_default(role, name)?;
    conn_mgr.save_config(&config)?;

    println!("Default {} profile set to '{}'.", role, name);
    Ok(())
}
