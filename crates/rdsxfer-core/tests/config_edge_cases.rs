use std::fs;
use std::path::PathBuf;

use rdsxfer_core::config::{Config, Profile, ProfileRole};
use tempfile::TempDir;

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Missing and empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/rdsxfer-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file should load as default");

    assert!(config.profiles.is_empty());
    assert!(config.default_source.is_none());
    assert!(config.default_destination.is_none());
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "  \n").unwrap();

    let config = Config::load_from_path(&config_path).expect("empty file should parse as default");

    assert!(config.profiles.is_empty());
    assert_eq!(config.copy, Default::default());
}

// ---------------------------------------------------------------------------
// Malformed content
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[[[broken").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("parse"), "error should mention parsing: {msg}");
}

#[test]
fn load_profile_missing_region_returns_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.broken]
access_key_id = "AKIA"
secret_access_key = "secret"
"#,
    )
    .unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
unknown_top_level_key = "hello"

[profiles.prod]
access_key_id = "AKIA"
secret_access_key = "secret"
region = "us-east-1"
totally_unknown_field = true
"#,
    )
    .unwrap();

    let config =
        Config::load_from_path(&config_path).expect("unknown fields should be silently ignored");
    assert!(config.profiles.contains_key("prod"));
}

// ---------------------------------------------------------------------------
// Save then load
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directories_and_reloads() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("deeper").join("config.toml");

    let mut config = Config::default();
    config.set_profile(
        "prod".to_string(),
        Profile::new("AKIAPROD", "prod-secret", "us-east-1"),
    );
    config.set_profile(
        "staging".to_string(),
        Profile::new("AKIASTAGE", "stage-secret", "eu-west-1"),
    );
    config.set_default(ProfileRole::Source, "prod").unwrap();
    config.set_default(ProfileRole::Destination, "staging").unwrap();
    config.copy.instance_class = Some("db.r6g.large".to_string());

    config.save_to_path(&config_path).unwrap();
    let loaded = Config::load_from_path(&config_path).unwrap();

    assert_eq!(loaded.default_source.as_deref(), Some("prod"));
    assert_eq!(loaded.default_destination.as_deref(), Some("staging"));
    assert_eq!(loaded.copy.instance_class.as_deref(), Some("db.r6g.large"));
    assert_eq!(loaded.profiles["staging"].region, "eu-west-1");
}

// ---------------------------------------------------------------------------
// Permission errors (unix only)
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# valid toml").unwrap();
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("load"), "error should reference loading: {msg}");

    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn save_to_readonly_directory_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let readonly_dir = dir.path().join("readonly");
    fs::create_dir(&readonly_dir).unwrap();
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o444)).unwrap();

    let err = Config::default()
        .save_to_path(&readonly_dir.join("config.toml"))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("save"), "error should reference saving: {msg}");

    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o755)).unwrap();
}

// ---------------------------------------------------------------------------
// Environment references survive an edit
// ---------------------------------------------------------------------------

#[test]
#[serial_test::serial]
fn env_references_are_kept_when_config_is_edited_and_saved() {
    unsafe {
        std::env::set_var("RDSXFER_EDGE_PROD_SECRET", "REAL-SECRET-VALUE");
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.prod]
access_key_id = "AKIAPROD"
secret_access_key = "${RDSXFER_EDGE_PROD_SECRET}"
region = "us-east-1"
"#,
    )
    .unwrap();

    let expanded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(
        expanded.profiles["prod"].secret_access_key,
        "REAL-SECRET-VALUE"
    );

    let mut config = Config::load_raw_from_path(&config_path).unwrap();
    assert_eq!(
        config.profiles["prod"].secret_access_key,
        "${RDSXFER_EDGE_PROD_SECRET}"
    );
    config.set_default(ProfileRole::Source, "prod").unwrap();
    config.save_to_path(&config_path).unwrap();

    let on_disk = fs::read_to_string(&config_path).unwrap();
    assert!(on_disk.contains("${RDSXFER_EDGE_PROD_SECRET}"));
    assert!(!on_disk.contains("REAL-SECRET-VALUE"));
    assert!(on_disk.contains("default_source = \"prod\""));

    unsafe {
        std::env::remove_var("RDSXFER_EDGE_PROD_SECRET");
    }
}
