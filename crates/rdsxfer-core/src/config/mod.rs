//! Configuration and profile management for rdsxfer
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Holds named AWS account profiles so credentials never have to be pasted
//! into the command line.
//!
//! # Features
//!
//! - Multiple named profiles (one per AWS account)
//! - Default source and destination profiles
//! - Default engine, instance and wait settings for `copy`
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

pub mod config;
pub mod credential;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, CopyDefaults, Profile, ProfileRole};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
