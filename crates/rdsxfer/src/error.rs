//! Error types for rdsxfer
//!
//! Defines structured error types using thiserror for better error handling and user experience.

use colored::Colorize;
use rdsxfer_core::{ConfigError, CopyPlan, CopyStage, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Copy failed during cluster restore: rds RestoreDBClusterFromSnapshot failed: ...
///
///   tip: a resource with this identifier already exists in the target account
///
///   tip: these resources were created and are left in place:
///       cluster snapshot orders-db-snapshot in account 111111111111 (us-east-1)
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[String]) -> Self {
        self.tips.push((description.to_string(), commands.to_vec()));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the rdsxfer application
#[derive(Error, Debug)]
pub enum RdsXferError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No {role} account configured")]
    NoProfileConfigured { role: String, suggestion: String },

    #[error("Failed to resolve credentials: {message}")]
    CredentialError { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("AWS error: {message}")]
    AwsError {
        message: String,
        code: Option<String>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("{message}")]
    ResourceFailed { message: String },

    #[error("Copy failed during {stage}: {cause}")]
    CopyFailed {
        stage: CopyStage,
        #[source]
        cause: Box<RdsXferError>,
        leftovers: Vec<String>,
    },

    #[error("Copy cancelled")]
    Cancelled,

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for rdsxfer operations
pub type Result<T> = std::result::Result<T, RdsXferError>;

impl RdsXferError {
    /// Wrap a failed copy run, listing what was created before the failure
    pub fn copy_failed(err: CoreError, plan: &CopyPlan) -> Self {
        let cause = Self::from_core(err.root(), err.root().to_string());
        match err.stage() {
            Some(stage) if stage > CopyStage::Init => RdsXferError::CopyFailed {
                stage,
                cause: Box::new(cause),
                leftovers: stage.leftovers(plan),
            },
            _ => cause,
        }
    }

    fn from_core(err: &CoreError, message: String) -> Self {
        if err.is_unauthorized() {
            return RdsXferError::AuthenticationFailed { message };
        }
        match err.root() {
            CoreError::Validation(_) => RdsXferError::InvalidInput { message },
            CoreError::Timeout { .. } => RdsXferError::Timeout { message },
            CoreError::ResourceFailed { .. } => RdsXferError::ResourceFailed { message },
            CoreError::NotFound(_) => RdsXferError::NotFound { message },
            CoreError::Aws { code, .. } => RdsXferError::AwsError {
                message,
                code: code.clone(),
            },
            CoreError::StepFailed { .. } => RdsXferError::AwsError {
                message,
                code: None,
            },
        }
    }

    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            RdsXferError::ProfileNotFound { name } => vec![
                "List available profiles: rdsxfer profile list".to_string(),
                format!(
                    "Create profile '{}': rdsxfer profile set {} --access-key-id <key> --region <region>",
                    name, name
                ),
            ],
            RdsXferError::NoProfileConfigured { suggestion, .. } => vec![suggestion.clone()],
            RdsXferError::CredentialError { .. } => vec![
                "Check the profile: rdsxfer profile show <profile>".to_string(),
                "Credential triples use the form ACCESS_KEY:SECRET_KEY:REGION".to_string(),
            ],
            RdsXferError::AuthenticationFailed { .. } => vec![
                "Check the access key and secret: rdsxfer profile show <profile>".to_string(),
                "Make sure the keys are active and allowed to call sts:GetCallerIdentity and rds:*".to_string(),
            ],
            RdsXferError::AwsError { code: Some(code), .. } if code.contains("AlreadyExists") => vec![
                "A resource with this identifier already exists; delete it or copy under another cluster name".to_string(),
            ],
            RdsXferError::AwsError { code: Some(code), .. } if code.contains("NotFound") => vec![
                "Check the cluster identifier and that the source profile points at the right region".to_string(),
            ],
            RdsXferError::AwsError { code: Some(code), .. } if code.contains("Quota") => vec![
                "An account quota was reached; request an increase or free up capacity".to_string(),
            ],
            RdsXferError::NotFound { .. } => vec![
                "Check the cluster identifier and region".to_string(),
            ],
            RdsXferError::Timeout { .. } => vec![
                "Large clusters can take hours; raise --snapshot-timeout or --cluster-timeout".to_string(),
            ],
            RdsXferError::InvalidInput { .. } => vec![
                "Check the command syntax: rdsxfer copy --help".to_string(),
            ],
            RdsXferError::Cancelled => vec![
                "Pass --yes to run without confirmation".to_string(),
            ],
            RdsXferError::CopyFailed { cause, .. } => cause.suggestions(),
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let RdsXferError::NoProfileConfigured { role, .. } = self {
            diag = diag.detail(&format!(
                "Pass --{}-profile or --{}-credentials, or configure a default profile.",
                short_role(role),
                short_role(role)
            ));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        if let RdsXferError::CopyFailed { leftovers, .. } = self
            && !leftovers.is_empty()
        {
            diag = diag.tip(
                "these resources were created and are left in place:",
                leftovers,
            );
        }

        diag.print();
    }
}

fn short_role(role: &str) -> &str {
    match role {
        "destination" => "dest",
        other => other,
    }
}

impl From<CoreError> for RdsXferError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        Self::from_core(&err, message)
    }
}

impl From<ConfigError> for RdsXferError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => RdsXferError::ProfileNotFound { name },
            ConfigError::NoProfileForRole { role, suggestion } => {
                RdsXferError::NoProfileConfigured { role, suggestion }
            }
            ConfigError::CredentialError(message) => RdsXferError::CredentialError { message },
            other => RdsXferError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RdsXferError {
    fn from(err: serde_json::Error) -> Self {
        RdsXferError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for RdsXferError {
    fn from(err: std::io::Error) -> Self {
        RdsXferError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for RdsXferError {
    fn from(err: anyhow::Error) -> Self {
        RdsXferError::Configuration(format!("{:#}", err))
    }
}
