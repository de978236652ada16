use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use rdsxfer_core::Config;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::RdsXferError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "rdsxfer=warn,rdsxfer_core=warn",
            1 => "rdsxfer=info,rdsxfer_core=info",
            2 => "rdsxfer=debug,rdsxfer_core=debug",
            _ => "rdsxfer=trace,rdsxfer_core=trace,aws_config=debug,aws_smithy_runtime=debug",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), RdsXferError> {
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            if cli.output.is_structured() {
                let output_data = serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                });
                output::print_output(
                    &output_data,
                    output::OutputFormat::resolve(cli.output, output::OutputFormat::Json),
                )?;
            } else {
                println!("rdsxfer {}", env!("CARGO_PKG_VERSION"));
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }
        Commands::Copy(args) => commands::copy::handle_copy(args, conn_mgr, cli.output).await,
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for logging (without credentials)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name, .. } => format!("profile remove {}", name),
                DefaultSource { name } => format!("profile default-source {}", name),
                DefaultDest { name } => format!("profile default-dest {}", name),
            }
        }
        Commands::Copy(args) => {
            let mut line = format!("copy {}", args.cluster);
            if let Some(profile) = &args.source_profile {
                line.push_str(&format!(" --source-profile {}", profile));
            }
            if let Some(profile) = &args.dest_profile {
                line.push_str(&format!(" --dest-profile {}", profile));
            }
            if args.source_credentials.is_some() || args.dest_credentials.is_some() {
                line.push_str(" [credentials redacted]");
            }
            if args.dry_run {
                line.push_str(" --dry-run");
            }
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn format_copy_redacts_credentials() {
        let cli = parse(&[
            "rdsxfer",
            "copy",
            "orders-db",
            "--source-credentials",
            "AKIAEXAMPLE:topsecret:us-east-1",
            "--dest-profile",
            "staging",
        ]);
        let line = format_command(&cli.command);
        assert_eq!(line, "copy orders-db --dest-profile staging [credentials redacted]");
        assert!(!line.contains("topsecret"));
    }

    #[test]
    fn format_profile_set_redacts_credentials() {
        let cli = parse(&[
            "rdsxfer",
            "profile",
            "set",
            "prod",
            "--access-key-id",
            "AKIAEXAMPLE",
            "--secret-access-key",
            "topsecret",
            "--region",
            "us-east-1",
        ]);
        let line = format_command(&cli.command);
        assert_eq!(line, "profile set prod [credentials redacted]");
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
