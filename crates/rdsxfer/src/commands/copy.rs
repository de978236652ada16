//! `rdsxfer copy` - resolve, confirm and run a cross-account cluster copy

use std::time::Duration;

use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rdsxfer_core::config::{CopyDefaults, ProfileRole};
use rdsxfer_core::{
    CopyClusterParams, CopyPlan, CopyReport, CopyStage, ProgressCallback, ProgressEvent,
    WaitOptions, execute_plan, plan_copy,
};
use tracing::{debug, info};

use crate::cli::{CopyArgs, OutputFormat};
use crate::commands::confirm_action;
use crate::connection::ConnectionManager;
use crate::error::{RdsXferError, Result as CliResult};
use crate::output::{self, print_output};

/// Handle `rdsxfer copy`
pub async fn handle_copy(
    args: &CopyArgs,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    let params = build_params(args, &conn_mgr.config.copy)?;
    params.validate()?;
    debug!(?params, "Copy parameters");

    let source = conn_mgr
        .connect(
            ProfileRole::Source,
            args.source_profile.as_deref(),
            args.source_credentials.as_ref(),
        )
        .await?;
    let destination = conn_mgr
        .connect(
            ProfileRole::Destination,
            args.dest_profile.as_deref(),
            args.dest_credentials.as_ref(),
        )
        .await?;

    let plan = plan_copy(&source, &destination, &params).await?;

    if args.dry_run {
        print_output(
            &plan,
            output::OutputFormat::resolve(output_format, output::OutputFormat::Table),
        )?;
        if !output_format.is_structured() {
            println!("Dry run: nothing was created.");
        }
        return Ok(());
    }

    if !output_format.is_structured() {
        print_output(&plan, output::OutputFormat::Table)?;
    }

    if !args.yes {
        let prompt = format!(
            "Copy cluster '{}' from account {} ({}) to account {} ({})?",
            plan.cluster_id,
            plan.source_account_id,
            plan.source_region,
            plan.destination_account_id,
            plan.destination_region
        );
        if !confirm_action(&prompt, "--yes")? {
            return Err(RdsXferError::Cancelled);
        }
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .map_err(|e| RdsXferError::OutputError {
                message: e.to_string(),
            })?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let callback = progress_callback(pb.clone(), &plan, !output_format.is_structured());

    info!(cluster = %plan.cluster_id, "Starting copy");
    match execute_plan(&source, &destination, plan.clone(), params.wait, Some(callback)).await {
        Ok(report) => {
            pb.finish_and_clear();
            print_report(&report, output_format)
        }
        Err(e) => {
            pb.abandon_with_message(format!("{}", "Copy failed".red()));
            Err(RdsXferError::copy_failed(e, &plan))
        }
    }
}

/// Merge flags with `[copy]` config defaults
///
/// Flags win. Engine, engine version and instance class must come from one
/// of the two; the rest fall back to built-in defaults.
pub fn build_params(args: &CopyArgs, defaults: &CopyDefaults) -> CliResult<CopyClusterParams> {
    let engine = required("--engine", &args.engine, &defaults.engine)?;
    let engine_version = required("--engine-version", &args.engine_version, &defaults.engine_version)?;
    let instance_class = required("--instance-class", &args.instance_class, &defaults.instance_class)?;

    let mut wait = WaitOptions::default();
    if let Some(secs) = args.snapshot_timeout.or(defaults.snapshot_timeout_secs) {
        wait.snapshot_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.cluster_timeout.or(defaults.cluster_timeout_secs) {
        wait.cluster_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.poll_interval.or(defaults.poll_interval_secs) {
        wait.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.instance_timeout {
        wait.instance_timeout = Duration::from_secs(secs);
    }
    wait.wait_for_instance = args.wait_instance;

    let mut params = CopyClusterParams::new(&args.cluster, engine, engine_version, instance_class)
        .with_public_access(!args.no_public)
        .with_wait(wait);
    if let Some(subnet_group) = args
        .subnet_group
        .clone()
        .or_else(|| defaults.subnet_group.clone())
    {
        params = params.with_subnet_group(subnet_group);
    }
    Ok(params)
}

fn required(flag: &str, value: &Option<String>, default: &Option<String>) -> CliResult<String> {
    value
        .clone()
        .or_else(|| default.clone())
        .ok_or_else(|| RdsXferError::InvalidInput {
            message: format!(
                "{} is required (pass it or set it under [copy] in the config file)",
                flag
            ),
        })
}

/// Spinner updates for each workflow event
fn progress_callback(pb: ProgressBar, plan: &CopyPlan, print_arn: bool) -> ProgressCallback {
    let arn = plan.snapshot_arn.to_string();
    let cluster = plan.cluster_id.clone();
    let snapshot = plan.snapshot_name.clone();
    let instance = plan.instance_name.clone();

    Box::new(move |event: ProgressEvent| match event {
        ProgressEvent::Stage { stage } => {
            let message = match stage {
                CopyStage::Init => "Resolving accounts".to_string(),
                CopyStage::SnapshotCreating => format!("Creating snapshot {}", snapshot),
                CopyStage::SnapshotAvailable => format!("Sharing snapshot {}", snapshot),
                CopyStage::SnapshotShared => {
                    if print_arn {
                        pb.suspend(|| println!("Snapshot ARN: {}", arn));
                    }
                    format!("Snapshot {} shared", snapshot)
                }
                CopyStage::ClusterRestoring => format!("Restoring cluster {}", cluster),
                CopyStage::ClusterAvailable => format!("Cluster {} available", cluster),
                CopyStage::InstanceCreating => format!("Creating instance {}", instance),
                CopyStage::Done => "Done".to_string(),
            };
            pb.set_message(message);
        }
        ProgressEvent::Polling {
            resource,
            status,
            elapsed,
        } => {
            pb.set_message(format!("{}: {} ({}s)", resource, status, elapsed.as_secs()));
        }
        ProgressEvent::Available { resource, elapsed } => {
            pb.println(format!(
                "{} {} available after {}s",
                "\u{2713}".green(),
                resource,
                elapsed.as_secs()
            ));
        }
        ProgressEvent::Failed { resource, error } => {
            pb.println(format!("{} {}: {}", "\u{2717}".red(), resource, error));
        }
    })
}

fn print_report(report: &CopyReport, output_format: OutputFormat) -> CliResult<()> {
    if output_format.is_structured() {
        print_output(
            report,
            output::OutputFormat::resolve(output_format, output::OutputFormat::Json),
        )?;
        return Ok(());
    }

    println!(
        "{} Cluster {} copied to account {} in {}s",
        "\u{2713}".green(),
        report.plan.cluster_id.bold(),
        report.plan.destination_account_id,
        report.elapsed_secs
    );
    println!(
        "  Started:  {}",
        report.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Finished: {}",
        report.finished_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Cluster status:  {}", report.cluster_status);
    match &report.instance_status {
        Some(status) => println!("  Instance {}: {}", report.plan.instance_name, status),
        None => println!(
            "  Instance {} is being created (not waited for)",
            report.plan.instance_name
        ),
    }
    println!("  Snapshot {} remains in account {}", report.plan.snapshot_name, report.plan.source_account_id);
    Ok(())
}
