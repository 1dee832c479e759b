//! Command-line binary entrypoint for `splitfetch`.
//!
//! Parses arguments, merges them with the user's settings file and runs a
//! single download through the library engine with a progress bar.
mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use splitfetch::config::Settings;
use splitfetch::job::default_part_count;
use splitfetch::{ConsoleObserver, DownloadEngine, DownloadJob, DownloadMode};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the job from CLI flags, falling back to settings, then defaults.
fn build_job(args: &Args, settings: &Settings) -> Result<DownloadJob> {
    let parts = args
        .parts
        .or(settings.parts)
        .unwrap_or_else(default_part_count);
    let min_split = if args.single {
        0
    } else {
        args.min_split
            .or(settings.min_split)
            .unwrap_or(splitfetch::job::SPLIT_DEFAULT)
    };
    let max_workers = args.max_workers.or(settings.max_workers).unwrap_or(0).max(0) as usize;
    let memory_limit = args.memory_limit.or(settings.memory_limit);

    let mut job = DownloadJob::new(&args.url)?
        .part_count(parts)
        .min_split(min_split)
        .max_workers(max_workers)
        .memory_limit(memory_limit);

    job = match &args.output {
        Some(output) => job.target(output),
        None => {
            let dir = args
                .dir
                .clone()
                .or_else(|| settings.default_dir.clone())
                .unwrap_or_else(|| ".".to_string());
            let target = job.resolve_target_in(&PathBuf::from(dir));
            job.target(target)
        }
    };

    Ok(job)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            warn!("Ignoring settings file: {:#}", e);
            Settings::default()
        }
    };

    let job = build_job(&args, &settings)?;
    let target = job.resolve_target();
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let pool_size = job.max_workers.max(job.part_count);
    let client = settings.client(pool_size)?;

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n🛑 Received Ctrl+C. Stopping download...");
            signal_token.cancel();
        }
    });

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .context("Invalid progress template")?
        .progress_chars("=>-"),
    );
    pb.set_message(target.display().to_string());

    let engine = DownloadEngine::new(client)
        .with_observer(Arc::new(ConsoleObserver { pb: pb.clone() }))
        .with_cancellation(cancel_token);

    let report = match engine.execute(job).await {
        Ok(report) => report,
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e).with_context(|| {
                format!("Download failed; {} is incomplete", target.display())
            });
        }
    };

    let how = match report.mode {
        DownloadMode::Threaded { .. } => {
            format!("{} parts, {} workers", report.parts, report.workers)
        }
        DownloadMode::Direct => "single stream".to_string(),
    };
    println!(
        "✅ Finished {} ({}, {})",
        report.path.display(),
        HumanBytes(report.bytes_written),
        how
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["splitfetch", "--url", "https://example.com/files/disk.img"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn flags_override_settings() -> Result<()> {
        let settings = Settings {
            parts: Some(16),
            min_split: Some(1),
            ..Default::default()
        };
        let job = build_job(&args(&["-p", "6"]), &settings)?;
        assert_eq!(job.part_count, 6);
        assert_eq!(job.min_split, 1);
        Ok(())
    }

    #[test]
    fn single_forces_direct_copy() -> Result<()> {
        let job = build_job(&args(&["--single", "-s", "5"]), &Settings::default())?;
        assert!(!job.probe_enabled());
        Ok(())
    }

    #[test]
    fn negative_worker_cap_means_automatic() -> Result<()> {
        let job = build_job(&args(&["-w", "-3"]), &Settings::default())?;
        assert_eq!(job.max_workers, 0);
        Ok(())
    }

    #[test]
    fn derived_name_lands_in_dir() -> Result<()> {
        let job = build_job(&args(&["-D", "downloads"]), &Settings::default())?;
        assert_eq!(
            job.resolve_target(),
            PathBuf::from("downloads").join("disk.img")
        );

        let job = build_job(&args(&["-o", "x.img", "-D", "downloads"]), &Settings::default())?;
        assert_eq!(job.resolve_target(), PathBuf::from("x.img"));
        Ok(())
    }
}
