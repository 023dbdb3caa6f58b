#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `turntable` binary: load config, run one command on the simulator, report.

mod cli;
mod error_fmt;
mod scenario;

use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};
use turntable_config::{Config, Logging};

use crate::cli::{Cli, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{error_value, exit_code_for_error, format_error_json, humanize};
use crate::scenario::RunReport;

const DEFAULT_LOG_LEVEL: &str = "warn";

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    match real_main(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                // Structured errors go to stdout so JSON consumers see one object.
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            std::process::exit(exit_code_for_error(&e));
        }
    }
}

fn real_main(cli: Cli) -> Result<i32> {
    color_eyre::install()?;

    let (cfg, from_file) = load_config(&cli.config)?;
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_tracing(cli.json, level, &cfg.logging)?;
    if !from_file {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
    }
    cfg.validate().wrap_err("invalid configuration")?;

    let engine = scenario::build_engine(&cfg, cli.inventory.as_deref())?;
    let report = scenario::run(&cli.cmd, engine)?;

    let failure = report.failure.clone().map(eyre::Report::new);
    if cli.json {
        println!("{}", report_json(&report, failure.as_ref()));
    } else {
        print_human(&report);
    }
    Ok(match failure {
        Some(err) => {
            if !cli.json {
                eprintln!("{}", humanize(&err));
            }
            exit_code_for_error(&err)
        }
        None => 0,
    })
}

/// Read the config TOML; a missing file yields the built-in defaults.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = turntable_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    Ok((cfg, true))
}

fn init_tracing(json: bool, level: &str, logging: &Logging) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

fn report_json(report: &RunReport, failure: Option<&eyre::Report>) -> serde_json::Value {
    serde_json::json!({
        "ok": failure.is_none(),
        "command": report.command,
        "sim_ms": report.sim_ms,
        "target_qei": report.target_qei,
        "outcome": report.outcome,
        "error": failure.map(error_value),
        "state": report.snapshot,
    })
}

fn print_human(report: &RunReport) {
    let s = &report.snapshot;
    println!("{}: simulated {} ms", report.command, report.sim_ms);
    println!(
        "position: qei {} (motor {}), init step {}, initialized: {}",
        s.qei,
        s.motor,
        s.init_step,
        if s.initialized { "yes" } else { "no" }
    );
    if let Some(target) = report.target_qei {
        println!("target: qei {target}");
    }
    println!("inventory: {}/10 cards", s.inventory.card_count());
    for slot in s.inventory.iter() {
        match (slot.has_card, slot.qr_data.as_deref()) {
            (true, Some(qr)) => println!("  slot {}: card ({qr})", slot.index),
            (true, None) => println!("  slot {}: card", slot.index),
            (false, _) => println!("  slot {}: empty", slot.index),
        }
    }
    println!("event log:");
    for line in s.log.iter().rev() {
        println!("  {line}");
    }
    if report.failure.is_none() {
        println!("{} complete", report.command);
    }
}
