use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

use ktop::core::config::MonitorConfig;
use ktop::ui::monitor_tui::{run_json_output, run_monitor_app};

fn cli() -> Command {
    Command::new("ktop")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal resource monitor for hybrid CPU/GPU workloads")
        .arg(
            Arg::new("refresh")
                .short('r')
                .long("refresh")
                .value_name("SECONDS")
                .help("Refresh interval in seconds (fractions allowed)")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("top")
                .short('n')
                .long("top")
                .value_name("COUNT")
                .help("Number of processes in each table")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON snapshot per refresh instead of the TUI")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Write debug logs to this file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Config file (default: <config dir>/ktop/config.json)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

/// Load the config file and apply command-line overrides
fn load_config(matches: &ArgMatches) -> Result<MonitorConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => MonitorConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::load().context("Failed to load config")?,
    };

    if let Some(&secs) = matches.get_one::<f64>("refresh") {
        if !secs.is_finite() || secs <= 0.0 {
            anyhow::bail!("--refresh must be a positive number of seconds");
        }
        config.refresh_ms = ((secs * 1000.0).round() as u64).max(1);
    }
    if let Some(&top) = matches.get_one::<usize>("top") {
        config.top_processes = top;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let log_file = matches.get_one::<PathBuf>("log-file");
    let level = if log_file.is_some() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    ktop::init_logging(level, log_file.map(PathBuf::as_path)).context("Failed to set up logging")?;

    let config = load_config(&matches)?;
    log::debug!("Effective config: {:?}", config);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install interrupt handler")?;

    if matches.get_flag("json") {
        run_json_output(config, interrupted)
    } else {
        run_monitor_app(config, interrupted).context("Failed to run system monitor")
    }
}
