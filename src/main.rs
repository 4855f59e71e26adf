use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::process;
use tokio::sync::mpsc;

use hostsweep::{
    config::ScanConfig,
    output::{OutputConfig, OutputFormat, OutputManager},
    utils::Logger,
    HostRange, PortSpec, ScanCoordinator, ScanError,
};

/// Exit code used when the scan is interrupted with Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

fn build_cli() -> Command {
    Command::new("hostsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Find live hosts in an IPv4 range and the TCP ports they have open")
        .arg(
            Arg::new("target")
                .help("Network to scan in CIDR notation, e.g. 192.168.1.0/24")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("ports")
                .value_name("PORTS")
                .help("Ports to probe on live hosts, e.g. 22,80,8000-8100"),
        )
        .arg(
            Arg::new("liveness-timeout")
                .long("liveness-timeout")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Per-host reachability deadline in milliseconds [default: 1000]"),
        )
        .arg(
            Arg::new("port-timeout")
                .long("port-timeout")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("Per-port connection deadline in milliseconds [default: 500]"),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Maximum number of probes in flight [default: 50]"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file [default: ~/.hostsweep.toml]"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json", "greppable"])
                .help("Output format"),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .value_name("FILE")
                .help("Write the final report to FILE instead of stdout"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("Disable colored output"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
}

/// File configuration first, command line flags on top
fn resolve_config(matches: &ArgMatches) -> anyhow::Result<ScanConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScanConfig::from_toml_file(path)
            .with_context(|| format!("Could not load configuration from {}", path))?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(&ms) = matches.get_one::<u64>("liveness-timeout") {
        config = config.with_liveness_timeout(ms);
    }
    if let Some(&ms) = matches.get_one::<u64>("port-timeout") {
        config = config.with_port_timeout(ms);
    }
    if let Some(&n) = matches.get_one::<usize>("concurrency") {
        config = config.with_max_concurrency(n);
    }

    config.validate()?;
    Ok(config)
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let target = matches
        .get_one::<String>("target")
        .context("missing target")?;

    // Validate every input before a single probe goes out
    let range = HostRange::parse(target)?;
    let ports = matches
        .get_one::<String>("ports")
        .map(|spec| PortSpec::parse(spec))
        .transpose()?;
    let config = resolve_config(matches)?;

    let format: OutputFormat = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("text")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let output = OutputManager::new(OutputConfig {
        format,
        file: matches.get_one::<String>("output-file").cloned(),
        colored: !matches.get_flag("no-color"),
    });

    log::debug!("Using {:?}", config);
    if format.is_incremental() {
        println!("{}", output.format_header(target));
    }
    log::info!("{} usable hosts in {}", range.len(), range);

    let coordinator = ScanCoordinator::new(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    // The sender lives inside the scan future, so the printer ends with it
    let scan = coordinator.scan_with_events(target, ports.as_ref(), tx);
    let printer = async {
        while let Some(event) = rx.recv().await {
            if let Some(line) = output.format_event(&event) {
                println!("{}", line);
            }
        }
    };

    let (report, ()) = tokio::join!(scan, printer);
    let report = report?;

    output
        .write_report(&report)
        .context("Failed to write scan report")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    Logger::init(Logger::level_for_verbosity(matches.get_count("verbose")));
    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }

    tokio::select! {
        result = run(&matches) => {
            if let Err(e) = result {
                eprintln!("{} {:#}", "[!] Error:".bright_red(), e);
                let code = e.downcast_ref::<ScanError>().map_or(2, ScanError::exit_code);
                process::exit(code);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{}", "[!] Scan interrupted".bright_yellow());
            process::exit(EXIT_INTERRUPTED);
        }
    }
}
