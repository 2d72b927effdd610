use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use logshield::config::Config;
use logshield::error::LogShieldError;
use logshield::output::OutputFormat;
use logshield::remediation::{self, StdoutClipboard};
use logshield::service::{HttpScanService, ScanService};
use logshield::session::{Completion, ScanSession};
use logshield::ScanOptions;

#[derive(Parser)]
#[command(
    name = "logshield",
    about = "Security audit for web-server access logs",
    version,
    author
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an access log to the scanning service and report the result
    Scan {
        /// Path to the log file
        file: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Scanning service base URL
        #[arg(long, short = 'e', env = "LOGSHIELD_ENDPOINT")]
        endpoint: Option<String>,

        /// Seconds to wait for the service
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format (console, json, html, pdf)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Also print a firewall ban command per attacking address
        #[arg(long)]
        bans: bool,
    },

    /// Render a previously captured service response without a network call
    Report {
        /// Path to the JSON response body
        response: PathBuf,

        /// Output format (console, json, html, pdf)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print the ban command for one address
    Ban {
        /// Source address to block
        address: String,
    },

    /// Check that the scanning service is reachable
    Ping {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Scanning service base URL
        #[arg(long, short = 'e', env = "LOGSHIELD_ENDPOINT")]
        endpoint: Option<String>,
    },

    /// Generate a starter .logshield.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Scan {
            file,
            config,
            endpoint,
            timeout,
            format,
            output,
            bans,
        } => cmd_scan(
            file,
            ScanOptions {
                config_path: config,
                endpoint_override: endpoint,
                timeout_override: timeout,
            },
            format,
            output,
            bans,
        ),
        Commands::Report {
            response,
            format,
            output,
        } => cmd_report(response, format, output),
        Commands::Ban { address } => cmd_ban(address),
        Commands::Ping { config, endpoint } => cmd_ping(ScanOptions {
            config_path: config,
            endpoint_override: endpoint,
            timeout_override: None,
        }),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn parse_format(format_str: &str) -> OutputFormat {
    OutputFormat::from_str_lenient(format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    })
}

fn cmd_scan(
    file: PathBuf,
    options: ScanOptions,
    format_str: String,
    output_path: Option<PathBuf>,
    bans: bool,
) -> Result<i32, LogShieldError> {
    let format = parse_format(&format_str);
    let config = logshield::load_config(&options)?;

    let mut session = ScanSession::new();
    let completion = logshield::run_scan(&mut session, &file, &config)?;
    let exit_code = finish(&mut session, completion, format, output_path, &config)?;

    if bans && exit_code != 2 {
        if let Some(result) = session.result() {
            for command in remediation::ban_list(&result.threats) {
                println!("{}", command);
            }
        }
    }
    Ok(exit_code)
}

fn cmd_report(
    response: PathBuf,
    format_str: String,
    output_path: Option<PathBuf>,
) -> Result<i32, LogShieldError> {
    let format = parse_format(&format_str);
    let mut session = ScanSession::new();
    let completion = logshield::replay_response(&mut session, &response)?;
    finish(&mut session, completion, format, output_path, &Config::default())
}

/// Print notices, export the displayed result, and pick the exit code:
/// 0 healthy, 1 at risk, 2 scan failed.
fn finish(
    session: &mut ScanSession,
    completion: Option<Completion>,
    format: OutputFormat,
    output_path: Option<PathBuf>,
    config: &Config,
) -> Result<i32, LogShieldError> {
    if completion != Some(Completion::Displayed) {
        print_notices(session);
        return Ok(2);
    }

    let rendered = session.export(format, chrono::Utc::now());
    print_notices(session);
    let rendered = rendered?;

    let target = output_path.or_else(|| {
        format
            .is_binary()
            .then(|| binary_report_path(&config.report.output, format))
    });
    match target {
        Some(path) => write_report(&path, &rendered, format)?,
        None => print!("{}", String::from_utf8_lossy(&rendered)),
    }

    Ok(if session.health().is_healthy() { 0 } else { 1 })
}

/// The configured report path when its extension matches `format`,
/// otherwise the format's default file name.
fn binary_report_path(configured: &str, format: OutputFormat) -> PathBuf {
    let path = PathBuf::from(configured);
    let matches = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(format.extension()));
    if matches {
        path
    } else {
        PathBuf::from(format.default_file_name())
    }
}

fn write_report(path: &Path, bytes: &[u8], format: OutputFormat) -> Result<(), LogShieldError> {
    std::fs::write(path, bytes).map_err(|e| LogShieldError::Export {
        format: format.to_string(),
        message: format!("{}: {}", path.display(), e),
    })?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

fn print_notices(session: &mut ScanSession) {
    for notice in session.take_notices() {
        eprintln!("{}", notice);
    }
}

fn cmd_ban(address: String) -> Result<i32, LogShieldError> {
    let mut clipboard = StdoutClipboard::new();
    let notice = remediation::copy_ban_command(&mut clipboard, &address)?;
    eprintln!("{}", notice);
    eprintln!("Review before running: the address is copied verbatim from the scanned log.");
    Ok(0)
}

fn cmd_ping(options: ScanOptions) -> Result<i32, LogShieldError> {
    let config = logshield::load_config(&options)?;
    let service = HttpScanService::new(&config.service)?;
    let message = service.health()?;
    println!("{} ({})", message, config.service.endpoint);
    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, LogShieldError> {
    let path = PathBuf::from(".logshield.toml");

    if path.exists() && !force {
        eprintln!(".logshield.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .logshield.toml");

    Ok(0)
}
