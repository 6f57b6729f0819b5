use clap::Parser;
use futures::StreamExt;
use serial_byte_writer::codec::{hex_preview, parse_terminator, InputFormat};
use serial_byte_writer::config::{Config, ConfigLoader, LogFormat, LoggingConfig, SerialConfig};
use serial_byte_writer::input::{pump_lines, InputSettings};
use serial_byte_writer::port::{list_ports, SharedPort};
use serial_byte_writer::{AppError, SerialByteWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Buffers queued between stdin and the writer.
const INPUT_QUEUE_DEPTH: usize = 64;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-writer",
    version,
    about = "Writes lines from stdin to a serial port.",
    long_about = "Reads lines from stdin, turns each into a byte buffer (text plus terminator, or hex), and writes it to the current serial port. A line of the form ':port NAME' switches all later lines to another port."
)]
struct Args {
    /// Configuration file (defaults to the standard search path).
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port to open at startup. Aliases from the config file are resolved.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// How input lines are decoded.
    #[arg(short, long, value_enum)]
    format: Option<InputFormat>,

    /// Terminator appended to text lines, e.g. '\r\n'.
    #[arg(short, long)]
    terminator: Option<String>,

    /// Log level filter, overridden by RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    /// Treat every line as payload; disables ':port' commands.
    #[arg(long)]
    raw: bool,

    /// Do not echo forwarded buffers.
    #[arg(short, long)]
    quiet: bool,

    /// Emit machine-readable JSON output.
    #[arg(long)]
    json: bool,

    /// List available serial ports and exit.
    #[arg(long)]
    list: bool,

    /// Write the effective configuration to PATH and exit.
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let mut loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    apply_cli_overrides(loader.config_mut(), &args);
    loader.config().validate()?;
    let config = loader.config().clone();

    init_logging(&config.logging);
    match &loader.config_path {
        Some(path) => debug!("Loaded configuration from {}", path.display()),
        None => debug!("Using built-in configuration defaults"),
    }

    if let Some(path) = &args.save_config {
        loader.save_to(path)?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    if args.list {
        return print_ports(args.json);
    }

    let port_config = config.serial.port_configuration();
    let settings = InputSettings {
        format: config.input.format,
        terminator: parse_terminator(&config.input.terminator)?,
        commands: !args.raw,
    };

    let (port_tx, port_rx) = mpsc::unbounded_channel();
    match initial_port(&config.serial, args.raw)? {
        Some(name) => {
            port_tx.send(SharedPort::open(&name, &port_config)?).ok();
        }
        None => warn!("No port open yet; input is dropped until a ':port NAME' line"),
    }

    let (buf_tx, buf_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
    let (stop_tx, stop_rx) = watch::channel(false);

    let writer = SerialByteWriter::new().with_shutdown(stop_rx);
    let stats = writer.stats();
    let mut forwarded = writer.attach(
        ReceiverStream::new(buf_rx),
        UnboundedReceiverStream::new(port_rx),
    );

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing current write");
            let _ = stop_tx.send(true);
        }
    });

    let serial = config.serial.clone();
    let pump = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        pump_lines(stdin, &settings, buf_tx, port_tx, move |name| {
            SharedPort::open(&serial.resolve_port(name), &port_config)
        })
        .await
    });

    let mut outcome = Ok(());
    while let Some(item) = forwarded.next().await {
        match item {
            Ok(buffer) if !args.quiet && !args.json => {
                println!("-> {} byte(s): {}", buffer.len(), hex_preview(&buffer, 16));
            }
            Ok(_) => {}
            Err(e) => outcome = Err(AppError::from(e)),
        }
    }
    drop(forwarded);

    // The pump may be parked on a stdin read that will never complete.
    if pump.is_finished() {
        match pump.await {
            Ok(Ok(summary)) => debug!("Input finished: {:?}", summary),
            Ok(Err(e)) => warn!("Reading input failed: {}", e),
            Err(e) => warn!("Input task failed: {}", e),
        }
    } else {
        pump.abort();
    }

    let stats = stats.snapshot();
    info!(
        "Forwarded {} buffer(s), {} byte(s); dropped {}",
        stats.buffers_forwarded, stats.bytes_written, stats.buffers_dropped
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    outcome
}

fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(port) = &args.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }
    if let Some(format) = args.format {
        config.input.format = format;
    }
    if let Some(terminator) = &args.terminator {
        config.input.terminator = terminator.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
}

/// Resolved name of the port to open at startup.
///
/// Without `:port` commands there is no way to pick a port later, so raw mode
/// requires one up front.
fn initial_port(serial: &SerialConfig, raw: bool) -> Result<Option<String>, AppError> {
    match &serial.port {
        Some(name) => Ok(Some(serial.resolve_port(name))),
        None if raw => Err(AppError::NoPortSpecified),
        None => Ok(None),
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Warning: logging not initialized: {e}");
    }
}

fn print_ports(json: bool) -> Result<(), AppError> {
    let ports = list_ports()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
    } else if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        for port in ports {
            println!("{}\t{}", port.name, port.kind);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("serial-writer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_flags_override_config() {
        let mut config = Config::default();
        config.serial.port = Some("COM1".to_string());
        config.serial.baud = 9600;
        config.input.terminator = "\\r\\n".to_string();

        let args = parse(&["--port", "bpod", "--baud", "57600", "--format", "hex", "--log-level", "debug"]);
        apply_cli_overrides(&mut config, &args);

        assert_eq!(config.serial.port.as_deref(), Some("bpod"));
        assert_eq!(config.serial.baud, 57600);
        assert_eq!(config.input.format, InputFormat::Hex);
        assert_eq!(config.logging.level, "debug");
        // Flags that were not given leave the config alone
        assert_eq!(config.input.terminator, "\\r\\n");
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        config.serial.baud = 9600;
        let before = config.clone();

        apply_cli_overrides(&mut config, &parse(&[]));
        assert_eq!(config, before);
    }

    #[test]
    fn test_raw_mode_requires_a_port() {
        let serial = SerialConfig::default();
        assert!(matches!(
            initial_port(&serial, true),
            Err(AppError::NoPortSpecified)
        ));
        assert_eq!(initial_port(&serial, false).unwrap(), None);
    }

    #[test]
    fn test_initial_port_resolves_alias() {
        let mut serial = SerialConfig::default();
        serial.port = Some("bpod".to_string());
        serial
            .port_aliases
            .insert("bpod".to_string(), "/dev/ttyACM0".to_string());

        assert_eq!(
            initial_port(&serial, true).unwrap().as_deref(),
            Some("/dev/ttyACM0")
        );
    }
}
