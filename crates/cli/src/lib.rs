//! Command-line front-end for the VelocityDRIVE-SP TSN configuration
//! client.
//!
//! This crate owns nothing transport- or protocol-specific: it parses
//! flags into an `engine`/`transport` configuration, calls the matching
//! operation, and renders the result (or a one-line error) to stdout or
//! stderr.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use transport::{RequestOptions, SerialTransport, Transport, UdpOptions, UdpTransport};

/// `keti-tsn <fetch|patch|get|put> [--transport serial|wifi] [--device PATH] [--host HOST] [--port N] [--verbose]`
#[derive(Parser, Debug)]
#[command(name = "keti-tsn", about = "Configure a VelocityDRIVE-SP TSN switch over MUP1/CoAP")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, value_enum, default_value_t = TransportKind::Serial)]
    transport: TransportKind,

    #[arg(long)]
    device: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransportKind {
    Serial,
    Wifi,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one or more YANG paths and print the decoded result.
    Fetch { paths: Vec<String> },
    /// Apply `path=value` patches, one iPATCH per entry.
    Patch { entries: Vec<String> },
    /// Replace the full datastore with the contents of a CBOR file.
    Put { file: PathBuf },
    /// Retrieve the full datastore.
    Get,
}

/// Parses `args`, runs the requested operation, and writes output to
/// `stdout`/`stderr`. Returns the process exit code.
pub fn run<I, T, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = write!(stderr, "{e}");
            return if e.use_stderr() { 2 } else { 0 };
        }
    };

    logging::init(logging::VerbosityConfig::new(cli.verbose));

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = writeln!(stderr, "error: failed to start async runtime: {e}");
            return 1;
        }
    };

    match runtime.block_on(run_command(&cli)) {
        Ok(rendered) => {
            let _ = writeln!(stdout, "{rendered}");
            0
        }
        Err(e) => {
            let _ = writeln!(stderr, "error: {e}");
            exit_code_for(&e)
        }
    }
}

async fn run_command(cli: &Cli) -> Result<String, engine::Error> {
    let mut transport = connect(cli).await?;
    let opts = RequestOptions::default();

    let rendered = match &cli.command {
        Command::Fetch { paths } => {
            let value = engine::fetch(transport.as_mut(), paths, &opts).await?;
            format!("{value:?}")
        }
        Command::Patch { entries } => {
            let patches = entries
                .iter()
                .map(|entry| parse_patch_entry(entry))
                .collect::<Vec<_>>();
            let outcomes = engine::patch(transport.as_mut(), &patches, &opts).await?;
            outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(()) => format!("{}: ok", o.path),
                    Err(e) => format!("{}: failed ({e})", o.path),
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Put { file } => {
            let bytes = std::fs::read(file).map_err(|e| engine::Error::from(transport::Error::Io(e)))?;
            engine::put(transport.as_mut(), &bytes, &opts).await?;
            "ok".to_string()
        }
        Command::Get => {
            let result = engine::get(transport.as_mut(), &opts).await?;
            format!("{} bytes: {:?}", result.byte_count(), result.decoded)
        }
    };

    transport.disconnect().await;
    Ok(rendered)
}

async fn connect(cli: &Cli) -> Result<Box<dyn Transport>, engine::Error> {
    let mut transport: Box<dyn Transport> = match cli.transport {
        TransportKind::Serial => {
            let device = cli.device.clone().unwrap_or_else(|| PathBuf::from("/dev/ttyACM0"));
            Box::new(SerialTransport::new(transport::SerialOptions::new(device)))
        }
        TransportKind::Wifi => {
            let host = cli.host.clone().unwrap_or_else(|| "192.168.1.1".to_string());
            let mut options = UdpOptions::new(host);
            if let Some(port) = cli.port {
                options.port = port;
            }
            Box::new(UdpTransport::new(options))
        }
    };

    transport.connect().await.map_err(engine::Error::from)?;
    transport
        .wait_for_ready(Duration::from_secs(30))
        .await
        .map_err(engine::Error::from)?;
    Ok(transport)
}

fn parse_patch_entry(entry: &str) -> engine::PatchEntry {
    match entry.split_once('=') {
        Some((path, value)) => engine::PatchEntry {
            path: path.to_string(),
            value: serde_cbor::Value::Text(value.to_string()),
        },
        None => engine::PatchEntry {
            path: entry.to_string(),
            value: serde_cbor::Value::Null,
        },
    }
}

/// Maps the error taxonomy of §7 onto a process exit code.
fn exit_code_for(error: &engine::Error) -> i32 {
    match error {
        engine::Error::Transport(transport::Error::NotConnected) => 10,
        engine::Error::Transport(transport::Error::NotReady) => 11,
        engine::Error::Transport(transport::Error::Io(_) | transport::Error::SerialOpen(_)) => 12,
        engine::Error::Transport(transport::Error::Timeout) => 13,
        engine::Error::Transport(transport::Error::Disconnected) => 14,
        engine::Error::Transport(transport::Error::CoapDecode(_)) => 15,
        engine::Error::Protocol(_) => 16,
        engine::Error::Device { .. } => 17,
        engine::Error::CborEncode(_) => 18,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_entry_without_equals_uses_null_value() {
        let entry = parse_patch_entry("/a/b");
        assert_eq!(entry.path, "/a/b");
        assert_eq!(entry.value, serde_cbor::Value::Null);
    }

    #[test]
    fn patch_entry_splits_on_first_equals() {
        let entry = parse_patch_entry("/a=b=c");
        assert_eq!(entry.path, "/a");
        assert_eq!(entry.value, serde_cbor::Value::Text("b=c".to_string()));
    }

    #[test]
    fn help_flag_exits_cleanly() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(["keti-tsn", "--help"], &mut out, &mut err);
        assert_eq!(code, 0);
    }

    #[test]
    fn missing_subcommand_is_a_usage_error() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(["keti-tsn"], &mut out, &mut err);
        assert_eq!(code, 2);
    }
}
