//! Tracing subscriber setup.
//!
//! Warnings and errors go to stderr, everything else to stdout. An optional
//! UDP log server receives a JSON copy of every record at INFO and above.

use std::io::{self, IsTerminal};
use std::net::UdpSocket;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use crate::core::config::parse_bool;
use crate::core::constants;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber from `VAULT_LOG_LEVEL`, `VAULT_JSON_LOG`
/// and `VAULT_ENV_LOG_SERVER`.
pub fn init() {
    let level = parse_level(std::env::var(constants::VAULT_LOG_LEVEL).ok().as_deref());
    let json = std::env::var(constants::VAULT_JSON_LOG)
        .map(|v| parse_bool(&v))
        .unwrap_or(false);

    let mut layers: Vec<BoxedLayer> = vec![console_layer(json)];

    // An unreachable log server is not worth failing startup over.
    if let Some(writer) = std::env::var(constants::VAULT_ENV_LOG_SERVER)
        .ok()
        .and_then(|addr| UdpWriter::connect(&addr).ok())
    {
        layers.push(udp_layer(writer));
    }

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("");

    // A subscriber installed by the test harness wins.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}

/// Parse a log level name. Unknown or missing values fall back to INFO.
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") => LevelFilter::TRACE,
        Some("debug") => LevelFilter::DEBUG,
        Some("warn") | Some("warning") => LevelFilter::WARN,
        Some("error") => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn console_layer(json: bool) -> BoxedLayer {
    let writer = io::stderr
        .with_max_level(Level::WARN)
        .or_else(io::stdout);

    if json {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_current_span(false)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_ansi(use_color())
            .with_writer(writer)
            .boxed()
    }
}

/// Colors only when both console streams are terminals.
fn use_color() -> bool {
    io::stdout().is_terminal() && io::stderr().is_terminal()
}

fn udp_layer(writer: UdpWriter) -> BoxedLayer {
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(Mutex::new(writer).with_max_level(Level::INFO))
        .boxed()
}

/// Datagram sink, one record per datagram.
struct UdpWriter {
    socket: UdpSocket,
}

impl UdpWriter {
    fn connect(addr: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(addr)?;
        Ok(Self { socket })
    }
}

impl io::Write for UdpWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Dropped datagrams are not worth failing a log call over.
        let _ = self.socket.send(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
