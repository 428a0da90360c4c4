use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

use tally_core::controller::Phase;
use tally_core::state::LocalCounterState;

static JSON_MODE: AtomicBool = AtomicBool::new(false);

/// Select the output mode and install the log subscriber (stderr only).
pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

pub fn eprintln_line(msg: &str) {
    let _ = writeln!(io::stderr(), "{msg}");
}

pub fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

/// Render the counter view for humans.
pub fn render(phase: Phase, state: &LocalCounterState) -> anyhow::Result<()> {
    let mut out = stdout();

    let (label, color) = match phase {
        Phase::Unconnected => ("Please connect a wallet (--keypair) to continue".to_string(), Color::Yellow),
        Phase::Unknown => ("Loading...".to_string(), Color::Cyan),
        Phase::Uninitialized => ("Counter needs to be initialized (tally init)".to_string(), Color::Yellow),
        Phase::Ready(n) => (format!("count = {n}"), Color::Green),
    };

    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{label}")?;
    out.reset()?;
    if state.busy {
        write!(out, " (busy)")?;
    }
    writeln!(out)?;
    Ok(())
}
