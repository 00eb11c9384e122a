//! Wires the `log` macros up to stderr.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use anstyle::AnsiColor;
use log::{Level, LevelFilter, Metadata, Record};

static LOGGER: AgentLogger = AgentLogger;
static BOOT: OnceLock<Instant> = OnceLock::new();

/// Install the agent logger.
///
/// The level comes from the `DMTP_LOG` environment variable (`error`,
/// `warn`, `info`, `debug`, `trace`) and defaults to `info`.
pub fn init() {
	BOOT.get_or_init(Instant::now);
	let level = std::env::var("DMTP_LOG")
		.ok()
		.and_then(|v| v.parse::<LevelFilter>().ok())
		.unwrap_or(LevelFilter::Info);
	if log::set_logger(&LOGGER).is_ok() {
		log::set_max_level(level);
	}
}

struct AgentLogger;

impl log::Log for AgentLogger {
	fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
		true
	}

	fn log(&self, record: &Record<'_>) {
		if !self.enabled(record.metadata()) {
			return;
		}

		let color = match record.level() {
			Level::Error => AnsiColor::Red,
			Level::Warn => AnsiColor::Yellow,
			Level::Info => AnsiColor::Green,
			Level::Debug => AnsiColor::Cyan,
			Level::Trace => AnsiColor::Magenta,
		};
		let style = anstyle::Style::new().fg_color(Some(color.into()));

		let uptime = BOOT.get().map(|t| t.elapsed()).unwrap_or_default();
		let stderr = std::io::stderr();
		let mut stderr = stderr.lock();
		// a failed write to stderr is not worth dying over
		let _ = writeln!(
			stderr,
			"[{}.{:06}] {}{:5}{} {}",
			uptime.as_secs(),
			uptime.subsec_micros(),
			style.render(),
			record.level(),
			style.render_reset(),
			record.args()
		);
	}

	fn flush(&self) {}
}
