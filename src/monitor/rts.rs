//! RTS pin monitor.
//!
//! Samples the RTS modem-control line once per configured interval and
//! publishes a diagnostic message on every level change. The first sample
//! is always published so the server learns the initial state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::diag::{DiagChannel, DiagEvent};
use crate::props::keys::{PROP_IBOX_PORT, PROP_STATE_RTS_CHECK};
use crate::props::PropStore;
use crate::serial::{read_modem_lines, ModemLine};

const MINUTE: u64 = 60;

pub struct RtsMonitor {
	props: Arc<PropStore>,
	diag: Arc<DiagChannel>,
	stop: Arc<AtomicBool>,
}

impl RtsMonitor {
	pub fn new(props: Arc<PropStore>, diag: Arc<DiagChannel>, stop: Arc<AtomicBool>) -> Self {
		RtsMonitor { props, diag, stop }
	}

	/// Worker thread body.
	pub fn run(&self) {
		// interval property is in minutes
		let minutes = u64::from(self.props.get_u32_at(PROP_STATE_RTS_CHECK, 1, 1).max(1));
		let interval = Duration::from_secs(minutes * MINUTE);
		let device = self.props.get_string(PROP_IBOX_PORT, "/dev/ttyS1");
		let mut last = None;

		while !self.stop.load(Ordering::Relaxed) {
			match read_modem_lines(&device) {
				Ok(lines) => {
					let rts = lines.contains(ModemLine::RTS);
					if transition(&mut last, rts) {
						self.report(rts);
					}
				}
				Err(err) => error!("RTS sample on {device}: {err}"),
			}
			sleep_with_stop(&self.stop, interval);
		}
	}

	fn report(&self, rts: bool) {
		let message = format!("RTS Powered {}", if rts { "ON" } else { "OFF" });
		self.diag.report(DiagEvent::Message, 0, &message);
	}
}

/// Latch a sampled level against the previous one; true when this sample
/// must be published.
fn transition(last: &mut Option<bool>, current: bool) -> bool {
	if *last == Some(current) {
		false
	} else {
		*last = Some(current);
		true
	}
}

/// Sleep in one-second slices so a stop request is honored promptly.
pub(crate) fn sleep_with_stop(stop: &AtomicBool, total: Duration) {
	let mut remaining = total;
	while !remaining.is_zero() {
		if stop.load(Ordering::Relaxed) {
			return;
		}
		let slice = remaining.min(Duration::from_secs(1));
		thread::sleep(slice);
		remaining -= slice;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_sample_is_always_published() {
		let mut last = None;
		assert!(transition(&mut last, true));
		assert_eq!(last, Some(true));
	}

	#[test]
	fn only_level_changes_publish_after_that() {
		let mut last = None;
		assert!(transition(&mut last, true)); // "RTS Powered ON"
		assert!(!transition(&mut last, true)); // steady: silent
		assert!(transition(&mut last, false)); // "RTS Powered OFF"
		assert!(!transition(&mut last, false));
		assert!(!transition(&mut last, false));
		assert!(transition(&mut last, true));
	}
}
