//! Alive heartbeat.
//!
//! Touches a well-known filesystem path every `sta.alive.intrvl` seconds so
//! an external supervisor can observe that the agent process is scheduled
//! and making progress.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::props::keys::PROP_STATE_ALIVE_INTRVL;
use crate::props::PropStore;

pub const ALIVE_PATH: &str = "/tmp/dmtp_alive";

pub struct AliveHeartbeat {
	props: Arc<PropStore>,
	stop: Arc<AtomicBool>,
	path: PathBuf,
}

impl AliveHeartbeat {
	pub fn new(props: Arc<PropStore>, stop: Arc<AtomicBool>) -> Self {
		AliveHeartbeat {
			props,
			stop,
			path: PathBuf::from(ALIVE_PATH),
		}
	}

	/// Worker thread body.
	pub fn run(&self) {
		let mut counter: u32 = 0;
		while !self.stop.load(Ordering::Relaxed) {
			let interval = self.props.get_u32(PROP_STATE_ALIVE_INTRVL, 30).max(1);
			if counter >= interval {
				if let Err(err) = touch(&self.path) {
					error!("cannot touch {}: {err}", self.path.display());
					return;
				}
				counter = 0;
			}
			counter += 1;
			thread::sleep(Duration::from_secs(1));
		}
	}
}

/// Create the file if absent and bump its modification time.
fn touch(path: &Path) -> io::Result<()> {
	let file = OpenOptions::new().create(true).write(true).open(path)?;
	file.set_len(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn touch_creates_and_refreshes() {
		let path = std::env::temp_dir().join(format!("dmtp_alive_test_{}", std::process::id()));
		let _ = std::fs::remove_file(&path);

		touch(&path).unwrap();
		let first = std::fs::metadata(&path).unwrap().modified().unwrap();
		thread::sleep(Duration::from_millis(50));
		touch(&path).unwrap();
		let second = std::fs::metadata(&path).unwrap().modified().unwrap();
		assert!(second >= first);

		std::fs::remove_file(&path).unwrap();
	}
}
