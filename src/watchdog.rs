//! Supervisor / watchdog.
//!
//! Long-lived workers contribute an "am I stuck?" vote; the supervisor
//! wakes every two seconds, polls the votes on every fifth wake, and
//! escalates: a single stuck worker raises an alert, a worker stuck across
//! four polls reboots the unit through the platform reboot helper. Every
//! wake also toggles an external running indicator so the outside world
//! sees the supervisor itself is alive.

use std::ffi::CString;
use std::io;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::diag::{DiagChannel, DiagEvent};

/// Helper binary exec'd by the reboot escalation.
pub const REBOOT_HELPER: &str = "/sbin/reboot_unit";

const WAKE_INTERVAL: Duration = Duration::from_secs(2);
const WAKES_PER_POLL: u32 = 5;
const MAX_WATCHES: usize = 2;

pub type WatchFn = Box<dyn Fn() -> bool + Send>;
pub type RecurrentFn = Box<dyn Fn() + Send>;
pub type IndicatorFn = Box<dyn Fn(bool) + Send>;

/// What one escalation poll decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
	None,
	Alert,
	Reboot,
}

/// Consecutive-stuck counters, one per registered watch, summed into a
/// single escalation state.
struct Escalation {
	counters: Vec<u32>,
}

impl Escalation {
	fn new(watches: usize) -> Self {
		Escalation {
			counters: vec![0; watches],
		}
	}

	fn step(&mut self, votes: &[bool]) -> Action {
		for (counter, &stuck) in self.counters.iter_mut().zip(votes) {
			if stuck {
				*counter += 1;
			} else {
				*counter = 0;
			}
		}
		let total: u32 = self.counters.iter().sum();
		if total == 1 {
			Action::Alert
		} else if total > 3 {
			// the range in between stays silent
			Action::Reboot
		} else {
			Action::None
		}
	}
}

struct Shared {
	stop: Mutex<bool>,
	wake: Condvar,
	reboot_pending: AtomicBool,
}

/// The supervisor thread and its registration surface.
pub struct Watchdog {
	shared: Arc<Shared>,
	diag: Arc<DiagChannel>,
	watches: Vec<WatchFn>,
	recurrent: Option<RecurrentFn>,
	indicator: Option<IndicatorFn>,
	handle: Option<JoinHandle<()>>,
}

impl Watchdog {
	pub fn new(diag: Arc<DiagChannel>) -> Self {
		Watchdog {
			shared: Arc::new(Shared {
				stop: Mutex::new(false),
				wake: Condvar::new(),
				reboot_pending: AtomicBool::new(false),
			}),
			diag,
			watches: Vec::new(),
			recurrent: None,
			indicator: None,
			handle: None,
		}
	}

	/// Register an "is-stuck?" vote. At most two are honored.
	pub fn add_watch(&mut self, watch: WatchFn) {
		if self.watches.len() < MAX_WATCHES {
			self.watches.push(watch);
		} else {
			warn!("watch slots exhausted, vote ignored");
		}
	}

	/// Register the recurrent tick closure, invoked on every poll.
	pub fn add_recurrent(&mut self, recurrent: RecurrentFn) {
		if self.recurrent.is_none() {
			self.recurrent = Some(recurrent);
		}
	}

	/// The external "running" indicator, toggled on every wake.
	pub fn set_indicator(&mut self, indicator: IndicatorFn) {
		self.indicator = Some(indicator);
	}

	pub fn reboot_pending(&self) -> bool {
		self.shared.reboot_pending.load(Ordering::Relaxed)
	}

	pub fn start(&mut self) {
		let shared = Arc::clone(&self.shared);
		let diag = Arc::clone(&self.diag);
		let watches = std::mem::take(&mut self.watches);
		let recurrent = self.recurrent.take();
		let indicator = self.indicator.take();
		match thread::Builder::new()
			.name(String::from("watchdog"))
			.spawn(move || supervise(&shared, &diag, &watches, &recurrent, &indicator))
		{
			Ok(handle) => self.handle = Some(handle),
			Err(err) => error!("cannot start the watchdog thread: {err}"),
		}
	}

	/// Cooperative stop: flips the flag, interrupts the sleep, joins.
	pub fn stop(&mut self) {
		if let Ok(mut stop) = self.shared.stop.lock() {
			*stop = true;
		}
		self.shared.wake.notify_all();
		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
	}
}

fn supervise(
	shared: &Shared,
	diag: &DiagChannel,
	watches: &[WatchFn],
	recurrent: &Option<RecurrentFn>,
	indicator: &Option<IndicatorFn>,
) {
	let mut escalation = Escalation::new(watches.len());
	let mut wakes = 0u32;
	let mut light = false;

	loop {
		if sleep_interruptibly(shared) {
			break;
		}
		wakes += 1;
		if wakes >= WAKES_PER_POLL {
			let votes: Vec<bool> = watches.iter().map(|watch| watch()).collect();
			match escalation.step(&votes) {
				Action::None => {}
				Action::Alert => {
					diag.report(DiagEvent::LibraryStuck, 0, "worker suspected stuck");
					if let Some(show) = indicator {
						show(true);
					}
				}
				Action::Reboot => {
					shared.reboot_pending.store(true, Ordering::Relaxed);
					diag.report(DiagEvent::ClientReboot, 0, "unit REBOOT!!");
					break;
				}
			}
			if let Some(tick) = recurrent {
				tick();
			}
			wakes = 0;
		}
		light = !light;
		if let Some(show) = indicator {
			show(light);
		}
	}

	if shared.reboot_pending.load(Ordering::Relaxed) {
		exec_reboot_helper();
	}
}

/// Sleep one wake interval; true when a stop request arrived.
fn sleep_interruptibly(shared: &Shared) -> bool {
	let Ok(guard) = shared.stop.lock() else {
		return true;
	};
	if *guard {
		return true;
	}
	match shared.wake.wait_timeout(guard, WAKE_INTERVAL) {
		Ok((stop, _)) => *stop,
		Err(_) => true,
	}
}

/// Fork a child that execs the platform reboot helper.
fn exec_reboot_helper() {
	let (Ok(path), Ok(arg0)) = (CString::new(REBOOT_HELPER), CString::new("reboot_unit")) else {
		return;
	};
	unsafe {
		let pid = libc::fork();
		if pid < 0 {
			error!("fork for reboot: {}", io::Error::last_os_error());
		} else if pid == 0 {
			let argv = [arg0.as_ptr(), ptr::null()];
			libc::execv(path.as_ptr(), argv.as_ptr());
			// only reached when the exec itself failed
			libc::_exit(127);
		}
	}
}

/// Liveness vote backed by a worker's tick counter: the worker is suspected
/// stuck when the counter has not advanced since the previous poll.
pub struct LivenessProbe {
	counter: Arc<AtomicU64>,
	last_seen: AtomicU64,
}

impl LivenessProbe {
	pub fn new(counter: Arc<AtomicU64>) -> Arc<Self> {
		let last_seen = AtomicU64::new(counter.load(Ordering::Relaxed).wrapping_sub(1));
		Arc::new(LivenessProbe { counter, last_seen })
	}

	pub fn vote(&self) -> bool {
		let now = self.counter.load(Ordering::Relaxed);
		let before = self.last_seen.swap(now, Ordering::Relaxed);
		now == before
	}
}
