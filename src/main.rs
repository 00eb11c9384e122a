//! Agent entry point: bring up logging, overlay the property store with the
//! persisted file, start the runtime and wait for termination.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use dmtp_agent::props::keys::PROP_CMD_SAVE_PROPS;
use dmtp_agent::runtime::Agent;
use dmtp_agent::{logging, PropStore};

const DEFAULT_PROPS_FILE: &str = "/etc/dmtp/props.conf";

static TERMINATE: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signum: libc::c_int) {
	TERMINATE.store(true, Ordering::Relaxed);
}

fn main() {
	logging::init();

	let mut props_file = PathBuf::from(DEFAULT_PROPS_FILE);
	let mut args = std::env::args().skip(1);
	while let Some(arg) = args.next() {
		match arg.as_str() {
			"-p" | "--props" => match args.next() {
				Some(path) => props_file = PathBuf::from(path),
				None => {
					eprintln!("the argument '{arg}' requires a value");
					std::process::exit(2);
				}
			},
			other => {
				eprintln!("unexpected argument '{other}'");
				eprintln!("usage: dmtp-agent [-p <props-file>]");
				std::process::exit(2);
			}
		}
	}

	let props = Arc::new(PropStore::new());
	match props.load(&props_file) {
		Ok(0) => info!("no persisted properties at {}", props_file.display()),
		Ok(n) => info!("loaded {n} properties from {}", props_file.display()),
		Err(err) => warn!("cannot read {}: {err}", props_file.display()),
	}

	unsafe {
		libc::signal(
			libc::SIGTERM,
			on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t,
		);
		libc::signal(
			libc::SIGINT,
			on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t,
		);
	}

	let mut agent = Agent::new(Arc::clone(&props));
	agent.start();

	while !TERMINATE.load(Ordering::Relaxed) && !agent.reboot_pending() {
		// the save command property asks for an immediate flush
		if props.get_u32(PROP_CMD_SAVE_PROPS, 0) != 0 {
			let _ = props.set_u32(PROP_CMD_SAVE_PROPS, 0);
			match props.save(&props_file) {
				Ok(()) => info!("properties saved to {}", props_file.display()),
				Err(err) => error!("cannot save properties: {err}"),
			}
		}
		thread::sleep(Duration::from_millis(500));
	}

	info!("shutting down");
	agent.stop();
	if let Err(err) = props.save(&props_file) {
		error!("cannot save properties to {}: {err}", props_file.display());
	}
}
