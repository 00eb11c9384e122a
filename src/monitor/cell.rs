//! Cellular signal and firmware snapshots.
//!
//! One-shot helpers rather than threads: each invocation reads the MEID
//! from the QMI character device, connects to the modem API, performs a
//! single query and writes the raw result into a named FIFO for
//! out-of-band consumption. The FIFO reader is an external collaborator;
//! opening the write side blocks until it shows up.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

/// FIFO receiving one raw signal-strength byte per invocation.
pub const SIGNAL_FIFO: &str = "/tmp/cell_signl_strength";
/// FIFO receiving the serving network name string.
pub const FIRMWARE_FIFO: &str = "/tmp/cell_firmware_info";

const QMI_DEVICE: &str = "/dev/qcqmi0";
const QMI_NODE_PRIMARY: &str = "qcqmi1";
const QMI_NODE_FALLBACK: &str = "qcqmi0";
const QMI_GET_MEID: libc::c_ulong = 0x8BE0 + 3;
const MEID_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CellError {
	#[error("QMI device: {0}")]
	Device(io::Error),
	#[error("MEID ioctl: {0}")]
	Ioctl(io::Error),
	#[error("cannot connect device with driver")]
	Connect,
	#[error("modem query: {0}")]
	Query(io::Error),
	#[error("snapshot FIFO: {0}")]
	Fifo(io::Error),
}

/// The cellular modem management API. The real implementation wraps the
/// vendor connection-manager library; tests substitute their own.
pub trait ModemApi {
	fn connect(&mut self, node: &str, meid: &str) -> io::Result<()>;
	fn signal_strength(&mut self) -> io::Result<i8>;
	fn serving_network(&mut self) -> io::Result<String>;
	fn disconnect(&mut self);
}

/// Read the MEID out of the QMI character device.
pub fn read_meid() -> Result<String, CellError> {
	let path = CString::new(QMI_DEVICE).map_err(|_| {
		CellError::Device(io::Error::from(io::ErrorKind::InvalidInput))
	})?;
	let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR) };
	if fd < 0 {
		return Err(CellError::Device(io::Error::last_os_error()));
	}
	let mut raw = [0u8; MEID_LEN];
	let rc = unsafe { libc::ioctl(fd, QMI_GET_MEID, raw.as_mut_ptr()) };
	unsafe { libc::close(fd) };
	if rc != 0 {
		return Err(CellError::Ioctl(io::Error::last_os_error()));
	}
	let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
	Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Snapshot the current signal strength into [`SIGNAL_FIFO`].
pub fn snapshot_signal_strength(api: &mut dyn ModemApi) -> Result<(), CellError> {
	let meid = read_meid()?;
	run_signal_snapshot(api, &meid, Path::new(SIGNAL_FIFO))
}

/// Snapshot the serving network name into [`FIRMWARE_FIFO`].
pub fn snapshot_firmware_info(api: &mut dyn ModemApi) -> Result<(), CellError> {
	let meid = read_meid()?;
	run_firmware_snapshot(api, &meid, Path::new(FIRMWARE_FIFO))
}

fn connect_modem(api: &mut dyn ModemApi, meid: &str) -> Result<(), CellError> {
	if api.connect(QMI_NODE_PRIMARY, meid).is_ok() {
		return Ok(());
	}
	api.connect(QMI_NODE_FALLBACK, meid).map_err(|_| {
		error!("can not connect device with driver");
		CellError::Connect
	})
}

fn run_signal_snapshot(
	api: &mut dyn ModemApi,
	meid: &str,
	fifo: &Path,
) -> Result<(), CellError> {
	connect_modem(api, meid)?;
	let strength = api.signal_strength();
	api.disconnect();
	let strength = strength.map_err(CellError::Query)?;
	debug!("signal strength {strength} dB");
	write_fifo(fifo, &[strength as u8])
}

fn run_firmware_snapshot(
	api: &mut dyn ModemApi,
	meid: &str,
	fifo: &Path,
) -> Result<(), CellError> {
	connect_modem(api, meid)?;
	let name = api.serving_network();
	api.disconnect();
	let name = name.map_err(CellError::Query)?;
	debug!("serving network {name:?}");
	write_fifo(fifo, name.as_bytes())
}

/// One blocking write per invocation; the FIFO is created on first use.
fn write_fifo(path: &Path, bytes: &[u8]) -> Result<(), CellError> {
	let cpath = CString::new(path.as_os_str().as_encoded_bytes())
		.map_err(|_| CellError::Fifo(io::Error::from(io::ErrorKind::InvalidInput)))?;
	let rc = unsafe { libc::mkfifo(cpath.as_ptr(), 0o644) };
	if rc != 0 {
		let err = io::Error::last_os_error();
		if err.raw_os_error() != Some(libc::EEXIST) {
			return Err(CellError::Fifo(err));
		}
	}
	let mut fifo = OpenOptions::new()
		.write(true)
		.open(path)
		.map_err(CellError::Fifo)?;
	fifo.write_all(bytes).map_err(CellError::Fifo)
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::io::Read;
	use std::thread;

	use super::*;

	struct FakeModem {
		good_node: &'static str,
		connected_node: Option<String>,
		disconnects: u32,
	}

	impl FakeModem {
		fn new(good_node: &'static str) -> Self {
			FakeModem {
				good_node,
				connected_node: None,
				disconnects: 0,
			}
		}
	}

	impl ModemApi for FakeModem {
		fn connect(&mut self, node: &str, meid: &str) -> io::Result<()> {
			assert_eq!(meid, "A1000049AB0123");
			if node == self.good_node {
				self.connected_node = Some(String::from(node));
				Ok(())
			} else {
				Err(io::Error::from(io::ErrorKind::NotFound))
			}
		}

		fn signal_strength(&mut self) -> io::Result<i8> {
			Ok(-67)
		}

		fn serving_network(&mut self) -> io::Result<String> {
			Ok(String::from("Carrier One"))
		}

		fn disconnect(&mut self) {
			self.disconnects += 1;
		}
	}

	fn fifo_path(tag: &str) -> std::path::PathBuf {
		std::env::temp_dir().join(format!("cell_fifo_{tag}_{}", std::process::id()))
	}

	#[test]
	fn signal_snapshot_writes_one_byte() {
		let path = fifo_path("signal");
		let _ = fs::remove_file(&path);

		let reader_path = path.clone();
		let reader = thread::spawn(move || {
			// wait for the fifo node, then take the single byte
			for _ in 0..100 {
				if reader_path.exists() {
					break;
				}
				thread::sleep(std::time::Duration::from_millis(10));
			}
			let mut fifo = fs::File::open(&reader_path).unwrap();
			let mut buf = Vec::new();
			fifo.read_to_end(&mut buf).unwrap();
			buf
		});

		let mut modem = FakeModem::new(QMI_NODE_PRIMARY);
		run_signal_snapshot(&mut modem, "A1000049AB0123", &path).unwrap();
		assert_eq!(modem.disconnects, 1);

		let bytes = reader.join().unwrap();
		assert_eq!(bytes, vec![(-67i8) as u8]);
		let _ = fs::remove_file(&path);
	}

	#[test]
	fn firmware_snapshot_writes_the_network_name() {
		let path = fifo_path("firmware");
		let _ = fs::remove_file(&path);

		let reader_path = path.clone();
		let reader = thread::spawn(move || {
			for _ in 0..100 {
				if reader_path.exists() {
					break;
				}
				thread::sleep(std::time::Duration::from_millis(10));
			}
			let mut fifo = fs::File::open(&reader_path).unwrap();
			let mut buf = Vec::new();
			fifo.read_to_end(&mut buf).unwrap();
			buf
		});

		// the primary node refuses: the fallback must carry the session
		let mut modem = FakeModem::new(QMI_NODE_FALLBACK);
		run_firmware_snapshot(&mut modem, "A1000049AB0123", &path).unwrap();
		assert_eq!(modem.connected_node.as_deref(), Some(QMI_NODE_FALLBACK));

		let bytes = reader.join().unwrap();
		assert_eq!(bytes, b"Carrier One");
		let _ = fs::remove_file(&path);
	}

	#[test]
	fn failed_driver_connect_is_reported() {
		let mut modem = FakeModem::new("nosuchnode");
		let err = run_signal_snapshot(&mut modem, "A1000049AB0123", Path::new("/nonexistent"))
			.expect_err("both nodes refuse");
		assert!(matches!(err, CellError::Connect));
	}
}
