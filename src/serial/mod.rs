//! Serial port abstraction.
//!
//! One descriptor serves both directions. Binary mode is fully raw (no
//! translation, no echo, no signals) with a per-open `VMIN` and a 100 ms
//! `VTIME` quantum; text mode keeps canonical line buffering with `IGNCR`
//! so CRLF resolves to a single delimiter. The pre-open line discipline is
//! saved and restored on close.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use thiserror::Error;

/// Hardware flow control for binary-mode ports. The iBox link runs without
/// it; flip at build time for hardware that wires CTS/RTS.
const SERIAL_PORT_HW_FLOW: bool = false;

#[derive(Debug, Error)]
pub enum SerialError {
	#[error("cannot open {device}: {source}")]
	Init { device: String, source: io::Error },
	#[error("unsupported line rate {0}")]
	Speed(u32),
	#[error("serial device closed (EOF)")]
	Eof,
	#[error("serial I/O: {0}")]
	Io(#[from] io::Error),
}

/// Data format of a line: word size, parity, stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
	#[default]
	Fmt8N1,
	Fmt7E1,
	Fmt7O1,
}

bitflags! {
	/// RS-232 modem control lines.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct ModemLine: libc::c_int {
		const DTR = libc::TIOCM_DTR;
		const RTS = libc::TIOCM_RTS;
		const CTS = libc::TIOCM_CTS;
		const DCD = libc::TIOCM_CD;
	}
}

fn baud_const(bps: u32) -> Option<libc::speed_t> {
	Some(match bps {
		1200 => libc::B1200,
		2400 => libc::B2400,
		4800 => libc::B4800,
		9600 => libc::B9600,
		19200 => libc::B19200,
		38400 => libc::B38400,
		57600 => libc::B57600,
		115200 => libc::B115200,
		#[cfg(any(target_os = "linux", target_os = "android"))]
		921600 => libc::B921600,
		_ => return None,
	})
}

/// An open serial device.
pub struct SerialPort {
	fd: RawFd,
	device: String,
	bps: u32,
	format: DataFormat,
	binary: bool,
	vmin: u8,
	saved: libc::termios,
	push: Option<u8>,
	timed_out: bool,
}

impl SerialPort {
	/// Open and configure a serial device.
	///
	/// `vmin` only applies to binary mode and sets the kernel-side minimum
	/// read length; reads still honor their own millisecond budget.
	pub fn open(
		device: &str,
		bps: u32,
		format: DataFormat,
		binary: bool,
		vmin: u8,
	) -> Result<Self, SerialError> {
		let speed = baud_const(bps).ok_or(SerialError::Speed(bps))?;
		let fd = open_fd(device)?;

		let mut saved: libc::termios = unsafe { mem::zeroed() };
		if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
			let err = io::Error::last_os_error();
			unsafe { libc::close(fd) };
			return Err(SerialError::Init {
				device: String::from(device),
				source: err,
			});
		}

		let mut tio = saved;
		unsafe {
			libc::cfsetispeed(&mut tio, speed);
			libc::cfsetospeed(&mut tio, speed);
		}

		tio.c_cflag |= libc::CREAD | libc::CLOCAL;
		// drop DTR when the port is closed
		tio.c_cflag |= libc::HUPCL;
		match format {
			DataFormat::Fmt8N1 => {
				tio.c_cflag &= !(libc::PARENB | libc::CSTOPB | libc::CSIZE);
				tio.c_cflag |= libc::CS8;
			}
			DataFormat::Fmt7E1 => {
				tio.c_cflag |= libc::PARENB;
				tio.c_cflag &= !(libc::PARODD | libc::CSTOPB | libc::CSIZE);
				tio.c_cflag |= libc::CS7;
			}
			DataFormat::Fmt7O1 => {
				tio.c_cflag |= libc::PARENB | libc::PARODD;
				tio.c_cflag &= !(libc::CSTOPB | libc::CSIZE);
				tio.c_cflag |= libc::CS7;
			}
		}

		if binary {
			if SERIAL_PORT_HW_FLOW {
				tio.c_cflag |= libc::CRTSCTS;
			} else {
				tio.c_cflag &= !libc::CRTSCTS;
			}
			// input: ignore break, no software flow, no translation
			tio.c_iflag &=
				!(libc::IGNBRK | libc::BRKINT | libc::IXON | libc::IXOFF | libc::IXANY);
			tio.c_iflag &=
				!(libc::PARMRK | libc::INLCR | libc::IGNCR | libc::ICRNL | libc::IUCLC);
			if tio.c_cflag & libc::PARENB != 0 {
				tio.c_iflag |= libc::INPCK | libc::ISTRIP;
			} else {
				tio.c_iflag &= !(libc::INPCK | libc::ISTRIP);
			}
			// output: raw, no post-processing
			tio.c_oflag &= !(libc::OPOST
				| libc::ONLCR
				| libc::OLCUC
				| libc::OCRNL
				| libc::ONLRET
				| libc::ONOCR
				| libc::OFILL
				| libc::OFDEL);
			tio.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG | libc::IEXTEN);
			tio.c_cc[libc::VMIN] = vmin;
			tio.c_cc[libc::VTIME] = 1;
		} else {
			// canonical input; CRLF arrives as one line delimiter
			tio.c_iflag |= libc::IGNCR;
			tio.c_oflag &= !(libc::ONLCR | libc::OLCUC | libc::OCRNL | libc::ONLRET | libc::ONOCR);
			tio.c_lflag |= libc::ISIG | libc::ICANON;
			tio.c_lflag &= !(libc::ECHO
				| libc::ECHOE
				| libc::ECHOK
				| libc::ECHONL
				| libc::ECHOKE
				| libc::IEXTEN);
		}

		if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
			let err = io::Error::last_os_error();
			unsafe { libc::close(fd) };
			return Err(SerialError::Init {
				device: String::from(device),
				source: err,
			});
		}

		Ok(SerialPort {
			fd,
			device: String::from(device),
			bps,
			format,
			binary,
			vmin,
			saved,
			push: None,
			timed_out: false,
		})
	}

	pub fn is_open(&self) -> bool {
		self.fd >= 0
	}

	pub fn device(&self) -> &str {
		&self.device
	}

	/// True if the most recent `read` returned short because its budget ran
	/// out rather than because the buffer filled.
	pub fn timed_out(&self) -> bool {
		self.timed_out
	}

	/// Read up to `buf.len()` bytes, accumulating until the buffer is full
	/// or the millisecond budget is exhausted. Returns the (possibly
	/// partial) count; `Err(Eof)` once the descriptor is dead.
	pub fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
		if buf.is_empty() {
			return Ok(0);
		}
		self.timed_out = false;

		let mut n = 0;
		if let Some(byte) = self.push.take() {
			buf[0] = byte;
			n = 1;
		}

		let start = Instant::now();
		while n < buf.len() {
			let Some(remaining) = timeout.checked_sub(start.elapsed()) else {
				self.timed_out = true;
				return Ok(n);
			};
			if !wait_readable(self.fd, remaining)? {
				self.timed_out = true;
				return Ok(n);
			}
			let r = unsafe {
				libc::read(
					self.fd,
					buf[n..].as_mut_ptr().cast::<libc::c_void>(),
					buf.len() - n,
				)
			};
			match r {
				-1 => {
					let err = io::Error::last_os_error();
					if err.kind() == io::ErrorKind::Interrupted {
						continue;
					}
					return Err(SerialError::Io(err));
				}
				// readable but nothing to read: the far end hung up
				0 => return Err(SerialError::Eof),
				r => n += r as usize,
			}
		}
		Ok(n)
	}

	/// Wait up to `timeout` for the first byte, then keep reading until the
	/// line goes quiet for one VTIME quantum (~100 ms) or the buffer fills.
	/// Returns 0 on timeout with nothing received.
	pub fn read_available(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
		if buf.is_empty() {
			return Ok(0);
		}
		self.timed_out = false;

		let mut n = 0;
		if let Some(byte) = self.push.take() {
			buf[0] = byte;
			n = 1;
		}
		if n == 0 && !wait_readable(self.fd, timeout)? {
			self.timed_out = true;
			return Ok(0);
		}

		let quiet = Duration::from_millis(100);
		loop {
			if n == buf.len() {
				return Ok(n);
			}
			if n > 0 && !wait_readable(self.fd, quiet)? {
				return Ok(n);
			}
			let r = unsafe {
				libc::read(
					self.fd,
					buf[n..].as_mut_ptr().cast::<libc::c_void>(),
					buf.len() - n,
				)
			};
			match r {
				-1 => {
					let err = io::Error::last_os_error();
					if err.kind() == io::ErrorKind::Interrupted {
						continue;
					}
					return Err(SerialError::Io(err));
				}
				0 => {
					if n == 0 {
						return Err(SerialError::Eof);
					}
					return Ok(n);
				}
				r => n += r as usize,
			}
		}
	}

	/// Read one canonical line (text mode). The trailing delimiter is
	/// stripped.
	pub fn read_line(&mut self, timeout: Duration) -> Result<String, SerialError> {
		let mut buf = [0u8; 256];
		if !wait_readable(self.fd, timeout)? {
			self.timed_out = true;
			return Ok(String::new());
		}
		self.timed_out = false;
		let r = unsafe {
			libc::read(
				self.fd,
				buf.as_mut_ptr().cast::<libc::c_void>(),
				buf.len(),
			)
		};
		match r {
			-1 => Err(SerialError::Io(io::Error::last_os_error())),
			0 => Err(SerialError::Eof),
			r => {
				let mut end = r as usize;
				while end > 0 && (buf[end - 1] == b'\n' || buf[end - 1] == b'\r') {
					end -= 1;
				}
				Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
			}
		}
	}

	/// Push one byte back into the read stream. Only a single byte is
	/// cached; a second push overwrites it with a warning.
	pub fn push(&mut self, byte: u8) {
		if self.push.is_some() {
			warn!("byte already pushed back on {}", self.device);
		}
		self.push = Some(byte);
	}

	pub fn write(&mut self, buf: &[u8]) -> Result<usize, SerialError> {
		let mut written = 0;
		while written < buf.len() {
			let r = unsafe {
				libc::write(
					self.fd,
					buf[written..].as_ptr().cast::<libc::c_void>(),
					buf.len() - written,
				)
			};
			if r < 0 {
				let err = io::Error::last_os_error();
				if err.kind() == io::ErrorKind::Interrupted {
					continue;
				}
				return Err(SerialError::Io(err));
			}
			written += r as usize;
		}
		Ok(written)
	}

	/// Block until all queued output has been transmitted.
	pub fn drain(&mut self) -> Result<(), SerialError> {
		if unsafe { libc::tcdrain(self.fd) } != 0 {
			return Err(SerialError::Io(io::Error::last_os_error()));
		}
		Ok(())
	}

	/// True when at least one byte can be read within the budget.
	pub fn available(&self, timeout: Duration) -> Result<bool, SerialError> {
		if self.push.is_some() {
			return Ok(true);
		}
		wait_readable(self.fd, timeout)
	}

	/// Read and discard input until the line stays quiet for one VTIME
	/// quantum or the overall budget runs out. Returns the number of bytes
	/// dropped.
	pub fn flush(&mut self, timeout: Duration) -> Result<usize, SerialError> {
		self.push = None;
		let quiet = Duration::from_millis(100);
		let start = Instant::now();
		let mut dropped = 0;
		let mut scratch = [0u8; 64];
		loop {
			if start.elapsed() >= timeout {
				return Ok(dropped);
			}
			if !wait_readable(self.fd, quiet)? {
				return Ok(dropped);
			}
			let r = unsafe {
				libc::read(
					self.fd,
					scratch.as_mut_ptr().cast::<libc::c_void>(),
					scratch.len(),
				)
			};
			match r {
				-1 => {
					let err = io::Error::last_os_error();
					if err.kind() == io::ErrorKind::Interrupted {
						continue;
					}
					return Err(SerialError::Io(err));
				}
				0 => return Err(SerialError::Eof),
				r => dropped += r as usize,
			}
		}
	}

	/// Consume input until the given byte sequence has been seen, restarting
	/// the match on every mismatch. True when the sequence arrived within
	/// the budget.
	pub fn read_sequence(&mut self, seq: &[u8], timeout: Duration) -> Result<bool, SerialError> {
		if seq.is_empty() {
			return Ok(true);
		}
		let start = Instant::now();
		let mut matched = 0;
		loop {
			let Some(remaining) = timeout.checked_sub(start.elapsed()) else {
				self.timed_out = true;
				return Ok(false);
			};
			let mut byte = [0u8; 1];
			let n = self.read(&mut byte, remaining)?;
			if n == 0 {
				self.timed_out = true;
				return Ok(false);
			}
			if byte[0] == seq[matched] {
				matched += 1;
				if matched == seq.len() {
					return Ok(true);
				}
			} else {
				// a failed partial match may still start a new one
				matched = usize::from(byte[0] == seq[0]);
			}
		}
	}

	/// Change the line rate in place.
	pub fn set_baud(&mut self, bps: u32) -> Result<(), SerialError> {
		let speed = baud_const(bps).ok_or(SerialError::Speed(bps))?;
		let mut tio: libc::termios = unsafe { mem::zeroed() };
		if unsafe { libc::tcgetattr(self.fd, &mut tio) } != 0 {
			return Err(SerialError::Io(io::Error::last_os_error()));
		}
		unsafe {
			libc::cfsetispeed(&mut tio, speed);
			libc::cfsetospeed(&mut tio, speed);
		}
		if unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &tio) } != 0 {
			return Err(SerialError::Io(io::Error::last_os_error()));
		}
		self.bps = bps;
		Ok(())
	}

	/// Close and re-open the device with the same settings.
	pub fn reopen(&mut self) -> Result<(), SerialError> {
		let device = self.device.clone();
		let (bps, format, binary, vmin) = (self.bps, self.format, self.binary, self.vmin);
		self.close();
		let fresh = SerialPort::open(&device, bps, format, binary, vmin)?;
		*self = fresh;
		Ok(())
	}

	// --- modem control lines ----------------------------------------------

	pub fn get_line(&self, line: ModemLine) -> Result<bool, SerialError> {
		Ok(read_lines_fd(self.fd)?.contains(line))
	}

	pub fn set_line(&mut self, line: ModemLine, state: bool) -> Result<(), SerialError> {
		let mut bits = read_lines_fd(self.fd)?.bits();
		if state {
			bits |= line.bits();
		} else {
			bits &= !line.bits();
		}
		if unsafe { libc::ioctl(self.fd, libc::TIOCMSET, &bits) } != 0 {
			return Err(SerialError::Io(io::Error::last_os_error()));
		}
		Ok(())
	}

	pub fn get_dtr(&self) -> Result<bool, SerialError> {
		self.get_line(ModemLine::DTR)
	}

	pub fn set_dtr(&mut self, state: bool) -> Result<(), SerialError> {
		self.set_line(ModemLine::DTR, state)
	}

	pub fn get_rts(&self) -> Result<bool, SerialError> {
		self.get_line(ModemLine::RTS)
	}

	pub fn set_rts(&mut self, state: bool) -> Result<(), SerialError> {
		self.set_line(ModemLine::RTS, state)
	}

	pub fn get_cts(&self) -> Result<bool, SerialError> {
		self.get_line(ModemLine::CTS)
	}

	pub fn get_dcd(&self) -> Result<bool, SerialError> {
		self.get_line(ModemLine::DCD)
	}

	fn close(&mut self) {
		if self.fd >= 0 {
			unsafe {
				// restore the line discipline we found at open
				libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved);
				libc::close(self.fd);
			}
			self.fd = -1;
		}
	}
}

impl Drop for SerialPort {
	fn drop(&mut self) {
		self.close();
	}
}

/// Sample the modem control lines of a device without reconfiguring it.
pub fn read_modem_lines(device: &str) -> Result<ModemLine, SerialError> {
	let fd = open_fd(device)?;
	let lines = read_lines_fd(fd);
	unsafe { libc::close(fd) };
	lines
}

fn open_fd(device: &str) -> Result<RawFd, SerialError> {
	let path = CString::new(device).map_err(|_| SerialError::Init {
		device: String::from(device),
		source: io::Error::from(io::ErrorKind::InvalidInput),
	})?;
	let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
	if fd < 0 {
		return Err(SerialError::Init {
			device: String::from(device),
			source: io::Error::last_os_error(),
		});
	}
	Ok(fd)
}

fn read_lines_fd(fd: RawFd) -> Result<ModemLine, SerialError> {
	let mut bits: libc::c_int = 0;
	if unsafe { libc::ioctl(fd, libc::TIOCMGET, &mut bits) } != 0 {
		return Err(SerialError::Io(io::Error::last_os_error()));
	}
	Ok(ModemLine::from_bits_truncate(bits))
}

/// Wait for the descriptor to become readable within the budget.
fn wait_readable(fd: RawFd, timeout: Duration) -> Result<bool, SerialError> {
	let mut pfd = libc::pollfd {
		fd,
		events: libc::POLLIN,
		revents: 0,
	};
	let ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;
	loop {
		let r = unsafe { libc::poll(&mut pfd, 1, ms) };
		if r < 0 {
			let err = io::Error::last_os_error();
			if err.kind() == io::ErrorKind::Interrupted {
				continue;
			}
			return Err(SerialError::Io(err));
		}
		return Ok(r > 0);
	}
}

/// Pseudo-terminal plumbing shared by the serial and engine tests.
#[cfg(test)]
pub(crate) mod testutil {
	use std::os::unix::io::RawFd;

	/// Pseudo-terminal pair standing in for a physical UART.
	pub struct Pty {
		pub master: RawFd,
		pub slave_path: String,
	}

	impl Pty {
		pub fn new() -> Pty {
			unsafe {
				let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
				assert!(master >= 0, "posix_openpt failed");
				assert_eq!(libc::grantpt(master), 0);
				assert_eq!(libc::unlockpt(master), 0);
				let mut buf = [0 as libc::c_char; 128];
				assert_eq!(libc::ptsname_r(master, buf.as_mut_ptr(), buf.len()), 0);
				let path = std::ffi::CStr::from_ptr(buf.as_ptr())
					.to_string_lossy()
					.into_owned();
				Pty {
					master,
					slave_path: path,
				}
			}
		}

		pub fn feed(&self, data: &[u8]) {
			let r = unsafe {
				libc::write(self.master, data.as_ptr().cast::<libc::c_void>(), data.len())
			};
			assert_eq!(r as usize, data.len());
		}

		/// Blocking read on the master side.
		pub fn take(&self, buf: &mut [u8]) -> usize {
			let r = unsafe {
				libc::read(self.master, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len())
			};
			assert!(r >= 0, "pty master read failed");
			r as usize
		}
	}

	impl Drop for Pty {
		fn drop(&mut self) {
			unsafe { libc::close(self.master) };
		}
	}
}
