//! Reliable-UDP transport.
//!
//! Every datagram carries a one-byte sequence prefix. The packet is held in
//! a buffer sized at `initialize`; when no reply arrives within the
//! per-attempt timer the prefix is incremented and the same payload resent,
//! up to the configured retry count. Late replies tagged with a sequence
//! greater than the last send are stale echoes of an earlier attempt and
//! are discarded. Timer and retry count live in the `com.udp.timer`
//! property pair.

use std::io;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use super::{CommError, Endpoint, Transport, UrlId};
use crate::props::keys::PROP_COMM_UDP_TIMER;
use crate::props::PropStore;

const DEFAULT_TIMEOUT_SECS: u32 = 20;
const DEFAULT_RETRIES: u32 = 3;

pub struct UdpTransport {
	props: Arc<PropStore>,
	endpoint: Option<Endpoint>,
	socket: Option<UdpSocket>,
	/// Single outstanding datagram, sequence prefix included.
	hold: Vec<u8>,
	buf_size: usize,
	send_len: usize,
	send_att: u8,
	timeout: Duration,
	retries: u32,
}

impl UdpTransport {
	pub fn new(props: Arc<PropStore>) -> Self {
		UdpTransport {
			props,
			endpoint: None,
			socket: None,
			hold: Vec::new(),
			buf_size: 0,
			send_len: 0,
			send_att: 0,
			timeout: Duration::from_secs(u64::from(DEFAULT_TIMEOUT_SECS)),
			retries: DEFAULT_RETRIES,
		}
	}

	fn resend(&mut self) -> Result<(), CommError> {
		let socket = self.socket.as_ref().ok_or(CommError::FileNo)?;
		self.send_att = self.send_att.wrapping_add(1);
		self.hold[0] = self.send_att;
		debug!("resending datagram, sequence {}", self.send_att);
		socket
			.send(&self.hold[..self.send_len])
			.map_err(CommError::Write)?;
		Ok(())
	}
}

impl Transport for UdpTransport {
	fn initialize(&mut self, buf_size: usize) {
		if self.hold.try_reserve_exact(buf_size).is_err() {
			error!("OUT OF MEMORY sizing the datagram hold buffer ({buf_size} bytes)");
			return;
		}
		self.hold.resize(buf_size, 0);
		self.buf_size = buf_size;
		self.send_att = 0;
		self.send_len = 0;
		self.reset(UrlId::Primary);
	}

	fn open(&mut self) -> Result<(), CommError> {
		if self.socket.is_some() {
			info!("UDP transport seems to still be open!");
			return Ok(());
		}
		if self.buf_size == 0 {
			return Err(CommError::FileNo);
		}
		let addr = self.endpoint.as_mut().ok_or(CommError::Host)?.resolve()?;
		let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(CommError::Bind)?;
		socket.connect(addr).map_err(CommError::Connect)?;

		self.timeout = Duration::from_secs(u64::from(
			self.props
				.get_u32_at(PROP_COMM_UDP_TIMER, 0, DEFAULT_TIMEOUT_SECS)
				.max(1),
		));
		self.retries = self
			.props
			.get_u32_at(PROP_COMM_UDP_TIMER, 1, DEFAULT_RETRIES);
		self.send_att = 0;
		self.send_len = 0;
		info!("UDP transport connected to {addr}");
		self.socket = Some(socket);
		Ok(())
	}

	fn close(&mut self) {
		if self.socket.take().is_some() {
			debug!("UDP transport closed");
		}
	}

	fn is_open(&self) -> bool {
		self.socket.is_some()
	}

	fn write_packet(&mut self, buf: &[u8]) -> Result<usize, CommError> {
		let Some(socket) = self.socket.as_ref() else {
			error!("UDP transport is not open");
			return Err(CommError::FileNo);
		};
		// first byte is the sequence prefix; oversized packets are clipped
		// to the hold buffer
		self.send_len = self.buf_size.min(buf.len() + 1);
		self.hold[0] = 0;
		self.hold[1..self.send_len].copy_from_slice(&buf[..self.send_len - 1]);
		self.send_att = 0;
		socket
			.send(&self.hold[..self.send_len])
			.map_err(CommError::Write)
	}

	fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, CommError> {
		if self.socket.is_none() {
			return Err(CommError::FileNo);
		}
		// `retries + 1` timed waits in total: the original send plus one
		// per retry
		for attempt in 0..=self.retries {
			let socket = self.socket.as_ref().ok_or(CommError::FileNo)?;
			socket
				.set_read_timeout(Some(self.timeout))
				.map_err(CommError::Option)?;
			match socket.recv(buf) {
				Ok(0) => continue,
				Ok(n) => {
					if buf[0] > self.send_att {
						// stale reply to a datagram we have since re-sent
						debug!("discarding stale datagram, sequence {}", buf[0]);
						continue;
					}
					return Ok(n);
				}
				Err(err)
					if err.kind() == io::ErrorKind::WouldBlock
						|| err.kind() == io::ErrorKind::TimedOut =>
				{
					if attempt == self.retries {
						break;
					}
					self.resend()?;
				}
				Err(err) if err.kind() == io::ErrorKind::ConnectionRefused => {
					info!("UDP peer refused: {err}");
					return Err(CommError::Host);
				}
				Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
				Err(err) => return Err(CommError::Read(err)),
			}
		}
		Err(CommError::Timeout)
	}

	fn read_flush(&mut self) {
		// nothing buffered on our side of a datagram socket
	}

	fn reset(&mut self, url_id: UrlId) {
		self.endpoint = Endpoint::from_props(&self.props, url_id);
	}
}
