//! TCP stream transport.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use super::{CommError, Endpoint, Transport, UrlId};
use crate::props::PropStore;

pub struct TcpTransport {
	props: Arc<PropStore>,
	endpoint: Option<Endpoint>,
	stream: Option<TcpStream>,
}

impl TcpTransport {
	pub fn new(props: Arc<PropStore>) -> Self {
		TcpTransport {
			props,
			endpoint: None,
			stream: None,
		}
	}
}

impl Transport for TcpTransport {
	fn initialize(&mut self, _buf_size: usize) {
		self.reset(UrlId::Primary);
	}

	fn open(&mut self) -> Result<(), CommError> {
		if self.stream.is_some() {
			info!("TCP transport seems to still be open!");
			return Ok(());
		}
		let addr = self.endpoint.as_mut().ok_or(CommError::Host)?.resolve()?;
		match TcpStream::connect(addr) {
			Ok(stream) => {
				info!("TCP transport connected to {addr}");
				self.stream = Some(stream);
				Ok(())
			}
			// a refused connection means the server is down; the protocol
			// pump schedules backoff on the host error
			Err(err) if err.kind() == io::ErrorKind::ConnectionRefused => {
				error!("connecting to {addr}: {err}, server has shut down");
				Err(CommError::Host)
			}
			Err(err) if err.kind() == io::ErrorKind::Interrupted => Err(CommError::Timeout),
			Err(err) => {
				error!("connecting to {addr}: {err}");
				Err(CommError::Connect(err))
			}
		}
	}

	fn close(&mut self) {
		if self.stream.take().is_some() {
			debug!("TCP transport closed");
		}
	}

	fn is_open(&self) -> bool {
		self.stream.is_some()
	}

	fn write_packet(&mut self, buf: &[u8]) -> Result<usize, CommError> {
		let Some(stream) = self.stream.as_mut() else {
			error!("TCP transport is not open");
			return Err(CommError::FileNo);
		};
		match stream.write_all(buf) {
			Ok(()) => Ok(buf.len()),
			Err(err) if err.kind() == io::ErrorKind::ConnectionReset => {
				info!("connection reset by peer");
				Err(CommError::Write(err))
			}
			Err(err) => {
				error!("socket send: {err}");
				Err(CommError::Write(err))
			}
		}
	}

	fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, CommError> {
		let Some(stream) = self.stream.as_mut() else {
			return Err(CommError::FileNo);
		};
		match stream.read(buf) {
			Ok(n) => Ok(n),
			Err(err)
				if err.kind() == io::ErrorKind::WouldBlock
					|| err.kind() == io::ErrorKind::TimedOut =>
			{
				Err(CommError::Timeout)
			}
			Err(err) if err.kind() == io::ErrorKind::Interrupted => Err(CommError::Timeout),
			Err(err) if err.kind() == io::ErrorKind::ConnectionRefused => {
				info!("server has shut down: {err}");
				Err(CommError::Host)
			}
			Err(err) => Err(CommError::Read(err)),
		}
	}

	fn read_flush(&mut self) {
		// NO-OP, matching the datagram side
	}

	fn reset(&mut self, url_id: UrlId) {
		self.endpoint = Endpoint::from_props(&self.props, url_id);
	}
}
