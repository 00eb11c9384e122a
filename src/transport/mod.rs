//! Server-facing transports.
//!
//! Two interchangeable transports carry DMTP packets to the server: a
//! sequence-tagged reliable-UDP datagram transport and a plain TCP stream.
//! Host and port come from the property store, with a primary and a backup
//! pair; the resolved address is cached until the next `reset`.

pub mod tcp;
pub mod udp;

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;

use crate::props::keys::{PROP_COMM_HOST, PROP_COMM_HOST_B, PROP_COMM_PORT, PROP_COMM_PORT_B};
use crate::props::PropStore;

#[derive(Debug, Error)]
pub enum CommError {
	#[error("transport host invalid or not configured")]
	Host,
	#[error("socket open: {0}")]
	Open(io::Error),
	#[error("socket option: {0}")]
	Option(io::Error),
	#[error("socket bind: {0}")]
	Bind(io::Error),
	#[error("socket connect: {0}")]
	Connect(io::Error),
	#[error("socket accept: {0}")]
	Accept(io::Error),
	#[error("socket read: {0}")]
	Read(io::Error),
	#[error("socket write: {0}")]
	Write(io::Error),
	#[error("socket timeout")]
	Timeout,
	#[error("socket descriptor invalid")]
	FileNo,
}

/// Which server URL a transport points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlId {
	Primary,
	Backup,
}

/// Contract shared by the UDP and TCP transports.
pub trait Transport: Send {
	/// One-time setup (buffers, initial endpoint). `buf_size` bounds a
	/// single outgoing packet.
	fn initialize(&mut self, buf_size: usize);
	fn open(&mut self) -> Result<(), CommError>;
	fn close(&mut self);
	fn is_open(&self) -> bool;
	fn write_packet(&mut self, buf: &[u8]) -> Result<usize, CommError>;
	fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize, CommError>;
	/// Discard any buffered inbound bytes.
	fn read_flush(&mut self);
	/// Re-point the transport at the primary or backup server URL and drop
	/// the cached address.
	fn reset(&mut self, url_id: UrlId);
}

/// A server endpoint taken from the property store.
pub(crate) struct Endpoint {
	host: String,
	port: u16,
	cached: Option<SocketAddr>,
}

impl Endpoint {
	/// Read `comm.host`/`comm.port` (or the backup pair) and validate them.
	///
	/// A null or shorter-than-three-character host means the unit is not
	/// configured to talk to anyone; that is logged at critical level and
	/// leaves the transport un-resettable until a valid host is set.
	pub(crate) fn from_props(props: &PropStore, url_id: UrlId) -> Option<Endpoint> {
		let (host, port) = match url_id {
			UrlId::Primary => (
				props.get_string(PROP_COMM_HOST, ""),
				props.get_u32(PROP_COMM_PORT, 0),
			),
			UrlId::Backup => (
				props.get_string(PROP_COMM_HOST_B, ""),
				props.get_u32(PROP_COMM_PORT_B, 0),
			),
		};
		if host.len() < 3 || port == 0 || port > u32::from(u16::MAX) {
			error!("transport host/port not specified ({url_id:?}); the client will never connect");
			return None;
		}
		Some(Endpoint {
			host,
			port: port as u16,
			cached: None,
		})
	}

	/// Resolve through the system resolver, reusing the cached address
	/// across reopens.
	pub(crate) fn resolve(&mut self) -> Result<SocketAddr, CommError> {
		if let Some(addr) = self.cached {
			return Ok(addr);
		}
		let addr = (self.host.as_str(), self.port)
			.to_socket_addrs()
			.map_err(|err| {
				warn!("unable to resolve host {}: {err}", self.host);
				CommError::Host
			})?
			.next()
			.ok_or(CommError::Host)?;
		self.cached = Some(addr);
		Ok(addr)
	}
}
