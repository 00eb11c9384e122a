//! DMTP uplink packet formatter.
//!
//! Packets are a fixed header (header byte, packet type, payload length)
//! followed by a payload described by a compact format string:
//!
//! - `%1U`..`%4U`: big-endian unsigned field of the given width
//! - `%<n>s`: fixed-width string field, zero-padded or truncated
//! - `%*s`: length-prefixed blob (one length byte)
//!
//! The formatter records where the sequence byte of a just-encoded event
//! sits (the last one-byte unsigned field) so the transport can rewrite it
//! in place on retransmission without rebuilding the packet.

use thiserror::Error;

/// First byte of every DMTP packet.
pub const PACKET_HEADER: u8 = 0xE0;

/// Client event packet carrying payload format 3.
pub const PKT_CLIENT_FORMAT_3: u8 = 0x33;

/// Client reply to a server property read.
pub const PKT_CLIENT_PROPERTY_VALUE: u8 = 0xB1;

/// Server: read a property (16-bit key).
pub const PKT_SERVER_GET_PROPERTY: u8 = 0x23;

/// Server: write a property (16-bit key + value bytes).
pub const PKT_SERVER_SET_PROPERTY: u8 = 0x24;

/// Server: acknowledge received events.
pub const PKT_SERVER_ACK: u8 = 0xA0;

/// Client status code reserved for iBox records.
pub const STATUS_IBOX: u16 = 0xE020;

/// Client status code for diagnostic channel records.
pub const STATUS_DIAGNOSTIC: u16 = 0xE030;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
	#[error("malformed format string at {0:?}")]
	Format(String),
	#[error("argument {0} does not match its format field")]
	Argument(usize),
	#[error("payload exceeds 255 bytes")]
	Overflow,
	#[error("bad packet header byte 0x{0:02X}")]
	Header(u8),
	#[error("truncated packet (need {0} more bytes)")]
	Truncated(usize),
}

/// One argument consumed by a format field.
#[derive(Debug, Clone, Copy)]
pub enum FmtArg<'a> {
	U(u32),
	Str(&'a str),
	Blob(&'a [u8]),
}

/// An encoded uplink packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
	ptype: u8,
	payload: Vec<u8>,
	/// Payload offset of the sequence byte, when the format carried one.
	pub seq_pos: Option<usize>,
	/// Width of the sequence field in bytes.
	pub seq_len: usize,
}

impl Packet {
	/// Encode a payload from a format string and its arguments.
	pub fn init(ptype: u8, fmt: &str, args: &[FmtArg<'_>]) -> Result<Packet, PacketError> {
		let mut payload = Vec::new();
		let mut seq_pos = None;
		let mut next_arg = 0usize;

		let mut chars = fmt.chars();
		while let Some(c) = chars.next() {
			if c != '%' {
				return Err(PacketError::Format(String::from(fmt)));
			}
			let width = match chars.next() {
				Some('*') => None,
				Some(d @ '1'..='9') => Some(d as usize - '0' as usize),
				_ => return Err(PacketError::Format(String::from(fmt))),
			};
			let kind = chars
				.next()
				.ok_or_else(|| PacketError::Format(String::from(fmt)))?;
			let arg = args
				.get(next_arg)
				.ok_or(PacketError::Argument(next_arg))?;

			match (kind, width) {
				('U', Some(w)) if w <= 4 => {
					let FmtArg::U(value) = *arg else {
						return Err(PacketError::Argument(next_arg));
					};
					if w == 1 {
						seq_pos = Some(payload.len());
					}
					payload.extend_from_slice(&value.to_be_bytes()[4 - w..]);
				}
				('s', Some(w)) => {
					let bytes = match *arg {
						FmtArg::Str(s) => s.as_bytes(),
						FmtArg::Blob(b) => b,
						FmtArg::U(_) => return Err(PacketError::Argument(next_arg)),
					};
					let mut field = vec![0u8; w];
					let n = bytes.len().min(w);
					field[..n].copy_from_slice(&bytes[..n]);
					payload.extend_from_slice(&field);
				}
				('s', None) => {
					let bytes = match *arg {
						FmtArg::Str(s) => s.as_bytes(),
						FmtArg::Blob(b) => b,
						FmtArg::U(_) => return Err(PacketError::Argument(next_arg)),
					};
					if bytes.len() > u8::MAX as usize {
						return Err(PacketError::Overflow);
					}
					payload.push(bytes.len() as u8);
					payload.extend_from_slice(bytes);
				}
				_ => return Err(PacketError::Format(String::from(fmt))),
			}
			next_arg += 1;
		}

		if payload.len() > u8::MAX as usize {
			return Err(PacketError::Overflow);
		}
		Ok(Packet {
			ptype,
			payload,
			seq_pos,
			seq_len: usize::from(seq_pos.is_some()),
		})
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	/// Header plus payload, ready for the transport.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(3 + self.payload.len());
		out.push(PACKET_HEADER);
		out.push(self.ptype);
		out.push(self.payload.len() as u8);
		out.extend_from_slice(&self.payload);
		out
	}

	/// Overwrite the recorded sequence field in place. Returns false when
	/// the format carried no sequence byte.
	pub fn rewrite_sequence(&mut self, seq: u8) -> bool {
		match self.seq_pos {
			Some(pos) => {
				self.payload[pos] = seq;
				true
			}
			None => false,
		}
	}
}

/// Where encoded packets go to be queued for uplink.
pub trait EventSink: Send + Sync {
	fn add_packet(&self, packet: Packet);
}

/// Split a received buffer into `(packet type, payload)` frames.
///
/// Server replies may batch several packets into one datagram or stream
/// read; each is the fixed header followed by its length-counted payload.
pub fn parse_frames(buf: &[u8]) -> Result<Vec<(u8, &[u8])>, PacketError> {
	let mut frames = Vec::new();
	let mut at = 0;
	while at < buf.len() {
		if buf[at] != PACKET_HEADER {
			return Err(PacketError::Header(buf[at]));
		}
		if at + 3 > buf.len() {
			return Err(PacketError::Truncated(at + 3 - buf.len()));
		}
		let ptype = buf[at + 1];
		let len = usize::from(buf[at + 2]);
		if at + 3 + len > buf.len() {
			return Err(PacketError::Truncated(at + 3 + len - buf.len()));
		}
		frames.push((ptype, &buf[at + 3..at + 3 + len]));
		at += 3 + len;
	}
	Ok(frames)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fields_encode_big_endian() {
		let pkt = Packet::init(
			PKT_CLIENT_FORMAT_3,
			"%2U%4U",
			&[FmtArg::U(0xE020), FmtArg::U(0x0102_0304)],
		)
		.unwrap();
		assert_eq!(pkt.payload(), &[0xE0, 0x20, 0x01, 0x02, 0x03, 0x04]);
		assert_eq!(pkt.seq_pos, None);
		assert_eq!(pkt.seq_len, 0);
	}

	#[test]
	fn ibox_report_layout_and_sequence_slot() {
		let record = "096,ab01\n";
		let pkt = Packet::init(
			PKT_CLIENT_FORMAT_3,
			"%2U%4U%*s%1U",
			&[
				FmtArg::U(u32::from(STATUS_IBOX)),
				FmtArg::U(0x5F00_0000),
				FmtArg::Blob(record.as_bytes()),
				FmtArg::U(0),
			],
		)
		.unwrap();
		// status(2) + time(4) + len(1) + record + seq(1)
		assert_eq!(pkt.payload().len(), 2 + 4 + 1 + record.len() + 1);
		assert_eq!(pkt.payload()[6], record.len() as u8);
		assert_eq!(pkt.seq_pos, Some(7 + record.len()));
		assert_eq!(pkt.seq_len, 1);
	}

	#[test]
	fn sequence_rewrites_in_place() {
		let mut pkt =
			Packet::init(PKT_CLIENT_FORMAT_3, "%*s%1U", &[FmtArg::Str("x"), FmtArg::U(0)]).unwrap();
		assert!(pkt.rewrite_sequence(5));
		let encoded = pkt.encode();
		assert_eq!(*encoded.last().unwrap(), 5);
	}

	#[test]
	fn fixed_string_field_pads_and_truncates() {
		let pkt = Packet::init(0x31, "%4s", &[FmtArg::Str("ab")]).unwrap();
		assert_eq!(pkt.payload(), b"ab\0\0");
		let pkt = Packet::init(0x31, "%2s", &[FmtArg::Str("abcdef")]).unwrap();
		assert_eq!(pkt.payload(), b"ab");
	}

	#[test]
	fn header_framing() {
		let pkt = Packet::init(PKT_CLIENT_FORMAT_3, "%1U", &[FmtArg::U(0x7F)]).unwrap();
		assert_eq!(pkt.encode(), vec![PACKET_HEADER, PKT_CLIENT_FORMAT_3, 1, 0x7F]);
	}

	#[test]
	fn batched_frames_split_cleanly() {
		let mut buf = Vec::new();
		buf.extend_from_slice(&[PACKET_HEADER, PKT_SERVER_ACK, 0]);
		buf.extend_from_slice(&[PACKET_HEADER, PKT_SERVER_SET_PROPERTY, 3, 0xEF, 0x31, 200]);
		let frames = parse_frames(&buf).unwrap();
		assert_eq!(frames.len(), 2);
		assert_eq!(frames[0], (PKT_SERVER_ACK, &[][..]));
		assert_eq!(
			frames[1],
			(PKT_SERVER_SET_PROPERTY, &[0xEF, 0x31, 200][..])
		);
	}

	#[test]
	fn frame_splitting_rejects_garbage() {
		assert_eq!(parse_frames(&[0x55]), Err(PacketError::Header(0x55)));
		assert_eq!(
			parse_frames(&[PACKET_HEADER, 0x24]),
			Err(PacketError::Truncated(1))
		);
		assert_eq!(
			parse_frames(&[PACKET_HEADER, 0x24, 5, 1, 2]),
			Err(PacketError::Truncated(3))
		);
		assert_eq!(parse_frames(&[]).unwrap(), Vec::new());
	}

	#[test]
	fn argument_mismatch_is_an_error() {
		assert_eq!(
			Packet::init(0x31, "%2U", &[FmtArg::Str("oops")]),
			Err(PacketError::Argument(0))
		);
		assert_eq!(
			Packet::init(0x31, "%2U%1U", &[FmtArg::U(1)]),
			Err(PacketError::Argument(1))
		);
		assert!(matches!(
			Packet::init(0x31, "%zU", &[FmtArg::U(1)]),
			Err(PacketError::Format(_))
		));
	}
}
