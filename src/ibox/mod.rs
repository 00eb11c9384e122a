//! MID/PID wire layer for the iBox refrigeration controller.
//!
//! Frames are symmetric in both directions: MID, a receiver address/flags
//! byte (always 0x00 in requests), the PID, an optional payload and a final
//! checksum chosen so that the two's-complement sum of the whole frame is
//! zero modulo 256. Replies may arrive embedded in line noise or trailing
//! fragments of earlier frames, so the decoder explicitly searches and
//! resynchronizes rather than trusting the buffer head.

pub mod engine;

use smallvec::SmallVec;
use thiserror::Error;

/// Default module identifier of the controller.
pub const DEFAULT_MID: u8 = 147;

/// A frame is at least MID + flags + PID + checksum.
pub const MIN_FRAME_LEN: usize = 4;

/// Largest reply the controller produces.
pub const RESP_SIZE: usize = 140;

// supported PID numbers
pub const REQUEST_PARAMETER: u8 = 0;
pub const FUEL_LEVEL: u8 = 96;
pub const BATTERY_VOLTAGE: u8 = 168;
pub const AMBIENT_AIR_TEMPERATURE: u8 = 171;
pub const CAR_TEMPERATURE_ZONE_1: u8 = 200;
pub const CAR_TEMPERATURE_ZONE_2: u8 = 201;
pub const CAR_TEMPERATURE_ZONE_3: u8 = 202;
pub const CARGOWATCH_SENSOR_READ: u8 = 203;
pub const POWER_CONTROL: u8 = 205;
pub const UNIT_CONTROL_CAPABILITY: u8 = 206;
pub const MULTI_ALARM_READ_CAPABILITY: u8 = 207;
pub const EXTEN_PARA_ID_CAPABILITY: u8 = 208;
pub const SOFTWARE_ID: u8 = 234;
pub const TOTAL_ELEC_HOURS: u8 = 235;
pub const COMPONENT_ID_PARA: u8 = 243;
pub const VEHICLE_HOURS: u8 = 246;
pub const ENGINE_HOURS: u8 = 247;

/// PID 205 payload value that powers the unit down.
pub const POWER_OFF: u8 = 0x00;

const PID_CATALOG: &[u8] = &[
	REQUEST_PARAMETER,
	FUEL_LEVEL,
	BATTERY_VOLTAGE,
	AMBIENT_AIR_TEMPERATURE,
	CAR_TEMPERATURE_ZONE_1,
	CAR_TEMPERATURE_ZONE_2,
	CAR_TEMPERATURE_ZONE_3,
	CARGOWATCH_SENSOR_READ,
	POWER_CONTROL,
	UNIT_CONTROL_CAPABILITY,
	MULTI_ALARM_READ_CAPABILITY,
	EXTEN_PARA_ID_CAPABILITY,
	SOFTWARE_ID,
	TOTAL_ELEC_HOURS,
	COMPONENT_ID_PARA,
	VEHICLE_HOURS,
	ENGINE_HOURS,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
	#[error("bad checksum")]
	Checksum,
	#[error("MID not found in reply")]
	Mid,
	#[error("PID {0} not in the request catalog")]
	Pid(u8),
	#[error("frame shorter than the four byte minimum")]
	Short,
	#[error("write to controller failed")]
	Write,
	#[error("read from controller failed")]
	Read,
	#[error("no valid frame in reply")]
	Verify,
	#[error("no data before timeout")]
	NoData,
}

/// A verified reply frame inside a receive buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
	/// Byte offset of the frame start (the MID) in the buffer.
	pub offset: usize,
	/// Payload between the PID and the checksum.
	pub payload: &'a [u8],
}

pub fn is_known_pid(pid: u8) -> bool {
	PID_CATALOG.contains(&pid)
}

/// Checksum byte completing `bytes` so the frame sums to zero mod 256.
pub fn checksum(bytes: &[u8]) -> u8 {
	let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
	0u8.wrapping_sub(sum)
}

/// Build a request frame `{MID, 0x00, PID, payload..., checksum}`.
pub fn build_request(mid: u8, pid: u8, payload: &[u8]) -> SmallVec<[u8; 8]> {
	let mut frame: SmallVec<[u8; 8]> = SmallVec::new();
	frame.push(mid);
	frame.push(0x00);
	frame.push(pid);
	frame.extend_from_slice(payload);
	frame.push(checksum(&frame));
	frame
}

/// Search a receive buffer for a valid reply frame.
///
/// The cursor slides until a byte matches the configured MID with the
/// expected PID two bytes later; the frame is accepted at the first length
/// (at least four bytes) where the running sum reaches zero. Noise ahead of
/// the frame and trailing bytes behind it are both tolerated, so a partial
/// earlier reply cannot poison this one.
pub fn verify_reply<'a>(buf: &'a [u8], mid: u8, pid: u8) -> Result<Frame<'a>, FrameError> {
	if buf.len() < MIN_FRAME_LEN {
		return Err(FrameError::Short);
	}
	let mut mid_seen = false;
	for start in 0..=buf.len() - MIN_FRAME_LEN {
		if buf[start] != mid {
			continue;
		}
		mid_seen = true;
		if buf[start + 2] != pid {
			continue;
		}
		let mut sum = buf[start].wrapping_add(buf[start + 1]).wrapping_add(buf[start + 2]);
		for end in start + 3..buf.len() {
			sum = sum.wrapping_add(buf[end]);
			if sum == 0 && end + 1 - start >= MIN_FRAME_LEN {
				return Ok(Frame {
					offset: start,
					payload: &buf[start + 3..end],
				});
			}
		}
	}
	if mid_seen {
		Err(FrameError::Verify)
	} else {
		Err(FrameError::Mid)
	}
}

/// Format a reply as the uplink ASCII record `PID,hexpayload`.
///
/// A failed request formats as `PID?` so the server still sees the attempt.
pub fn ascii_record(pid: u8, payload: Option<&[u8]>) -> String {
	use std::fmt::Write as _;
	match payload {
		Some(data) => {
			let mut out = format!("{pid:03},");
			for byte in data {
				let _ = write!(out, "{byte:02x}");
			}
			out
		}
		None => format!("{pid:03}?"),
	}
}

/// Decode a server-supplied ASCII-hex command payload.
///
/// An odd trailing digit fills the high nibble of the last byte.
pub fn decode_command(ascii: &str) -> Result<Vec<u8>, FrameError> {
	let digit = |c: u8| -> Result<u8, FrameError> {
		match c {
			b'0'..=b'9' => Ok(c - b'0'),
			b'a'..=b'f' => Ok(c - b'a' + 10),
			b'A'..=b'F' => Ok(c - b'A' + 10),
			_ => Err(FrameError::Verify),
		}
	};
	let bytes = ascii.as_bytes();
	let mut out = Vec::with_capacity((bytes.len() + 1) / 2);
	for pair in bytes.chunks(2) {
		let hi = digit(pair[0])?;
		let lo = if pair.len() == 2 { digit(pair[1])? } else { 0 };
		out.push(hi << 4 | lo);
	}
	Ok(out)
}
