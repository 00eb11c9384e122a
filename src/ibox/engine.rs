//! Timed request cycles against the iBox controller.
//!
//! A descriptor per active PID carries its sample rate and reply timeout;
//! the engine walks the descriptors once per one-second tick, issues the
//! due requests, and rescans the property store so rate changes pushed by
//! the server take effect on the next cycle. Every attempt, successful or
//! not, produces an uplink record.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{
	ascii_record, build_request, decode_command, is_known_pid, verify_reply, FrameError,
	AMBIENT_AIR_TEMPERATURE, BATTERY_VOLTAGE, CARGOWATCH_SENSOR_READ, CAR_TEMPERATURE_ZONE_1,
	CAR_TEMPERATURE_ZONE_2, CAR_TEMPERATURE_ZONE_3, COMPONENT_ID_PARA, ENGINE_HOURS,
	EXTEN_PARA_ID_CAPABILITY, FUEL_LEVEL, MULTI_ALARM_READ_CAPABILITY, POWER_CONTROL, POWER_OFF,
	RESP_SIZE, SOFTWARE_ID, TOTAL_ELEC_HOURS, UNIT_CONTROL_CAPABILITY, VEHICLE_HOURS,
};
use crate::packet::{EventSink, FmtArg, Packet, PKT_CLIENT_FORMAT_3, STATUS_IBOX};
use crate::props::keys::*;
use crate::props::PropStore;
use crate::serial::{DataFormat, SerialPort};

/// Sample rate value requesting a single shot.
pub const RATE_ONE_SHOT: u32 = 0xFFFF;

const IBOX_BPS: u32 = 9600;
const IBOX_VMIN: u8 = 4;

/// Periodic request PIDs and the properties carrying `rate,timeout`.
const REQUEST_PIDS: &[(u8, PropKey)] = &[
	(FUEL_LEVEL, PROP_IBOX_96_REQUEST),
	(BATTERY_VOLTAGE, PROP_IBOX_168_REQUEST),
	(AMBIENT_AIR_TEMPERATURE, PROP_IBOX_171_REQUEST),
	(CAR_TEMPERATURE_ZONE_1, PROP_IBOX_200_REQUEST),
	(CAR_TEMPERATURE_ZONE_2, PROP_IBOX_201_REQUEST),
	(CAR_TEMPERATURE_ZONE_3, PROP_IBOX_202_REQUEST),
	(CARGOWATCH_SENSOR_READ, PROP_IBOX_203_REQUEST),
	(MULTI_ALARM_READ_CAPABILITY, PROP_IBOX_207_REQUEST),
	(SOFTWARE_ID, PROP_IBOX_234_REQUEST),
	(TOTAL_ELEC_HOURS, PROP_IBOX_235_REQUEST),
	(COMPONENT_ID_PARA, PROP_IBOX_243_REQUEST),
	(VEHICLE_HOURS, PROP_IBOX_246_REQUEST),
	(ENGINE_HOURS, PROP_IBOX_247_REQUEST),
];

/// Command PIDs: the write-only ASCII-hex command property and its timeout.
const COMMAND_PIDS: &[(u8, PropKey, PropKey)] = &[
	(
		POWER_CONTROL,
		PROP_IBOX_205_COMMAND,
		PROP_IBOX_205_COMMAND_TIMEOUT,
	),
	(
		UNIT_CONTROL_CAPABILITY,
		PROP_IBOX_206_COMMAND,
		PROP_IBOX_206_COMMAND_TIMEOUT,
	),
	(
		EXTEN_PARA_ID_CAPABILITY,
		PROP_IBOX_208_COMMAND,
		PROP_IBOX_208_COMMAND_TIMEOUT,
	),
];

#[derive(Debug, PartialEq, Eq)]
struct RequestSlot {
	rate: u32,
	timeout: u32,
	last_sample: u64,
}

impl RequestSlot {
	fn due(&self, beats: u64) -> bool {
		self.rate == RATE_ONE_SHOT || beats.saturating_sub(self.last_sample) >= u64::from(self.rate)
	}
}

/// The iBox monitor worker.
pub struct IboxEngine {
	props: Arc<PropStore>,
	sink: Arc<dyn EventSink>,
	stop: Arc<AtomicBool>,
	beats: Arc<AtomicU64>,
}

impl IboxEngine {
	pub fn new(props: Arc<PropStore>, sink: Arc<dyn EventSink>, stop: Arc<AtomicBool>) -> Self {
		IboxEngine {
			props,
			sink,
			stop,
			beats: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Tick counter, one increment per engine cycle. The supervisor watches
	/// this to vote on the engine's liveness.
	pub fn beats_handle(&self) -> Arc<AtomicU64> {
		Arc::clone(&self.beats)
	}

	/// Engine thread body. Returns when stopped, or when the serial device
	/// cannot be (re)opened; in the latter case the stalled tick counter is
	/// what brings the supervisor in.
	pub fn run(&self) {
		let mut slots: BTreeMap<u8, RequestSlot> = BTreeMap::new();
		let mut port: Option<SerialPort> = None;

		while !self.stop.load(Ordering::Relaxed) {
			if !self.cycle(&mut slots, &mut port) {
				return;
			}
			self.beats.fetch_add(1, Ordering::Relaxed);
			thread::sleep(Duration::from_secs(1));
		}
	}

	/// One cycle of the global clock tick: rescan properties, issue due
	/// requests, execute pending commands. False when the serial device
	/// could not be opened.
	fn cycle(&self, slots: &mut BTreeMap<u8, RequestSlot>, port: &mut Option<SerialPort>) -> bool {
		self.scan_request_pids(slots);
		let beats = self.beats.load(Ordering::Relaxed);

		let due: Vec<u8> = slots
			.iter()
			.filter(|(_, slot)| slot.due(beats))
			.map(|(&pid, _)| pid)
			.collect();
		for pid in due {
			if !self.ensure_open(port) {
				return false;
			}
			let (Some(opened), Some(slot)) = (port.as_mut(), slots.get_mut(&pid)) else {
				continue;
			};
			let mid = self.props.get_u32(PROP_IBOX_MID, u32::from(super::DEFAULT_MID)) as u8;
			let timeout = Duration::from_secs(u64::from(slot.timeout.max(1)));
			let record = match request_pid(opened, mid, pid, &[], timeout) {
				Ok(payload) => ascii_record(pid, Some(&payload)),
				Err(err) => {
					warn!("PID {pid} request: {err}");
					ascii_record(pid, None)
				}
			};
			self.status_report(&record);
			slot.last_sample = beats;
		}

		self.run_commands(port);
		true
	}

	/// Execute any pending command PIDs pushed through the write-only
	/// command properties. The property is consumed before the request goes
	/// out so a wedged controller cannot replay it forever.
	fn run_commands(&self, port: &mut Option<SerialPort>) {
		for &(pid, cmd_key, tmo_key) in COMMAND_PIDS {
			let ascii = self.props.get_string(cmd_key, "");
			if ascii.is_empty() {
				continue;
			}
			let _ = self.props.set_string(cmd_key, "");
			info!("PID {pid} command: {ascii}");

			let payload = match decode_command(&ascii) {
				Ok(payload) => payload,
				Err(err) => {
					warn!("PID {pid} command {ascii:?} rejected: {err}");
					continue;
				}
			};
			if !self.ensure_open(port) {
				continue;
			}
			let Some(opened) = port.as_mut() else {
				continue;
			};
			let mid = self.props.get_u32(PROP_IBOX_MID, u32::from(super::DEFAULT_MID)) as u8;
			let timeout = Duration::from_secs(u64::from(self.props.get_u32(tmo_key, 1).max(1)));
			let record = match request_pid(opened, mid, pid, &payload, timeout) {
				Ok(reply) => ascii_record(pid, Some(&reply)),
				Err(err) => {
					warn!("PID {pid} command: {err}");
					ascii_record(pid, None)
				}
			};
			self.status_report(&record);

			// power off: the controller side goes away, so does our port
			if pid == POWER_CONTROL && payload.first() == Some(&POWER_OFF) {
				info!("controller powered off, closing serial device");
				*port = None;
			}
		}
	}

	fn scan_request_pids(&self, slots: &mut BTreeMap<u8, RequestSlot>) {
		for &(pid, key) in REQUEST_PIDS {
			let rate = self.props.get_u32_at(key, 0, 0);
			let timeout = self.props.get_u32_at(key, 1, 1);
			if rate == RATE_ONE_SHOT {
				// the shot fires this cycle; the next scan sees zero and
				// drops the descriptor again
				let _ = self.props.set_u32_at(key, 0, 0);
			}
			if rate != 0 {
				if let Some(slot) = slots.get_mut(&pid) {
					slot.rate = rate;
					slot.timeout = timeout;
				} else {
					info!("add PID {pid} (rate {rate}s, timeout {timeout}s)");
					slots.insert(
						pid,
						RequestSlot {
							rate,
							timeout,
							last_sample: 0,
						},
					);
				}
			} else if slots.remove(&pid).is_some() {
				info!("del PID {pid}");
			}
		}
	}

	fn ensure_open(&self, port: &mut Option<SerialPort>) -> bool {
		if port.is_some() {
			return true;
		}
		let device = self.props.get_string(PROP_IBOX_PORT, "/dev/ttyS1");
		match SerialPort::open(&device, IBOX_BPS, DataFormat::Fmt8N1, true, IBOX_VMIN) {
			Ok(opened) => {
				info!("opened iBox device {device}");
				*port = Some(opened);
				true
			}
			Err(err) => {
				error!("cannot open iBox device {device}: {err}");
				false
			}
		}
	}

	fn status_report(&self, record: &str) {
		info!("iBox response: {record}");
		let msg = format!("{record}\n");
		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs() as u32)
			.unwrap_or(0);
		match Packet::init(
			PKT_CLIENT_FORMAT_3,
			"%2U%4U%*s%1U",
			&[
				FmtArg::U(u32::from(STATUS_IBOX)),
				FmtArg::U(now),
				FmtArg::Blob(msg.as_bytes()),
				FmtArg::U(0),
			],
		) {
			Ok(packet) => self.sink.add_packet(packet),
			Err(err) => error!("cannot format iBox report: {err}"),
		}
	}
}

/// Issue one request and verify the reply.
///
/// Blocks the calling thread for at most `timeout` plus the quiet window of
/// the final serial read. Returns the reply payload (the bytes between PID
/// and checksum).
pub fn request_pid(
	port: &mut SerialPort,
	mid: u8,
	pid: u8,
	payload: &[u8],
	timeout: Duration,
) -> Result<Vec<u8>, FrameError> {
	if !is_known_pid(pid) {
		return Err(FrameError::Pid(pid));
	}
	let frame = build_request(mid, pid, payload);
	port.write(&frame).map_err(|_| FrameError::Write)?;

	let mut resp = [0u8; RESP_SIZE];
	let n = port
		.read_available(&mut resp, timeout)
		.map_err(|_| FrameError::Read)?;
	if n == 0 {
		return Err(FrameError::NoData);
	}
	let reply = verify_reply(&resp[..n], mid, pid)?;
	Ok(reply.payload.to_vec())
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use super::*;
	use crate::ibox::checksum;
	use crate::serial::testutil::Pty;

	struct CollectSink {
		packets: Mutex<Vec<Packet>>,
	}

	impl CollectSink {
		fn new() -> Arc<Self> {
			Arc::new(CollectSink {
				packets: Mutex::new(Vec::new()),
			})
		}
	}

	impl EventSink for CollectSink {
		fn add_packet(&self, packet: Packet) {
			self.packets.lock().unwrap().push(packet);
		}
	}

	fn engine_with_store() -> (IboxEngine, Arc<PropStore>, Arc<CollectSink>) {
		let props = Arc::new(PropStore::new());
		let sink = CollectSink::new();
		let queue: Arc<dyn EventSink> = Arc::clone(&sink) as Arc<dyn EventSink>;
		let engine = IboxEngine::new(Arc::clone(&props), queue, Arc::new(AtomicBool::new(false)));
		(engine, props, sink)
	}

	#[test]
	fn scan_adds_and_removes_descriptors() {
		let (engine, props, _) = engine_with_store();
		let mut slots = BTreeMap::new();

		engine.scan_request_pids(&mut slots);
		assert!(slots.is_empty());

		props.set_u32_at(PROP_IBOX_96_REQUEST, 0, 30).unwrap();
		props.set_u32_at(PROP_IBOX_96_REQUEST, 1, 2).unwrap();
		engine.scan_request_pids(&mut slots);
		assert_eq!(
			slots.get(&FUEL_LEVEL),
			Some(&RequestSlot {
				rate: 30,
				timeout: 2,
				last_sample: 0
			})
		);

		props.set_u32_at(PROP_IBOX_96_REQUEST, 0, 0).unwrap();
		engine.scan_request_pids(&mut slots);
		assert!(slots.is_empty());
	}

	#[test]
	fn one_shot_rate_rewrites_to_zero() {
		let (engine, props, _) = engine_with_store();
		let mut slots = BTreeMap::new();

		props
			.set_u32_at(PROP_IBOX_168_REQUEST, 0, RATE_ONE_SHOT)
			.unwrap();
		engine.scan_request_pids(&mut slots);
		assert_eq!(slots.get(&BATTERY_VOLTAGE).unwrap().rate, RATE_ONE_SHOT);
		assert!(slots.get(&BATTERY_VOLTAGE).unwrap().due(0));
		assert_eq!(props.get_u32_at(PROP_IBOX_168_REQUEST, 0, 99), 0);

		// the next scan drops the spent descriptor
		engine.scan_request_pids(&mut slots);
		assert!(slots.is_empty());
	}

	#[test]
	fn due_honors_the_sample_rate() {
		let slot = RequestSlot {
			rate: 30,
			timeout: 1,
			last_sample: 10,
		};
		assert!(!slot.due(11));
		assert!(!slot.due(39));
		assert!(slot.due(40));
		assert!(slot.due(500));
	}

	#[test]
	fn request_round_trip_over_a_pty() {
		let pty = Pty::new();
		let mut port =
			SerialPort::open(&pty.slave_path, 9600, DataFormat::Fmt8N1, true, 4).unwrap();

		let responder = std::thread::spawn(move || {
			let mut req = [0u8; 4];
			let mut got = 0;
			while got < 4 {
				got += pty.take(&mut req[got..]);
			}
			assert_eq!(req, [0x93, 0x00, 0x60, 0x0D]);
			let mut reply = vec![0x93, 0x00, 0x60, 0x2A];
			reply.push(checksum(&reply));
			pty.feed(&reply);
			// hold the master open until the reader is done
			std::thread::sleep(Duration::from_millis(500));
		});

		let payload = request_pid(&mut port, 147, FUEL_LEVEL, &[], Duration::from_secs(5)).unwrap();
		assert_eq!(payload, vec![0x2A]);
		responder.join().unwrap();
	}

	#[test]
	fn request_timeout_yields_no_data() {
		let pty = Pty::new();
		let mut port =
			SerialPort::open(&pty.slave_path, 9600, DataFormat::Fmt8N1, true, 4).unwrap();
		let err = request_pid(&mut port, 147, FUEL_LEVEL, &[], Duration::from_millis(200))
			.expect_err("no reply must time out");
		assert_eq!(err, FrameError::NoData);
		drop(pty);
	}

	#[test]
	fn unknown_pid_is_rejected_without_io() {
		let pty = Pty::new();
		let mut port =
			SerialPort::open(&pty.slave_path, 9600, DataFormat::Fmt8N1, true, 4).unwrap();
		let err = request_pid(&mut port, 147, 42, &[], Duration::from_millis(50))
			.expect_err("PID 42 is not in the catalog");
		assert_eq!(err, FrameError::Pid(42));
	}

	#[test]
	fn one_shot_cycle_reports_the_reply_through_the_sink() {
		let (engine, props, sink) = engine_with_store();
		let pty = Pty::new();
		// pre-opened port: the configured device path is not a pty
		let mut port = Some(
			SerialPort::open(&pty.slave_path, 9600, DataFormat::Fmt8N1, true, 4).unwrap(),
		);
		props
			.set_u32_at(PROP_IBOX_96_REQUEST, 0, RATE_ONE_SHOT)
			.unwrap();
		props.set_u32_at(PROP_IBOX_96_REQUEST, 1, 2).unwrap();

		let responder = std::thread::spawn(move || {
			let mut req = [0u8; 4];
			let mut got = 0;
			while got < 4 {
				got += pty.take(&mut req[got..]);
			}
			assert_eq!(req, [0x93, 0x00, 0x60, 0x0D]);
			let mut reply = vec![0x93, 0x00, 0x60, 0x2A];
			reply.push(checksum(&reply));
			pty.feed(&reply);
			std::thread::sleep(Duration::from_millis(500));
		});

		let mut slots = BTreeMap::new();
		assert!(engine.cycle(&mut slots, &mut port));
		responder.join().unwrap();

		let packets = sink.packets.lock().unwrap();
		assert_eq!(packets.len(), 1);
		let payload = packets[0].payload();
		// status(2) + time(4) + length-counted "096,2a\n" + seq
		let record = &payload[7..payload.len() - 1];
		assert_eq!(record, b"096,2a\n");
		assert_eq!(payload[6] as usize, record.len());
	}

	#[test]
	fn command_consumes_the_property_and_reports() {
		let (engine, props, sink) = engine_with_store();
		// bad hex: the command is consumed, logged, and no request goes out
		props.set_string(PROP_IBOX_205_COMMAND, "zz").unwrap();
		let mut port = None;
		engine.run_commands(&mut port);
		assert_eq!(props.get_string(PROP_IBOX_205_COMMAND, ""), "");
		assert!(port.is_none());
		assert!(sink.packets.lock().unwrap().is_empty());
	}
}
