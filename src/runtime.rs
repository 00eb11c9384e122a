//! Scheduler glue.
//!
//! Spawns one thread per worker, routes encoded packets from the iBox
//! engine into the protocol pump, registers the liveness votes with the
//! watchdog, and owns the shared stop flag. The property store is the hub:
//! every worker re-reads its settings on each cycle, so a property write
//! (local or pushed by the server) retunes the system without restarts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::diag::{DiagChannel, DiagEvent, DiagReport};
use crate::ibox::engine::IboxEngine;
use crate::monitor::{AliveHeartbeat, RtsMonitor};
use crate::packet::{
	self, EventSink, FmtArg, Packet, PKT_CLIENT_FORMAT_3, PKT_CLIENT_PROPERTY_VALUE,
	PKT_SERVER_ACK, PKT_SERVER_GET_PROPERTY, PKT_SERVER_SET_PROPERTY,
};
use crate::props::keys::{
	PROP_COMM_BYTES_READ, PROP_COMM_BYTES_WRITTEN, PROP_COMM_MTU, PROP_STATE_IBOX_ENABLE,
	PROP_STATE_NETWORK_CHECK_WAIT_TIMES, PROP_STATE_RTS_CHECK,
};
use crate::props::PropStore;
use crate::transport::tcp::TcpTransport;
use crate::transport::udp::UdpTransport;
use crate::transport::{CommError, Transport, UrlId};
use crate::watchdog::{LivenessProbe, Watchdog};

/// Channel-backed implementation of the engine-facing event sink.
pub struct EventQueue {
	tx: Mutex<Sender<Packet>>,
}

impl EventQueue {
	pub fn new() -> (Arc<Self>, Receiver<Packet>) {
		let (tx, rx) = mpsc::channel();
		(
			Arc::new(EventQueue {
				tx: Mutex::new(tx),
			}),
			rx,
		)
	}
}

impl EventSink for EventQueue {
	fn add_packet(&self, packet: Packet) {
		if let Ok(tx) = self.tx.lock() {
			let _ = tx.send(packet);
		}
	}
}

/// Process-wide context: the property store, the transports, the engine and
/// the workers built around them.
pub struct Agent {
	props: Arc<PropStore>,
	diag: Arc<DiagChannel>,
	stop: Arc<AtomicBool>,
	watchdog: Watchdog,
	threads: Vec<JoinHandle<()>>,
	/// Keeps the uplink queue's sender side alive for late producers.
	sink: Option<Arc<EventQueue>>,
}

impl Agent {
	pub fn new(props: Arc<PropStore>) -> Self {
		let diag = Arc::new(DiagChannel::new());
		Agent {
			props,
			watchdog: Watchdog::new(Arc::clone(&diag)),
			diag,
			stop: Arc::new(AtomicBool::new(false)),
			threads: Vec::new(),
			sink: None,
		}
	}

	/// Sink for components that queue uplink packets. Only available after
	/// [`start`](Self::start).
	pub fn event_sink(&self) -> Option<Arc<EventQueue>> {
		self.sink.clone()
	}

	pub fn props(&self) -> &Arc<PropStore> {
		&self.props
	}

	pub fn diag(&self) -> &Arc<DiagChannel> {
		&self.diag
	}

	pub fn reboot_pending(&self) -> bool {
		self.watchdog.reboot_pending()
	}

	/// Spawn the workers and the supervisor.
	pub fn start(&mut self) {
		let (sink, rx) = EventQueue::new();
		self.sink = Some(Arc::clone(&sink));

		if self.props.get_u32(PROP_STATE_IBOX_ENABLE, 1) != 0 {
			let queue: Arc<dyn EventSink> = Arc::clone(&sink) as Arc<dyn EventSink>;
			let engine = IboxEngine::new(Arc::clone(&self.props), queue, Arc::clone(&self.stop));
			let probe = LivenessProbe::new(engine.beats_handle());
			self.watchdog.add_watch(Box::new(move || probe.vote()));
			self.spawn("iBoxMonitor", move || engine.run());
		}

		let pump_ticks = Arc::new(AtomicU64::new(0));
		let probe = LivenessProbe::new(Arc::clone(&pump_ticks));
		self.watchdog.add_watch(Box::new(move || probe.vote()));
		{
			// diagnostic reports ride the same uplink as iBox records
			let (diag_tx, diag_rx) = mpsc::channel();
			self.diag.subscribe(diag_tx);
			let props = Arc::clone(&self.props);
			let diag = Arc::clone(&self.diag);
			let stop = Arc::clone(&self.stop);
			self.spawn("protocol", move || {
				protocol_pump(&props, &diag, &rx, &diag_rx, &stop, &pump_ticks);
			});
		}

		if self.props.get_u32_at(PROP_STATE_RTS_CHECK, 0, 1) != 0 {
			let monitor = RtsMonitor::new(
				Arc::clone(&self.props),
				Arc::clone(&self.diag),
				Arc::clone(&self.stop),
			);
			self.spawn("RTSmonitor", move || monitor.run());
		}

		{
			let heartbeat = AliveHeartbeat::new(Arc::clone(&self.props), Arc::clone(&self.stop));
			self.spawn("alive", move || heartbeat.run());
		}

		self.watchdog
			.set_indicator(Box::new(|on| trace!("running light {}", if on { 1 } else { 0 })));
		self.watchdog.start();
		info!("agent started");
	}

	/// Cooperative shutdown: flag, then join everything.
	pub fn stop(&mut self) {
		self.stop.store(true, Ordering::Relaxed);
		self.watchdog.stop();
		for handle in self.threads.drain(..) {
			let _ = handle.join();
		}
		info!("agent stopped");
	}

	fn spawn<F>(&mut self, name: &str, body: F)
	where
		F: FnOnce() + Send + 'static,
	{
		match thread::Builder::new().name(String::from(name)).spawn(body) {
			Ok(handle) => self.threads.push(handle),
			Err(err) => error!("cannot spawn {name}: {err}"),
		}
	}
}

/// Drain the event queue into the server transport.
///
/// Uplink normally rides the reliable-UDP transport; after the configured
/// number of consecutive delivery failures the pump flips to the TCP peer
/// (and back), reporting the network state transitions on the diagnostic
/// channel. A write failure tears the socket down so the next packet
/// reopens it.
fn protocol_pump(
	props: &Arc<PropStore>,
	diag: &Arc<DiagChannel>,
	rx: &Receiver<Packet>,
	diag_rx: &Receiver<DiagReport>,
	stop: &Arc<AtomicBool>,
	ticks: &Arc<AtomicU64>,
) {
	let mtu = props.get_u32(PROP_COMM_MTU, 576) as usize;
	let mut transports: [Box<dyn Transport>; 2] = [
		Box::new(UdpTransport::new(Arc::clone(props))),
		Box::new(TcpTransport::new(Arc::clone(props))),
	];
	for transport in &mut transports {
		transport.initialize(mtu);
	}
	let mut active = 0;
	let mut failures = 0u32;
	let mut was_down = false;
	let mut backlog: VecDeque<Packet> = VecDeque::new();

	while !stop.load(Ordering::Relaxed) {
		ticks.fetch_add(1, Ordering::Relaxed);
		backlog.extend(diag_rx.try_iter().filter_map(|report| diag_packet(&report)));
		let packet = match backlog.pop_front() {
			Some(packet) => packet,
			None => match rx.recv_timeout(Duration::from_secs(1)) {
				Ok(packet) => packet,
				Err(RecvTimeoutError::Timeout) => continue,
				Err(RecvTimeoutError::Disconnected) => break,
			},
		};
		let bytes = packet.encode();

		match deliver(props, transports[active].as_mut(), &bytes) {
			Ok(acked) => {
				failures = 0;
				if was_down {
					diag.report(DiagEvent::ConnectionRebuilt, active as i32, "uplink restored");
					was_down = false;
				}
				if !acked {
					debug!("no server reply before timeout");
				}
			}
			Err(err) => {
				failures += 1;
				warn!("uplink delivery failed ({failures}): {err}");
				transports[active].close();
				if !was_down {
					diag.report(DiagEvent::ConnectionDown, active as i32, "uplink lost");
					was_down = true;
				}
				let flip_after = props.get_u32(PROP_STATE_NETWORK_CHECK_WAIT_TIMES, 3).max(1);
				if failures >= flip_after {
					active ^= 1;
					failures = 0;
					diag.report(
						DiagEvent::ConnectionCheck,
						active as i32,
						"switching uplink transport",
					);
				}
			}
		}
	}
	for transport in &mut transports {
		transport.close();
	}
}

/// Encode a diagnostic report for uplink: status code, UNIX time, the
/// event tag, the message text, and a rewritable sequence byte.
fn diag_packet(report: &DiagReport) -> Option<Packet> {
	let text = format!("{}\n", report.text);
	let now = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs() as u32)
		.unwrap_or(0);
	Packet::init(
		PKT_CLIENT_FORMAT_3,
		"%2U%4U%1U%*s%1U",
		&[
			FmtArg::U(u32::from(packet::STATUS_DIAGNOSTIC)),
			FmtArg::U(now),
			FmtArg::U(u32::from(report.event.code())),
			FmtArg::Blob(text.as_bytes()),
			FmtArg::U(0),
		],
	)
	.ok()
}

/// Push one packet out and wait for the server's reply window.
///
/// Returns `Ok(true)` when the server answered, `Ok(false)` when the write
/// went out but no reply arrived (an acceptable outcome for speak-first
/// event batches). Whatever the server sent back is applied immediately.
fn deliver(
	props: &PropStore,
	transport: &mut dyn Transport,
	bytes: &[u8],
) -> Result<bool, CommError> {
	if !transport.is_open() {
		transport.reset(UrlId::Primary);
		transport.open()?;
	}
	transport.write_packet(bytes)?;
	let _ = props.add_u32(PROP_COMM_BYTES_WRITTEN, bytes.len() as u32);
	let mut ack = [0u8; 600];
	match transport.read_packet(&mut ack) {
		Ok(n) => {
			debug!("server replied with {n} bytes");
			let _ = props.add_u32(PROP_COMM_BYTES_READ, n as u32);
			handle_server_frames(props, transport, &ack[..n]);
			Ok(true)
		}
		Err(CommError::Timeout) => Ok(false),
		Err(err) => Err(err),
	}
}

/// Land server packets: property writes mutate the store, property reads
/// answer with the current value, acknowledgements are logged.
///
/// The reliable-UDP transport prefixes every datagram with its sequence
/// byte, so that byte is skipped before frame splitting when present.
fn handle_server_frames(props: &PropStore, transport: &mut dyn Transport, data: &[u8]) {
	let frames = match packet::parse_frames(data) {
		Ok(frames) => frames,
		Err(_) if !data.is_empty() => match packet::parse_frames(&data[1..]) {
			Ok(frames) => frames,
			Err(err) => {
				warn!("undecodable server reply: {err}");
				return;
			}
		},
		Err(err) => {
			warn!("undecodable server reply: {err}");
			return;
		}
	};

	for (ptype, payload) in frames {
		match ptype {
			PKT_SERVER_SET_PROPERTY => {
				if payload.len() < 2 {
					warn!("property write without a key");
					continue;
				}
				let key = u16::from_be_bytes([payload[0], payload[1]]);
				match props.set_from_wire(key, &payload[2..]) {
					Ok(()) => info!("server set property 0x{key:04X}"),
					Err(err) => warn!("server property write 0x{key:04X}: {err}"),
				}
			}
			PKT_SERVER_GET_PROPERTY => {
				if payload.len() < 2 {
					warn!("property read without a key");
					continue;
				}
				let key = u16::from_be_bytes([payload[0], payload[1]]);
				match props.to_wire(key) {
					Ok(value) => {
						let reply = Packet::init(
							PKT_CLIENT_PROPERTY_VALUE,
							"%2U%*s",
							&[FmtArg::U(u32::from(key)), FmtArg::Blob(&value)],
						);
						match reply {
							Ok(reply) => {
								if let Err(err) = transport.write_packet(&reply.encode()) {
									warn!("cannot answer property read: {err}");
								}
							}
							Err(err) => warn!("cannot encode property value: {err}"),
						}
					}
					Err(err) => warn!("server property read 0x{key:04X}: {err}"),
				}
			}
			PKT_SERVER_ACK => debug!("server acknowledged"),
			other => debug!("unhandled server packet type 0x{other:02X}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::packet::{PACKET_HEADER, PKT_CLIENT_FORMAT_3};
	use crate::props::keys::PROP_IBOX_MID;

	/// Transport double recording writes, never connected to anything.
	struct RecordingTransport {
		written: Vec<Vec<u8>>,
	}

	impl RecordingTransport {
		fn new() -> Self {
			RecordingTransport {
				written: Vec::new(),
			}
		}
	}

	impl Transport for RecordingTransport {
		fn initialize(&mut self, _buf_size: usize) {}

		fn open(&mut self) -> Result<(), CommError> {
			Ok(())
		}

		fn close(&mut self) {}

		fn is_open(&self) -> bool {
			true
		}

		fn write_packet(&mut self, buf: &[u8]) -> Result<usize, CommError> {
			self.written.push(buf.to_vec());
			Ok(buf.len())
		}

		fn read_packet(&mut self, _buf: &mut [u8]) -> Result<usize, CommError> {
			Err(CommError::Timeout)
		}

		fn read_flush(&mut self) {}

		fn reset(&mut self, _url_id: UrlId) {}
	}

	#[test]
	fn server_property_write_lands_in_the_store() {
		let props = PropStore::new();
		let mut transport = RecordingTransport::new();
		// sequence prefix 0, then SET ibox.mid = 200 (u32 payload)
		let data = [
			0, PACKET_HEADER, PKT_SERVER_SET_PROPERTY, 6, 0xEF, 0x31, 0, 0, 0, 200,
		];
		handle_server_frames(&props, &mut transport, &data);
		assert_eq!(props.get_u32(PROP_IBOX_MID, 147), 200);
		assert!(transport.written.is_empty());
	}

	#[test]
	fn server_property_read_is_answered_with_the_value() {
		let props = PropStore::new();
		let mut transport = RecordingTransport::new();
		let data = [PACKET_HEADER, PKT_SERVER_GET_PROPERTY, 2, 0xEF, 0x31];
		handle_server_frames(&props, &mut transport, &data);

		assert_eq!(transport.written.len(), 1);
		let reply = &transport.written[0];
		// header, type, length, key, length-counted value (u32 147)
		assert_eq!(reply[0], PACKET_HEADER);
		assert_eq!(reply[1], PKT_CLIENT_PROPERTY_VALUE);
		assert_eq!(&reply[3..5], &[0xEF, 0x31]);
		assert_eq!(&reply[5..], &[4, 0, 0, 0, 147]);
	}

	#[test]
	fn read_only_property_rejects_the_server_write() {
		let props = PropStore::new();
		let mut transport = RecordingTransport::new();
		// cfg.gps.bps is read-only from the wire
		let data = [
			PACKET_HEADER, PKT_SERVER_SET_PROPERTY, 6, 0xEF, 0x22, 0, 0, 0x12, 0xC0,
		];
		handle_server_frames(&props, &mut transport, &data);
		assert_eq!(props.get_u32(crate::props::keys::PROP_CFG_GPS_BPS, 0), 9600);
	}

	#[test]
	fn diagnostic_reports_become_uplink_packets() {
		let report = DiagReport {
			event: DiagEvent::Message,
			arg: 0,
			text: String::from("RTS Powered ON"),
		};
		let pkt = diag_packet(&report).unwrap();
		let payload = pkt.payload();
		assert_eq!(&payload[..2], &[0xE0, 0x30]);
		assert_eq!(payload[6], DiagEvent::Message.code());
		let len = usize::from(payload[7]);
		assert_eq!(&payload[8..8 + len], b"RTS Powered ON\n");
		// the trailing sequence byte stays rewritable
		assert_eq!(pkt.seq_pos, Some(payload.len() - 1));
	}

	#[test]
	fn event_queue_routes_packets() {
		let (sink, rx) = EventQueue::new();
		let packet = Packet::init(PKT_CLIENT_FORMAT_3, "%1U", &[FmtArg::U(9)]).unwrap();
		sink.add_packet(packet.clone());
		assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), packet);
	}

	#[test]
	fn agent_starts_and_stops_cleanly() {
		let props = Arc::new(PropStore::new());
		// no serial hardware in the test environment
		props.set_u32(PROP_STATE_IBOX_ENABLE, 0).unwrap();
		props.set_u32_at(PROP_STATE_RTS_CHECK, 0, 0).unwrap();

		let mut agent = Agent::new(Arc::clone(&props));
		agent.start();
		thread::sleep(Duration::from_millis(200));
		agent.stop();
		assert!(!agent.reboot_pending());
	}
}
