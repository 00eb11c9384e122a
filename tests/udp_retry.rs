//! End-to-end retransmission behavior of the reliable-UDP transport
//! against a real loopback peer.

use std::net::UdpSocket;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dmtp_agent::props::keys::{PROP_COMM_HOST, PROP_COMM_PORT, PROP_COMM_UDP_TIMER};
use dmtp_agent::props::PropStore;
use dmtp_agent::transport::udp::UdpTransport;
use dmtp_agent::transport::{CommError, Transport, UrlId};

fn store_for(port: u16, timer: &str) -> Arc<PropStore> {
	let props = Arc::new(PropStore::new());
	props.set_string(PROP_COMM_HOST, "127.0.0.1").unwrap();
	props.set_u32(PROP_COMM_PORT, u32::from(port)).unwrap();
	props.set_from_str(PROP_COMM_UDP_TIMER, timer).unwrap();
	props
}

#[test]
fn silent_peer_sees_sequences_0_1_2_spaced_by_the_timer() {
	let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
	let port = peer.local_addr().unwrap().port();

	// one-second timer, two retries
	let props = store_for(port, "1,2");
	let mut udp = UdpTransport::new(props);
	udp.initialize(600);
	udp.open().unwrap();

	let start = Instant::now();
	let collector = thread::spawn(move || {
		peer.set_read_timeout(Some(Duration::from_secs(6))).unwrap();
		let mut seen = Vec::new();
		let mut buf = [0u8; 64];
		for _ in 0..3 {
			let n = peer.recv(&mut buf).unwrap();
			assert_eq!(&buf[1..n], b"X");
			seen.push((buf[0], start.elapsed()));
		}
		seen
	});

	udp.write_packet(b"X").unwrap();
	let mut reply = [0u8; 64];
	let err = udp.read_packet(&mut reply).expect_err("nobody answers");
	assert!(matches!(err, CommError::Timeout));

	// timeout after three one-second waits
	let total = start.elapsed();
	assert!(total >= Duration::from_millis(2900), "returned after {total:?}");
	assert!(total < Duration::from_secs(9), "returned after {total:?}");

	let seen = collector.join().unwrap();
	let seqs: Vec<u8> = seen.iter().map(|&(seq, _)| seq).collect();
	assert_eq!(seqs, vec![0, 1, 2]);

	// resends land roughly one timer apart
	assert!(seen[0].1 < Duration::from_millis(900));
	assert!(seen[1].1 >= Duration::from_millis(900) && seen[1].1 < Duration::from_millis(2500));
	assert!(seen[2].1 >= Duration::from_millis(1900) && seen[2].1 < Duration::from_millis(3500));
}

#[test]
fn read_returns_as_soon_as_the_peer_answers() {
	let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
	let port = peer.local_addr().unwrap().port();

	let props = store_for(port, "5,3");
	let mut udp = UdpTransport::new(props);
	udp.initialize(600);
	udp.open().unwrap();

	let responder = thread::spawn(move || {
		peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
		let mut buf = [0u8; 64];
		let (n, from) = peer.recv_from(&mut buf).unwrap();
		assert_eq!(buf[0], 0);
		peer.send_to(&buf[..n], from).unwrap();
	});

	udp.write_packet(b"event").unwrap();
	let start = Instant::now();
	let mut reply = [0u8; 64];
	let n = udp.read_packet(&mut reply).unwrap();
	assert_eq!(&reply[..n], b"\0event");
	assert!(start.elapsed() < Duration::from_secs(4));
	responder.join().unwrap();
}

#[test]
fn cached_address_survives_reopen_until_reset() {
	let peer_a = UdpSocket::bind("127.0.0.1:0").unwrap();
	let peer_b = UdpSocket::bind("127.0.0.1:0").unwrap();
	let port_a = peer_a.local_addr().unwrap().port();
	let port_b = peer_b.local_addr().unwrap().port();

	let props = store_for(port_a, "1,1");
	let mut udp = UdpTransport::new(Arc::clone(&props));
	udp.initialize(600);
	udp.open().unwrap();
	udp.write_packet(b"first").unwrap();

	let mut buf = [0u8; 64];
	peer_a
		.set_read_timeout(Some(Duration::from_secs(5)))
		.unwrap();
	peer_b
		.set_read_timeout(Some(Duration::from_millis(500)))
		.unwrap();
	peer_a.recv(&mut buf).unwrap();

	// repoint the properties without reset: the cached address wins
	props.set_u32(PROP_COMM_PORT, u32::from(port_b)).unwrap();
	udp.close();
	udp.open().unwrap();
	udp.write_packet(b"second").unwrap();
	peer_a.recv(&mut buf).unwrap();
	assert!(peer_b.recv(&mut buf).is_err(), "reset was not issued yet");

	// reset picks up the new endpoint
	udp.close();
	udp.reset(UrlId::Primary);
	udp.open().unwrap();
	udp.write_packet(b"third").unwrap();
	peer_b
		.set_read_timeout(Some(Duration::from_secs(5)))
		.unwrap();
	let n = peer_b.recv(&mut buf).unwrap();
	assert_eq!(&buf[1..n], b"third");
}
