//! Tagged diagnostic events.
//!
//! Workers report noteworthy state transitions (network down, RTS pin
//! change, supervisor alerts, ...) through one channel. Every report lands
//! in the log; subscribers additionally receive a copy so the protocol pump
//! can turn reports into uplink events.

use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Diagnostic event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagEvent {
	ConnectionDown,
	ConnectionRebuilt,
	ConnectionCheck,
	GpsLost,
	ClientReboot,
	LibraryStuck,
	Dhcp,
	Message,
	CellDown,
}

impl DiagEvent {
	/// Wire tag carried in uplink diagnostic records.
	pub fn code(self) -> u8 {
		match self {
			DiagEvent::ConnectionDown => 1,
			DiagEvent::ConnectionRebuilt => 2,
			DiagEvent::ConnectionCheck => 3,
			DiagEvent::GpsLost => 4,
			DiagEvent::ClientReboot => 5,
			DiagEvent::LibraryStuck => 6,
			DiagEvent::Dhcp => 7,
			DiagEvent::Message => 8,
			DiagEvent::CellDown => 9,
		}
	}
}

/// Reasons handed to the reboot helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootReason {
	LibraryStuck,
	DownTooLong,
}

#[derive(Debug, Clone)]
pub struct DiagReport {
	pub event: DiagEvent,
	pub arg: i32,
	pub text: String,
}

/// Fan-out point for diagnostic reports.
#[derive(Default)]
pub struct DiagChannel {
	subscribers: Mutex<Vec<Sender<DiagReport>>>,
}

impl DiagChannel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attach a subscriber. Dead receivers are pruned on the next report.
	pub fn subscribe(&self, tx: Sender<DiagReport>) {
		self.subscribers.lock().unwrap().push(tx);
	}

	pub fn report(&self, event: DiagEvent, arg: i32, text: &str) {
		match event {
			DiagEvent::ConnectionDown | DiagEvent::CellDown | DiagEvent::LibraryStuck => {
				warn!("diagnostic {event:?}({arg}): {text}");
			}
			_ => info!("diagnostic {event:?}({arg}): {text}"),
		}
		let report = DiagReport {
			event,
			arg,
			text: String::from(text),
		};
		let mut subs = self.subscribers.lock().unwrap();
		subs.retain(|tx| tx.send(report.clone()).is_ok());
	}
}

#[cfg(test)]
mod tests {
	use std::sync::mpsc;

	use super::*;

	#[test]
	fn reports_reach_all_subscribers() {
		let chan = DiagChannel::new();
		let (tx1, rx1) = mpsc::channel();
		let (tx2, rx2) = mpsc::channel();
		chan.subscribe(tx1);
		chan.subscribe(tx2);

		chan.report(DiagEvent::Message, 0, "RTS Powered ON");

		for rx in [rx1, rx2] {
			let report = rx.try_recv().unwrap();
			assert_eq!(report.event, DiagEvent::Message);
			assert_eq!(report.text, "RTS Powered ON");
		}
	}

	#[test]
	fn dead_subscribers_are_pruned() {
		let chan = DiagChannel::new();
		let (tx, rx) = mpsc::channel();
		chan.subscribe(tx);
		drop(rx);

		chan.report(DiagEvent::ConnectionCheck, 1, "checking");
		assert!(chan.subscribers.lock().unwrap().is_empty());
	}
}
