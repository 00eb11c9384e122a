//! Device agent core for a small embedded Linux telematics unit.
//!
//! The agent polls a serial-attached transport refrigeration controller
//! ("iBox") speaking the MID/PID convention, reports structured events to a
//! DMTP server over a reliable-UDP or TCP transport, and is configured
//! end-to-end through a typed, persistent property store. A supervisor
//! thread collects liveness votes from the long-lived workers and escalates
//! to an alert and finally a reboot when they wedge.

#[macro_use]
extern crate log;

pub mod diag;
pub mod ibox;
pub mod logging;
pub mod monitor;
pub mod packet;
pub mod props;
pub mod runtime;
pub mod serial;
pub mod transport;
pub mod watchdog;

pub use crate::props::PropStore;
pub use crate::runtime::Agent;
