//! Long-lived monitor workers and one-shot snapshot helpers.

pub mod alive;
pub mod cell;
pub mod rts;

pub use self::alive::AliveHeartbeat;
pub use self::rts::RtsMonitor;
