//! Scheduled polling of the KLAPP inbox

mod coordinator;

pub use coordinator::Poller;
