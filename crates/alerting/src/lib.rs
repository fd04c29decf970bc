//! Alerting System
//!
//! Provides the edge-triggered drowsiness alarm latch and the
//! non-blocking actuator that plays the alert sound.

mod actuator;
mod controller;
mod sink;

pub use actuator::AlarmActuator;
pub use controller::{AlarmController, AlarmDecision};
pub use sink::{AlarmSink, CommandSink, LogSink, RecordingSink};

use thiserror::Error;

/// Alarm side-effect errors
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("Alarm resource unavailable: {0}")]
    ResourceUnavailable(String),
    #[error("Alarm player failed: {0}")]
    Playback(String),
}
