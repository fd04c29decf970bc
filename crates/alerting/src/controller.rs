//! Edge-triggered alarm controller

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actuator::AlarmActuator;

/// What the controller did for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmDecision {
    /// No sustained closure
    Idle,
    /// Rising edge: a new drowsy episode started and the alarm was requested
    Fire,
    /// Closure still sustained, alarm already fired for this episode
    EpisodeActive,
}

/// Fires the alarm once per sustained-closure episode
///
/// `active` latches on the first sustained frame and only clears once the
/// closure ends, so a long episode produces a single alarm.
#[derive(Debug, Default)]
pub struct AlarmController {
    active: bool,
    actuator: Option<AlarmActuator>,
}

impl AlarmController {
    /// Controller dispatching alarms to a running actuator
    pub fn new(actuator: AlarmActuator) -> Self {
        info!("Creating alarm controller");
        Self {
            active: false,
            actuator: Some(actuator),
        }
    }

    /// Controller that only decides; no side effect is produced
    pub fn detached() -> Self {
        Self::default()
    }

    /// Update with the debounced closure state of the current frame
    pub fn on_frame(&mut self, sustained: bool) -> AlarmDecision {
        match (sustained, self.active) {
            (true, false) => {
                self.active = true;
                warn!("Drowsiness alarm fired");
                if let Some(actuator) = &self.actuator {
                    actuator.trigger();
                }
                AlarmDecision::Fire
            }
            (true, true) => AlarmDecision::EpisodeActive,
            (false, true) => {
                self.active = false;
                debug!("Drowsy episode ended, alarm re-armed");
                AlarmDecision::Idle
            }
            (false, false) => AlarmDecision::Idle,
        }
    }

    /// Whether the current episode has already fired
    pub fn is_active(&self) -> bool {
        self.active
    }
}
