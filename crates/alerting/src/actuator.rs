//! Fire-and-forget alarm actuator

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sink::AlarmSink;

/// Handle used by the frame loop to request an alarm
///
/// Requests go to a single background task, so playback is serialized.
/// The queue holds one pending request; triggers arriving while one is
/// already pending are dropped.
#[derive(Debug, Clone)]
pub struct AlarmActuator {
    sender: mpsc::Sender<()>,
}

impl AlarmActuator {
    /// Spawn the playback task on the current tokio runtime
    pub fn spawn(sink: Arc<dyn AlarmSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let sink = Arc::clone(&sink);
                match tokio::task::spawn_blocking(move || sink.play_alert()).await {
                    Ok(Ok(())) => debug!("Alarm played"),
                    Ok(Err(e)) => warn!("Couldn't play alarm sound: {}", e),
                    Err(e) => warn!("Alarm playback task failed: {}", e),
                }
            }
            info!("Alarm actuator stopped");
        });

        (Self { sender: tx }, handle)
    }

    /// Request an alarm without waiting; returns whether it was queued
    pub fn trigger(&self) -> bool {
        match self.sender.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                debug!("Alarm already pending, trigger dropped");
                false
            }
            Err(TrySendError::Closed(())) => {
                warn!("Alarm actuator is not running");
                false
            }
        }
    }
}
