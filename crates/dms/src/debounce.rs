//! Consecutive-frame debouncing of eye closure and yawns

use face_geometry::FrameSignals;
use tracing::{debug, trace};

use crate::config::DmsConfig;

/// Debounced events of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebounceOutcome {
    /// Eyes have been closed for at least `eye_ar_consec_frames` frames
    pub sustained_closure: bool,
    /// This frame completed a yawn confirmation window
    pub yawn_confirmed: bool,
}

/// Two saturating counters turning threshold crossings into events
///
/// The eye counter resets on the first open-eye frame. The yawn counter
/// only resets when it confirms a yawn, so an open mouth held past the
/// window confirms again every `yawn_confirm_frames` frames, and isolated
/// open-mouth frames keep accumulating until they reach the window.
#[derive(Debug, Clone)]
pub struct TemporalDebouncer {
    min_ear: f64,
    eye_frames_needed: u32,
    yawn_threshold: f64,
    yawn_frames_needed: u32,
    low_eye_frames: u32,
    high_mouth_frames: u32,
}

impl TemporalDebouncer {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            min_ear: config.min_ear,
            eye_frames_needed: config.eye_ar_consec_frames.max(1),
            yawn_threshold: config.yawn_threshold,
            yawn_frames_needed: config.yawn_confirm_frames.max(1),
            low_eye_frames: 0,
            high_mouth_frames: 0,
        }
    }

    /// Feed the primary face's signals for one frame
    ///
    /// A missing EAR leaves the eye counter untouched; an unmeasured mouth
    /// leaves the yawn counter untouched.
    pub fn update(&mut self, signals: &FrameSignals) -> DebounceOutcome {
        if let Some(ear) = signals.eye_aspect_ratio {
            if ear < self.min_ear {
                self.low_eye_frames = self.low_eye_frames.saturating_add(1);
                trace!("Low EAR {:.3}, {} consecutive", ear, self.low_eye_frames);
            } else {
                if self.low_eye_frames > 0 {
                    debug!("Eyes reopened after {} frames", self.low_eye_frames);
                }
                self.low_eye_frames = 0;
            }
        }

        let mut yawn_confirmed = false;
        if signals.mouth_measured && signals.mouth_aspect_ratio > self.yawn_threshold {
            self.high_mouth_frames += 1;
            if self.high_mouth_frames >= self.yawn_frames_needed {
                yawn_confirmed = true;
                self.high_mouth_frames = 0;
            }
        }

        DebounceOutcome {
            sustained_closure: self.is_sustained(),
            yawn_confirmed,
        }
    }

    /// Closure condition without feeding a new frame
    pub fn is_sustained(&self) -> bool {
        self.low_eye_frames >= self.eye_frames_needed
    }

    pub fn low_eye_frames(&self) -> u32 {
        self.low_eye_frames
    }

    pub fn high_mouth_frames(&self) -> u32 {
        self.high_mouth_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eyes(ear: f64) -> FrameSignals {
        FrameSignals::new(ear, 0.0, 0.0)
    }

    fn mouth(mar: f64) -> FrameSignals {
        FrameSignals::new(0.35, mar, 0.0)
    }

    #[test]
    fn test_closure_needs_consecutive_frames() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());

        for _ in 0..11 {
            assert!(!debouncer.update(&eyes(0.15)).sustained_closure);
        }
        assert!(debouncer.update(&eyes(0.15)).sustained_closure);
        assert_eq!(debouncer.low_eye_frames(), 12);
    }

    #[test]
    fn test_isolated_low_frame_never_sustains() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());

        for round in 0..5 {
            let low = debouncer.update(&eyes(0.15));
            assert!(!low.sustained_closure, "round {}", round);
            for _ in 0..11 {
                assert!(!debouncer.update(&eyes(0.35)).sustained_closure);
            }
        }
        assert_eq!(debouncer.low_eye_frames(), 0);
    }

    #[test]
    fn test_recovery_resets_eye_counter() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());
        for _ in 0..12 {
            debouncer.update(&eyes(0.15));
        }
        assert!(debouncer.is_sustained());

        let outcome = debouncer.update(&eyes(0.35));
        assert!(!outcome.sustained_closure);
        assert_eq!(debouncer.low_eye_frames(), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());
        debouncer.update(&eyes(0.28));
        assert_eq!(debouncer.low_eye_frames(), 0);
    }

    #[test]
    fn test_missing_ear_holds_counter() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());
        for _ in 0..5 {
            debouncer.update(&eyes(0.15));
        }
        let blind = FrameSignals {
            eye_aspect_ratio: None,
            ..Default::default()
        };
        debouncer.update(&blind);
        assert_eq!(debouncer.low_eye_frames(), 5);
    }

    #[test]
    fn test_yawn_confirms_every_third_frame() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());

        let confirmations: Vec<bool> = (0..6)
            .map(|_| debouncer.update(&mouth(0.8)).yawn_confirmed)
            .collect();

        assert_eq!(confirmations, vec![false, false, true, false, false, true]);
        assert_eq!(debouncer.high_mouth_frames(), 0);
    }

    #[test]
    fn test_fourth_frame_starts_fresh_count() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());
        for _ in 0..3 {
            debouncer.update(&mouth(0.8));
        }
        assert!(!debouncer.update(&mouth(0.8)).yawn_confirmed);
        assert_eq!(debouncer.high_mouth_frames(), 1);
    }

    #[test]
    fn test_closed_mouth_does_not_reset_yawn_counter() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig::default());
        debouncer.update(&mouth(0.8));
        debouncer.update(&mouth(0.8));
        debouncer.update(&mouth(0.1));
        assert_eq!(debouncer.high_mouth_frames(), 2);
        assert!(debouncer.update(&mouth(0.8)).yawn_confirmed);
    }

    #[test]
    fn test_unmeasured_mouth_is_ignored() {
        let mut debouncer = TemporalDebouncer::new(&DmsConfig {
            yawn_threshold: -1.0,
            ..Default::default()
        });
        let signals = FrameSignals {
            eye_aspect_ratio: Some(0.35),
            mouth_aspect_ratio: 0.0,
            mouth_measured: false,
            head_angle_degrees: 0.0,
        };
        debouncer.update(&signals);
        assert_eq!(debouncer.high_mouth_frames(), 0);
    }
}
