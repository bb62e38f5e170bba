//! frame level amplitude envelope with instant attack and slow decay
//!
//! The envelope is what the UI uses for the "is there still sound" fade
//! out, and the per-frame peak drives the noise gate decision.
use crate::utils::frame_peak;

/// per-frame decay factor.  At ~60 frames a second this holds a usable
/// envelope for a second or two after a note stops.
pub const FRAME_DECAY: f32 = 0.98;

pub struct PeakTracker {
    peak: f32,
    last_frame_peak: f32,
}

impl PeakTracker {
    pub fn new() -> PeakTracker {
        PeakTracker {
            peak: 0.0,
            last_frame_peak: 0.0,
        }
    }

    /// update the envelope with one frame.  Attack is instantaneous, decay
    /// is geometric: peak = max(framePeak, peak * 0.98)
    pub fn add_frame(&mut self, frame: &[f32]) -> f32 {
        self.last_frame_peak = frame_peak(frame);
        self.peak = f32::max(self.last_frame_peak, self.peak * FRAME_DECAY);
        self.level()
    }

    /// current envelope normalized to [0, 1] against full scale
    pub fn level(&self) -> f32 {
        self.peak.clamp(0.0, 1.0)
    }

    /// gate decision uses the current frame's own peak, not the decaying
    /// envelope, so a fading tail can't hold the analysis gate open
    pub fn gate_open(&self, threshold: f32) -> bool {
        self.last_frame_peak >= threshold
    }

    /// only on stream restart
    pub fn reset(&mut self) -> () {
        self.peak = 0.0;
        self.last_frame_peak = 0.0;
    }
}

#[cfg(test)]
mod test_peak_tracker {
    use super::*;

    #[test]
    fn instant_attack() {
        let mut tracker = PeakTracker::new();
        assert_eq!(tracker.add_frame(&[0.0, 0.5, -0.1]), 0.5);
    }

    #[test]
    fn geometric_decay() {
        let mut tracker = PeakTracker::new();
        tracker.add_frame(&[1.0; 16]);
        let silent = [0.0f32; 16];
        let n = 20;
        let mut last = tracker.level();
        for _ in 0..n {
            let v = tracker.add_frame(&silent);
            // decays but never snaps to zero
            assert!(v < last && v > 0.0);
            last = v;
        }
        let expected = FRAME_DECAY.powi(n);
        assert!((tracker.level() - expected).abs() < 1e-5);
    }

    #[test]
    fn gate_tracks_frame_not_envelope() {
        let mut tracker = PeakTracker::new();
        tracker.add_frame(&[1.0; 16]);
        assert!(tracker.gate_open(0.05));
        tracker.add_frame(&[0.0; 16]);
        // envelope is still high but the gate must close
        assert!(tracker.level() > 0.9);
        assert!(!tracker.gate_open(0.05));
    }
}
