//! time domain fundamental frequency estimation
//!
//! Normalized squared difference search: slide the signal against itself
//! for every candidate lag and score how badly the two copies disagree.
//! A perfectly periodic signal scores 0 at its period; broadband noise
//! never gets near the confidence threshold.
use std::fmt::{self, Display};

/// comparison window length in samples
pub const WINDOW_SIZE: usize = 2048;
/// frames delivered by the capture collaborator
pub const FRAME_SIZE: usize = 4096;
/// reject estimates whose normalized difference is at or above this.
/// Empirical: tight enough to toss broadband noise, loose enough for the
/// harmonics and attack transients of real plucked instruments.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
/// lag search bounds cover the playable range of the supported instruments
pub const MIN_FREQ: f32 = 24.0;
pub const MAX_FREQ: f32 = 600.0;

/// one frame's raw estimate.  normalized_diff is in [0, 2], 0 = perfect
/// periodicity.
#[derive(Debug, Clone, Copy)]
pub struct PitchEstimate {
    pub frequency: f32,
    pub normalized_diff: f32,
}

pub struct PitchEstimator {
    sample_rate: f32,
    min_lag: usize,
    max_lag: usize,
    confidence_threshold: f32,
}

impl PitchEstimator {
    pub fn new(sample_rate: f32) -> PitchEstimator {
        let min_lag = usize::max((sample_rate / MAX_FREQ) as usize, 2);
        let max_lag = (sample_rate / MIN_FREQ).ceil() as usize;
        PitchEstimator {
            sample_rate,
            min_lag,
            max_lag,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// the 0.25 default is an empirical constant, not physics.  Exposed so
    /// it can be tuned against recorded test audio.
    pub fn set_confidence_threshold(&mut self, threshold: f32) -> () {
        self.confidence_threshold = threshold;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// estimate the fundamental of one frame.  None means "no pitch this
    /// frame": frame too short, or nothing scored under the confidence
    /// threshold.
    ///
    /// The shortest qualifying lag wins, not the global minimum: every
    /// multiple of the true period scores just as well, so a global
    /// search lands on subharmonics an octave or more low.  We walk lags
    /// upward and take the first local dip under the threshold, then
    /// refine the lag with a parabola through its neighbors.
    pub fn estimate(&self, frame: &[f32]) -> Option<PitchEstimate> {
        if frame.len() < WINDOW_SIZE + self.min_lag + 1 {
            return None;
        }
        // lags that would read past the frame are invalid
        let max_lag = usize::min(self.max_lag, frame.len() - WINDOW_SIZE);

        // Tiny shifts always line up with themselves, so the scan starts
        // below min_lag and arms only after the score has climbed above
        // the threshold once - the trivial zero-shift dip can't be
        // mistaken for a period that way.
        let mut armed = false;
        let mut nd_prev2 = f32::MAX;
        let mut nd_prev = f32::MAX;
        for lag in 2..max_lag {
            let nd = self.normalized_diff(frame, lag);
            if !armed {
                armed = nd >= self.confidence_threshold;
            } else if nd_prev < self.confidence_threshold
                && nd_prev < nd_prev2
                && nd_prev < nd
                && lag - 1 >= self.min_lag
            {
                // first dip bottomed out at lag-1
                return Some(self.refine(lag - 1, nd_prev2, nd_prev, nd));
            }
            nd_prev2 = nd_prev;
            nd_prev = nd;
        }
        // dip still descending at the end of the searched range
        if armed && nd_prev < self.confidence_threshold && nd_prev < nd_prev2 && max_lag >= self.min_lag + 2 {
            return Some(PitchEstimate {
                frequency: self.sample_rate / (max_lag - 1) as f32,
                normalized_diff: nd_prev,
            });
        }
        None
    }

    fn normalized_diff(&self, frame: &[f32], lag: usize) -> f32 {
        let mut difference: f64 = 0.0;
        let mut energy: f64 = 0.0;
        for i in 0..WINDOW_SIZE {
            let a = frame[i] as f64;
            let b = frame[i + lag] as f64;
            difference += (a - b) * (a - b);
            energy += a * a + b * b;
        }
        (difference / f64::max(energy, 1.0)) as f32
    }

    /// parabolic interpolation through the dip: the true period is
    /// rarely a whole number of samples
    fn refine(&self, lag: usize, before: f32, at: f32, after: f32) -> PitchEstimate {
        let denom = before - 2.0 * at + after;
        let mut offset = 0.0;
        if denom.abs() > f32::EPSILON {
            offset = (0.5 * (before - after) / denom).clamp(-1.0, 1.0);
        }
        PitchEstimate {
            frequency: self.sample_rate / (lag as f32 + offset),
            normalized_diff: at,
        }
    }
}

impl Display for PitchEstimator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ rate: {}, lags: {}..{}, threshold: {} }}",
            self.sample_rate, self.min_lag, self.max_lag, self.confidence_threshold
        )
    }
}

#[cfg(test)]
mod test_pitch_estimator {
    use super::*;
    use rand::Rng;

    fn sine_frame(freq: f32, rate: f32, amp: f32) -> Vec<f32> {
        let mut frame = vec![0.0; FRAME_SIZE];
        for i in 0..frame.len() {
            frame[i] = amp * f32::sin(i as f32 * 2.0 * std::f32::consts::PI * freq / rate);
        }
        frame
    }

    #[test]
    fn pure_tone_within_one_percent() {
        let est = PitchEstimator::new(44_100.0);
        for freq in [82.41f32, 110.0, 196.0, 329.63, 440.0] {
            let frame = sine_frame(freq, 44_100.0, 1.0);
            let res = est.estimate(&frame).unwrap();
            println!("target: {} found: {} nd: {}", freq, res.frequency, res.normalized_diff);
            assert!((res.frequency - freq).abs() / freq < 0.01);
            assert!(res.normalized_diff < 0.05);
        }
    }

    #[test]
    fn first_dip_beats_subharmonics() {
        // every integer multiple of the true period scores near zero on a
        // pure tone, so a global-minimum search comes back an octave or
        // more low.  Sweep the whole supported range in ~semitone steps.
        let est = PitchEstimator::new(44_100.0);
        let mut freq = 30.0f32;
        while freq < 600.0 {
            let frame = sine_frame(freq, 44_100.0, 1.0);
            let res = est.estimate(&frame).unwrap();
            assert!(
                (res.frequency - freq).abs() / freq < 0.01,
                "target {} got {} nd {}",
                freq,
                res.frequency,
                res.normalized_diff
            );
            freq *= 1.059;
        }
        // the two period lengths most prone to landing on 2x the lag
        for freq in [599.92f32, 101.24] {
            let frame = sine_frame(freq, 44_100.0, 1.0);
            let res = est.estimate(&frame).unwrap();
            assert!(
                (res.frequency - freq).abs() / freq < 0.01,
                "target {} got {}",
                freq,
                res.frequency
            );
        }
    }

    #[test]
    fn full_scale_a440_scenario() {
        let est = PitchEstimator::new(44_100.0);
        let frame = sine_frame(440.0, 44_100.0, 1.0);
        let res = est.estimate(&frame).unwrap();
        assert!((res.frequency - 440.0).abs() < 4.4);
        assert!(res.normalized_diff < 0.01);
    }

    #[test]
    fn white_noise_rejected() {
        let est = PitchEstimator::new(44_100.0);
        let mut rng = rand::thread_rng();
        let frames = 20;
        let mut rejected = 0;
        for _ in 0..frames {
            let frame: Vec<f32> = (0..FRAME_SIZE).map(|_| rng.gen_range(-1.0..1.0)).collect();
            if est.estimate(&frame).is_none() {
                rejected += 1;
            }
        }
        // at least 95% of noise frames must fail the confidence gate
        assert!(rejected >= 19, "only rejected {}/{}", rejected, frames);
    }

    #[test]
    fn short_frame_gives_nothing() {
        let est = PitchEstimator::new(44_100.0);
        let frame = sine_frame(440.0, 44_100.0, 1.0);
        assert!(est.estimate(&frame[0..WINDOW_SIZE]).is_none());
    }

    #[test]
    fn amplitude_does_not_matter() {
        let est = PitchEstimator::new(44_100.0);
        let frame = sine_frame(196.0, 44_100.0, 0.05);
        let res = est.estimate(&frame).unwrap();
        assert!((res.frequency - 196.0).abs() / 196.0 < 0.01);
    }
}
