//! input conditioning ahead of the analysis chain
//!
//! Gain and a simple feed-forward compressor (threshold + ratio with a
//! peak follower sidechain).  Live parameter changes ramp through one
//! pole smoothers once per frame instead of jumping, so a settings
//! slider never produces a click in the analysis signal.
use crate::dsp::smoothing_filter::SmoothingFilter;
use crate::utils::{get_coef, to_db, to_lin};

/// per-frame blend for parameter ramps.  At ~60 frames/sec a change
/// settles in well under half a second.
const RAMP_ALPHA: f64 = 0.1;

pub struct Preprocessor {
    gain_target: f64,
    gain: SmoothingFilter<f64>,
    threshold_target: f64,
    threshold: SmoothingFilter<f64>,
    ratio_target: f64,
    ratio: SmoothingFilter<f64>,
    // compressor sidechain follower
    env: f64,
    attack_coef: f64,
    release_coef: f64,
}

impl Preprocessor {
    pub fn new(sample_rate: f64) -> Preprocessor {
        let mut pre = Preprocessor {
            gain_target: 1.0,
            gain: SmoothingFilter::from_alpha(RAMP_ALPHA),
            threshold_target: 0.0,
            threshold: SmoothingFilter::from_alpha(RAMP_ALPHA),
            ratio_target: 1.0,
            ratio: SmoothingFilter::from_alpha(RAMP_ALPHA),
            env: 0.0,
            attack_coef: get_coef(0.005, sample_rate),
            release_coef: get_coef(0.1, sample_rate),
        };
        pre.reset();
        pre
    }

    pub fn set_gain(&mut self, gain: f64) -> () {
        self.gain_target = gain;
    }
    pub fn set_threshold(&mut self, threshold_db: f64) -> () {
        self.threshold_target = threshold_db;
    }
    pub fn set_ratio(&mut self, ratio: f64) -> () {
        self.ratio_target = f64::max(ratio, 1.0);
    }

    /// snap ramps to their targets and clear the sidechain.  Stream
    /// restart only - mid-stream this would defeat the ramping.
    pub fn reset(&mut self) -> () {
        self.gain.reset_to(self.gain_target);
        self.threshold.reset_to(self.threshold_target);
        self.ratio.reset_to(self.ratio_target);
        self.env = 0.0;
    }

    /// condition one frame in place
    pub fn process(&mut self, frame: &mut [f32]) -> () {
        // ramp parameters once per frame
        let gain = self.gain.get(self.gain_target);
        let threshold = self.threshold.get(self.threshold_target);
        let ratio = f64::max(self.ratio.get(self.ratio_target), 1.0);
        let slope = 1.0 - 1.0 / ratio;

        for samp in frame {
            let inp = *samp as f64 * gain;
            // sidechain follows the post-gain envelope
            let level = inp.abs();
            if level > self.env {
                self.env = level * self.attack_coef + (1.0 - self.attack_coef) * self.env;
            } else {
                self.env = level * self.release_coef + (1.0 - self.release_coef) * self.env;
            }
            // gain computation in log space, like every compressor
            let mut comp_gain = 0.0;
            let input_level = to_db(self.env);
            if input_level > threshold {
                comp_gain = slope * (threshold - input_level);
            }
            *samp = (inp * to_lin(comp_gain)) as f32;
        }
    }
}

#[cfg(test)]
mod test_preprocess {
    use super::*;

    #[test]
    fn unity_passthrough() {
        let mut pre = Preprocessor::new(48_000.0);
        let mut frame = vec![0.25f32; 64];
        pre.process(&mut frame);
        // gain 1, ratio 1 (slope 0): signal untouched
        for samp in &frame {
            assert!((samp - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn gain_ramps_not_jumps() {
        let mut pre = Preprocessor::new(48_000.0);
        pre.set_gain(2.0);
        let mut frame = vec![0.1f32; 64];
        pre.process(&mut frame);
        // first frame after the change is part way there
        assert!(frame[0] > 0.1 && frame[0] < 0.2);
        // after many frames the ramp settles
        for _ in 0..100 {
            frame = vec![0.1f32; 64];
            pre.process(&mut frame);
        }
        assert!((frame[0] - 0.2).abs() < 1e-4);
    }

    #[test]
    fn compressor_knocks_down_loud_signal() {
        let mut pre = Preprocessor::new(48_000.0);
        pre.set_threshold(-20.0);
        pre.set_ratio(10.0);
        pre.reset();
        // loud steady signal well above threshold
        let mut frame = vec![0.9f32; 4096];
        pre.process(&mut frame);
        let tail = frame[4000];
        assert!(tail < 0.9);
        // quiet signal below threshold stays put
        let mut pre = Preprocessor::new(48_000.0);
        pre.set_threshold(-20.0);
        pre.set_ratio(10.0);
        pre.reset();
        let mut frame = vec![0.01f32; 4096];
        pre.process(&mut frame);
        assert!((frame[4000] - 0.01).abs() < 1e-4);
    }
}
