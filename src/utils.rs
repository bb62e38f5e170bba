//! small math helpers shared by the dsp and engine modules
use num::{Float, FromPrimitive};

/// one pole filter coefficient for a given time constant (seconds) at a
/// given update rate.  A time constant of zero gives a coefficient of 1
/// (no smoothing at all).
pub fn get_coef<T: Float + FromPrimitive>(val: T, rate: T) -> T {
    let one = T::from_f64(1.0).unwrap();
    if val <= T::zero() {
        return one;
    }
    one - T::exp(-one / (rate * val))
}

/// linear amplitude to dB (clamped so silence doesn't give -inf)
pub fn to_db(v: f64) -> f64 {
    20.0 * f64::log10(v.max(1.0e-10))
}

/// dB to linear amplitude
pub fn to_lin(v: f64) -> f64 {
    f64::powf(10.0, v / 20.0)
}

/// largest absolute sample in a frame
pub fn frame_peak(frame: &[f32]) -> f32 {
    let mut peak: f32 = 0.0;
    for samp in frame {
        let a = samp.abs();
        if a > peak {
            peak = a;
        }
    }
    peak
}

#[cfg(test)]
mod test_utils {
    use super::*;

    #[test]
    fn coef_bounds() {
        let c: f64 = get_coef(0.1, 48_000.0);
        assert!(c > 0.0 && c < 1.0);
        // zero time constant means no filtering
        let c: f64 = get_coef(0.0, 48_000.0);
        assert_eq!(c, 1.0);
    }
    #[test]
    fn db_round_trip() {
        assert!((to_db(1.0)).abs() < 1e-9);
        assert!((to_lin(to_db(0.5)) - 0.5).abs() < 1e-9);
        // silence clamps instead of going to -inf
        assert!(to_db(0.0).is_finite());
    }
    #[test]
    fn peak_of_frame() {
        let frame = vec![0.1, -0.7, 0.3];
        assert_eq!(frame_peak(&frame), 0.7);
        assert_eq!(frame_peak(&[]), 0.0);
    }
}
