//! frequency to note quantization, free and targeted
//!
//! Free quantization maps any frequency to the nearest equal tempered
//! note relative to A440 and never rejects - drill scoring applies its
//! own tolerance.  Targeted quantization matches against a finite tuning
//! set and refuses to anchor to a clearly wrong string.
use crate::notes::note::{QuantizedNote, TargetMatch, TuningTarget, NOTE_NAMES};

/// reference pitch for free quantization
pub const REFERENCE_FREQ: f64 = 440.0;
/// targeted matches further than this from every target are rejected
pub const MAX_TARGET_CENTS: f64 = 70.0;

/// nearest chromatic note to a frequency.  Octaves are anchored so the
/// reference pitch itself lands in octave 4.
pub fn quantize_free(frequency: f64) -> QuantizedNote {
    let semitones = 12.0 * f64::log2(frequency / REFERENCE_FREQ);
    let nearest = semitones.round();
    let cents = 100.0 * (semitones - nearest);
    let n = nearest as i32;
    QuantizedNote {
        name: NOTE_NAMES[n.rem_euclid(12) as usize],
        octave: n.div_euclid(12) + 4,
        cents: cents as f32,
    }
}

/// a finite set of tuning pitches, e.g. the open strings of a guitar
pub struct TargetSet {
    targets: Vec<TuningTarget>,
}

impl TargetSet {
    pub fn new(targets: Vec<TuningTarget>) -> TargetSet {
        TargetSet { targets }
    }

    pub fn guitar() -> TargetSet {
        TargetSet::new(vec![
            TuningTarget::new("E2", 82.41),
            TuningTarget::new("A2", 110.00),
            TuningTarget::new("D3", 146.83),
            TuningTarget::new("G3", 196.00),
            TuningTarget::new("B3", 246.94),
            TuningTarget::new("E4", 329.63),
        ])
    }

    pub fn bass() -> TargetSet {
        TargetSet::new(vec![
            TuningTarget::new("E1", 41.20),
            TuningTarget::new("A1", 55.00),
            TuningTarget::new("D2", 73.42),
            TuningTarget::new("G2", 98.00),
        ])
    }

    pub fn ukulele() -> TargetSet {
        TargetSet::new(vec![
            TuningTarget::new("G4", 392.00),
            TuningTarget::new("C4", 261.63),
            TuningTarget::new("E4", 329.63),
            TuningTarget::new("A4", 440.00),
        ])
    }

    pub fn targets(&self) -> &[TuningTarget] {
        &self.targets
    }

    /// closest target by absolute cents distance, or None if everything
    /// is more than MAX_TARGET_CENTS away
    pub fn match_frequency(&self, frequency: f64) -> Option<TargetMatch> {
        let mut best: Option<TargetMatch> = None;
        for target in &self.targets {
            let cents = 1200.0 * f64::log2(frequency / target.frequency);
            match &best {
                Some(b) if b.cents.abs() <= cents.abs() => (),
                _ => {
                    best = Some(TargetMatch {
                        name: target.name.clone(),
                        cents,
                    });
                }
            }
        }
        best.filter(|b| b.cents.abs() <= MAX_TARGET_CENTS)
    }
}

#[cfg(test)]
mod test_quantizer {
    use super::*;

    fn cents_above(freq: f64, cents: f64) -> f64 {
        freq * f64::powf(2.0, cents / 1200.0)
    }

    #[test]
    fn reference_is_a4() {
        let note = quantize_free(440.0);
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 4);
        assert!(note.cents.abs() < 1e-6);
    }

    #[test]
    fn near_half_semitone_each_way() {
        // 49.9 cents sharp of A4 still reads as A4, +50 within tolerance
        let note = quantize_free(cents_above(440.0, 49.9));
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 4);
        assert!((note.cents - 49.9).abs() < 0.5);
        // and 49.9 flat
        let note = quantize_free(cents_above(440.0, -49.9));
        assert_eq!(note.name, "A");
        assert!((note.cents + 49.9).abs() < 0.5);
    }

    #[test]
    fn classes_and_octaves() {
        // one semitone up from A4
        let note = quantize_free(cents_above(440.0, 100.0));
        assert_eq!(note.name, "Bb");
        assert_eq!(note.octave, 4);
        // one octave up
        let note = quantize_free(880.0);
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 5);
        // one octave down
        let note = quantize_free(220.0);
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 3);
        // well below the reference
        let note = quantize_free(82.41);
        assert_eq!(note.name, "E");
    }

    #[test]
    fn free_never_rejects() {
        // absurdly off-grid frequencies still get a nearest note
        let note = quantize_free(27.7);
        assert!(!note.name.is_empty());
    }

    #[test]
    fn target_exact_hit() {
        let set = TargetSet::guitar();
        let m = set.match_frequency(82.41).unwrap();
        assert_eq!(m.name, "E2");
        assert!(m.cents.abs() < 1e-6);
    }

    #[test]
    fn target_nearest_wins() {
        let set = TargetSet::guitar();
        // slightly flat of G3
        let m = set.match_frequency(cents_above(196.0, -30.0)).unwrap();
        assert_eq!(m.name, "G3");
        assert!((m.cents + 30.0).abs() < 0.1);
    }

    #[test]
    fn target_rejects_distant() {
        let set = TargetSet::guitar();
        // 127 Hz is ~250 cents from both A2 and D3
        assert!(set.match_frequency(127.0).is_none());
        // just past the 70 cent fence
        assert!(set.match_frequency(cents_above(110.0, 71.0)).is_none());
        // just inside it
        assert!(set.match_frequency(cents_above(110.0, 69.0)).is_some());
    }
}
