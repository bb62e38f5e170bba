//! note identities produced by the quantizers
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// canonical chromatic labels, anchored at A (semitone offset 0 from A440).
/// One label per class.  Flats everywhere except F# - the mixed convention
/// comes from the rest of the product and is kept on purpose; map at the
/// display edge if you want all flats.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "Bb", "B", "C", "Db", "D", "Eb", "E", "F", "F#", "G", "Ab",
];

/// a note from free quantization: chromatic class, octave, and how far
/// off in cents the incoming frequency was
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantizedNote {
    pub name: &'static str,
    pub octave: i32,
    pub cents: f32,
}

impl QuantizedNote {
    /// identity comparison for the stability tracker: same class and
    /// octave, cents don't matter
    pub fn same_note(&self, other: &QuantizedNote) -> bool {
        self.name == other.name && self.octave == other.octave
    }
    pub fn as_json(&self) -> serde_json::Value {
        json!({
            "note": self.name,
            "octave": self.octave,
            "cents": self.cents,
        })
    }
}

impl fmt::Display for QuantizedNote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{} ({:+.1}c)", self.name, self.octave, self.cents)
    }
}

/// one pitch in a tuning target set, e.g. the E2 string of a guitar.
/// Frequencies are explicit - target sets are not required to be equal
/// tempered relative to A440.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningTarget {
    pub name: String,
    pub frequency: f64,
}

impl TuningTarget {
    pub fn new(name: &str, frequency: f64) -> TuningTarget {
        TuningTarget {
            name: String::from(name),
            frequency,
        }
    }
}

/// targeted quantization result: which target and how far off
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetMatch {
    pub name: String,
    pub cents: f64,
}

impl fmt::Display for TargetMatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:+.1}c)", self.name, self.cents)
    }
}

#[cfg(test)]
mod test_note {
    use super::*;

    #[test]
    fn identity_ignores_cents() {
        let a = QuantizedNote {
            name: "A",
            octave: 4,
            cents: -12.0,
        };
        let b = QuantizedNote {
            name: "A",
            octave: 4,
            cents: 30.0,
        };
        assert!(a.same_note(&b));
        assert!(a != b);
    }

    #[test]
    fn one_label_per_class() {
        let mut seen: Vec<&str> = NOTE_NAMES.to_vec();
        seen.dedup();
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn json_shape() {
        let a = QuantizedNote {
            name: "Eb",
            octave: 3,
            cents: 4.2,
        };
        let v = a.as_json();
        assert_eq!(v["note"], "Eb");
        assert_eq!(v["octave"], 3);
    }
}
