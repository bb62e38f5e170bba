//! hysteresis tracking of per-frame note estimates
//!
//! A single frame of evidence is never trusted: a note must survive
//! three consecutive frames before it counts, and a single silent or
//! unconfident frame clears the candidate outright.  False positives
//! cost more than false negatives here - a spurious note-played event
//! corrupts drill scoring, a missed frame just delays the answer.
use crate::common::micro_timer::MicroTimer;
use crate::dsp::smoothing_filter::SmoothingFilter;
use crate::notes::note::{QuantizedNote, TargetMatch};

/// consecutive matching frames required before a note is trusted.
/// Empirical, like the estimator's confidence threshold.
pub const STABLE_FRAMES: u32 = 3;

/// blend factor for the tuner cents smoother
pub const CENTS_ALPHA: f64 = 0.2;
/// per-frame decay of the smoothed cents while no pitch is seen
pub const SILENT_DECAY: f64 = 0.98;
/// continuous silence before the tuner display clears entirely
pub const SILENCE_CLEAR_US: u128 = 10 * 1000 * 1000;

/// discrete event mode: confirmed note transitions become one-shot
/// "note played" events for the drill engine
pub struct DiscreteTracker {
    candidate: Option<QuantizedNote>,
    count: u32,
    last_emitted: Option<QuantizedNote>,
    needed: u32,
}

impl DiscreteTracker {
    pub fn new() -> DiscreteTracker {
        DiscreteTracker {
            candidate: None,
            count: 0,
            last_emitted: None,
            needed: STABLE_FRAMES,
        }
    }

    /// override the 3-frame default (validated against recorded audio,
    /// not derived)
    pub fn set_stable_frames(&mut self, needed: u32) -> () {
        self.needed = u32::max(needed, 1);
    }

    /// advance one frame.  Some(note) fires the event for a newly
    /// confirmed transition; holding a confirmed note stays quiet.
    pub fn advance(&mut self, note: Option<QuantizedNote>) -> Option<QuantizedNote> {
        let note = match note {
            Some(n) => n,
            None => {
                // no leniency: one bad frame clears everything, and the
                // drop-out re-arms the same note to fire again
                self.candidate = None;
                self.count = 0;
                self.last_emitted = None;
                return None;
            }
        };
        match &self.candidate {
            Some(c) if c.same_note(&note) => {
                self.count += 1;
            }
            _ => {
                self.candidate = Some(note.clone());
                self.count = 1;
            }
        }
        if self.count != self.needed {
            return None;
        }
        // entering Confirmed: dedup against the previous emission
        match &self.last_emitted {
            Some(e) if e.same_note(&note) => None,
            _ => {
                self.last_emitted = Some(note.clone());
                Some(note)
            }
        }
    }

    /// suspension re-arm: drop the candidate so a stale half-built note
    /// can't complete after resume, but keep the last emission so the
    /// same sustained note doesn't re-fire.
    pub fn rearm(&mut self) -> () {
        self.candidate = None;
        self.count = 0;
    }

    pub fn reset(&mut self) -> () {
        self.rearm();
        self.last_emitted = None;
    }
}

/// what the tuner shows: the locked target and the smoothed needle
#[derive(Debug, Clone, PartialEq)]
pub struct TuningResult {
    pub name: String,
    pub cents: f64,
}

/// continuous tracking mode: locked tuning target plus a smoothed cents
/// readout that relaxes toward center during dropouts
pub struct ContinuousTracker {
    candidate: Option<String>,
    count: u32,
    locked: Option<String>,
    smoothed: SmoothingFilter<f64>,
    silence: MicroTimer,
    heard_pitch: bool,
    needed: u32,
}

impl ContinuousTracker {
    pub fn new(now: u128) -> ContinuousTracker {
        ContinuousTracker {
            candidate: None,
            count: 0,
            locked: None,
            smoothed: SmoothingFilter::from_alpha(CENTS_ALPHA),
            silence: MicroTimer::build(now, SILENCE_CLEAR_US),
            heard_pitch: false,
            needed: STABLE_FRAMES,
        }
    }

    pub fn set_stable_frames(&mut self, needed: u32) -> () {
        self.needed = u32::max(needed, 1);
    }

    pub fn advance(&mut self, m: Option<TargetMatch>, now: u128) -> () {
        let m = match m {
            Some(m) => m,
            None => {
                self.candidate = None;
                self.count = 0;
                if self.heard_pitch && self.silence.expired(now) {
                    // extended silence: display goes blank
                    self.locked = None;
                    self.smoothed.reset_to(0.0);
                    self.heard_pitch = false;
                } else if self.locked.is_some() {
                    // brief dropout: hold the note name, relax the needle
                    self.smoothed.decay(SILENT_DECAY);
                }
                return;
            }
        };
        self.silence.reset(now);
        self.heard_pitch = true;
        match &self.candidate {
            Some(c) if *c == m.name => {
                self.count += 1;
            }
            _ => {
                self.candidate = Some(m.name.clone());
                self.count = 1;
            }
        }
        if self.count == self.needed && self.locked.as_deref() != Some(m.name.as_str()) {
            // new target confirmed: the old smoothed reading is for a
            // different string, start fresh
            self.locked = Some(m.name.clone());
            self.smoothed.reset_to(m.cents);
            return;
        }
        if self.locked.is_some() {
            self.smoothed.get(m.cents);
        }
    }

    /// suspension re-arm: keep the lock and reading, clear the half-built
    /// candidate and pretend the silence window starts now
    pub fn rearm(&mut self, now: u128) -> () {
        self.candidate = None;
        self.count = 0;
        self.silence.reset(now);
    }

    pub fn reset(&mut self) -> () {
        self.candidate = None;
        self.count = 0;
        self.locked = None;
        self.smoothed.reset_to(0.0);
        self.heard_pitch = false;
    }

    pub fn result(&self) -> Option<TuningResult> {
        self.locked.as_ref().map(|name| TuningResult {
            name: name.clone(),
            cents: self.smoothed.get_last_output(),
        })
    }
}
