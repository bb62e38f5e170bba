//! pitchtrack - real time monophonic note tracking
//!
//! provides the signal chain used by practice drills and the instrument
//! tuner: amplitude envelope + noise gate, time-domain fundamental frequency
//! estimation, note quantization, and a hysteresis tracker that turns raw
//! per-frame estimates into either discrete "note played" events or a
//! smoothed tuning readout.
#[macro_use]
extern crate num_derive;

pub mod common;
pub mod dsp;
pub mod engine;
pub mod notes;
pub mod utils;

pub use engine::note_engine::NoteEngine;
pub use engine::param_message::ParamMessage;
