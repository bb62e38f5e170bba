//! the NoteEngine aggregates the signal chain into a single structure.
//!
//! The engine drives off the [`NoteEngine::process_tick`] function, called
//! once per display refresh tick (~60 Hz).  Each tick it polls stream
//! signals and config messages, pulls at most one frame from the capture
//! collaborator, and runs it through preprocess -> envelope/gate ->
//! estimator -> quantizer -> stability tracker.
//!
//! To avoid a mutex around engine state, the NoteEngine is created with a
//! mpsc::Sender and mpsc::Receiver.  It sends json formatted status
//! snapshots (and, in discrete mode, note events) to the Senders, and
//! polls the Receiver for any [`ParamMessage`] it should apply between
//! frames.  One producer, one consumer, one owner of all mutable state.
use std::sync::mpsc;

use log::{debug, info, warn};
use serde_json::json;

use crate::common::box_error::BoxError;
use crate::common::config::Config;
use crate::common::micro_timer::{get_micro_time, MicroTimer};
use crate::dsp::peak_tracker::PeakTracker;
use crate::dsp::pitch_estimator::{PitchEstimator, FRAME_SIZE};
use crate::notes::note::QuantizedNote;
use crate::notes::quantizer::{quantize_free, TargetSet};

use super::capture::{CaptureSource, StreamSignal};
use super::param_message::{EngineParam, ParamMessage};
use super::preprocess::Preprocessor;
use super::stability::{ContinuousTracker, DiscreteTracker, TuningResult};

/// status snapshot refresh interval
pub const STATUS_REFRESH: u128 = 500 * 1000; // 500 msec

/// lifecycle states surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineStatus {
    Idle,
    Requesting,
    Running,
    Suspended,
    Denied,
    Error,
    Unavailable,
}

impl EngineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Idle => "idle",
            EngineStatus::Requesting => "permission_requested",
            EngineStatus::Running => "running",
            EngineStatus::Suspended => "suspended",
            EngineStatus::Denied => "denied",
            EngineStatus::Error => "error",
            EngineStatus::Unavailable => "unavailable",
        }
    }
}

/// which consumption mode the engine drives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineMode {
    /// one-shot note events for drill answers
    Discrete,
    /// smoothed tuning readout for the tuner display
    Continuous,
}

/// caller supplied configuration; every numeric field can change live
/// through a [`ParamMessage`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// noise gate threshold as a percentage of full scale amplitude
    pub sensitivity: f64,
    /// linear input gain
    pub gain: f64,
    pub compressor_threshold_db: f64,
    pub compressor_ratio: f64,
    pub device: String,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            sensitivity: 5.0,
            gain: 1.0,
            compressor_threshold_db: 0.0,
            compressor_ratio: 1.0,
            device: String::from("default"),
        }
    }
}

impl EngineConfig {
    /// defaults from settings.json, falling back to the built-ins
    pub fn from_settings(config: &Config) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            sensitivity: config
                .get_f64_value("sensitivity", Some(defaults.sensitivity))
                .unwrap_or(defaults.sensitivity),
            gain: config
                .get_f64_value("gain", Some(defaults.gain))
                .unwrap_or(defaults.gain),
            compressor_threshold_db: config
                .get_f64_value("compressorThresholdDb", Some(defaults.compressor_threshold_db))
                .unwrap_or(defaults.compressor_threshold_db),
            compressor_ratio: config
                .get_f64_value("compressorRatio", Some(defaults.compressor_ratio))
                .unwrap_or(defaults.compressor_ratio),
            device: config
                .get_str_value("device", Some(defaults.device.clone()))
                .unwrap_or(defaults.device),
        }
    }
}

/// Aggregates the whole note tracking chain into a single structure
///
/// Once started, the owner should call [`NoteEngine::process_tick`] every
/// refresh tick to drive the engine.
pub struct NoteEngine {
    capture: Box<dyn CaptureSource>,
    status: EngineStatus,
    mode: EngineMode,
    config: EngineConfig,
    pre: Preprocessor,
    peak: PeakTracker,
    estimator: PitchEstimator,
    targets: TargetSet,
    discrete: DiscreteTracker,
    continuous: ContinuousTracker,
    note_tx: mpsc::Sender<QuantizedNote>,
    status_tx: mpsc::Sender<serde_json::Value>,
    command_rx: mpsc::Receiver<ParamMessage>,
    frame: Vec<f32>,
    status_timer: MicroTimer,
    now: u128,
}

impl NoteEngine {
    /// create a NoteEngine around a capture handle.  The engine sends
    /// confirmed note events on note_tx (discrete mode), json status
    /// snapshots on status_tx, and polls command_rx for live config
    /// changes.  Continuous mode matches against a guitar target set
    /// until [`NoteEngine::set_targets`] says otherwise.
    pub fn new(
        capture: Box<dyn CaptureSource>,
        mode: EngineMode,
        note_tx: mpsc::Sender<QuantizedNote>,
        status_tx: mpsc::Sender<serde_json::Value>,
        command_rx: mpsc::Receiver<ParamMessage>,
    ) -> NoteEngine {
        let now = get_micro_time();
        let sample_rate = capture.sample_rate();
        NoteEngine {
            capture,
            status: EngineStatus::Idle,
            mode,
            config: EngineConfig::default(),
            pre: Preprocessor::new(sample_rate as f64),
            peak: PeakTracker::new(),
            estimator: PitchEstimator::new(sample_rate),
            targets: TargetSet::guitar(),
            discrete: DiscreteTracker::new(),
            continuous: ContinuousTracker::new(now),
            note_tx,
            status_tx,
            command_rx,
            frame: vec![0.0; FRAME_SIZE],
            status_timer: MicroTimer::build(now, STATUS_REFRESH),
            now,
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
    /// decaying amplitude envelope, [0, 1] - this is what the UI fades on
    pub fn volume(&self) -> f32 {
        self.peak.level()
    }
    /// continuous mode readout; None when the display should be blank
    pub fn tuning_result(&self) -> Option<TuningResult> {
        self.continuous.result()
    }
    pub fn set_targets(&mut self, targets: TargetSet) -> () {
        self.targets = targets;
        self.continuous.reset();
    }

    /// open the capture stream and wait for the permission outcome.
    /// Status moves to Requesting; the Ready/Denied/Unavailable signal
    /// decides where it goes from there.
    pub fn start(&mut self, config: &EngineConfig) -> Result<(), BoxError> {
        self.config = config.clone();
        self.apply_config();
        self.reset_tracking();
        self.status = EngineStatus::Requesting;
        info!("requesting capture on device {}", self.config.device);
        self.capture.open(&self.config.device)?;
        Ok(())
    }

    /// release the stream and clear all state.  Synchronous: nothing
    /// fires after this returns.
    pub fn stop(&mut self) -> () {
        self.capture.close();
        self.reset_tracking();
        self.discrete.reset();
        self.status = EngineStatus::Idle;
        info!("engine stopped");
    }

    /// explicit recovery: nudge a suspended stream, or reopen after a
    /// stream error.  Terminal Denied/Unavailable states stay terminal
    /// until the caller starts over.
    pub fn resume(&mut self) -> Result<(), BoxError> {
        match self.status {
            EngineStatus::Suspended => self.capture.resume(),
            EngineStatus::Error => {
                self.status = EngineStatus::Requesting;
                self.capture.open(&self.config.device)
            }
            _ => Ok(()),
        }
    }

    /// drive the engine.  Call once per refresh tick.
    pub fn process_tick(&mut self) -> () {
        self.process_at(get_micro_time());
    }

    /// same as process_tick with the clock supplied (tests drive this)
    pub fn process_at(&mut self, now: u128) -> () {
        self.now = now;
        self.check_signals();
        self.check_command();
        if self.status == EngineStatus::Running {
            if self.capture.read_frame(&mut self.frame) {
                self.process_frame();
            }
        }
        self.send_status();
    }

    fn check_signals(&mut self) -> () {
        while let Some(sig) = self.capture.poll_signal() {
            debug!("stream signal: {:?} while {:?}", sig, self.status);
            match sig {
                StreamSignal::Ready => {
                    // device (and possibly sample rate) is settled now
                    let rate = self.capture.sample_rate();
                    self.estimator = PitchEstimator::new(rate);
                    self.pre = Preprocessor::new(rate as f64);
                    self.apply_config();
                    self.reset_tracking();
                    self.status = EngineStatus::Running;
                }
                StreamSignal::Suspended => {
                    if self.status == EngineStatus::Running {
                        self.status = EngineStatus::Suspended;
                        // keep what we know, but a half-built candidate
                        // must not complete across the gap
                        self.discrete.rearm();
                    }
                }
                StreamSignal::Resumed => {
                    if self.status == EngineStatus::Suspended {
                        self.status = EngineStatus::Running;
                        self.continuous.rearm(self.now);
                    }
                }
                StreamSignal::Lost => {
                    warn!("capture stream lost");
                    self.status = EngineStatus::Error;
                }
                StreamSignal::Denied => {
                    warn!("microphone permission denied");
                    self.status = EngineStatus::Denied;
                }
                StreamSignal::Unavailable => {
                    warn!("no capture capability on this platform");
                    self.status = EngineStatus::Unavailable;
                }
            }
        }
    }

    fn check_command(&mut self) -> () {
        while let Ok(msg) = self.command_rx.try_recv() {
            debug!("param: {}", msg);
            self.process_param_command(msg);
        }
    }

    fn process_param_command(&mut self, msg: ParamMessage) -> () {
        match msg.param {
            EngineParam::SetSensitivity => {
                self.config.sensitivity = msg.fvalue.clamp(0.0, 100.0);
            }
            EngineParam::SetGain => {
                self.config.gain = msg.fvalue;
                self.pre.set_gain(msg.fvalue);
            }
            EngineParam::SetCompressorThreshold => {
                self.config.compressor_threshold_db = msg.fvalue;
                self.pre.set_threshold(msg.fvalue);
            }
            EngineParam::SetCompressorRatio => {
                self.config.compressor_ratio = msg.fvalue;
                self.pre.set_ratio(msg.fvalue);
            }
            EngineParam::SetDevice => {
                // device swaps need a full stream restart
                self.config.device = msg.svalue.clone();
                self.capture.close();
                self.status = EngineStatus::Requesting;
                if let Err(e) = self.capture.open(&msg.svalue) {
                    warn!("device change failed: {}", e);
                    self.status = EngineStatus::Error;
                }
            }
        }
    }

    fn process_frame(&mut self) -> () {
        self.pre.process(&mut self.frame);
        self.peak.add_frame(&self.frame);
        let gate_open = self.peak.gate_open((self.config.sensitivity / 100.0) as f32);
        // estimator only runs on audible frames
        let estimate = if gate_open {
            self.estimator.estimate(&self.frame)
        } else {
            None
        };
        match self.mode {
            EngineMode::Discrete => {
                let note = estimate.map(|e| quantize_free(e.frequency as f64));
                if let Some(event) = self.discrete.advance(note) {
                    info!("note played: {}", event);
                    // the UX bridge gets the same event as a json message
                    let _res = self.status_tx.send(json!({ "notePlayed": event.as_json() }));
                    let _res = self.note_tx.send(event);
                }
            }
            EngineMode::Continuous => {
                let matched =
                    estimate.and_then(|e| self.targets.match_frequency(e.frequency as f64));
                self.continuous.advance(matched, self.now);
            }
        }
    }

    fn send_status(&mut self) -> () {
        if !self.status_timer.expired(self.now) {
            return;
        }
        self.status_timer.reset(self.now);
        let tuning = self
            .continuous
            .result()
            .map(|r| json!({ "target": r.name, "cents": r.cents }));
        let event = json!({
            "status": self.status.as_str(),
            "volume": self.volume(),
            "tuning": tuning,
        });
        let _res = self.status_tx.send(event);
    }

    fn apply_config(&mut self) -> () {
        self.pre.set_gain(self.config.gain);
        self.pre.set_threshold(self.config.compressor_threshold_db);
        self.pre.set_ratio(self.config.compressor_ratio);
        self.pre.reset();
    }

    fn reset_tracking(&mut self) -> () {
        self.peak.reset();
        self.discrete.rearm();
        self.continuous.reset();
    }
}
