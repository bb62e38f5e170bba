//! offline harness: run the note engine over a wav file
//!
//! Handy for tuning the confidence threshold and stability count against
//! recorded instrument audio instead of a live microphone.
//!
//! cargo run --example tune_wav -- --file take.wav
//! cargo run --example tune_wav -- --file take.wav --tuner
use clap::Parser;
use std::sync::mpsc;

use pitchtrack::common::box_error::BoxError;
use pitchtrack::engine::capture::{CaptureSource, StreamSignal};
use pitchtrack::engine::note_engine::{EngineConfig, EngineMode, NoteEngine};
use pitchtrack::dsp::pitch_estimator::FRAME_SIZE;
use pitchtrack::notes::quantizer::TargetSet;

#[derive(Parser)]
#[command(about = "Run the note tracking engine over a wav file")]
struct Args {
    /// wav file to analyze (mono, or left channel of stereo)
    #[arg(short, long)]
    file: String,
    /// run the tuner (continuous mode) instead of note events
    #[arg(short, long, default_value_t = false)]
    tuner: bool,
    /// input gain
    #[arg(short, long, default_value_t = 1.0)]
    gain: f64,
}

/// capture collaborator backed by a wav file
struct WavCapture {
    samples: Vec<f32>,
    rate: f32,
    pos: usize,
    pending: Vec<StreamSignal>,
}

impl WavCapture {
    fn load(path: &str) -> Result<WavCapture, BoxError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let full_scale = f32::powi(2.0, spec.bits_per_sample as i32 - 1);
                reader
                    .samples::<i32>()
                    .step_by(channels)
                    .map(|s| s.unwrap_or(0) as f32 / full_scale)
                    .collect()
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .step_by(channels)
                .map(|s| s.unwrap_or(0.0))
                .collect(),
        };
        Ok(WavCapture {
            samples,
            rate: spec.sample_rate as f32,
            pos: 0,
            pending: vec![],
        })
    }
    fn exhausted(&self) -> bool {
        self.pos + FRAME_SIZE > self.samples.len()
    }
}

impl CaptureSource for WavCapture {
    fn open(&mut self, _device: &str) -> Result<(), BoxError> {
        self.pending.push(StreamSignal::Ready);
        Ok(())
    }
    fn close(&mut self) -> () {
        self.pos = self.samples.len();
    }
    fn resume(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn sample_rate(&self) -> f32 {
        self.rate
    }
    fn read_frame(&mut self, buf: &mut [f32]) -> bool {
        if self.exhausted() {
            return false;
        }
        buf.copy_from_slice(&self.samples[self.pos..self.pos + FRAME_SIZE]);
        self.pos += FRAME_SIZE;
        true
    }
    fn poll_signal(&mut self) -> Option<StreamSignal> {
        self.pending.pop()
    }
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    let args = Args::parse();

    let capture = WavCapture::load(&args.file)?;
    let rate = capture.sample_rate();
    let frames = capture.samples.len() / FRAME_SIZE;
    let frame_us = (FRAME_SIZE as f64 / rate as f64 * 1.0e6) as u128;
    println!("{}: {} frames at {} Hz", args.file, frames, rate);

    let mode = if args.tuner {
        EngineMode::Continuous
    } else {
        EngineMode::Discrete
    };
    let (note_tx, note_rx) = mpsc::channel();
    let (status_tx, _status_rx) = mpsc::channel();
    let (_command_tx, command_rx) = mpsc::channel();
    let mut engine = NoteEngine::new(Box::new(capture), mode, note_tx, status_tx, command_rx);
    engine.set_targets(TargetSet::guitar());

    let mut config = EngineConfig::default();
    config.gain = args.gain;
    engine.start(&config)?;

    // wav time, not wall time, so the run is deterministic
    let mut now: u128 = 0;
    for i in 0..=frames {
        now += frame_us;
        engine.process_at(now);
        for note in note_rx.try_iter() {
            let secs = (i * FRAME_SIZE) as f64 / rate as f64;
            println!("{:7.2}s  note played: {}", secs, note);
        }
        if args.tuner {
            if let Some(res) = engine.tuning_result() {
                println!("tuner: {} {:+.1} cents  (vol {:.2})", res.name, res.cents, engine.volume());
            }
        }
    }
    engine.stop();
    Ok(())
}
