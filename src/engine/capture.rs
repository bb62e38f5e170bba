//! seam to the audio capture collaborator
//!
//! Device enumeration, permissions and platform plumbing all live on the
//! other side of this trait.  The engine owns a boxed handle and sees
//! only raw frames plus coarse stream signals - no ambient global audio
//! context anywhere.
use crate::common::box_error::BoxError;

/// coarse stream lifecycle signals surfaced by the collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamSignal {
    /// permission granted, samples are flowing
    Ready,
    /// platform paused the stream (backgrounded tab, audio session grab)
    Suspended,
    /// platform resumed a suspended stream
    Resumed,
    /// stream died after being granted
    Lost,
    /// user or OS refused microphone access
    Denied,
    /// no capture capability on this platform
    Unavailable,
}

pub trait CaptureSource: Send {
    /// begin (or re-begin) capture on the named device.  The outcome
    /// arrives later as a StreamSignal, not as a return value.
    fn open(&mut self, device: &str) -> Result<(), BoxError>;
    /// release the stream.  Synchronous; no signals after this.
    fn close(&mut self) -> ();
    /// ask a suspended stream to resume
    fn resume(&mut self) -> Result<(), BoxError>;
    fn sample_rate(&self) -> f32;
    /// pull the next frame into buf.  false when no new frame is ready
    /// this tick.
    fn read_frame(&mut self, buf: &mut [f32]) -> bool;
    /// drain one pending lifecycle signal, if any
    fn poll_signal(&mut self) -> Option<StreamSignal>;
}
