//! DSP building blocks: envelope/gate, smoothing, pitch estimation
pub mod peak_tracker;
pub mod pitch_estimator;
pub mod smoothing_filter;
