//! Modules shared across the engine: errors, settings, timers.
pub mod box_error;
pub mod config;
pub mod micro_timer;
